//! Single-component scan engine: wires the predictor, context table,
//! Golomb coder, and run mode together over a raster of samples
//! (ITU-T T.87 §4.6-§4.8, Annex A.2-A.9).
//!
//! Neighbour wiring and the causal edge convention (`a` takes `b`'s
//! value at column 0, a flat zero border above the first row) follow
//! the closest-fidelity reference decoder in the example pack.

use log::debug;

use crate::context::{classify, ContextTable};
use crate::golomb::{decode_golomb, encode_golomb, map_error, unmap_error, BitReader, BitWriter};
use crate::predictor::{
    corrected_prediction, dequantize_error, fix_reconstructed_value, fold_error, med_predict, modulo_range,
    quantize_error,
};
use crate::run_mode::{decode_run_interruption, decode_run_length, encode_run_interruption, encode_run_length};
use crate::traits::Traits;

/// Encode one component's `width * height` samples into a JPEG-LS
/// scan's entropy-coded bytes (no marker framing).
pub fn encode_scan(traits: &Traits, width: usize, height: usize, samples: &[i32]) -> Vec<u8> {
    debug_assert_eq!(samples.len(), width * height);

    let mut writer = BitWriter::new();
    let mut table = ContextTable::new(traits);
    let mut run_index = 0i32;
    let mut prev_row = vec![0i32; width];
    let mut this_row = vec![0i32; width];

    for row in 0..height {
        let mut col = 0usize;
        while col < width {
            let (ra, rb, rc, rd) = neighbours(&this_row, &prev_row, col, width, row);

            let d1 = rd - rb;
            let d2 = rb - rc;
            let d3 = rc - ra;

            let classified = classify(traits, d1, d2, d3);
            if classified.is_none() {
                let mut count = 0usize;
                while col + count < width && (samples[row * width + col + count] - ra).abs() <= traits.near {
                    count += 1;
                }
                let end_of_line = col + count >= width;
                encode_run_length(&mut writer, &mut run_index, count, end_of_line);
                for i in 0..count {
                    this_row[col + i] = ra;
                }
                col += count;

                if !end_of_line {
                    let actual = samples[row * width + col];
                    let rx = encode_run_interruption(&mut writer, &mut table, traits, run_index, ra, rb, actual);
                    this_row[col] = rx;
                    col += 1;
                    if run_index > 0 {
                        run_index -= 1;
                    }
                }
            } else {
                let (idx, sign) = classified.expect("non-flat gradient classifies");
                let med = med_predict(ra, rb, rc);
                let px = corrected_prediction(traits, med, sign, table.regular[idx].c);

                let actual = samples[row * width + col];
                let mut errval = actual - px;
                if sign < 0 {
                    errval = -errval;
                }
                let quantised = fold_error(traits, quantize_error(traits, errval));

                let (k, twist) = table.regular_params(traits, idx);
                let mapped = map_error(quantised, twist);
                encode_golomb(&mut writer, mapped, k, traits.limit, traits.qbpp);
                table.update_regular(traits, idx, quantised);

                let mut errval_out = dequantize_error(traits, quantised);
                if sign < 0 {
                    errval_out = -errval_out;
                }
                let rx = fix_reconstructed_value(traits, modulo_range(traits, px + errval_out));
                this_row[col] = rx;
                col += 1;
            }
        }
        std::mem::swap(&mut prev_row, &mut this_row);
        debug!("jpegls encode: row {} done", row);
    }

    writer.finish()
}

/// Mirror of [`encode_scan`].
pub fn decode_scan(traits: &Traits, width: usize, height: usize, data: &[u8]) -> Vec<i32> {
    let mut reader = BitReader::new(data);
    let mut table = ContextTable::new(traits);
    let mut run_index = 0i32;
    let mut prev_row = vec![0i32; width];
    let mut this_row = vec![0i32; width];
    let mut out = vec![0i32; width * height];

    for row in 0..height {
        let mut col = 0usize;
        while col < width {
            let (ra, rb, rc, rd) = neighbours(&this_row, &prev_row, col, width, row);

            let d1 = rd - rb;
            let d2 = rb - rc;
            let d3 = rc - ra;

            let classified = classify(traits, d1, d2, d3);
            if classified.is_none() {
                let max_possible = width - col;
                let (count, end_of_line) = decode_run_length(&mut reader, &mut run_index, max_possible);
                for i in 0..count {
                    this_row[col + i] = ra;
                }
                col += count;

                if !end_of_line {
                    let rx = decode_run_interruption(&mut reader, &mut table, traits, run_index, ra, rb);
                    this_row[col] = rx;
                    col += 1;
                    if run_index > 0 {
                        run_index -= 1;
                    }
                }
            } else {
                let (idx, sign) = classified.expect("non-flat gradient classifies");
                let med = med_predict(ra, rb, rc);
                let px = corrected_prediction(traits, med, sign, table.regular[idx].c);

                let (k, twist) = table.regular_params(traits, idx);
                let mapped = decode_golomb(&mut reader, k, traits.limit, traits.qbpp);
                let quantised = unmap_error(mapped, twist);
                table.update_regular(traits, idx, quantised);

                let mut errval_out = dequantize_error(traits, quantised);
                if sign < 0 {
                    errval_out = -errval_out;
                }
                let rx = fix_reconstructed_value(traits, modulo_range(traits, px + errval_out));
                this_row[col] = rx;
                col += 1;
            }
        }
        out[row * width..(row + 1) * width].copy_from_slice(&this_row);
        std::mem::swap(&mut prev_row, &mut this_row);
        debug!("jpegls decode: row {} done", row);
    }

    out
}

/// `(a, b, c, d)` causal neighbours at `(col, row)`, honouring the
/// zero-border first row and the "a takes b's value" column-0
/// convention.
fn neighbours(this_row: &[i32], prev_row: &[i32], col: usize, width: usize, row: usize) -> (i32, i32, i32, i32) {
    if row == 0 {
        let rb = 0;
        let rc = 0;
        let rd = 0;
        let ra = if col > 0 { this_row[col - 1] } else { 0 };
        (ra, rb, rc, rd)
    } else {
        let rb = prev_row[col];
        let rc = if col > 0 { prev_row[col - 1] } else { 0 };
        let ra = if col > 0 { this_row[col - 1] } else { rb };
        let rd = if col + 1 < width { prev_row[col + 1] } else { rb };
        (ra, rb, rc, rd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(width: usize, height: usize, near: u16, samples: &[i32]) -> Vec<i32> {
        let traits = Traits::new(8, near, None).unwrap();
        let encoded = encode_scan(&traits, width, height, samples);
        decode_scan(&traits, width, height, &encoded)
    }

    #[test]
    fn lossless_round_trip_is_exact() {
        let samples: Vec<i32> = (0..32 * 32).map(|i| (i * 7) % 256).collect();
        let decoded = round_trip(32, 32, 0, &samples);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn near_lossless_round_trip_honours_bound() {
        let near = 3;
        let samples: Vec<i32> = (0..32 * 32).map(|i| (i * 7) % 256).collect();
        let decoded = round_trip(32, 32, near, &samples);
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= near as i32);
        }
    }

    #[test]
    fn flat_run_triggers_run_length_coding() {
        let mut samples = vec![42i32; 64];
        samples[50] = 200;
        let decoded = round_trip(64, 1, 0, &samples);
        assert_eq!(decoded, samples);
    }

    #[test]
    fn single_pixel_scan_round_trips() {
        let decoded = round_trip(1, 1, 0, &[128]);
        assert_eq!(decoded, vec![128]);
    }
}
