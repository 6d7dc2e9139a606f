//! Run mode: the flat-context shortcut entered when the local gradient
//! triple quantises to `(0, 0, 0)` (ITU-T T.87 §4.8, Annex A.7-A.9).

use crate::context::ContextTable;
use crate::golomb::{decode_golomb, encode_golomb, map_error, unmap_error, BitReader, BitWriter};
use crate::predictor::{dequantize_error, fix_reconstructed_value, fold_error, modulo_range, quantize_error};
use crate::traits::Traits;

/// Run-length exponents, identical to T.87's Table A.1 (`1<<J[i]` is the
/// block size a single "continue" bit accounts for).
pub const J_TABLE: [i32; 32] = [
    0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// Encode a run of `run_length` samples equal to `ra`. `max_possible` is
/// the number of samples remaining in the line (used by the decoder to
/// recognise a run that reaches end-of-line without ever reading an
/// interruption flag).
pub fn encode_run_length(writer: &mut BitWriter, run_index: &mut i32, run_length: usize, end_of_line: bool) {
    let mut remaining = run_length;
    while remaining >= (1usize << J_TABLE[*run_index as usize]) {
        writer.put_bit(1);
        remaining -= 1usize << J_TABLE[*run_index as usize];
        if *run_index < 31 {
            *run_index += 1;
        }
    }
    if end_of_line {
        if remaining != 0 {
            writer.put_bit(1);
        }
    } else {
        writer.put_bit(0);
        let bits = J_TABLE[*run_index as usize] as u32;
        if bits > 0 {
            writer.put_bits(remaining as u32, bits);
        }
    }
}

/// Mirror of [`encode_run_length`]. Returns `(count, end_of_line)`.
pub fn decode_run_length(reader: &mut BitReader, run_index: &mut i32, max_possible: usize) -> (usize, bool) {
    let mut count = 0usize;
    loop {
        if count >= max_possible {
            return (max_possible, true);
        }
        let exp = 1usize << J_TABLE[*run_index as usize];
        if reader.get_bit() == 1 {
            count += exp;
            if *run_index < 31 {
                *run_index += 1;
            }
            if count >= max_possible {
                return (max_possible, true);
            }
        } else {
            let bits = J_TABLE[*run_index as usize] as u32;
            let residual = if bits > 0 { reader.get_bits(bits) as usize } else { 0 };
            count += residual;
            return (count, false);
        }
    }
}

fn run_context(ra: i32, rb: i32, near: i32) -> (usize, i32, i32) {
    let ri_type = (ra - rb).abs() <= near;
    let run_ctx = if ri_type { 1 } else { 0 };
    let px = if ri_type { ra } else { rb };
    let sign = if !ri_type && ra > rb { -1 } else { 1 };
    (run_ctx, px, sign)
}

/// Encode the sample that interrupted a run, picking one of the two
/// run-interruption contexts by how close `ra` and `rb` are.
pub fn encode_run_interruption(
    writer: &mut BitWriter,
    table: &mut ContextTable,
    traits: &Traits,
    run_index: i32,
    ra: i32,
    rb: i32,
    actual: i32,
) -> i32 {
    let (run_ctx, px, sign) = run_context(ra, rb, traits.near);
    let mut errval = actual - px;
    if sign < 0 {
        errval = -errval;
    }
    let quantised = fold_error(traits, quantize_error(traits, errval));

    let (k, twist) = table.run_params(run_ctx);
    let mapped = map_error(quantised, twist);
    let limit = traits.limit - J_TABLE[run_index as usize] - 1;
    encode_golomb(writer, mapped, k, limit, traits.qbpp);
    table.update_run(traits, run_ctx, quantised);

    let mut errval_out = dequantize_error(traits, quantised);
    if sign < 0 {
        errval_out = -errval_out;
    }
    let rx = modulo_range(traits, px + errval_out);
    fix_reconstructed_value(traits, rx)
}

/// Mirror of [`encode_run_interruption`]; returns the reconstructed
/// sample.
pub fn decode_run_interruption(
    reader: &mut BitReader,
    table: &mut ContextTable,
    traits: &Traits,
    run_index: i32,
    ra: i32,
    rb: i32,
) -> i32 {
    let (run_ctx, px, sign) = run_context(ra, rb, traits.near);
    let (k, twist) = table.run_params(run_ctx);
    let limit = traits.limit - J_TABLE[run_index as usize] - 1;
    let mapped = decode_golomb(reader, k, limit, traits.qbpp);
    let quantised = unmap_error(mapped, twist);

    table.update_run(traits, run_ctx, quantised);

    let mut errval = dequantize_error(traits, quantised);
    if sign < 0 {
        errval = -errval;
    }
    let rx = modulo_range(traits, px + errval);
    fix_reconstructed_value(traits, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_length_round_trips_interrupted() {
        for &len in &[0usize, 1, 5, 16, 17, 100] {
            let mut run_index = 0i32;
            let mut writer = BitWriter::new();
            encode_run_length(&mut writer, &mut run_index, len, false);
            let bytes = writer.finish();
            let mut reader = BitReader::new(&bytes);
            let mut decode_index = 0i32;
            let (count, eol) = decode_run_length(&mut reader, &mut decode_index, len + 1000);
            assert_eq!(count, len);
            assert!(!eol);
            assert_eq!(run_index, decode_index);
        }
    }

    #[test]
    fn run_length_round_trips_end_of_line() {
        for &len in &[0usize, 1, 5, 16, 17, 100] {
            let mut run_index = 5i32;
            let mut writer = BitWriter::new();
            encode_run_length(&mut writer, &mut run_index, len, true);
            let bytes = writer.finish();
            let mut reader = BitReader::new(&bytes);
            let mut decode_index = 5i32;
            let (count, eol) = decode_run_length(&mut reader, &mut decode_index, len);
            assert_eq!(count, len);
            assert!(eol);
        }
    }

    #[test]
    fn run_interruption_round_trips() {
        let traits = Traits::new(8, 0, None).unwrap();
        for &(ra, rb, actual) in &[(100, 100, 103), (50, 90, 49), (200, 10, 210)] {
            let mut enc_table = ContextTable::new(&traits);
            let mut writer = BitWriter::new();
            let reconstructed = encode_run_interruption(&mut writer, &mut enc_table, &traits, 3, ra, rb, actual);
            let bytes = writer.finish();

            let mut dec_table = ContextTable::new(&traits);
            let mut reader = BitReader::new(&bytes);
            let decoded = decode_run_interruption(&mut reader, &mut dec_table, &traits, 3, ra, rb);
            assert_eq!(decoded, actual);
            assert_eq!(reconstructed, decoded);
        }
    }
}
