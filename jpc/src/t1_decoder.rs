//! Single code-block Tier-1 decoder, the mirror of `t1_encoder`.

use log::{debug, info};

use crate::coder::{BypassDecoder, MqDecoder};
use crate::t1::{Cblksty, CodeBlockGrid, Subband, CTX_RUN_LENGTH, CTX_UNIFORM, INITIAL_CONTEXT_STATES, NUM_CONTEXTS};
use crate::t1_encoder::{SegmentInfo, SegmentKind};
use crate::t1_error::{validate_cblksty, T1Error};

pub struct DecodedCodeBlock {
    pub coefficients: Vec<i32>,
    pub width: usize,
    pub height: usize,
}

struct ArithmeticCursor<'a> {
    decoder: MqDecoder,
    data: &'a [u8],
}

/// Decode a single code-block from its encoded segments.
///
/// `strict` controls truncation handling: when `true`, running out of
/// segments before `num_bitplanes` worth of passes have been consumed
/// is an error; when `false`, decoding stops and returns the
/// best-effort reconstruction so far (the standard behaviour for a
/// bitstream deliberately truncated at a rate/quality layer boundary).
pub fn decode_code_block(
    data: &[u8],
    segments: &[SegmentInfo],
    width: usize,
    height: usize,
    orientation: Subband,
    num_bitplanes: usize,
    roishift: usize,
    cblksty: Cblksty,
    strict: bool,
) -> Result<DecodedCodeBlock, T1Error> {
    if width == 0 || height == 0 {
        return Err(T1Error::InvalidDimensions { width, height });
    }
    validate_cblksty(cblksty)?;

    info!(
        "t1 decode: {}x{} block, {} bitplanes, roishift={}, {} segments",
        width,
        height,
        num_bitplanes,
        roishift,
        segments.len()
    );

    let mut grid = CodeBlockGrid::new(width, height);
    let vsc = cblksty.contains(Cblksty::VSC);

    // Mirrors the encoder: planes at or above roishift are masked
    // background and were never coded (§3.1).
    let effective_top = num_bitplanes.min(roishift);
    let total_passes = if effective_top == 0 { 0 } else { 1 + (effective_top - 1) * 3 };

    let mut segment_iter = SegmentCursor::new(data, segments);
    let mut pass_index = 0usize;
    let mut truncated_at = None;

    'bitplanes: for bp in (0..num_bitplanes).rev() {
        if bp >= roishift {
            continue;
        }
        let is_top = bp == effective_top.saturating_sub(1);

        if !is_top {
            pass_index += 1;
            if !segment_iter.ensure_pass(pass_index) {
                truncated_at = Some(pass_index);
                break 'bitplanes;
            }
            run_significance_pass(&mut grid, &mut segment_iter, orientation, bp, vsc);

            pass_index += 1;
            if !segment_iter.ensure_pass(pass_index) {
                truncated_at = Some(pass_index);
                break 'bitplanes;
            }
            run_refinement_pass(&mut grid, &mut segment_iter, bp, vsc);
        }

        pass_index += 1;
        if !segment_iter.ensure_pass(pass_index) {
            truncated_at = Some(pass_index);
            break 'bitplanes;
        }
        run_cleanup_pass(&mut grid, &mut segment_iter, orientation, bp, vsc);
        grid.clear_all_visited();

        debug!("t1 decode: bitplane {} done", bp);
    }

    if let Some(at) = truncated_at {
        if strict {
            return Err(T1Error::Truncated {
                expected_passes: total_passes,
                available_passes: at.saturating_sub(1),
            });
        }
    }

    let mut coefficients = vec![0i32; width * height];
    for y in 0..height {
        for x in 0..width {
            coefficients[y * width + x] = grid.coefficient(x, y);
        }
    }

    Ok(DecodedCodeBlock {
        coefficients,
        width,
        height,
    })
}

/// Walks `segments` handing out decoder handles pass by pass, creating a
/// fresh `MqDecoder`/`BypassDecoder` at each segment boundary exactly
/// where the encoder created a fresh encoder.
struct SegmentCursor<'a> {
    data: &'a [u8],
    segments: &'a [SegmentInfo],
    segment_idx: usize,
    offset: usize,
    passes_consumed_in_segment: usize,
    decoder: Option<MqDecoder>,
    bypass: Option<BypassDecoder<'a>>,
    carried_contexts: Vec<(u8, u8)>,
}

impl<'a> SegmentCursor<'a> {
    fn new(data: &'a [u8], segments: &'a [SegmentInfo]) -> Self {
        SegmentCursor {
            data,
            segments,
            segment_idx: 0,
            offset: 0,
            passes_consumed_in_segment: 0,
            decoder: None,
            bypass: None,
            carried_contexts: INITIAL_CONTEXT_STATES.to_vec(),
        }
    }

    /// Make sure a decoder (arithmetic or bypass) is ready to serve
    /// `pass_index`, advancing to the next segment if the current one
    /// has already served all of its passes. Returns `false` if there
    /// is no more data (truncated bitstream).
    fn ensure_pass(&mut self, _pass_index: usize) -> bool {
        if self.decoder.is_none() && self.bypass.is_none() {
            return self.advance_segment();
        }
        if self.passes_consumed_in_segment
            >= self
                .segments
                .get(self.segment_idx.saturating_sub(1))
                .map(|s| s.num_passes)
                .unwrap_or(0)
        {
            return self.advance_segment();
        }
        true
    }

    fn advance_segment(&mut self) -> bool {
        let Some(info) = self.segments.get(self.segment_idx) else {
            return false;
        };
        let end = (self.offset + info.byte_len).min(self.data.len());
        let segment_bytes = &self.data[self.offset..end];
        self.offset = end;
        self.segment_idx += 1;
        self.passes_consumed_in_segment = 0;

        match info.kind {
            SegmentKind::Arithmetic => {
                self.bypass = None;
                let mut decoder = MqDecoder::new(NUM_CONTEXTS);
                decoder.init(segment_bytes);
                let seed = if info.reset_contexts {
                    INITIAL_CONTEXT_STATES.to_vec()
                } else {
                    self.carried_contexts.clone()
                };
                decoder.reset_contexts(&seed);
                self.decoder = Some(decoder);
            }
            SegmentKind::Bypass => {
                self.decoder = None;
                self.bypass = Some(BypassDecoder::new(segment_bytes));
            }
        }
        true
    }

    fn finish_pass(&mut self) {
        self.passes_consumed_in_segment += 1;
        if let Some(decoder) = &self.decoder {
            self.carried_contexts = decoder.context_states();
        }
    }

    fn decode_bit(&mut self, cx: usize) -> u8 {
        if let Some(bypass) = &mut self.bypass {
            bypass.get_bit()
        } else {
            self.decoder.as_mut().expect("decoder ready").decode(cx)
        }
    }
}

fn run_significance_pass(
    grid: &mut CodeBlockGrid,
    cursor: &mut SegmentCursor,
    orientation: Subband,
    bitplane: usize,
    vsc: bool,
) {
    let (width, height) = (grid.width(), grid.height());
    let mut y0 = 0;
    while y0 < height {
        let y1 = (y0 + 4).min(height);
        for x in 0..width {
            for y in y0..y1 {
                if grid.is_significant(x, y) {
                    continue;
                }
                let ctx = grid.zero_coding_context(x, y, orientation, vsc);
                if ctx == 0 {
                    continue;
                }
                let bit = cursor.decode_bit(ctx as usize);
                grid.set_visited(x, y);
                if bit == 1 {
                    let (sign_ctx, xor) = grid.sign_coding_context(x, y, vsc);
                    let sign_bit = cursor.decode_bit(sign_ctx as usize);
                    let negative = (sign_bit ^ xor) != 0;
                    grid.mark_significant(x, y, negative);
                    apply_sign_and_magnitude(grid, x, y, bitplane, negative);
                }
            }
        }
        y0 = y1;
    }
    cursor.finish_pass();
}

fn run_refinement_pass(grid: &mut CodeBlockGrid, cursor: &mut SegmentCursor, bitplane: usize, vsc: bool) {
    let (width, height) = (grid.width(), grid.height());
    let mut y0 = 0;
    while y0 < height {
        let y1 = (y0 + 4).min(height);
        for x in 0..width {
            for y in y0..y1 {
                if !grid.is_significant(x, y) || grid.is_visited(x, y) {
                    continue;
                }
                let ctx = grid.refinement_context(x, y, vsc);
                let bit = cursor.decode_bit(ctx as usize);
                grid.set_visited(x, y);
                grid.set_refined(x, y);
                if bit == 1 {
                    let value = grid.coefficient(x, y);
                    let magnitude = value.unsigned_abs() | (1 << bitplane);
                    grid.set_coefficient(x, y, if value < 0 { -(magnitude as i32) } else { magnitude as i32 });
                }
            }
        }
        y0 = y1;
    }
    cursor.finish_pass();
}

fn run_cleanup_pass(
    grid: &mut CodeBlockGrid,
    cursor: &mut SegmentCursor,
    orientation: Subband,
    bitplane: usize,
    vsc: bool,
) {
    let (width, height) = (grid.width(), grid.height());
    let mut y0 = 0;
    while y0 < height {
        let y1 = (y0 + 4).min(height);
        let full_stripe = y1 - y0 == 4;
        for x in 0..width {
            if full_stripe {
                let eligible = (y0..y1).all(|y| {
                    !grid.is_significant(x, y)
                        && !grid.is_visited(x, y)
                        && grid.zero_coding_context(x, y, orientation, vsc) == 0
                });
                if eligible {
                    run_length_column(grid, cursor, orientation, bitplane, vsc, x, y0);
                    continue;
                }
            }
            for y in y0..y1 {
                if grid.is_significant(x, y) || grid.is_visited(x, y) {
                    continue;
                }
                let ctx = grid.zero_coding_context(x, y, orientation, vsc);
                let bit = cursor.decode_bit(ctx as usize);
                grid.set_visited(x, y);
                if bit == 1 {
                    let (sign_ctx, xor) = grid.sign_coding_context(x, y, vsc);
                    let sign_bit = cursor.decode_bit(sign_ctx as usize);
                    let negative = (sign_bit ^ xor) != 0;
                    grid.mark_significant(x, y, negative);
                    apply_sign_and_magnitude(grid, x, y, bitplane, negative);
                }
            }
        }
        y0 = y1;
    }
    cursor.finish_pass();
}

fn run_length_column(
    grid: &mut CodeBlockGrid,
    cursor: &mut SegmentCursor,
    orientation: Subband,
    bitplane: usize,
    vsc: bool,
    x: usize,
    y0: usize,
) {
    let any_one = cursor.decode_bit(CTX_RUN_LENGTH) == 1;
    if !any_one {
        for y in y0..y0 + 4 {
            grid.set_visited(x, y);
        }
        return;
    }

    let hi = cursor.decode_bit(CTX_UNIFORM);
    let lo = cursor.decode_bit(CTX_UNIFORM);
    let first_one = ((hi << 1) | lo) as usize;

    for (i, y) in (y0..y0 + 4).enumerate() {
        if i < first_one {
            grid.set_visited(x, y);
            continue;
        }
        let bit = if i == first_one {
            1
        } else {
            let ctx = grid.zero_coding_context(x, y, orientation, vsc);
            cursor.decode_bit(ctx as usize)
        };
        grid.set_visited(x, y);
        if bit == 1 {
            let (sign_ctx, xor) = grid.sign_coding_context(x, y, vsc);
            let sign_bit = cursor.decode_bit(sign_ctx as usize);
            let negative = (sign_bit ^ xor) != 0;
            grid.mark_significant(x, y, negative);
            apply_sign_and_magnitude(grid, x, y, bitplane, negative);
        }
    }
}

fn apply_sign_and_magnitude(grid: &mut CodeBlockGrid, x: usize, y: usize, bitplane: usize, negative: bool) {
    let magnitude = 1i32 << bitplane;
    grid.set_coefficient(x, y, if negative { -magnitude } else { magnitude });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::t1_encoder::encode_code_block;

    fn round_trip(coeffs: &[i32], width: usize, height: usize, orientation: Subband, num_bitplanes: usize) {
        let encoded =
            encode_code_block(coeffs, width, height, orientation, num_bitplanes, num_bitplanes, Cblksty::default())
                .unwrap();
        let decoded = decode_code_block(
            &encoded.data,
            &encoded.segments,
            width,
            height,
            orientation,
            num_bitplanes,
            num_bitplanes,
            Cblksty::default(),
            true,
        )
        .unwrap();
        assert_eq!(decoded.coefficients, coeffs);
    }

    #[test]
    fn round_trips_a_small_block() {
        round_trip(&[5, -3, 0, 7, -1, 2, 0, 0, 4], 3, 3, Subband::LL, 4);
    }

    #[test]
    fn round_trips_all_zero_block() {
        round_trip(&[0; 16], 4, 4, Subband::HH, 3);
    }

    #[test]
    fn round_trips_single_column() {
        round_trip(&[7, -6, 5, -4, 3, -2, 1, 0], 1, 8, Subband::LH, 3);
    }

    #[test]
    fn round_trips_with_term_all() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let style = Cblksty::new(Cblksty::TERM_ALL);
        let encoded = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 4, style).unwrap();
        let decoded = decode_code_block(
            &encoded.data,
            &encoded.segments,
            3,
            3,
            Subband::LL,
            4,
            4,
            style,
            true,
        )
        .unwrap();
        assert_eq!(decoded.coefficients, coeffs);
    }

    #[test]
    fn round_trips_with_reset() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let style = Cblksty::new(Cblksty::RESET | Cblksty::TERM_ALL);
        let encoded = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 4, style).unwrap();
        let decoded = decode_code_block(
            &encoded.data,
            &encoded.segments,
            3,
            3,
            Subband::LL,
            4,
            4,
            style,
            true,
        )
        .unwrap();
        assert_eq!(decoded.coefficients, coeffs);
    }

    #[test]
    fn round_trips_with_vsc() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4, 1, -1, 6];
        let style = Cblksty::new(Cblksty::VSC);
        round_trip(&coeffs, 3, 4, Subband::LL, 4);
        let _ = style;
    }

    #[test]
    fn round_trips_with_lazy_bypass() {
        let coeffs = [31, -29, 17, 0, -5, 3, 9, -11, 2, 0, 1, -1, 6, 4, -2, 8];
        let style = Cblksty::new(Cblksty::LAZY);
        let encoded = encode_code_block(&coeffs, 4, 4, Subband::HL, 5, 5, style).unwrap();
        assert!(encoded
            .segments
            .iter()
            .any(|s| s.kind == SegmentKind::Bypass));
        let decoded = decode_code_block(
            &encoded.data,
            &encoded.segments,
            4,
            4,
            Subband::HL,
            5,
            5,
            style,
            true,
        )
        .unwrap();
        assert_eq!(decoded.coefficients, coeffs);
    }

    #[test]
    fn truncated_bitstream_errors_in_strict_mode() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let style = Cblksty::new(Cblksty::TERM_ALL);
        let encoded = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 4, style).unwrap();
        // Drop the last terminated segment's worth of passes so the
        // segment table promises more passes than the data has segments
        // to back them.
        let kept_segments = &encoded.segments[..encoded.segments.len() - 1];
        let kept_len: usize = kept_segments.iter().map(|s| s.byte_len).sum();

        let err = decode_code_block(
            &encoded.data[..kept_len],
            kept_segments,
            3,
            3,
            Subband::LL,
            4,
            4,
            style,
            true,
        );
        assert!(matches!(err, Err(T1Error::Truncated { .. })));

        let lenient = decode_code_block(
            &encoded.data[..kept_len],
            kept_segments,
            3,
            3,
            Subband::LL,
            4,
            4,
            style,
            false,
        );
        assert!(lenient.is_ok());
    }

    #[test]
    fn roishift_masks_background_bitplanes() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        // roishift=2 masks the top two bitplanes of a 4-bitplane block;
        // the decoder should only ever see magnitudes representable in
        // the remaining 2 planes.
        let encoded = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 2, Cblksty::default()).unwrap();
        let decoded = decode_code_block(
            &encoded.data,
            &encoded.segments,
            3,
            3,
            Subband::LL,
            4,
            2,
            Cblksty::default(),
            true,
        )
        .unwrap();
        for value in decoded.coefficients {
            assert!(value.unsigned_abs() < (1 << 2));
        }
    }

    #[test]
    fn roishift_zero_masks_entire_block() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let encoded = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 0, Cblksty::default()).unwrap();
        assert!(encoded.data.is_empty());
        assert!(encoded.segments.is_empty());
        let decoded = decode_code_block(
            &encoded.data,
            &encoded.segments,
            3,
            3,
            Subband::LL,
            4,
            0,
            Cblksty::default(),
            true,
        )
        .unwrap();
        assert_eq!(decoded.coefficients, [0; 9]);
    }
}
