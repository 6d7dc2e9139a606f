//! Single code-block Tier-1 encoder: pass sequencing, layered
//! rate/distortion bookkeeping, and the Reset/TermAll/Pterm/Lazy/VSC
//! code-block style variants.

use log::{debug, info};

use crate::coder::{BypassEncoder, MqEncoder};
use crate::t1::{
    Cblksty, CodeBlockGrid, Subband, CTX_RUN_LENGTH, CTX_UNIFORM, INITIAL_CONTEXT_STATES,
    NUM_CONTEXTS,
};
use crate::t1_error::{validate_cblksty, T1Error};

/// Whether a segment of `EncodedCodeBlock::data` was produced by the MQ
/// coder or by the Lazy style's raw bit packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Arithmetic,
    Bypass,
}

/// One contiguous byte range of `EncodedCodeBlock::data`, in coding
/// order. A new segment starts every time the bitstream is forced to
/// terminate (TermAll, Pterm, the final pass) or switches between
/// arithmetic and raw coding (Lazy).
#[derive(Debug, Clone, Copy)]
pub struct SegmentInfo {
    pub kind: SegmentKind,
    pub byte_len: usize,
    pub num_passes: usize,
    pub reset_contexts: bool,
}

/// Rate/distortion bookkeeping for a single coding pass, the unit a
/// layer boundary is drawn at in Tier-2 (out of scope here, but this is
/// the information it consumes).
#[derive(Debug, Clone, Copy)]
pub struct CodingPassSegment {
    pub pass_index: usize,
    /// Cumulative byte count if the stream were truncated right after
    /// this pass. Exact when `terminated` is true, otherwise an
    /// estimate (current segment length plus termination slack) that
    /// never decreases from the previous pass's rate.
    pub rate: usize,
    /// Cumulative distortion-reduction achieved through this pass.
    /// Monotonically nondecreasing, weighted 4x per bitplane (a lower
    /// bitplane contributes less than a higher one).
    pub distortion_decrease: f64,
    pub terminated: bool,
}

#[derive(Debug)]
pub struct EncodedCodeBlock {
    pub data: Vec<u8>,
    pub segments: Vec<SegmentInfo>,
    pub passes: Vec<CodingPassSegment>,
    pub num_bitplanes: usize,
}

/// Coding passes before this one (1-indexed) in a code-block always
/// stay arithmetically coded even when Lazy is set (ISO/IEC 15444-1
/// Annex D.2).
const LAZY_BYPASS_START_PASS: usize = 4;

const TERMINATION_SLACK: usize = 3;
const BYPASS_TERMINATION_SLACK: usize = 1;

/// The live coder for whichever coding mode the current segment is in.
/// Cleanup passes are always arithmetic; significance and refinement
/// passes switch to raw bit packing once Lazy kicks in at the fourth
/// coding pass.
struct Segment {
    mode: SegmentKind,
    coder: Option<MqEncoder>,
    bypass: Option<BypassEncoder>,
    passes_in_segment: usize,
    reset_contexts: bool,
}

impl Segment {
    fn new_arithmetic(seed: &[(u8, u8)], reset_contexts: bool) -> Self {
        let mut coder = MqEncoder::new(NUM_CONTEXTS);
        coder.init();
        coder.reset_contexts(seed);
        Segment {
            mode: SegmentKind::Arithmetic,
            coder: Some(coder),
            bypass: None,
            passes_in_segment: 0,
            reset_contexts,
        }
    }

    fn new_bypass() -> Self {
        Segment {
            mode: SegmentKind::Bypass,
            coder: None,
            bypass: Some(BypassEncoder::new()),
            passes_in_segment: 0,
            reset_contexts: false,
        }
    }

    fn encode(&mut self, ctx: usize, bit: u8) {
        match self.mode {
            SegmentKind::Arithmetic => self.coder.as_mut().expect("arithmetic coder live").encode(ctx, bit),
            SegmentKind::Bypass => self.bypass.as_mut().expect("bypass coder live").put_bit(bit),
        }
    }

    fn estimated_len(&self) -> usize {
        match self.mode {
            SegmentKind::Arithmetic => self.coder.as_ref().unwrap().estimated_len() + TERMINATION_SLACK,
            SegmentKind::Bypass => self.bypass.as_ref().unwrap().estimated_len() + BYPASS_TERMINATION_SLACK,
        }
    }
}

/// Switch `seg` to `desired` mode if it isn't already, flushing whatever
/// was live into `data`/`segments` first. A segment with zero passes
/// coded yet is replaced in place without emitting an empty segment.
fn ensure_mode(
    seg: &mut Segment,
    desired: SegmentKind,
    data: &mut Vec<u8>,
    segments: &mut Vec<SegmentInfo>,
    carried_contexts: &mut Vec<(u8, u8)>,
) {
    if seg.mode == desired {
        return;
    }
    if seg.passes_in_segment > 0 {
        flush_segment(seg, data, segments, carried_contexts, false);
    }
    *seg = match desired {
        SegmentKind::Arithmetic => Segment::new_arithmetic(carried_contexts, false),
        SegmentKind::Bypass => Segment::new_bypass(),
    };
}

fn flush_segment(
    seg: &mut Segment,
    data: &mut Vec<u8>,
    segments: &mut Vec<SegmentInfo>,
    carried_contexts: &mut Vec<(u8, u8)>,
    reset_after: bool,
) {
    match seg.mode {
        SegmentKind::Bypass => {
            let bytes = seg.bypass.take().expect("bypass coder live").finish();
            segments.push(SegmentInfo {
                kind: SegmentKind::Bypass,
                byte_len: bytes.len(),
                num_passes: seg.passes_in_segment,
                reset_contexts: false,
            });
            data.extend_from_slice(&bytes);
        }
        SegmentKind::Arithmetic => {
            let mut coder = seg.coder.take().expect("arithmetic coder live");
            *carried_contexts = coder.context_states();
            let bytes = coder.flush();
            segments.push(SegmentInfo {
                kind: SegmentKind::Arithmetic,
                byte_len: bytes.len(),
                num_passes: seg.passes_in_segment,
                reset_contexts: seg.reset_contexts,
            });
            data.extend_from_slice(&bytes);
            if reset_after {
                *carried_contexts = INITIAL_CONTEXT_STATES.to_vec();
            }
        }
    }
}

pub fn encode_code_block(
    coefficients: &[i32],
    width: usize,
    height: usize,
    orientation: Subband,
    num_bitplanes: usize,
    roishift: usize,
    cblksty: Cblksty,
) -> Result<EncodedCodeBlock, T1Error> {
    if width == 0 || height == 0 || width * height != coefficients.len() {
        return Err(T1Error::InvalidDimensions { width, height });
    }
    validate_cblksty(cblksty)?;

    let mut grid = CodeBlockGrid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            grid.set_coefficient(x, y, coefficients[y * width + x]);
        }
    }

    info!(
        "t1 encode: {}x{} block, {} bitplanes, roishift={}, cblksty=0x{:02X}",
        width,
        height,
        num_bitplanes,
        roishift,
        cblksty.bits()
    );

    let mut data = Vec::new();
    let mut segments = Vec::new();
    let mut passes = Vec::new();
    let mut pass_index = 0usize;
    let mut cumulative_distortion = 0.0f64;
    let mut carried_contexts = INITIAL_CONTEXT_STATES.to_vec();
    let mut seg = Segment::new_arithmetic(&carried_contexts, true);
    let force_term_all = cblksty.contains(Cblksty::TERM_ALL) || cblksty.contains(Cblksty::PTERM);
    let reset_each_pass = cblksty.contains(Cblksty::RESET);
    let vsc = cblksty.contains(Cblksty::VSC);
    let lazy = cblksty.contains(Cblksty::LAZY);

    // Planes at or above roishift carry only background masked out of
    // this pass (the ROI was shifted below roishift before T1 ever sees
    // it), so they are never coded (§3.1).
    let effective_top = num_bitplanes.min(roishift);

    for bp in (0..num_bitplanes).rev() {
        if bp >= roishift {
            continue;
        }
        let is_top = bp == effective_top.saturating_sub(1);
        let weight = 4f64.powi(bp as i32);

        if !is_top {
            pass_index += 1;
            let desired = if lazy && pass_index >= LAZY_BYPASS_START_PASS {
                SegmentKind::Bypass
            } else {
                SegmentKind::Arithmetic
            };
            ensure_mode(&mut seg, desired, &mut data, &mut segments, &mut carried_contexts);
            let changed = run_significance_pass(&mut grid, &mut seg, orientation, bp, vsc);
            cumulative_distortion += changed as f64 * weight;
            finish_pass(
                &mut passes,
                &mut segments,
                &mut data,
                &mut seg,
                &mut carried_contexts,
                pass_index,
                cumulative_distortion,
                force_term_all,
                reset_each_pass,
            );

            pass_index += 1;
            let desired = if lazy && pass_index >= LAZY_BYPASS_START_PASS {
                SegmentKind::Bypass
            } else {
                SegmentKind::Arithmetic
            };
            ensure_mode(&mut seg, desired, &mut data, &mut segments, &mut carried_contexts);
            let refined = run_refinement_pass(&mut grid, &mut seg, bp, vsc);
            cumulative_distortion += refined as f64 * weight * 0.5;
            finish_pass(
                &mut passes,
                &mut segments,
                &mut data,
                &mut seg,
                &mut carried_contexts,
                pass_index,
                cumulative_distortion,
                force_term_all,
                reset_each_pass,
            );
        }

        pass_index += 1;
        ensure_mode(
            &mut seg,
            SegmentKind::Arithmetic,
            &mut data,
            &mut segments,
            &mut carried_contexts,
        );
        let changed = run_cleanup_pass(&mut grid, &mut seg, orientation, bp, vsc);
        cumulative_distortion += changed as f64 * weight;
        grid.clear_all_visited();
        let is_last_pass = bp == 0;
        finish_pass(
            &mut passes,
            &mut segments,
            &mut data,
            &mut seg,
            &mut carried_contexts,
            pass_index,
            cumulative_distortion,
            force_term_all || is_last_pass,
            reset_each_pass,
        );

        debug!("t1 encode: bitplane {} done, {} newly significant", bp, changed);
    }

    Ok(EncodedCodeBlock {
        data,
        segments,
        passes,
        num_bitplanes,
    })
}

#[allow(clippy::too_many_arguments)]
fn finish_pass(
    passes: &mut Vec<CodingPassSegment>,
    segments: &mut Vec<SegmentInfo>,
    data: &mut Vec<u8>,
    seg: &mut Segment,
    carried_contexts: &mut Vec<(u8, u8)>,
    pass_index: usize,
    cumulative_distortion: f64,
    force_terminate: bool,
    reset_after: bool,
) {
    seg.passes_in_segment += 1;

    if !force_terminate {
        let estimate = data.len() + seg.estimated_len();
        let rate = estimate.max(passes.last().map(|p| p.rate).unwrap_or(0));
        passes.push(CodingPassSegment {
            pass_index,
            rate,
            distortion_decrease: cumulative_distortion,
            terminated: false,
        });
        return;
    }

    flush_segment(seg, data, segments, carried_contexts, reset_after);
    *seg = Segment::new_arithmetic(carried_contexts, reset_after);

    passes.push(CodingPassSegment {
        pass_index,
        rate: data.len(),
        distortion_decrease: cumulative_distortion,
        terminated: true,
    });
}

fn run_significance_pass(
    grid: &mut CodeBlockGrid,
    seg: &mut Segment,
    orientation: Subband,
    bitplane: usize,
    vsc: bool,
) -> usize {
    let mut new_sig = 0;
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
                let bit = ((grid.coefficient(x, y).unsigned_abs() >> bitplane) & 1) as u8;
                seg.encode(ctx as usize, bit);
                grid.set_visited(x, y);
                if bit == 1 {
                    let negative = grid.coefficient(x, y) < 0;
                    let (sign_ctx, xor) = grid.sign_coding_context(x, y, vsc);
                    seg.encode(sign_ctx as usize, (negative as u8) ^ xor);
                    grid.mark_significant(x, y, negative);
                    new_sig += 1;
                }
            }
        }
        y0 = y1;
    }
    new_sig
}

fn run_refinement_pass(grid: &mut CodeBlockGrid, seg: &mut Segment, bitplane: usize, vsc: bool) -> usize {
    let mut refined = 0;
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
                let bit = ((grid.coefficient(x, y).unsigned_abs() >> bitplane) & 1) as u8;
                seg.encode(ctx as usize, bit);
                grid.set_visited(x, y);
                grid.set_refined(x, y);
                refined += 1;
            }
        }
        y0 = y1;
    }
    refined
}

fn run_cleanup_pass(
    grid: &mut CodeBlockGrid,
    seg: &mut Segment,
    orientation: Subband,
    bitplane: usize,
    vsc: bool,
) -> usize {
    let mut new_sig = 0;
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
                    new_sig += run_length_column(grid, seg, orientation, bitplane, vsc, x, y0);
                    continue;
                }
            }
            for y in y0..y1 {
                if grid.is_significant(x, y) || grid.is_visited(x, y) {
                    continue;
                }
                let ctx = grid.zero_coding_context(x, y, orientation, vsc);
                let bit = ((grid.coefficient(x, y).unsigned_abs() >> bitplane) & 1) as u8;
                seg.encode(ctx as usize, bit);
                grid.set_visited(x, y);
                if bit == 1 {
                    let negative = grid.coefficient(x, y) < 0;
                    let (sign_ctx, xor) = grid.sign_coding_context(x, y, vsc);
                    seg.encode(sign_ctx as usize, (negative as u8) ^ xor);
                    grid.mark_significant(x, y, negative);
                    new_sig += 1;
                }
            }
        }
        y0 = y1;
    }
    new_sig
}

fn run_length_column(
    grid: &mut CodeBlockGrid,
    seg: &mut Segment,
    orientation: Subband,
    bitplane: usize,
    vsc: bool,
    x: usize,
    y0: usize,
) -> usize {
    let bits: Vec<u8> = (y0..y0 + 4)
        .map(|y| ((grid.coefficient(x, y).unsigned_abs() >> bitplane) & 1) as u8)
        .collect();
    let any_one = bits.iter().any(|&b| b == 1);
    seg.encode(CTX_RUN_LENGTH, any_one as u8);
    if !any_one {
        for y in y0..y0 + 4 {
            grid.set_visited(x, y);
        }
        return 0;
    }

    let first_one = bits.iter().position(|&b| b == 1).unwrap();
    seg.encode(CTX_UNIFORM, ((first_one >> 1) & 1) as u8);
    seg.encode(CTX_UNIFORM, (first_one & 1) as u8);

    let mut new_sig = 0;
    for (i, y) in (y0..y0 + 4).enumerate() {
        if i < first_one {
            grid.set_visited(x, y);
            continue;
        }
        let bit = if i == first_one {
            1
        } else {
            let ctx = grid.zero_coding_context(x, y, orientation, vsc);
            let b = ((grid.coefficient(x, y).unsigned_abs() >> bitplane) & 1) as u8;
            seg.encode(ctx as usize, b);
            b
        };
        grid.set_visited(x, y);
        if bit == 1 {
            let negative = grid.coefficient(x, y) < 0;
            let (sign_ctx, xor) = grid.sign_coding_context(x, y, vsc);
            seg.encode(sign_ctx as usize, (negative as u8) ^ xor);
            grid.mark_significant(x, y, negative);
            new_sig += 1;
        }
    }
    new_sig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_dimensions() {
        let coeffs = [1, 2, 3];
        let err = encode_code_block(&coeffs, 2, 2, Subband::LL, 4, 4, Cblksty::default()).unwrap_err();
        assert!(matches!(err, T1Error::InvalidDimensions { .. }));
    }

    #[test]
    fn rejects_pterm_without_term_all() {
        let coeffs = [0, 0, 0, 0];
        let style = Cblksty::new(Cblksty::PTERM);
        let err = encode_code_block(&coeffs, 2, 2, Subband::LL, 4, 4, style).unwrap_err();
        assert!(matches!(err, T1Error::InconsistentCblksty { .. }));
    }

    #[test]
    fn encodes_small_block_and_reports_monotonic_rate() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let result = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 4, Cblksty::default()).unwrap();
        assert!(!result.data.is_empty());
        let mut last_rate = 0;
        let mut last_distortion = 0.0;
        for pass in &result.passes {
            assert!(pass.rate >= last_rate);
            assert!(pass.distortion_decrease >= last_distortion);
            last_rate = pass.rate;
            last_distortion = pass.distortion_decrease;
        }
        assert!(result.passes.last().unwrap().terminated);
    }

    #[test]
    fn all_zero_block_still_terminates_cleanly() {
        let coeffs = [0i32; 16];
        let result = encode_code_block(&coeffs, 4, 4, Subband::HH, 3, 3, Cblksty::default()).unwrap();
        assert!(result.passes.last().unwrap().terminated);
        assert_eq!(result.passes.last().unwrap().distortion_decrease, 0.0);
    }

    #[test]
    fn term_all_produces_one_segment_per_pass() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let style = Cblksty::new(Cblksty::TERM_ALL);
        let result = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 4, style).unwrap();
        assert_eq!(result.segments.len(), result.passes.len());
        assert!(result.passes.iter().all(|p| p.terminated));
    }

    #[test]
    fn lazy_style_switches_to_bypass_segments() {
        let coeffs = [31, -29, 17, 0, -5, 3, 9, -11, 2, 0, 1, -1, 6, 4, -2, 8];
        let style = Cblksty::new(Cblksty::LAZY);
        let result = encode_code_block(&coeffs, 4, 4, Subband::HL, 5, 5, style).unwrap();
        assert!(result.segments.iter().any(|s| s.kind == SegmentKind::Bypass));
        // a cleanup pass always follows a bypass window, so the last
        // segment is always arithmetic.
        assert_eq!(result.segments.last().unwrap().kind, SegmentKind::Arithmetic);
    }

    #[test]
    fn roishift_below_num_bitplanes_skips_top_planes() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let result = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 2, Cblksty::default()).unwrap();
        assert!(result.passes.len() <= 1 + (2 - 1) * 3);
    }

    #[test]
    fn roishift_zero_codes_nothing() {
        let coeffs = [5, -3, 0, 7, -1, 2, 0, 0, 4];
        let result = encode_code_block(&coeffs, 3, 3, Subband::LL, 4, 0, Cblksty::default()).unwrap();
        assert!(result.data.is_empty());
        assert!(result.passes.is_empty());
    }
}
