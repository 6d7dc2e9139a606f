//! Tier-1 code-block state: the padded coefficient/flag grid and the
//! context-derivation functions that sit on top of `t1_tables`.

use crate::t1_tables::{SIGN_CODING_CONTEXT_TABLE, SIGN_PREDICTION_TABLE, ZERO_CODING_TABLE};

/// Subband orientation, matching the `orientation * 512` stride baked
/// into `ZERO_CODING_TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subband {
    LL = 0,
    HL = 1,
    LH = 2,
    HH = 3,
}

/// Number of MQ contexts a code-block uses: the 9 zero-coding contexts
/// (0..=8), the 5 sign-coding contexts (9..=13), the 3 magnitude-
/// refinement contexts (14..=16), plus the run-length and uniform
/// contexts used by the cleanup pass's run shortcut.
pub(crate) const NUM_CONTEXTS: usize = 19;
pub(crate) const CTX_RUN_LENGTH: usize = 17;
pub(crate) const CTX_UNIFORM: usize = 18;

/// Initial `(state, mps)` seed for every context (Table D.7). Context 0
/// starts pre-adapted because the all-insignificant pattern is by far
/// the most common zero-coding symbol; the run-length and uniform
/// contexts start at the same pre-adapted state for the same reason.
pub(crate) const INITIAL_CONTEXT_STATES: [(u8, u8); NUM_CONTEXTS] = {
    let mut states = [(0u8, 0u8); NUM_CONTEXTS];
    states[0] = (4, 0);
    states[CTX_RUN_LENGTH] = (3, 0);
    states[CTX_UNIFORM] = (46, 0);
    states
};

// Per-cell flag bits. SIG_* / SIGN_* mirror a neighbour's state so every
// context lookup is a handful of ANDs against the cell's own word,
// never a reach into a neighbouring cell.
pub(crate) const SIG: u32 = 1 << 0;
pub(crate) const VISIT: u32 = 1 << 1;
pub(crate) const REFINE: u32 = 1 << 2;
pub(crate) const SIGN: u32 = 1 << 3;
pub(crate) const SIG_N: u32 = 1 << 4;
pub(crate) const SIG_S: u32 = 1 << 5;
pub(crate) const SIG_E: u32 = 1 << 6;
pub(crate) const SIG_W: u32 = 1 << 7;
pub(crate) const SIG_NE: u32 = 1 << 8;
pub(crate) const SIG_NW: u32 = 1 << 9;
pub(crate) const SIG_SE: u32 = 1 << 10;
pub(crate) const SIG_SW: u32 = 1 << 11;
pub(crate) const SIGN_N: u32 = 1 << 12;
pub(crate) const SIGN_S: u32 = 1 << 13;
pub(crate) const SIGN_E: u32 = 1 << 14;
pub(crate) const SIGN_W: u32 = 1 << 15;

const NEIGHBOUR_SIG: u32 = SIG_N | SIG_S | SIG_E | SIG_W | SIG_NE | SIG_NW | SIG_SE | SIG_SW;

/// Code-block coding-style flags (`Scb`, ISO/IEC 15444-1 Table A.19).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cblksty(u8);

impl Cblksty {
    pub const LAZY: u8 = 0x01;
    pub const RESET: u8 = 0x02;
    pub const TERM_ALL: u8 = 0x04;
    pub const VSC: u8 = 0x08;
    pub const PTERM: u8 = 0x10;
    pub const SEG_SYM: u8 = 0x20;

    pub fn new(bits: u8) -> Self {
        Cblksty(bits)
    }

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// A single code-block's coefficient and significance-flag grid, padded
/// by one cell on every side so neighbour lookups never need a bounds
/// check (`idx ± stride ± 1` always lands inside the buffer).
pub(crate) struct CodeBlockGrid {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<i32>,
    flags: Vec<u32>,
}

impl CodeBlockGrid {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        let stride = width + 2;
        let size = stride * (height + 2);
        CodeBlockGrid {
            width,
            height,
            stride,
            data: vec![0; size],
            flags: vec![0; size],
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub(crate) fn index(&self, x: usize, y: usize) -> usize {
        (y + 1) * self.stride + (x + 1)
    }

    pub(crate) fn coefficient(&self, x: usize, y: usize) -> i32 {
        self.data[self.index(x, y)]
    }

    pub(crate) fn set_coefficient(&mut self, x: usize, y: usize, value: i32) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub(crate) fn flags(&self, x: usize, y: usize) -> u32 {
        self.flags[self.index(x, y)]
    }

    pub(crate) fn is_significant(&self, x: usize, y: usize) -> bool {
        self.flags(x, y) & SIG != 0
    }

    pub(crate) fn is_visited(&self, x: usize, y: usize) -> bool {
        self.flags(x, y) & VISIT != 0
    }

    pub(crate) fn set_visited(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.flags[idx] |= VISIT;
    }

    pub(crate) fn is_refined(&self, x: usize, y: usize) -> bool {
        self.flags(x, y) & REFINE != 0
    }

    pub(crate) fn set_refined(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.flags[idx] |= REFINE;
    }

    /// Clear VISIT on every cell. Called at the start of a cleanup pass
    /// (VISIT only matters for the pass it was set in, so it must not
    /// survive into the next bitplane's significance pass).
    pub(crate) fn clear_all_visited(&mut self) {
        for f in self.flags.iter_mut() {
            *f &= !VISIT;
        }
    }

    /// Record that `(x, y)` just became significant during this
    /// bitplane, updating the eight neighbours' SIG_*/SIGN_* mirror bits
    /// so later context lookups at those neighbours see it.
    pub(crate) fn mark_significant(&mut self, x: usize, y: usize, negative: bool) {
        let idx = self.index(x, y);
        self.flags[idx] |= SIG;
        if negative {
            self.flags[idx] |= SIGN;
        }
        let stride = self.stride;

        let orthogonal = [
            (idx - stride, SIG_S, Some(SIGN_S)), // north neighbour gains "south is sig"
            (idx + stride, SIG_N, Some(SIGN_N)), // south neighbour gains "north is sig"
            (idx - 1, SIG_E, Some(SIGN_E)),      // west neighbour gains "east is sig"
            (idx + 1, SIG_W, Some(SIGN_W)),      // east neighbour gains "west is sig"
        ];
        for (n_idx, sig_bit, sign_bit) in orthogonal {
            self.flags[n_idx] |= sig_bit;
            if let Some(sign_bit) = sign_bit {
                if negative {
                    self.flags[n_idx] |= sign_bit;
                }
            }
        }

        let diagonal = [
            (idx - stride - 1, SIG_SE),
            (idx - stride + 1, SIG_SW),
            (idx + stride - 1, SIG_NE),
            (idx + stride + 1, SIG_NW),
        ];
        for (n_idx, sig_bit) in diagonal {
            self.flags[n_idx] |= sig_bit;
        }
    }

    /// Zero-coding context for `(x, y)` given the subband orientation
    /// (Table D.1). When `vsc` is set and `(x, y)` sits on the last row
    /// of a 4-row stripe, the south-side neighbour bits are masked out:
    /// that row belongs to the next stripe, not yet coded, and the
    /// vertically-causal-context style forbids depending on it.
    pub(crate) fn zero_coding_context(
        &self,
        x: usize,
        y: usize,
        orientation: Subband,
        vsc: bool,
    ) -> u8 {
        let mut f = self.flags(x, y);
        if vsc && y % 4 == 3 {
            f &= !(SIG_S | SIG_SW | SIG_SE);
        }
        let bit = |flag: u32, shift: u32| -> u32 {
            if f & flag != 0 {
                1 << shift
            } else {
                0
            }
        };
        let pattern = bit(SIG_NW, 0)
            | bit(SIG_N, 1)
            | bit(SIG_NE, 2)
            | bit(SIG_W, 3)
            | bit(SIG_E, 5)
            | bit(SIG_SW, 6)
            | bit(SIG_S, 7)
            | bit(SIG_SE, 8);
        ZERO_CODING_TABLE[orientation as usize * 512 + pattern as usize]
    }

    /// Sign-coding context and XOR-prediction bit for `(x, y)` (Table
    /// D.2/D.3). Returns `(context, predicted_sign_xor)`: XOR the coded
    /// sign bit with `predicted_sign_xor` to get the actual sign.
    pub(crate) fn sign_coding_context(&self, x: usize, y: usize, vsc: bool) -> (u8, u8) {
        let mut f = self.flags(x, y);
        if vsc && y % 4 == 3 {
            f &= !(SIGN_S | SIG_S);
        }
        let bit = |flag: u32, shift: u32| -> u32 {
            if f & flag != 0 {
                1 << shift
            } else {
                0
            }
        };
        let idx = bit(SIGN_W, 0)
            | bit(SIG_N, 1)
            | bit(SIGN_E, 2)
            | bit(SIG_W, 3)
            | bit(SIGN_N, 4)
            | bit(SIG_E, 5)
            | bit(SIGN_S, 6)
            | bit(SIG_S, 7);
        (
            SIGN_CODING_CONTEXT_TABLE[idx as usize],
            SIGN_PREDICTION_TABLE[idx as usize],
        )
    }

    /// Magnitude-refinement context (14/15/16). Not tabulated: only
    /// three outcomes exist and the neighbour-significance test is
    /// cheaper inline than a 512-entry lookup.
    pub(crate) fn refinement_context(&self, x: usize, y: usize, vsc: bool) -> u8 {
        if self.is_refined(x, y) {
            return 16;
        }
        let mut f = self.flags(x, y);
        if vsc && y % 4 == 3 {
            f &= !(SIG_S | SIG_SW | SIG_SE);
        }
        if f & NEIGHBOUR_SIG != 0 {
            15
        } else {
            14
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_grid_has_no_significance() {
        let grid = CodeBlockGrid::new(4, 4);
        assert_eq!(grid.zero_coding_context(1, 1, Subband::LL, false), 0);
        assert!(!grid.is_significant(1, 1));
    }

    #[test]
    fn mark_significant_updates_orthogonal_neighbours() {
        let mut grid = CodeBlockGrid::new(4, 4);
        grid.mark_significant(1, 1, false);
        assert!(grid.flags(1, 0) & SIG_S != 0); // north neighbour sees south sig
        assert!(grid.flags(1, 2) & SIG_N != 0); // south neighbour sees north sig
        assert!(grid.flags(0, 1) & SIG_E != 0); // west neighbour sees east sig
        assert!(grid.flags(2, 1) & SIG_W != 0); // east neighbour sees west sig
        assert!(grid.is_significant(1, 1));
    }

    #[test]
    fn mark_significant_negative_propagates_sign_only_orthogonally() {
        let mut grid = CodeBlockGrid::new(4, 4);
        grid.mark_significant(1, 1, true);
        assert!(grid.flags(1, 0) & SIGN_S != 0);
        assert!(grid.flags(1, 2) & SIGN_N != 0);
        assert!(grid.flags(0, 1) & SIGN_E != 0);
        assert!(grid.flags(2, 1) & SIGN_W != 0);
        // diagonal neighbours only see significance, never sign.
        assert_eq!(grid.flags(0, 0) & (SIGN_N | SIGN_S | SIGN_E | SIGN_W), 0);
    }

    #[test]
    fn zero_coding_context_changes_with_orientation() {
        let mut grid = CodeBlockGrid::new(4, 4);
        grid.mark_significant(1, 0, false); // north neighbour of (1,1)
        grid.mark_significant(0, 1, false); // west neighbour of (1,1)
        let ll = grid.zero_coding_context(1, 1, Subband::LL, false);
        let hl = grid.zero_coding_context(1, 1, Subband::HL, false);
        assert_ne!(ll, 0);
        assert_ne!(hl, 0);
    }

    #[test]
    fn sign_coding_neutral_when_no_significant_neighbours() {
        let grid = CodeBlockGrid::new(4, 4);
        let (ctx, xor) = grid.sign_coding_context(1, 1, false);
        assert_eq!(ctx, 9);
        assert_eq!(xor, 0);
    }

    #[test]
    fn refinement_context_progresses_14_15_16() {
        let mut grid = CodeBlockGrid::new(4, 4);
        assert_eq!(grid.refinement_context(1, 1, false), 14);
        grid.mark_significant(1, 0, false);
        assert_eq!(grid.refinement_context(1, 1, false), 15);
        grid.set_refined(1, 1);
        assert_eq!(grid.refinement_context(1, 1, false), 16);
    }

    #[test]
    fn clear_all_visited_resets_every_cell() {
        let mut grid = CodeBlockGrid::new(2, 2);
        grid.set_visited(0, 0);
        grid.set_visited(1, 1);
        grid.clear_all_visited();
        assert!(!grid.is_visited(0, 0));
        assert!(!grid.is_visited(1, 1));
    }

    #[test]
    fn cblksty_flags_are_independent_bits() {
        let style = Cblksty::new(Cblksty::RESET | Cblksty::VSC);
        assert!(style.contains(Cblksty::RESET));
        assert!(style.contains(Cblksty::VSC));
        assert!(!style.contains(Cblksty::LAZY));
        assert!(!style.contains(Cblksty::TERM_ALL));
    }
}
