//! Per-scan derived constants (ITU-T T.87 §C.2.4.1, Annex A.2).
//!
//! A `Traits` value is computed once per scan from the sample precision
//! and NEAR and handed to the predictor, context table, and Golomb coder;
//! none of them recompute it.

use crate::JpegLsError;

const BASIC_T1: i32 = 3;
const BASIC_T2: i32 = 7;
const BASIC_T3: i32 = 21;
const BASIC_RESET: u16 = 64;

#[derive(Debug, Clone, Copy)]
pub struct Traits {
    pub maxval: i32,
    pub near: i32,
    pub range: i32,
    pub qbpp: i32,
    pub bpp: i32,
    pub limit: i32,
    pub reset: i32,
    pub t1: i32,
    pub t2: i32,
    pub t3: i32,
}

impl Traits {
    /// Derive a `Traits` for `precision` bits per sample and the given
    /// NEAR value, using the explicit thresholds from an LSE marker when
    /// present, else the default thresholds of §C.2.4.1.1.
    pub fn new(precision: u8, near: u16, preset: Option<(u16, u16, u16, u16)>) -> Result<Self, JpegLsError> {
        if !(2..=16).contains(&precision) {
            return Err(JpegLsError::InvalidPrecision { precision });
        }
        if near > 255 {
            return Err(JpegLsError::InvalidNear { near });
        }

        let maxval = if let Some((maxval, _, _, _)) = preset {
            maxval as i32
        } else {
            (1i32 << precision) - 1
        };
        let near = near as i32;

        let range = if near == 0 {
            maxval + 1
        } else {
            (maxval + 2 * near) / (2 * near + 1) + 1
        };
        let qbpp = ceil_log2(range);
        let bpp = std::cmp::max(2, ceil_log2(maxval + 1));
        let limit = 2 * (bpp + std::cmp::max(8, bpp));

        let (t1, t2, t3, reset) = if let Some((_, t1, t2, t3)) = preset {
            (t1 as i32, t2 as i32, t3 as i32, BASIC_RESET as i32)
        } else {
            default_thresholds(maxval, near)
        };

        Ok(Traits {
            maxval,
            near,
            range,
            qbpp,
            bpp,
            limit,
            reset,
            t1,
            t2,
            t3,
        })
    }

    /// `A` reset value every regular context starts at (§4.7).
    pub fn initial_a(&self) -> i32 {
        std::cmp::max(2, (self.range + 32) / 64)
    }
}

fn ceil_log2(value: i32) -> i32 {
    let mut bits = 0;
    let mut v = 1i64;
    while v < value as i64 {
        v <<= 1;
        bits += 1;
    }
    bits
}

/// Default gradient thresholds (§C.2.4.1.1), scaled for precisions other
/// than 8 bits per the standard's FACTOR adjustment.
fn default_thresholds(maxval: i32, near: i32) -> (i32, i32, i32, i32) {
    let clamp = |v: i32, lo: i32, hi: i32| v.clamp(lo, hi);

    if maxval >= 128 {
        let factor = (std::cmp::min(maxval, 4095) + 128) / 256;
        let t1 = clamp(factor * (BASIC_T1 - 2) + 2 + 3 * near, near + 1, maxval);
        let t2 = clamp(factor * (BASIC_T2 - 3) + 3 + 5 * near, t1, maxval);
        let t3 = clamp(factor * (BASIC_T3 - 4) + 4 + 7 * near, t2, maxval);
        (t1, t2, t3, BASIC_RESET as i32)
    } else {
        let factor = std::cmp::max(1, 256 / (maxval + 1));
        let t1 = clamp(BASIC_T1 / factor + 3 * near, near + 1, maxval);
        let t2 = clamp(BASIC_T2 / factor + 5 * near, t1, maxval);
        let t3 = clamp(BASIC_T3 / factor + 7 * near, t2, maxval);
        (t1, t2, t3, BASIC_RESET as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_8bit_matches_known_defaults() {
        let traits = Traits::new(8, 0, None).unwrap();
        assert_eq!(traits.maxval, 255);
        assert_eq!(traits.range, 256);
        assert_eq!(traits.t1, 3);
        assert_eq!(traits.t2, 7);
        assert_eq!(traits.t3, 21);
        assert_eq!(traits.reset, 64);
    }

    #[test]
    fn near_lossless_widens_range() {
        let traits = Traits::new(8, 3, None).unwrap();
        assert!(traits.range < 256);
        assert!(traits.t1 > 3);
    }

    #[test]
    fn rejects_out_of_range_precision() {
        assert!(Traits::new(1, 0, None).is_err());
        assert!(Traits::new(17, 0, None).is_err());
    }

    #[test]
    fn rejects_out_of_range_near() {
        assert!(Traits::new(8, 256, None).is_err());
    }

    #[test]
    fn preset_overrides_maxval_and_thresholds() {
        let traits = Traits::new(8, 0, Some((255, 5, 12, 40))).unwrap();
        assert_eq!(traits.t1, 5);
        assert_eq!(traits.t2, 12);
        assert_eq!(traits.t3, 40);
    }
}
