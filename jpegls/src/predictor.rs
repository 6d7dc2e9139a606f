//! MED predictor, gradient quantisation, and near-lossless
//! quantisation/dequantisation (ITU-T T.87 §4.6, Annex A.5).

use crate::traits::Traits;

/// Median edge detector: predicts the value of the current sample from
/// its west (`a`), north (`b`), and northwest (`c`) causal neighbours.
pub fn med_predict(a: i32, b: i32, c: i32) -> i32 {
    if c >= std::cmp::max(a, b) {
        std::cmp::min(a, b)
    } else if c <= std::cmp::min(a, b) {
        std::cmp::max(a, b)
    } else {
        a + b - c
    }
}

/// Quantise a gradient `d` into `{-4..4}` using the scan's thresholds,
/// with the dead zone around zero widened by `2*near`.
pub fn quantize_gradient(traits: &Traits, d: i32) -> i32 {
    let near = traits.near;
    if d <= -traits.t3 {
        -4
    } else if d <= -traits.t2 {
        -3
    } else if d <= -traits.t1 {
        -2
    } else if d <= -near {
        -1
    } else if d <= near {
        0
    } else if d <= traits.t1 {
        1
    } else if d <= traits.t2 {
        2
    } else if d <= traits.t3 {
        3
    } else {
        4
    }
}

/// Fold `(q1, q2, q3)` so the lexicographically first nonzero component
/// is non-negative, returning the folded triple and the sign that was
/// applied (to be XORed back into the prediction correction and error).
pub fn sign_fold(q1: i32, q2: i32, q3: i32) -> (i32, i32, i32, i32) {
    let negative = q1 < 0 || (q1 == 0 && q2 < 0) || (q1 == 0 && q2 == 0 && q3 < 0);
    if negative {
        (-q1, -q2, -q3, -1)
    } else {
        (q1, q2, q3, 1)
    }
}

/// Apply a regular context's bias correction `C` to the MED prediction,
/// flipping its sign to match the gradient fold, then clamp.
pub fn corrected_prediction(traits: &Traits, med: i32, sign: i32, c: i32) -> i32 {
    let corrected = med + if sign > 0 { c } else { -c };
    fix_reconstructed_value(traits, corrected)
}

/// Clamp a reconstructed value into `[0, maxval]`.
pub fn fix_reconstructed_value(traits: &Traits, value: i32) -> i32 {
    value.clamp(0, traits.maxval)
}

/// Quantise a prediction error for near-lossless coding:
/// `sign(e) * floor((|e| + near) / (2*near + 1))`.
pub fn quantize_error(traits: &Traits, errval: i32) -> i32 {
    if traits.near == 0 {
        return errval;
    }
    let divisor = 2 * traits.near + 1;
    if errval >= 0 {
        (errval + traits.near) / divisor
    } else {
        -((-errval + traits.near) / divisor)
    }
}

/// Fold a quantised error into `(-range/2, range/2]` so its magnitude
/// never exceeds what the Golomb escape path can represent in `qbpp`
/// bits, regardless of how far `actual` and `predicted` happen to sit
/// apart at a range boundary.
pub fn fold_error(traits: &Traits, errval: i32) -> i32 {
    let range = traits.range;
    let mut e = errval;
    if e < 0 {
        e += range;
    }
    if e >= (range + 1) / 2 {
        e -= range;
    }
    e
}

/// Recover the reconstruction-domain error from a quantised error.
pub fn dequantize_error(traits: &Traits, quantised: i32) -> i32 {
    if traits.near == 0 {
        quantised
    } else {
        quantised * (2 * traits.near + 1)
    }
}

/// Fold a reconstructed value back into the representable range,
/// undoing the modulo-range wraparound near-lossless coding can
/// introduce at the extremes (`prediction + dequantised_error` may land
/// outside `[-near, maxval+near]`).
pub fn modulo_range(traits: &Traits, value: i32) -> i32 {
    let mut v = value;
    let wrap = traits.range * (2 * traits.near + 1);
    if v < -traits.near {
        v += wrap;
    } else if v > traits.maxval + traits.near {
        v -= wrap;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lossless(precision: u8) -> Traits {
        Traits::new(precision, 0, None).unwrap()
    }

    #[test]
    fn med_picks_min_when_c_is_extreme_high() {
        assert_eq!(med_predict(10, 20, 30), 10);
    }

    #[test]
    fn med_picks_max_when_c_is_extreme_low() {
        assert_eq!(med_predict(10, 20, 5), 20);
    }

    #[test]
    fn med_uses_planar_estimate_otherwise() {
        assert_eq!(med_predict(10, 20, 15), 15);
    }

    #[test]
    fn quantize_gradient_is_symmetric() {
        let traits = lossless(8);
        assert_eq!(quantize_gradient(&traits, 0), 0);
        assert_eq!(quantize_gradient(&traits, 100), 4);
        assert_eq!(quantize_gradient(&traits, -100), -4);
    }

    #[test]
    fn sign_fold_normalises_first_nonzero() {
        assert_eq!(sign_fold(-1, 2, -3), (1, -2, 3, -1));
        assert_eq!(sign_fold(0, 0, -1), (0, 0, 1, -1));
        assert_eq!(sign_fold(1, -2, 3), (1, -2, 3, 1));
    }

    #[test]
    fn quantize_and_dequantize_round_trip_within_near() {
        let traits = Traits::new(8, 2, None).unwrap();
        for e in -30..=30 {
            let q = quantize_error(&traits, e);
            let back = dequantize_error(&traits, q);
            assert!((back - e).abs() <= traits.near);
        }
    }

    #[test]
    fn fold_error_bounds_magnitude_to_half_range() {
        let traits = lossless(8);
        for e in -1000..=1000 {
            let folded = fold_error(&traits, e);
            assert!(folded > -traits.range && folded <= traits.range);
            assert!(folded.unsigned_abs() <= traits.range as u32);
        }
    }

    #[test]
    fn fix_reconstructed_value_clamps() {
        let traits = lossless(8);
        assert_eq!(fix_reconstructed_value(&traits, -5), 0);
        assert_eq!(fix_reconstructed_value(&traits, 300), 255);
    }
}
