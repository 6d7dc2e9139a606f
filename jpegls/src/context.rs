//! The 365 sign-folded regular contexts plus the two run-interruption
//! contexts (ITU-T T.87 §4.6/§4.7, Annex A.6-A.9).

use crate::traits::Traits;

pub const NUM_REGULAR_CONTEXTS: usize = 365;

/// `{A, B, N, C}` for one regular context (§3.3).
#[derive(Debug, Clone, Copy)]
pub struct RegularContext {
    pub a: i32,
    pub b: i32,
    pub n: i32,
    pub c: i32,
}

impl RegularContext {
    fn new(initial_a: i32) -> Self {
        RegularContext { a: initial_a, b: 0, n: 1, c: 0 }
    }

    /// Smallest `k` with `(N<<k) >= A`.
    pub fn golomb_k(&self) -> u32 {
        let mut k = 0u32;
        while (self.n << k) < self.a {
            k += 1;
        }
        k
    }

    /// Bias-correction state used to pick the mapping parity for `k==0`.
    fn twist(&self, near: i32) -> bool {
        near == 0 && self.golomb_k() == 0 && 2 * self.b <= -self.n
    }

    fn update(&mut self, traits: &Traits, quantised_error: i32) {
        self.a += quantised_error.abs();
        self.b += quantised_error * (2 * traits.near + 1);

        if self.n == traits.reset {
            self.a >>= 1;
            self.b >>= 1;
            self.n >>= 1;
        }
        self.n += 1;

        if self.b <= -self.n {
            self.b += self.n;
            if self.c > -128 {
                self.c -= 1;
            }
            if self.b <= -self.n {
                self.b = -self.n + 1;
            }
        } else if self.b > 0 {
            self.b -= self.n;
            if self.c < 127 {
                self.c += 1;
            }
            if self.b > 0 {
                self.b = 0;
            }
        }
    }
}

/// `{A, N, Nn}` for one run-interruption context (§4.8). There is no
/// bias sum `B`/correction `C`: run-interruption mapping consumes the
/// negative-occurrence count `Nn` directly instead.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub a: i32,
    pub n: i32,
    pub nn: i32,
}

impl RunContext {
    fn new(initial_a: i32, initial_n: i32) -> Self {
        RunContext { a: initial_a, n: initial_n, nn: 0 }
    }

    pub fn golomb_k(&self) -> u32 {
        let mut k = 0u32;
        while (self.n << k) < self.a {
            k += 1;
        }
        k
    }

    fn twist(&self) -> bool {
        2 * self.nn < self.n
    }

    fn update(&mut self, traits: &Traits, quantised_error: i32) {
        if quantised_error < 0 {
            self.nn += 1;
        }
        self.a += quantised_error.abs();
        if self.n == traits.reset {
            self.a >>= 1;
            self.n >>= 1;
            self.nn >>= 1;
        }
        self.n += 1;
    }
}

pub struct ContextTable {
    pub regular: Vec<RegularContext>,
    /// index 0: `|ra-rb| <= near` (sign base `ra`). index 1: otherwise
    /// (sign base `rb`).
    pub run: [RunContext; 2],
}

impl ContextTable {
    pub fn new(traits: &Traits) -> Self {
        let initial_a = traits.initial_a();
        ContextTable {
            regular: vec![RegularContext::new(initial_a); NUM_REGULAR_CONTEXTS],
            run: [RunContext::new(initial_a, 1), RunContext::new(initial_a, 1)],
        }
    }
}

/// Quantise the three local gradients and fold the result into a
/// regular-context index plus the correction sign, or `None` when the
/// context is flat (all gradients zero) and run mode should be entered.
pub fn classify(traits: &Traits, d1: i32, d2: i32, d3: i32) -> Option<(usize, i32)> {
    use crate::predictor::{quantize_gradient, sign_fold};

    let q1 = quantize_gradient(traits, d1);
    let q2 = quantize_gradient(traits, d2);
    let q3 = quantize_gradient(traits, d3);
    if q1 == 0 && q2 == 0 && q3 == 0 {
        return None;
    }
    let (q1, q2, q3, sign) = sign_fold(q1, q2, q3);
    let idx = ((q1 * 9 + q2) * 9 + q3) as usize;
    Some((idx, sign))
}

/// Encode-and-update and decode-and-update share the context bookkeeping
/// below; separated from `scan.rs` so the mapping/threshold logic is
/// unit-testable in isolation.
impl ContextTable {
    /// The mapping twist and current `k` for regular context `idx`.
    pub fn regular_params(&self, traits: &Traits, idx: usize) -> (u32, bool) {
        let ctx = &self.regular[idx];
        (ctx.golomb_k(), ctx.twist(traits.near))
    }

    pub fn update_regular(&mut self, traits: &Traits, idx: usize, quantised_error: i32) {
        self.regular[idx].update(traits, quantised_error);
    }

    pub fn run_params(&self, run_ctx: usize) -> (u32, bool) {
        let ctx = &self.run[run_ctx];
        (ctx.golomb_k(), ctx.twist())
    }

    pub fn update_run(&mut self, traits: &Traits, run_ctx: usize, quantised_error: i32) {
        self.run[run_ctx].update(traits, quantised_error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits() -> Traits {
        Traits::new(8, 0, None).unwrap()
    }

    #[test]
    fn flat_gradient_triggers_run_mode() {
        assert_eq!(classify(&traits(), 0, 0, 0), None);
    }

    #[test]
    fn nonflat_gradient_is_sign_folded() {
        let (idx, sign) = classify(&traits(), -20, 0, 0).unwrap();
        assert_eq!(sign, -1);
        assert!(idx > 0);
    }

    #[test]
    fn regular_context_k_grows_with_a() {
        let t = traits();
        let mut table = ContextTable::new(&t);
        let (k0, _) = table.regular_params(&t, 10);
        table.regular[10].a += 1000;
        let (k1, _) = table.regular_params(&t, 10);
        assert!(k1 >= k0);
    }

    #[test]
    fn regular_context_bias_resets_at_n_reset() {
        let t = traits();
        let mut table = ContextTable::new(&t);
        for _ in 0..(t.reset as usize + 1) {
            table.update_regular(&t, 0, 1);
        }
        assert!(table.regular[0].n <= t.reset);
    }
}
