use std::time::{Duration, Instant};

use rug::Float;

use super::Candidate;

/// Deadline for one candidate on the fast (f64) path.
pub const FAST_EVAL_TIMEOUT: Duration = Duration::from_millis(100);

/// Deadline for one candidate on the precise (big-float) path.
pub const BIG_EVAL_TIMEOUT: Duration = Duration::from_secs(2);

/// The deadline is polled once per this many terms.
const DEADLINE_CHECK_INTERVAL: i64 = 64;

/// A series needs at least this many successfully summed terms to count.
const MIN_TERMS: i64 = 4;

/// Result of evaluating a candidate's partial sum at big-float precision.
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub partial_sum: Option<Float>,
    pub terms_computed: i64,
    pub converged: bool,
    /// Average ratio of |S_{2N} - S_N| decrease per doubling of terms.
    pub convergence_rate: f64,
    pub ok: bool,
}

impl EvalResult {
    pub fn invalid() -> Self {
        Self {
            partial_sum: None,
            terms_computed: 0,
            converged: false,
            convergence_rate: 0.0,
            ok: false,
        }
    }
}

/// Result of evaluating a candidate's partial sum entirely in f64.
#[derive(Debug, Clone, Copy)]
pub struct EvalResultF64 {
    pub partial_sum: Option<f64>,
    pub terms_computed: i64,
    pub converged: bool,
    pub ok: bool,
}

impl EvalResultF64 {
    pub fn invalid() -> Self {
        Self {
            partial_sum: None,
            terms_computed: 0,
            converged: false,
            ok: false,
        }
    }
}

/// Computes the partial sum of a candidate up to `max_terms` at `prec` bits,
/// recording checkpoints at powers of two for convergence detection.
///
/// A term whose numerator or denominator fails to evaluate, or whose
/// denominator is zero, ends the summation; the partial sum so far is kept.
/// Exceeding the deadline invalidates the whole evaluation.
pub fn evaluate_candidate(c: &Candidate, max_terms: i64, prec: u32) -> EvalResult {
    let mut sum = Float::new(prec);
    let mut checkpoints: Vec<Float> = Vec::new();
    let mut next_checkpoint = 1i64;
    let mut terms_computed = 0i64;
    let deadline = Instant::now() + BIG_EVAL_TIMEOUT;

    for i in c.start..c.start + max_terms {
        if (i - c.start) % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() > deadline {
            return EvalResult::invalid();
        }

        let n = Float::with_val(prec, i);

        let num = match c.numerator.eval_big(&n, prec) {
            Some(v) => v,
            None => break, // term failed, use the partial sum so far
        };
        let den = match c.denominator.eval_big(&n, prec) {
            Some(v) => v,
            None => break,
        };
        if den.is_zero() {
            break;
        }

        sum += num / den;
        terms_computed += 1;

        let offset = i - c.start + 1;
        if offset == next_checkpoint {
            checkpoints.push(sum.clone());
            next_checkpoint *= 2;
        }
    }

    if terms_computed < MIN_TERMS {
        return EvalResult::invalid();
    }

    let (converged, rate) = analyze_convergence(&checkpoints, prec);

    EvalResult {
        partial_sum: Some(sum),
        terms_computed,
        converged,
        convergence_rate: rate,
        ok: true,
    }
}

/// Checks that |S_{2N} - S_N| shrinks by a consistent factor: every defined
/// ratio of consecutive checkpoint differences must be < 1 and their mean
/// < 0.99. All-zero differences count as exact convergence.
fn analyze_convergence(checkpoints: &[Float], prec: u32) -> (bool, f64) {
    if checkpoints.len() < 3 {
        return (false, 0.0);
    }

    let mut diffs = Vec::with_capacity(checkpoints.len() - 1);
    for pair in checkpoints.windows(2) {
        let diff = Float::with_val(prec, &pair[1] - &pair[0]).abs();
        diffs.push(diff.to_f64());
    }

    let mut total_ratio = 0.0;
    let mut valid_ratios = 0;
    let mut converging = true;

    for pair in diffs.windows(2) {
        if pair[0] == 0.0 {
            // Perfect convergence at this checkpoint.
            continue;
        }
        let ratio = pair[1] / pair[0];
        if ratio >= 1.0 {
            converging = false;
        }
        total_ratio += ratio;
        valid_ratios += 1;
    }

    if valid_ratios == 0 {
        return (true, 1.0);
    }

    let avg_ratio = total_ratio / valid_ratios as f64;
    (converging && avg_ratio < 0.99, avg_ratio)
}

/// Fast-path partial sum. Keeps only the last three checkpoints in a ring
/// buffer, enough for a single ratio comparison.
pub fn evaluate_candidate_f64(c: &Candidate, max_terms: i64) -> EvalResultF64 {
    let mut sum = 0.0f64;
    let mut terms_computed = 0i64;

    let mut ring = [0.0f64; 3];
    let mut checkpoint_count = 0usize;
    let mut next_checkpoint = 1i64;
    let deadline = Instant::now() + FAST_EVAL_TIMEOUT;

    for i in c.start..c.start + max_terms {
        if (i - c.start) % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() > deadline {
            return EvalResultF64::invalid();
        }

        let n = i as f64;

        let num = match c.numerator.eval_f64(n) {
            Some(v) => v,
            None => break,
        };
        let den = match c.denominator.eval_f64(n) {
            Some(v) => v,
            None => break,
        };
        if den == 0.0 {
            break;
        }

        sum += num / den;
        terms_computed += 1;

        if !sum.is_finite() {
            return EvalResultF64::invalid();
        }

        let offset = i - c.start + 1;
        if offset == next_checkpoint {
            ring[checkpoint_count % 3] = sum;
            checkpoint_count += 1;
            next_checkpoint *= 2;
        }
    }

    if terms_computed < MIN_TERMS {
        return EvalResultF64::invalid();
    }

    EvalResultF64 {
        partial_sum: Some(sum),
        terms_computed,
        converged: analyze_convergence_f64(&ring, checkpoint_count),
        ok: true,
    }
}

fn analyze_convergence_f64(ring: &[f64; 3], count: usize) -> bool {
    if count < 3 {
        return false;
    }
    // The last three checkpoints, oldest first.
    let oldest = (count - 3) % 3;
    let s0 = ring[oldest];
    let s1 = ring[(oldest + 1) % 3];
    let s2 = ring[(oldest + 2) % 3];

    let d0 = (s1 - s0).abs();
    let d1 = (s2 - s1).abs();

    if d0 == 0.0 {
        return true;
    }
    d1 / d0 < 0.99
}
