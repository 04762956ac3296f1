use rug::Float;
use serde::{Deserialize, Serialize};

use super::{Candidate, EvalResult, EvalResultF64};

/// Digit cap on the precise path (limited by precision).
pub const MAX_DIGITS: f64 = 50.0;

/// Digit cap on the fast path (limited by f64).
pub const MAX_DIGITS_F64: f64 = 15.0;

/// Partial sums further than this (relative) from the target are garbage.
const DIVERGENCE_CUTOFF: f64 = 1e50;

const WORST_COMBINED: f64 = -1e9;

/// Relative importance of the fitness components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub accuracy: f64,
    /// Penalty weight, subtracted.
    pub complexity: f64,
    pub convergence: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            accuracy: 10.0,
            complexity: 2.0,
            convergence: 1.0,
        }
    }
}

/// Multi-objective fitness score for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// The scalar ranking key.
    pub combined: f64,
    pub correct_digits: f64,
    pub simplicity: f64,
    pub convergence_rate: f64,
}

impl Fitness {
    /// Sentinel for invalid, degenerate or tabu candidates.
    pub fn worst() -> Self {
        Self {
            combined: WORST_COMBINED,
            correct_digits: 0.0,
            simplicity: 0.0,
            convergence_rate: 0.0,
        }
    }

    pub fn is_worst(&self) -> bool {
        self.combined <= WORST_COMBINED
    }
}

/// Scores a candidate against the target at big-float precision.
pub fn compute_fitness(
    c: &Candidate,
    result: &EvalResult,
    target: &Float,
    weights: FitnessWeights,
) -> Fitness {
    if !result.ok {
        return Fitness::worst();
    }

    // A series whose terms don't depend on n is a constant times the term
    // count; reject it.
    if !c.numerator.contains_var() && !c.denominator.contains_var() {
        return Fitness::worst();
    }

    // The denominator must depend on n, otherwise terms never shrink.
    if !c.denominator.contains_var() {
        return Fitness::worst();
    }

    if !result.converged {
        return Fitness::worst();
    }

    let partial_sum = match &result.partial_sum {
        Some(sum) => sum,
        None => return Fitness::worst(),
    };

    if diverged_big(partial_sum, target) {
        return Fitness::worst();
    }

    let correct_digits = count_correct_digits(partial_sum, target);
    score(c, correct_digits, result.convergence_rate, weights)
}

/// Scores a candidate against the f64 mirror of the target; used by the
/// screening phase of two-phase evaluation.
pub fn compute_fitness_f64(
    c: &Candidate,
    result: &EvalResultF64,
    target: f64,
    weights: FitnessWeights,
) -> Fitness {
    if !result.ok {
        return Fitness::worst();
    }
    if !c.numerator.contains_var() && !c.denominator.contains_var() {
        return Fitness::worst();
    }
    if !c.denominator.contains_var() {
        return Fitness::worst();
    }
    if !result.converged {
        return Fitness::worst();
    }
    let partial_sum = match result.partial_sum {
        Some(sum) if sum.is_finite() => sum,
        _ => return Fitness::worst(),
    };

    let err = if target != 0.0 {
        ((partial_sum - target) / target).abs()
    } else {
        (partial_sum - target).abs()
    };
    if !err.is_finite() || err > DIVERGENCE_CUTOFF {
        return Fitness::worst();
    }

    let correct_digits = if err == 0.0 {
        MAX_DIGITS_F64
    } else {
        (-err.log10()).clamp(0.0, MAX_DIGITS_F64)
    };
    score(c, correct_digits, 0.0, weights)
}

fn score(c: &Candidate, correct_digits: f64, convergence_rate: f64, weights: FitnessWeights) -> Fitness {
    let complexity = c.complexity();
    let simplicity = 1.0 / complexity.max(1.0);

    // Scale the complexity penalty by accuracy: free exploration at 0
    // digits, full anti-bloat pressure only once a candidate is accurate.
    let penalty_scale = correct_digits.min(5.0) / 5.0;

    let combined = weights.accuracy * correct_digits - weights.complexity * complexity * penalty_scale;

    Fitness {
        combined,
        correct_digits,
        simplicity,
        convergence_rate,
    }
}

fn diverged_big(partial_sum: &Float, target: &Float) -> bool {
    let prec = target.prec();
    let diff = Float::with_val(prec, partial_sum - target).abs();
    if target.is_zero() {
        let f = diff.to_f64();
        !f.is_finite() || f > DIVERGENCE_CUTOFF
    } else {
        let abs_target = Float::with_val(prec, target.abs_ref());
        let ratio = Float::with_val(prec, &diff / &abs_target).to_f64();
        !ratio.is_finite() || ratio > DIVERGENCE_CUTOFF
    }
}

/// Matching decimal digits between the partial sum and the target:
/// -log10 of the relative error (absolute when the target is zero),
/// floored at 0 and capped at [`MAX_DIGITS`].
fn count_correct_digits(computed: &Float, target: &Float) -> f64 {
    let prec = target.prec();
    let diff = Float::with_val(prec, computed - target).abs();

    if diff.is_zero() {
        return MAX_DIGITS;
    }

    let abs_target = Float::with_val(prec, target.abs_ref());
    if abs_target.is_zero() {
        let f = diff.to_f64();
        if f == 0.0 {
            return MAX_DIGITS;
        }
        return (-f.log10()).clamp(0.0, MAX_DIGITS);
    }

    let err = Float::with_val(prec, &diff / &abs_target).to_f64();
    if err == 0.0 {
        return MAX_DIGITS;
    }
    (-err.log10()).clamp(0.0, MAX_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, UnaryOp};
    use crate::series::{evaluate_candidate, evaluate_candidate_f64};

    const TEST_PREC: u32 = 512;

    fn exp_series() -> Candidate {
        Candidate::new(
            Expr::Const(1),
            Expr::unary(UnaryOp::Factorial, Expr::Var),
            0,
        )
    }

    fn e_target() -> Float {
        Float::with_val(TEST_PREC, 1).exp()
    }

    #[test]
    fn known_series_scores_well() {
        let c = exp_series();
        let result = evaluate_candidate(&c, 30, TEST_PREC);
        assert!(result.ok);

        let fitness = compute_fitness(&c, &result, &e_target(), FitnessWeights::default());
        assert!(fitness.correct_digits >= 10.0, "digits = {}", fitness.correct_digits);
        assert!(fitness.combined > 0.0, "combined = {}", fitness.combined);
        assert!(fitness.simplicity > 0.0);
    }

    #[test]
    fn invalid_result_is_worst() {
        let c = Candidate::new(Expr::Const(1), Expr::Const(0), 0);
        let result = evaluate_candidate(&c, 10, TEST_PREC);
        let fitness = compute_fitness(&c, &result, &e_target(), FitnessWeights::default());
        assert_eq!(fitness, Fitness::worst());
    }

    #[test]
    fn constant_series_is_worst() {
        // Neither tree mentions n: converges trivially per checkpoint but is
        // a constant times the term count.
        let c = Candidate::new(Expr::Const(1), Expr::Const(1), 0);
        let result = evaluate_candidate(&c, 1024, TEST_PREC);
        let fitness = compute_fitness(&c, &result, &e_target(), FitnessWeights::default());
        assert_eq!(fitness, Fitness::worst());
    }

    #[test]
    fn constant_denominator_is_worst() {
        let c = Candidate::new(Expr::Var, Expr::Const(2), 0);
        let result = evaluate_candidate(&c, 1024, TEST_PREC);
        let fitness = compute_fitness(&c, &result, &e_target(), FitnessWeights::default());
        assert_eq!(fitness, Fitness::worst());
    }

    #[test]
    fn non_convergent_series_is_worst() {
        // Harmonic series: evaluates fine, never converges.
        let c = Candidate::new(Expr::Const(1), Expr::Var, 1);
        let result = evaluate_candidate(&c, 1024, TEST_PREC);
        assert!(result.ok);
        let fitness = compute_fitness(&c, &result, &e_target(), FitnessWeights::default());
        assert_eq!(fitness, Fitness::worst());
    }

    #[test]
    fn digit_cap_applies() {
        let c = exp_series();
        // 200 terms of 1/n! exceed 50 digits of e at 1024 bits.
        let result = evaluate_candidate(&c, 200, 1024);
        let target = Float::with_val(1024, 1).exp();
        let fitness = compute_fitness(&c, &result, &target, FitnessWeights::default());
        assert_eq!(fitness.correct_digits, MAX_DIGITS);
    }

    #[test]
    fn fast_path_mirrors_rejections() {
        let constant = Candidate::new(Expr::Const(1), Expr::Const(1), 0);
        let result = evaluate_candidate_f64(&constant, 1024);
        let fitness =
            compute_fitness_f64(&constant, &result, std::f64::consts::E, FitnessWeights::default());
        assert_eq!(fitness, Fitness::worst());

        let no_var_den = Candidate::new(Expr::Var, Expr::Const(2), 0);
        let result = evaluate_candidate_f64(&no_var_den, 1024);
        let fitness =
            compute_fitness_f64(&no_var_den, &result, std::f64::consts::E, FitnessWeights::default());
        assert_eq!(fitness, Fitness::worst());
    }

    #[test]
    fn fast_path_scores_known_series() {
        let c = exp_series();
        let result = evaluate_candidate_f64(&c, 30);
        assert!(result.ok);
        let fitness =
            compute_fitness_f64(&c, &result, std::f64::consts::E, FitnessWeights::default());
        assert!(fitness.correct_digits >= 10.0);
        assert!(fitness.correct_digits <= MAX_DIGITS_F64);
        assert!(fitness.combined > 0.0);
    }

    #[test]
    fn penalty_scale_spares_inaccurate_candidates() {
        let weights = FitnessWeights::default();
        // Zero digits: no complexity penalty at all.
        let c = exp_series();
        let zero = score_for(&c, 0.0, weights);
        assert_eq!(zero.combined, 0.0);
        // Five digits: full penalty engaged.
        let five = score_for(&c, 5.0, weights);
        let expected = weights.accuracy * 5.0 - weights.complexity * c.complexity();
        assert!((five.combined - expected).abs() < 1e-12);
    }

    fn score_for(c: &Candidate, digits: f64, weights: FitnessWeights) -> Fitness {
        super::score(c, digits, 0.5, weights)
    }
}
