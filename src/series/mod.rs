mod candidate;
mod evaluate;
mod fitness;

pub use candidate::Candidate;
pub use evaluate::{
    evaluate_candidate, evaluate_candidate_f64, EvalResult, EvalResultF64, BIG_EVAL_TIMEOUT,
    FAST_EVAL_TIMEOUT,
};
pub use fitness::{
    compute_fitness, compute_fitness_f64, Fitness, FitnessWeights, MAX_DIGITS, MAX_DIGITS_F64,
};
