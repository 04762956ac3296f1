mod crossover;
mod hillclimb;
mod mutation;
mod tournament;

pub use crossover::crossover_candidates;
pub use hillclimb::HillClimbStrategy;
pub use mutation::mutate_candidate;
pub use tournament::TournamentStrategy;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{Result, SumforgeError};
use crate::expr::simplify_with_folding;
use crate::pool::Pool;
use crate::series::{Candidate, Fitness};

/// Trees deeper than this are rejected.
pub const MAX_TREE_DEPTH: usize = 10;

/// Candidates with more total nodes than this are rejected.
pub const MAX_NODE_COUNT: usize = 25;

/// Depth of the fresh random candidates that replace rejected ones.
const REPLACEMENT_MAX_DEPTH: usize = 4;

/// Precision used when simplifying candidate trees between generations.
const SIMPLIFY_PRECISION: u32 = 128;

/// An evolutionary strategy for evolving candidate series.
pub trait Strategy: Send {
    fn name(&self) -> &'static str;

    /// Plants a user-supplied candidate into every initial population.
    fn set_seed_formula(&mut self, seed: Candidate);

    fn initialize(
        &self,
        pool: &dyn Pool,
        rng: &mut StdRng,
        pop_size: usize,
        max_depth: usize,
    ) -> Vec<Candidate>;

    fn evolve(
        &self,
        population: &[Candidate],
        fitnesses: &[Fitness],
        pool: &dyn Pool,
        rng: &mut StdRng,
    ) -> Vec<Candidate>;
}

/// Returns a strategy by name.
pub fn get(name: &str) -> Result<Box<dyn Strategy>> {
    match name {
        "hillclimb" => Ok(Box::new(HillClimbStrategy::default())),
        "tournament" => Ok(Box::new(TournamentStrategy::default())),
        _ => Err(SumforgeError::UnknownStrategy(name.to_string())),
    }
}

/// Names of all available strategies.
pub fn names() -> &'static [&'static str] {
    &["hillclimb", "tournament"]
}

/// The admission filter: candidates that are too deep or bloated are
/// discarded in favor of a fresh random one.
pub fn candidate_ok(c: &Candidate) -> bool {
    c.numerator.depth() <= MAX_TREE_DEPTH
        && c.denominator.depth() <= MAX_TREE_DEPTH
        && c.node_count() <= MAX_NODE_COUNT
}

pub(crate) fn random_candidate(pool: &dyn Pool, rng: &mut StdRng, max_depth: usize) -> Candidate {
    Candidate::new(
        pool.random_tree(rng, max_depth),
        pool.random_tree(rng, max_depth),
        rng.gen_range(0..2),
    )
}

/// Simplifies both trees and applies the admission filter.
pub(crate) fn simplify_and_admit(
    mut c: Candidate,
    pool: &dyn Pool,
    rng: &mut StdRng,
) -> Candidate {
    c.numerator = simplify_with_folding(c.numerator, SIMPLIFY_PRECISION);
    c.denominator = simplify_with_folding(c.denominator, SIMPLIFY_PRECISION);
    if candidate_ok(&c) {
        c
    } else {
        random_candidate(pool, rng, REPLACEMENT_MAX_DEPTH)
    }
}

/// Populates the initial generation, honoring the optional seed formula.
fn initial_population(
    seed: Option<&Candidate>,
    pool: &dyn Pool,
    rng: &mut StdRng,
    pop_size: usize,
    max_depth: usize,
) -> Vec<Candidate> {
    let mut population: Vec<Candidate> = (0..pop_size)
        .map(|_| random_candidate(pool, rng, max_depth))
        .collect();
    if let (Some(seed), Some(slot)) = (seed, population.first_mut()) {
        *slot = seed.clone();
    }
    population
}
