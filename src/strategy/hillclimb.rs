use std::cmp::Ordering;

use rand::rngs::StdRng;

use super::{
    initial_population, mutate_candidate, random_candidate, simplify_and_admit, Strategy,
};
use crate::pool::Pool;
use crate::series::{Candidate, Fitness};

const REPLACEMENT_MAX_DEPTH: usize = 4;

/// Fraction of the population replaced with fresh randoms each generation.
const INJECTION_RATE: f64 = 0.05;

/// Population hill-climbing: every slot is clone-and-mutated, the worst 5%
/// are replaced with random candidates to escape local optima, and the
/// previous generation's best survives unchanged in its slot.
#[derive(Default)]
pub struct HillClimbStrategy {
    seed: Option<Candidate>,
}

impl Strategy for HillClimbStrategy {
    fn name(&self) -> &'static str {
        "hillclimb"
    }

    fn set_seed_formula(&mut self, seed: Candidate) {
        self.seed = Some(seed);
    }

    fn initialize(
        &self,
        pool: &dyn Pool,
        rng: &mut StdRng,
        pop_size: usize,
        max_depth: usize,
    ) -> Vec<Candidate> {
        initial_population(self.seed.as_ref(), pool, rng, pop_size, max_depth)
    }

    fn evolve(
        &self,
        population: &[Candidate],
        fitnesses: &[Fitness],
        pool: &dyn Pool,
        rng: &mut StdRng,
    ) -> Vec<Candidate> {
        let n = population.len();

        let mut next: Vec<Candidate> = population
            .iter()
            .map(|parent| {
                let mut child = parent.clone();
                mutate_candidate(&mut child, pool, rng);
                simplify_and_admit(child, pool, rng)
            })
            .collect();

        // Rank ascending by fitness to find the slots to reseed.
        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| {
            fitnesses[a]
                .combined
                .partial_cmp(&fitnesses[b].combined)
                .unwrap_or(Ordering::Equal)
        });

        let injection_count = ((n as f64 * INJECTION_RATE) as usize).max(1);
        for &idx in ranked.iter().take(injection_count.min(n)) {
            next[idx] = random_candidate(pool, rng, REPLACEMENT_MAX_DEPTH);
        }

        // Elitism: the previous best keeps its slot.
        if let Some(&best_idx) = ranked.last() {
            next[best_idx] = population[best_idx].clone();
        }

        next
    }
}
