use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::Rng;

use super::{
    crossover_candidates, initial_population, mutate_candidate, simplify_and_admit, Strategy,
};
use crate::pool::Pool;
use crate::series::{Candidate, Fitness};

const TOURNAMENT_SIZE: usize = 5;

/// Fraction of the population carried over unchanged.
const ELITE_RATE: f64 = 0.05;

/// Probability of mutating each offspring after crossover.
const MUTATION_RATE: f64 = 0.8;

/// Tournament selection with subtree crossover and mutation.
#[derive(Default)]
pub struct TournamentStrategy {
    seed: Option<Candidate>,
}

impl Strategy for TournamentStrategy {
    fn name(&self) -> &'static str {
        "tournament"
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
        let mut next = Vec::with_capacity(n);

        // Sort indices by fitness, best first.
        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| {
            fitnesses[b]
                .combined
                .partial_cmp(&fitnesses[a].combined)
                .unwrap_or(Ordering::Equal)
        });

        let elite_count = ((n as f64 * ELITE_RATE) as usize).max(1);
        for &idx in indices.iter().take(elite_count.min(n)) {
            next.push(population[idx].clone());
        }

        while next.len() < n {
            let p1 = tournament_select(population, fitnesses, rng);
            let p2 = tournament_select(population, fitnesses, rng);

            let (mut c1, mut c2) = crossover_candidates(p1, p2, rng);

            if rng.gen::<f64>() < MUTATION_RATE {
                mutate_candidate(&mut c1, pool, rng);
            }
            let c1 = simplify_and_admit(c1, pool, rng);

            if rng.gen::<f64>() < MUTATION_RATE {
                mutate_candidate(&mut c2, pool, rng);
            }
            let c2 = simplify_and_admit(c2, pool, rng);

            next.push(c1);
            if next.len() < n {
                next.push(c2);
            }
        }

        next.truncate(n);
        next
    }
}

/// Picks the best of `TOURNAMENT_SIZE` uniformly sampled individuals.
fn tournament_select<'a>(
    population: &'a [Candidate],
    fitnesses: &[Fitness],
    rng: &mut StdRng,
) -> &'a Candidate {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fit = fitnesses[best_idx].combined;

    for _ in 1..TOURNAMENT_SIZE {
        let idx = rng.gen_range(0..population.len());
        if fitnesses[idx].combined > best_fit {
            best_idx = idx;
            best_fit = fitnesses[idx].combined;
        }
    }

    &population[best_idx]
}
