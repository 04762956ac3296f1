use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::process::Command;

use chrono::Utc;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rug::Float;

use super::latex::write_hall_of_fame_latex;
use super::progress::{NullProgress, ProgressSink};
use super::report::{
    dedup_attempts, format_generation, format_hall_of_fame, sort_by_digits, AttemptResult,
    FinalReport, GenerationReport, MAX_HALL_OF_FAME,
};
use super::EngineConfig;
use crate::constants;
use crate::error::Result;
use crate::pool::{self, Pool};
use crate::series::{
    compute_fitness, compute_fitness_f64, evaluate_candidate, evaluate_candidate_f64, Candidate,
    EvalResult, Fitness, MAX_DIGITS,
};
use crate::strategy::{self, Strategy};

/// Initial sentinel below even the worst fitness, so the first generation
/// always registers as an improvement.
const INITIAL_BEST: f64 = -1e18;

/// Runs the evolutionary search: attempts of generations, with stagnation
/// detection, restarts, a tabu set and a hall of fame.
pub struct Engine {
    cfg: EngineConfig,
    pool: Box<dyn Pool>,
    strategy: Box<dyn Strategy>,
    target: Float,
    target_f64: f64,
    rng: StdRng,
    workers: rayon::ThreadPool,
}

impl Engine {
    /// Resolves the configured pool, strategy and target. Unknown names and
    /// malformed seed formulas are construction-time errors.
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        cfg.validate()?;

        let pool = pool::get(&cfg.pool)?;
        let mut strategy = strategy::get(&cfg.strategy)?;
        if let Some(formula) = &cfg.seed_formula {
            let seed: Candidate = formula.parse()?;
            strategy.set_seed_formula(seed);
        }

        let constant = constants::get(&cfg.target, cfg.precision)?;

        let seed = if cfg.seed != 0 { cfg.seed } else { rand::random() };
        let rng = StdRng::seed_from_u64(seed);

        let worker_count = cfg.workers.max(1);
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .map_err(|e| crate::SumforgeError::Configuration(e.to_string()))?;

        info!(
            "engine ready: target {}, pool {}, strategy {}, population {}, workers {}, seed {}",
            cfg.target, cfg.pool, cfg.strategy, cfg.population, worker_count, seed
        );

        Ok(Self {
            cfg,
            pool,
            strategy,
            target: constant.value,
            target_f64: constant.value_f64,
            rng,
            workers,
        })
    }

    /// Executes attempts until the generation budget is exhausted or the
    /// global best reaches the digit cap.
    pub fn run(&mut self) -> FinalReport {
        self.run_with_progress(&mut NullProgress)
    }

    /// Like [`Engine::run`], forwarding generation and attempt summaries to
    /// `sink` as they are produced.
    pub fn run_with_progress(&mut self, sink: &mut dyn ProgressSink) -> FinalReport {
        let run_stamp = Utc::now().timestamp();
        let mut hall_of_fame: Vec<AttemptResult> = Vec::new();
        let mut gen_reports: Vec<GenerationReport> = Vec::new();
        let mut tabu: HashSet<String> = HashSet::new();
        let mut total_gens = 0usize;
        let mut attempt = 0usize;

        let mut global_best: Option<Candidate> = None;
        let mut global_best_fitness = Fitness {
            combined: INITIAL_BEST,
            ..Fitness::worst()
        };
        let mut global_best_result: Option<EvalResult> = None;

        let unlimited = self.cfg.generations == 0;
        while unlimited || total_gens < self.cfg.generations {
            attempt += 1;
            info!("=== attempt {attempt} ===");

            let mut population = self.strategy.initialize(
                self.pool.as_ref(),
                &mut self.rng,
                self.cfg.population,
                self.cfg.max_depth,
            );

            let mut best_this_attempt: Option<Candidate> = None;
            let mut best_fitness = Fitness {
                combined: INITIAL_BEST,
                ..Fitness::worst()
            };
            let mut best_result: Option<EvalResult> = None;
            let mut gens_since_improvement = 0usize;
            let mut best_found_at_gen = 0usize;
            let mut attempt_gens = 0usize;

            while unlimited || total_gens < self.cfg.generations {
                let (fitnesses, results) = self.evaluate_population(&population, &tabu);

                // Best and runner-up, with stable index tie-breaking.
                let mut best_idx = 0usize;
                let mut second_idx: Option<usize> = None;
                let mut avg_fitness = 0.0;
                for (i, f) in fitnesses.iter().enumerate() {
                    avg_fitness += f.combined;
                    if f.combined > fitnesses[best_idx].combined {
                        second_idx = Some(best_idx);
                        best_idx = i;
                    } else if i != best_idx
                        && second_idx.map_or(true, |s| f.combined > fitnesses[s].combined)
                    {
                        second_idx = Some(i);
                    }
                }
                avg_fitness /= fitnesses.len() as f64;

                let improved = fitnesses[best_idx].combined > best_fitness.combined;
                if improved {
                    best_this_attempt = Some(population[best_idx].clone());
                    best_fitness = fitnesses[best_idx];
                    best_result = results[best_idx].clone();
                    best_found_at_gen = attempt_gens;
                    gens_since_improvement = 0;
                } else {
                    gens_since_improvement += 1;
                }

                let report = GenerationReport {
                    generation: attempt_gens,
                    best_fitness: fitnesses[best_idx],
                    best_candidate: population[best_idx].to_string(),
                    best_latex: population[best_idx].latex(),
                    avg_fitness,
                    best_partial_sum: partial_sum_text(&results[best_idx]),
                };

                if self.cfg.verbose {
                    info!("{}", format_generation(&report));
                } else if improved {
                    info!(
                        "[gen {attempt_gens}] new best {:.1} digits | fitness {:.4}",
                        best_fitness.correct_digits, best_fitness.combined
                    );
                    info!("  #1: {}", population[best_idx]);
                    if let Some(second) = second_idx {
                        if results[second].as_ref().is_some_and(|r| r.ok) {
                            info!(
                                "  #2: {:.1} digits | {}",
                                fitnesses[second].correct_digits, population[second]
                            );
                        }
                    }
                } else if attempt_gens % 20 == 0 {
                    debug!(
                        "[gen {attempt_gens}] best so far {:.1} digits",
                        best_fitness.correct_digits
                    );
                }
                sink.on_generation(&report);
                gen_reports.push(report);

                total_gens += 1;
                attempt_gens += 1;

                // Hit the digit cap: nothing left to find in this attempt.
                if best_fitness.correct_digits >= MAX_DIGITS {
                    info!("[gen {attempt_gens}] hit the {MAX_DIGITS} digit cap");
                    break;
                }

                // Stagnation patience scales with accuracy: low-digit bests
                // get a short leash, high-digit bests the full budget.
                if self.cfg.stagnation > 0 {
                    let scale = (best_fitness.correct_digits / 10.0).min(1.0);
                    let effective = ((self.cfg.stagnation as f64 * scale) as usize).max(20);
                    if gens_since_improvement >= effective {
                        info!(
                            "[gen {attempt_gens}] stagnated after {gens_since_improvement} \
                             generations ({:.1} digits, patience {effective})",
                            best_fitness.correct_digits
                        );
                        break;
                    }
                }

                population =
                    self.strategy
                        .evolve(&population, &fitnesses, self.pool.as_ref(), &mut self.rng);
            }

            let mut attempt_result = AttemptResult {
                attempt,
                generations: attempt_gens,
                best_found_at_gen,
                best_candidate: String::new(),
                best_latex: String::new(),
                best_fitness,
                best_partial_sum: String::new(),
                timestamp: Utc::now(),
            };
            if let Some(best) = &best_this_attempt {
                attempt_result.best_candidate = best.to_string();
                attempt_result.best_latex = best.latex();
                attempt_result.best_partial_sum = partial_sum_text(&best_result);
            }
            sink.on_attempt(&attempt_result);
            hall_of_fame.push(attempt_result);

            // Future restarts must not rediscover this attempt's best.
            if let Some(best) = &best_this_attempt {
                let key = best.to_string();
                if tabu.insert(key.clone()) {
                    info!("tabu: added {key:?}");
                }
            }

            if best_this_attempt.is_some() && best_fitness.combined > global_best_fitness.combined {
                global_best = best_this_attempt;
                global_best_fitness = best_fitness;
                global_best_result = best_result;
            }

            info!("{}", format_hall_of_fame(&hall_of_fame));
            if let Some(out_dir) = self.cfg.out_dir.clone() {
                self.write_latex_outputs(&out_dir, &hall_of_fame, run_stamp);
            }

            if global_best_fitness.correct_digits >= MAX_DIGITS {
                info!("global best hit the {MAX_DIGITS} digit cap, stopping");
                break;
            }
        }

        let mut attempts = dedup_attempts(sort_by_digits(&hall_of_fame));
        attempts.truncate(MAX_HALL_OF_FAME);

        let mut final_report = FinalReport {
            config: self.cfg.clone(),
            generations: if self.cfg.verbose { gen_reports } else { Vec::new() },
            best_candidate: String::new(),
            best_latex: String::new(),
            best_fitness: global_best_fitness,
            best_partial_sum: String::new(),
            attempts,
        };
        if let Some(best) = &global_best {
            final_report.best_candidate = best.to_string();
            final_report.best_latex = best.latex();
            final_report.best_partial_sum = partial_sum_text(&global_best_result);
        }
        final_report
    }

    /// Two-phase evaluation of one generation.
    ///
    /// With a positive promotion threshold, every non-tabu candidate is first
    /// screened in f64; only those reaching the threshold in fast digits are
    /// re-evaluated at full precision, overwriting their fitness and result.
    /// Tabu candidates score worst in both phases without being evaluated.
    fn evaluate_population(
        &self,
        population: &[Candidate],
        tabu: &HashSet<String>,
    ) -> (Vec<Fitness>, Vec<Option<EvalResult>>) {
        let n = population.len();
        let rendered: Vec<String> = population.iter().map(|c| c.to_string()).collect();

        let mut fitnesses = vec![Fitness::worst(); n];
        let mut results: Vec<Option<EvalResult>> = vec![None; n];

        let threshold = self.cfg.f64_promotion_threshold;
        if threshold <= 0.0 {
            // Fast phase disabled: full precision for everyone.
            self.evaluate_big(population, &rendered, None, tabu, &mut fitnesses, &mut results);
            return (fitnesses, results);
        }

        let max_terms = self.cfg.max_terms;
        let target_f64 = self.target_f64;
        let weights = self.cfg.weights;

        let fast: Vec<Fitness> = self.workers.install(|| {
            population
                .par_iter()
                .enumerate()
                .map(|(i, c)| {
                    if tabu.contains(&rendered[i]) {
                        Fitness::worst()
                    } else {
                        let result = evaluate_candidate_f64(c, max_terms);
                        compute_fitness_f64(c, &result, target_f64, weights)
                    }
                })
                .collect()
        });

        let promote: Vec<bool> = fast.iter().map(|f| f.correct_digits >= threshold).collect();
        fitnesses = fast;

        self.evaluate_big(
            population,
            &rendered,
            Some(&promote),
            tabu,
            &mut fitnesses,
            &mut results,
        );
        (fitnesses, results)
    }

    /// Big-float evaluation of selected candidates; `promote` of `None`
    /// selects everyone. Workers write to disjoint indices.
    fn evaluate_big(
        &self,
        population: &[Candidate],
        rendered: &[String],
        promote: Option<&[bool]>,
        tabu: &HashSet<String>,
        fitnesses: &mut [Fitness],
        results: &mut [Option<EvalResult>],
    ) {
        let max_terms = self.cfg.max_terms;
        let precision = self.cfg.precision;
        let weights = self.cfg.weights;
        let target = &self.target;

        let evaluated: Vec<Option<(Fitness, Option<EvalResult>)>> = self.workers.install(|| {
            population
                .par_iter()
                .enumerate()
                .map(|(i, c)| {
                    if !promote.map_or(true, |p| p[i]) {
                        return None;
                    }
                    if tabu.contains(&rendered[i]) {
                        return Some((Fitness::worst(), None));
                    }
                    let result = evaluate_candidate(c, max_terms, precision);
                    let fitness = compute_fitness(c, &result, target, weights);
                    Some((fitness, Some(result)))
                })
                .collect()
        });

        for (i, slot) in evaluated.into_iter().enumerate() {
            if let Some((fitness, result)) = slot {
                fitnesses[i] = fitness;
                results[i] = result;
            }
        }
    }

    /// Writes the LaTeX hall of fame (and a PDF when pdflatex is available)
    /// after each attempt, so output survives interruption.
    fn write_latex_outputs(&self, out_dir: &Path, hall_of_fame: &[AttemptResult], run_stamp: i64) {
        let base = format!(
            "{}_{}_{}_{}",
            self.cfg.target, self.cfg.pool, self.cfg.strategy, run_stamp
        );
        let tmp_dir = std::env::temp_dir();
        let tex_path = tmp_dir.join(format!("{base}.tex"));

        let mut buf = Vec::new();
        if let Err(e) = write_hall_of_fame_latex(&mut buf, hall_of_fame, &self.cfg, &self.target) {
            warn!("error rendering {}: {e}", tex_path.display());
            return;
        }
        if let Err(e) = fs::write(&tex_path, &buf) {
            warn!("error writing {}: {e}", tex_path.display());
            return;
        }

        match Command::new("pdflatex")
            .arg("-interaction=nonstopmode")
            .arg(format!("{base}.tex"))
            .current_dir(&tmp_dir)
            .output()
        {
            Ok(output) if !output.status.success() => {
                warn!("pdflatex failed: {}", String::from_utf8_lossy(&output.stdout));
            }
            Ok(_) => {}
            Err(_) => debug!("pdflatex not available, skipping PDF"),
        }

        for ext in ["tex", "pdf"] {
            let src = tmp_dir.join(format!("{base}.{ext}"));
            if src.exists() {
                let dst = out_dir.join(format!("{base}.{ext}"));
                match fs::copy(&src, &dst) {
                    Ok(_) => info!("wrote {}", dst.display()),
                    Err(e) => warn!("error writing {}: {e}", dst.display()),
                }
            }
        }
        for ext in ["tex", "aux", "log", "pdf"] {
            let _ = fs::remove_file(tmp_dir.join(format!("{base}.{ext}")));
        }
    }
}

fn partial_sum_text(result: &Option<EvalResult>) -> String {
    match result {
        Some(r) if r.ok => match &r.partial_sum {
            Some(sum) => sum.to_string_radix(10, Some(20)),
            None => String::new(),
        },
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EngineConfig {
        EngineConfig {
            population: 4,
            seed: 7,
            workers: 1,
            out_dir: None,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn tabu_candidates_score_worst_without_evaluation() {
        let engine = Engine::new(test_config()).expect("engine construction");

        let banned: Candidate = "Sum_{n=0}^{inf} (1) / ((n)!)".parse().unwrap();
        let fresh: Candidate = "Sum_{n=1}^{inf} (1) / ((n * n))".parse().unwrap();
        let population = vec![banned.clone(), fresh];

        let mut tabu = HashSet::new();
        tabu.insert(banned.to_string());

        let (fitnesses, results) = engine.evaluate_population(&population, &tabu);
        assert!(fitnesses[0].is_worst(), "tabu candidate was evaluated");
        assert!(results[0].is_none());
        assert!(!fitnesses[1].is_worst(), "fresh candidate was not scored");
    }

    #[test]
    fn tabu_applies_with_fast_phase_disabled() {
        let cfg = EngineConfig {
            f64_promotion_threshold: 0.0,
            ..test_config()
        };
        let engine = Engine::new(cfg).expect("engine construction");

        let banned: Candidate = "Sum_{n=0}^{inf} (1) / ((n)!)".parse().unwrap();
        let population = vec![banned.clone()];

        let mut tabu = HashSet::new();
        tabu.insert(banned.to_string());

        let (fitnesses, _) = engine.evaluate_population(&population, &tabu);
        assert!(fitnesses[0].is_worst());
    }
}
