use std::sync::mpsc;

use sumforge::engine::{ChannelProgress, Engine, EngineConfig, ProgressMessage};
use sumforge::series::MAX_DIGITS;

fn small_config() -> EngineConfig {
    EngineConfig {
        target: "e".to_string(),
        population: 30,
        generations: 10,
        max_terms: 128,
        seed: 42,
        stagnation: 5,
        workers: 2,
        out_dir: None,
        ..EngineConfig::default()
    }
}

#[test]
fn small_run_finds_something() {
    let mut engine = Engine::new(small_config()).expect("engine construction");
    let report = engine.run();

    assert!(!report.best_candidate.is_empty(), "expected a best candidate");
    assert!(
        report.best_fitness.combined > -1e9,
        "expected non-worst fitness, got {}",
        report.best_fitness.combined
    );
    assert!(
        report.best_fitness.correct_digits > 0.0,
        "expected at least a fraction of a digit, got {}",
        report.best_fitness.correct_digits
    );
    assert!(!report.attempts.is_empty(), "expected at least one attempt");
}

#[test]
fn restarts_respect_the_generation_budget() {
    let cfg = EngineConfig {
        target: "euler_gamma".to_string(),
        population: 10,
        generations: 50,
        max_terms: 32,
        seed: 99,
        stagnation: 5,
        workers: 2,
        out_dir: None,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(cfg).expect("engine construction");
    let report = engine.run();

    // With a hard target, a tiny population and minimal patience the budget
    // spans several attempts. The hall of fame is deduplicated, so count the
    // distinct attempt indices rather than its length.
    assert!(
        report.attempts.len() >= 2,
        "expected multiple attempts, got {}",
        report.attempts.len()
    );

    let total_gens: usize = report.attempts.iter().map(|a| a.generations).sum();
    assert!(
        total_gens <= 50,
        "total generations {total_gens} exceed the budget"
    );

    for a in &report.attempts {
        assert!(a.generations > 0, "attempt {} ran no generations", a.attempt);
        assert!(!a.best_candidate.is_empty(), "attempt {} has no best", a.attempt);
        assert!(
            a.best_found_at_gen < a.generations,
            "attempt {}: best at gen {} of {}",
            a.attempt,
            a.best_found_at_gen,
            a.generations
        );
    }
}

#[test]
fn tournament_strategy_runs() {
    let cfg = EngineConfig {
        strategy: "tournament".to_string(),
        ..small_config()
    };
    let mut engine = Engine::new(cfg).expect("engine construction");
    let report = engine.run();
    assert!(!report.best_candidate.is_empty());
}

#[test]
fn disabled_fast_phase_still_works() {
    let cfg = EngineConfig {
        generations: 5,
        f64_promotion_threshold: 0.0,
        ..small_config()
    };
    let mut engine = Engine::new(cfg).expect("engine construction");
    let report = engine.run();

    assert!(!report.best_candidate.is_empty());
    assert!(report.best_fitness.combined > -1e9);
    assert!(!report.attempts.is_empty());
}

#[test]
fn fixed_seed_and_workers_reproduce() {
    let run = || {
        let mut engine = Engine::new(small_config()).expect("engine construction");
        engine.run()
    };
    let first = run();
    let second = run();

    assert_eq!(first.best_candidate, second.best_candidate);
    assert_eq!(first.best_fitness.combined, second.best_fitness.combined);
    assert_eq!(first.attempts.len(), second.attempts.len());
}

#[test]
fn hall_of_fame_is_sorted_and_capped() {
    let mut engine = Engine::new(small_config()).expect("engine construction");
    let report = engine.run();

    assert!(report.attempts.len() <= 50);
    for pair in report.attempts.windows(2) {
        let (a, b) = (&pair[0].best_fitness, &pair[1].best_fitness);
        assert!(a.correct_digits >= b.correct_digits);
        if a.correct_digits == b.correct_digits {
            assert!(a.combined >= b.combined);
        }
    }
    assert!(report.best_fitness.correct_digits <= MAX_DIGITS);
}

#[test]
fn seed_formula_is_honored() {
    let cfg = EngineConfig {
        generations: 3,
        seed_formula: Some("Sum_{n=0}^{inf} (1) / ((n)!)".to_string()),
        ..small_config()
    };
    let mut engine = Engine::new(cfg).expect("engine construction");
    let report = engine.run();

    // 1/n! nails e immediately; nothing in a 3-generation run beats it.
    assert!(
        report.best_fitness.correct_digits >= 10.0,
        "seeded candidate should dominate, got {} digits",
        report.best_fitness.correct_digits
    );
}

#[test]
fn progress_sink_sees_every_generation_and_attempt() {
    let (tx, rx) = mpsc::channel();
    let mut sink = ChannelProgress::new(tx);

    let mut engine = Engine::new(small_config()).expect("engine construction");
    let report = engine.run_with_progress(&mut sink);
    drop(engine);

    let mut generations = 0usize;
    let mut attempts = 0usize;
    for message in rx.try_iter() {
        match message {
            ProgressMessage::Generation(g) => {
                assert!(!g.best_candidate.is_empty());
                generations += 1;
            }
            ProgressMessage::Attempt(a) => {
                assert!(a.attempt > 0);
                attempts += 1;
            }
        }
    }

    assert!(generations > 0 && generations <= 10);
    // The final report's attempt list is deduplicated; the sink sees the
    // raw stream.
    assert!(attempts >= report.attempts.len());
}

#[test]
fn construction_errors() {
    let bad_target = EngineConfig {
        target: "nonexistent".to_string(),
        ..EngineConfig::default()
    };
    assert!(Engine::new(bad_target).is_err());

    let bad_pool = EngineConfig {
        pool: "nonexistent".to_string(),
        ..EngineConfig::default()
    };
    assert!(Engine::new(bad_pool).is_err());

    let bad_strategy = EngineConfig {
        strategy: "nonexistent".to_string(),
        ..EngineConfig::default()
    };
    assert!(Engine::new(bad_strategy).is_err());

    let bad_formula = EngineConfig {
        seed_formula: Some("1/n".to_string()),
        ..EngineConfig::default()
    };
    assert!(Engine::new(bad_formula).is_err());
}
