use std::io::{stderr, stdout, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use sumforge::constants;
use sumforge::engine::{write_json_final, write_text_final, Engine, EngineConfig, ReportFormat};
use sumforge::series::FitnessWeights;

/// Evolutionary search for closed-form series that converge to mathematical
/// constants.
#[derive(Parser, Debug)]
#[command(name = "sumforge")]
#[command(about = "Evolve closed-form series whose partial sums converge to a target constant")]
struct Cli {
    /// Target constant (pi, e, euler_gamma, ln2, catalan, apery).
    #[arg(long, default_value = "e")]
    target: String,

    /// Gene pool (conservative, moderate, exhaustive).
    #[arg(long, default_value = "conservative")]
    pool: String,

    /// Evolution strategy (hillclimb, tournament).
    #[arg(long, default_value = "hillclimb")]
    strategy: String,

    /// Population size.
    #[arg(long, default_value_t = 200)]
    population: usize,

    /// Total generation budget across attempts; 0 means unlimited.
    #[arg(long, default_value_t = 1000)]
    generations: usize,

    /// Max terms to evaluate per series.
    #[arg(long, default_value_t = 1024)]
    maxterms: i64,

    /// Max random-tree depth at initialization.
    #[arg(long, default_value_t = 4)]
    maxdepth: usize,

    /// Big-float precision in bits.
    #[arg(long, default_value_t = constants::DEFAULT_PRECISION)]
    precision: u32,

    /// Random seed; 0 picks one nondeterministically.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of parallel workers; 0 means one per logical CPU.
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Generations without improvement before restart; 0 disables restarts.
    #[arg(long, default_value_t = 200)]
    stagnation: usize,

    /// Fast-path digit threshold for promotion to full precision;
    /// 0 disables the f64 screening phase.
    #[arg(long, default_value_t = 3.0)]
    f64_promotion_threshold: f64,

    /// Accuracy weight in the fitness function.
    #[arg(long, default_value_t = 10.0)]
    weight_accuracy: f64,

    /// Complexity penalty weight in the fitness function.
    #[arg(long, default_value_t = 2.0)]
    weight_complexity: f64,

    /// Convergence weight in the fitness function.
    #[arg(long, default_value_t = 1.0)]
    weight_convergence: f64,

    /// Initial candidate in canonical form, e.g.
    /// "Sum_{n=0}^{inf} (1) / ((n)!)".
    #[arg(long)]
    seed_formula: Option<String>,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value_t = CliFormat::Text)]
    format: CliFormat,

    /// Record every generation in the final report.
    #[arg(long)]
    verbose: bool,

    /// Output directory for the LaTeX/PDF hall of fame.
    #[arg(long, default_value = ".")]
    outdir: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliFormat {
    Text,
    Json,
}

impl Cli {
    fn into_config(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            target: self.target,
            pool: self.pool,
            strategy: self.strategy,
            population: self.population,
            generations: self.generations,
            max_terms: self.maxterms,
            max_depth: self.maxdepth,
            precision: self.precision,
            seed: self.seed,
            workers: if self.workers == 0 {
                defaults.workers
            } else {
                self.workers
            },
            weights: FitnessWeights {
                accuracy: self.weight_accuracy,
                complexity: self.weight_complexity,
                convergence: self.weight_convergence,
            },
            stagnation: self.stagnation,
            f64_promotion_threshold: self.f64_promotion_threshold,
            seed_formula: self.seed_formula,
            format: match self.format {
                CliFormat::Text => ReportFormat::Text,
                CliFormat::Json => ReportFormat::Json,
            },
            verbose: self.verbose,
            out_dir: Some(self.outdir),
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let cfg = cli.into_config();
    if let Some(dir) = &cfg.out_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error creating output dir {}: {e}", dir.display());
            process::exit(1);
        }
    }

    let mut engine = match Engine::new(cfg) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let report = engine.run();

    let result = match report.config.format {
        ReportFormat::Json => write_json_final(&mut stdout(), &report),
        ReportFormat::Text => write_text_final(&mut stdout(), &report).map_err(Into::into),
    };
    if let Err(e) = result {
        let _ = writeln!(&mut stderr(), "error writing report: {e}");
        process::exit(1);
    }
}
