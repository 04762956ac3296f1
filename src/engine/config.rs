use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, SumforgeError};
use crate::series::FitnessWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// All parameters for an evolutionary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name of the target constant.
    pub target: String,
    /// Gene pool name.
    pub pool: String,
    /// Strategy name.
    pub strategy: String,
    /// Individuals per generation.
    pub population: usize,
    /// Total generation budget across all attempts; 0 means unlimited.
    pub generations: usize,
    /// Per-candidate term budget.
    pub max_terms: i64,
    /// Random-tree maximum depth at initialization.
    pub max_depth: usize,
    /// Big-float precision in bits.
    pub precision: u32,
    /// RNG seed; 0 requests a nondeterministic seed.
    pub seed: u64,
    /// Parallel worker count; 0 is treated as 1.
    pub workers: usize,
    pub weights: FitnessWeights,
    /// Base stagnation patience; 0 disables restarts.
    pub stagnation: usize,
    /// Fast-path digit threshold for promotion to the precise path;
    /// 0 evaluates everything at full precision.
    pub f64_promotion_threshold: f64,
    /// Optional initial candidate in canonical rendering form.
    pub seed_formula: Option<String>,
    pub format: ReportFormat,
    /// Include every generation report in the final report.
    pub verbose: bool,
    /// Where to write the LaTeX/PDF hall of fame; None disables it.
    pub out_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target: "e".to_string(),
            pool: "conservative".to_string(),
            strategy: "hillclimb".to_string(),
            population: 200,
            generations: 1000,
            max_terms: 1024,
            max_depth: 4,
            precision: constants::DEFAULT_PRECISION,
            seed: 0,
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
            weights: FitnessWeights::default(),
            stagnation: 200,
            f64_promotion_threshold: 3.0,
            seed_formula: None,
            format: ReportFormat::Text,
            verbose: false,
            out_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(SumforgeError::Configuration(
                "population must be at least 1".to_string(),
            ));
        }
        if self.max_terms < 1 {
            return Err(SumforgeError::Configuration(
                "maxterms must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(SumforgeError::Configuration(
                "maxdepth must be at least 1".to_string(),
            ));
        }
        if self.precision < 2 {
            return Err(SumforgeError::Configuration(
                "precision must be at least 2 bits".to_string(),
            ));
        }
        Ok(())
    }
}
