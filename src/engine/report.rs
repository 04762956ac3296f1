use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EngineConfig;
use crate::error::Result;
use crate::series::Fitness;

/// Cap on entries in the final, deduplicated hall of fame.
pub const MAX_HALL_OF_FAME: usize = 50;

/// Summary of one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub best_fitness: Fitness,
    pub best_candidate: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub best_latex: String,
    pub avg_fitness: f64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub best_partial_sum: String,
}

/// Summary of one restart attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt: usize,
    pub generations: usize,
    pub best_found_at_gen: usize,
    pub best_candidate: String,
    pub best_latex: String,
    pub best_fitness: Fitness,
    pub best_partial_sum: String,
    pub timestamp: DateTime<Utc>,
}

/// Summary of the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub config: EngineConfig,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub generations: Vec<GenerationReport>,
    pub best_candidate: String,
    pub best_latex: String,
    pub best_fitness: Fitness,
    pub best_partial_sum: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attempts: Vec<AttemptResult>,
}

/// One-line human-readable generation summary.
pub fn format_generation(r: &GenerationReport) -> String {
    format!(
        "Gen {:4} | Best: {:.4} ({:.1} digits) | Avg: {:.4} | {}",
        r.generation,
        r.best_fitness.combined,
        r.best_fitness.correct_digits,
        r.avg_fitness,
        r.best_candidate
    )
}

/// Attempts sorted by correct digits descending, ties broken by combined
/// fitness descending.
pub fn sort_by_digits(attempts: &[AttemptResult]) -> Vec<AttemptResult> {
    let mut sorted = attempts.to_vec();
    sorted.sort_by(|a, b| {
        b.best_fitness
            .correct_digits
            .partial_cmp(&a.best_fitness.correct_digits)
            .unwrap_or(Ordering::Equal)
            .then(
                b.best_fitness
                    .combined
                    .partial_cmp(&a.best_fitness.combined)
                    .unwrap_or(Ordering::Equal),
            )
    });
    sorted
}

/// Drops attempts whose best candidate rendering was already seen.
pub fn dedup_attempts(attempts: Vec<AttemptResult>) -> Vec<AttemptResult> {
    let mut seen = HashSet::new();
    attempts
        .into_iter()
        .filter(|a| seen.insert(a.best_candidate.clone()))
        .collect()
}

/// Multi-line hall-of-fame listing, best first.
pub fn format_hall_of_fame(attempts: &[AttemptResult]) -> String {
    let mut out = String::from("--- Hall of Fame ---\n");
    for (i, a) in sort_by_digits(attempts).iter().enumerate() {
        out.push_str(&format!(
            "  #{}: [attempt {}, gen {}] {:5.1} digits | {}\n",
            i + 1,
            a.attempt,
            a.best_found_at_gen,
            a.best_fitness.correct_digits,
            a.best_candidate
        ));
    }
    out
}

/// Writes the final report in human-readable form.
pub fn write_text_final(w: &mut dyn Write, r: &FinalReport) -> io::Result<()> {
    if !r.attempts.is_empty() {
        writeln!(w, "{}", format_hall_of_fame(&r.attempts))?;
    }
    writeln!(w, "========== FINAL RESULT ==========")?;
    writeln!(w, "Target:    {}", r.config.target)?;
    writeln!(w, "Strategy:  {}", r.config.strategy)?;
    writeln!(w, "Pool:      {}", r.config.pool)?;
    writeln!(w, "Best:      {}", r.best_candidate)?;
    writeln!(w, "LaTeX:     {}", r.best_latex)?;
    writeln!(w, "Fitness:   {:.4}", r.best_fitness.combined)?;
    writeln!(w, "Digits:    {:.1}", r.best_fitness.correct_digits)?;
    writeln!(w, "Partial:   {}", r.best_partial_sum)?;
    writeln!(w, "==================================")?;
    Ok(())
}

/// Writes the final report as pretty-printed JSON.
pub fn write_json_final(w: &mut dyn Write, r: &FinalReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, r)?;
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(n: usize, digits: f64, combined: f64, candidate: &str) -> AttemptResult {
        AttemptResult {
            attempt: n,
            generations: 10,
            best_found_at_gen: 3,
            best_candidate: candidate.to_string(),
            best_latex: String::new(),
            best_fitness: Fitness {
                combined,
                correct_digits: digits,
                simplicity: 0.1,
                convergence_rate: 0.5,
            },
            best_partial_sum: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn sort_is_digits_then_combined() {
        let attempts = vec![
            attempt(1, 2.0, 10.0, "a"),
            attempt(2, 5.0, 1.0, "b"),
            attempt(3, 5.0, 9.0, "c"),
        ];
        let sorted = sort_by_digits(&attempts);
        let order: Vec<&str> = sorted.iter().map(|a| a.best_candidate.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);

        // Non-increasing in digits, then combined on ties.
        for pair in sorted.windows(2) {
            let (x, y) = (&pair[0].best_fitness, &pair[1].best_fitness);
            assert!(x.correct_digits >= y.correct_digits);
            if x.correct_digits == y.correct_digits {
                assert!(x.combined >= y.combined);
            }
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let attempts = vec![
            attempt(1, 5.0, 9.0, "dup"),
            attempt(2, 4.0, 8.0, "dup"),
            attempt(3, 3.0, 7.0, "other"),
        ];
        let deduped = dedup_attempts(attempts);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].attempt, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = FinalReport {
            config: EngineConfig::default(),
            generations: Vec::new(),
            best_candidate: "Sum_{n=0}^{inf} (1) / ((n)!)".to_string(),
            best_latex: String::new(),
            best_fitness: Fitness::worst(),
            best_partial_sum: String::new(),
            attempts: vec![attempt(1, 1.0, 2.0, "x")],
        };
        let mut buf = Vec::new();
        write_json_final(&mut buf, &report).unwrap();
        let parsed: FinalReport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.best_candidate, report.best_candidate);
        assert_eq!(parsed.attempts.len(), 1);
    }
}
