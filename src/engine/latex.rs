use std::io::{self, Write};

use rug::Float;

use super::report::{sort_by_digits, AttemptResult};
use super::EngineConfig;

fn latex_escape(s: &str) -> String {
    s.replace('_', "\\_")
}

/// Writes a compilable LaTeX document listing the hall of fame: run
/// parameters, then one typeset formula per attempt with its partial sum
/// and absolute error.
pub fn write_hall_of_fame_latex(
    w: &mut dyn Write,
    attempts: &[AttemptResult],
    cfg: &EngineConfig,
    target: &Float,
) -> io::Result<()> {
    let sorted = sort_by_digits(attempts);
    let target_text = target.to_string_radix(10, Some(50));
    let gen_budget = if cfg.generations > 0 {
        cfg.generations.to_string()
    } else {
        "unlimited".to_string()
    };

    writeln!(w, "\\documentclass{{article}}")?;
    writeln!(w, "\\usepackage{{amsmath}}")?;
    writeln!(w, "\\usepackage{{geometry}}")?;
    writeln!(w, "\\geometry{{margin=1in}}")?;
    writeln!(
        w,
        "\\title{{Hall of Fame --- Target: \\texttt{{{}}}}}",
        latex_escape(&cfg.target)
    )?;
    writeln!(w, "\\date{{\\today}}")?;
    writeln!(w, "\\begin{{document}}")?;
    writeln!(w, "\\maketitle")?;
    writeln!(w)?;
    writeln!(
        w,
        "\\noindent Target: \\texttt{{{}}}, Pool: \\texttt{{{}}}, Strategy: \\texttt{{{}}}\\\\",
        latex_escape(&cfg.target),
        latex_escape(&cfg.pool),
        latex_escape(&cfg.strategy)
    )?;
    writeln!(
        w,
        "Population: {}, Gen budget: {}, Stagnation: {}, Workers: {}, Seed: {}\\\\",
        cfg.population, gen_budget, cfg.stagnation, cfg.workers, cfg.seed
    )?;
    writeln!(w, "Target value: \\verb|{target_text}|\\ldots")?;
    writeln!(w)?;

    for (i, a) in sorted.iter().enumerate() {
        writeln!(
            w,
            "\\subsection*{{\\#{} --- {:.1} digits (attempt {}, gen {}, {})}}",
            i + 1,
            a.best_fitness.correct_digits,
            a.attempt,
            a.best_found_at_gen,
            a.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(w, "\\[")?;
        writeln!(w, "  {}", a.best_latex)?;
        writeln!(w, "\\]")?;
        if !a.best_partial_sum.is_empty() {
            match Float::parse(&a.best_partial_sum) {
                Ok(parsed) => {
                    let partial = Float::with_val(target.prec(), parsed);
                    let error = Float::with_val(target.prec(), &partial - target).abs();
                    writeln!(w, "\\noindent Partial sum: \\verb|{}|\\\\", a.best_partial_sum)?;
                    writeln!(w, "Error: \\verb|{}|", error.to_string_radix(10, Some(10)))?;
                }
                Err(_) => {
                    writeln!(w, "\\noindent Partial sum: \\verb|{}|", a.best_partial_sum)?;
                }
            }
            writeln!(w)?;
        }
    }

    writeln!(w, "\\end{{document}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Fitness;
    use chrono::Utc;

    #[test]
    fn produces_a_complete_document() {
        let attempts = vec![AttemptResult {
            attempt: 1,
            generations: 12,
            best_found_at_gen: 4,
            best_candidate: "Sum_{n=0}^{inf} (1) / ((n)!)".to_string(),
            best_latex: "\\sum_{n=0}^{\\infty} \\frac{1}{{n}!}".to_string(),
            best_fitness: Fitness {
                combined: 100.0,
                correct_digits: 14.0,
                simplicity: 0.2,
                convergence_rate: 0.1,
            },
            best_partial_sum: "2.718281828459045235".to_string(),
            timestamp: Utc::now(),
        }];
        let cfg = EngineConfig::default();
        let target = Float::with_val(256, 1).exp();

        let mut buf = Vec::new();
        write_hall_of_fame_latex(&mut buf, &attempts, &cfg, &target).unwrap();
        let doc = String::from_utf8(buf).unwrap();

        assert!(doc.starts_with("\\documentclass{article}"));
        assert!(doc.contains("\\begin{document}"));
        assert!(doc.contains("\\frac{1}{{n}!}"));
        assert!(doc.contains("Partial sum"));
        assert!(doc.contains("Error:"));
        assert!(doc.trim_end().ends_with("\\end{document}"));
    }
}
