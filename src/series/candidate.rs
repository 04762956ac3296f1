use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SumforgeError;
use crate::expr::{parse_summation, weighted_complexity, Expr};

/// A candidate series: Sum_{n=start}^{inf} numerator(n) / denominator(n).
///
/// Cloning deep-copies both trees; candidates never share subtrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub numerator: Expr,
    pub denominator: Expr,
    /// Starting index, 0 or 1 for most classical series.
    pub start: i64,
}

impl Candidate {
    pub fn new(numerator: Expr, denominator: Expr, start: i64) -> Self {
        Self {
            numerator,
            denominator,
            start,
        }
    }

    /// Combined weighted complexity of both trees.
    pub fn complexity(&self) -> f64 {
        weighted_complexity(&self.numerator) + weighted_complexity(&self.denominator)
    }

    /// Total node count of both trees.
    pub fn node_count(&self) -> usize {
        self.numerator.node_count() + self.denominator.node_count()
    }

    /// Typeset rendering.
    pub fn latex(&self) -> String {
        format!(
            "\\sum_{{n={}}}^{{\\infty}} \\frac{{{}}}{{{}}}",
            self.start,
            self.numerator.latex(),
            self.denominator.latex()
        )
    }
}

/// Canonical rendering; doubles as the tabu key.
impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sum_{{n={}}}^{{inf}} ({}) / ({})",
            self.start, self.numerator, self.denominator
        )
    }
}

impl FromStr for Candidate {
    type Err = SumforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, numerator, denominator) = parse_summation(s)?;
        Ok(Self {
            numerator,
            denominator,
            start,
        })
    }
}
