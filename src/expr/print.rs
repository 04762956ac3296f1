use std::fmt;

use super::{BinaryOp, Expr, UnaryOp};

impl UnaryOp {
    /// Function-style name used by the compact renderer and parser.
    pub(super) fn fn_name(self) -> &'static str {
        match self {
            UnaryOp::Fibonacci => "fib",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Ln => "ln",
            UnaryOp::Floor => "floor",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqrt => "sqrt",
            // Rendered with dedicated notation, never as name(x).
            UnaryOp::Neg | UnaryOp::Factorial | UnaryOp::AltSign | UnaryOp::DoubleFactorial => "",
        }
    }
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Binomial => "C",
        }
    }
}

/// Compact canonical rendering. This string is also the tabu key, so it must
/// stay stable for structurally identical trees.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var => write!(f, "n"),
            Expr::Const(v) => write!(f, "{v}"),
            Expr::Unary { op, child } => match op {
                UnaryOp::Neg => write!(f, "(-{child})"),
                UnaryOp::Factorial => write!(f, "({child})!"),
                UnaryOp::AltSign => write!(f, "(-1)^({child})"),
                UnaryOp::DoubleFactorial => write!(f, "({child})!!"),
                _ => write!(f, "{}({child})", op.fn_name()),
            },
            Expr::Binary { op, left, right } => match op {
                BinaryOp::Binomial => write!(f, "C({left}, {right})"),
                BinaryOp::Pow => write!(f, "({left})^({right})"),
                _ => write!(f, "({left} {} {right})", op.symbol()),
            },
        }
    }
}

impl Expr {
    /// Typeset (LaTeX) rendering.
    pub fn latex(&self) -> String {
        match self {
            Expr::Var => "n".to_string(),
            Expr::Const(v) => v.to_string(),
            Expr::Unary { op, child } => {
                let child = child.latex();
                match op {
                    UnaryOp::Neg => format!("-{{{child}}}"),
                    UnaryOp::Factorial => format!("{{{child}}}!"),
                    UnaryOp::AltSign => format!("(-1)^{{{child}}}"),
                    UnaryOp::DoubleFactorial => format!("{{{child}}}!!"),
                    UnaryOp::Fibonacci => format!("F_{{{child}}}"),
                    UnaryOp::Sin => format!("\\sin{{({child})}}"),
                    UnaryOp::Cos => format!("\\cos{{({child})}}"),
                    UnaryOp::Ln => format!("\\ln{{({child})}}"),
                    UnaryOp::Floor => format!("\\lfloor {child} \\rfloor"),
                    UnaryOp::Ceil => format!("\\lceil {child} \\rceil"),
                    UnaryOp::Abs => format!("|{child}|"),
                    UnaryOp::Sqrt => format!("\\sqrt{{{child}}}"),
                }
            }
            Expr::Binary { op, left, right } => {
                let left = left.latex();
                let right = right.latex();
                match op {
                    BinaryOp::Add => format!("{{{left}}} + {{{right}}}"),
                    BinaryOp::Sub => format!("{{{left}}} - {{{right}}}"),
                    BinaryOp::Mul => format!("{{{left}}} \\cdot {{{right}}}"),
                    BinaryOp::Div => format!("\\frac{{{left}}}{{{right}}}"),
                    BinaryOp::Pow => format!("{{{left}}}^{{{right}}}"),
                    BinaryOp::Binomial => format!("\\binom{{{left}}}{{{right}}}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BinaryOp, Expr, UnaryOp};

    #[test]
    fn compact_rendering() {
        assert_eq!(Expr::Var.to_string(), "n");
        assert_eq!(Expr::Const(-5).to_string(), "-5");
        assert_eq!(Expr::unary(UnaryOp::Neg, Expr::Var).to_string(), "(-n)");
        assert_eq!(Expr::unary(UnaryOp::Factorial, Expr::Var).to_string(), "(n)!");
        assert_eq!(Expr::unary(UnaryOp::AltSign, Expr::Var).to_string(), "(-1)^(n)");
        assert_eq!(Expr::unary(UnaryOp::DoubleFactorial, Expr::Var).to_string(), "(n)!!");
        assert_eq!(Expr::unary(UnaryOp::Sqrt, Expr::Const(2)).to_string(), "sqrt(2)");
        assert_eq!(
            Expr::binary(BinaryOp::Add, Expr::Var, Expr::Const(1)).to_string(),
            "(n + 1)"
        );
        assert_eq!(
            Expr::binary(BinaryOp::Pow, Expr::Const(2), Expr::Var).to_string(),
            "(2)^(n)"
        );
        assert_eq!(
            Expr::binary(BinaryOp::Binomial, Expr::Var, Expr::Const(2)).to_string(),
            "C(n, 2)"
        );
    }

    #[test]
    fn latex_rendering() {
        assert_eq!(
            Expr::binary(BinaryOp::Div, Expr::Const(1), Expr::Var).latex(),
            "\\frac{1}{n}"
        );
        assert_eq!(Expr::unary(UnaryOp::Fibonacci, Expr::Var).latex(), "F_{n}");
        assert_eq!(
            Expr::binary(BinaryOp::Binomial, Expr::Var, Expr::Const(2)).latex(),
            "\\binom{n}{2}"
        );
    }
}
