use super::{BinaryOp, Expr, UnaryOp};

/// Complexity score with heavier weights for operations that are more
/// expensive to justify (factorials, trig, binomials).
pub fn weighted_complexity(node: &Expr) -> f64 {
    match node {
        Expr::Var => 1.0,
        Expr::Const(v) => {
            let v = v.unsigned_abs();
            if v <= 10 {
                1.0
            } else {
                1.0 + (v as f64).log10()
            }
        }
        Expr::Unary { op, child } => unary_weight(*op) + weighted_complexity(child),
        Expr::Binary { op, left, right } => {
            binary_weight(*op) + weighted_complexity(left) + weighted_complexity(right)
        }
    }
}

fn unary_weight(op: UnaryOp) -> f64 {
    match op {
        UnaryOp::Neg | UnaryOp::Abs => 1.0,
        UnaryOp::Factorial | UnaryOp::AltSign => 2.0,
        UnaryOp::Floor | UnaryOp::Ceil | UnaryOp::Sqrt => 2.0,
        UnaryOp::DoubleFactorial | UnaryOp::Fibonacci => 3.0,
        UnaryOp::Sin | UnaryOp::Cos | UnaryOp::Ln => 3.0,
    }
}

fn binary_weight(op: BinaryOp) -> f64 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => 1.0,
        BinaryOp::Mul | BinaryOp::Div => 1.5,
        BinaryOp::Pow => 2.0,
        BinaryOp::Binomial => 3.0,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BinaryOp, Expr, UnaryOp};
    use super::*;

    #[test]
    fn leaf_weights() {
        assert_eq!(weighted_complexity(&Expr::Var), 1.0);
        assert_eq!(weighted_complexity(&Expr::Const(7)), 1.0);
        assert_eq!(weighted_complexity(&Expr::Const(-7)), 1.0);
        // Large constants pay a log penalty.
        assert!(weighted_complexity(&Expr::Const(1000)) > 3.9);
    }

    #[test]
    fn heavier_ops_cost_more() {
        let add = Expr::binary(BinaryOp::Add, Expr::Var, Expr::Var);
        let binom = Expr::binary(BinaryOp::Binomial, Expr::Var, Expr::Var);
        assert!(weighted_complexity(&binom) > weighted_complexity(&add));

        let neg = Expr::unary(UnaryOp::Neg, Expr::Var);
        let fib = Expr::unary(UnaryOp::Fibonacci, Expr::Var);
        assert!(weighted_complexity(&fib) > weighted_complexity(&neg));
    }
}
