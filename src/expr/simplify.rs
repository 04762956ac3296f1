use rug::Float;

use super::eval::to_i64_exact;
use super::{BinaryOp, Expr, UnaryOp};

const MAX_SIMPLIFY_ITERATIONS: usize = 20;

/// Largest constant exponent folded by the rewrite pass.
const MAX_FOLD_EXPONENT: i64 = 20;

/// Applies local rewrite rules bottom-up until a fixed point (capped).
pub fn simplify(mut node: Expr) -> Expr {
    for _ in 0..MAX_SIMPLIFY_ITERATIONS {
        let next = simplify_once(node.clone());
        if next == node {
            return next;
        }
        node = next;
    }
    node
}

/// Full two-pass simplification: rewrite rules, then folding of constant
/// subtrees by big-float evaluation at `prec` bits, then rewrites again to
/// clean up after the fold.
pub fn simplify_with_folding(node: Expr, prec: u32) -> Expr {
    let node = simplify(node);
    let node = fold_constant_subtrees(node, prec);
    simplify(node)
}

fn simplify_once(node: Expr) -> Expr {
    match node {
        Expr::Var | Expr::Const(_) => node,

        Expr::Unary { op, child } => {
            let child = simplify_once(*child);

            match (op, &child) {
                // -(-x) = x
                (UnaryOp::Neg, Expr::Unary { op: UnaryOp::Neg, child: inner }) => {
                    return (**inner).clone();
                }
                // -(k) = -k
                (UnaryOp::Neg, Expr::Const(v)) => {
                    if let Some(neg) = v.checked_neg() {
                        return Expr::Const(neg);
                    }
                }
                (UnaryOp::Factorial, Expr::Const(v)) if (0..=20).contains(v) => {
                    let mut result = 1i64;
                    for i in 2..=*v {
                        result *= i;
                    }
                    return Expr::Const(result);
                }
                (UnaryOp::DoubleFactorial, Expr::Const(v)) if (0..=20).contains(v) => {
                    let mut result = 1i64;
                    let mut i = *v;
                    while i >= 2 {
                        result *= i;
                        i -= 2;
                    }
                    return Expr::Const(result);
                }
                (UnaryOp::AltSign, Expr::Const(v)) if *v >= 0 => {
                    return Expr::Const(if v % 2 == 0 { 1 } else { -1 });
                }
                (UnaryOp::Abs, Expr::Const(v)) => {
                    if let Some(abs) = v.checked_abs() {
                        return Expr::Const(abs);
                    }
                }
                // sqrt(k^2) = k for perfect squares
                (UnaryOp::Sqrt, Expr::Const(v)) if *v >= 0 => {
                    let root = (*v as f64).sqrt().round() as i64;
                    if root.checked_mul(root) == Some(*v) {
                        return Expr::Const(root);
                    }
                }
                _ => {}
            }

            Expr::unary(op, child)
        }

        Expr::Binary { op, left, right } => {
            let left = simplify_once(*left);
            let right = simplify_once(*right);

            if let (Expr::Const(a), Expr::Const(b)) = (&left, &right) {
                if let Some(result) = fold_constants(op, *a, *b) {
                    return Expr::Const(result);
                }
            }

            match op {
                BinaryOp::Add => {
                    if right == Expr::Const(0) {
                        return left;
                    }
                    if left == Expr::Const(0) {
                        return right;
                    }
                    // x + (-k) = x - k
                    if let Expr::Const(v) = right {
                        if v < 0 {
                            return simplify_once(Expr::binary(BinaryOp::Sub, left, Expr::Const(-v)));
                        }
                    }
                    // x + neg(y) = x - y
                    if let Expr::Unary { op: UnaryOp::Neg, child } = right {
                        return simplify_once(Expr::binary(BinaryOp::Sub, left, *child));
                    }
                }
                BinaryOp::Sub => {
                    if right == Expr::Const(0) {
                        return left;
                    }
                    if left == Expr::Const(0) {
                        return simplify_once(Expr::unary(UnaryOp::Neg, right));
                    }
                    // x - (-k) = x + k
                    if let Expr::Const(v) = right {
                        if v < 0 {
                            return simplify_once(Expr::binary(BinaryOp::Add, left, Expr::Const(-v)));
                        }
                    }
                    // x - neg(y) = x + y
                    if let Expr::Unary { op: UnaryOp::Neg, child } = right {
                        return simplify_once(Expr::binary(BinaryOp::Add, left, *child));
                    }
                    // x - x = 0 (structural equality)
                    if left == right {
                        return Expr::Const(0);
                    }
                }
                BinaryOp::Mul => {
                    if left == Expr::Const(0) || right == Expr::Const(0) {
                        return Expr::Const(0);
                    }
                    if right == Expr::Const(1) {
                        return left;
                    }
                    if left == Expr::Const(1) {
                        return right;
                    }
                    if right == Expr::Const(-1) {
                        return simplify_once(Expr::unary(UnaryOp::Neg, left));
                    }
                    if left == Expr::Const(-1) {
                        return simplify_once(Expr::unary(UnaryOp::Neg, right));
                    }
                }
                BinaryOp::Div => {
                    if right == Expr::Const(1) {
                        return left;
                    }
                    if left == Expr::Const(0) {
                        return Expr::Const(0);
                    }
                    // x / x = 1 (structural equality, zero handled at eval time)
                    if left == right {
                        return Expr::Const(1);
                    }
                }
                BinaryOp::Pow => {
                    if right == Expr::Const(0) {
                        return Expr::Const(1);
                    }
                    if right == Expr::Const(1) {
                        return left;
                    }
                    if left == Expr::Const(0) {
                        return Expr::Const(0);
                    }
                    if left == Expr::Const(1) {
                        return Expr::Const(1);
                    }
                }
                BinaryOp::Binomial => {}
            }

            Expr::binary(op, left, right)
        }
    }
}

/// Folds two integer constants, rejecting overflow and inexact division.
fn fold_constants(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 || a % b != 0 {
                return None;
            }
            Some(a / b)
        }
        BinaryOp::Pow => {
            if !(0..=MAX_FOLD_EXPONENT).contains(&b) {
                return None;
            }
            let mut result = 1i64;
            for _ in 0..b {
                result = result.checked_mul(a)?;
            }
            Some(result)
        }
        BinaryOp::Binomial => None,
    }
}

/// Replaces any subtree that does not mention the variable with an integer
/// constant obtained by evaluating it.
fn fold_constant_subtrees(node: Expr, prec: u32) -> Expr {
    if !node.contains_var() {
        let dummy = Float::with_val(prec, 0);
        if let Some(value) = node.eval_big(&dummy, prec) {
            if let Some(iv) = to_i64_exact(&value) {
                return Expr::Const(iv);
            }
            // Non-integer constant subtree (e.g. 1/(-13) + 9 ≈ 8.923): round
            // to the nearest integer so the search works with clean constants.
            // TODO: fold 1/3 + 1 to a rational 4/3 instead of rounding once a
            // rational-coefficient node exists.
            if let Some(iv) = round_to_i64(&value) {
                return Expr::Const(iv);
            }
        }
        return node;
    }

    match node {
        Expr::Unary { op, child } => Expr::unary(op, fold_constant_subtrees(*child, prec)),
        Expr::Binary { op, left, right } => Expr::binary(
            op,
            fold_constant_subtrees(*left, prec),
            fold_constant_subtrees(*right, prec),
        ),
        other => other,
    }
}

/// Rounds to the nearest i64, rejecting non-finite values, zero (which would
/// invite division by zero downstream) and values outside the i64 range.
fn round_to_i64(f: &Float) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let mut rounded = f.clone();
    if f.is_sign_negative() {
        rounded -= 0.5;
    } else {
        rounded += 0.5;
    }
    let iv = rounded.trunc().to_integer()?.to_i64()?;
    if iv == 0 {
        return None;
    }
    Some(iv)
}

#[cfg(test)]
mod tests {
    use super::super::{parse_expr, BinaryOp, Expr, UnaryOp};
    use super::*;

    fn s(input: &str) -> String {
        simplify(parse_expr(input).unwrap()).to_string()
    }

    #[test]
    fn identity_rules() {
        assert_eq!(s("(n + 0)"), "n");
        assert_eq!(s("(0 + n)"), "n");
        assert_eq!(s("(n - 0)"), "n");
        assert_eq!(s("(n * 1)"), "n");
        assert_eq!(s("(1 * n)"), "n");
        assert_eq!(s("(n * 0)"), "0");
        assert_eq!(s("(n / 1)"), "n");
        assert_eq!(s("(0 / n)"), "0");
    }

    #[test]
    fn structural_equality_rules() {
        assert_eq!(s("(n - n)"), "0");
        assert_eq!(s("(n / n)"), "1");
        assert_eq!(s("((n + 1) - (n + 1))"), "0");
    }

    #[test]
    fn negation_rules() {
        assert_eq!(s("(-(-n))"), "n");
        assert_eq!(s("(n + -3)"), "(n - 3)");
        assert_eq!(s("(n - -3)"), "(n + 3)");
        assert_eq!(s("(n + (-n))"), "0");
        assert_eq!(s("(0 - n)"), "(-n)");
        assert_eq!(s("(n * -1)"), "(-n)");
    }

    #[test]
    fn power_rules() {
        assert_eq!(s("(n)^(0)"), "1");
        assert_eq!(s("(n)^(1)"), "n");
        assert_eq!(s("(0)^(n)"), "0");
        assert_eq!(s("(1)^(n)"), "1");
        assert_eq!(s("(0)^(0)"), "1");
        assert_eq!(s("(2)^(3)"), "8");
    }

    #[test]
    fn constant_folding() {
        assert_eq!(s("(2 + 3)"), "5");
        assert_eq!(s("(2 * 3)"), "6");
        assert_eq!(s("(6 / 3)"), "2");
        // Inexact division is left alone.
        assert_eq!(s("(7 / 3)"), "(7 / 3)");
        assert_eq!(s("(5)!"), "120");
        assert_eq!(s("(7)!!"), "105");
        assert_eq!(s("(-1)^(4)"), "1");
        assert_eq!(s("(-1)^(3)"), "-1");
        assert_eq!(s("abs(-9)"), "9");
        assert_eq!(s("sqrt(16)"), "4");
        assert_eq!(s("sqrt(15)"), "sqrt(15)");
    }

    #[test]
    fn overflow_aborts_fold() {
        let tree = Expr::binary(
            BinaryOp::Mul,
            Expr::Const(i64::MAX),
            Expr::Const(2),
        );
        // Tree is retained unsimplified rather than wrapping around.
        assert_eq!(simplify(tree.clone()), tree);
    }

    #[test]
    fn idempotent_within_cap() {
        let inputs = [
            "((n + 0) * (1 * n))",
            "(((2 + 3) * n) / (n / n))",
            "(-(-((n)!)))",
            "((n - n) + sqrt(16))",
        ];
        for input in inputs {
            let once = simplify(parse_expr(input).unwrap());
            let twice = simplify(once.clone());
            assert_eq!(once.to_string(), twice.to_string(), "not idempotent for {input}");
        }
    }

    #[test]
    fn folds_variable_free_subtrees() {
        // The rewrite rules never touch binomials; only the evaluation pass
        // can reduce C(5, 2) to a constant.
        let tree = parse_expr("(C(5, 2) * n)").unwrap();
        let folded = simplify_with_folding(tree, 128);
        assert_eq!(folded.to_string(), "(10 * n)");
    }

    #[test]
    fn rounds_non_integer_constant_subtrees() {
        // 9 + 1/(-13) ≈ 8.923 rounds to 9.
        let tree = parse_expr("((9 + (1 / -13)) * n)").unwrap();
        let folded = simplify_with_folding(tree, 128);
        assert_eq!(folded.to_string(), "(9 * n)");
    }

    #[test]
    fn refuses_to_fold_to_zero() {
        // 1/13 rounds to 0, which is rejected; the subtree stays symbolic.
        let tree = parse_expr("((1 / 13) * n)").unwrap();
        let folded = simplify_with_folding(tree, 128);
        assert_eq!(folded.to_string(), "((1 / 13) * n)");
    }

    #[test]
    fn unary_wrap_preserved() {
        assert_eq!(s("(n)!"), "(n)!");
        assert_eq!(s("((n + 0))!"), "(n)!");
        assert_eq!(simplify(Expr::unary(UnaryOp::Neg, Expr::Const(5))), Expr::Const(-5));
    }
}
