use std::sync::LazyLock;

use super::{BinaryOp, Expr, UnaryOp};

/// Largest integer exponent accepted by the fast-path power.
pub const MAX_F64_EXPONENT: i64 = 20;

// Fixed-size lookup tables, fully precomputed on first use, read-only after.
// 170! is the last finite f64 factorial; fib(1476) the last finite Fibonacci.

static FACTORIAL_F64: LazyLock<Vec<f64>> = LazyLock::new(|| {
    let mut table = vec![1.0; 171];
    for i in 1..table.len() {
        table[i] = table[i - 1] * i as f64;
    }
    table
});

static DOUBLE_FACTORIAL_F64: LazyLock<Vec<f64>> = LazyLock::new(|| {
    let mut table = vec![1.0; 301];
    for i in 2..table.len() {
        table[i] = table[i - 2] * i as f64;
    }
    table
});

static FIBONACCI_F64: LazyLock<Vec<f64>> = LazyLock::new(|| {
    let mut table = vec![0.0; 1477];
    table[1] = 1.0;
    for i in 2..table.len() {
        table[i] = table[i - 1] + table[i - 2];
    }
    table
});

impl Expr {
    /// Evaluates the tree at `n` entirely in f64.
    ///
    /// Mirrors [`Expr::eval_big`] with tighter domain caps; a successful
    /// evaluation never returns a non-finite value.
    pub fn eval_f64(&self, n: f64) -> Option<f64> {
        match self {
            Expr::Var => Some(n),
            Expr::Const(v) => Some(*v as f64),
            Expr::Unary { op, child } => {
                let child = child.eval_f64(n)?;
                eval_unary_f64(*op, child)
            }
            Expr::Binary { op, left, right } => {
                let left = left.eval_f64(n)?;
                let right = right.eval_f64(n)?;
                eval_binary_f64(*op, left, right)
            }
        }
    }
}

fn table_at(table: &[f64], arg: f64) -> Option<f64> {
    let iv = arg as i64;
    if arg != iv as f64 || iv < 0 || iv >= table.len() as i64 {
        return None;
    }
    Some(table[iv as usize])
}

fn eval_unary_f64(op: UnaryOp, child: f64) -> Option<f64> {
    match op {
        UnaryOp::Neg => Some(-child),
        UnaryOp::Factorial => table_at(&FACTORIAL_F64, child),
        UnaryOp::AltSign => {
            let iv = child as i64;
            if child != iv as f64 || iv < 0 {
                return None;
            }
            Some(if iv % 2 == 0 { 1.0 } else { -1.0 })
        }
        UnaryOp::DoubleFactorial => table_at(&DOUBLE_FACTORIAL_F64, child),
        UnaryOp::Fibonacci => table_at(&FIBONACCI_F64, child),
        UnaryOp::Sin => {
            if !child.is_finite() {
                return None;
            }
            Some(child.sin())
        }
        UnaryOp::Cos => {
            if !child.is_finite() {
                return None;
            }
            Some(child.cos())
        }
        UnaryOp::Ln => {
            if child <= 0.0 || !child.is_finite() {
                return None;
            }
            Some(child.ln())
        }
        UnaryOp::Floor => {
            if !child.is_finite() {
                return None;
            }
            Some(child.floor())
        }
        UnaryOp::Ceil => {
            if !child.is_finite() {
                return None;
            }
            Some(child.ceil())
        }
        UnaryOp::Abs => Some(child.abs()),
        UnaryOp::Sqrt => {
            if child < 0.0 || child.is_nan() {
                return None;
            }
            Some(child.sqrt())
        }
    }
}

fn eval_binary_f64(op: BinaryOp, left: f64, right: f64) -> Option<f64> {
    let finite = |r: f64| if r.is_finite() { Some(r) } else { None };
    match op {
        BinaryOp::Add => finite(left + right),
        BinaryOp::Sub => finite(left - right),
        BinaryOp::Mul => finite(left * right),
        BinaryOp::Div => {
            if right == 0.0 {
                return None;
            }
            finite(left / right)
        }
        BinaryOp::Pow => pow_f64(left, right),
        BinaryOp::Binomial => binomial_f64(left, right),
    }
}

fn pow_f64(base: f64, exp: f64) -> Option<f64> {
    let ei = exp as i64;
    if exp == ei as f64 {
        if ei < 0 {
            if base == 0.0 {
                return None;
            }
            let pos = int_pow_f64(base, -ei)?;
            let r = 1.0 / pos;
            if !r.is_finite() {
                return None;
            }
            return Some(r);
        }
        return int_pow_f64(base, ei);
    }
    if base < 0.0 {
        return None;
    }
    let r = base.powf(exp);
    if !r.is_finite() {
        return None;
    }
    Some(r)
}

fn int_pow_f64(base: f64, mut exp: i64) -> Option<f64> {
    if exp > MAX_F64_EXPONENT {
        return None;
    }
    let mut result = 1.0;
    let mut b = base;
    while exp > 0 {
        if exp % 2 == 1 {
            result *= b;
        }
        b *= b;
        exp /= 2;
    }
    if !result.is_finite() {
        return None;
    }
    Some(result)
}

fn binomial_f64(nf: f64, kf: f64) -> Option<f64> {
    let ni = nf as i64;
    let mut ki = kf as i64;
    if nf != ni as f64 || kf != ki as f64 {
        return None;
    }
    if ni < 0 || ki < 0 || ki > ni || ni > 1000 {
        return None;
    }
    if ki > ni - ki {
        ki = ni - ki;
    }
    let mut result = 1.0;
    for i in 0..ki {
        result *= (ni - i) as f64 / (i + 1) as f64;
        if !result.is_finite() {
            return None;
        }
    }
    Some(result)
}
