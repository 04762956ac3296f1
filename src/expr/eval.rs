use std::cmp::Ordering;
use std::sync::{LazyLock, RwLock};

use rug::{Float, Integer};

use super::{BinaryOp, Expr, UnaryOp};

/// Largest argument accepted by factorial, double factorial, Fibonacci and
/// binomial on the big-float path.
pub const MAX_COMPUTE_INPUT: i64 = 1000;

/// Largest integer exponent accepted by the big-float power.
pub const MAX_BIG_EXPONENT: i64 = 200;

impl Expr {
    /// Evaluates the tree at `n` with `prec` bits of precision.
    ///
    /// `None` marks a domain failure: division by zero, factorial-family
    /// arguments that are negative, non-integer or beyond the safe cap,
    /// logarithms of non-positive values, square roots of negatives, and
    /// powers of negative bases with non-integer exponents.
    ///
    /// Sin, cos, ln, sqrt and non-integer powers round-trip through f64
    /// regardless of `prec`; changing that would shift which candidates look
    /// convergent, so it stays.
    pub fn eval_big(&self, n: &Float, prec: u32) -> Option<Float> {
        match self {
            Expr::Var => Some(Float::with_val(prec, n)),
            Expr::Const(v) => Some(Float::with_val(prec, *v)),
            Expr::Unary { op, child } => {
                let child = child.eval_big(n, prec)?;
                eval_unary_big(*op, child, prec)
            }
            Expr::Binary { op, left, right } => {
                let left = left.eval_big(n, prec)?;
                let right = right.eval_big(n, prec)?;
                eval_binary_big(*op, left, right, prec)
            }
        }
    }
}

fn eval_unary_big(op: UnaryOp, child: Float, prec: u32) -> Option<Float> {
    match op {
        UnaryOp::Neg => Some(-child),
        UnaryOp::Factorial => factorial_big(&child, prec),
        UnaryOp::AltSign => {
            let iv = to_i64_exact(&child)?;
            if iv < 0 {
                return None;
            }
            Some(Float::with_val(prec, if iv % 2 == 0 { 1 } else { -1 }))
        }
        UnaryOp::DoubleFactorial => double_factorial_big(&child, prec),
        UnaryOp::Fibonacci => fibonacci_big(&child, prec),
        UnaryOp::Sin => {
            let f = child.to_f64();
            if !f.is_finite() {
                return None;
            }
            Some(Float::with_val(prec, f.sin()))
        }
        UnaryOp::Cos => {
            let f = child.to_f64();
            if !f.is_finite() {
                return None;
            }
            Some(Float::with_val(prec, f.cos()))
        }
        UnaryOp::Ln => {
            let f = child.to_f64();
            if f <= 0.0 || !f.is_finite() {
                return None;
            }
            Some(Float::with_val(prec, f.ln()))
        }
        UnaryOp::Floor => Some(child.floor()),
        UnaryOp::Ceil => Some(child.ceil()),
        UnaryOp::Abs => Some(child.abs()),
        UnaryOp::Sqrt => {
            if child.cmp0() == Some(Ordering::Less) {
                return None;
            }
            let f = child.to_f64();
            if !f.is_finite() {
                return None;
            }
            Some(Float::with_val(prec, f.sqrt()))
        }
    }
}

fn eval_binary_big(op: BinaryOp, left: Float, right: Float, prec: u32) -> Option<Float> {
    match op {
        BinaryOp::Add => Some(left + right),
        BinaryOp::Sub => Some(left - right),
        BinaryOp::Mul => Some(left * right),
        BinaryOp::Div => {
            if right.is_zero() {
                return None;
            }
            Some(left / right)
        }
        BinaryOp::Pow => pow_big(&left, &right, prec),
        BinaryOp::Binomial => binomial_big(&left, &right, prec),
    }
}

/// Converts a big float to i64 if it is exactly a whole number in range.
pub(super) fn to_i64_exact(f: &Float) -> Option<i64> {
    if !f.is_integer() {
        return None;
    }
    f.to_integer().and_then(|i| i.to_i64())
}

// Memoized lookup tables seeded for 0..=20, extended on demand. Readers take
// the shared lock; a writer extending the table re-checks after acquiring the
// exclusive lock so concurrent readers never observe a partial entry.

static FACTORIALS: LazyLock<RwLock<Vec<Integer>>> = LazyLock::new(|| {
    let mut values = vec![Integer::from(1)];
    for i in 1..=20i64 {
        let next = Integer::from(&values[(i - 1) as usize] * i);
        values.push(next);
    }
    RwLock::new(values)
});

static DOUBLE_FACTORIALS: LazyLock<RwLock<Vec<Integer>>> = LazyLock::new(|| {
    let mut values = Vec::with_capacity(21);
    for i in 0..=20i64 {
        let mut result = Integer::from(1);
        let mut j = i;
        while j >= 2 {
            result *= j;
            j -= 2;
        }
        values.push(result);
    }
    RwLock::new(values)
});

static FIBONACCIS: LazyLock<RwLock<Vec<Integer>>> = LazyLock::new(|| {
    let mut values = vec![Integer::from(0), Integer::from(1)];
    for i in 2..=20usize {
        let next = Integer::from(&values[i - 1] + &values[i - 2]);
        values.push(next);
    }
    RwLock::new(values)
});

fn lookup_or_extend(
    cache: &RwLock<Vec<Integer>>,
    n: i64,
    prec: u32,
    step: fn(&[Integer], i64) -> Integer,
) -> Float {
    {
        let values = cache.read().unwrap();
        if (n as usize) < values.len() {
            return Float::with_val(prec, &values[n as usize]);
        }
    }
    let mut values = cache.write().unwrap();
    // Re-check: another writer may have extended past n already.
    while (values.len() as i64) <= n {
        let next = step(&values, values.len() as i64);
        values.push(next);
    }
    Float::with_val(prec, &values[n as usize])
}

fn factorial_big(f: &Float, prec: u32) -> Option<Float> {
    let iv = to_i64_exact(f)?;
    if !(0..=MAX_COMPUTE_INPUT).contains(&iv) {
        return None;
    }
    Some(lookup_or_extend(&FACTORIALS, iv, prec, |values, i| {
        Integer::from(&values[(i - 1) as usize] * i)
    }))
}

fn double_factorial_big(f: &Float, prec: u32) -> Option<Float> {
    let iv = to_i64_exact(f)?;
    if !(0..=MAX_COMPUTE_INPUT).contains(&iv) {
        return None;
    }
    Some(lookup_or_extend(&DOUBLE_FACTORIALS, iv, prec, |values, i| {
        if i < 2 {
            Integer::from(1)
        } else {
            Integer::from(&values[(i - 2) as usize] * i)
        }
    }))
}

fn fibonacci_big(f: &Float, prec: u32) -> Option<Float> {
    let iv = to_i64_exact(f)?;
    if !(0..=MAX_COMPUTE_INPUT).contains(&iv) {
        return None;
    }
    Some(lookup_or_extend(&FIBONACCIS, iv, prec, |values, i| {
        Integer::from(&values[(i - 1) as usize] + &values[(i - 2) as usize])
    }))
}

fn pow_big(base: &Float, exp: &Float, prec: u32) -> Option<Float> {
    if let Some(ei) = to_i64_exact(exp) {
        if ei < 0 {
            if base.is_zero() {
                return None;
            }
            let pos = int_pow_big(base, ei.checked_neg()?, prec)?;
            if pos.is_zero() {
                return None;
            }
            return Some(Float::with_val(prec, 1) / pos);
        }
        return int_pow_big(base, ei, prec);
    }
    // Non-integer exponent: f64 fallback, negative bases rejected.
    let bf = base.to_f64();
    let ef = exp.to_f64();
    if bf < 0.0 {
        return None;
    }
    let r = bf.powf(ef);
    if !r.is_finite() {
        return None;
    }
    Some(Float::with_val(prec, r))
}

/// Binary exponentiation for non-negative integer exponents.
fn int_pow_big(base: &Float, mut exp: i64, prec: u32) -> Option<Float> {
    if exp > MAX_BIG_EXPONENT {
        return None;
    }
    let mut result = Float::with_val(prec, 1);
    let mut b = Float::with_val(prec, base);
    while exp > 0 {
        if exp % 2 == 1 {
            result *= &b;
        }
        b.square_mut();
        exp /= 2;
    }
    Some(result)
}

fn binomial_big(nf: &Float, kf: &Float, prec: u32) -> Option<Float> {
    let n = to_i64_exact(nf)?;
    if !(0..=MAX_COMPUTE_INPUT).contains(&n) {
        return None;
    }
    let mut k = to_i64_exact(kf)?;
    if k < 0 || k > n {
        return None;
    }
    if k > n - k {
        k = n - k;
    }
    let mut result = Integer::from(1);
    for i in 0..k {
        result *= n - i;
        result /= i + 1;
    }
    Some(Float::with_val(prec, &result))
}
