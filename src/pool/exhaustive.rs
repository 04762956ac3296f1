use rand::rngs::StdRng;
use rand::Rng;

use super::{scaled_leaf, Pool};
use crate::expr::{BinaryOp, Expr, UnaryOp};

/// The full operator vocabulary: everything in the moderate pool plus double
/// factorial, Fibonacci, trig, ln, floor, ceil and binomial coefficients.
pub struct ExhaustivePool;

const UNARY: [UnaryOp; 11] = [
    UnaryOp::Factorial,
    UnaryOp::AltSign,
    UnaryOp::Neg,
    UnaryOp::DoubleFactorial,
    UnaryOp::Fibonacci,
    UnaryOp::Sqrt,
    UnaryOp::Sin,
    UnaryOp::Cos,
    UnaryOp::Ln,
    UnaryOp::Floor,
    UnaryOp::Ceil,
];

const BINARY: [BinaryOp; 6] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Pow,
    BinaryOp::Binomial,
];

impl Pool for ExhaustivePool {
    fn name(&self) -> &'static str {
        "exhaustive"
    }

    fn random_leaf(&self, rng: &mut StdRng) -> Expr {
        scaled_leaf(rng)
    }

    fn random_unary(&self, rng: &mut StdRng) -> UnaryOp {
        UNARY[rng.gen_range(0..UNARY.len())]
    }

    fn random_binary(&self, rng: &mut StdRng) -> BinaryOp {
        BINARY[rng.gen_range(0..BINARY.len())]
    }
}
