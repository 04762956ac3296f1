use rand::rngs::StdRng;
use rand::Rng;

use super::{scaled_leaf, Pool};
use crate::expr::{BinaryOp, Expr, UnaryOp};

/// Extends the conservative pool with powers of 2/3 as leaves, square root
/// as a unary operator, and power as a binary operator.
pub struct ModeratePool;

const UNARY: [UnaryOp; 4] = [
    UnaryOp::Factorial,
    UnaryOp::AltSign,
    UnaryOp::Neg,
    UnaryOp::Sqrt,
];

const BINARY: [BinaryOp; 5] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Pow,
];

impl Pool for ModeratePool {
    fn name(&self) -> &'static str {
        "moderate"
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
