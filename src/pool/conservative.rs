use rand::rngs::StdRng;
use rand::Rng;

use super::Pool;
use crate::expr::{BinaryOp, Expr, UnaryOp};

/// Basic building blocks: n, small integers, factorial, (-1)^n, negation,
/// and the four arithmetic operators.
pub struct ConservativePool;

const UNARY: [UnaryOp; 3] = [UnaryOp::Factorial, UnaryOp::AltSign, UnaryOp::Neg];
const BINARY: [BinaryOp; 4] = [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div];

impl Pool for ConservativePool {
    fn name(&self) -> &'static str {
        "conservative"
    }

    fn random_leaf(&self, rng: &mut StdRng) -> Expr {
        if rng.gen::<f64>() < 0.4 {
            Expr::Var
        } else {
            Expr::Const(rng.gen_range(1..=10))
        }
    }

    fn random_unary(&self, rng: &mut StdRng) -> UnaryOp {
        UNARY[rng.gen_range(0..UNARY.len())]
    }

    fn random_binary(&self, rng: &mut StdRng) -> BinaryOp {
        BINARY[rng.gen_range(0..BINARY.len())]
    }
}
