mod conservative;
mod exhaustive;
mod moderate;

pub use conservative::ConservativePool;
pub use exhaustive::ExhaustivePool;
pub use moderate::ModeratePool;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{Result, SumforgeError};
use crate::expr::{BinaryOp, Expr, UnaryOp};

/// A named catalog of random building blocks for expression trees.
pub trait Pool: Send + Sync {
    fn name(&self) -> &'static str;
    fn random_leaf(&self, rng: &mut StdRng) -> Expr;
    fn random_unary(&self, rng: &mut StdRng) -> UnaryOp;
    fn random_binary(&self, rng: &mut StdRng) -> BinaryOp;

    /// Builds a random tree up to `max_depth`, biased toward leaves so that
    /// average depth stays well below the maximum: 0.4 leaf, 0.2 unary,
    /// 0.4 binary, with a forced leaf when the depth budget reaches 1.
    fn random_tree(&self, rng: &mut StdRng, max_depth: usize) -> Expr {
        if max_depth <= 1 {
            return self.random_leaf(rng);
        }
        let r: f64 = rng.gen();
        if r < 0.4 {
            self.random_leaf(rng)
        } else if r < 0.6 {
            Expr::unary(self.random_unary(rng), self.random_tree(rng, max_depth - 1))
        } else {
            Expr::binary(
                self.random_binary(rng),
                self.random_tree(rng, max_depth - 1),
                self.random_tree(rng, max_depth - 1),
            )
        }
    }
}

/// Returns a pool by name.
pub fn get(name: &str) -> Result<Box<dyn Pool>> {
    match name {
        "conservative" => Ok(Box::new(ConservativePool)),
        "moderate" => Ok(Box::new(ModeratePool)),
        "exhaustive" => Ok(Box::new(ExhaustivePool)),
        _ => Err(SumforgeError::UnknownPool(name.to_string())),
    }
}

/// Names of all available pools.
pub fn names() -> &'static [&'static str] {
    &["conservative", "moderate", "exhaustive"]
}

/// Leaf distribution shared by the moderate and exhaustive pools: the
/// conservative leaves plus powers of two and three.
pub(crate) fn scaled_leaf(rng: &mut StdRng) -> Expr {
    let r: f64 = rng.gen();
    if r < 0.35 {
        Expr::Var
    } else if r < 0.75 {
        Expr::Const(rng.gen_range(1..=10))
    } else if r < 0.875 {
        // powers of 2: 2, 4, 8, 16
        let exp: u32 = rng.gen_range(1..=4);
        Expr::Const(1i64 << exp)
    } else {
        const POWERS_OF_THREE: [i64; 3] = [3, 9, 27];
        Expr::Const(POWERS_OF_THREE[rng.gen_range(0..POWERS_OF_THREE.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rug::Float;

    const TEST_PREC: u32 = 512;

    fn clean_eval_ratio(pool_name: &str) -> f64 {
        let pool = get(pool_name).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let total = 1000;
        let mut successes = 0;
        for _ in 0..total {
            let tree = pool.random_tree(&mut rng, 3);
            let n_val: i64 = rng.gen_range(1..=10);
            let n = Float::with_val(TEST_PREC, n_val);
            if tree.eval_big(&n, TEST_PREC).is_some() {
                successes += 1;
            }
        }
        successes as f64 / total as f64
    }

    #[test]
    fn conservative_trees_mostly_evaluate() {
        assert!(clean_eval_ratio("conservative") > 0.5);
    }

    #[test]
    fn moderate_trees_mostly_evaluate() {
        assert!(clean_eval_ratio("moderate") > 0.3);
    }

    #[test]
    fn exhaustive_trees_sometimes_evaluate() {
        assert!(clean_eval_ratio("exhaustive") > 0.2);
    }

    #[test]
    fn depth_budget_is_honored() {
        let pool = get("exhaustive").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let tree = pool.random_tree(&mut rng, 5);
            assert!(tree.depth() <= 5);
        }
    }

    #[test]
    fn unknown_pool_is_rejected() {
        assert!(get("nonexistent").is_err());
    }

    #[test]
    fn names_resolve() {
        for name in names() {
            let pool = get(name).unwrap();
            assert_eq!(pool.name(), *name);
        }
    }
}
