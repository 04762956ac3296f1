use rand::rngs::StdRng;
use rand::Rng;

use crate::expr::Expr;
use crate::series::Candidate;

/// Subtree crossover between two candidates, producing two offspring.
/// Numerator and denominator trees are crossed independently.
pub fn crossover_candidates(
    a: &Candidate,
    b: &Candidate,
    rng: &mut StdRng,
) -> (Candidate, Candidate) {
    let mut c1 = a.clone();
    let mut c2 = b.clone();

    let (n1, n2) = crossover_trees(c1.numerator, c2.numerator, rng);
    c1.numerator = n1;
    c2.numerator = n2;

    let (d1, d2) = crossover_trees(c1.denominator, c2.denominator, rng);
    c1.denominator = d1;
    c2.denominator = d2;

    (c1, c2)
}

/// Exchanges uniformly chosen subtrees between two trees. The subtrees are
/// deep-cloned before the swap so the results never alias each other.
fn crossover_trees(mut a: Expr, mut b: Expr, rng: &mut StdRng) -> (Expr, Expr) {
    let idx_a = rng.gen_range(0..a.node_count());
    let idx_b = rng.gen_range(0..b.node_count());

    let sub_a = match a.node_at(idx_a) {
        Some(node) => node.clone(),
        None => return (a, b),
    };
    let sub_b = match b.node_at(idx_b) {
        Some(node) => node.clone(),
        None => return (a, b),
    };

    if let Some(slot) = a.node_at_mut(idx_a) {
        *slot = sub_b;
    }
    if let Some(slot) = b.node_at_mut(idx_b) {
        *slot = sub_a;
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool;
    use rand::SeedableRng;
    use rug::Float;

    const TEST_PREC: u32 = 512;

    #[test]
    fn produces_two_evaluable_candidates() {
        let pool = pool::get("conservative").unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let a = Candidate::new(pool.random_tree(&mut rng, 3), pool.random_tree(&mut rng, 3), 0);
        let b = Candidate::new(pool.random_tree(&mut rng, 3), pool.random_tree(&mut rng, 3), 1);

        let (c1, c2) = crossover_candidates(&a, &b, &mut rng);

        let n = Float::with_val(TEST_PREC, 3);
        let _ = c1.numerator.eval_big(&n, TEST_PREC);
        let _ = c1.denominator.eval_big(&n, TEST_PREC);
        let _ = c2.numerator.eval_big(&n, TEST_PREC);
        let _ = c2.denominator.eval_big(&n, TEST_PREC);

        // Start indices carry over from the respective parents.
        assert_eq!(c1.start, 0);
        assert_eq!(c2.start, 1);
    }

    #[test]
    fn parents_are_untouched() {
        let pool = pool::get("moderate").unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let a = Candidate::new(pool.random_tree(&mut rng, 4), pool.random_tree(&mut rng, 4), 0);
        let b = Candidate::new(pool.random_tree(&mut rng, 4), pool.random_tree(&mut rng, 4), 0);
        let a_rendered = a.to_string();
        let b_rendered = b.to_string();

        for _ in 0..20 {
            let _ = crossover_candidates(&a, &b, &mut rng);
        }

        assert_eq!(a.to_string(), a_rendered);
        assert_eq!(b.to_string(), b_rendered);
    }

    #[test]
    fn swaps_whole_node_budget() {
        // Crossing a leaf tree with anything keeps total node count constant
        // across the pair for the crossed slot.
        let mut rng = StdRng::seed_from_u64(9);
        let a: Expr = crate::expr::parse_expr("((n + 1) * 3)").unwrap();
        let b: Expr = crate::expr::parse_expr("(n)!").unwrap();
        let before = a.node_count() + b.node_count();
        let (a2, b2) = crossover_trees(a, b, &mut rng);
        assert_eq!(a2.node_count() + b2.node_count(), before);
    }
}
