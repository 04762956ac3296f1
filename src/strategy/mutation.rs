use rand::rngs::StdRng;
use rand::Rng;

use crate::expr::Expr;
use crate::pool::Pool;
use crate::series::Candidate;

/// Depth bound for trees grafted in by subtree mutation.
const MAX_MUTATION_DEPTH: usize = 4;

/// Applies one random mutation to a candidate in place: flip the start index
/// (probability 0.1), or rewrite the numerator or denominator (0.45 each).
pub fn mutate_candidate(c: &mut Candidate, pool: &dyn Pool, rng: &mut StdRng) {
    let r: f64 = rng.gen();
    if r < 0.1 {
        // Many classical series start at 0 or 1; toggle between the two.
        c.start = 1 - c.start;
    } else if r < 0.55 {
        let tree = std::mem::replace(&mut c.numerator, Expr::Var);
        c.numerator = mutate_tree(tree, pool, rng);
    } else {
        let tree = std::mem::replace(&mut c.denominator, Expr::Var);
        c.denominator = mutate_tree(tree, pool, rng);
    }
}

fn mutate_tree(root: Expr, pool: &dyn Pool, rng: &mut StdRng) -> Expr {
    match rng.gen_range(0..6) {
        0 => point_mutate(root, pool, rng),
        1 => subtree_mutate(root, pool, rng),
        2 => hoist_mutate(root, rng),
        3 => const_perturb(root, rng),
        4 => grow_mutate(root, pool, rng),
        _ => shrink_mutate(root, rng),
    }
}

/// Replaces a random node's operation, keeping its children; leaves are
/// swapped for fresh random leaves.
fn point_mutate(mut root: Expr, pool: &dyn Pool, rng: &mut StdRng) -> Expr {
    let idx = rng.gen_range(0..root.node_count());
    if let Some(node) = root.node_at_mut(idx) {
        match node {
            Expr::Var | Expr::Const(_) => *node = pool.random_leaf(rng),
            Expr::Unary { op, .. } => *op = pool.random_unary(rng),
            Expr::Binary { op, .. } => *op = pool.random_binary(rng),
        }
    }
    root
}

/// Replaces a random subtree with a fresh random tree of bounded depth.
fn subtree_mutate(mut root: Expr, pool: &dyn Pool, rng: &mut StdRng) -> Expr {
    let idx = rng.gen_range(0..root.node_count());
    if let Some(node) = root.node_at_mut(idx) {
        *node = pool.random_tree(rng, MAX_MUTATION_DEPTH);
    }
    root
}

/// Promotes a random non-root subtree to be the new root.
fn hoist_mutate(root: Expr, rng: &mut StdRng) -> Expr {
    let count = root.node_count();
    if count <= 1 {
        return root;
    }
    let idx = rng.gen_range(1..count);
    match root.node_at(idx) {
        Some(subtree) => subtree.clone(),
        None => root,
    }
}

/// Nudges a random constant by ±1..3, steering away from zero.
fn const_perturb(mut root: Expr, rng: &mut StdRng) -> Expr {
    let consts = root.const_indices();
    if consts.is_empty() {
        return root;
    }
    let idx = consts[rng.gen_range(0..consts.len())];
    if let Some(Expr::Const(v)) = root.node_at_mut(idx) {
        let mut delta: i64 = rng.gen_range(1..=3);
        if rng.gen::<f64>() < 0.5 {
            delta = -delta;
        }
        *v = v.saturating_add(delta);
        if *v == 0 {
            *v = 1;
        }
    }
    root
}

/// Wraps a random node in a fresh unary or binary operation; for binary
/// wraps, the node lands on a uniformly chosen side with a random leaf as
/// the other operand.
fn grow_mutate(mut root: Expr, pool: &dyn Pool, rng: &mut StdRng) -> Expr {
    let idx = rng.gen_range(0..root.node_count());
    if let Some(node) = root.node_at_mut(idx) {
        let old = std::mem::replace(node, Expr::Var);
        if rng.gen::<f64>() < 0.5 {
            *node = Expr::unary(pool.random_unary(rng), old);
        } else if rng.gen::<f64>() < 0.5 {
            *node = Expr::binary(pool.random_binary(rng), old, pool.random_leaf(rng));
        } else {
            *node = Expr::binary(pool.random_binary(rng), pool.random_leaf(rng), old);
        }
    }
    root
}

/// Replaces a random non-leaf node with one of its children.
fn shrink_mutate(mut root: Expr, rng: &mut StdRng) -> Expr {
    let internal = root.internal_indices();
    if internal.is_empty() {
        return root;
    }
    let idx = internal[rng.gen_range(0..internal.len())];
    if let Some(node) = root.node_at_mut(idx) {
        let replacement = match node {
            Expr::Unary { child, .. } => (**child).clone(),
            Expr::Binary { left, right, .. } => {
                if rng.gen::<f64>() < 0.5 {
                    (**left).clone()
                } else {
                    (**right).clone()
                }
            }
            _ => return root,
        };
        *node = replacement;
    }
    root
}
