//! Structural genetic operators: subtree deletion, subtree growth and subtree crossover.
//!
//! None of these ever remove the root, and all of them leave a tree whose nodes carry exactly
//! as many operands as their arity requires. When there is nothing to operate on they do
//! nothing and return `false`.

use super::expr::Tree;
use super::gen;
use super::op::{Operator, TERMINALS};
use rand::Rng;

/// Delete a uniformly chosen non-root subtree and put a random terminal in its place.
///
/// Returns `false` without drawing from `rng` when the tree has no node below the root.
pub fn delete_subtree<R>(rng: &mut R, tree: &mut Tree) -> bool
where
    R: Rng,
{
    let candidates = tree.non_root_nodes();
    if candidates.is_empty() {
        return false;
    }
    let target = candidates[rng.gen_range(0..candidates.len())];
    let socket = match tree.remove_subtree(target) {
        Some(socket) => socket,
        None => return false,
    };
    let terminal = TERMINALS[rng.gen_range(0..TERMINALS.len())];
    tree.add_child(socket.parent, socket.slot, terminal.into());
    true
}

/// Replace a uniformly chosen leaf with a freshly grown subtree.
///
/// The new subtree's budget is `max_depth` minus the depth of the leaf, so the tree never grows
/// beyond `max_depth` through this operator. An empty tree is grown from scratch.
pub fn add_subtree<R>(
    rng: &mut R,
    tree: &mut Tree,
    max_depth: usize,
    operators: &[Operator],
) -> bool
where
    R: Rng,
{
    if tree.is_empty() {
        gen::grow_root(rng, tree, max_depth, operators);
        return true;
    }
    let leaves = tree.leaves();
    if leaves.is_empty() {
        return false;
    }
    let target = leaves[rng.gen_range(0..leaves.len())];
    let budget = max_depth.saturating_sub(tree.node_depth(target));
    gen::grow(rng, tree, target, budget, operators);
    true
}

/// Swap a uniformly chosen non-root subtree of `a` with one of `b`.
///
/// Each subtree takes the other's place, keeping the slot it lands in. If either tree ends up
/// deeper than `max_depth` the swap is undone and both trees are left exactly as they were.
///
/// Returns whether a swap was kept.
pub fn crossover<R>(rng: &mut R, a: &mut Tree, b: &mut Tree, max_depth: usize) -> bool
where
    R: Rng,
{
    let candidates_a = a.non_root_nodes();
    let candidates_b = b.non_root_nodes();
    if candidates_a.is_empty() || candidates_b.is_empty() {
        return false;
    }
    let node_a = candidates_a[rng.gen_range(0..candidates_a.len())];
    let node_b = candidates_b[rng.gen_range(0..candidates_b.len())];

    let (sub_a, socket_a) = match a.detach(node_a) {
        Some(detached) => detached,
        None => return false,
    };
    let (sub_b, socket_b) = match b.detach(node_b) {
        Some(detached) => detached,
        None => {
            a.attach(socket_a, sub_a);
            return false;
        }
    };

    let moved_to_a = a.attach(socket_a, sub_b);
    let moved_to_b = b.attach(socket_b, sub_a);

    let (depth_a, depth_b) = (a.depth(), b.depth());
    if depth_a <= max_depth && depth_b <= max_depth {
        log::debug!("crossover kept, depths {} and {}", depth_a, depth_b);
        return true;
    }

    log::debug!(
        "crossover rejected, depths {} and {} exceed {}",
        depth_a,
        depth_b,
        max_depth
    );
    let back_to_b = moved_to_a.and_then(|nx| a.detach(nx));
    let back_to_a = moved_to_b.and_then(|nx| b.detach(nx));
    if let Some((sub_a, _)) = back_to_a {
        a.attach(socket_a, sub_a);
    }
    if let Some((sub_b, _)) = back_to_b {
        b.attach(socket_b, sub_b);
    }
    false
}
