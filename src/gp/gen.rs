//! Functions for generating random program trees.

use super::expr::{NodeIndex, Slot, Tree};
use super::op::{Operator, Symbol, TERMINALS};
use crate::config::TERMINAL_PROBABILITY;
use rand::Rng;

/// Generate an expression tree using the "grow" approach.
///
/// Starting from the root, each node becomes a terminal when the remaining depth budget is
/// exhausted or with probability `TERMINAL_PROBABILITY`, and otherwise an operator drawn
/// uniformly from `operators` whose operands are grown with one less unit of budget. The
/// resulting tree never exceeds `max_depth`.
pub fn grow_tree<R>(rng: &mut R, max_depth: usize, operators: &[Operator]) -> Tree
where
    R: Rng,
{
    let mut tree = Tree::new();
    grow_root(rng, &mut tree, max_depth, operators);
    tree
}

/// Replace the whole content of `tree` with a freshly grown one.
pub fn grow_root<R>(rng: &mut R, tree: &mut Tree, max_depth: usize, operators: &[Operator])
where
    R: Rng,
{
    let symbol = random_symbol(rng, max_depth, operators);
    let root = tree.set_root(symbol);
    grow_operands(rng, tree, root, max_depth, operators);
}

/// Regrow the subtree at `nx` in place with the given depth budget.
///
/// The node keeps its position in the tree; its symbol and operands are replaced.
pub fn grow<R>(
    rng: &mut R,
    tree: &mut Tree,
    nx: NodeIndex,
    max_depth: usize,
    operators: &[Operator],
) where
    R: Rng,
{
    tree.remove_children(nx);
    let symbol = random_symbol(rng, max_depth, operators);
    tree.set_symbol(nx, symbol);
    grow_operands(rng, tree, nx, max_depth, operators);
}

/// Draw the symbol for a node with `max_depth` levels of budget left beneath it.
pub fn random_symbol<R>(rng: &mut R, max_depth: usize, operators: &[Operator]) -> Symbol
where
    R: Rng,
{
    let p = rng.gen::<f64>();
    if max_depth == 0 || p < TERMINAL_PROBABILITY || operators.is_empty() {
        return TERMINALS[rng.gen_range(0..TERMINALS.len())].into();
    }
    operators[rng.gen_range(0..operators.len())].into()
}

// Grow every operand required by the symbol at `nx`, left before right, depth first.
fn grow_operands<R>(
    rng: &mut R,
    tree: &mut Tree,
    nx: NodeIndex,
    max_depth: usize,
    operators: &[Operator],
) where
    R: Rng,
{
    let child_depth = max_depth.saturating_sub(1);
    for &slot in Slot::for_arity(tree[nx].arity()) {
        let symbol = random_symbol(rng, child_depth, operators);
        let child = tree.add_child(nx, slot, symbol);
        grow_operands(rng, tree, child, child_depth, operators);
    }
}
