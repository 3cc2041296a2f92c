//! Property-based tests for the tree operators.
//!
//! Every case derives its trees from a seeded generator so failures shrink to a seed.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cart_gp::gp::expr::{NodeIndex, Slot, Tree};
use cart_gp::gp::op::Operator;
use cart_gp::gp::{gen, mutate};

fn random_tree(seed: u64, max_depth: usize, partially_observable: bool) -> Tree {
    let mut rng = StdRng::seed_from_u64(seed);
    gen::grow_tree(&mut rng, max_depth, Operator::enabled(partially_observable))
}

fn size_by_arity(tree: &Tree, nx: NodeIndex) -> usize {
    let mut size = 1;
    for &slot in Slot::for_arity(tree[nx].arity()) {
        let child = tree.child(nx, slot).expect("operand present");
        size += size_by_arity(tree, child);
    }
    size
}

fn assert_well_formed(tree: &Tree) {
    for nx in tree.positions() {
        let expected = Slot::for_arity(tree[nx].arity());
        for &slot in [Slot::Left, Slot::Right].iter() {
            assert_eq!(tree.child(nx, slot).is_some(), expected.contains(&slot));
            if let Some(c) = tree.child(nx, slot) {
                assert_eq!(tree.parent(c), Some(nx));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Grown trees never exceed their depth budget.
    #[test]
    fn prop_grow_respects_depth(seed in any::<u64>(), max_depth in 0usize..9, po in any::<bool>()) {
        let tree = random_tree(seed, max_depth, po);
        prop_assert!(tree.depth() <= max_depth);
        prop_assert!(!tree.is_empty());
        assert_well_formed(&tree);
    }

    /// The size of every subtree is one plus the sizes of its operands.
    #[test]
    fn prop_size_recursion(seed in any::<u64>(), max_depth in 0usize..8) {
        let tree = random_tree(seed, max_depth, true);
        for nx in tree.positions() {
            prop_assert_eq!(tree.subtree_size(nx), size_by_arity(&tree, nx));
        }
        prop_assert_eq!(tree.size(), tree.positions().len());
    }

    /// Mutating a copy leaves the original untouched.
    #[test]
    fn prop_copy_is_independent(seed in any::<u64>(), max_depth in 1usize..7) {
        let original = random_tree(seed, max_depth, false);
        let printed = original.to_string();
        let (size, depth) = (original.size(), original.depth());

        let mut copy = original.clone();
        prop_assert_eq!(copy.to_string(), printed.clone());
        prop_assert_eq!(copy.size(), size);
        prop_assert_eq!(copy.depth(), depth);

        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        mutate::delete_subtree(&mut rng, &mut copy);
        mutate::add_subtree(&mut rng, &mut copy, 10, Operator::enabled(false));
        prop_assert_eq!(original.to_string(), printed);
        prop_assert_eq!(original.size(), size);
        prop_assert_eq!(original.depth(), depth);
    }

    /// Mutation keeps trees well formed and within the depth bound.
    #[test]
    fn prop_mutation_is_well_formed(seed in any::<u64>(), rounds in 1usize..20) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tree = gen::grow_tree(&mut rng, 3, Operator::enabled(true));
        for _ in 0..rounds {
            mutate::delete_subtree(&mut rng, &mut tree);
            mutate::add_subtree(&mut rng, &mut tree, 6, Operator::enabled(true));
            prop_assert!(tree.depth() <= 6);
            assert_well_formed(&tree);
        }
    }

    /// Crossover never commits a tree beyond the depth bound, and a rejected crossover leaves
    /// both trees exactly as they were.
    #[test]
    fn prop_crossover_bound_and_rollback(
        seed in any::<u64>(),
        depth_a in 0usize..7,
        depth_b in 0usize..7,
        bound in 1usize..7,
    ) {
        let a0 = random_tree(seed, depth_a.min(bound), false);
        let b0 = random_tree(seed ^ 0x5eed, depth_b.min(bound), false);
        let mut a = a0.clone();
        let mut b = b0.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        let kept = mutate::crossover(&mut rng, &mut a, &mut b, bound);
        if kept {
            prop_assert!(a.depth() <= bound);
            prop_assert!(b.depth() <= bound);
            prop_assert_eq!(a.size() + b.size(), a0.size() + b0.size());
        } else {
            prop_assert_eq!(&a, &a0);
            prop_assert_eq!(&b, &b0);
        }
        assert_well_formed(&a);
        assert_well_formed(&b);
    }

    /// Evaluation is always finite.
    #[test]
    fn prop_evaluation_is_finite(
        seed in any::<u64>(),
        a in proptest::num::f64::ANY,
        b in proptest::num::f64::NORMAL,
    ) {
        let mut tree = random_tree(seed, 6, true);
        let a = if a.is_finite() { a } else { 0.0 };
        prop_assert!(tree.evaluate(a, b).is_finite());
    }
}
