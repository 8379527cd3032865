#[cfg(test)]
mod tests {
    use crate::merkle::{MembershipTree, MerkleTree, MerkleWitness, PathElement};
    use crate::utils::poseidon_hash;
    use crate::{SignalError, TREE_DEPTH};
    use pasta_curves::pallas;

    fn leaves(count: u64) -> Vec<pallas::Base> {
        (1..=count).map(pallas::Base::from).collect()
    }

    #[test]
    fn test_empty_tree_root_is_zero_chain() {
        let tree = MerkleTree::new(3).unwrap();

        let mut expected = pallas::Base::zero();
        for _ in 0..3 {
            expected = poseidon_hash(expected, expected);
        }
        assert_eq!(tree.root(), expected);
        assert_eq!(tree.leaf_count(), 0);
    }

    #[test]
    fn test_small_tree_root_matches_manual_hashing() {
        let tree = MerkleTree::from_leaves(2, &leaves(4)).unwrap();

        let h = |a: u64, b: u64| poseidon_hash(pallas::Base::from(a), pallas::Base::from(b));
        let expected = poseidon_hash(h(1, 2), h(3, 4));
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_witness_recomputes_root() {
        let tree = MerkleTree::from_leaves(TREE_DEPTH, &leaves(10)).unwrap();

        for index in 0..10 {
            let witness = tree.witness_at(index).unwrap();
            let leaf = tree.leaf(index).unwrap();
            assert_eq!(witness.depth(), TREE_DEPTH);
            assert_eq!(witness.calculate_root(leaf), tree.root());
            assert_eq!(witness.calculate_index(), index);
        }
    }

    #[test]
    fn test_witness_for_unknown_leaf() {
        let tree = MerkleTree::from_leaves(4, &leaves(3)).unwrap();
        let err = tree.witness(pallas::Base::from(99)).unwrap_err();
        assert!(matches!(err, SignalError::LeafNotFound));
    }

    #[test]
    fn test_witness_from_other_tree_does_not_match() {
        let tree1 = MerkleTree::from_leaves(4, &leaves(4)).unwrap();
        let tree2 = MerkleTree::from_leaves(4, &[5u64, 6, 7, 8].map(pallas::Base::from)).unwrap();

        let witness = tree1.witness_at(0).unwrap();
        assert_ne!(witness.calculate_root(pallas::Base::from(1)), tree2.root());
    }

    #[test]
    fn test_tampered_sibling_changes_root() {
        let tree = MerkleTree::from_leaves(TREE_DEPTH, &leaves(5)).unwrap();
        let witness = tree.witness_at(3).unwrap();
        let leaf = tree.leaf(3).unwrap();

        for level in 0..TREE_DEPTH {
            let mut path = witness.path().to_vec();
            path[level].sibling += pallas::Base::one();
            let tampered = MerkleWitness::new(path, TREE_DEPTH).unwrap();
            assert_ne!(tampered.calculate_root(leaf), tree.root(), "level {level}");
        }
    }

    #[test]
    fn test_flipped_position_bit_changes_root() {
        let tree = MerkleTree::from_leaves(TREE_DEPTH, &leaves(5)).unwrap();
        let witness = tree.witness_at(2).unwrap();
        let leaf = tree.leaf(2).unwrap();

        for level in 0..TREE_DEPTH {
            let mut path = witness.path().to_vec();
            path[level].is_right = !path[level].is_right;
            let tampered = MerkleWitness::new(path, TREE_DEPTH).unwrap();
            assert_ne!(tampered.calculate_root(leaf), tree.root(), "level {level}");
        }
    }

    #[test]
    fn test_wrong_witness_length_is_shape_error() {
        let path = vec![
            PathElement {
                sibling: pallas::Base::zero(),
                is_right: false,
            };
            TREE_DEPTH - 1
        ];
        let err = MerkleWitness::new(path, TREE_DEPTH).unwrap_err();
        assert!(matches!(
            err,
            SignalError::WitnessDepth {
                expected: TREE_DEPTH,
                actual
            } if actual == TREE_DEPTH - 1
        ));
    }

    #[test]
    fn test_set_leaf_out_of_range() {
        let mut tree = MerkleTree::new(2).unwrap();
        assert!(tree.set_leaf(3, pallas::Base::one()).is_ok());
        let err = tree.set_leaf(4, pallas::Base::one()).unwrap_err();
        assert!(matches!(err, SignalError::LeafIndexOutOfRange { index: 4, capacity: 4 }));
    }

    #[test]
    fn test_tree_full() {
        let mut tree = MerkleTree::from_leaves(2, &leaves(4)).unwrap();
        let err = tree.insert_leaf(pallas::Base::from(5)).unwrap_err();
        assert!(matches!(err, SignalError::TreeFull { capacity: 4 }));
    }

    #[test]
    fn test_set_leaf_updates_root_and_witnesses() {
        let mut tree = MerkleTree::from_leaves(TREE_DEPTH, &leaves(4)).unwrap();
        let before = tree.root();

        tree.set_leaf(1, pallas::Base::from(42)).unwrap();
        assert_ne!(tree.root(), before);

        let witness = tree.witness(pallas::Base::from(42)).unwrap();
        assert_eq!(witness.calculate_root(pallas::Base::from(42)), tree.root());
        assert_eq!(witness.calculate_index(), 1);
    }

    #[test]
    fn test_invalid_depth() {
        assert!(matches!(
            MerkleTree::new(0).unwrap_err(),
            SignalError::InvalidTreeDepth(0)
        ));
        assert!(MerkleTree::new(33).is_err());
    }

    #[test]
    fn test_large_tree_sparse_index() {
        let mut tree = MerkleTree::new(TREE_DEPTH).unwrap();
        tree.set_leaf(40_000, pallas::Base::from(7)).unwrap();

        let witness = tree.witness_at(40_000).unwrap();
        assert_eq!(witness.calculate_root(pallas::Base::from(7)), tree.root());
        assert_eq!(tree.leaf_count(), 40_001);
    }
}
