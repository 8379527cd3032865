//! Membership witnesses and a reference membership tree.
//!
//! The tree is a fixed-depth binary Poseidon Merkle tree. Unset leaves are
//! zero and empty subtrees hash to precomputed "zero" nodes, so only the
//! populated paths are stored.

use crate::error::{Result, SignalError};
use crate::utils::{field_to_hex, poseidon_hash};
use log::debug;
use pasta_curves::pallas;
use std::collections::HashMap;
use std::fmt;

/// Deepest tree [`MerkleTree`] accepts.
pub const MAX_TREE_DEPTH: usize = 32;

/// One level of an inclusion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathElement {
    pub sibling: pallas::Base,
    /// `true` when the running node is the right child at this level.
    pub is_right: bool,
}

/// Inclusion path from a leaf up to the root, leaf level first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleWitness {
    path: Vec<PathElement>,
}

impl MerkleWitness {
    /// Builds a witness, rejecting a path whose length is not `depth`.
    pub fn new(path: Vec<PathElement>, depth: usize) -> Result<Self> {
        let witness = Self { path };
        witness.check_depth(depth)?;
        Ok(witness)
    }

    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if self.path.len() != depth {
            return Err(SignalError::WitnessDepth {
                expected: depth,
                actual: self.path.len(),
            });
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn path(&self) -> &[PathElement] {
        &self.path
    }

    /// Recomputes the root reached from `leaf` along this path.
    ///
    /// A right child hashes as `Hash(sibling, current)`, a left child as
    /// `Hash(current, sibling)`.
    #[must_use]
    pub fn calculate_root(&self, leaf: pallas::Base) -> pallas::Base {
        self.path.iter().fold(leaf, |current, node| {
            if node.is_right {
                poseidon_hash(node.sibling, current)
            } else {
                poseidon_hash(current, node.sibling)
            }
        })
    }

    /// Leaf index encoded by the position bits (bit `i` is level `i`).
    #[must_use]
    pub fn calculate_index(&self) -> u64 {
        self.path
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_right)
            .fold(0u64, |index, (level, _)| index | (1 << level))
    }
}

impl fmt::Display for MerkleWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MerkleWitness (depth {}):", self.depth())?;
        for (level, node) in self.path.iter().enumerate() {
            writeln!(
                f,
                "  {level:2}: {} {}",
                if node.is_right { "R" } else { "L" },
                field_to_hex(node.sibling)
            )?;
        }
        Ok(())
    }
}

/// Interface of the membership tree service.
pub trait MembershipTree {
    /// Appends a leaf and returns its index.
    fn insert_leaf(&mut self, leaf: pallas::Base) -> Result<u64>;

    fn root(&self) -> pallas::Base;

    /// Inclusion path for a previously inserted leaf.
    fn witness(&self, leaf: pallas::Base) -> Result<MerkleWitness>;
}

/// In-memory sparse Poseidon Merkle tree of fixed depth.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: usize,
    /// `zeros[level]` is the root of an empty subtree of height `level`.
    zeros: Vec<pallas::Base>,
    /// `nodes[level][index]`; level 0 holds the leaves.
    nodes: Vec<HashMap<u64, pallas::Base>>,
    next_index: u64,
}

impl MerkleTree {
    pub fn new(depth: usize) -> Result<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(SignalError::InvalidTreeDepth(depth));
        }

        let mut zeros = Vec::with_capacity(depth + 1);
        zeros.push(pallas::Base::zero());
        for level in 0..depth {
            let below = zeros[level];
            zeros.push(poseidon_hash(below, below));
        }

        Ok(Self {
            depth,
            zeros,
            nodes: vec![HashMap::new(); depth + 1],
            next_index: 0,
        })
    }

    /// Builds a tree holding `leaves` at indices `0..leaves.len()`.
    pub fn from_leaves(depth: usize, leaves: &[pallas::Base]) -> Result<Self> {
        let mut tree = Self::new(depth)?;
        for &leaf in leaves {
            tree.insert_leaf(leaf)?;
        }
        Ok(tree)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// Number of leaves appended so far.
    pub fn leaf_count(&self) -> u64 {
        self.next_index
    }

    fn node(&self, level: usize, index: u64) -> pallas::Base {
        self.nodes[level]
            .get(&index)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    pub fn root(&self) -> pallas::Base {
        self.node(self.depth, 0)
    }

    pub fn leaf(&self, index: u64) -> Option<pallas::Base> {
        self.nodes[0].get(&index).copied()
    }

    /// Lowest index holding `leaf`.
    pub fn index_of(&self, leaf: pallas::Base) -> Option<u64> {
        self.nodes[0]
            .iter()
            .filter(|(_, value)| **value == leaf)
            .map(|(index, _)| *index)
            .min()
    }

    /// Writes `leaf` at `index` and rehashes its path to the root.
    pub fn set_leaf(&mut self, index: u64, leaf: pallas::Base) -> Result<()> {
        if index >= self.capacity() {
            return Err(SignalError::LeafIndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }

        self.nodes[0].insert(index, leaf);
        let mut current = leaf;
        let mut position = index;
        for level in 0..self.depth {
            let sibling = self.node(level, position ^ 1);
            current = if position & 1 == 1 {
                poseidon_hash(sibling, current)
            } else {
                poseidon_hash(current, sibling)
            };
            position >>= 1;
            self.nodes[level + 1].insert(position, current);
        }

        if index >= self.next_index {
            self.next_index = index + 1;
        }
        Ok(())
    }

    /// Inclusion path for the leaf slot at `index`.
    pub fn witness_at(&self, index: u64) -> Result<MerkleWitness> {
        if index >= self.capacity() {
            return Err(SignalError::LeafIndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }

        let mut position = index;
        let path = (0..self.depth)
            .map(|level| {
                let node = PathElement {
                    sibling: self.node(level, position ^ 1),
                    is_right: position & 1 == 1,
                };
                position >>= 1;
                node
            })
            .collect();

        MerkleWitness::new(path, self.depth)
    }
}

impl MembershipTree for MerkleTree {
    fn insert_leaf(&mut self, leaf: pallas::Base) -> Result<u64> {
        let index = self.next_index;
        if index >= self.capacity() {
            return Err(SignalError::TreeFull {
                capacity: self.capacity(),
            });
        }
        self.set_leaf(index, leaf)?;
        debug!("Inserted leaf at index {index}");
        Ok(index)
    }

    fn root(&self) -> pallas::Base {
        MerkleTree::root(self)
    }

    fn witness(&self, leaf: pallas::Base) -> Result<MerkleWitness> {
        let index = self.index_of(leaf).ok_or(SignalError::LeafNotFound)?;
        self.witness_at(index)
    }
}
