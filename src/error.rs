//! Typed errors for the signaling library.
//!
//! Shape errors (wrong witness length, bad field encoding) are reported before
//! any constraint is evaluated and are kept distinct from a rejected proof.
//! A rejected predicate never says which constraint failed.

use halo2_proofs::plonk;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("witness has {actual} levels, expected tree depth {expected}")]
    WitnessDepth { expected: usize, actual: usize },

    #[error("invalid field element encoding: {0}")]
    InvalidFieldEncoding(String),

    #[error("invalid tree depth {0}: must be between 1 and {max}", max = crate::merkle::MAX_TREE_DEPTH)]
    InvalidTreeDepth(usize),

    #[error("membership tree is full ({capacity} leaves)")]
    TreeFull { capacity: u64 },

    #[error("leaf index {index} out of range for a tree of {capacity} leaves")]
    LeafIndexOutOfRange { index: u64, capacity: u64 },

    #[error("leaf not found in membership tree")]
    LeafNotFound,

    /// The private inputs do not satisfy the predicate. No proof is produced.
    #[error("inputs do not satisfy the signaling predicate")]
    ConstraintViolation,

    #[error("proving backend error: {0}")]
    Backend(#[from] plonk::Error),
}

pub type Result<T> = std::result::Result<T, SignalError>;
