//! Anonymous group signaling with halo2.
//!
//! A member of a group proves, for one epoch and one signal, that:
//!
//! - its identity commitment is a leaf of the group's Merkle tree,
//! - the published signal nullifier was derived from its identity and the epoch,
//! - the published signal hash is bound to the proof,
//!
//! without revealing which leaf it holds. Reusing the identity in the same
//! epoch yields the same nullifier, which verifiers use to reject double
//! signals.
//!
//! # Components
//!
//! - [`Identity`]: secret trapdoor and nullifier seed, and the derived commitment
//! - [`MerkleTree`] / [`MerkleWitness`]: the group and inclusion paths into it
//! - [`predicate`]: native evaluation of the signaling relations
//! - [`SemaphoreCircuit`]: the same relations as a halo2 circuit
//! - [`SignalProver`]: key generation, proving and verification
//! - [`SignalProofOutput`]: serialized proof envelope
//! - [`NullifierLog`]: double-signal detection
//!
//! # Example
//!
//! ```no_run
//! use zkp_semaphore::{build_signal_inputs, Identity, MembershipTree, MerkleTree, SignalProver};
//! use zkp_semaphore::{utils::hash_signal, CIRCUIT_K, TREE_DEPTH};
//! use pasta_curves::pallas;
//!
//! let identity = Identity::random(rand::thread_rng());
//! let mut group = MerkleTree::new(TREE_DEPTH)?;
//! group.insert_leaf(identity.commitment())?;
//!
//! let (public, private) = build_signal_inputs(
//!     &identity,
//!     &group,
//!     pallas::Base::from(1),
//!     hash_signal(b"hello"),
//! )?;
//!
//! let prover = SignalProver::compile(CIRCUIT_K)?;
//! let proof = prover.prove(&public, &private)?;
//! assert!(prover.verify(&public, &proof)?);
//! # Ok::<(), zkp_semaphore::SignalError>(())
//! ```

pub mod circuit;
pub mod config;
pub mod error;
pub mod group;
pub mod identity;
pub mod merkle;
pub mod nullifier;
pub mod predicate;
pub mod prover;
pub mod types;
pub mod utils;

#[cfg(test)]
mod merkle_tests;

pub use circuit::{SemaphoreCircuit, SignalCircuit};
pub use config::Config;
pub use error::SignalError;
pub use identity::{Identity, IdentityRecord};
pub use merkle::{MembershipTree, MerkleTree, MerkleWitness, PathElement};
pub use nullifier::NullifierLog;
pub use prover::SignalProver;
pub use types::{build_signal_inputs, PrivateInputs, PublicInputs, SignalProofOutput};
pub use utils::{bytes_to_field, field_to_bytes, poseidon_hash};

/// Depth of the group tree the circuit is compiled for.
///
/// A group holds at most `2^TREE_DEPTH` members. Witnesses of any other
/// length are rejected before evaluation.
pub const TREE_DEPTH: usize = 16;

/// Circuit parameter for the Halo2 proving system.
///
/// `k=12` gives 2^12 = 4096 rows. The depth-16 circuit performs nineteen
/// Poseidon hashes plus one swap row per level, which fits with room to
/// spare.
///
/// Changing `CIRCUIT_K` requires regenerating proving and verifying keys.
/// Prover and verifier must use the same value, or verification will fail.
pub const CIRCUIT_K: u32 = 12;

/// Smallest `k` the depth-16 circuit can be laid out in.
///
/// The layout takes roughly 800 rows, so it fits in 2^10 and not in 2^9.
pub const MIN_CIRCUIT_K: u32 = 10;
