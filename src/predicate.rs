//! Native evaluation of the signaling predicate.
//!
//! A proof is valid exactly when all three relations hold:
//!
//! 1. membership: `witness.calculate_root(identity.leaf()) == merkle_root`
//! 2. nullifier: `Hash(nullifier_seed, epoch_nullifier) == signal_nullifier`
//! 3. signal binding: `signal_hash * signal_hash == signal_hash_squared`
//!
//! The circuit in [`crate::circuit`] enforces the same relations; this module
//! is what the prover consults before it spends time on a proof.

use crate::error::Result;
use crate::types::{PrivateInputs, PublicInputs};
use crate::utils::poseidon_hash;
use log::debug;
use pasta_curves::group::ff::Field;
use pasta_curves::pallas;

/// Witness root check.
#[must_use]
pub fn membership_holds(public: &PublicInputs, private: &PrivateInputs) -> bool {
    private.witness.calculate_root(private.identity.leaf()) == public.merkle_root
}

/// `Hash(nullifier_seed, epoch)`.
#[must_use]
pub fn derive_signal_nullifier(
    nullifier_seed: pallas::Base,
    epoch_nullifier: pallas::Base,
) -> pallas::Base {
    poseidon_hash(nullifier_seed, epoch_nullifier)
}

#[must_use]
pub fn nullifier_holds(public: &PublicInputs, private: &PrivateInputs) -> bool {
    derive_signal_nullifier(private.identity.nullifier_seed(), public.epoch_nullifier)
        == public.signal_nullifier
}

#[must_use]
pub fn signal_binding_holds(public: &PublicInputs) -> bool {
    public.signal_hash.square() == public.signal_hash_squared
}

/// Evaluates the predicate for a tree of `depth` levels.
///
/// Returns `Ok(true)` on acceptance and `Ok(false)` on rejection. A witness
/// of the wrong length is an error, not a rejection.
pub fn evaluate(public: &PublicInputs, private: &PrivateInputs, depth: usize) -> Result<bool> {
    private.witness.check_depth(depth)?;

    // every relation is computed, the verdict is their conjunction
    let membership = membership_holds(public, private);
    let nullifier = nullifier_holds(public, private);
    let binding = signal_binding_holds(public);

    let accepted = membership & nullifier & binding;
    debug!("Signaling predicate evaluated: accepted={accepted}");
    Ok(accepted)
}
