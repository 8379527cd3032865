//! Public/private input structures and the serialized proof envelope.

use crate::config::SecurityConfig;
use crate::identity::Identity;
use crate::merkle::{MembershipTree, MerkleWitness};
use crate::utils::{field_from_hex, field_to_hex, hash_signal};
use crate::TREE_DEPTH;
use anyhow::{Context, Result};
use log::debug;
use pasta_curves::group::ff::Field;
use pasta_curves::pallas;
use serde::{Deserialize, Serialize};

/// Instance-column rows of the public inputs.
pub const MERKLE_ROOT_ROW: usize = 0;
pub const EPOCH_NULLIFIER_ROW: usize = 1;
pub const SIGNAL_NULLIFIER_ROW: usize = 2;
pub const SIGNAL_HASH_ROW: usize = 3;
pub const SIGNAL_HASH_SQUARED_ROW: usize = 4;

/// Values known to both prover and verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicInputs {
    pub merkle_root: pallas::Base,
    pub epoch_nullifier: pallas::Base,
    pub signal_nullifier: pallas::Base,
    pub signal_hash: pallas::Base,
    pub signal_hash_squared: pallas::Base,
}

impl PublicInputs {
    /// Instance column contents, in row order.
    #[must_use]
    pub fn to_instance(&self) -> Vec<pallas::Base> {
        vec![
            self.merkle_root,
            self.epoch_nullifier,
            self.signal_nullifier,
            self.signal_hash,
            self.signal_hash_squared,
        ]
    }
}

/// Values known only to the prover.
#[derive(Debug, Clone)]
pub struct PrivateInputs {
    pub identity: Identity,
    pub witness: MerkleWitness,
}

/// Honest input construction for one signal by `identity` in `epoch`.
///
/// Fails when the identity commitment is not in `tree`.
pub fn build_signal_inputs(
    identity: &Identity,
    tree: &impl MembershipTree,
    epoch_nullifier: pallas::Base,
    signal_hash: pallas::Base,
) -> crate::error::Result<(PublicInputs, PrivateInputs)> {
    let witness = tree.witness(identity.commitment())?;

    let public = PublicInputs {
        merkle_root: tree.root(),
        epoch_nullifier,
        signal_nullifier: identity.signal_nullifier(epoch_nullifier),
        signal_hash,
        signal_hash_squared: signal_hash.square(),
    };
    let private = PrivateInputs {
        identity: *identity,
        witness,
    };
    Ok((public, private))
}

/// Output structure for signal proofs.
///
/// All field elements are 32-byte little-endian hex strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalProofOutput {
    pub merkle_root: String,
    pub epoch_nullifier: String,
    pub signal_nullifier: String,
    pub signal_hash: String,
    pub signal_hash_squared: String,
    /// Raw signal text. When present the verifier recomputes `signal_hash`
    /// from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Raw halo2 proof bytes
    pub zkp_proof: Vec<u8>,
    pub tree_depth: usize,
    /// Unix timestamp when proof was generated
    pub timestamp: u64,
}

impl SignalProofOutput {
    pub fn new(public: &PublicInputs, signal: Option<String>, zkp_proof: Vec<u8>, timestamp: u64) -> Self {
        Self {
            merkle_root: field_to_hex(public.merkle_root),
            epoch_nullifier: field_to_hex(public.epoch_nullifier),
            signal_nullifier: field_to_hex(public.signal_nullifier),
            signal_hash: field_to_hex(public.signal_hash),
            signal_hash_squared: field_to_hex(public.signal_hash_squared),
            signal,
            zkp_proof,
            tree_depth: TREE_DEPTH,
            timestamp,
        }
    }

    /// Decodes the public inputs without any further checks.
    pub fn public_inputs(&self) -> Result<PublicInputs> {
        let decode = |name: &str, value: &str| {
            field_from_hex(value).with_context(|| format!("Invalid {name} '{value}'"))
        };

        Ok(PublicInputs {
            merkle_root: decode("merkle root", &self.merkle_root)?,
            epoch_nullifier: decode("epoch nullifier", &self.epoch_nullifier)?,
            signal_nullifier: decode("signal nullifier", &self.signal_nullifier)?,
            signal_hash: decode("signal hash", &self.signal_hash)?,
            signal_hash_squared: decode("signal hash squared", &self.signal_hash_squared)?,
        })
    }

    /// Validates the envelope and returns its decoded public inputs.
    ///
    /// Checks the proof is non-empty, the tree depth matches the compiled
    /// circuit, the timestamp lies in the accepted window, every field is a
    /// canonical encoding and, if the signal text is present, that it hashes
    /// to `signal_hash`. Whether the proof itself is valid is left to the
    /// verifier.
    pub fn validate(&self, security: &SecurityConfig) -> Result<PublicInputs> {
        debug!("Starting proof output validation");
        debug!("ZK proof size: {} bytes", self.zkp_proof.len());
        debug!("Timestamp: {}", self.timestamp);

        if self.zkp_proof.is_empty() {
            return Err(anyhow::anyhow!(
                "ZK proof cannot be empty. The proof data is missing."
            ));
        }

        if self.tree_depth != TREE_DEPTH {
            return Err(anyhow::anyhow!(
                "Proof was built for tree depth {}, this verifier uses depth {}",
                self.tree_depth,
                TREE_DEPTH
            ));
        }

        let current_timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| anyhow::anyhow!("System clock unavailable: {}", e))?;

        if self.timestamp > current_timestamp.saturating_add(security.timestamp_tolerance_secs) {
            return Err(anyhow::anyhow!(
                "Timestamp is too far in the future: {} (current: {}, tolerance: {}s)",
                self.timestamp,
                current_timestamp,
                security.timestamp_tolerance_secs
            ));
        }

        if current_timestamp > self.timestamp.saturating_add(security.timestamp_max_age_secs) {
            return Err(anyhow::anyhow!(
                "Timestamp is too old: {} (current: {}, max age: {}s). Please generate a fresh proof.",
                self.timestamp,
                current_timestamp,
                security.timestamp_max_age_secs
            ));
        }

        let public = self.public_inputs()?;

        if let Some(signal) = &self.signal {
            if hash_signal(signal.as_bytes()) != public.signal_hash {
                return Err(anyhow::anyhow!(
                    "Signal hash does not match the signal text carried with the proof"
                ));
            }
        }

        Ok(public)
    }

    /// [`validate`](Self::validate), then checks the proof targets the
    /// verifier's own group root and epoch.
    ///
    /// The envelope's root and epoch are prover-supplied; a proof over any
    /// other tree or epoch is rejected here, before the proof is checked.
    pub fn validate_for_group(
        &self,
        security: &SecurityConfig,
        merkle_root: pallas::Base,
        epoch_nullifier: pallas::Base,
    ) -> Result<PublicInputs> {
        let public = self.validate(security)?;

        if public.merkle_root != merkle_root {
            return Err(anyhow::anyhow!(
                "Proof is for Merkle root {}, expected group root {}",
                self.merkle_root,
                field_to_hex(merkle_root)
            ));
        }

        if public.epoch_nullifier != epoch_nullifier {
            return Err(anyhow::anyhow!(
                "Proof is for epoch {}, expected epoch {}",
                self.epoch_nullifier,
                field_to_hex(epoch_nullifier)
            ));
        }

        Ok(public)
    }
}
