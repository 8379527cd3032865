//! Member identities and their public commitments.
//!
//! An identity is the secret pair `(trapdoor, nullifier_seed)`. Only the leaf
//! commitment `Hash(Hash(trapdoor, nullifier_seed))` is ever published.

use crate::error::Result;
use crate::utils::{bytes_to_field, field_from_hex, field_to_hex, poseidon_hash, poseidon_hash_single};
use pasta_curves::group::ff::Field;
use pasta_curves::pallas;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

const TRAPDOOR_TAG: &[u8] = b"identity_trapdoor";
const NULLIFIER_SEED_TAG: &[u8] = b"identity_nullifier";

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    trapdoor: pallas::Base,
    nullifier_seed: pallas::Base,
}

impl Identity {
    pub fn new(trapdoor: pallas::Base, nullifier_seed: pallas::Base) -> Self {
        Self {
            trapdoor,
            nullifier_seed,
        }
    }

    /// Fresh identity with independent uniformly random components.
    pub fn random(mut rng: impl RngCore) -> Self {
        Self {
            trapdoor: pallas::Base::random(&mut rng),
            nullifier_seed: pallas::Base::random(&mut rng),
        }
    }

    /// Deterministic identity from a secret seed phrase.
    ///
    /// Each component is `SHA3-256(seed || tag)` folded into the field, with
    /// distinct tags so the two components are unrelated.
    pub fn from_seed(seed: &str) -> Self {
        let derive = |tag: &[u8]| {
            let mut hasher = Sha3_256::new();
            hasher.update(seed.as_bytes());
            hasher.update(tag);
            let digest: [u8; 32] = hasher.finalize().into();
            bytes_to_field(&digest)
        };

        Self {
            trapdoor: derive(TRAPDOOR_TAG),
            nullifier_seed: derive(NULLIFIER_SEED_TAG),
        }
    }

    pub fn trapdoor(&self) -> pallas::Base {
        self.trapdoor
    }

    pub fn nullifier_seed(&self) -> pallas::Base {
        self.nullifier_seed
    }

    /// Identity secret: `Hash(trapdoor, nullifier_seed)`.
    #[must_use]
    pub fn secret(&self) -> pallas::Base {
        poseidon_hash(self.trapdoor, self.nullifier_seed)
    }

    /// Leaf commitment: `Hash(secret)`.
    #[must_use]
    pub fn leaf(&self) -> pallas::Base {
        poseidon_hash_single(self.secret())
    }

    /// Alias for [`Identity::leaf`], the value registered with the group.
    #[must_use]
    pub fn commitment(&self) -> pallas::Base {
        self.leaf()
    }

    /// Per-epoch nullifier: `Hash(nullifier_seed, epoch)`.
    #[must_use]
    pub fn signal_nullifier(&self, epoch_nullifier: pallas::Base) -> pallas::Base {
        poseidon_hash(self.nullifier_seed, epoch_nullifier)
    }

    pub fn to_record(&self) -> IdentityRecord {
        IdentityRecord {
            trapdoor: field_to_hex(self.trapdoor),
            nullifier_seed: field_to_hex(self.nullifier_seed),
            commitment: field_to_hex(self.commitment()),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("commitment", &field_to_hex(self.commitment()))
            .finish_non_exhaustive()
    }
}

/// JSON form of an identity, kept by the member for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub trapdoor: String,
    pub nullifier_seed: String,
    /// Public leaf commitment, recomputed and checked on load.
    pub commitment: String,
}

impl TryFrom<&IdentityRecord> for Identity {
    type Error = anyhow::Error;

    fn try_from(record: &IdentityRecord) -> anyhow::Result<Self> {
        use anyhow::Context;

        let trapdoor = field_from_hex(&record.trapdoor).context("Invalid identity trapdoor")?;
        let nullifier_seed =
            field_from_hex(&record.nullifier_seed).context("Invalid identity nullifier seed")?;
        let identity = Identity::new(trapdoor, nullifier_seed);

        let expected = field_from_hex(&record.commitment).context("Invalid identity commitment")?;
        if identity.commitment() != expected {
            return Err(anyhow::anyhow!(
                "Identity commitment mismatch: record says {}, secrets derive {}",
                record.commitment,
                field_to_hex(identity.commitment())
            ));
        }

        Ok(identity)
    }
}

/// Parses one group member commitment.
pub fn parse_commitment(input: &str) -> Result<pallas::Base> {
    field_from_hex(input)
}
