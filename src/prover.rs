//! halo2 proving backend for [`SemaphoreCircuit`].

use crate::circuit::SemaphoreCircuit;
use crate::error::{Result, SignalError};
use crate::predicate;
use crate::types::{PrivateInputs, PublicInputs};
use crate::TREE_DEPTH;
use halo2_proofs::{
    plonk::{create_proof, keygen_pk, keygen_vk, verify_proof, ProvingKey, SingleVerifier, VerifyingKey},
    poly::commitment::Params,
    transcript::{Blake2bRead, Blake2bWrite, Challenge255},
};
use log::{debug, info};
use pasta_curves::{pallas, vesta};
use rand::RngCore;
use std::sync::Arc;

/// Compiled signaling circuit: parameters plus proving and verifying keys.
///
/// Keys sit behind `Arc` so one compiled prover can serve proofs for
/// independent signals on several threads.
#[derive(Clone)]
pub struct SignalProver {
    k: u32,
    params: Arc<Params<vesta::Affine>>,
    vk: Arc<VerifyingKey<vesta::Affine>>,
    pk: Arc<ProvingKey<vesta::Affine>>,
}

impl SignalProver {
    /// Generates parameters for `2^k` rows and runs key generation.
    pub fn compile(k: u32) -> Result<Self> {
        info!("Generating parameters and keys for k={k}");
        let params = Params::<vesta::Affine>::new(k);
        Self::with_params(k, params)
    }

    /// Runs key generation against existing parameters.
    pub fn with_params(k: u32, params: Params<vesta::Affine>) -> Result<Self> {
        let circuit = SemaphoreCircuit::default();
        let vk = keygen_vk(&params, &circuit)?;
        let pk = keygen_pk(&params, vk.clone(), &circuit)?;
        debug!("Key generation finished");

        Ok(Self {
            k,
            params: Arc::new(params),
            vk: Arc::new(vk),
            pk: Arc::new(pk),
        })
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn params(&self) -> &Params<vesta::Affine> {
        &self.params
    }

    pub fn verifying_key(&self) -> &VerifyingKey<vesta::Affine> {
        &self.vk
    }

    /// Produces a proof for the given inputs.
    ///
    /// The predicate is checked natively first; inputs that do not satisfy it
    /// yield [`SignalError::ConstraintViolation`] and no proof.
    pub fn prove(&self, public: &PublicInputs, private: &PrivateInputs) -> Result<Vec<u8>> {
        self.prove_with_rng(public, private, rand::thread_rng())
    }

    pub fn prove_with_rng(
        &self,
        public: &PublicInputs,
        private: &PrivateInputs,
        rng: impl RngCore,
    ) -> Result<Vec<u8>> {
        if !predicate::evaluate(public, private, TREE_DEPTH)? {
            return Err(SignalError::ConstraintViolation);
        }

        let circuit = SemaphoreCircuit::from_private(private)?;
        let instance = public.to_instance();
        let instances: &[&[&[pallas::Base]]] = &[&[&instance]];

        let mut transcript = Blake2bWrite::<_, vesta::Affine, Challenge255<_>>::init(vec![]);
        create_proof(
            &self.params,
            &self.pk,
            &[circuit],
            instances,
            rng,
            &mut transcript,
        )?;

        let proof = transcript.finalize();
        debug!("Proof generated, size: {} bytes", proof.len());
        Ok(proof)
    }

    /// Checks `proof` against the public inputs.
    ///
    /// Any failure of the proof is reported as `Ok(false)`, with no detail
    /// about which relation did not hold.
    pub fn verify(&self, public: &PublicInputs, proof: &[u8]) -> Result<bool> {
        let instance = public.to_instance();
        let instances: &[&[&[pallas::Base]]] = &[&[&instance]];

        let strategy = SingleVerifier::new(&self.params);
        let mut transcript = Blake2bRead::<_, vesta::Affine, Challenge255<_>>::init(proof);

        let result = verify_proof(&self.params, &self.vk, strategy, instances, &mut transcript);
        debug!("Proof verification result: {}", result.is_ok());
        Ok(result.is_ok())
    }
}
