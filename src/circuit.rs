//! halo2 circuit for the signaling predicate.
//!
//! Public inputs live in a single instance column, one per row:
//!
//! | row | value                 |
//! |-----|-----------------------|
//! | 0   | merkle root           |
//! | 1   | epoch nullifier       |
//! | 2   | signal nullifier      |
//! | 3   | signal hash           |
//! | 4   | signal hash squared   |
//!
//! The identity secrets and the inclusion path are private advice. Poseidon
//! hashes are computed with the `Pow5Chip` from `halo2_gadgets` so the circuit
//! agrees bit-for-bit with [`crate::utils::poseidon_hash`].

use crate::error::{Result, SignalError};
use crate::types::{
    PrivateInputs, EPOCH_NULLIFIER_ROW, MERKLE_ROOT_ROW, SIGNAL_HASH_ROW,
    SIGNAL_HASH_SQUARED_ROW, SIGNAL_NULLIFIER_ROW,
};
use halo2_gadgets::poseidon::{
    primitives::{ConstantLength, P128Pow5T3},
    Hash as PoseidonHash, Pow5Chip, Pow5Config,
};
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, SimpleFloorPlanner, Value},
    plonk::{
        self, Advice, Circuit, Column, ConstraintSystem, Constraints, Expression, Fixed,
        Instance, Selector,
    },
    poly::Rotation,
};
use pasta_curves::pallas;

type Cell = AssignedCell<pallas::Base, pallas::Base>;
type PoseidonChip = Pow5Chip<pallas::Base, 3, 2>;

#[derive(Debug, Clone)]
pub struct SignalConfig {
    /// `advice[0..3]` are the Poseidon state, `advice[3]` its partial s-box.
    /// The swap gate uses all five: current, sibling, bit, left, right.
    pub advice: [Column<Advice>; 5],
    pub instance: Column<Instance>,
    pub constants: Column<Fixed>,
    pub s_swap: Selector,
    pub s_square: Selector,
    pub poseidon: Pow5Config<pallas::Base, 3, 2>,
}

impl SignalConfig {
    fn poseidon_chip(&self) -> PoseidonChip {
        Pow5Chip::construct(self.poseidon.clone())
    }

    fn hash_pair(
        &self,
        mut layouter: impl Layouter<pallas::Base>,
        left: Cell,
        right: Cell,
    ) -> std::result::Result<Cell, plonk::Error> {
        let hasher = PoseidonHash::<_, _, P128Pow5T3, ConstantLength<2>, 3, 2>::init(
            self.poseidon_chip(),
            layouter.namespace(|| "poseidon init"),
        )?;
        hasher.hash(layouter.namespace(|| "poseidon hash"), [left, right])
    }

    fn hash_single(
        &self,
        mut layouter: impl Layouter<pallas::Base>,
        input: Cell,
    ) -> std::result::Result<Cell, plonk::Error> {
        let hasher = PoseidonHash::<_, _, P128Pow5T3, ConstantLength<1>, 3, 2>::init(
            self.poseidon_chip(),
            layouter.namespace(|| "poseidon init"),
        )?;
        hasher.hash(layouter.namespace(|| "poseidon hash"), [input])
    }
}

/// The signaling circuit for trees of `DEPTH` levels.
#[derive(Debug, Clone)]
pub struct SignalCircuit<const DEPTH: usize> {
    pub trapdoor: Value<pallas::Base>,
    pub nullifier_seed: Value<pallas::Base>,
    pub siblings: [Value<pallas::Base>; DEPTH],
    /// 1 when the running node is a right child, 0 otherwise.
    pub position_bits: [Value<pallas::Base>; DEPTH],
}

impl<const DEPTH: usize> Default for SignalCircuit<DEPTH> {
    fn default() -> Self {
        Self {
            trapdoor: Value::unknown(),
            nullifier_seed: Value::unknown(),
            siblings: [Value::unknown(); DEPTH],
            position_bits: [Value::unknown(); DEPTH],
        }
    }
}

impl<const DEPTH: usize> SignalCircuit<DEPTH> {
    /// Circuit with the prover's private inputs assigned.
    ///
    /// A witness whose length differs from `DEPTH` is a shape error.
    pub fn from_private(private: &PrivateInputs) -> Result<Self> {
        private.witness.check_depth(DEPTH)?;

        let mut siblings = [Value::unknown(); DEPTH];
        let mut position_bits = [Value::unknown(); DEPTH];
        for (level, node) in private.witness.path().iter().enumerate() {
            siblings[level] = Value::known(node.sibling);
            position_bits[level] = Value::known(if node.is_right {
                pallas::Base::one()
            } else {
                pallas::Base::zero()
            });
        }

        Ok(Self {
            trapdoor: Value::known(private.identity.trapdoor()),
            nullifier_seed: Value::known(private.identity.nullifier_seed()),
            siblings,
            position_bits,
        })
    }
}

impl<const DEPTH: usize> Circuit<pallas::Base> for SignalCircuit<DEPTH> {
    type Config = SignalConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::default()
    }

    fn configure(meta: &mut ConstraintSystem<pallas::Base>) -> Self::Config {
        let advice = [
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
            meta.advice_column(),
        ];
        for column in advice.iter() {
            meta.enable_equality(*column);
        }

        let instance = meta.instance_column();
        meta.enable_equality(instance);

        // Poseidon initial capacity and padding words are loaded as constants.
        let constants = meta.fixed_column();
        meta.enable_constant(constants);

        let rc_a = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let rc_b = [meta.fixed_column(), meta.fixed_column(), meta.fixed_column()];
        let poseidon = PoseidonChip::configure::<P128Pow5T3>(
            meta,
            [advice[0], advice[1], advice[2]],
            advice[3],
            rc_a,
            rc_b,
        );

        let s_swap = meta.selector();
        meta.create_gate("merkle swap", |meta| {
            let s = meta.query_selector(s_swap);
            let current = meta.query_advice(advice[0], Rotation::cur());
            let sibling = meta.query_advice(advice[1], Rotation::cur());
            let bit = meta.query_advice(advice[2], Rotation::cur());
            let left = meta.query_advice(advice[3], Rotation::cur());
            let right = meta.query_advice(advice[4], Rotation::cur());
            let one = Expression::Constant(pallas::Base::one());

            Constraints::with_selector(
                s,
                [
                    ("bit is boolean", bit.clone() * (one - bit.clone())),
                    (
                        "left = bit ? sibling : current",
                        left - (current.clone() + bit.clone() * (sibling.clone() - current.clone())),
                    ),
                    (
                        "right = bit ? current : sibling",
                        right - (sibling.clone() + bit * (current - sibling)),
                    ),
                ],
            )
        });

        let s_square = meta.selector();
        meta.create_gate("signal square", |meta| {
            let s = meta.query_selector(s_square);
            let hash = meta.query_advice(advice[0], Rotation::cur());
            let squared = meta.query_advice(advice[1], Rotation::cur());

            Constraints::with_selector(s, [("hash * hash = squared", hash.clone() * hash - squared)])
        });

        SignalConfig {
            advice,
            instance,
            constants,
            s_swap,
            s_square,
            poseidon,
        }
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<pallas::Base>,
    ) -> std::result::Result<(), plonk::Error> {
        let (trapdoor, nullifier_seed) = layouter.assign_region(
            || "load identity",
            |mut region| {
                let trapdoor =
                    region.assign_advice(|| "trapdoor", config.advice[0], 0, || self.trapdoor)?;
                let seed = region.assign_advice(
                    || "nullifier seed",
                    config.advice[1],
                    0,
                    || self.nullifier_seed,
                )?;
                Ok((trapdoor, seed))
            },
        )?;

        // secret = H(trapdoor, seed); leaf = H(secret)
        let secret = config.hash_pair(
            layouter.namespace(|| "identity secret"),
            trapdoor,
            nullifier_seed.clone(),
        )?;
        let leaf = config.hash_single(layouter.namespace(|| "identity leaf"), secret)?;

        // Constraint 1: the path from the leaf reaches the public root.
        let mut current = leaf;
        for level in 0..DEPTH {
            let sibling = self.siblings[level];
            let bit = self.position_bits[level];

            let (left, right) = layouter.assign_region(
                || format!("merkle swap level {level}"),
                |mut region| {
                    config.s_swap.enable(&mut region, 0)?;

                    let cur = current.copy_advice(|| "current", &mut region, config.advice[0], 0)?;
                    region.assign_advice(|| "sibling", config.advice[1], 0, || sibling)?;
                    region.assign_advice(|| "position bit", config.advice[2], 0, || bit)?;

                    let cur_value = cur.value().map(|v| *v);
                    let left_value = cur_value
                        .zip(sibling)
                        .zip(bit)
                        .map(|((c, s), b)| c + b * (s - c));
                    let right_value = cur_value
                        .zip(sibling)
                        .zip(bit)
                        .map(|((c, s), b)| s + b * (c - s));

                    let left = region.assign_advice(|| "left", config.advice[3], 0, || left_value)?;
                    let right =
                        region.assign_advice(|| "right", config.advice[4], 0, || right_value)?;
                    Ok((left, right))
                },
            )?;

            current = config.hash_pair(
                layouter.namespace(|| format!("merkle hash level {level}")),
                left,
                right,
            )?;
        }
        layouter.constrain_instance(current.cell(), config.instance, MERKLE_ROOT_ROW)?;

        // Constraint 2: signal nullifier = H(seed, epoch).
        let epoch = layouter.assign_region(
            || "load epoch nullifier",
            |mut region| {
                region.assign_advice_from_instance(
                    || "epoch nullifier",
                    config.instance,
                    EPOCH_NULLIFIER_ROW,
                    config.advice[0],
                    0,
                )
            },
        )?;
        let signal_nullifier = config.hash_pair(
            layouter.namespace(|| "signal nullifier"),
            nullifier_seed,
            epoch,
        )?;
        layouter.constrain_instance(signal_nullifier.cell(), config.instance, SIGNAL_NULLIFIER_ROW)?;

        // Constraint 3: signal hash binding.
        layouter.assign_region(
            || "signal square",
            |mut region| {
                config.s_square.enable(&mut region, 0)?;
                region.assign_advice_from_instance(
                    || "signal hash",
                    config.instance,
                    SIGNAL_HASH_ROW,
                    config.advice[0],
                    0,
                )?;
                region.assign_advice_from_instance(
                    || "signal hash squared",
                    config.instance,
                    SIGNAL_HASH_SQUARED_ROW,
                    config.advice[1],
                    0,
                )?;
                Ok(())
            },
        )
    }
}

/// Circuit for the protocol's fixed tree depth.
pub type SemaphoreCircuit = SignalCircuit<{ crate::TREE_DEPTH }>;
