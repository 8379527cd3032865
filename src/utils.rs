//! Field encoding helpers and the hash primitives used by the protocol.

use crate::error::{Result, SignalError};
use halo2_gadgets::poseidon::primitives::{
    self as poseidon, ConstantLength, P128Pow5T3 as PoseidonSpec,
};
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;
use sha3::{Digest, Keccak256};

/// Hex length of an encoded field element (32 bytes).
pub const FIELD_HEX_LEN: usize = 64;

fn is_valid_hex_string(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .trim()
        .strip_prefix("0x")
        .or_else(|| input.trim().strip_prefix("0X"))
        .unwrap_or_else(|| input.trim())
}

/// Validates and strips hex prefix from a string.
///
/// # Errors
/// Returns [`SignalError::InvalidFieldEncoding`] if the stripped string does
/// not have `expected_len` characters or contains non-hex characters.
///
/// # Examples
///
/// ```
/// use zkp_semaphore::utils::validate_and_strip_hex;
///
/// let result = validate_and_strip_hex("0x1234abcd", 8).unwrap();
/// assert_eq!(result, "1234abcd");
/// ```
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> Result<String> {
    let stripped = strip_hex_prefix(input);

    if stripped.len() != expected_len {
        return Err(SignalError::InvalidFieldEncoding(format!(
            "hex string must be {} characters (got {})",
            expected_len,
            stripped.len()
        )));
    }

    if !is_valid_hex_string(stripped) {
        return Err(SignalError::InvalidFieldEncoding(
            "hex string contains non-hex characters".to_string(),
        ));
    }

    Ok(stripped.to_string())
}

const BASE_U64: u64 = 256;

/// Interprets 32 bytes as a big-endian base-256 number reduced into the
/// Pallas base field.
#[inline]
#[must_use]
pub fn bytes_to_field(bytes: &[u8; 32]) -> pallas::Base {
    let mut value = pallas::Base::zero();
    let base = pallas::Base::from(BASE_U64);

    for &byte in bytes.iter() {
        value = value * base + pallas::Base::from(byte as u64);
    }

    value
}

/// Canonical little-endian representation of a field element.
#[inline]
#[must_use]
pub fn field_to_bytes(field: pallas::Base) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    let repr = field.to_repr();
    bytes.copy_from_slice(repr.as_ref());
    bytes
}

/// Hex encoding of [`field_to_bytes`].
#[must_use]
pub fn field_to_hex(field: pallas::Base) -> String {
    hex::encode(field_to_bytes(field))
}

/// Decodes a canonical field element from 64 hex characters.
///
/// # Errors
/// Wrong length, non-hex characters or a value not below the field modulus.
///
/// ```
/// use zkp_semaphore::utils::{field_from_hex, field_to_hex};
/// use pasta_curves::pallas;
///
/// let x = pallas::Base::from(81);
/// assert_eq!(field_from_hex(&field_to_hex(x)).unwrap(), x);
/// assert!(field_from_hex(&"ff".repeat(32)).is_err());
/// ```
pub fn field_from_hex(input: &str) -> Result<pallas::Base> {
    let stripped = validate_and_strip_hex(input, FIELD_HEX_LEN)?;
    let decoded =
        hex::decode(&stripped).map_err(|e| SignalError::InvalidFieldEncoding(e.to_string()))?;

    let mut repr = [0u8; 32];
    repr.copy_from_slice(&decoded);

    Option::from(pallas::Base::from_repr(repr)).ok_or_else(|| {
        SignalError::InvalidFieldEncoding(format!("{stripped} is not below the field modulus"))
    })
}

/// Poseidon hash of two field elements using `P128Pow5T3` specification.
///
/// # Example
///
/// ```
/// use zkp_semaphore::utils::poseidon_hash;
/// use pasta_curves::pallas;
///
/// let left = pallas::Base::from(1);
/// let right = pallas::Base::from(2);
/// assert_ne!(poseidon_hash(left, right), poseidon_hash(right, left));
/// ```
#[inline]
#[must_use]
pub fn poseidon_hash(left: pallas::Base, right: pallas::Base) -> pallas::Base {
    let inputs = [left, right];
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<2>, 3, 2>::init().hash(inputs)
}

/// Poseidon hash of a single field element (`ConstantLength<1>` domain).
#[inline]
#[must_use]
pub fn poseidon_hash_single(input: pallas::Base) -> pallas::Base {
    poseidon::Hash::<_, PoseidonSpec, ConstantLength<1>, 3, 2>::init().hash([input])
}

/// Hashes raw signal content into the field: `Keccak256(signal) >> 8`.
///
/// Dropping the last digest byte keeps the value under 2^248, so it is a
/// field element without reduction.
#[must_use]
pub fn hash_signal(signal: &[u8]) -> pallas::Base {
    let digest: [u8; 32] = Keccak256::digest(signal).into();

    let mut shifted = [0u8; 32];
    shifted[1..].copy_from_slice(&digest[..31]);
    bytes_to_field(&shifted)
}
