use std::fmt;

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonBytesHasher};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ClientError, Result};

/// Byte width of a single note secret. A 31-byte little-endian integer is
/// always below the BN254 scalar modulus, so secrets never need reduction.
pub const SECRET_BYTES: usize = 31;

/// Generate a random 31-byte secret (little-endian).
pub fn random_secret() -> [u8; SECRET_BYTES] {
    let mut secret = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

/// Poseidon hash over field elements given as big-endian byte slices,
/// using the circom parameter set. Returns the 32-byte big-endian digest.
pub fn poseidon_hash(inputs: &[&[u8]]) -> Result<[u8; 32]> {
    let mut poseidon = Poseidon::<Fr>::new_circom(inputs.len())
        .map_err(|e| ClientError::Crypto(format!("Poseidon init failed: {}", e)))?;
    poseidon
        .hash_bytes_be(inputs)
        .map_err(|e| ClientError::Crypto(format!("Poseidon hash failed: {}", e)))
}

/// Big-endian 32-byte field encoding of a little-endian secret.
pub fn secret_to_element(secret: &[u8; SECRET_BYTES]) -> [u8; 32] {
    let mut element = [0u8; 32];
    for (i, byte) in secret.iter().enumerate() {
        element[31 - i] = *byte;
    }
    element
}

/// 0x-prefixed hex of a fixed-width big-endian value.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// 32-byte big-endian hex of an unsigned value, as the ledger encodes
/// numeric call arguments.
pub fn u128_to_hex32(value: u128) -> String {
    let mut padded = [0u8; 32];
    padded[16..].copy_from_slice(&value.to_be_bytes());
    to_hex(&padded)
}

/// A 20-byte ledger address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_hex(s: &str) -> Result<Self> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.len() != 40 {
            return Err(ClientError::InvalidAddress(format!(
                "expected 40 hex chars, got {}",
                body.len()
            )));
        }
        let bytes = hex::decode(body)
            .map_err(|e| ClientError::InvalidAddress(format!("not hex: {}", e)))?;
        let mut address = [0u8; 20];
        address.copy_from_slice(&bytes);
        Ok(Self(address))
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// 32-byte big-endian field encoding, as circuits consume addresses.
    pub fn to_element(&self) -> [u8; 32] {
        let mut element = [0u8; 32];
        element[12..].copy_from_slice(&self.0);
        element
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
