//! Principal identities and the keys that prove them
//!
//! A principal is the 20-byte HASH160 of a compressed secp256k1 public key,
//! written as `0x`-prefixed lowercase hex. The ledger only ever compares
//! principals; a [`Signer`] is how a caller obtains one.

use bitcoin::hashes::{hash160, Hash};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

/// Length of a principal in bytes
pub const PRINCIPAL_LEN: usize = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Null principal is not a valid identity")]
    Null,

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),
}

/// Trim whitespace and an optional `0x`/`0X` prefix
fn strip_hex_prefix(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// An address-like identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal([u8; PRINCIPAL_LEN]);

impl Principal {
    /// Build a principal from raw bytes, rejecting the all-zero identity.
    pub fn from_bytes(bytes: [u8; PRINCIPAL_LEN]) -> Result<Self, PrincipalError> {
        if bytes == [0u8; PRINCIPAL_LEN] {
            return Err(PrincipalError::Null);
        }
        Ok(Self(bytes))
    }

    /// Derive the principal controlled by a public key
    pub fn from_public_key(pk: &PublicKey) -> Self {
        let digest = hash160::Hash::hash(&pk.serialize());
        Self(digest.to_byte_array())
    }

    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_LEN] {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(strip_hex_prefix(s))
            .map_err(|e| PrincipalError::InvalidHex(e.to_string()))?;
        let bytes: [u8; PRINCIPAL_LEN] = raw.as_slice().try_into().map_err(|_| {
            PrincipalError::InvalidLength {
                expected: PRINCIPAL_LEN,
                got: raw.len(),
            }
        })?;
        Self::from_bytes(bytes)
    }
}

impl Serialize for Principal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Principal::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A secret key held by a caller.
///
/// The principal it proves is derived once at construction.
pub struct Signer {
    secret: SecretKey,
    principal: Principal,
}

impl Signer {
    /// Generate a fresh random signer
    pub fn generate() -> Self {
        let secret = SecretKey::new(&mut rand::thread_rng());
        Self::from_secret_key(secret)
    }

    pub fn from_secret_key(secret: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let principal = Principal::from_public_key(&secret.public_key(&secp));
        Self { secret, principal }
    }

    /// Parse a 32-byte secret key from hex (optionally `0x`/`0X`-prefixed)
    pub fn from_hex(s: &str) -> Result<Self, PrincipalError> {
        let raw = Zeroizing::new(
            hex::decode(strip_hex_prefix(s))
                .map_err(|e| PrincipalError::InvalidHex(e.to_string()))?,
        );
        let secret = SecretKey::from_slice(&raw)
            .map_err(|e| PrincipalError::InvalidSecretKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret))
    }

    /// Hex encoding of the secret key. Handle with care.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret.secret_bytes()))
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}
