//! Hashing utilities for content-addressed recipe identifiers.
//!
//! This module provides:
//! - `ObjectHash`: a 32-character base32 identifier for a recipe
//! - `Hashable`: canonical JSON serialization hashed into an `ObjectHash`

use data_encoding::BASE32;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of leading SHA-256 bytes kept in an identifier (160 bits).
pub const OBJ_HASH_BYTES: usize = 20;

pub type HashError = serde_json::Error;

/// A content-addressed identifier.
///
/// The first 160 bits of a SHA-256 over the canonical JSON serialization,
/// encoded as lowercase RFC 4648 base32 (the same truncation scheme nix uses
/// for store paths).
///
/// # Format
///
/// 32 lowercase characters from `a-z2-7`, e.g. `"mfrggzdfmztwq2lknnwg23tpobyxe43u"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Types whose serialized form is their identity.
///
/// Implementors must serialize deterministically: maps as `BTreeMap`, no
/// fields whose value depends on iteration order.
pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_vec(self)?;
    Ok(hash_bytes(&serialized))
  }
}

/// Hash arbitrary bytes into an `ObjectHash`.
pub fn hash_bytes(data: &[u8]) -> ObjectHash {
  let digest = Sha256::digest(data);
  ObjectHash(BASE32.encode(&digest[..OBJ_HASH_BYTES]).to_lowercase())
}
