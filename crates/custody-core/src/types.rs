//! Strong type definitions for the custody ledger.
//!
//! Row identifiers are newtypes so an identity id can never be passed where a
//! ledger entry id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::EcdsaPublicKey;
use crate::error::KeyFormatError;

/// Identifier of an enrolled identity (the `identities.id` rowid).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub i64);

impl IdentityId {
    /// Get the raw rowid.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityId({})", self.0)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IdentityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of a ledger entry (the `ledger.id` rowid).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl EntryId {
    /// Get the raw rowid.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// An enrolled identity: a name bound to an encoded public key.
///
/// Names are not unique. When several identities share a name, the most
/// recently created one is authoritative for lookups.
///
/// `public_key` holds the key exactly as it was enrolled. It is not parsed
/// until a signature has to be checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub name: String,
    #[serde(with = "hex")]
    pub public_key: Vec<u8>,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl Identity {
    /// Parse the enrolled key.
    pub fn public(&self) -> Result<EcdsaPublicKey, KeyFormatError> {
        EcdsaPublicKey::from_der(&self.public_key)
    }
}

/// A verified, append-only ledger record.
///
/// `message` holds the signed bytes exactly as submitted; they need not be
/// text. `hash` is the signature over `message` that was checked against the
/// identity's key at insertion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub identity: IdentityId,
    /// Unix milliseconds.
    pub created_at: i64,
    #[serde(with = "hex")]
    pub message: Vec<u8>,
    #[serde(with = "hex")]
    pub hash: Vec<u8>,
}

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
