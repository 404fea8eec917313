//! Error types for the custody service.

use custody_core::{IdentityId, KeyFormatError};
use custody_store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during custody operations.
///
/// A signature that fails to verify and a store that fails to write are
/// separate variants, so a caller can always tell why an entry is missing.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// Malformed input, rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// The stored public key could not be parsed as an EC key.
    #[error("key format error: {0}")]
    KeyFormat(#[from] KeyFormatError),

    /// No identity matches the name or id.
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    /// The signature does not verify; nothing was written.
    #[error("invalid signature for {name} (identity {identity})")]
    InvalidSignature { identity: IdentityId, name: String },

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl From<StoreError> for CustodyError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => CustodyError::IdentityNotFound(what),
            other => CustodyError::Storage(other),
        }
    }
}

/// The closed set of failure kinds a transport reports to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    KeyFormat,
    IdentityNotFound,
    InvalidSignature,
    Storage,
    Config,
}

impl ErrorKind {
    /// Stable wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::KeyFormat => "key_format",
            ErrorKind::IdentityNotFound => "identity_not_found",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::Storage => "storage",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CustodyError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CustodyError::Validation(_) => ErrorKind::Validation,
            CustodyError::KeyFormat(_) => ErrorKind::KeyFormat,
            CustodyError::IdentityNotFound(_) => ErrorKind::IdentityNotFound,
            CustodyError::InvalidSignature { .. } => ErrorKind::InvalidSignature,
            CustodyError::Storage(_) => ErrorKind::Storage,
            CustodyError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type for custody operations.
pub type Result<T> = std::result::Result<T, CustodyError>;
