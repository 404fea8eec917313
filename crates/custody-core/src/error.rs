//! Error types for the custody core.

use thiserror::Error;

/// A public key could not be turned into a usable ECDSA verifying key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFormatError {
    /// The bytes are not a PKIX SubjectPublicKeyInfo, or the point is invalid.
    #[error("malformed public key: {0}")]
    Malformed(String),

    /// A well-formed public key of some other algorithm family.
    #[error("public key is not an elliptic-curve key (algorithm {0})")]
    WrongAlgorithm(String),

    /// An elliptic-curve key on a named curve we cannot verify with.
    #[error("unsupported elliptic curve (curve {0})")]
    UnsupportedCurve(String),
}

/// Result type for key parsing.
pub type Result<T> = std::result::Result<T, KeyFormatError>;
