//! # Custody Core
//!
//! Pure primitives for the custody ledger: identities, ledger entries, and
//! signature verification.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Identity`] - An enrolled name bound to an encoded public key
//! - [`LedgerEntry`] - A verified, append-only signed message
//! - [`EcdsaPublicKey`] - A parsed P-256, P-384 or P-521 key, see [`verify`]
//! - [`Keypair`] - Signing side, used by enrolling callers
//!
//! ## Key Encoding
//!
//! Public keys travel and are stored as PKIX (X.509 SubjectPublicKeyInfo)
//! DER. Parsing is deferred until a signature has to be checked, so a stored
//! key may turn out to be unusable; that surfaces as [`KeyFormatError`].

pub mod crypto;
pub mod error;
pub mod types;

pub use crypto::{verify, Curve, EcdsaPublicKey, Keypair, SIGNATURE_LEN};
pub use error::KeyFormatError;
pub use types::{now_millis, EntryId, Identity, IdentityId, LedgerEntry};
