//! # Custody
//!
//! Cryptographically verifiable custody records: an enrolled identity signs
//! arbitrary data, and the signature is checked against the identity's stored
//! public key before the message is appended to an append-only ledger.
//!
//! ## Overview
//!
//! - **Create**: enroll a name with an ECDSA public key (PKIX DER) on P-256,
//!   P-384 or P-521
//! - **Validate**: verify a signed message and record it
//! - **List**: read the ledger for a name
//!
//! ## Key Concepts
//!
//! - **Verify before persist**: an entry whose signature does not verify is
//!   never written. `InvalidSignature` and `Storage` failures are distinct.
//! - **Most-recent-wins**: names are not unique; the latest enrollment under a
//!   name is the one signatures are checked against.
//! - **Deferred key validation**: enrollment stores key bytes as given. A bad
//!   key surfaces as `KeyFormat` on the next record.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use custody::{CustodyConfig, CustodyService, Router};
//! use custody::core::Keypair;
//! use custody::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("custody.sqlite").unwrap();
//!     let service = CustodyService::new(store, CustodyConfig::default());
//!
//!     let keypair = Keypair::generate();
//!     service
//!         .create("evan", &keypair.public_key_der().unwrap())
//!         .await
//!         .unwrap();
//!
//!     let entry = service
//!         .record("evan", b"hello", &keypair.sign(b"hello"))
//!         .await
//!         .unwrap();
//!     assert_eq!(entry.message, b"hello");
//!
//!     // Remote callers go through the router
//!     let router = Router::new(service);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `custody::core` - Identities, ledger entries, signature verification
//! - `custody::store` - Storage traits and SQLite

pub mod config;
pub mod error;
pub mod router;
pub mod service;

// Re-export component crates
pub use custody_core as core;
pub use custody_store as store;

// Re-export main types for convenience
pub use config::{CustodyConfig, DatabaseConfig, NetConfig};
pub use error::{CustodyError, ErrorKind, Result};
pub use router::{
    CreateRequest, ErrorReply, IdentityReply, ListRequest, Operation, RecordRequest, Reply,
    Request, Response, Router,
};
pub use service::CustodyService;

// Re-export commonly used core types
pub use custody_core::{EntryId, Identity, IdentityId, Keypair, LedgerEntry};
