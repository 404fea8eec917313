//! # Custody Store
//!
//! Storage abstraction for the custody ledger. Provides trait-based
//! interfaces for identity and ledger persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! Identities and ledger entries sit behind the [`IdentityStore`] and
//! [`LedgerStore`] traits, allowing the custody service to be
//! storage-agnostic. The primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`IdentityStore`] - Enroll, look up, and re-key identities
//! - [`LedgerStore`] - Append and read ledger entries
//! - [`Store`] - Both, as one bound
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use custody_store::{IdentityStore, LedgerStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("custody.sqlite").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let identity = store.create_identity("evan", b"...").await.unwrap();
//!     let entries = store.find_by_identity(identity.id).await.unwrap();
//!     assert!(entries.is_empty());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Unchecked appends**: the store never verifies signatures; that is the
//!   custody service's job.
//! - **Most-recent-wins**: name lookups resolve to the highest identity id.
//! - **No migrations**: the schema is created with `IF NOT EXISTS` on open.

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{IdentityStore, LedgerStore, Store};
