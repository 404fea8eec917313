//! Store traits: the abstract interface for identity and ledger persistence.
//!
//! These traits allow the custody service to be storage-agnostic.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use custody_core::{Identity, IdentityId, LedgerEntry};

use crate::error::{Result, StoreError};

/// Persistence for enrolled identities.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Names are not unique**: `create_identity` never checks for an
///   existing name. Lookups by name see every identity ever enrolled under it.
/// - **Opaque keys**: key bytes are stored as given and never parsed here.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity stamped with the current time.
    async fn create_identity(&self, name: &str, public_key: &[u8]) -> Result<Identity>;

    /// Get an identity by id.
    ///
    /// Fails with `NotFound` if no such identity exists.
    async fn find_by_id(&self, id: IdentityId) -> Result<Identity>;

    /// All identities enrolled under `name`, in insertion order.
    ///
    /// Returns an empty vector when nothing matches.
    async fn find_all_by_name(&self, name: &str) -> Result<Vec<Identity>>;

    /// Replace the public key of an existing identity.
    ///
    /// Fails with `NotFound` if no such identity exists.
    async fn update_key(&self, id: IdentityId, public_key: &[u8]) -> Result<()>;

    /// The authoritative identity for `name`: the last one enrolled.
    ///
    /// Fails with `NotFound` if nothing matches.
    async fn most_recent_by_name(&self, name: &str) -> Result<Identity> {
        self.find_all_by_name(name)
            .await?
            .pop()
            .ok_or_else(|| StoreError::NotFound(format!("no identity with name {name}")))
    }
}

/// Persistence for ledger entries.
///
/// Appends are unconditional: the caller must have verified the signature.
#[async_trait]
pub trait LedgerStore: IdentityStore {
    /// Append an entry stamped with the current time.
    async fn append(
        &self,
        identity: IdentityId,
        message: &[u8],
        signature: &[u8],
    ) -> Result<LedgerEntry>;

    /// All entries recorded for an identity, in insertion order.
    async fn find_by_identity(&self, identity: IdentityId) -> Result<Vec<LedgerEntry>>;

    /// Number of entries recorded for an identity.
    async fn count_by_identity(&self, identity: IdentityId) -> Result<u64>;

    /// Entries of the authoritative identity for `name`.
    ///
    /// Only the most recent identity's entries are returned; entries signed
    /// under an earlier identity with the same name are not.
    async fn find_by_name(&self, name: &str) -> Result<Vec<LedgerEntry>> {
        let identity = self.most_recent_by_name(name).await?;
        self.find_by_identity(identity.id).await
    }
}

/// A backend holding both identities and the ledger.
pub trait Store: IdentityStore + LedgerStore {}

impl<S: IdentityStore + LedgerStore + ?Sized> Store for S {}
