//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use custody_core::{now_millis, EntryId, Identity, IdentityId, LedgerEntry};

use crate::error::{Result, StoreError};
use crate::traits::{IdentityStore, LedgerStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Identities in insertion order; `identities[i].id == i + 1`.
    identities: Vec<Identity>,

    /// Ledger entries in insertion order; `ledger[i].id == i + 1`.
    ledger: Vec<LedgerEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Task(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn identity_mut(&mut self, id: IdentityId) -> Option<&mut Identity> {
        self.identities.iter_mut().find(|i| i.id == id)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_identity(&self, name: &str, public_key: &[u8]) -> Result<Identity> {
        let mut inner = self.write()?;

        let identity = Identity {
            id: IdentityId(inner.identities.len() as i64 + 1),
            name: name.to_string(),
            public_key: public_key.to_vec(),
            created_at: now_millis(),
        };
        inner.identities.push(identity.clone());

        Ok(identity)
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Identity> {
        self.read()?
            .identities
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("no identity with id {id}")))
    }

    async fn find_all_by_name(&self, name: &str) -> Result<Vec<Identity>> {
        Ok(self
            .read()?
            .identities
            .iter()
            .filter(|i| i.name == name)
            .cloned()
            .collect())
    }

    async fn update_key(&self, id: IdentityId, public_key: &[u8]) -> Result<()> {
        let mut inner = self.write()?;

        let identity = inner
            .identity_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("no identity with id {id}")))?;
        identity.public_key = public_key.to_vec();

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append(
        &self,
        identity: IdentityId,
        message: &[u8],
        signature: &[u8],
    ) -> Result<LedgerEntry> {
        let mut inner = self.write()?;

        // Mirror the SQLite foreign key.
        if inner.identity_mut(identity).is_none() {
            return Err(StoreError::InvalidData(format!(
                "ledger entry references unknown identity {identity}"
            )));
        }

        let entry = LedgerEntry {
            id: EntryId(inner.ledger.len() as i64 + 1),
            identity,
            created_at: now_millis(),
            message: message.to_vec(),
            hash: signature.to_vec(),
        };
        inner.ledger.push(entry.clone());

        Ok(entry)
    }

    async fn find_by_identity(&self, identity: IdentityId) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .read()?
            .ledger
            .iter()
            .filter(|e| e.identity == identity)
            .cloned()
            .collect())
    }

    async fn count_by_identity(&self, identity: IdentityId) -> Result<u64> {
        Ok(self
            .read()?
            .ledger
            .iter()
            .filter(|e| e.identity == identity)
            .count() as u64)
    }
}
