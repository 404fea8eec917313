//! The custody service: enrollment and verify-before-persist recording.
//!
//! The service owns all writes to the identity and ledger stores. It keeps no
//! state between calls: every `record` re-reads the identity and re-parses its
//! key, so a re-key is visible to the very next call.

use std::sync::Arc;

use custody_core::{verify, EcdsaPublicKey, Identity, IdentityId, LedgerEntry};
use custody_store::Store;
use tracing::{debug, info, warn};

use crate::config::CustodyConfig;
use crate::error::{CustodyError, Result};

/// Orchestrates identity enrollment and ledger recording over a store.
///
/// The store is injected; clones share it.
pub struct CustodyService<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: CustodyConfig,
}

impl<S: Store> Clone for CustodyService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> CustodyService<S> {
    /// Create a service that owns `store`.
    pub fn new(store: S, config: CustodyConfig) -> Self {
        Self::with_shared(Arc::new(store), config)
    }

    /// Create a service over a store shared with other readers.
    pub fn with_shared(store: Arc<S>, config: CustodyConfig) -> Self {
        Self { store, config }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &CustodyConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Enroll a new identity.
    ///
    /// The key bytes are stored without being parsed. A key that turns out to
    /// be unusable is reported by the first `record` against it.
    pub async fn create(&self, name: &str, public_key: &[u8]) -> Result<Identity> {
        if name.is_empty() {
            return Err(CustodyError::Validation("name is required".to_string()));
        }
        if public_key.is_empty() {
            return Err(CustodyError::Validation("public key is required".to_string()));
        }

        let identity = self.store.create_identity(name, public_key).await?;
        info!(user = name, identity = %identity.id, "enrolled identity");
        Ok(identity)
    }

    /// Replace the public key of an existing identity.
    pub async fn rekey(&self, id: IdentityId, public_key: &[u8]) -> Result<()> {
        if public_key.is_empty() {
            return Err(CustodyError::Validation("public key is required".to_string()));
        }

        self.store.update_key(id, public_key).await?;
        info!(identity = %id, "replaced identity key");
        Ok(())
    }

    /// Get an identity by id.
    pub async fn identity(&self, id: IdentityId) -> Result<Identity> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Every identity enrolled under `name`, oldest first.
    pub async fn identities(&self, name: &str) -> Result<Vec<Identity>> {
        Ok(self.store.find_all_by_name(name).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify `signature` over `message` for `name` and append it to the ledger.
    ///
    /// The signature is checked against the most recently enrolled identity
    /// with this name. If it does not verify, this fails with
    /// `InvalidSignature` and nothing is written. `message` is arbitrary
    /// bytes and is stored exactly as given.
    pub async fn record(&self, name: &str, message: &[u8], signature: &[u8]) -> Result<LedgerEntry> {
        if message.len() > self.config.max_message_len {
            return Err(CustodyError::Validation(format!(
                "message is {} bytes, limit is {}",
                message.len(),
                self.config.max_message_len
            )));
        }

        let (identity, key) = self.resolve(name).await?;

        if !verify(message, signature, &key) {
            warn!(user = name, identity = %identity.id, "rejected signature");
            return Err(CustodyError::InvalidSignature {
                identity: identity.id,
                name: identity.name,
            });
        }

        let entry = self.store.append(identity.id, message, signature).await?;
        info!(user = name, identity = %identity.id, entry = %entry.id, "recorded ledger entry");
        Ok(entry)
    }

    /// Check a signature for `name` without recording anything.
    pub async fn check(&self, name: &str, message: &[u8], signature: &[u8]) -> Result<bool> {
        let (_, key) = self.resolve(name).await?;
        Ok(verify(message, signature, &key))
    }

    /// Ledger entries of the most recent identity named `name`.
    pub async fn list(&self, name: &str) -> Result<Vec<LedgerEntry>> {
        let entries = self.store.find_by_name(name).await?;
        debug!(user = name, count = entries.len(), "listed ledger entries");
        Ok(entries)
    }

    /// Resolve `name` to its authoritative identity and parse its key.
    ///
    /// When a name has been enrolled more than once, the latest enrollment
    /// wins. Earlier keys are superseded, not revoked, which means anyone able
    /// to enroll under a name can shadow the identity that held it before.
    async fn resolve(&self, name: &str) -> Result<(Identity, EcdsaPublicKey)> {
        let identity = self.store.most_recent_by_name(name).await?;
        debug!(user = name, identity = %identity.id, "resolved identity");

        let key = identity.public().map_err(|e| {
            warn!(user = name, identity = %identity.id, error = %e, "unusable identity key");
            CustodyError::KeyFormat(e)
        })?;

        Ok((identity, key))
    }
}
