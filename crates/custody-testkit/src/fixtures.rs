//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use custody::{CustodyConfig, CustodyService};
use custody_core::{Identity, IdentityId, Keypair};
use custody_store::{LedgerStore, MemoryStore, SqliteStore, Store};

/// A user who holds a private key and can sign messages.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub name: String,
    pub keypair: Keypair,
}

impl TestUser {
    /// Create a user with a random keypair.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keypair: Keypair::generate(),
        }
    }

    /// Create a user with a deterministic keypair.
    ///
    /// `n` must be non-zero.
    pub fn numbered(name: &str, n: u8) -> Self {
        let mut secret = [0u8; 32];
        secret[31] = n;
        Self {
            name: name.to_string(),
            keypair: Keypair::from_secret(&secret).expect("small non-zero scalar"),
        }
    }

    /// The PKIX DER public key this user enrolls with.
    pub fn public_key_der(&self) -> Vec<u8> {
        self.keypair.public_key_der().expect("P-256 key encodes")
    }

    /// Sign a message with this user's key.
    pub fn sign(&self, message: impl AsRef<[u8]>) -> Vec<u8> {
        self.keypair.sign(message.as_ref())
    }

    /// A signature over `message` made with some other key.
    pub fn forge(&self, message: impl AsRef<[u8]>) -> Vec<u8> {
        Keypair::generate().sign(message.as_ref())
    }
}

/// A test fixture with a custody service over a store.
pub struct TestFixture<S: Store = MemoryStore> {
    pub service: CustodyService<S>,
}

impl TestFixture<MemoryStore> {
    /// Create a fixture backed by a memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl TestFixture<SqliteStore> {
    /// Create a fixture backed by an in-memory SQLite database.
    pub fn sqlite() -> Self {
        Self::with_store(SqliteStore::open_memory().expect("open in-memory sqlite"))
    }
}

impl<S: Store> TestFixture<S> {
    /// Create a fixture over the given store with default config.
    pub fn with_store(store: S) -> Self {
        Self {
            service: CustodyService::new(store, CustodyConfig::default()),
        }
    }

    /// Enroll a fresh user under `name`.
    pub async fn enroll(&self, name: &str) -> (TestUser, Identity) {
        let user = TestUser::new(name);
        let identity = self.enroll_user(&user).await;
        (user, identity)
    }

    /// Enroll an existing user.
    pub async fn enroll_user(&self, user: &TestUser) -> Identity {
        self.service
            .create(&user.name, &user.public_key_der())
            .await
            .expect("enroll test user")
    }

    /// Number of ledger rows for an identity.
    pub async fn ledger_len(&self, identity: IdentityId) -> u64 {
        self.service
            .store()
            .count_by_identity(identity)
            .await
            .expect("count ledger rows")
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create users with distinct deterministic keys.
pub fn users(names: &[&str]) -> Vec<TestUser> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| TestUser::numbered(name, i as u8 + 1))
        .collect()
}
