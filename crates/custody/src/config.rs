//! Configuration for the custody service.

use std::path::{Path, PathBuf};

use custody_store::SqliteStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CustodyError, Result};

/// Default upper bound on a recorded message, in bytes. Large enough for
/// evidence files such as scans and photos.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 32 << 20;

/// Configuration for the custody service.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    /// Where identities and the ledger live.
    pub database: DatabaseConfig,
    /// Listen address handed to the transport.
    pub net: NetConfig,
    /// Messages longer than this are rejected by `record`.
    pub max_message_len: usize,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            net: NetConfig::default(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

/// Database location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. `None` keeps everything in memory.
    pub path: Option<PathBuf>,
}

/// Network settings for the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    pub network: String,
    pub address: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            network: "tcp".to_string(),
            address: "0.0.0.0:4911".to_string(),
        }
    }
}

impl CustodyConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CustodyError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading custody config");
        let text = std::fs::read_to_string(path)
            .map_err(|e| CustodyError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Open the configured SQLite store, creating tables as needed.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let store = match &self.database.path {
            Some(path) => SqliteStore::open(path)?,
            None => SqliteStore::open_memory()?,
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = CustodyConfig::from_toml_str("").unwrap();
        assert_eq!(config, CustodyConfig::default());
        assert_eq!(config.net.address, "0.0.0.0:4911");
        assert_eq!(config.database.path, None);
        assert_eq!(config.max_message_len, 32 * 1024 * 1024);
    }

    #[test]
    fn test_partial_document() {
        let config = CustodyConfig::from_toml_str(
            r#"
            max_message_len = 64

            [database]
            path = "/var/lib/custody/custody.sqlite"

            [net]
            address = "127.0.0.1:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_message_len, 64);
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/var/lib/custody/custody.sqlite"))
        );
        assert_eq!(config.net.network, "tcp");
        assert_eq!(config.net.address, "127.0.0.1:9000");
    }

    #[test]
    fn test_bad_document_is_config_error() {
        let err = CustodyConfig::from_toml_str("max_message_len = \"lots\"").unwrap_err();
        assert!(matches!(err, CustodyError::Config(_)));
    }

    #[test]
    fn test_load_and_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("custody.sqlite");
        let file = dir.path().join("custody.toml");
        std::fs::write(
            &file,
            format!("[database]\npath = {:?}\n", db.display().to_string()),
        )
        .unwrap();

        let config = CustodyConfig::load(&file).unwrap();
        config.open_store().unwrap();
        assert!(db.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let err = CustodyConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, CustodyError::Config(_)));
    }
}
