//! Runtime configuration: CDN account and link-store backend.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{MediaError, Result};
use crate::media::FallbackTable;
use crate::store::{MediaStore, MemoryStore, SqliteStore};

/// CDN account used to build delivery URLs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CdnConfig {
    pub host: String,
    pub cloud_name: String,
}

impl CdnConfig {
    pub fn new(host: &str, cloud_name: &str) -> Self {
        Self {
            host: host.to_string(),
            cloud_name: cloud_name.to_string(),
        }
    }

    /// Validate a host/cloud pair coming from the command line or environment
    pub fn parse(host: &str, cloud_name: &str) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        let cloud_name = cloud_name.trim();
        if host.is_empty() || host.contains("://") {
            return Err(MediaError::Config(format!("invalid CDN host '{}'", host)));
        }
        if cloud_name.is_empty() || cloud_name.contains('/') {
            return Err(MediaError::Config(format!("invalid cloud name '{}'", cloud_name)));
        }
        Ok(Self::new(host, cloud_name))
    }
}

/// Link store backend type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    /// Process-local maps, lost on exit
    Memory,
    /// SQLite database file
    Sqlite { path: PathBuf },
}

impl Default for StoreType {
    fn default() -> Self {
        StoreType::Sqlite {
            path: std::env::temp_dir().join("clinic-media").join("media.db"),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub store_type: StoreType,
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self {
            store_type: StoreType::Memory,
        }
    }

    pub fn sqlite(path: PathBuf) -> Self {
        Self {
            store_type: StoreType::Sqlite { path },
        }
    }

    /// Build from the `--store` kind name and an optional database path
    pub fn from_kind(kind: &str, db_path: Option<PathBuf>) -> Result<Self> {
        match kind {
            "memory" => Ok(Self::memory()),
            "sqlite" => Ok(match db_path {
                Some(path) => Self::sqlite(path),
                None => Self::default(),
            }),
            other => Err(MediaError::Config(format!("unknown store kind '{}'", other))),
        }
    }

    /// Open the configured backend
    pub async fn build(&self) -> Result<Arc<dyn MediaStore>> {
        match &self.store_type {
            StoreType::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreType::Sqlite { path } => Ok(Arc::new(SqliteStore::open(path).await?)),
        }
    }
}

/// Load the compatibility table, either the built-in one or a JSON object file
pub fn load_fallback_table(path: Option<&PathBuf>) -> Result<FallbackTable> {
    match path {
        Some(path) => FallbackTable::from_json_file(path),
        None => Ok(FallbackTable::legacy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdn_parse() {
        let cdn = CdnConfig::parse("res.cloudinary.com/", " clinic ").unwrap();
        assert_eq!(cdn, CdnConfig::new("res.cloudinary.com", "clinic"));

        assert!(CdnConfig::parse("https://res.cloudinary.com", "clinic").is_err());
        assert!(CdnConfig::parse("res.cloudinary.com", "").is_err());
    }

    #[test]
    fn test_store_kind() {
        assert_eq!(
            StoreConfig::from_kind("memory", None).unwrap().store_type,
            StoreType::Memory
        );
        let sqlite = StoreConfig::from_kind("sqlite", Some(PathBuf::from("/tmp/x.db"))).unwrap();
        assert_eq!(
            sqlite.store_type,
            StoreType::Sqlite {
                path: PathBuf::from("/tmp/x.db")
            }
        );
        assert!(matches!(
            StoreConfig::from_kind("postgres", None),
            Err(MediaError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_build_memory_store() {
        let store = StoreConfig::memory().build().await.unwrap();
        assert!(store.list_links().await.unwrap().is_empty());
    }
}
