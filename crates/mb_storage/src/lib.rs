use std::sync::Arc;
use std::str::FromStr;
use async_trait::async_trait;
use mb_core::{BriefingStorage, Error, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: BriefingStorage {
    fn get_error_message() -> &'static str where Self: Sized;
    async fn new() -> Result<Self> where Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    #[cfg(feature = "sqlite")]
    SQLite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(Self::SQLite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

/// Opens the requested backend. `database_path` only applies to on-disk backends.
pub async fn create_storage(kind: StorageKind, database_path: Option<&str>) -> Result<Arc<dyn BriefingStorage>> {
    match kind {
        StorageKind::Memory => {
            if let Some(path) = database_path {
                tracing::warn!("⚠️ Memory storage ignores database path {}", path);
            }
            Ok(Arc::new(MemoryStorage::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageKind::SQLite => {
            let storage = match database_path {
                Some(path) => SQLiteStorage::new_with_path(&std::path::PathBuf::from(path)).await?,
                None => <SQLiteStorage as StorageBackend>::new().await.map_err(|e| {
                    Error::Storage(format!("{} ({})", SQLiteStorage::get_error_message(), e))
                })?,
            };
            Ok(Arc::new(storage))
        }
    }
}

pub mod prelude {
    pub use super::{create_storage, StorageBackend, StorageKind};
    pub use super::backends::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_kind_parsing() {
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!("MEMORY".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert!("qdrant".parse::<StorageKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage(StorageKind::Memory, None).await.unwrap();
        assert!(storage.recent_briefings("default", 10).await.unwrap().is_empty());
    }
}
