//! Durable Cache Store
//!
//! Key -> versioned blob storage. Pure storage primitive: no business logic,
//! and every failure is reported so callers can downgrade it to a miss.
//! Implementations can use browser localStorage, in-memory, etc.

mod memory;
#[cfg(target_arch = "wasm32")]
mod local_storage;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;
use crate::runtime;

pub use memory::MemoryStore;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

/// Envelope stored under each key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub data: Value,
    #[serde(default)]
    pub version: Option<i64>,
    pub updated_at: i64,
}

impl StoredBlob {
    pub fn new(data: Value, version: Option<i64>) -> Self {
        Self {
            data,
            version,
            updated_at: runtime::now_millis(),
        }
    }

    pub fn from_serializable<T: Serialize>(value: &T, version: Option<i64>) -> StoreResult<Self> {
        Ok(Self::new(serde_json::to_value(value)?, version))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Core storage trait
///
/// Every call is its own transaction. Single-threaded runtime, so no `Send`.
#[async_trait(?Send)]
pub trait CacheStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>>;

    async fn set(&self, key: &str, blob: StoredBlob) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Write several keys in one transaction; readers see all or none.
    async fn replace(&self, entries: Vec<(String, StoredBlob)>) -> StoreResult<()>;
}

/// Read and decode a typed value
pub async fn get_json<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(blob) => blob.decode().map(Some),
        None => Ok(None),
    }
}

/// Encode and write a typed value
pub async fn set_json<T: Serialize>(store: &dyn CacheStore, key: &str, value: &T) -> StoreResult<()> {
    store.set(key, StoredBlob::from_serializable(value, None)?).await
}
