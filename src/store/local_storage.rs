//! Browser localStorage backend
//!
//! localStorage is synchronous, so a multi-key `replace` runs without
//! yielding to the event loop and no other task can observe it half done.
//! A failed write (quota) rolls the earlier keys of the batch back.

use async_trait::async_trait;
use wasm_bindgen::JsValue;

use super::{CacheStore, StoredBlob};
use crate::error::{StoreError, StoreResult};

pub struct LocalStorageStore {
    storage: web_sys::Storage,
    namespace: String,
}

fn js_err(e: JsValue) -> StoreError {
    StoreError::Backend(format!("{:?}", e))
}

impl LocalStorageStore {
    /// Open the window's localStorage. Fails in private browsing modes that
    /// refuse storage access.
    pub fn open(namespace: &str) -> StoreResult<Self> {
        let window = web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))?;
        Ok(Self {
            storage,
            namespace: namespace.to_string(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        self.storage.get_item(&self.full_key(key)).map_err(js_err)
    }

    fn write(&self, key: &str, raw: &str) -> StoreResult<()> {
        self.storage.set_item(&self.full_key(key), raw).map_err(js_err)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.storage.remove_item(&self.full_key(key)).map_err(js_err)
    }
}

#[async_trait(?Send)]
impl CacheStore for LocalStorageStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        match self.read(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, blob: StoredBlob) -> StoreResult<()> {
        let raw = serde_json::to_string(&blob)?;
        self.write(key, &raw)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.remove(key)
    }

    async fn replace(&self, entries: Vec<(String, StoredBlob)>) -> StoreResult<()> {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, blob) in &entries {
            encoded.push((key.as_str(), serde_json::to_string(blob)?));
        }

        let mut previous = Vec::with_capacity(encoded.len());
        for (key, raw) in &encoded {
            previous.push((*key, self.read(key)?));
            if let Err(e) = self.write(key, raw) {
                for (old_key, old_raw) in previous.iter().rev() {
                    let _ = match old_raw {
                        Some(old) => self.write(old_key, old),
                        None => self.remove(old_key),
                    };
                }
                return Err(e);
            }
        }
        Ok(())
    }
}
