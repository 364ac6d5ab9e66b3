//! In-memory store
//!
//! Backs native builds and tests. `set_available(false)` makes every call
//! fail the way a missing browser storage engine does.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;

use super::{CacheStore, StoredBlob};
use crate::error::{StoreError, StoreResult};

pub struct MemoryStore {
    entries: RefCell<HashMap<String, StoredBlob>>,
    available: Cell<bool>,
    writes: Cell<usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            available: Cell::new(true),
            writes: Cell::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Number of successful `set`/`replace` calls
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.get() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store disabled".to_string()))
        }
    }
}

#[async_trait(?Send)]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        self.check()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, blob: StoredBlob) -> StoreResult<()> {
        self.check()?;
        self.entries.borrow_mut().insert(key.to_string(), blob);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    async fn replace(&self, entries: Vec<(String, StoredBlob)>) -> StoreResult<()> {
        self.check()?;
        let mut map = self.entries.borrow_mut();
        for (key, blob) in entries {
            map.insert(key, blob);
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
