//! Test doubles: a scripted `RankingApi` and a store with slow writes.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ApiError, ApiResult, StoreResult};
use crate::models::{Item, ItemId};
use crate::remote::{RankingApi, VersionCheck};
use crate::runtime;
use crate::store::{CacheStore, MemoryStore, StoredBlob};

#[derive(Default)]
pub struct FakeApi {
    pub catalog: RefCell<Vec<Item>>,
    pub version: Cell<i64>,
    pub fail_check: Cell<bool>,
    pub fail_fetch: Cell<bool>,
    pub fail_commit: Cell<bool>,
    /// Suspend every call this long before answering
    pub latency: Cell<Option<Duration>>,
    pub check_calls: Cell<usize>,
    pub fetch_calls: Cell<usize>,
    pub commits: RefCell<Vec<(String, Vec<ItemId>)>>,
}

impl FakeApi {
    pub fn with_catalog(version: i64, items: Vec<Item>) -> Self {
        let api = Self::default();
        api.version.set(version);
        *api.catalog.borrow_mut() = items;
        api
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency.get() {
            runtime::sleep(latency).await;
        }
    }
}

#[async_trait(?Send)]
impl RankingApi for FakeApi {
    async fn fetch_catalog(&self) -> ApiResult<Vec<Item>> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        self.wait().await;
        if self.fail_fetch.get() {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        Ok(self.catalog.borrow().clone())
    }

    async fn check_catalog_version(&self, known_version: Option<i64>) -> ApiResult<VersionCheck> {
        self.check_calls.set(self.check_calls.get() + 1);
        self.wait().await;
        if self.fail_check.get() {
            return Err(ApiError::Status(503, "unavailable".to_string()));
        }
        let current = self.version.get();
        Ok(VersionCheck {
            has_changes: known_version != Some(current),
            current_version: current,
        })
    }

    async fn commit_ranking(&self, ranking_id: &str, item_ids: &[ItemId]) -> ApiResult<()> {
        self.wait().await;
        if self.fail_commit.get() {
            return Err(ApiError::Status(500, "boom".to_string()));
        }
        self.commits.borrow_mut().push((ranking_id.to_string(), item_ids.to_vec()));
        Ok(())
    }
}

/// `MemoryStore` whose writes suspend for `delay` before landing
pub struct SlowStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }
}

#[async_trait(?Send)]
impl CacheStore for SlowStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredBlob>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, blob: StoredBlob) -> StoreResult<()> {
        runtime::sleep(self.delay).await;
        self.inner.set(key, blob).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn replace(&self, entries: Vec<(String, StoredBlob)>) -> StoreResult<()> {
        runtime::sleep(self.delay).await;
        self.inner.replace(entries).await
    }
}

pub fn items(ids: &[&str]) -> Vec<Item> {
    ids.iter().map(|id| Item::new(*id, id.to_uppercase())).collect()
}
