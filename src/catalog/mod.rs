//! Offline Catalog Sync
//!
//! Serves the cached catalog immediately, then asks the server whether the
//! cached version is still current before paying for a full download.
//!
//! Phases: `Uninitialized -> ServingCached -> Refreshing -> ServingFresh`.
//! Errors only reach the view when there is nothing cached to show.

use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use serde_json::json;

use crate::config::CacheConfig;
use crate::error::{ApiResult, CatalogError};
use crate::models::{Item, ItemLookup};
use crate::network::NetworkStatus;
use crate::observable::{Observable, Subscription};
use crate::remote::RankingApi;
use crate::runtime;
use crate::store::{CacheStore, StoredBlob};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Uninitialized,
    ServingCached,
    Refreshing,
    ServingFresh,
}

/// Snapshot handed to the view
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogState {
    /// `None` = not loaded yet; `Some(empty)` = loaded, empty catalog
    pub items: Option<Arc<Vec<Item>>>,
    pub version: Option<i64>,
    pub is_loading: bool,
    pub error: Option<CatalogError>,
    pub phase: SyncPhase,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            items: None,
            version: None,
            is_loading: false,
            error: None,
            phase: SyncPhase::Uninitialized,
        }
    }
}

impl CatalogState {
    /// Id -> item map, empty when nothing is loaded
    pub fn lookup(&self) -> ItemLookup {
        self.items
            .iter()
            .flat_map(|items| items.iter())
            .map(|item| (item.id.clone(), item.clone()))
            .collect()
    }
}

/// Clears the in-flight flag when the sync sequence ends, however it ends
struct FlightGuard<'a>(&'a Cell<bool>);

impl<'a> FlightGuard<'a> {
    fn begin(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

struct Cached {
    version: Option<i64>,
    items: Vec<Item>,
}

#[derive(Clone)]
pub struct CatalogSync {
    inner: Rc<Inner>,
}

struct Inner {
    store: Rc<dyn CacheStore>,
    api: Rc<dyn RankingApi>,
    network: NetworkStatus,
    config: CacheConfig,
    state: Rc<Observable<CatalogState>>,
    in_flight: Cell<bool>,
    /// A trigger arrived while a sync was in flight
    rerun: Cell<bool>,
}

impl CatalogSync {
    pub fn new(store: Rc<dyn CacheStore>, api: Rc<dyn RankingApi>, network: NetworkStatus, config: CacheConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                store,
                api,
                network,
                config,
                state: Observable::new(CatalogState::default()),
                in_flight: Cell::new(false),
                rerun: Cell::new(false),
            }),
        }
    }

    /// Current `{items, is_loading, error}` view of the catalog
    pub fn snapshot(&self) -> CatalogState {
        self.inner.state.get()
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.state.with(|s| s.phase)
    }

    pub fn subscribe(&self, listener: impl Fn(&CatalogState) + 'static) -> Subscription {
        self.inner.state.subscribe(listener)
    }

    /// Initial load: cache first, then version check, then fetch if needed
    pub async fn start(&self) {
        let inner = &self.inner;
        let Some(flight) = FlightGuard::begin(&inner.in_flight) else {
            self.queue_rerun("start");
            return;
        };
        inner.initial_load().await;
        drop(flight);
        self.run_queued();
    }

    /// Best-effort background refresh. Never shows a loading state and
    /// never surfaces an error. While another sync runs, the refresh is
    /// queued and runs once that sync ends.
    pub async fn refresh(&self) {
        let inner = &self.inner;
        let Some(flight) = FlightGuard::begin(&inner.in_flight) else {
            self.queue_rerun("refresh");
            return;
        };
        inner.silent_refresh().await;
        drop(flight);
        self.run_queued();
    }

    fn queue_rerun(&self, trigger: &str) {
        log::debug!("Catalog sync in flight, queueing {}", trigger);
        self.inner.rerun.set(true);
    }

    // Any number of overlapping triggers collapse into one follow-up refresh.
    fn run_queued(&self) {
        if self.inner.rerun.replace(false) {
            let sync = self.clone();
            runtime::spawn_local(async move {
                sync.refresh().await;
            });
        }
    }

    /// Refresh silently on every offline -> online transition
    pub fn watch_network(&self) -> Subscription {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let was_online = Cell::new(self.inner.network.is_online());
        self.inner.network.subscribe(move |online| {
            let reconnected = *online && !was_online.get();
            was_online.set(*online);
            if !reconnected {
                return;
            }
            let Some(inner) = weak.upgrade() else { return };
            log::info!("Back online, refreshing catalog");
            runtime::spawn_local(async move {
                CatalogSync { inner }.refresh().await;
            });
        })
    }

    /// Forget the cached catalog; the in-memory snapshot stays as is
    pub async fn clear_cache(&self) {
        let config = &self.inner.config;
        for key in [&config.catalog_key, &config.catalog_version_key] {
            if let Err(e) = self.inner.store.delete(key).await {
                log::warn!("Failed to clear {}: {}", key, e);
            }
        }
    }
}

impl Inner {
    async fn initial_load(&self) {
        self.state.update(|s| s.is_loading = true);

        let cached = self.read_cache().await;
        let has_cache = cached.is_some();
        let known_version = cached.as_ref().and_then(|c| c.version);
        if let Some(cached) = cached {
            log::info!("Serving cached catalog v{:?} ({} items)", cached.version, cached.items.len());
            self.publish(cached.version, cached.items, SyncPhase::ServingCached);
        }

        if !self.network.is_online() {
            if !has_cache {
                log::warn!("Offline with no cached catalog");
                self.state.update(|s| {
                    s.error = Some(CatalogError::OfflineNoData);
                    s.is_loading = false;
                });
            }
            return;
        }

        match self.reconcile(known_version, has_cache).await {
            Ok(_) => {}
            Err(e) if has_cache => {
                log::warn!("Catalog sync failed, keeping cached v{:?}: {}", known_version, e);
            }
            Err(e) => {
                log::error!("Catalog load failed with no cache: {}", e);
                self.state.update(|s| {
                    s.error = Some(CatalogError::Sync(e));
                    s.is_loading = false;
                });
            }
        }
    }

    async fn silent_refresh(&self) {
        if !self.network.is_online() {
            return;
        }
        let (known_version, has_cache) = self.state.with(|s| (s.version, s.items.is_some()));
        if let Err(e) = self.reconcile(known_version, has_cache).await {
            log::warn!("Background catalog refresh failed: {}", e);
        }
    }

    /// Version check, then fetch + atomic cache replace.
    /// Returns whether a fresh catalog was published.
    async fn reconcile(&self, known_version: Option<i64>, has_cache: bool) -> ApiResult<bool> {
        let check = self.api.check_catalog_version(known_version).await?;
        if has_cache && !check.has_changes {
            log::debug!("Cached catalog v{} is current", check.current_version);
            return Ok(false);
        }

        let previous = self.state.with(|s| s.phase);
        self.state.update(|s| s.phase = SyncPhase::Refreshing);
        let items = match self.api.fetch_catalog().await {
            Ok(items) => items,
            Err(e) => {
                self.state.update(|s| s.phase = previous);
                return Err(e);
            }
        };

        log::info!("Fetched catalog v{} ({} items)", check.current_version, items.len());
        self.write_cache(check.current_version, &items).await;
        self.publish(Some(check.current_version), items, SyncPhase::ServingFresh);
        Ok(true)
    }

    fn publish(&self, version: Option<i64>, items: Vec<Item>, phase: SyncPhase) {
        let items = Arc::new(items);
        self.state.update(|s| {
            s.items = Some(items);
            s.version = version;
            s.phase = phase;
            s.is_loading = false;
            s.error = None;
        });
    }

    async fn read_cache(&self) -> Option<Cached> {
        let blob = match self.store.get(&self.config.catalog_key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                log::debug!("Catalog cache miss");
                return None;
            }
            Err(e) => {
                log::warn!("Catalog cache unreadable, treating as miss: {}", e);
                return None;
            }
        };
        let items: Vec<Item> = match blob.decode() {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Cached catalog is corrupt, ignoring: {}", e);
                return None;
            }
        };
        // The catalog blob carries its own version; the separate key is a fallback.
        let version = match blob.version {
            Some(version) => Some(version),
            None => self.read_version_key().await,
        };
        Some(Cached { version, items })
    }

    async fn read_version_key(&self) -> Option<i64> {
        match self.store.get(&self.config.catalog_version_key).await {
            Ok(Some(blob)) => blob.decode().ok(),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Catalog version unreadable: {}", e);
                None
            }
        }
    }

    async fn write_cache(&self, version: i64, items: &[Item]) {
        let blob = match StoredBlob::from_serializable(&items, Some(version)) {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("Failed to encode catalog v{}: {}", version, e);
                return;
            }
        };
        let entries = vec![
            (self.config.catalog_key.clone(), blob),
            (
                self.config.catalog_version_key.clone(),
                StoredBlob::new(json!(version), Some(version)),
            ),
        ];
        if let Err(e) = self.store.replace(entries).await {
            log::warn!("Failed to cache catalog v{}: {}", version, e);
        }
    }
}
