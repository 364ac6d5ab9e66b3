//! Client Wiring
//!
//! Builds the shared store, API and network status once and hands them to
//! the catalog sync and to every draft manager opened afterwards.

use std::rc::Rc;

use crate::catalog::CatalogSync;
use crate::config::CacheConfig;
use crate::draft::DraftManager;
use crate::models::Ranking;
use crate::network::NetworkStatus;
use crate::observable::Subscription;
use crate::remote::RankingApi;
use crate::store::CacheStore;

pub struct TierdexClient {
    store: Rc<dyn CacheStore>,
    api: Rc<dyn RankingApi>,
    network: NetworkStatus,
    config: CacheConfig,
    catalog: CatalogSync,
    _network_watch: Subscription,
}

impl TierdexClient {
    pub fn new(store: Rc<dyn CacheStore>, api: Rc<dyn RankingApi>, network: NetworkStatus, config: CacheConfig) -> Self {
        let catalog = CatalogSync::new(store.clone(), api.clone(), network.clone(), config.clone());
        let network_watch = catalog.watch_network();
        Self {
            store,
            api,
            network,
            config,
            catalog,
            _network_watch: network_watch,
        }
    }

    /// localStorage + HTTP API + browser connectivity events. Falls back to
    /// an in-memory store when the browser refuses storage access.
    #[cfg(target_arch = "wasm32")]
    pub fn for_browser(api: crate::config::ApiConfig, config: CacheConfig) -> Result<Self, String> {
        use crate::remote::HttpRankingApi;
        use crate::store::{LocalStorageStore, MemoryStore};

        let store: Rc<dyn CacheStore> = match LocalStorageStore::open(&config.storage_namespace) {
            Ok(store) => Rc::new(store),
            Err(e) => {
                log::warn!("Durable storage unavailable, caching in memory only: {}", e);
                Rc::new(MemoryStore::new())
            }
        };
        let api = HttpRankingApi::new(api).map_err(|e| e.to_string())?;
        Ok(Self::new(store, Rc::new(api), NetworkStatus::from_browser(), config))
    }

    pub fn catalog(&self) -> &CatalogSync {
        &self.catalog
    }

    pub fn network(&self) -> &NetworkStatus {
        &self.network
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub async fn start(&self) {
        self.catalog.start().await;
    }

    /// Draft manager for `ranking`, resolving draft ids against the catalog
    /// snapshot currently held
    pub async fn open_ranking(&self, ranking: Ranking) -> DraftManager {
        let lookup = self.catalog.snapshot().lookup();
        DraftManager::load(ranking, Some(&lookup), self.store.clone(), self.api.clone(), &self.config).await
    }
}
