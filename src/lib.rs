//! Tierdex Client Core
//!
//! Offline-first catalog cache, per-ranking drafts, tier zone grouping and
//! search for the Tierdex web client. State holders are framework-free;
//! `hooks` binds them to Leptos signals.

pub mod catalog;
pub mod client;
pub mod config;
pub mod debounce;
pub mod draft;
pub mod error;
#[cfg(feature = "leptos")]
pub mod hooks;
pub mod models;
pub mod network;
pub mod observable;
pub mod remote;
pub mod runtime;
pub mod search;
pub mod store;
pub mod zones;

#[cfg(test)]
mod testing;

pub use catalog::{CatalogState, CatalogSync, SyncPhase};
pub use client::TierdexClient;
pub use config::{ApiConfig, CacheConfig};
pub use draft::{DraftManager, DraftState};
pub use error::{ApiError, CatalogError, DraftError, StoreError};
pub use leptos_dragdrop::DropTarget;
pub use models::{Catalog, Item, ItemId, ItemLookup, Ranking, StoredDraft, Zone};
pub use network::NetworkStatus;
pub use observable::{Observable, Subscription};
pub use remote::{HttpRankingApi, RankingApi, VersionCheck};
pub use search::{resolve_scroll_target, search, ScrollTarget, SearchResult, ZoneTag};
pub use store::{CacheStore, MemoryStore, StoredBlob};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;
pub use zones::{build_virtual_rows, group_by_zones, zone_for_position, VirtualRow, ZoneGroup};

/// Lines kept in the in-memory log buffer
const LOG_CAPACITY: usize = 500;

/// Panic hook plus logger. Call once at startup.
pub fn init(app_name: &str) -> Result<(), String> {
    console_error_panic_hook::set_once();
    rolling_logger::init_logger(app_name, LOG_CAPACITY)
}

/// Recent log lines, for attaching to bug reports
pub fn recent_logs() -> Vec<String> {
    rolling_logger::recent_lines()
}
