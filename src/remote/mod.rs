//! Remote API
//!
//! The three server endpoints this crate depends on, behind a trait so the
//! state holders can run against a scripted implementation in tests.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::models::{Item, ItemId};

pub use http::HttpRankingApi;

/// Result of the cheap change-detection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    pub has_changes: bool,
    pub current_version: i64,
}

#[async_trait(?Send)]
pub trait RankingApi {
    /// Full catalog download
    async fn fetch_catalog(&self) -> ApiResult<Vec<Item>>;

    /// Compare `known_version` against the server's current catalog version
    async fn check_catalog_version(&self, known_version: Option<i64>) -> ApiResult<VersionCheck>;

    /// Persist a reordered ranking
    async fn commit_ranking(&self, ranking_id: &str, item_ids: &[ItemId]) -> ApiResult<()>;
}
