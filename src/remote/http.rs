//! HTTP implementation of `RankingApi`
//!
//! `GET  {base}/catalog`
//! `GET  {base}/catalog/version?known={n}`
//! `PUT  {base}/rankings/{id}` with `{"itemIds": [...]}`

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

use super::{RankingApi, VersionCheck};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{Item, ItemId};

#[derive(Serialize)]
struct CommitRankingArgs<'a> {
    #[serde(rename = "itemIds")]
    item_ids: &'a [ItemId],
}

pub struct HttpRankingApi {
    config: ApiConfig,
    client: reqwest::Client,
}

impl HttpRankingApi {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status(status.as_u16(), body))
    }
}

#[async_trait(?Send)]
impl RankingApi for HttpRankingApi {
    async fn fetch_catalog(&self) -> ApiResult<Vec<Item>> {
        let response = self.send(self.client.get(self.url("catalog"))).await?;
        response.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn check_catalog_version(&self, known_version: Option<i64>) -> ApiResult<VersionCheck> {
        let mut request = self.client.get(self.url("catalog/version"));
        if let Some(known) = known_version {
            request = request.query(&[("known", known)]);
        }
        let response = self.send(request).await?;
        response.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn commit_ranking(&self, ranking_id: &str, item_ids: &[ItemId]) -> ApiResult<()> {
        let id = utf8_percent_encode(ranking_id, NON_ALPHANUMERIC).to_string();
        let request = self
            .client
            .put(self.url(&format!("rankings/{}", id)))
            .json(&CommitRankingArgs { item_ids });
        self.send(request).await?;
        Ok(())
    }
}
