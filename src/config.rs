//! Cache Configuration
//!
//! Storage keys and timings. Every field has a default so a partial JSON
//! document (or none at all) is enough.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Quiet period before a draft edit is written to storage
    pub debounce_ms: u64,
    pub catalog_key: String,
    pub catalog_version_key: String,
    /// Draft keys are `{draft_key_prefix}{ranking_id}`
    pub draft_key_prefix: String,
    /// Prefix applied by storage backends that share a global keyspace
    pub storage_namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            catalog_key: "catalog".to_string(),
            catalog_version_key: "catalog_version".to_string(),
            draft_key_prefix: "ranking_draft_".to_string(),
            storage_namespace: "tierdex".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid cache config: {}", e))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn draft_key(&self, ranking_id: &str) -> String {
        format!("{}{}", self.draft_key_prefix, ranking_id)
    }
}

/// Remote API location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// e.g. `https://tierdex.app/api`, no trailing slash required
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CacheConfig::from_json(r#"{"debounce_ms": 50}"#).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert_eq!(config.catalog_key, "catalog");
        assert_eq!(config.draft_key("r1"), "ranking_draft_r1");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(CacheConfig::from_json(r#"{"debounce_ms": "soon"}"#).is_err());
    }
}
