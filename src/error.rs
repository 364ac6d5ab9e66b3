//! Error Types
//!
//! One enum per layer. Only `CatalogError` and `DraftError` ever reach UI code.

use std::fmt;

/// Durable cache store failures. Callers treat these as cache misses.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No storage engine (private browsing, no window, disabled quota)
    Unavailable(String),
    Serialization(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Storage serialization error: {}", msg),
            StoreError::Backend(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Remote API failures
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Network(String),
    Status(u16, String),
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Status(code, msg) => write!(f, "Server returned {}: {}", code, msg),
            ApiError::Decode(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::Status(status.as_u16(), e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Catalog errors surfaced to the view. Only raised when no cached data exists.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Offline and nothing cached
    OfflineNoData,
    /// Initial load failed and nothing cached
    Sync(ApiError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::OfflineNoData => write!(f, "You are offline and no catalog is cached yet"),
            CatalogError::Sync(e) => write!(f, "Failed to load catalog: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Draft save errors. The draft stays intact so the user can retry.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftError {
    SaveFailed(ApiError),
    SaveInProgress,
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::SaveFailed(e) => write!(f, "Failed to save ranking: {}", e),
            DraftError::SaveInProgress => write!(f, "A save is already in progress"),
        }
    }
}

impl std::error::Error for DraftError {}

pub type DraftResult<T> = Result<T, DraftError>;
