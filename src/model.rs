// Core structs: CatalogRow, CatalogEntry, ParsedTitle, Listing and error types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A scraped listing waiting for (or holding) a parsed title.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: String,
    pub source: String,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
}

/// One row as returned by a catalog source page. Sources map their native
/// record shape into this pair and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "modelo")]
    pub model: String,
}

impl CatalogRow {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
        }
    }
}

/// A known (brand, model) pair with its normalized matching keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub brand: String,
    pub model: String,
    pub brand_key: String,
    pub model_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseMethod {
    DbExact,
    DbBrandOnly,
    Heuristic,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::DbExact => "DB_EXACT",
            ParseMethod::DbBrandOnly => "DB_BRAND_ONLY",
            ParseMethod::Heuristic => "HEURISTIC",
        }
    }
}

impl std::str::FromStr for ParseMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DB_EXACT" => Ok(ParseMethod::DbExact),
            "DB_BRAND_ONLY" => Ok(ParseMethod::DbBrandOnly),
            "HEURISTIC" => Ok(ParseMethod::Heuristic),
            other => Err(format!("unknown parse method: {other}")),
        }
    }
}

impl std::fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence attached to each matching tier.
pub const CONFIDENCE_EXACT: f64 = 1.0;
pub const CONFIDENCE_BRAND_ONLY: f64 = 0.7;
pub const CONFIDENCE_HEURISTIC: f64 = 0.5;

/// Result of parsing one listing title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTitle {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub version: Option<String>,
    pub confidence: f64,
    pub method: ParseMethod,
}

impl ParsedTitle {
    pub fn empty() -> Self {
        Self {
            brand: None,
            model: None,
            version: None,
            confidence: 0.0,
            method: ParseMethod::Heuristic,
        }
    }
}

/// Errors reported by a catalog source for a single page request.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unreachable: {0}")]
    Unreachable(String),
    #[error("page request timed out")]
    Timeout,
    #[error("malformed page: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether retrying the same page may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Unreachable(_) | SourceError::Timeout)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_decode() {
            SourceError::Malformed(e.to_string())
        } else {
            SourceError::Unreachable(e.to_string())
        }
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => SourceError::Malformed(e.to_string()),
            other => SourceError::Unreachable(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog source failed at offset {offset} after {attempts} attempt(s): {source}")]
    DataSource {
        offset: usize,
        attempts: u32,
        #[source]
        source: SourceError,
    },
    #[error("catalog has not been loaded")]
    NotInitialized,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("parse worker failed: {0}")]
    Worker(String),
}
