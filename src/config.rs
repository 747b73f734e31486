use crate::batch::BatchOptions;
use crate::catalog::loader::DEFAULT_PAGE_SIZE;
use crate::catalog::LoaderConfig;
use crate::parser::HeuristicRules;
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Sqlite {
        path: String,
        #[serde(default = "default_table")]
        table: String,
    },
    Rest {
        base_url: String,
        api_key: String,
        #[serde(default = "default_table")]
        table: String,
    },
    Json {
        path: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    pub page_size: usize,
    pub expected_min_brands: usize,
    pub page_timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub max_pages: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        let defaults = LoaderConfig::default();
        Self {
            page_size: defaults.page_size,
            expected_min_brands: defaults.expected_min_brands,
            page_timeout_ms: defaults.page_timeout.as_millis() as u64,
            max_retries: defaults.max_retries,
            backoff_base_ms: defaults.backoff_base.as_millis() as u64,
            max_pages: defaults.max_pages,
        }
    }
}

impl LoaderSettings {
    /// The page size is capped at what the catalog store serves per request,
    /// since a larger limit would come back short and end the load early.
    pub fn to_loader_config(&self) -> LoaderConfig {
        let page_size = self.page_size.clamp(1, DEFAULT_PAGE_SIZE);
        if page_size != self.page_size {
            warn!(
                "loader.page_size {} out of range, using {}",
                self.page_size, page_size
            );
        }
        LoaderConfig {
            page_size,
            expected_min_brands: self.expected_min_brands,
            page_timeout: Duration::from_millis(self.page_timeout_ms),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            max_pages: self.max_pages,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub loader: LoaderSettings,
    #[serde(default)]
    pub heuristics: HeuristicRules,
    #[serde(default = "default_listings_db")]
    pub listings_db: String,
    #[serde(default)]
    pub reparse_all: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Seconds between batch runs; 0 runs once and exits.
    #[serde(default)]
    pub check_interval_seconds: u64,
    /// Seconds between background catalog reloads; 0 disables them.
    #[serde(default)]
    pub reload_interval_seconds: u64,
    /// Brands the audit expects to find in the catalog.
    #[serde(default)]
    pub expected_brands: Vec<String>,
}

impl AppConfig {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            reparse_all: self.reparse_all,
            concurrency: self.concurrency,
        }
    }
}

fn default_table() -> String {
    crate::source::sqlite::DEFAULT_TABLE.to_string()
}

fn default_listings_db() -> String {
    "listings.db".to_string()
}

fn default_concurrency() -> usize {
    4
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"source": {"kind": "sqlite", "path": "catalog.db"}}"#).unwrap();
        match &config.source {
            SourceConfig::Sqlite { path, table } => {
                assert_eq!(path, "catalog.db");
                assert_eq!(table, "marcas_modelos_validos");
            }
            other => panic!("unexpected source {other:?}"),
        }
        let loader = config.loader.to_loader_config();
        assert_eq!(loader.page_size, 1000);
        assert_eq!(loader.max_retries, 3);
        assert!(config.heuristics.pair_numeric_model);
        assert_eq!(config.check_interval_seconds, 0);
        assert_eq!(config.batch_options().concurrency, 4);
    }

    #[test]
    fn full_config() {
        let json = r#"{
            "source": {"kind": "rest", "base_url": "https://x.supabase.co", "api_key": "k"},
            "loader": {"page_size": 500, "expected_min_brands": 60, "page_timeout_ms": 2000},
            "heuristics": {"pair_lead_words": ["Model", "Serie"]},
            "listings_db": "data.db",
            "reparse_all": true,
            "concurrency": 8,
            "check_interval_seconds": 600,
            "reload_interval_seconds": 3600,
            "expected_brands": ["BMW", "SEAT"]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let loader = config.loader.to_loader_config();
        assert_eq!(loader.page_size, 500);
        assert_eq!(loader.expected_min_brands, 60);
        assert_eq!(loader.page_timeout, Duration::from_secs(2));
        assert_eq!(loader.max_retries, 3);
        assert_eq!(config.heuristics.pair_lead_words, vec!["Model", "Serie"]);
        assert!(config.reparse_all);
        assert_eq!(config.expected_brands.len(), 2);
    }

    #[test]
    fn page_size_is_capped_at_server_limit() {
        let json = r#"{
            "source": {"kind": "json", "path": "catalog.json"},
            "loader": {"page_size": 5000}
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.loader.to_loader_config().page_size, DEFAULT_PAGE_SIZE);

        let zero = LoaderSettings {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(zero.to_loader_config().page_size, 1);
    }
}
