use marca_matcher::batch::reparse_listings;
use marca_matcher::catalog::audit::{brand_summary, check_brands, suspicious_entries};
use marca_matcher::catalog::{Catalog, CatalogHandle, LoaderConfig};
use marca_matcher::config::{load_config, AppConfig, SourceConfig};
use marca_matcher::model::SourceError;
use marca_matcher::source::{CatalogSource, MemorySource, RestSource, SqliteSource};
use marca_matcher::storage::ListingStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let source: Arc<dyn CatalogSource> = match build_source(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize catalog source: {}", e);
            return;
        }
    };
    let loader_config = config.loader.to_loader_config();

    let handle = Arc::new(CatalogHandle::new(config.heuristics.clone()));
    match handle.ensure_loaded(source.as_ref(), &loader_config).await {
        Ok(catalog) => log_audit(&catalog, &config.expected_brands),
        Err(e) => {
            error!("Initial catalog load failed: {}", e);
            return;
        }
    }

    let store = match ListingStore::new(&config.listings_db) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize listing store: {:?}", e);
            return;
        }
    };

    if config.reload_interval_seconds > 0 {
        spawn_reloader(
            handle.clone(),
            source.clone(),
            loader_config.clone(),
            Duration::from_secs(config.reload_interval_seconds),
        );
    }

    let options = config.batch_options();
    loop {
        info!("Re-parsing listings...");
        match reparse_listings(&handle, store.clone(), &options).await {
            Ok(report) => info!(
                "Batch done: {} parsed, {} skipped",
                report.parsed,
                report.skipped.len()
            ),
            Err(e) => {
                error!("Batch aborted: {}", e);
                return;
            }
        }

        if config.check_interval_seconds == 0 {
            break;
        }
        info!("Waiting {}s before next batch...", config.check_interval_seconds);
        sleep(Duration::from_secs(config.check_interval_seconds)).await;
    }
}

fn build_source(config: &AppConfig) -> Result<Arc<dyn CatalogSource>, SourceError> {
    let timeout = Duration::from_millis(config.loader.page_timeout_ms);
    let source: Arc<dyn CatalogSource> = match &config.source {
        SourceConfig::Sqlite { path, table } => Arc::new(SqliteSource::open(path, table)?),
        SourceConfig::Rest {
            base_url,
            api_key,
            table,
        } => Arc::new(RestSource::new(base_url, api_key, table, timeout)?),
        SourceConfig::Json { path } => Arc::new(MemorySource::from_json_file(path)?),
    };
    Ok(source)
}

/// Reloads the catalog on a timer. A failed reload keeps serving the old one.
fn spawn_reloader(
    handle: Arc<CatalogHandle>,
    source: Arc<dyn CatalogSource>,
    loader_config: LoaderConfig,
    every: Duration,
) {
    tokio::spawn(async move {
        loop {
            sleep(every).await;
            info!("Reloading catalog...");
            if let Err(e) = handle.reload(source.as_ref(), &loader_config).await {
                warn!("Catalog reload failed: {}", e);
            }
        }
    });
}

fn log_audit(catalog: &Catalog, expected_brands: &[String]) {
    for brand in brand_summary(catalog) {
        info!("Brand '{}' ({}): {} models", brand.display, brand.key, brand.models);
    }
    for presence in check_brands(catalog, expected_brands) {
        if !presence.present {
            warn!("Expected brand '{}' ({}) missing from catalog", presence.name, presence.key);
        }
    }
    for suspicious in suspicious_entries(catalog) {
        warn!(
            "Suspicious catalog entry {:?}: {} / {}",
            suspicious.kind, suspicious.entry.brand, suspicious.entry.model
        );
    }
}
