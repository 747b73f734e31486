use crate::catalog::{load, Catalog, LoaderConfig};
use crate::model::{CatalogError, ParsedTitle};
use crate::parser::{HeuristicRules, TitleParser};
use crate::source::CatalogSource;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Owner of the published catalog.
///
/// Readers grab the current `Arc<Catalog>` without locking. Loads through the
/// same handle run one at a time; a failed reload leaves the previous catalog
/// in place.
pub struct CatalogHandle {
    current: ArcSwapOption<Catalog>,
    generation: AtomicU64,
    load_lock: Mutex<()>,
    parser: TitleParser,
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(HeuristicRules::default())
    }
}

impl CatalogHandle {
    pub fn new(rules: HeuristicRules) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            load_lock: Mutex::new(()),
            parser: TitleParser::new(rules),
        }
    }

    /// Wraps an already built catalog.
    pub fn from_catalog(catalog: Catalog, rules: HeuristicRules) -> Self {
        let handle = Self::new(rules);
        handle.publish(catalog);
        handle
    }

    /// Number of catalogs published so far. Zero means never loaded.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Result<Arc<Catalog>, CatalogError> {
        self.current.load_full().ok_or(CatalogError::NotInitialized)
    }

    pub fn parser(&self) -> &TitleParser {
        &self.parser
    }

    pub fn parse(&self, title: &str) -> Result<ParsedTitle, CatalogError> {
        let catalog = self.current()?;
        Ok(self.parser.parse(title, &catalog))
    }

    /// Loads the catalog unless one is already published.
    pub async fn ensure_loaded<S>(&self, source: &S, config: &LoaderConfig) -> Result<Arc<Catalog>, CatalogError>
    where
        S: CatalogSource + ?Sized,
    {
        if let Ok(catalog) = self.current() {
            return Ok(catalog);
        }

        let _guard = self.load_lock.lock().await;
        if let Ok(catalog) = self.current() {
            return Ok(catalog);
        }
        self.load_and_publish(source, config).await
    }

    /// Rebuilds the catalog from the source and publishes it. Callers that
    /// were waiting behind a reload that completed get that result instead
    /// of fetching again.
    pub async fn reload<S>(&self, source: &S, config: &LoaderConfig) -> Result<Arc<Catalog>, CatalogError>
    where
        S: CatalogSource + ?Sized,
    {
        let requested_at = self.generation();
        let _guard = self.load_lock.lock().await;

        if self.generation() != requested_at {
            if let Ok(catalog) = self.current() {
                info!("Catalog reload already completed by a concurrent caller");
                return Ok(catalog);
            }
        }
        self.load_and_publish(source, config).await
    }

    async fn load_and_publish<S>(&self, source: &S, config: &LoaderConfig) -> Result<Arc<Catalog>, CatalogError>
    where
        S: CatalogSource + ?Sized,
    {
        match load(source, config).await {
            Ok(catalog) => Ok(self.publish(catalog)),
            Err(e) => {
                if self.current.load().is_some() {
                    warn!("Catalog reload failed, keeping previous catalog: {}", e);
                }
                Err(e)
            }
        }
    }

    fn publish(&self, catalog: Catalog) -> Arc<Catalog> {
        let catalog = Arc::new(catalog);
        self.current.store(Some(Arc::clone(&catalog)));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Published catalog generation {} ({} brands, {} models)",
            generation,
            catalog.brand_count(),
            catalog.len()
        );
        catalog
    }
}
