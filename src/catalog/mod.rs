// Catalog module: in-memory brand/model lookup and its lifecycle.

pub mod audit;
pub mod handle;
pub mod loader;

pub use handle::CatalogHandle;
pub use loader::{load, LoaderConfig};

use crate::mapping::MapOutcome;
use crate::model::{CatalogEntry, CatalogRow};
use crate::normalizer::normalize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Counters gathered while building a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub pages_fetched: usize,
    pub rows_fetched: usize,
    pub rows_skipped: usize,
    pub duplicate_rows: usize,
    pub brands: usize,
    pub entries: usize,
    /// Set when the distinct brand count fell below the configured floor.
    pub low_brand_count: bool,
}

/// All models known for one brand, longest model key first.
#[derive(Debug, Clone)]
pub struct BrandModels {
    pub display: String,
    pub entries: Vec<CatalogEntry>,
}

/// Immutable lookup structure built from the full set of catalog rows.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    brands: HashMap<String, BrandModels>,
    brand_keys: Vec<String>,
    stats: LoadStats,
}

impl Catalog {
    /// Builds a catalog from rows. Rows whose brand or model normalizes to
    /// nothing are skipped and counted.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CatalogRow>,
    {
        let mut brands: HashMap<String, BrandModels> = HashMap::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut stats = LoadStats::default();

        for row in rows {
            stats.rows_fetched += 1;
            let entry = match map_row(row) {
                MapOutcome::Mapped(entry) => entry,
                MapOutcome::Skipped { reason } => {
                    debug!("Skipping catalog row: {}", reason);
                    stats.rows_skipped += 1;
                    continue;
                }
                MapOutcome::Fatal(never) => match never {},
            };

            if !seen.insert((entry.brand_key.clone(), entry.model_key.clone())) {
                stats.duplicate_rows += 1;
                continue;
            }

            brands
                .entry(entry.brand_key.clone())
                .or_insert_with(|| BrandModels {
                    display: entry.brand.clone(),
                    entries: Vec::new(),
                })
                .entries
                .push(entry);
        }

        for models in brands.values_mut() {
            models
                .entries
                .sort_by(|a, b| longest_first(&a.model_key, &b.model_key));
        }

        let mut brand_keys: Vec<String> = brands.keys().cloned().collect();
        brand_keys.sort_by(|a, b| longest_first(a, b));

        stats.brands = brand_keys.len();
        stats.entries = seen.len();

        Self {
            brands,
            brand_keys,
            stats,
        }
    }

    /// Brand keys, longest first.
    pub fn brand_keys(&self) -> &[String] {
        &self.brand_keys
    }

    pub fn brand(&self, brand_key: &str) -> Option<&BrandModels> {
        self.brands.get(brand_key)
    }

    pub fn contains_brand(&self, brand_key: &str) -> bool {
        self.brands.contains_key(brand_key)
    }

    pub fn brand_count(&self) -> usize {
        self.brand_keys.len()
    }

    /// Number of distinct (brand key, model key) pairs.
    pub fn len(&self) -> usize {
        self.stats.entries
    }

    pub fn is_empty(&self) -> bool {
        self.brand_keys.is_empty()
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut LoadStats {
        &mut self.stats
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.brand_keys
            .iter()
            .filter_map(|k| self.brands.get(k))
            .flat_map(|b| b.entries.iter())
    }
}

fn map_row(row: CatalogRow) -> MapOutcome<CatalogEntry, std::convert::Infallible> {
    let brand = row.brand.trim();
    let model = row.model.trim();
    let brand_key = normalize(brand);
    let model_key = normalize(model);

    if brand_key.is_empty() {
        return MapOutcome::skipped(format!("empty brand for model {:?}", row.model));
    }
    if model_key.is_empty() {
        return MapOutcome::skipped(format!("empty model for brand {:?}", row.brand));
    }

    MapOutcome::Mapped(CatalogEntry {
        brand: brand.to_string(),
        model: model.to_string(),
        brand_key,
        model_key,
    })
}

fn longest_first(a: &str, b: &str) -> std::cmp::Ordering {
    b.len().cmp(&a.len()).then_with(|| a.cmp(b))
}
