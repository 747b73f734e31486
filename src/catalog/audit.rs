// Catalog quality checks for operators.
use crate::catalog::Catalog;
use crate::model::CatalogEntry;
use crate::normalizer::normalize;

/// Model keys longer than this are reported as suspicious.
pub const MAX_MODEL_KEY_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandSummary {
    pub display: String,
    pub key: String,
    pub models: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandPresence {
    pub name: String,
    pub key: String,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspicionKind {
    ModelRepeatsBrand,
    ModelTooLong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspiciousEntry {
    pub entry: CatalogEntry,
    pub kind: SuspicionKind,
}

/// Per-brand model counts, sorted by display name.
pub fn brand_summary(catalog: &Catalog) -> Vec<BrandSummary> {
    let mut summary: Vec<BrandSummary> = catalog
        .brand_keys()
        .iter()
        .filter_map(|key| {
            catalog.brand(key).map(|b| BrandSummary {
                display: b.display.clone(),
                key: key.clone(),
                models: b.entries.len(),
            })
        })
        .collect();
    summary.sort_by(|a, b| a.key.cmp(&b.key));
    summary
}

/// Looks up each expected brand name after normalizing it.
pub fn check_brands<S: AsRef<str>>(catalog: &Catalog, names: &[S]) -> Vec<BrandPresence> {
    names
        .iter()
        .map(|name| {
            let key = normalize(name.as_ref());
            BrandPresence {
                name: name.as_ref().to_string(),
                present: catalog.contains_brand(&key),
                key,
            }
        })
        .collect()
}

/// Entries whose model text repeats the brand or is implausibly long.
pub fn suspicious_entries(catalog: &Catalog) -> Vec<SuspiciousEntry> {
    let mut found = Vec::new();
    for entry in catalog.entries() {
        let padded = format!(" {} ", entry.model_key);
        if padded.contains(&format!(" {} ", entry.brand_key)) {
            found.push(SuspiciousEntry {
                entry: entry.clone(),
                kind: SuspicionKind::ModelRepeatsBrand,
            });
        } else if entry.model_key.len() > MAX_MODEL_KEY_LEN {
            found.push(SuspiciousEntry {
                entry: entry.clone(),
                kind: SuspicionKind::ModelTooLong,
            });
        }
    }
    found
}
