// Batch re-parsing of stored listings against the current catalog.
use crate::catalog::{Catalog, CatalogHandle};
use crate::mapping::MapOutcome;
use crate::model::{BatchError, CatalogError, Listing, ParseMethod, ParsedTitle};
use crate::parser::TitleParser;
use crate::storage::ListingStore;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Re-parse every listing instead of only the pending ones.
    pub reparse_all: bool,
    /// Number of parse tasks run side by side.
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            reparse_all: false,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub parsed: usize,
    /// (listing id, reason) for every skipped listing.
    pub skipped: Vec<(String, String)>,
    pub by_method: HashMap<ParseMethod, usize>,
    pub catalog_generation: u64,
}

/// Parses pending (or all) listings with one catalog snapshot and stores the
/// results. A missing catalog aborts the batch before anything is written.
pub async fn reparse_listings(
    handle: &CatalogHandle,
    store: Arc<Mutex<ListingStore>>,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    let listings = {
        let guard = store.lock().await;
        if options.reparse_all {
            guard.get_all_listings()?
        } else {
            guard.get_unparsed_listings()?
        }
    };

    let mut report = BatchReport {
        catalog_generation: handle.generation(),
        ..Default::default()
    };
    if listings.is_empty() {
        info!("No listings to parse");
        return Ok(report);
    }

    let catalog = handle.current().ok();
    let parser = handle.parser().clone();
    let chunk_size = listings.len().div_ceil(options.concurrency.max(1));
    info!(
        "Parsing {} listings in chunks of {} (catalog generation {})",
        listings.len(),
        chunk_size,
        report.catalog_generation
    );

    let tasks: Vec<_> = listings
        .chunks(chunk_size)
        .map(|chunk| {
            let chunk = chunk.to_vec();
            let catalog = catalog.clone();
            let parser = parser.clone();
            tokio::spawn(async move {
                chunk
                    .into_iter()
                    .map(|listing| {
                        let outcome = map_listing(&parser, catalog.as_deref(), &listing);
                        (listing.id, outcome)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut results = Vec::with_capacity(listings.len());
    for joined in join_all(tasks).await {
        let chunk = joined.map_err(|e| BatchError::Worker(e.to_string()))?;
        for (id, outcome) in chunk {
            match outcome {
                MapOutcome::Mapped(parsed) => results.push((id, parsed)),
                MapOutcome::Skipped { reason } => {
                    warn!("Skipping listing {}: {}", id, reason);
                    report.skipped.push((id, reason));
                }
                MapOutcome::Fatal(e) => return Err(e.into()),
            }
        }
    }

    report.parsed = store.lock().await.save_parses(&results, Utc::now())?;
    for (_, parsed) in &results {
        *report.by_method.entry(parsed.method).or_default() += 1;
    }

    info!(
        "Parsed {} listings ({} skipped): {:?}",
        report.parsed,
        report.skipped.len(),
        report.by_method
    );
    Ok(report)
}

fn map_listing(
    parser: &TitleParser,
    catalog: Option<&Catalog>,
    listing: &Listing,
) -> MapOutcome<ParsedTitle, CatalogError> {
    let Some(catalog) = catalog else {
        return MapOutcome::Fatal(CatalogError::NotInitialized);
    };
    if listing.title.trim().is_empty() {
        return MapOutcome::skipped("empty title");
    }
    MapOutcome::Mapped(parser.parse(&listing.title, catalog))
}
