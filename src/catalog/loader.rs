use crate::catalog::Catalog;
use crate::model::{CatalogError, CatalogRow, SourceError};
use crate::source::CatalogSource;
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Largest page the catalog store hands out in one request.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub page_size: usize,
    /// Fewer distinct brands than this raises the low-brand warning.
    pub expected_min_brands: usize,
    pub page_timeout: Duration,
    /// Extra attempts per page after the first one.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub max_pages: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            expected_min_brands: 30,
            page_timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_millis(250),
            max_pages: 10_000,
        }
    }
}

/// Loads the whole catalog, page by page, until the source returns a short
/// page. Any page that still fails after retries fails the whole load.
pub async fn load<S>(source: &S, config: &LoaderConfig) -> Result<Catalog, CatalogError>
where
    S: CatalogSource + ?Sized,
{
    let limit = config.page_size.max(1);
    let mut rows: Vec<CatalogRow> = Vec::new();
    let mut offset = 0;
    let mut pages = 0;

    loop {
        if pages >= config.max_pages {
            return Err(CatalogError::DataSource {
                offset,
                attempts: 0,
                source: SourceError::Malformed(format!(
                    "source still returning full pages after {pages} pages"
                )),
            });
        }

        let (page, attempts) = fetch_with_retry(source, offset, limit, config).await?;
        pages += 1;

        let count = page.len();
        if count > limit {
            return Err(CatalogError::DataSource {
                offset,
                attempts,
                source: SourceError::Malformed(format!(
                    "page returned {count} rows, limit is {limit}"
                )),
            });
        }

        debug!("Fetched {} rows (offset {})", count, offset);
        rows.extend(page);

        if count < limit {
            break;
        }
        offset += limit;
    }

    let mut catalog = Catalog::from_rows(rows);
    let expected = config.expected_min_brands;
    let stats = catalog.stats_mut();
    stats.pages_fetched = pages;

    if stats.brands < expected {
        stats.low_brand_count = true;
        warn!(
            "Catalog has only {} distinct brands (expected at least {}); pagination or source may be incomplete",
            stats.brands, expected
        );
    }

    info!(
        "Loaded {} brands and {} models from {} rows in {} page(s)",
        stats.brands, stats.entries, stats.rows_fetched, stats.pages_fetched
    );

    Ok(catalog)
}

async fn fetch_with_retry<S>(
    source: &S,
    offset: usize,
    limit: usize,
    config: &LoaderConfig,
) -> Result<(Vec<CatalogRow>, u32), CatalogError>
where
    S: CatalogSource + ?Sized,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let result = match timeout(config.page_timeout, source.fetch_page(offset, limit)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout),
        };

        match result {
            Ok(page) => return Ok((page, attempt)),
            Err(e) if e.is_transient() && attempt <= config.max_retries => {
                let delay = backoff_delay(config.backoff_base, attempt);
                warn!(
                    "Catalog page at offset {} failed (attempt {}): {}; retrying in {:?}",
                    offset, attempt, e, delay
                );
                sleep(delay).await;
            }
            Err(e) => {
                return Err(CatalogError::DataSource {
                    offset,
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

/// Exponential backoff with up to 50% random jitter.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(1u32 << (attempt - 1).min(16));
    let jitter_cap = exp.as_millis() as u64 / 2;
    let jitter = rand::rng().random_range(0..=jitter_cap);
    exp + Duration::from_millis(jitter)
}
