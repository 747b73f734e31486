use crate::model::{CatalogRow, SourceError};

/// Paginated row source backing the catalog.
///
/// A page shorter than `limit` marks the end of the data.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogRow>, SourceError>;
}
