use crate::model::{CatalogRow, SourceError};
use crate::source::traits::CatalogSource;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rows held in memory, served page by page. Also backs flat JSON files.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: Vec<CatalogRow>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new(rows: Vec<CatalogRow>) -> Self {
        Self {
            rows,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Decodes a JSON array of `{"marca": .., "modelo": ..}` objects.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let rows: Vec<CatalogRow> =
            serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(Self::new(rows))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let content =
            fs::read_to_string(path).map_err(|e| SourceError::Unreachable(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// How many pages have been requested so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait::async_trait]
impl CatalogSource for MemorySource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogRow>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let start = offset.min(self.rows.len());
        let end = offset.saturating_add(limit).min(self.rows.len());
        Ok(self.rows[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_pages_and_counts_fetches() {
        let rows = (0..5).map(|i| CatalogRow::new("Opel", format!("M{i}"))).collect();
        let source = MemorySource::new(rows);

        assert_eq!(source.fetch_page(0, 2).await.unwrap().len(), 2);
        assert_eq!(source.fetch_page(4, 2).await.unwrap().len(), 1);
        assert!(source.fetch_page(10, 2).await.unwrap().is_empty());
        assert_eq!(source.fetch_count(), 3);
    }

    #[test]
    fn decodes_json_rows() {
        let source =
            MemorySource::from_json_str(r#"[{"marca":"SEAT","modelo":"León"},{"marca":"BMW","modelo":"X5"}]"#)
                .unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.rows[0], CatalogRow::new("SEAT", "León"));
    }

    #[test]
    fn rejects_bad_json() {
        let err = MemorySource::from_json_str(r#"{"marca":"SEAT"}"#).unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }
}
