use crate::model::{CatalogRow, SourceError};
use crate::source::traits::CatalogSource;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RestRow {
    marca: Option<String>,
    modelo: Option<String>,
}

/// Catalog table exposed through a PostgREST endpoint (Supabase style).
pub struct RestSource {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestSource {
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) MarcaMatcher/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    fn build_url(&self, offset: usize, limit: usize) -> String {
        format!(
            "{}/rest/v1/{}?select=marca,modelo&order=id.asc&offset={}&limit={}",
            self.base_url, self.table, offset, limit
        )
    }
}

#[async_trait::async_trait]
impl CatalogSource for RestSource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogRow>, SourceError> {
        let url = self.build_url(offset, limit);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, offset));
        }

        let body = response.text().await?;
        let rows: Vec<RestRow> =
            serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| CatalogRow::new(r.marca.unwrap_or_default(), r.modelo.unwrap_or_default()))
            .collect())
    }
}

/// Client errors are not retried, except request timeouts and rate limiting.
fn status_error(status: StatusCode, offset: usize) -> SourceError {
    let message = format!("HTTP {status} for offset {offset}");
    match status {
        StatusCode::REQUEST_TIMEOUT => SourceError::Timeout,
        StatusCode::TOO_MANY_REQUESTS => SourceError::Unreachable(message),
        s if s.is_client_error() => SourceError::Malformed(message),
        _ => SourceError::Unreachable(message),
    }
}
