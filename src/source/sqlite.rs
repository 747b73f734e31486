use crate::model::{CatalogRow, SourceError};
use crate::source::traits::CatalogSource;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub const DEFAULT_TABLE: &str = "marcas_modelos_validos";

/// Catalog rows stored in a SQLite table with `marca` and `modelo` columns.
pub struct SqliteSource {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteSource {
    /// Opens the database and makes sure the catalog table exists.
    pub fn open(db_path: &str, table: &str) -> Result<Self, SourceError> {
        Self::with_connection(Connection::open(db_path)?, table)
    }

    pub fn in_memory(table: &str) -> Result<Self, SourceError> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self, SourceError> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SourceError::Malformed(format!("invalid table name: {table:?}")));
        }

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                marca TEXT,
                modelo TEXT
            );"
        ))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: table.to_string(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SourceError> {
        self.conn
            .lock()
            .map_err(|_| SourceError::Unreachable("sqlite connection poisoned".into()))
    }

    /// Inserts pairs that are not stored yet. Returns how many were added.
    pub fn insert_pairs(&self, rows: &[CatalogRow]) -> Result<usize, SourceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut exists = tx.prepare(&format!(
                "SELECT 1 FROM {} WHERE marca = ?1 AND modelo = ?2 LIMIT 1",
                self.table
            ))?;
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} (marca, modelo) VALUES (?1, ?2)",
                self.table
            ))?;
            for row in rows {
                if exists.exists(params![row.brand, row.model])? {
                    continue;
                }
                insert.execute(params![row.brand, row.model])?;
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn count(&self) -> Result<usize, SourceError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
            row.get(0)
        })?;
        Ok(n as usize)
    }
}

#[async_trait::async_trait]
impl CatalogSource for SqliteSource {
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogRow>, SourceError> {
        let conn = Arc::clone(&self.conn);
        let sql = format!(
            "SELECT marca, modelo FROM {} ORDER BY id ASC LIMIT ?1 OFFSET ?2",
            self.table
        );

        tokio::task::spawn_blocking(move || -> Result<Vec<CatalogRow>, SourceError> {
            let conn = conn
                .lock()
                .map_err(|_| SourceError::Unreachable("sqlite connection poisoned".into()))?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64, offset as i64], |row| {
                let brand: Option<String> = row.get(0)?;
                let model: Option<String> = row.get(1)?;
                Ok(CatalogRow::new(brand.unwrap_or_default(), model.unwrap_or_default()))
            })?;

            let mut page = Vec::new();
            for row in rows {
                page.push(row?);
            }
            Ok(page)
        })
        .await
        .map_err(|e| SourceError::Unreachable(format!("sqlite task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pages_in_insertion_order() {
        let source = SqliteSource::in_memory(DEFAULT_TABLE).unwrap();
        let rows: Vec<CatalogRow> = (0..7).map(|i| CatalogRow::new("Audi", format!("A{i}"))).collect();
        assert_eq!(source.insert_pairs(&rows).unwrap(), 7);
        assert_eq!(source.insert_pairs(&rows[..2]).unwrap(), 0);
        assert_eq!(source.count().unwrap(), 7);

        let page = source.fetch_page(5, 5).await.unwrap();
        assert_eq!(page, vec![CatalogRow::new("Audi", "A5"), CatalogRow::new("Audi", "A6")]);
    }

    #[tokio::test]
    async fn null_columns_become_empty_text() {
        let source = SqliteSource::in_memory("cat").unwrap();
        source
            .lock()
            .unwrap()
            .execute("INSERT INTO cat (marca, modelo) VALUES ('Kia', NULL)", [])
            .unwrap();
        let page = source.fetch_page(0, 10).await.unwrap();
        assert_eq!(page, vec![CatalogRow::new("Kia", "")]);
    }

    #[test]
    fn rejects_unsafe_table_names() {
        assert!(SqliteSource::in_memory("x; DROP TABLE y").is_err());
    }
}
