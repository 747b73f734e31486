use crate::model::{Listing, ParseMethod, ParsedTitle, StorageError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const LISTING_COLUMNS: &str = "id, source, title, fetched_at";

pub struct ListingStore {
    conn: Connection,
}

impl ListingStore {
    /// Opens the listings database, creating the table when missing.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS listings (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                marca TEXT,
                modelo TEXT,
                version TEXT,
                confidence REAL,
                parse_method TEXT,
                parsed_at TEXT
            );
            ",
        )?;
        Ok(Self { conn })
    }

    /// Inserts or refreshes a listing. A changed title clears the old parse.
    pub fn save_listing(&self, listing: &Listing) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO listings (id, source, title, fetched_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                source = excluded.source,
                fetched_at = excluded.fetched_at,
                parsed_at = CASE WHEN listings.title = excluded.title THEN listings.parsed_at ELSE NULL END,
                title = excluded.title",
            params![
                &listing.id,
                &listing.source,
                &listing.title,
                &listing.fetched_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_all_listings(&self) -> Result<Vec<Listing>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY id"))?;
        let rows = stmt.query_map([], Self::map_listing)?;
        let mut listings = Vec::new();
        for listing in rows {
            listings.push(listing?);
        }
        Ok(listings)
    }

    /// Listings never parsed, or whose title changed since the last parse.
    pub fn get_unparsed_listings(&self) -> Result<Vec<Listing>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE parsed_at IS NULL ORDER BY id"
        ))?;
        let rows = stmt.query_map([], Self::map_listing)?;
        let mut listings = Vec::new();
        for listing in rows {
            listings.push(listing?);
        }
        Ok(listings)
    }

    /// Writes a batch of parse results in one transaction. An unknown listing
    /// id rolls back the whole batch.
    pub fn save_parses(
        &mut self,
        results: &[(String, ParsedTitle)],
        parsed_at: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut update = tx.prepare(
                "UPDATE listings
                 SET marca = ?2, modelo = ?3, version = ?4, confidence = ?5, parse_method = ?6, parsed_at = ?7
                 WHERE id = ?1",
            )?;
            let parsed_at = parsed_at.to_rfc3339();
            for (listing_id, parsed) in results {
                let changed = update.execute(params![
                    listing_id,
                    &parsed.brand,
                    &parsed.model,
                    &parsed.version,
                    parsed.confidence,
                    parsed.method.as_str(),
                    &parsed_at,
                ])?;
                if changed == 0 {
                    return Err(StorageError::InvalidValue(format!(
                        "unknown listing {listing_id}"
                    )));
                }
            }
        }
        tx.commit()?;
        Ok(results.len())
    }

    pub fn get_parse(&self, listing_id: &str) -> Result<Option<ParsedTitle>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT marca, modelo, version, confidence, parse_method
                 FROM listings WHERE id = ?1 AND parsed_at IS NOT NULL",
                params![listing_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((brand, model, version, confidence, method)) => Ok(Some(ParsedTitle {
                brand,
                model,
                version,
                confidence,
                method: method.parse().map_err(StorageError::InvalidValue)?,
            })),
            None => Ok(None),
        }
    }

    /// Number of parsed listings per parse method.
    pub fn count_by_method(&self) -> Result<HashMap<ParseMethod, usize>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT parse_method, COUNT(*) FROM listings
             WHERE parse_method IS NOT NULL GROUP BY parse_method",
        )?;
        let rows = stmt.query_map([], |row| {
            let method: String = row.get(0)?;
            let count: usize = row.get(1)?;
            Ok((method, count))
        })?;

        let mut result = HashMap::new();
        for row in rows {
            let (method, count) = row?;
            let method: ParseMethod = method.parse().map_err(StorageError::InvalidValue)?;
            result.insert(method, count);
        }
        Ok(result)
    }

    fn map_listing(row: &Row) -> Result<Listing, rusqlite::Error> {
        let fetched_at_str: String = row.get(3)?;
        let fetched_at = fetched_at_str.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Listing {
            id: row.get(0)?,
            source: row.get(1)?,
            title: row.get(2)?,
            fetched_at,
        })
    }
}
