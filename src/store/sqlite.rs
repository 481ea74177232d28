//! SQLite Result Store
//!
//! One row per batch: searchable columns (token name, symbol, creation
//! time) next to the full JSON document. The document is the source of
//! truth; the columns only serve lookup and ordering.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::ResultStore;
use crate::error::StoreError;
use crate::types::BatchResult;

pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    /// Open (or create) the database at `url` and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        // A single connection keeps in-memory databases coherent; the write
        // volume here is one row per batch.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS batches (
                id TEXT PRIMARY KEY,
                token_name TEXT NOT NULL,
                token_symbol TEXT NOT NULL,
                created_at TEXT NOT NULL,
                document TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn save(&self, result: &BatchResult) -> Result<String, StoreError> {
        let id = result.request_id.to_string();
        let document = serde_json::to_string(result)?;

        sqlx::query(
            "INSERT OR REPLACE INTO batches (id, token_name, token_symbol, created_at, document)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&result.metadata.name)
        .bind(&result.metadata.symbol)
        .bind(result.created_at.to_rfc3339())
        .bind(&document)
        .execute(&self.pool)
        .await?;

        info!("stored batch {} ({} wallets)", id, result.wallets.len());
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BatchResult>, StoreError> {
        let row = sqlx::query("SELECT document FROM batches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.get("document");
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<BatchResult>, StoreError> {
        let pattern = like_pattern(query);

        let rows = sqlx::query(
            "SELECT document FROM batches
             WHERE lower(token_name) LIKE ? ESCAPE '\\'
                OR lower(token_symbol) LIKE ? ESCAPE '\\'
             ORDER BY created_at DESC",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let document: String = row.get("document");
                serde_json::from_str(&document).map_err(StoreError::from)
            })
            .collect()
    }
}

/// Substring pattern for a LIKE clause. `%`, `_`, and `\` in the query are
/// escaped so they match literally instead of acting as wildcards.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
