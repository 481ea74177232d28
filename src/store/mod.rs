//! Result Store Module
//!
//! Persistence for finalized batches. Each batch is one denormalized
//! document: the wallets are embedded in the result, never split into a
//! joined collection, because a batch is always read and written as a unit.

mod sqlite;

pub use sqlite::SqliteResultStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::BatchResult;

/// Store seam for finalized batch results
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist one batch document; returns the stored id.
    async fn save(&self, result: &BatchResult) -> Result<String, StoreError>;

    /// Fetch a batch document by id. Pure read; repeated calls return
    /// identical content.
    async fn find_by_id(&self, id: &str) -> Result<Option<BatchResult>, StoreError>;

    /// Case-insensitive substring search over token name and symbol,
    /// newest first. The query is matched literally, so `%` and `_` are
    /// ordinary characters. An empty query matches everything.
    async fn search(&self, query: &str) -> Result<Vec<BatchResult>, StoreError>;
}
