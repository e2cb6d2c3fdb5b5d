use async_trait::async_trait;

use crate::domain::CleanedTable;
use crate::error::Result;

/// Retrieves a remote source table as raw bytes
#[async_trait]
pub trait SourceFetcherPort: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Receipt for a persisted cleaned table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistReceipt {
    pub path: String,
    pub rows: usize,
    pub columns: usize,
    pub bytes: u64,
    /// Hex SHA-256 of the written file
    pub sha256: String,
}

/// Destination for the final cleaned table
#[async_trait]
pub trait CleanedOutputPort: Send + Sync {
    async fn write_cleaned_table(&self, table: &CleanedTable) -> Result<PersistReceipt>;
}
