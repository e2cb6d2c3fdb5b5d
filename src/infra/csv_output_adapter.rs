use std::path::PathBuf;

use async_trait::async_trait;
use csv::{Terminator, WriterBuilder};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::app::ports::{CleanedOutputPort, PersistReceipt};
use crate::domain::CleanedTable;
use crate::error::{Result, WrangleError};
use crate::observability::metrics::output as output_metrics;

/// Writes the cleaned table as comma separated text with a header row.
///
/// The bytes go to a sibling `.tmp` file first and are renamed over the target,
/// so a failed run never leaves a half-written table behind.
pub struct CsvOutputAdapter {
    path: PathBuf,
}

impl CsvOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Serialize the table. Identical tables always render to identical bytes.
    pub fn render(table: &CleanedTable) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(table.header()).map_err(|e| WrangleError::Io(e.into()))?;
        for record in &table.records {
            let row = table
                .columns
                .iter()
                .map(|&column| record.cell(column).unwrap_or_default());
            writer.write_record(row).map_err(|e| WrangleError::Io(e.into()))?;
        }

        writer.into_inner().map_err(|e| WrangleError::Io(e.into_error()))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CleanedOutputPort for CsvOutputAdapter {
    #[instrument(skip(self, table), fields(path = %self.path.display(), rows = table.len()))]
    async fn write_cleaned_table(&self, table: &CleanedTable) -> Result<PersistReceipt> {
        let bytes = Self::render(table)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        let sha256 = hex::encode(Sha256::digest(&bytes));
        output_metrics::rows_written(table.len());
        output_metrics::bytes_written(bytes.len() as u64);
        info!(
            "Wrote {} rows x {} columns to {} (sha256 {})",
            table.len(),
            table.columns.len(),
            self.path.display(),
            sha256
        );

        Ok(PersistReceipt {
            path: self.path.to_string_lossy().to_string(),
            rows: table.len(),
            columns: table.columns.len(),
            bytes: bytes.len() as u64,
            sha256,
        })
    }
}
