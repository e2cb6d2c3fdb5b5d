use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::app::ports::{CleanedOutputPort, PersistReceipt, SourceFetcherPort};
use crate::observability::metrics;
use crate::pipeline::clean_tables;
use crate::pipeline::ingestion::{SourceLoader, SourceSet};

/// Outcome of one full cleaning run
#[derive(Debug, Clone)]
pub struct CleanRunSummary {
    pub archive_rows: usize,
    pub prediction_rows: usize,
    pub metrics_rows: usize,
    pub cleaned_rows: usize,
    /// Header of the persisted table, in order
    pub columns: Vec<String>,
    pub receipt: PersistReceipt,
    pub duration_secs: f64,
}

/// Load, clean and persist. Output is written only once every stage has succeeded.
pub struct CleanUseCase {
    fetcher: Box<dyn SourceFetcherPort>,
    output: Box<dyn CleanedOutputPort>,
}

impl CleanUseCase {
    pub fn new(fetcher: Box<dyn SourceFetcherPort>, output: Box<dyn CleanedOutputPort>) -> Self {
        Self { fetcher, output }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, sources: &SourceSet) -> Result<CleanRunSummary> {
        let started = Instant::now();

        let tables = SourceLoader::new(self.fetcher.as_ref())
            .load(sources)
            .await
            .context("loading source tables")?;

        let cleaned = clean_tables(&tables.archive, &tables.metrics)
            .context("cleaning archive")?;

        let receipt = self
            .output
            .write_cleaned_table(&cleaned)
            .await
            .context("persisting cleaned table")?;

        let duration_secs = started.elapsed().as_secs_f64();
        metrics::pipeline_duration(duration_secs);
        info!(
            "Clean run finished in {:.2}s: {} archive rows in, {} rows out",
            duration_secs,
            tables.archive.len(),
            cleaned.len()
        );

        Ok(CleanRunSummary {
            archive_rows: tables.archive.len(),
            prediction_rows: tables.predictions.len(),
            metrics_rows: tables.metrics.len(),
            cleaned_rows: cleaned.len(),
            columns: cleaned.header().into_iter().map(str::to_string).collect(),
            receipt,
            duration_secs,
        })
    }
}
