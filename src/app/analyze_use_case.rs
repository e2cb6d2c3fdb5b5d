use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::analysis::{summarize, AnalysisSummary};

/// Use case for summarizing a persisted cleaned table
pub struct AnalyzeUseCase {
    input: PathBuf,
}

impl AnalyzeUseCase {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
        }
    }

    pub async fn analyze(&self) -> Result<AnalysisSummary> {
        let bytes = tokio::fs::read(&self.input)
            .await
            .with_context(|| format!("reading {}", self.input.display()))?;
        let summary = summarize(bytes.as_slice())
            .with_context(|| format!("summarizing {}", self.input.display()))?;
        info!("Analyzed {} rows from {}", summary.rows, self.input.display());
        Ok(summary)
    }
}
