use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app::ports::SourceFetcherPort;
use crate::observability::metrics::quality_gate as quality_metrics;
use crate::pipeline::ingestion::{SourceLoader, SourceSet};
use crate::pipeline::processing::quality_gate::{
    DefaultQualityGate, QualityDecision, QualityGate, QualityReport, QualitySeverity,
};

/// Use case for assessing the raw sources through the quality gate
pub struct AssessUseCase {
    fetcher: Box<dyn SourceFetcherPort>,
    quality_gate: Box<dyn QualityGate + Send + Sync>,
}

impl AssessUseCase {
    pub fn new(
        fetcher: Box<dyn SourceFetcherPort>,
        quality_gate: Box<dyn QualityGate + Send + Sync>,
    ) -> Self {
        Self {
            fetcher,
            quality_gate,
        }
    }

    /// Create a use case with the default quality gate
    pub fn with_default_quality_gate(fetcher: Box<dyn SourceFetcherPort>) -> Self {
        Self::new(fetcher, Box::new(DefaultQualityGate::new()))
    }

    pub async fn assess(&self, sources: &SourceSet) -> Result<QualityReport> {
        let tables = SourceLoader::new(self.fetcher.as_ref())
            .load(sources)
            .await
            .context("loading source tables")?;

        let report = self.quality_gate.assess(&tables);

        for issue in &report.issues {
            quality_metrics::issue_detected(
                &format!("{:?}", issue.issue_type),
                &format!("{:?}", issue.severity),
            );
            if issue.severity >= QualitySeverity::Error {
                warn!(table = %issue.table, count = issue.count, "{}", issue.description);
            }
        }

        match report.decision {
            QualityDecision::Clean => info!("Sources assessed clean"),
            QualityDecision::CleanWithWarnings => {
                info!("Sources assessed with {} issues", report.issues.len())
            }
            QualityDecision::Blocked => {
                warn!("Sources carry defects the cleaning run cannot handle")
            }
        }

        Ok(report)
    }
}
