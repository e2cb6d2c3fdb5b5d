//! Metric catalog for the wrangling pipeline
//!
//! Every stage records through the small helper modules below so metric names
//! live in one place. Nothing here installs a recorder; without one the calls
//! are no-ops.

use std::fmt;

use metrics::{counter, histogram};

/// Enum representing all metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Source metrics
    SourcesRowsLoaded,
    SourcesBytesLoaded,
    SourcesLoadDuration,

    // Normalize metrics
    NormalizeRecordsProcessed,
    NormalizeNamesNulled,
    NormalizeUrlsBackfilled,

    // Stage metrics
    StageRecordsConsolidated,
    StageCompoundValues,

    // Merge metrics
    MergeRowsJoined,
    MergeRowsDropped,

    // Retweet filter metrics
    RetweetRowsRemoved,

    // Rating metrics
    RatingRowsCollapsed,
    RatingRowsOverridden,
    RatingRowsDeleted,

    // Output metrics
    OutputColumnsDropped,
    OutputRowsWritten,
    OutputBytesWritten,

    // Quality Gate metrics
    QualityGateIssuesDetected,

    PipelineDuration,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesRowsLoaded => "wrangle_sources_rows_loaded_total",
            MetricName::SourcesBytesLoaded => "wrangle_sources_bytes_loaded",
            MetricName::SourcesLoadDuration => "wrangle_sources_load_duration_seconds",

            MetricName::NormalizeRecordsProcessed => "wrangle_normalize_records_processed_total",
            MetricName::NormalizeNamesNulled => "wrangle_normalize_names_nulled_total",
            MetricName::NormalizeUrlsBackfilled => "wrangle_normalize_urls_backfilled_total",

            MetricName::StageRecordsConsolidated => "wrangle_stage_records_consolidated_total",
            MetricName::StageCompoundValues => "wrangle_stage_compound_values_total",

            MetricName::MergeRowsJoined => "wrangle_merge_rows_joined_total",
            MetricName::MergeRowsDropped => "wrangle_merge_rows_dropped_total",

            MetricName::RetweetRowsRemoved => "wrangle_retweet_rows_removed_total",

            MetricName::RatingRowsCollapsed => "wrangle_rating_rows_collapsed_total",
            MetricName::RatingRowsOverridden => "wrangle_rating_rows_overridden_total",
            MetricName::RatingRowsDeleted => "wrangle_rating_rows_deleted_total",

            MetricName::OutputColumnsDropped => "wrangle_output_columns_dropped_total",
            MetricName::OutputRowsWritten => "wrangle_output_rows_written_total",
            MetricName::OutputBytesWritten => "wrangle_output_bytes_written",

            MetricName::QualityGateIssuesDetected => "wrangle_quality_gate_issues_detected_total",

            MetricName::PipelineDuration => "wrangle_pipeline_duration_seconds",
        }
    }

    /// Get all metric names as an iterator
    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            SourcesRowsLoaded,
            SourcesBytesLoaded,
            SourcesLoadDuration,
            NormalizeRecordsProcessed,
            NormalizeNamesNulled,
            NormalizeUrlsBackfilled,
            StageRecordsConsolidated,
            StageCompoundValues,
            MergeRowsJoined,
            MergeRowsDropped,
            RetweetRowsRemoved,
            RatingRowsCollapsed,
            RatingRowsOverridden,
            RatingRowsDeleted,
            OutputColumnsDropped,
            OutputRowsWritten,
            OutputBytesWritten,
            QualityGateIssuesDetected,
            PipelineDuration,
        ]
        .into_iter()
    }
}

pub mod sources {
    use super::*;

    pub fn rows_loaded(table: &str, rows: usize) {
        counter!(MetricName::SourcesRowsLoaded.as_str(), "table" => table.to_string())
            .increment(rows as u64);
    }

    pub fn bytes_loaded(table: &str, bytes: usize) {
        histogram!(MetricName::SourcesBytesLoaded.as_str(), "table" => table.to_string())
            .record(bytes as f64);
    }

    pub fn load_duration(table: &str, secs: f64) {
        histogram!(MetricName::SourcesLoadDuration.as_str(), "table" => table.to_string())
            .record(secs);
    }
}

pub mod normalize {
    use super::*;

    pub fn records_processed(count: usize) {
        counter!(MetricName::NormalizeRecordsProcessed.as_str()).increment(count as u64);
    }

    pub fn names_nulled(count: usize) {
        counter!(MetricName::NormalizeNamesNulled.as_str()).increment(count as u64);
    }

    pub fn urls_backfilled(count: usize) {
        counter!(MetricName::NormalizeUrlsBackfilled.as_str()).increment(count as u64);
    }
}

pub mod stage {
    use super::*;

    pub fn records_consolidated(count: usize) {
        counter!(MetricName::StageRecordsConsolidated.as_str()).increment(count as u64);
    }

    pub fn compound_values(count: usize) {
        counter!(MetricName::StageCompoundValues.as_str()).increment(count as u64);
    }
}

pub mod merge {
    use super::*;

    pub fn rows_joined(count: usize) {
        counter!(MetricName::MergeRowsJoined.as_str()).increment(count as u64);
    }

    pub fn rows_dropped(side: &str, count: usize) {
        counter!(MetricName::MergeRowsDropped.as_str(), "side" => side.to_string())
            .increment(count as u64);
    }
}

pub mod retweet {
    use super::*;

    pub fn rows_removed(count: usize) {
        counter!(MetricName::RetweetRowsRemoved.as_str()).increment(count as u64);
    }
}

pub mod rating {
    use super::*;

    pub fn rows_collapsed(count: usize) {
        counter!(MetricName::RatingRowsCollapsed.as_str()).increment(count as u64);
    }

    pub fn rows_overridden(count: usize) {
        counter!(MetricName::RatingRowsOverridden.as_str()).increment(count as u64);
    }

    pub fn rows_deleted(count: usize) {
        counter!(MetricName::RatingRowsDeleted.as_str()).increment(count as u64);
    }
}

pub mod output {
    use super::*;

    pub fn columns_dropped(count: usize) {
        counter!(MetricName::OutputColumnsDropped.as_str()).increment(count as u64);
    }

    pub fn rows_written(count: usize) {
        counter!(MetricName::OutputRowsWritten.as_str()).increment(count as u64);
    }

    pub fn bytes_written(bytes: u64) {
        histogram!(MetricName::OutputBytesWritten.as_str()).record(bytes as f64);
    }
}

pub mod quality_gate {
    use super::*;

    pub fn issue_detected(issue_type: &str, severity: &str) {
        counter!(
            MetricName::QualityGateIssuesDetected.as_str(),
            "issue_type" => issue_type.to_string(),
            "severity" => severity.to_string()
        )
        .increment(1);
    }
}

pub fn pipeline_duration(secs: f64) {
    histogram!(MetricName::PipelineDuration.as_str()).record(secs);
}
