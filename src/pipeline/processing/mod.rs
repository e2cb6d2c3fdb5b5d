// Pipeline processing: per-column repairs, consolidation, join, filtering and rectification

pub mod completeness;
pub mod merge;
pub mod normalize;
pub mod quality_gate;
pub mod rating;
pub mod retweet;
pub mod stage;

use tracing::instrument;

use crate::domain::{ArchiveRecord, CleanedTable, EngagementMetrics};
use crate::error::Result;

use normalize::ArchiveNormalizer;

/// Run every cleaning stage in order over the loaded archive and metrics.
///
/// normalize -> consolidate stages -> inner join -> drop retweets -> rectify
/// ratings -> drop incomplete columns. Fails on the first malformed row; no
/// partial table is returned.
#[instrument(skip_all, fields(archive_rows = archive.len(), metrics_rows = metrics.len()))]
pub fn clean_tables(archive: &[ArchiveRecord], metrics: &[EngagementMetrics]) -> Result<CleanedTable> {
    let normalized = ArchiveNormalizer::new().normalize_all(archive)?;
    let staged = stage::consolidate_stages(normalized);
    let merged = merge::merge_tables(staged, metrics);
    let originals = retweet::filter_retweets(merged);
    let rectified = rating::rectify_ratings(originals);
    Ok(completeness::drop_incomplete_columns(CleanedTable::new(rectified)))
}
