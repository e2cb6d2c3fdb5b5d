use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::domain::{CleanedRecord, EngagementMetrics, StagedRecord};
use crate::observability::metrics::merge as merge_metrics;

/// Inner join of the staged archive with the engagement counters on tweet id.
///
/// Archive order is kept. Rows with no partner on the other side are dropped
/// without error; every retained record must carry engagement counters.
pub fn merge_tables(archive: Vec<StagedRecord>, metrics: &[EngagementMetrics]) -> Vec<CleanedRecord> {
    if archive.len() != metrics.len() {
        warn!(
            archive_rows = archive.len(),
            metrics_rows = metrics.len(),
            "archive and metrics row counts differ; unmatched rows will be dropped"
        );
    }

    let mut by_id: HashMap<i64, Vec<&EngagementMetrics>> = HashMap::with_capacity(metrics.len());
    for m in metrics {
        by_id.entry(m.tweet_id).or_default().push(m);
    }

    let mut matched_ids = HashSet::new();
    let mut archive_dropped = 0;
    let mut merged = Vec::with_capacity(archive.len().min(metrics.len()));

    for staged in archive {
        let Some(partners) = by_id.get(&staged.tweet.tweet_id) else {
            archive_dropped += 1;
            continue;
        };
        matched_ids.insert(staged.tweet.tweet_id);
        for m in partners {
            merged.push(CleanedRecord {
                tweet: staged.tweet.clone(),
                stage: staged.stage.clone(),
                retweet_count: m.retweet_count,
                favorite_count: m.favorite_count,
            });
        }
    }

    let metrics_dropped = metrics
        .iter()
        .filter(|m| !matched_ids.contains(&m.tweet_id))
        .count();

    merge_metrics::rows_joined(merged.len());
    merge_metrics::rows_dropped("archive", archive_dropped);
    merge_metrics::rows_dropped("metrics", metrics_dropped);
    info!(
        "Merged {} rows ({} archive rows and {} metrics rows without a partner)",
        merged.len(),
        archive_dropped,
        metrics_dropped
    );

    merged
}
