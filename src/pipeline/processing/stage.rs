use tracing::{info, warn};

use crate::domain::{NormalizedRecord, StageIndicators, StagedRecord};
use crate::observability::metrics::stage as stage_metrics;

/// Fold the four stage indicators into one value.
///
/// Values are concatenated in `doggo, floofer, pupper, puppo` order, so a
/// record with exactly one indicator gets that indicator's value and a record
/// with none gets `None`. Two or more indicators produce a compound value such
/// as `"doggopupper"`; that is left as is.
pub fn consolidate_stage(indicators: &StageIndicators) -> Option<String> {
    let joined: String = indicators.in_order().iter().flatten().copied().collect();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Replace each record's indicator columns with its single `stage` field
pub fn consolidate_stages(records: Vec<NormalizedRecord>) -> Vec<StagedRecord> {
    let mut compound = 0;

    let staged: Vec<StagedRecord> = records
        .into_iter()
        .map(|record| {
            if record.stages.count_set() > 1 {
                compound += 1;
                warn!(
                    tweet_id = record.tweet.tweet_id,
                    "more than one stage indicator set; keeping concatenated value"
                );
            }
            StagedRecord {
                stage: consolidate_stage(&record.stages),
                tweet: record.tweet,
            }
        })
        .collect();

    stage_metrics::records_consolidated(staged.len());
    stage_metrics::compound_values(compound);
    info!("Consolidated stages for {} records ({} compound)", staged.len(), compound);
    staged
}
