use std::collections::HashMap;

use tracing::{debug, info};

use crate::constants::RATING_DENOMINATOR;
use crate::domain::CleanedRecord;
use crate::observability::metrics::rating as rating_metrics;

/// What to do with a tweet whose extracted rating is known to be wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingAction {
    /// Not a rating at all; the row leaves the table
    Delete,
    /// Replace the rating pair outright
    Override { numerator: u32, denominator: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingException {
    pub tweet_id: i64,
    pub action: RatingAction,
    pub rationale: &'static str,
}

/// Hand-checked ratings. Applied after the general rule and wins over it.
pub const RATING_EXCEPTIONS: [RatingException; 6] = [
    RatingException {
        tweet_id: 832088576586297345,
        action: RatingAction::Delete,
        rationale: "account launch post, not a rating",
    },
    RatingException {
        tweet_id: 740373189193256964,
        action: RatingAction::Delete,
        rationale: "date reference (9/11), not a rating",
    },
    RatingException {
        tweet_id: 722974582966214656,
        action: RatingAction::Override { numerator: 10, denominator: 10 },
        rationale: "4/20 extracted instead of 13/10",
    },
    RatingException {
        tweet_id: 709198395643068416,
        action: RatingAction::Override { numerator: 9, denominator: 10 },
        rationale: "45/50 for five dogs, 9/10 each",
    },
    RatingException {
        tweet_id: 686035780142297088,
        action: RatingAction::Override { numerator: 2, denominator: 10 },
        rationale: "4/20 rescaled to tenths",
    },
    RatingException {
        tweet_id: 682962037429899265,
        action: RatingAction::Override { numerator: 6, denominator: 10 },
        rationale: "7/11 rescaled to the nearest whole tenth",
    },
];

/// General rule: a numerator at or above its denominator is a perfect 10/10.
/// Anything else passes through untouched, whatever its denominator.
pub fn rectify_rating(numerator: u32, denominator: u32) -> (u32, u32) {
    if numerator >= denominator {
        (RATING_DENOMINATOR, RATING_DENOMINATOR)
    } else {
        (numerator, denominator)
    }
}

/// Rectify every rating with the general rule, then apply `RATING_EXCEPTIONS`
pub fn rectify_ratings(records: Vec<CleanedRecord>) -> Vec<CleanedRecord> {
    rectify_ratings_with(records, &RATING_EXCEPTIONS)
}

pub fn rectify_ratings_with(
    records: Vec<CleanedRecord>,
    exceptions: &[RatingException],
) -> Vec<CleanedRecord> {
    let table: HashMap<i64, &RatingException> =
        exceptions.iter().map(|e| (e.tweet_id, e)).collect();

    let mut collapsed = 0;
    let mut overridden = 0;
    let mut deleted = 0;
    let mut rectified = Vec::with_capacity(records.len());

    for mut record in records {
        let t = &mut record.tweet;
        let before = (t.rating_numerator, t.rating_denominator);
        let (numerator, denominator) = rectify_rating(before.0, before.1);
        if (numerator, denominator) != before {
            collapsed += 1;
        }
        t.rating_numerator = numerator;
        t.rating_denominator = denominator;

        if let Some(exception) = table.get(&t.tweet_id) {
            match exception.action {
                RatingAction::Delete => {
                    debug!(tweet_id = t.tweet_id, reason = exception.rationale, "deleting row");
                    deleted += 1;
                    continue;
                }
                RatingAction::Override { numerator, denominator } => {
                    debug!(tweet_id = t.tweet_id, reason = exception.rationale, "overriding rating");
                    t.rating_numerator = numerator;
                    t.rating_denominator = denominator;
                    overridden += 1;
                }
            }
        }

        rectified.push(record);
    }

    rating_metrics::rows_collapsed(collapsed);
    rating_metrics::rows_overridden(overridden);
    rating_metrics::rows_deleted(deleted);
    info!(
        "Rectified ratings: {} collapsed to 10/10, {} overridden, {} deleted",
        collapsed, overridden, deleted
    );

    rectified
}
