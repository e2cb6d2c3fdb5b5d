use tracing::info;

use crate::constants::RETWEET_MARKER;
use crate::domain::CleanedRecord;
use crate::observability::metrics::retweet as retweet_metrics;

/// A tweet is a repost when `"RT @"` appears anywhere in its text, not only at the start
pub fn is_retweet(text: &str) -> bool {
    text.contains(RETWEET_MARKER)
}

/// Drop reposts. The survivors keep their relative order and are contiguous from zero.
pub fn filter_retweets(records: Vec<CleanedRecord>) -> Vec<CleanedRecord> {
    let before = records.len();
    let kept: Vec<CleanedRecord> = records
        .into_iter()
        .filter(|r| !is_retweet(&r.tweet.text))
        .collect();

    let removed = before - kept.len();
    retweet_metrics::rows_removed(removed);
    info!("Removed {} retweets, {} original tweets remain", removed, kept.len());
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tweet;
    use chrono::DateTime;

    fn record(id: i64, text: &str) -> CleanedRecord {
        CleanedRecord {
            tweet: Tweet {
                tweet_id: id,
                in_reply_to_status_id: None,
                in_reply_to_user_id: None,
                timestamp: DateTime::parse_from_rfc3339("2017-08-01T16:23:56+00:00").unwrap(),
                source: "Twitter for iPhone".to_string(),
                text: text.to_string(),
                retweeted_status_id: None,
                retweeted_status_user_id: None,
                retweeted_status_timestamp: None,
                expanded_urls: String::new(),
                rating_numerator: 10,
                rating_denominator: 10,
                name: None,
            },
            stage: None,
            retweet_count: 0,
            favorite_count: 0,
        }
    }

    #[test]
    fn test_marker_anywhere_in_text_counts() {
        assert!(is_retweet("RT @dog_rates: This is Bo. 12/10"));
        assert!(is_retweet("Great pupper. RT @someone said so 11/10"));
        assert!(!is_retweet("RT this if you love dogs 13/10"));
        assert!(!is_retweet("rt @dog_rates lower case is kept"));
    }

    #[test]
    fn test_filter_removes_exactly_the_marked_rows() {
        let records = vec![
            record(1, "This is Phineas. 13/10"),
            record(2, "RT @dog_rates: This is Bo. 12/10"),
            record(3, "This is Tilly. 13/10"),
            record(4, "quoted RT @foo inside 10/10"),
        ];
        let marked = records.iter().filter(|r| is_retweet(&r.tweet.text)).count();

        let kept = filter_retweets(records);
        assert_eq!(kept.len(), 4 - marked);
        let ids: Vec<i64> = kept.iter().map(|r| r.tweet.tweet_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
