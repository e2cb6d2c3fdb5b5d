use chrono::{DateTime, FixedOffset, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::constants::{ARCHIVE_TABLE, NONE_SENTINEL, STATUS_URL_BASE};
use crate::domain::{ArchiveRecord, NormalizedRecord, StageIndicators, Tweet};
use crate::error::{Result, WrangleError};
use crate::observability::metrics::normalize as normalize_metrics;

/// First `>` through the closing anchor tag; the capture is the client label
static SOURCE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^[^>]*>(.*)</a>\s*$").expect("source label pattern is valid"));

/// Timestamp layouts accepted on input: the archive's own layout, the cleaned
/// table's layout, and the tweet JSON `created_at` layout.
const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%a %b %d %H:%M:%S %z %Y",
];

/// Layouts without an offset; these are read as UTC
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Trait for repairing archive rows into their typed, normalized shape
pub trait Normalizer {
    fn normalize(&self, record: &ArchiveRecord) -> Result<NormalizedRecord>;
}

/// Applies the fixed per-column repair rules to the tweet archive.
///
/// Every rule is idempotent: feeding a normalized value back through its rule
/// yields the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveNormalizer;

impl ArchiveNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a whole table, failing on the first bad row
    #[instrument(skip(self, records), fields(rows = records.len()))]
    pub fn normalize_all(&self, records: &[ArchiveRecord]) -> Result<Vec<NormalizedRecord>> {
        let mut normalized = Vec::with_capacity(records.len());
        let mut names_nulled = 0;
        let mut urls_backfilled = 0;

        for record in records {
            if record.expanded_urls.as_deref().map_or(true, |u| u.trim().is_empty()) {
                urls_backfilled += 1;
            }
            let n = self.normalize(record)?;
            if record.name.is_some() && n.tweet.name.is_none() {
                names_nulled += 1;
            }
            normalized.push(n);
        }

        normalize_metrics::records_processed(normalized.len());
        normalize_metrics::names_nulled(names_nulled);
        normalize_metrics::urls_backfilled(urls_backfilled);
        info!(
            "Normalized {} archive rows ({} names nulled, {} urls backfilled)",
            normalized.len(),
            names_nulled,
            urls_backfilled
        );

        Ok(normalized)
    }
}

impl Normalizer for ArchiveNormalizer {
    fn normalize(&self, record: &ArchiveRecord) -> Result<NormalizedRecord> {
        let id = record.tweet_id;

        let tweet = Tweet {
            tweet_id: id,
            in_reply_to_status_id: coerce_id("in_reply_to_status_id", record.in_reply_to_status_id.as_deref())?,
            in_reply_to_user_id: coerce_id("in_reply_to_user_id", record.in_reply_to_user_id.as_deref())?,
            timestamp: parse_timestamp("timestamp", &record.timestamp)?,
            source: extract_source_label(id, &record.source)?,
            text: record.text.clone(),
            retweeted_status_id: coerce_id("retweeted_status_id", record.retweeted_status_id.as_deref())?,
            retweeted_status_user_id: coerce_id(
                "retweeted_status_user_id",
                record.retweeted_status_user_id.as_deref(),
            )?,
            retweeted_status_timestamp: match non_empty(record.retweeted_status_timestamp.as_deref()) {
                Some(raw) => Some(parse_timestamp("retweeted_status_timestamp", raw)?),
                None => None,
            },
            expanded_urls: backfill_expanded_url(id, record.expanded_urls.as_deref()),
            rating_numerator: record.rating_numerator,
            rating_denominator: record.rating_denominator,
            name: normalize_name(record.name.as_deref()),
        };

        let stages = StageIndicators {
            doggo: null_sentinel(record.doggo.as_deref()),
            floofer: null_sentinel(record.floofer.as_deref()),
            pupper: null_sentinel(record.pupper.as_deref()),
            puppo: null_sentinel(record.puppo.as_deref()),
        };

        debug!(tweet_id = id, "normalized archive row");
        Ok(NormalizedRecord { tweet, stages })
    }
}

/// Reduce the client markup `<a href="...">Twitter for iPhone</a>` to its label.
///
/// A value without markup is taken to be a label already. Markup missing the
/// expected delimiters is a format error.
pub fn extract_source_label(tweet_id: i64, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if !trimmed.contains('<') && !trimmed.contains('>') {
        return Ok(trimmed.to_string());
    }

    SOURCE_LABEL
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| WrangleError::Format {
            source_name: format!("{ARCHIVE_TABLE}.source"),
            at: format!("tweet {tweet_id}"),
            message: format!("client markup without label delimiters: {raw:?}"),
        })
}

/// Missing expanded URLs become the tweet's canonical status URL
pub fn backfill_expanded_url(tweet_id: i64, expanded_urls: Option<&str>) -> String {
    match non_empty(expanded_urls) {
        Some(urls) => urls.to_string(),
        None => format!("{STATUS_URL_BASE}{tweet_id}"),
    }
}

pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok())
        .or_else(|| {
            NAIVE_TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .ok_or_else(|| WrangleError::parse(field, raw, "not a recognised date-time"))
}

/// `"None"` and names that are entirely lower case ("a", "the", "very") are not names
pub fn normalize_name(name: Option<&str>) -> Option<String> {
    let name = null_sentinel(name)?;
    if is_lowercase(&name) {
        None
    } else {
        Some(name)
    }
}

/// Map the `"None"` sentinel and empty cells to absent
pub fn null_sentinel(value: Option<&str>) -> Option<String> {
    match non_empty(value) {
        Some(v) if v == NONE_SENTINEL => None,
        Some(v) => Some(v.to_string()),
        None => None,
    }
}

/// Identifiers arrive as integers or as float text such as `8.86266357075e+17`
pub fn coerce_id(field: &str, raw: Option<&str>) -> Result<Option<i64>> {
    let Some(raw) = non_empty(raw) else {
        return Ok(None);
    };
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(Some(id));
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(Some(f.round() as i64)),
        _ => Err(WrangleError::parse(field, raw, "not an integer identifier")),
    }
}

/// Cased characters present and all of them lower case
fn is_lowercase(s: &str) -> bool {
    s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TIMESTAMP_OUTPUT_FORMAT;

    const IPHONE: &str =
        r#"<a href="http://twitter.com/download/iphone" rel="nofollow">Twitter for iPhone</a>"#;

    fn archive_record() -> ArchiveRecord {
        ArchiveRecord {
            tweet_id: 892420643555336193,
            in_reply_to_status_id: None,
            in_reply_to_user_id: None,
            timestamp: "2017-08-01 16:23:56 +0000".to_string(),
            source: IPHONE.to_string(),
            text: "This is Phineas. He's a mystical boy. 13/10".to_string(),
            retweeted_status_id: None,
            retweeted_status_user_id: None,
            retweeted_status_timestamp: None,
            expanded_urls: Some("https://twitter.com/dog_rates/status/892420643555336193/photo/1".to_string()),
            rating_numerator: 13,
            rating_denominator: 10,
            name: Some("Phineas".to_string()),
            doggo: Some("None".to_string()),
            floofer: Some("None".to_string()),
            pupper: Some("None".to_string()),
            puppo: Some("None".to_string()),
        }
    }

    /// Write a normalized record back into archive shape
    fn as_archive(n: &NormalizedRecord) -> ArchiveRecord {
        let t = &n.tweet;
        ArchiveRecord {
            tweet_id: t.tweet_id,
            in_reply_to_status_id: t.in_reply_to_status_id.map(|v| v.to_string()),
            in_reply_to_user_id: t.in_reply_to_user_id.map(|v| v.to_string()),
            timestamp: t.timestamp.format(TIMESTAMP_OUTPUT_FORMAT).to_string(),
            source: t.source.clone(),
            text: t.text.clone(),
            retweeted_status_id: t.retweeted_status_id.map(|v| v.to_string()),
            retweeted_status_user_id: t.retweeted_status_user_id.map(|v| v.to_string()),
            retweeted_status_timestamp: t
                .retweeted_status_timestamp
                .map(|ts| ts.format(TIMESTAMP_OUTPUT_FORMAT).to_string()),
            expanded_urls: Some(t.expanded_urls.clone()),
            rating_numerator: t.rating_numerator,
            rating_denominator: t.rating_denominator,
            name: t.name.clone(),
            doggo: n.stages.doggo.clone(),
            floofer: n.stages.floofer.clone(),
            pupper: n.stages.pupper.clone(),
            puppo: n.stages.puppo.clone(),
        }
    }

    #[test]
    fn test_source_label_extracted_from_markup() {
        assert_eq!(extract_source_label(1, IPHONE).unwrap(), "Twitter for iPhone");
        assert_eq!(
            extract_source_label(1, r#"<a href="http://vine.co" rel="nofollow">Vine - Make a Scene</a>"#).unwrap(),
            "Vine - Make a Scene"
        );
    }

    #[test]
    fn test_source_label_without_delimiters_is_format_error() {
        let err = extract_source_label(7, r#"<a href="http://twitter.com">TweetDeck"#).unwrap_err();
        match err {
            WrangleError::Format { source_name, at, .. } => {
                assert_eq!(source_name, "archive.source");
                assert_eq!(at, "tweet 7");
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_source_label_passes_plain_label_through() {
        assert_eq!(extract_source_label(1, "TweetDeck").unwrap(), "TweetDeck");
    }

    #[test]
    fn test_missing_expanded_url_is_backfilled() {
        assert_eq!(
            backfill_expanded_url(123, None),
            "https://twitter.com/dog_rates/status/123"
        );
        assert_eq!(
            backfill_expanded_url(123, Some("  ")),
            "https://twitter.com/dog_rates/status/123"
        );
        assert_eq!(backfill_expanded_url(123, Some("https://x/1")), "https://x/1");
    }

    #[test]
    fn test_lowercase_and_sentinel_names_are_nulled() {
        assert_eq!(normalize_name(Some("a")), None);
        assert_eq!(normalize_name(Some("such")), None);
        assert_eq!(normalize_name(Some("None")), None);
        assert_eq!(normalize_name(None), None);
        assert_eq!(normalize_name(Some("Phineas")), Some("Phineas".to_string()));
        assert_eq!(normalize_name(Some("O")), Some("O".to_string()));
    }

    #[test]
    fn test_timestamp_layouts() {
        let a = parse_timestamp("timestamp", "2017-08-01 16:23:56 +0000").unwrap();
        let b = parse_timestamp("timestamp", "2017-08-01 16:23:56+00:00").unwrap();
        let c = parse_timestamp("timestamp", "Tue Aug 01 16:23:56 +0000 2017").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.format(TIMESTAMP_OUTPUT_FORMAT).to_string(), "2017-08-01 16:23:56+00:00");
    }

    #[test]
    fn test_timestamp_without_offset_is_utc() {
        let naive = parse_timestamp("timestamp", "2017-08-01 16:23:56").unwrap();
        let explicit = parse_timestamp("timestamp", "2017-08-01 16:23:56 +0000").unwrap();
        assert_eq!(naive, explicit);
        assert_eq!(naive.offset().local_minus_utc(), 0);
        assert_eq!(naive.format(TIMESTAMP_OUTPUT_FORMAT).to_string(), "2017-08-01 16:23:56+00:00");
    }

    #[test]
    fn test_bad_timestamp_is_parse_error() {
        let err = parse_timestamp("timestamp", "yesterday-ish").unwrap_err();
        assert!(matches!(err, WrangleError::Parse { ref field, .. } if field == "timestamp"));
    }

    #[test]
    fn test_float_identifiers_are_coerced() {
        assert_eq!(coerce_id("id", Some("886266357075128320")).unwrap(), Some(886266357075128320));
        assert_eq!(coerce_id("id", Some("4196983835.0")).unwrap(), Some(4196983835));
        assert_eq!(coerce_id("id", None).unwrap(), None);
        assert!(coerce_id("id", Some("abc")).is_err());
    }

    #[test]
    fn test_normalize_record() {
        let mut record = archive_record();
        record.expanded_urls = None;
        record.name = Some("a".to_string());
        record.pupper = Some("pupper".to_string());

        let n = ArchiveNormalizer::new().normalize(&record).unwrap();
        assert_eq!(n.tweet.source, "Twitter for iPhone");
        assert_eq!(
            n.tweet.expanded_urls,
            "https://twitter.com/dog_rates/status/892420643555336193"
        );
        assert_eq!(n.tweet.name, None);
        assert_eq!(n.stages.doggo, None);
        assert_eq!(n.stages.pupper.as_deref(), Some("pupper"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut record = archive_record();
        record.in_reply_to_status_id = Some("8.86266357075e+17".to_string());
        record.expanded_urls = None;
        record.doggo = Some("doggo".to_string());

        let normalizer = ArchiveNormalizer::new();
        let once = normalizer.normalize(&record).unwrap();
        let twice = normalizer.normalize(&as_archive(&once)).unwrap();
        assert_eq!(once, twice);
    }
}
