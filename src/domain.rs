use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Rendering used for every timestamp written to the cleaned table
pub const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// One row of the tweet archive exactly as it appears on disk.
///
/// Empty cells deserialize to `None`; sentinels such as `"None"` are kept
/// verbatim until the normalizer sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub tweet_id: i64,
    pub in_reply_to_status_id: Option<String>,
    pub in_reply_to_user_id: Option<String>,
    pub timestamp: String,
    pub source: String,
    pub text: String,
    pub retweeted_status_id: Option<String>,
    pub retweeted_status_user_id: Option<String>,
    pub retweeted_status_timestamp: Option<String>,
    pub expanded_urls: Option<String>,
    pub rating_numerator: u32,
    pub rating_denominator: u32,
    pub name: Option<String>,
    pub doggo: Option<String>,
    pub floofer: Option<String>,
    pub pupper: Option<String>,
    pub puppo: Option<String>,
}

/// A single (label, confidence, is-dog) guess from the image classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    pub is_dog: bool,
}

/// Classifier output for the photo attached to a tweet, best guess first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrediction {
    pub tweet_id: i64,
    pub jpg_url: String,
    pub img_num: u32,
    pub predictions: [Prediction; 3],
}

/// Engagement counters hydrated from the tweet JSON feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub tweet_id: i64,
    pub retweet_count: u64,
    pub favorite_count: u64,
}

/// Archive fields after the per-column repairs, shared by every later stage
#[derive(Debug, Clone, PartialEq)]
pub struct Tweet {
    pub tweet_id: i64,
    pub in_reply_to_status_id: Option<i64>,
    pub in_reply_to_user_id: Option<i64>,
    pub timestamp: DateTime<FixedOffset>,
    /// Short client label, e.g. "Twitter for iPhone"
    pub source: String,
    pub text: String,
    pub retweeted_status_id: Option<i64>,
    pub retweeted_status_user_id: Option<i64>,
    pub retweeted_status_timestamp: Option<DateTime<FixedOffset>>,
    pub expanded_urls: String,
    pub rating_numerator: u32,
    pub rating_denominator: u32,
    pub name: Option<String>,
}

/// The four dog stage columns with the `"None"` sentinel already mapped to `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageIndicators {
    pub doggo: Option<String>,
    pub floofer: Option<String>,
    pub pupper: Option<String>,
    pub puppo: Option<String>,
}

impl StageIndicators {
    /// Indicator values in concatenation order
    pub fn in_order(&self) -> [Option<&str>; 4] {
        [
            self.doggo.as_deref(),
            self.floofer.as_deref(),
            self.pupper.as_deref(),
            self.puppo.as_deref(),
        ]
    }

    pub fn count_set(&self) -> usize {
        self.in_order().iter().filter(|v| v.is_some()).count()
    }
}

/// Output of the quality normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub tweet: Tweet,
    pub stages: StageIndicators,
}

/// Output of the stage consolidator: the four indicators folded into one field
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRecord {
    pub tweet: Tweet,
    pub stage: Option<String>,
}

/// A staged archive record joined with its engagement counters
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub tweet: Tweet,
    pub stage: Option<String>,
    pub retweet_count: u64,
    pub favorite_count: u64,
}

/// Columns of the cleaned table, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    TweetId,
    InReplyToStatusId,
    InReplyToUserId,
    Timestamp,
    Source,
    Text,
    RetweetedStatusId,
    RetweetedStatusUserId,
    RetweetedStatusTimestamp,
    ExpandedUrls,
    RatingNumerator,
    RatingDenominator,
    Name,
    Stage,
    RetweetCount,
    FavoriteCount,
}

impl Column {
    pub const ALL: [Column; 16] = [
        Column::TweetId,
        Column::InReplyToStatusId,
        Column::InReplyToUserId,
        Column::Timestamp,
        Column::Source,
        Column::Text,
        Column::RetweetedStatusId,
        Column::RetweetedStatusUserId,
        Column::RetweetedStatusTimestamp,
        Column::ExpandedUrls,
        Column::RatingNumerator,
        Column::RatingDenominator,
        Column::Name,
        Column::Stage,
        Column::RetweetCount,
        Column::FavoriteCount,
    ];

    /// Header name written to the cleaned table
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::TweetId => "tweet_id",
            Column::InReplyToStatusId => "in_reply_to_status_id",
            Column::InReplyToUserId => "in_reply_to_user_id",
            Column::Timestamp => "timestamp",
            Column::Source => "source",
            Column::Text => "text",
            Column::RetweetedStatusId => "retweeted_status_id",
            Column::RetweetedStatusUserId => "retweeted_status_user_id",
            Column::RetweetedStatusTimestamp => "retweeted_status_timestamp",
            Column::ExpandedUrls => "expanded_urls",
            Column::RatingNumerator => "rating_numerator",
            Column::RatingDenominator => "rating_denominator",
            Column::Name => "name",
            Column::Stage => "stage",
            Column::RetweetCount => "retweet_count",
            Column::FavoriteCount => "favorite_count",
        }
    }
}

impl CleanedRecord {
    /// Render one cell; `None` is a missing value
    pub fn cell(&self, column: Column) -> Option<String> {
        let t = &self.tweet;
        match column {
            Column::TweetId => Some(t.tweet_id.to_string()),
            Column::InReplyToStatusId => t.in_reply_to_status_id.map(|v| v.to_string()),
            Column::InReplyToUserId => t.in_reply_to_user_id.map(|v| v.to_string()),
            Column::Timestamp => Some(t.timestamp.format(TIMESTAMP_OUTPUT_FORMAT).to_string()),
            Column::Source => Some(t.source.clone()),
            Column::Text => Some(t.text.clone()),
            Column::RetweetedStatusId => t.retweeted_status_id.map(|v| v.to_string()),
            Column::RetweetedStatusUserId => t.retweeted_status_user_id.map(|v| v.to_string()),
            Column::RetweetedStatusTimestamp => t
                .retweeted_status_timestamp
                .map(|ts| ts.format(TIMESTAMP_OUTPUT_FORMAT).to_string()),
            Column::ExpandedUrls => Some(t.expanded_urls.clone()),
            Column::RatingNumerator => Some(t.rating_numerator.to_string()),
            Column::RatingDenominator => Some(t.rating_denominator.to_string()),
            Column::Name => t.name.clone(),
            Column::Stage => self.stage.clone(),
            Column::RetweetCount => Some(self.retweet_count.to_string()),
            Column::FavoriteCount => Some(self.favorite_count.to_string()),
        }
    }

    pub fn is_missing(&self, column: Column) -> bool {
        let t = &self.tweet;
        match column {
            Column::InReplyToStatusId => t.in_reply_to_status_id.is_none(),
            Column::InReplyToUserId => t.in_reply_to_user_id.is_none(),
            Column::RetweetedStatusId => t.retweeted_status_id.is_none(),
            Column::RetweetedStatusUserId => t.retweeted_status_user_id.is_none(),
            Column::RetweetedStatusTimestamp => t.retweeted_status_timestamp.is_none(),
            Column::Name => t.name.is_none(),
            Column::Stage => self.stage.is_none(),
            _ => false,
        }
    }
}

/// The merged table plus the set of columns it will be written with
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub columns: Vec<Column>,
    pub records: Vec<CleanedRecord>,
}

impl CleanedTable {
    pub fn new(records: Vec<CleanedRecord>) -> Self {
        Self {
            columns: Column::ALL.to_vec(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::as_str).collect()
    }
}
