/// Literal constants shared by the cleaning rules. None of these are configurable.

/// Base used to synthesize a status URL when a tweet has no expanded URL
pub const STATUS_URL_BASE: &str = "https://twitter.com/dog_rates/status/";

/// Sentinel the archive uses for an absent name or dog stage
pub const NONE_SENTINEL: &str = "None";

/// Substring marking a tweet as a repost of someone else's content
pub const RETWEET_MARKER: &str = "RT @";

/// Every rating is rectified onto this denominator
pub const RATING_DENOMINATOR: u32 = 10;

// Source table names, used in error messages and quality issues
pub const ARCHIVE_TABLE: &str = "archive";
pub const PREDICTIONS_TABLE: &str = "predictions";
pub const METRICS_TABLE: &str = "metrics";

// Default file names of the three sources and the cleaned output
pub const DEFAULT_ARCHIVE_FILE: &str = "twitter-archive-enhanced.csv";
pub const DEFAULT_PREDICTIONS_FILE: &str = "image-predictions.tsv";
pub const DEFAULT_METRICS_FILE: &str = "tweet-json.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "twitter_archive_master.csv";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "wrangle.toml";

/// Archive columns the loader requires in the header row
pub const ARCHIVE_COLUMNS: [&str; 17] = [
    "tweet_id",
    "in_reply_to_status_id",
    "in_reply_to_user_id",
    "timestamp",
    "source",
    "text",
    "retweeted_status_id",
    "retweeted_status_user_id",
    "retweeted_status_timestamp",
    "expanded_urls",
    "rating_numerator",
    "rating_denominator",
    "name",
    "doggo",
    "floofer",
    "pupper",
    "puppo",
];

/// Prediction columns the loader requires in the header row
pub const PREDICTION_COLUMNS: [&str; 12] = [
    "tweet_id", "jpg_url", "img_num", "p1", "p1_conf", "p1_dog", "p2", "p2_conf", "p2_dog", "p3",
    "p3_conf", "p3_dog",
];

/// Dog stage indicator columns, in the order their values are concatenated
pub const STAGE_COLUMNS: [&str; 4] = ["doggo", "floofer", "pupper", "puppo"];
