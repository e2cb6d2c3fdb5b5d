use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use crate::app::ports::SourceFetcherPort;
use crate::constants::{ARCHIVE_TABLE, METRICS_TABLE, PREDICTIONS_TABLE};
use crate::domain::{ArchiveRecord, EngagementMetrics, ImagePrediction};
use crate::error::{Result, WrangleError};
use crate::observability::metrics::sources;

use super::readers::{read_archive, read_metrics, read_predictions};

/// Where a source table comes from: a local file or a URL to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Path(PathBuf),
    Url(String),
}

impl SourceLocation {
    /// Anything starting with `http://` or `https://` is fetched, everything else is a path
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SourceLocation::Url(trimmed.to_string())
        } else {
            SourceLocation::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Path(p) => write!(f, "{}", p.display()),
            SourceLocation::Url(u) => write!(f, "{u}"),
        }
    }
}

/// The three sources of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub archive: SourceLocation,
    pub predictions: SourceLocation,
    pub metrics: SourceLocation,
}

/// The three sources read into memory
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTables {
    pub archive: Vec<ArchiveRecord>,
    pub predictions: Vec<ImagePrediction>,
    pub metrics: Vec<EngagementMetrics>,
}

pub struct SourceLoader<'a> {
    fetcher: &'a dyn SourceFetcherPort,
}

impl<'a> SourceLoader<'a> {
    pub fn new(fetcher: &'a dyn SourceFetcherPort) -> Self {
        Self { fetcher }
    }

    /// Load all three tables. Any failure aborts the load; there is no retry.
    #[instrument(skip(self))]
    pub async fn load(&self, set: &SourceSet) -> Result<SourceTables> {
        let archive_bytes = self.read_bytes(ARCHIVE_TABLE, &set.archive).await?;
        let archive = read_archive(archive_bytes.as_slice())?;
        sources::rows_loaded(ARCHIVE_TABLE, archive.len());

        let prediction_bytes = self.read_bytes(PREDICTIONS_TABLE, &set.predictions).await?;
        let predictions = read_predictions(prediction_bytes.as_slice())?;
        sources::rows_loaded(PREDICTIONS_TABLE, predictions.len());

        let metrics_bytes = self.read_bytes(METRICS_TABLE, &set.metrics).await?;
        let metrics = read_metrics(metrics_bytes.as_slice())?;
        sources::rows_loaded(METRICS_TABLE, metrics.len());

        info!(
            "Loaded {} archive rows, {} predictions, {} metrics lines",
            archive.len(),
            predictions.len(),
            metrics.len()
        );

        Ok(SourceTables {
            archive,
            predictions,
            metrics,
        })
    }

    async fn read_bytes(&self, table: &str, location: &SourceLocation) -> Result<Vec<u8>> {
        let started = Instant::now();
        let bytes = match location {
            SourceLocation::Path(path) => read_file(path).await?,
            SourceLocation::Url(url) => {
                info!("Fetching {} table from {}", table, url);
                self.fetcher.fetch(url).await?
            }
        };
        sources::load_duration(table, started.elapsed().as_secs_f64());
        sources::bytes_loaded(table, bytes.len());
        Ok(bytes)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        WrangleError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    struct MockFetcher {
        body: Vec<u8>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceFetcherPort for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_source_location_parse() {
        assert_eq!(
            SourceLocation::parse("https://example.com/image-predictions.tsv"),
            SourceLocation::Url("https://example.com/image-predictions.tsv".to_string())
        );
        assert_eq!(
            SourceLocation::parse("data/archive.csv"),
            SourceLocation::Path(PathBuf::from("data/archive.csv"))
        );
    }

    #[tokio::test]
    async fn test_load_reads_files_and_fetches_urls() {
        let archive = temp_file(
            "tweet_id,in_reply_to_status_id,in_reply_to_user_id,timestamp,source,text,retweeted_status_id,retweeted_status_user_id,retweeted_status_timestamp,expanded_urls,rating_numerator,rating_denominator,name,doggo,floofer,pupper,puppo\n\
             1,,,2017-08-01 16:23:56 +0000,<a href=x>Twitter for iPhone</a>,hello 12/10,,,,,12,10,Rex,None,None,None,None\n",
        );
        let metrics = temp_file("{\"id\": 1, \"retweet_count\": 5, \"favorite_count\": 9}\n");
        let fetcher = MockFetcher {
            body: b"tweet_id\tjpg_url\timg_num\tp1\tp1_conf\tp1_dog\tp2\tp2_conf\tp2_dog\tp3\tp3_conf\tp3_dog\n1\tu\t1\ta\t0.5\tTrue\tb\t0.3\tFalse\tc\t0.1\tTrue\n".to_vec(),
            requested: Mutex::new(Vec::new()),
        };

        let set = SourceSet {
            archive: SourceLocation::Path(archive.path().to_path_buf()),
            predictions: SourceLocation::Url("https://example.com/p.tsv".to_string()),
            metrics: SourceLocation::Path(metrics.path().to_path_buf()),
        };

        let tables = SourceLoader::new(&fetcher).load(&set).await.unwrap();
        assert_eq!(tables.archive.len(), 1);
        assert_eq!(tables.predictions.len(), 1);
        assert_eq!(tables.metrics[0].favorite_count, 9);
        assert_eq!(*fetcher.requested.lock().unwrap(), vec!["https://example.com/p.tsv".to_string()]);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let fetcher = MockFetcher { body: Vec::new(), requested: Mutex::new(Vec::new()) };
        let set = SourceSet {
            archive: SourceLocation::Path(PathBuf::from("/definitely/not/here.csv")),
            predictions: SourceLocation::Path(PathBuf::from("/definitely/not/here.tsv")),
            metrics: SourceLocation::Path(PathBuf::from("/definitely/not/here.txt")),
        };
        let err = SourceLoader::new(&fetcher).load(&set).await.unwrap_err();
        assert!(matches!(err, WrangleError::Io(_)));
    }
}
