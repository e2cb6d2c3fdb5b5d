use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use dog_rates_wrangler::app::clean_use_case::CleanUseCase;
use dog_rates_wrangler::error::WrangleError;
use dog_rates_wrangler::infra::{CsvOutputAdapter, ReqwestFetcher};
use dog_rates_wrangler::pipeline::ingestion::{SourceLocation, SourceSet};
use tempfile::{tempdir, TempDir};

const ARCHIVE_HEADER: &str = "tweet_id,in_reply_to_status_id,in_reply_to_user_id,timestamp,source,text,retweeted_status_id,retweeted_status_user_id,retweeted_status_timestamp,expanded_urls,rating_numerator,rating_denominator,name,doggo,floofer,pupper,puppo";

const IPHONE: &str = r#""<a href=""http://twitter.com/download/iphone"" rel=""nofollow"">Twitter for iPhone</a>""#;
const WEB: &str = r#""<a href=""http://twitter.com"" rel=""nofollow"">Twitter Web Client</a>""#;

fn archive_rows() -> Vec<String> {
    vec![
        format!("892420643555336193,,,2017-08-01 16:23:56 +0000,{IPHONE},\"This is Phineas. He's a mystical boy, only ever appears in the hole of a donut. 13/10\",,,,https://twitter.com/dog_rates/status/892420643555336193/photo/1,13,10,Phineas,None,None,None,None"),
        format!("709198395643068416,,,2016-03-14 02:04:08 +0000,{IPHONE},\"From left to right: Cletus, Jerome, Alejandro, Burp, & Titson. 45/50\",,,,,45,50,None,None,None,None,None"),
        format!("832088576586297345,8.32087547559809e+17,30582082.0,2017-02-16 04:45:50 +0000,{IPHONE},\"@docmisterio account started on 11/15/15\",,,,,11,15,None,None,None,None,None"),
        format!("888202515573088257,,,2017-07-21 01:02:36 +0000,{IPHONE},\"RT @dog_rates: This is Canela. 13/10\",8.87473957103952e+17,4196983835.0,2017-07-19 00:47:34 +0000,https://twitter.com/dog_rates/status/887473957103951883/photo/1,13,10,Canela,None,None,None,None"),
        format!("666020888022790149,,,2015-11-15 22:32:08 +0000,{WEB},\"Here we have a Japanese Irish Setter. 8/10\",,,,https://twitter.com/dog_rates/status/666020888022790149/photo/1,8,10,None,None,None,None,None"),
        format!("740373189193256964,,,2016-06-08 02:41:38 +0000,{IPHONE},\"After so many requests, this is Bretagne. 14/10 for all 9/11 dogs\",,,,,9,11,None,doggo,None,None,None"),
    ]
}

const PREDICTIONS: &str = "tweet_id\tjpg_url\timg_num\tp1\tp1_conf\tp1_dog\tp2\tp2_conf\tp2_dog\tp3\tp3_conf\tp3_dog\n\
666020888022790149\thttps://pbs.twimg.com/media/CT4udn0WwAA0aMy.jpg\t1\tWelsh_springer_spaniel\t0.465074\tTrue\tcollie\t0.156665\tTrue\tShetland_sheepdog\t0.0614285\tTrue\n";

const METRICS_LINES: [&str; 6] = [
    r#"{"id": 892420643555336193, "retweet_count": 8853, "favorite_count": 39467, "lang": "en"}"#,
    r#"{"id": 709198395643068416, "retweet_count": 721, "favorite_count": 2634}"#,
    r#"{"id": 832088576586297345, "retweet_count": 59, "favorite_count": 637}"#,
    r#"{"id": 888202515573088257, "retweet_count": 2321, "favorite_count": 0}"#,
    r#"{"id": 740373189193256964, "retweet_count": 13076, "favorite_count": 36660}"#,
    r#"{"id": 1, "retweet_count": 1, "favorite_count": 1}"#,
];

struct Fixture {
    dir: TempDir,
    sources: SourceSet,
}

impl Fixture {
    fn new(archive_rows: &[String]) -> Result<Self> {
        let dir = tempdir()?;
        let archive = dir.path().join("twitter-archive-enhanced.csv");
        let predictions = dir.path().join("image-predictions.tsv");
        let metrics = dir.path().join("tweet-json.txt");

        let mut csv = String::from(ARCHIVE_HEADER);
        for row in archive_rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv.push('\n');
        std::fs::write(&archive, csv)?;
        std::fs::write(&predictions, PREDICTIONS)?;
        std::fs::write(&metrics, METRICS_LINES.join("\n"))?;

        let sources = SourceSet {
            archive: SourceLocation::Path(archive),
            predictions: SourceLocation::Path(predictions),
            metrics: SourceLocation::Path(metrics),
        };
        Ok(Self { dir, sources })
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out").join("twitter_archive_master.csv")
    }
}

fn use_case(output: &Path) -> Result<CleanUseCase> {
    Ok(CleanUseCase::new(
        Box::new(ReqwestFetcher::new(Duration::from_secs(5))?),
        Box::new(CsvOutputAdapter::new(output)),
    ))
}

fn read_output(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((header, rows))
}

#[tokio::test]
async fn test_clean_run_produces_master_table() -> Result<()> {
    let fixture = Fixture::new(&archive_rows())?;
    let output = fixture.output();

    let summary = use_case(&output)?.run(&fixture.sources).await?;

    assert_eq!(summary.archive_rows, 6);
    assert_eq!(summary.prediction_rows, 1);
    assert_eq!(summary.metrics_rows, 6);
    assert_eq!(summary.cleaned_rows, 2);

    let (header, rows) = read_output(&output)?;
    assert_eq!(
        header,
        vec![
            "tweet_id",
            "timestamp",
            "source",
            "text",
            "expanded_urls",
            "rating_numerator",
            "rating_denominator",
            "retweet_count",
            "favorite_count",
        ]
    );

    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    // Retweet, unmatched row and both non-ratings are gone; archive order is kept
    assert_eq!(ids, vec!["892420643555336193", "709198395643068416"]);

    let phineas = &rows[0];
    assert_eq!(phineas[1], "2017-08-01 16:23:56+00:00");
    assert_eq!(phineas[2], "Twitter for iPhone");
    assert_eq!((phineas[5].as_str(), phineas[6].as_str()), ("10", "10"));
    assert_eq!((phineas[7].as_str(), phineas[8].as_str()), ("8853", "39467"));

    let five_dogs = &rows[1];
    assert_eq!(five_dogs[4], "https://twitter.com/dog_rates/status/709198395643068416");
    assert_eq!((five_dogs[5].as_str(), five_dogs[6].as_str()), ("9", "10"));

    assert!(rows.iter().all(|r| r[6] == "10"));
    Ok(())
}

#[tokio::test]
async fn test_rerun_is_byte_identical() -> Result<()> {
    let fixture = Fixture::new(&archive_rows())?;
    let output = fixture.output();

    let first = use_case(&output)?.run(&fixture.sources).await?;
    let first_bytes = std::fs::read(&output)?;
    let second = use_case(&output)?.run(&fixture.sources).await?;
    let second_bytes = std::fs::read(&output)?;

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.receipt.sha256, second.receipt.sha256);
    Ok(())
}

#[tokio::test]
async fn test_complete_optional_columns_are_kept() -> Result<()> {
    // Only rows with a name and a stage survive, so both columns stay
    let rows = vec![format!(
        "892420643555336193,,,2017-08-01 16:23:56 +0000,{IPHONE},\"This is Phineas. 13/10\",,,,,13,10,Phineas,None,None,pupper,None"
    )];
    let fixture = Fixture::new(&rows)?;
    let output = fixture.output();

    use_case(&output)?.run(&fixture.sources).await?;

    let (header, rows) = read_output(&output)?;
    let name = header.iter().position(|h| h == "name").expect("name column kept");
    let stage = header.iter().position(|h| h == "stage").expect("stage column kept");
    assert_eq!(rows[0][name], "Phineas");
    assert_eq!(rows[0][stage], "pupper");
    assert!(!header.iter().any(|h| h == "in_reply_to_status_id"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_source_markup_aborts_without_output() -> Result<()> {
    let mut rows = archive_rows();
    rows.push(
        "700000000000000000,,,2016-02-17 16:00:00 +0000,\"<a href=x>Twitter for iPhone\",\"Broken source. 11/10\",,,,,11,10,None,None,None,None,None"
            .to_string(),
    );
    let fixture = Fixture::new(&rows)?;
    let output = fixture.output();

    let err = use_case(&output)?.run(&fixture.sources).await.unwrap_err();

    let cause = err.downcast_ref::<WrangleError>().expect("typed pipeline error");
    assert!(matches!(cause, WrangleError::Format { at, .. } if at.contains("700000000000000000")));
    assert!(!output.exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_archive_column_is_schema_error() -> Result<()> {
    let fixture = Fixture::new(&archive_rows())?;
    let SourceLocation::Path(archive) = &fixture.sources.archive else {
        unreachable!()
    };
    std::fs::write(archive, "tweet_id,timestamp\n1,2017-08-01 16:23:56 +0000\n")?;
    let output = fixture.output();

    let err = use_case(&output)?.run(&fixture.sources).await.unwrap_err();

    let cause = err.downcast_ref::<WrangleError>().expect("typed pipeline error");
    assert!(matches!(cause, WrangleError::Schema { table, .. } if table == "archive"));
    assert!(!output.exists());
    Ok(())
}
