use std::io::{BufRead, Read};

use csv::{ReaderBuilder, StringRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::constants::{
    ARCHIVE_COLUMNS, ARCHIVE_TABLE, METRICS_TABLE, PREDICTIONS_TABLE, PREDICTION_COLUMNS,
};
use crate::domain::{ArchiveRecord, EngagementMetrics, ImagePrediction, Prediction};
use crate::error::{Result, WrangleError};

/// Read the comma separated tweet archive
#[instrument(skip(reader))]
pub fn read_archive<R: Read>(reader: R) -> Result<Vec<ArchiveRecord>> {
    let records = read_delimited::<ArchiveRecord, R>(ARCHIVE_TABLE, b',', &ARCHIVE_COLUMNS, reader)?;
    debug!("Read {} archive rows", records.len());
    Ok(records)
}

/// Read the tab separated image prediction table
#[instrument(skip(reader))]
pub fn read_predictions<R: Read>(reader: R) -> Result<Vec<ImagePrediction>> {
    let rows =
        read_delimited::<PredictionRow, R>(PREDICTIONS_TABLE, b'\t', &PREDICTION_COLUMNS, reader)?;
    debug!("Read {} prediction rows", rows.len());
    Ok(rows.into_iter().map(ImagePrediction::from).collect())
}

/// Read the newline delimited tweet JSON feed, keeping only the engagement counters
#[instrument(skip(reader))]
pub fn read_metrics<R: BufRead>(reader: R) -> Result<Vec<EngagementMetrics>> {
    let mut metrics = Vec::new();

    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line_no = idx as u64 + 1;
        let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        // Bytes that are not UTF-8 are as malformed as broken JSON
        let text = std::str::from_utf8(line).map_err(|e| metrics_format_error(line_no, e))?;
        let value: Value =
            serde_json::from_str(text).map_err(|e| metrics_format_error(line_no, e))?;

        metrics.push(EngagementMetrics {
            tweet_id: required_i64(&value, "id", line_no)?,
            retweet_count: required_u64(&value, "retweet_count", line_no)?,
            favorite_count: required_u64(&value, "favorite_count", line_no)?,
        });
    }

    debug!("Read {} metrics lines", metrics.len());
    Ok(metrics)
}

fn metrics_format_error(line: u64, err: impl std::fmt::Display) -> WrangleError {
    WrangleError::Format {
        source_name: METRICS_TABLE.to_string(),
        at: format!("line {line}"),
        message: err.to_string(),
    }
}

fn required_field<'a>(value: &'a Value, key: &str, line: u64) -> Result<&'a Value> {
    match value.get(key) {
        Some(v) if !v.is_null() => Ok(v),
        _ => Err(WrangleError::parse(
            &format!("{METRICS_TABLE}.{key}"),
            "",
            format!("required field absent on line {line}"),
        )),
    }
}

fn required_i64(value: &Value, key: &str, line: u64) -> Result<i64> {
    let v = required_field(value, key, line)?;
    v.as_i64().ok_or_else(|| {
        WrangleError::parse(
            &format!("{METRICS_TABLE}.{key}"),
            &v.to_string(),
            format!("expected an integer on line {line}"),
        )
    })
}

fn required_u64(value: &Value, key: &str, line: u64) -> Result<u64> {
    let v = required_field(value, key, line)?;
    v.as_u64().ok_or_else(|| {
        WrangleError::parse(
            &format!("{METRICS_TABLE}.{key}"),
            &v.to_string(),
            format!("expected a non-negative integer on line {line}"),
        )
    })
}

/// Shared reader for the two delimited sources: checks the header row, then
/// deserializes row by row so a bad cell can be reported with its column and text.
fn read_delimited<T, R>(table: &str, delimiter: u8, required: &[&str], reader: R) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| format_error(table, &e))?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(WrangleError::schema(table, column));
        }
    }

    let mut rows = Vec::new();
    let mut raw = StringRecord::new();
    loop {
        match rdr.read_record(&mut raw) {
            Ok(false) => break,
            Ok(true) => {
                let row = raw
                    .deserialize::<T>(Some(&headers))
                    .map_err(|e| cell_error(table, &headers, &raw, &e))?;
                rows.push(row);
            }
            Err(e) => return Err(format_error(table, &e)),
        }
    }

    Ok(rows)
}

fn format_error(table: &str, err: &csv::Error) -> WrangleError {
    WrangleError::Format {
        source_name: table.to_string(),
        at: format!("line {}", err.position().map(|p| p.line()).unwrap_or(0)),
        message: err.to_string(),
    }
}

fn cell_error(table: &str, headers: &StringRecord, raw: &StringRecord, err: &csv::Error) -> WrangleError {
    let line = raw.position().map(|p| p.line()).unwrap_or(0);
    match err.kind() {
        csv::ErrorKind::Deserialize { err: de, .. } => {
            let index = de.field().map(|i| i as usize);
            let column = index.and_then(|i| headers.get(i)).unwrap_or("<row>");
            let value = index.and_then(|i| raw.get(i)).unwrap_or("");
            WrangleError::parse(
                &format!("{table}.{column}"),
                value,
                format!("{} (line {line})", de.kind()),
            )
        }
        _ => format_error(table, err),
    }
}

/// Flat shape of a prediction row as written by the classifier
#[derive(Debug, Deserialize)]
struct PredictionRow {
    tweet_id: i64,
    jpg_url: String,
    img_num: u32,
    p1: String,
    p1_conf: f64,
    #[serde(deserialize_with = "flexible_bool")]
    p1_dog: bool,
    p2: String,
    p2_conf: f64,
    #[serde(deserialize_with = "flexible_bool")]
    p2_dog: bool,
    p3: String,
    p3_conf: f64,
    #[serde(deserialize_with = "flexible_bool")]
    p3_dog: bool,
}

impl From<PredictionRow> for ImagePrediction {
    fn from(row: PredictionRow) -> Self {
        ImagePrediction {
            tweet_id: row.tweet_id,
            jpg_url: row.jpg_url,
            img_num: row.img_num,
            predictions: [
                Prediction { label: row.p1, confidence: row.p1_conf, is_dog: row.p1_dog },
                Prediction { label: row.p2, confidence: row.p2_conf, is_dog: row.p2_dog },
                Prediction { label: row.p3, confidence: row.p3_conf, is_dog: row.p3_dog },
            ],
        }
    }
}

/// Accepts `True`/`False` as written by the classifier, plus lower-case forms
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "True" | "true" | "TRUE" | "1" => Ok(true),
        "False" | "false" | "FALSE" | "0" => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid boolean {other:?}"))),
    }
}
