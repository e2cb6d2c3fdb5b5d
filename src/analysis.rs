//! Summary statistics over a persisted cleaned table: the numbers behind the
//! source share pie, the rating distribution bars and the retweet/favorite scatter.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

use crate::error::{Result, WrangleError};

const CLEANED_TABLE: &str = "cleaned";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceShare {
    pub source: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    /// numerator / denominator * 100
    pub percent: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub rows: usize,
    /// Most used client first
    pub source_share: Vec<SourceShare>,
    /// Most frequent rating first
    pub rating_distribution: Vec<RatingBucket>,
    /// Pearson correlation of retweet and favorite counts; `None` when undefined
    pub engagement_correlation: Option<f64>,
}

struct Columns {
    source: usize,
    numerator: usize,
    denominator: usize,
    retweets: usize,
    favorites: usize,
}

pub fn summarize<R: Read>(reader: R) -> Result<AnalysisSummary> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| WrangleError::Format {
            source_name: CLEANED_TABLE.to_string(),
            at: "header".to_string(),
            message: e.to_string(),
        })?
        .clone();

    let cols = Columns {
        source: column_index(&headers, "source")?,
        numerator: column_index(&headers, "rating_numerator")?,
        denominator: column_index(&headers, "rating_denominator")?,
        retweets: column_index(&headers, "retweet_count")?,
        favorites: column_index(&headers, "favorite_count")?,
    };

    let mut rows = 0;
    let mut sources: HashMap<String, usize> = HashMap::new();
    // keyed by percent in thousandths so equal ratings share a bucket
    let mut ratings: BTreeMap<i64, usize> = BTreeMap::new();
    let mut retweets = Vec::new();
    let mut favorites = Vec::new();

    for row in rdr.records() {
        let row = row.map_err(|e| WrangleError::Format {
            source_name: CLEANED_TABLE.to_string(),
            at: format!("line {}", e.position().map(|p| p.line()).unwrap_or(0)),
            message: e.to_string(),
        })?;
        rows += 1;

        *sources.entry(cell(&row, cols.source).to_string()).or_insert(0) += 1;

        let numerator = number(&row, cols.numerator, "rating_numerator")?;
        let denominator = number(&row, cols.denominator, "rating_denominator")?;
        if denominator != 0.0 {
            let key = (numerator / denominator * 100_000.0).round() as i64;
            *ratings.entry(key).or_insert(0) += 1;
        }

        retweets.push(number(&row, cols.retweets, "retweet_count")?);
        favorites.push(number(&row, cols.favorites, "favorite_count")?);
    }

    let mut source_share: Vec<SourceShare> = sources
        .into_iter()
        .map(|(source, count)| SourceShare {
            source,
            count,
            percent: count as f64 / rows as f64 * 100.0,
        })
        .collect();
    source_share.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));

    let mut rating_distribution: Vec<RatingBucket> = ratings
        .into_iter()
        .map(|(key, count)| RatingBucket {
            percent: key as f64 / 1000.0,
            count,
        })
        .collect();
    rating_distribution.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.percent.total_cmp(&a.percent))
    });

    Ok(AnalysisSummary {
        rows,
        source_share,
        rating_distribution,
        engagement_correlation: pearson(&retweets, &favorites),
    })
}

/// Pearson correlation coefficient; `None` for fewer than two points or zero variance
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        None
    } else {
        Some(cov / (var_x.sqrt() * var_y.sqrt()))
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| WrangleError::schema(CLEANED_TABLE, name))
}

fn cell(row: &StringRecord, index: usize) -> &str {
    row.get(index).unwrap_or("")
}

fn number(row: &StringRecord, index: usize, field: &str) -> Result<f64> {
    let raw = cell(row, index);
    raw.trim()
        .parse::<f64>()
        .map_err(|e| WrangleError::parse(field, raw, e.to_string()))
}
