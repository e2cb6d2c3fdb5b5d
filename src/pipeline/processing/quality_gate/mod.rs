use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ARCHIVE_TABLE, METRICS_TABLE, NONE_SENTINEL, PREDICTIONS_TABLE, RATING_DENOMINATOR};
use crate::domain::{ArchiveRecord, EngagementMetrics, ImagePrediction};
use crate::pipeline::ingestion::SourceTables;
use crate::pipeline::processing::normalize::{extract_source_label, normalize_name, null_sentinel, parse_timestamp};
use crate::pipeline::processing::retweet::is_retweet;

/// How many offending tweet ids an issue keeps as examples
const EXAMPLE_LIMIT: usize = 5;

/// Result of assessing the three raw sources before cleaning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub decision: QualityDecision,
    pub issues: Vec<QualityIssue>,
    pub archive_rows: usize,
    pub prediction_rows: usize,
    pub metrics_rows: usize,
    pub assessed_at: DateTime<Utc>,
}

/// Overall verdict on the sources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QualityDecision {
    /// Nothing worth a warning
    Clean,
    /// Known defects the cleaning rules handle or tolerate
    CleanWithWarnings,
    /// Defects the cleaning run would fail on or silently carry over
    Blocked,
}

/// One kind of defect found in one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub table: String,
    pub issue_type: QualityIssueType,
    pub severity: QualitySeverity,
    pub description: String,
    /// Column that triggered this issue, if any
    pub field: Option<String>,
    /// Number of rows affected
    pub count: usize,
    /// A few affected tweet ids
    pub examples: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QualityIssueType {
    MissingData,
    InvalidFormat,
    OutOfRange,
    SuspiciousValue,
    DuplicationConcern,
    JoinCardinality,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualitySeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Trait for assessing the raw sources without modifying them
pub trait QualityGate {
    fn assess(&self, tables: &SourceTables) -> QualityReport;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultQualityGate;

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self
    }

    fn assess_predictions(&self, predictions: &[ImagePrediction]) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        let bad_img_num: Vec<i64> = predictions
            .iter()
            .filter(|p| !(1..=4).contains(&p.img_num))
            .map(|p| p.tweet_id)
            .collect();
        issues.extend(issue(
            PREDICTIONS_TABLE,
            QualityIssueType::OutOfRange,
            QualitySeverity::Error,
            Some("img_num"),
            "Image number outside 1-4",
            bad_img_num,
        ));

        let bad_conf: Vec<i64> = predictions
            .iter()
            .filter(|p| p.predictions.iter().any(|g| !(0.0..=1.0).contains(&g.confidence)))
            .map(|p| p.tweet_id)
            .collect();
        issues.extend(issue(
            PREDICTIONS_TABLE,
            QualityIssueType::OutOfRange,
            QualitySeverity::Error,
            Some("p1_conf"),
            "Confidence outside [0, 1]",
            bad_conf,
        ));

        let certain_not_dog: Vec<i64> = predictions
            .iter()
            .filter(|p| p.predictions[0].confidence >= 1.0 && !p.predictions[0].is_dog)
            .map(|p| p.tweet_id)
            .collect();
        issues.extend(issue(
            PREDICTIONS_TABLE,
            QualityIssueType::SuspiciousValue,
            QualitySeverity::Warning,
            Some("p1_dog"),
            "Top prediction is 100% confident yet not a dog",
            certain_not_dog,
        ));

        let unranked: Vec<i64> = predictions
            .iter()
            .filter(|p| {
                let [a, b, c] = &p.predictions;
                a.confidence < b.confidence || b.confidence < c.confidence
            })
            .map(|p| p.tweet_id)
            .collect();
        issues.extend(issue(
            PREDICTIONS_TABLE,
            QualityIssueType::InvalidFormat,
            QualitySeverity::Warning,
            None,
            "Predictions not ranked by descending confidence",
            unranked,
        ));

        let mut seen = HashSet::new();
        let duplicates: Vec<i64> = predictions
            .iter()
            .filter(|p| !seen.insert(format!("{p:?}")))
            .map(|p| p.tweet_id)
            .collect();
        issues.extend(issue(
            PREDICTIONS_TABLE,
            QualityIssueType::DuplicationConcern,
            QualitySeverity::Warning,
            None,
            "Duplicated prediction rows",
            duplicates,
        ));

        issues
    }

    fn assess_archive(&self, archive: &[ArchiveRecord]) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::DuplicationConcern,
            QualitySeverity::Error,
            Some("tweet_id"),
            "Duplicated tweet ids",
            duplicate_ids(archive.iter().map(|r| r.tweet_id)),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::InvalidFormat,
            QualitySeverity::Error,
            Some("timestamp"),
            "Unparseable timestamps",
            ids_where(archive, |r| parse_timestamp("timestamp", &r.timestamp).is_err()),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::InvalidFormat,
            QualitySeverity::Error,
            Some("source"),
            "Client markup without a readable label",
            ids_where(archive, |r| extract_source_label(r.tweet_id, &r.source).is_err()),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::SuspiciousValue,
            QualitySeverity::Info,
            Some("text"),
            "Retweets of other accounts (excluded from the cleaned table)",
            ids_where(archive, |r| is_retweet(&r.text)),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::MissingData,
            QualitySeverity::Info,
            Some("expanded_urls"),
            "Missing expanded URLs (backfilled from the tweet id)",
            ids_where(archive, |r| r.expanded_urls.as_deref().map_or(true, |u| u.trim().is_empty())),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::MissingData,
            QualitySeverity::Warning,
            Some("name"),
            "Name recorded as the \"None\" sentinel",
            ids_where(archive, |r| r.name.as_deref() == Some(NONE_SENTINEL)),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::SuspiciousValue,
            QualitySeverity::Warning,
            Some("name"),
            "Lower-case words captured as names",
            ids_where(archive, |r| {
                null_sentinel(r.name.as_deref()).is_some() && normalize_name(r.name.as_deref()).is_none()
            }),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::OutOfRange,
            QualitySeverity::Warning,
            Some("rating_denominator"),
            "Rating denominator other than 10",
            ids_where(archive, |r| r.rating_denominator != RATING_DENOMINATOR),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::OutOfRange,
            QualitySeverity::Info,
            Some("rating_numerator"),
            "Numerator at or above denominator (collapsed to 10/10)",
            ids_where(archive, |r| r.rating_numerator >= r.rating_denominator),
        ));

        issues.extend(issue(
            ARCHIVE_TABLE,
            QualityIssueType::SuspiciousValue,
            QualitySeverity::Warning,
            Some("stage"),
            "More than one dog stage set (consolidated into a compound value)",
            ids_where(archive, |r| {
                [&r.doggo, &r.floofer, &r.pupper, &r.puppo]
                    .iter()
                    .filter(|v| null_sentinel(v.as_deref()).is_some())
                    .count()
                    > 1
            }),
        ));

        issues
    }

    fn assess_metrics(&self, metrics: &[EngagementMetrics], archive_rows: usize) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        issues.extend(issue(
            METRICS_TABLE,
            QualityIssueType::DuplicationConcern,
            QualitySeverity::Error,
            Some("id"),
            "Duplicated tweet ids",
            duplicate_ids(metrics.iter().map(|m| m.tweet_id)),
        ));

        if metrics.len() != archive_rows {
            issues.push(QualityIssue {
                table: METRICS_TABLE.to_string(),
                issue_type: QualityIssueType::JoinCardinality,
                severity: QualitySeverity::Warning,
                description: format!(
                    "Archive has {} rows but metrics has {}; unmatched rows drop out of the join",
                    archive_rows,
                    metrics.len()
                ),
                field: None,
                count: archive_rows.abs_diff(metrics.len()),
                examples: Vec::new(),
            });
        }

        issues
    }

    fn determine_decision(&self, issues: &[QualityIssue]) -> QualityDecision {
        match issues.iter().map(|i| i.severity).max() {
            Some(QualitySeverity::Error) | Some(QualitySeverity::Critical) => QualityDecision::Blocked,
            Some(QualitySeverity::Warning) => QualityDecision::CleanWithWarnings,
            _ => QualityDecision::Clean,
        }
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, tables: &SourceTables) -> QualityReport {
        let mut issues = Vec::new();
        issues.extend(self.assess_archive(&tables.archive));
        issues.extend(self.assess_predictions(&tables.predictions));
        issues.extend(self.assess_metrics(&tables.metrics, tables.archive.len()));

        QualityReport {
            decision: self.determine_decision(&issues),
            issues,
            archive_rows: tables.archive.len(),
            prediction_rows: tables.predictions.len(),
            metrics_rows: tables.metrics.len(),
            assessed_at: Utc::now(),
        }
    }
}

impl QualityReport {
    /// Number of issues at each severity
    pub fn severity_counts(&self) -> HashMap<QualitySeverity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_insert(0) += 1;
        }
        counts
    }
}

fn issue(
    table: &str,
    issue_type: QualityIssueType,
    severity: QualitySeverity,
    field: Option<&str>,
    description: &str,
    ids: Vec<i64>,
) -> Option<QualityIssue> {
    if ids.is_empty() {
        return None;
    }
    Some(QualityIssue {
        table: table.to_string(),
        issue_type,
        severity,
        description: description.to_string(),
        field: field.map(str::to_string),
        count: ids.len(),
        examples: ids.into_iter().take(EXAMPLE_LIMIT).collect(),
    })
}

fn ids_where(archive: &[ArchiveRecord], pred: impl Fn(&ArchiveRecord) -> bool) -> Vec<i64> {
    archive.iter().filter(|r| pred(r)).map(|r| r.tweet_id).collect()
}

fn duplicate_ids(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.filter(|id| !seen.insert(*id)).collect()
}
