//! Metric names and recording helpers for the pipeline stages.
//!
//! The crate only records; installing an exporter is left to the process that
//! embeds the pipeline.

use metrics::{counter, histogram};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RowsExtracted,
    RowsDropped,
    RowsLoaded,
    StageDuration,
    StageFailures,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricName::RowsExtracted => "etl_rows_extracted_total",
            MetricName::RowsDropped => "etl_rows_dropped_total",
            MetricName::RowsLoaded => "etl_rows_loaded_total",
            MetricName::StageDuration => "etl_stage_duration_seconds",
            MetricName::StageFailures => "etl_stage_failures_total",
        };
        write!(f, "{name}")
    }
}

/// Why the transformer dropped a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingValue,
    InvalidDate,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingValue => "missing_value",
            DropReason::InvalidDate => "invalid_date",
        }
    }
}

pub fn rows_extracted(count: usize) {
    counter!(MetricName::RowsExtracted.to_string()).increment(count as u64);
}

pub fn rows_dropped(reason: DropReason, count: usize) {
    counter!(MetricName::RowsDropped.to_string(), "reason" => reason.as_str())
        .increment(count as u64);
}

pub fn rows_loaded(count: usize) {
    counter!(MetricName::RowsLoaded.to_string()).increment(count as u64);
}

pub fn stage_duration(stage: &'static str, secs: f64) {
    histogram!(MetricName::StageDuration.to_string(), "stage" => stage).record(secs);
}

pub fn stage_failed(stage: &'static str) {
    counter!(MetricName::StageFailures.to_string(), "stage" => stage).increment(1);
}
