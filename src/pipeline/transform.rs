use crate::constants::TRAINING_DATE_COLUMN;
use crate::error::{EtlError, Result};
use crate::observability::{self, DropReason};
use crate::pipeline::dates::normalize_training_date;
use crate::pipeline::staging::{read_artifact, write_artifact, StagingError};
use crate::types::{CellValue, CleanRecordSet, RawRecordSet};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct TransformReport {
    pub input_rows: usize,
    pub dropped_missing_values: usize,
    pub dropped_invalid_dates: usize,
    pub remaining_rows: usize,
    pub artifact: PathBuf,
}

/// Loads the raw artifact, cleans it, and stages the clean record set.
#[instrument(skip_all, fields(raw = %raw_artifact.display()))]
pub fn transform(raw_artifact: &Path, clean_artifact: &Path) -> Result<TransformReport> {
    let raw: RawRecordSet = read_artifact(raw_artifact).map_err(|e| match e {
        StagingError::Missing(path) => EtlError::MissingArtifact { path },
        other => EtlError::transformation(other.to_string()),
    })?;

    let (clean, report) = clean_records(raw)?;
    write_artifact(clean_artifact, &clean)
        .map_err(|e| EtlError::transformation(format!("could not stage clean records: {e}")))?;

    Ok(TransformReport {
        artifact: clean_artifact.to_path_buf(),
        ..report
    })
}

/// Applies the cleaning steps in order: drop rows with nulls, normalize column
/// names, require `training_date`, normalize dates, drop rows whose date failed.
///
/// A missing `training_date` column or a row whose width differs from the header
/// fails the whole run. An unparsable date only drops that row.
pub fn clean_records(raw: RawRecordSet) -> Result<(CleanRecordSet, TransformReport)> {
    raw.check_shape()
        .map_err(|e| EtlError::transformation(format!("raw records are malformed: {e}")))?;
    let input_rows = raw.rows.len();

    let rows: Vec<Vec<CellValue>> = raw
        .rows
        .into_iter()
        .filter(|row| !row.iter().any(CellValue::is_null))
        .collect();
    let dropped_missing_values = input_rows - rows.len();
    if dropped_missing_values > 0 {
        debug!("Dropped {} rows with missing values", dropped_missing_values);
    }

    let columns = normalize_columns(&raw.columns)?;
    let date_idx = columns
        .iter()
        .position(|c| c == TRAINING_DATE_COLUMN)
        .ok_or_else(|| {
            EtlError::transformation(format!(
                "expected column '{TRAINING_DATE_COLUMN}' not found (columns: {})",
                columns.join(", ")
            ))
        })?;

    let before = rows.len();
    let rows: Vec<Vec<CellValue>> = rows
        .into_iter()
        .filter_map(|mut row| {
            let date = row[date_idx]
                .as_text()
                .and_then(|raw| normalize_training_date(&raw))?;
            row[date_idx] = CellValue::Text(date);
            Some(row)
        })
        .collect();
    let after = rows.len();
    let dropped_invalid_dates = before - after;

    info!(
        "Transformed data. Dropped {} rows with invalid dates. Remaining: {}",
        dropped_invalid_dates, after
    );
    observability::rows_dropped(DropReason::MissingValue, dropped_missing_values);
    observability::rows_dropped(DropReason::InvalidDate, dropped_invalid_dates);

    let report = TransformReport {
        input_rows,
        dropped_missing_values,
        dropped_invalid_dates,
        remaining_rows: after,
        artifact: PathBuf::new(),
    };
    Ok((CleanRecordSet { columns, rows }, report))
}

/// Trim, spaces to underscores, lower-case.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

fn normalize_columns(columns: &[String]) -> Result<Vec<String>> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();
    let mut seen = HashSet::new();
    for name in &normalized {
        if !seen.insert(name.as_str()) {
            return Err(EtlError::transformation(format!(
                "more than one column normalizes to '{name}'"
            )));
        }
    }
    Ok(normalized)
}
