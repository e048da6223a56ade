use crate::constants::is_na_marker;
use crate::error::{EtlError, Result};
use crate::observability;
use crate::pipeline::staging::write_artifact;
use crate::types::{CellValue, RawRecordSet};
use csv::ReaderBuilder;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub source_file: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub artifact: PathBuf,
}

/// Reads the first matching file in `input_dir` and stages it as a raw record set.
///
/// No artifact is written when the directory holds no matching file.
#[instrument(skip_all, fields(input_dir = %input_dir.display()))]
pub fn extract(input_dir: &Path, extension: &str, artifact: &Path) -> Result<ExtractReport> {
    let source_file = find_input_file(input_dir, extension)?;
    let records = read_records(&source_file)?;
    info!(
        "Extracted {} rows from {}",
        records.rows.len(),
        source_file.display()
    );

    write_artifact(artifact, &records)
        .map_err(|e| EtlError::extraction(format!("could not stage raw records: {e}")))?;
    observability::rows_extracted(records.rows.len());

    Ok(ExtractReport {
        source_file,
        rows: records.rows.len(),
        columns: records.columns.len(),
        artifact: artifact.to_path_buf(),
    })
}

/// First regular file, in directory-listing order, whose name ends with `extension`.
///
/// Listing order is platform dependent; with several candidates present the choice
/// is not stable and the others are ignored.
pub fn find_input_file(input_dir: &Path, extension: &str) -> Result<PathBuf> {
    let entries = fs::read_dir(input_dir).map_err(|e| {
        EtlError::extraction(format!(
            "cannot read input directory {}: {}",
            input_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            EtlError::extraction(format!("cannot list {}: {}", input_dir.display(), e))
        })?;
        let name = entry.file_name();
        let matches = name.to_str().is_some_and(|n| n.ends_with(extension));
        if matches && entry.path().is_file() {
            debug!("Selected input file {}", entry.path().display());
            return Ok(entry.path());
        }
    }

    Err(EtlError::NoInputFile {
        dir: input_dir.to_path_buf(),
        extension: extension.to_string(),
    })
}

pub fn read_records(path: &Path) -> Result<RawRecordSet> {
    let file = fs::File::open(path)
        .map_err(|e| EtlError::extraction(format!("cannot open {}: {}", path.display(), e)))?;
    parse_records(file).map_err(|message| {
        EtlError::extraction(format!("{} is not valid CSV: {}", path.display(), message))
    })
}

/// Parses CSV with a header row. Short rows are padded with nulls; long rows are malformed.
pub fn parse_records<R: Read>(reader: R) -> std::result::Result<RawRecordSet, String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err("missing header row".to_string());
    }

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > columns.len() {
            return Err(format!(
                "line {} has {} fields, header has {}",
                record.position().map(|p| p.line()).unwrap_or(i as u64 + 2),
                record.len(),
                columns.len()
            ));
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|v| (!is_na_marker(v)).then(|| v.to_string()))
            .collect();
        row.resize(columns.len(), None);
        cells.push(row);
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|c| ColumnKind::infer(cells.iter().filter_map(|row| row[c].as_deref())))
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(cell, kind)| kind.convert(cell))
                .collect()
        })
        .collect();

    Ok(RawRecordSet { columns, rows })
}

/// Type of a column, decided from all of its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn infer<'a>(mut values: impl Iterator<Item = &'a str> + Clone) -> Self {
        if values.clone().all(|v| v.trim().parse::<i64>().is_ok()) {
            ColumnKind::Int
        } else if values.all(|v| v.trim().parse::<f64>().is_ok_and(f64::is_finite)) {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        }
    }

    fn convert(self, cell: Option<String>) -> CellValue {
        let Some(value) = cell else {
            return CellValue::Null;
        };
        match self {
            ColumnKind::Int => value
                .trim()
                .parse()
                .map(CellValue::Int)
                .unwrap_or(CellValue::Text(value)),
            ColumnKind::Float => value
                .trim()
                .parse()
                .map(CellValue::Float)
                .unwrap_or(CellValue::Text(value)),
            ColumnKind::Text => CellValue::Text(value),
        }
    }
}
