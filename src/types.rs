use crate::constants::DESTINATION_COLUMNS;
use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar field as read from the input file.
///
/// Serialized untagged so staging artifacts keep the value's type across a
/// round-trip: integers stay integers, text that looks numeric stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text form used for date parsing. `Null` has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Records exactly as extracted: original header names, one value per column per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Records after cleaning: normalized column names, canonical dates, no nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawRecordSet {
    /// Every row must carry one value per column.
    pub fn check_shape(&self) -> std::result::Result<(), String> {
        check_shape(&self.columns, &self.rows)
    }
}

impl CleanRecordSet {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn check_shape(&self) -> std::result::Result<(), String> {
        check_shape(&self.columns, &self.rows)?;
        if let Some(row) = self.rows.iter().position(|r| r.iter().any(CellValue::is_null)) {
            return Err(format!("row {row} contains a null value"));
        }
        Ok(())
    }
}

fn check_shape(columns: &[String], rows: &[Vec<CellValue>]) -> std::result::Result<(), String> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(format!(
                "row {i} has {} values but there are {} columns",
                row.len(),
                columns.len()
            ));
        }
    }
    Ok(())
}

/// One destination row. Field order matches `DESTINATION_COLUMNS`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub employee_id: CellValue,
    pub employee_name: CellValue,
    pub department: CellValue,
    pub gender: CellValue,
    pub training_date: CellValue,
    pub training_category: CellValue,
    pub course: CellValue,
    pub training_mode: CellValue,
    pub no_of_training_session: CellValue,
    pub training_hours: CellValue,
}

impl TrainingRecord {
    /// Maps a clean row onto the destination columns by position.
    pub fn from_row(row: &[CellValue]) -> Result<Self> {
        let values: [CellValue; 10] = row.to_vec().try_into().map_err(|v: Vec<CellValue>| {
            EtlError::transformation(format!(
                "record has {} fields but {} expects {}",
                v.len(),
                crate::constants::DESTINATION_TABLE,
                DESTINATION_COLUMNS.len()
            ))
        })?;
        let [employee_id, employee_name, department, gender, training_date, training_category, course, training_mode, no_of_training_session, training_hours] =
            values;
        Ok(Self {
            employee_id,
            employee_name,
            department,
            gender,
            training_date,
            training_category,
            course,
            training_mode,
            no_of_training_session,
            training_hours,
        })
    }

    pub fn values(&self) -> [&CellValue; 10] {
        [
            &self.employee_id,
            &self.employee_name,
            &self.department,
            &self.gender,
            &self.training_date,
            &self.training_category,
            &self.course,
            &self.training_mode,
            &self.no_of_training_session,
            &self.training_hours,
        ]
    }
}
