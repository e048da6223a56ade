//! Staging artifacts: the JSON checkpoints handed from one stage to the next.
//!
//! Each write replaces the previous generation. Nothing here locks the files, so
//! two runs sharing the same locations will overwrite each other.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("{} is unreadable: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

/// Serializes `value` to `path`, writing a sibling temp file first and renaming it
/// into place so a reader never sees a half-written artifact.
pub fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<(), StagingError> {
    let write_err = |message: String| StagingError::Write {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }

    let tmp_path = tmp_path_for(path);
    let file = File::create(&tmp_path).map_err(|e| write_err(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| write_err(e.to_string()))?;
    writer.flush().map_err(|e| write_err(e.to_string()))?;
    drop(writer);

    fs::rename(&tmp_path, path).map_err(|e| write_err(e.to_string()))
}

pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, StagingError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StagingError::Missing(path.to_path_buf()))
        }
        Err(e) => {
            return Err(StagingError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|e| StagingError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, RawRecordSet};
    use tempfile::tempdir;

    #[test]
    fn overwrites_previous_generation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("artifact.json");

        let first = RawRecordSet {
            columns: vec!["a".into()],
            rows: vec![vec![CellValue::Int(1)], vec![CellValue::Int(2)]],
        };
        let second = RawRecordSet {
            columns: vec!["a".into()],
            rows: vec![vec![CellValue::Text("x".into())]],
        };
        write_artifact(&path, &first).unwrap();
        write_artifact(&path, &second).unwrap();

        let back: RawRecordSet = read_artifact(&path).unwrap();
        assert_eq!(back, second);
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn distinguishes_missing_from_corrupt() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            read_artifact::<RawRecordSet>(&missing),
            Err(StagingError::Missing(_))
        ));

        let corrupt = dir.path().join("bad.json");
        fs::write(&corrupt, "{not json").unwrap();
        assert!(matches!(
            read_artifact::<RawRecordSet>(&corrupt),
            Err(StagingError::Corrupt { .. })
        ));
    }
}
