use crate::app::ports::{DestinationConnector, DestinationTransaction};
use crate::config::DestinationConfig;
use crate::constants::DESTINATION_TABLE;
use crate::error::{EtlError, Result};
use crate::observability;
use crate::pipeline::staging::{read_artifact, StagingError};
use crate::types::{CleanRecordSet, TrainingRecord};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub rows_inserted: usize,
    pub table: String,
}

/// Inserts every clean record into the destination table inside one transaction.
///
/// Either all rows are committed or none are. The config has already been
/// validated, so no connection is attempted with partial credentials.
#[instrument(skip_all, fields(clean = %clean_artifact.display(), host = %config.host()))]
pub async fn load(
    clean_artifact: &Path,
    config: &DestinationConfig,
    connector: &dyn DestinationConnector,
) -> Result<LoadReport> {
    let records = read_training_records(clean_artifact)?;
    info!("Loading {} rows into {}...", records.len(), DESTINATION_TABLE);

    let mut tx = connector
        .connect(config)
        .await
        .map_err(|e| EtlError::Connection {
            message: format!("{e:#}"),
        })?;

    if let Err(e) = insert_all(tx.as_mut(), &records).await {
        if let Err(rollback_err) = tx.rollback().await {
            warn!("Rollback after failed insert also failed: {:#}", rollback_err);
        }
        return Err(e);
    }

    tx.commit().await.map_err(|e| EtlError::Commit {
        message: format!("{e:#}"),
    })?;

    observability::rows_loaded(records.len());
    info!("Data successfully loaded into {}", DESTINATION_TABLE);
    Ok(LoadReport {
        rows_inserted: records.len(),
        table: DESTINATION_TABLE.to_string(),
    })
}

async fn insert_all(
    tx: &mut dyn DestinationTransaction,
    records: &[TrainingRecord],
) -> Result<()> {
    for (row, record) in records.iter().enumerate() {
        tx.insert(record).await.map_err(|e| {
            error!("Insert failed at record {}: {:#}", row, e);
            EtlError::Insert {
                row,
                message: format!("{e:#}"),
            }
        })?;
        if (row + 1) % 1000 == 0 {
            debug!("Inserted {}/{} records", row + 1, records.len());
        }
    }
    Ok(())
}

/// Reads the clean artifact and maps every row onto the destination columns.
pub fn read_training_records(clean_artifact: &Path) -> Result<Vec<TrainingRecord>> {
    let clean: CleanRecordSet = read_artifact(clean_artifact).map_err(|e| match e {
        StagingError::Missing(path) => EtlError::MissingArtifact { path },
        other => EtlError::transformation(other.to_string()),
    })?;
    clean.check_shape().map_err(|e| {
        EtlError::transformation(format!("{} is malformed: {e}", clean_artifact.display()))
    })?;

    clean
        .rows
        .iter()
        .map(|row| TrainingRecord::from_row(row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::in_memory_destination::InMemoryDestination;
    use crate::pipeline::staging::write_artifact;
    use crate::types::CellValue;
    use tempfile::tempdir;

    fn config() -> DestinationConfig {
        DestinationConfig::new("localhost", "3306", "etl", "pw", "training").unwrap()
    }

    fn clean_set(n: usize) -> CleanRecordSet {
        CleanRecordSet {
            columns: crate::constants::DESTINATION_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows: (0..n)
                .map(|i| {
                    let mut row: Vec<CellValue> = (0..10)
                        .map(|f| CellValue::Text(format!("r{i}f{f}")))
                        .collect();
                    row[0] = CellValue::Text(format!("E{i}"));
                    row[4] = CellValue::Text("2025-07-15".into());
                    row
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn commits_all_rows_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.json");
        write_artifact(&path, &clean_set(5)).unwrap();

        let dest = InMemoryDestination::new();
        let report = load(&path, &config(), &dest).await.unwrap();
        assert_eq!(report.rows_inserted, 5);
        assert_eq!(report.table, DESTINATION_TABLE);

        let rows = dest.committed_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3].employee_id, CellValue::Text("E3".into()));
    }

    #[tokio::test]
    async fn failure_on_last_insert_commits_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.json");
        write_artifact(&path, &clean_set(100)).unwrap();

        let dest = InMemoryDestination::new().fail_insert_at(99);
        let err = load(&path, &config(), &dest).await.unwrap_err();
        assert!(matches!(err, EtlError::Insert { row: 99, .. }));
        assert!(dest.committed_rows().is_empty());
        assert_eq!(dest.rollbacks(), 1);
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.json");
        write_artifact(&path, &clean_set(1)).unwrap();

        let dest = InMemoryDestination::new().refuse_connections();
        let err = load(&path, &config(), &dest).await.unwrap_err();
        assert!(matches!(err, EtlError::Connection { .. }));
        assert!(dest.committed_rows().is_empty());
    }

    #[tokio::test]
    async fn missing_artifact_never_connects() {
        let dir = tempdir().unwrap();
        let dest = InMemoryDestination::new();
        let err = load(&dir.path().join("clean.json"), &config(), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::MissingArtifact { .. }));
        assert_eq!(dest.connection_attempts(), 0);
    }

    #[tokio::test]
    async fn wrong_arity_rows_are_rejected_before_connecting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.json");
        let set = CleanRecordSet {
            columns: vec!["employee_id".into(), "training_date".into()],
            rows: vec![vec![
                CellValue::Text("E1".into()),
                CellValue::Text("2025-07-15".into()),
            ]],
        };
        write_artifact(&path, &set).unwrap();

        let dest = InMemoryDestination::new();
        let err = load(&path, &config(), &dest).await.unwrap_err();
        assert!(matches!(err, EtlError::Transformation { .. }));
        assert_eq!(dest.connection_attempts(), 0);
    }

    #[tokio::test]
    async fn loading_twice_duplicates_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.json");
        write_artifact(&path, &clean_set(3)).unwrap();

        let dest = InMemoryDestination::new();
        load(&path, &config(), &dest).await.unwrap();
        load(&path, &config(), &dest).await.unwrap();
        assert_eq!(dest.committed_rows().len(), 6);
    }
}
