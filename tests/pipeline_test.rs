use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use training_etl::config::{DestinationConfig, PipelineConfig};
use training_etl::error::EtlError;
use training_etl::infra::in_memory_destination::InMemoryDestination;
use training_etl::pipeline::staging::read_artifact;
use training_etl::pipeline::Pipeline;
use training_etl::types::{CellValue, CleanRecordSet};

const HEADER: &str = "Employee ID,Employee Name,Department,Gender,Training Date,Training Category,Course,Training Mode,No Of Training Session,Training Hours";

fn setup(csv: &str) -> Result<(TempDir, Pipeline)> {
    let dir = tempdir()?;
    let input = dir.path().join("training_files");
    fs::create_dir(&input)?;
    fs::write(input.join("attendance.csv"), csv)?;
    let pipeline = Pipeline::new(config_for(dir.path()));
    Ok((dir, pipeline))
}

fn config_for(root: &Path) -> PipelineConfig {
    PipelineConfig {
        input_dir: root.join("training_files"),
        raw_artifact: root.join("staging").join("extracted_training.json"),
        clean_artifact: root.join("staging").join("transformed_training.json"),
        ..PipelineConfig::default()
    }
}

fn destination() -> training_etl::error::Result<DestinationConfig> {
    DestinationConfig::new("localhost", "3306", "etl", "secret", "training")
}

fn sample_csv() -> String {
    [
        HEADER,
        "E1,Asha Rao,Finance,F,07/15/2025,Compliance,Data Privacy,Online,2,3.5",
        "E2,Ben Ode,Sales,M,2025-07-16,Soft Skills,Negotiation,Classroom,1,2",
        "E3,Cara Lim,IT,F,2025-13-40,Technical,Rust Basics,Online,4,8",
        "E4,Dev Shah,IT,M,not a date,Technical,SQL,Online,1,1.5",
        "E5,,HR,F,July 20 2025,Compliance,POSH,Classroom,1,1",
        "E6,Eli Moss,HR,M,20 Jul 2025,Compliance,POSH,Classroom,1,1",
    ]
    .join("\n")
}

#[tokio::test]
async fn full_run_cleans_and_loads_valid_rows() -> Result<()> {
    let (_dir, pipeline) = setup(&sample_csv())?;
    let dest = InMemoryDestination::new();

    let report = pipeline.run(destination, &dest).await?;

    assert_eq!(report.extract.rows, 6);
    assert_eq!(report.transform.dropped_missing_values, 1);
    assert_eq!(report.transform.dropped_invalid_dates, 2);
    assert_eq!(report.transform.remaining_rows, 3);
    assert_eq!(report.load.rows_inserted, 3);

    let rows = dest.committed_rows();
    let ids: Vec<_> = rows.iter().map(|r| r.employee_id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            CellValue::Text("E1".into()),
            CellValue::Text("E2".into()),
            CellValue::Text("E6".into())
        ]
    );
    assert_eq!(rows[0].training_date, CellValue::Text("2025-07-15".into()));
    assert_eq!(rows[2].training_date, CellValue::Text("2025-07-20".into()));
    assert_eq!(rows[0].no_of_training_session, CellValue::Int(2));
    assert_eq!(rows[0].training_hours, CellValue::Float(3.5));
    Ok(())
}

#[tokio::test]
async fn clean_artifact_has_normalized_columns() -> Result<()> {
    let (_dir, pipeline) = setup(&sample_csv())?;
    pipeline.extract()?;
    pipeline.transform()?;

    let clean: CleanRecordSet = read_artifact(&pipeline.config().clean_artifact)?;
    for column in &clean.columns {
        assert_eq!(column, &column.trim().to_lowercase());
        assert!(!column.contains(' '));
    }
    assert_eq!(clean.columns[0], "employee_id");
    assert_eq!(clean.columns[8], "no_of_training_session");
    Ok(())
}

#[tokio::test]
async fn running_twice_loads_rows_twice() -> Result<()> {
    let (_dir, pipeline) = setup(&sample_csv())?;
    let dest = InMemoryDestination::new();

    pipeline.run(destination, &dest).await?;
    pipeline.run(destination, &dest).await?;

    assert_eq!(dest.committed_rows().len(), 6);
    Ok(())
}

#[tokio::test]
async fn empty_input_directory_fails_extraction_without_staging() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("training_files"))?;
    let pipeline = Pipeline::new(config_for(dir.path()));
    let dest = InMemoryDestination::new();

    let err = pipeline.run(destination, &dest).await.unwrap_err();

    assert!(err.is_extraction());
    assert!(!pipeline.config().raw_artifact.exists());
    assert!(!pipeline.config().clean_artifact.exists());
    assert_eq!(dest.connection_attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_credential_fails_before_connecting() -> Result<()> {
    let (_dir, pipeline) = setup(&sample_csv())?;
    let dest = InMemoryDestination::new();

    let err = pipeline
        .run(
            || DestinationConfig::new("localhost", "3306", "etl", "", "training"),
            &dest,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::Configuration { .. }));
    assert_eq!(dest.connection_attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_insert_on_last_of_hundred_commits_nothing() -> Result<()> {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..100 {
        lines.push(format!(
            "E{i},Name {i},Ops,F,2025-07-{:02},Safety,Fire Drill,Onsite,1,1",
            i % 28 + 1
        ));
    }
    let (_dir, pipeline) = setup(&lines.join("\n"))?;
    let dest = InMemoryDestination::new().fail_insert_at(99);

    let err = pipeline.run(destination, &dest).await.unwrap_err();

    assert!(matches!(err, EtlError::Insert { row: 99, .. }));
    assert!(dest.committed_rows().is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_date_column_aborts_before_load() -> Result<()> {
    let csv = "Employee ID,Date\nE1,2025-07-15\n";
    let (_dir, pipeline) = setup(csv)?;
    let dest = InMemoryDestination::new();

    let err = pipeline.run(destination, &dest).await.unwrap_err();

    assert!(matches!(err, EtlError::Transformation { .. }));
    assert_eq!(dest.connection_attempts(), 0);
    Ok(())
}

#[test]
fn transform_without_extract_reports_missing_artifact() -> Result<()> {
    let dir = tempdir()?;
    let pipeline = Pipeline::new(config_for(dir.path()));
    let err = pipeline.transform().unwrap_err();
    assert!(matches!(err, EtlError::MissingArtifact { .. }));
    Ok(())
}
