pub mod dates;
pub mod extract;
pub mod load;
pub mod staging;
pub mod transform;

use crate::app::ports::DestinationConnector;
use crate::config::{DestinationConfig, PipelineConfig};
use crate::error::Result;
use crate::observability;
use extract::ExtractReport;
use load::LoadReport;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use transform::TransformReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub extract: ExtractReport,
    pub transform: TransformReport,
    pub load: LoadReport,
}

/// Runs the three stages strictly in order. Each stage reads only the previous
/// stage's staging artifact, so any of them can also be invoked on its own.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extract(&self) -> Result<ExtractReport> {
        run_stage(Stage::Extract, || {
            extract::extract(
                &self.config.input_dir,
                &self.config.input_extension,
                &self.config.raw_artifact,
            )
        })
    }

    pub fn transform(&self) -> Result<TransformReport> {
        run_stage(Stage::Transform, || {
            transform::transform(&self.config.raw_artifact, &self.config.clean_artifact)
        })
    }

    pub async fn load(
        &self,
        destination: &DestinationConfig,
        connector: &dyn DestinationConnector,
    ) -> Result<LoadReport> {
        let span = info_span!("stage", stage = %Stage::Load);
        async {
            let started = Instant::now();
            info!("Starting {} stage", Stage::Load);
            let result = load::load(&self.config.clean_artifact, destination, connector).await;
            finish_stage(Stage::Load, started, result)
        }
        .instrument(span)
        .await
    }

    /// Extract, transform, then load. The destination config is resolved only once
    /// the load stage is reached, so credential problems surface at that point and
    /// before any connection is attempted.
    pub async fn run<F>(
        &self,
        resolve_destination: F,
        connector: &dyn DestinationConnector,
    ) -> Result<PipelineReport>
    where
        F: FnOnce() -> Result<DestinationConfig>,
    {
        let extract = self.extract()?;
        let transform = self.transform()?;
        let destination = resolve_destination().map_err(|e| {
            error!("Error in {} step: {}", Stage::Load, e);
            observability::stage_failed(Stage::Load.as_str());
            e
        })?;
        let load = self.load(&destination, connector).await?;
        Ok(PipelineReport {
            extract,
            transform,
            load,
        })
    }
}

fn run_stage<T, F>(stage: Stage, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let span = info_span!("stage", stage = %stage);
    let _enter = span.enter();
    let started = Instant::now();
    info!("Starting {} stage", stage);
    finish_stage(stage, started, f())
}

fn finish_stage<T>(stage: Stage, started: Instant, result: Result<T>) -> Result<T> {
    let secs = started.elapsed().as_secs_f64();
    observability::stage_duration(stage.as_str(), secs);
    match &result {
        Ok(_) => info!("Finished {} stage in {:.2}s", stage, secs),
        Err(e) => {
            error!("Error in {} step: {}", stage, e);
            observability::stage_failed(stage.as_str());
        }
    }
    result
}
