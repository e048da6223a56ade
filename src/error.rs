use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("No '{extension}' files found in {}", .dir.display())]
    NoInputFile { dir: PathBuf, extension: String },

    #[error("Extraction failed: {message}")]
    Extraction { message: String },

    #[error("Staging artifact not found: {}", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Transformation failed: {message}")]
    Transformation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Could not connect to destination store: {message}")]
    Connection { message: String },

    #[error("Insert failed for record {row}: {message}")]
    Insert { row: usize, message: String },

    #[error("Commit failed: {message}")]
    Commit { message: String },
}

impl EtlError {
    pub fn extraction(message: impl Into<String>) -> Self {
        EtlError::Extraction {
            message: message.into(),
        }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        EtlError::Transformation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        EtlError::Configuration {
            message: message.into(),
        }
    }

    /// Both a missing input file and an unreadable one count as extraction failures.
    pub fn is_extraction(&self) -> bool {
        matches!(self, EtlError::NoInputFile { .. } | EtlError::Extraction { .. })
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
