use std::path::PathBuf;

use serde::Serialize;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// All pipeline errors, categorized by how the caller is expected to react.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    // ── Configuration ──
    #[error("Base directory not found: {}", .0.display())]
    BaseDirMissing(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Archives ──
    #[error("Archive not found for ticker {ticker}: {}", .path.display())]
    ArchiveNotFound { ticker: String, path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse archive {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ── Output ──
    #[error("Failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    // ── Serialization ──
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── General ──
    #[error("I/O error: {0}")]
    Io(String),
}

impl PipelineError {
    /// Stable code used in run reports.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::BaseDirMissing(_) => "BASE_DIR_MISSING",
            PipelineError::InvalidConfig(_) => "INVALID_CONFIG",
            PipelineError::ArchiveNotFound { .. } => "ARCHIVE_NOT_FOUND",
            PipelineError::Read { .. } => "READ",
            PipelineError::Parse { .. } => "PARSE",
            PipelineError::Write { .. } => "WRITE",
            PipelineError::Serialization(_) => "SERIALIZATION",
            PipelineError::Io(_) => "IO",
        }
    }

    /// Configuration errors abort the process before any ticker is touched.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PipelineError::BaseDirMissing(_) | PipelineError::InvalidConfig(_)
        )
    }
}

/// Serializable error entry for run reports.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ── Conversions from external errors ──

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}
