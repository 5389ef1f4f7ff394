use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, PipelineResult};

/// Default read size for the date scanner (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
/// Default bytes carried from one chunk into the next.
pub const DEFAULT_OVERLAP: usize = 64;
/// Default whitespace allowed on each side of the `:` after a date key.
pub const DEFAULT_MAX_WHITESPACE: usize = 16;
/// Conventional archive directory, relative to the working directory.
pub const DEFAULT_BASE_DIR: &str = "data_json";

/// Streaming date scanner settings. Validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScannerConfig {
    chunk_size: usize,
    overlap: usize,
    max_whitespace: usize,
}

impl ScannerConfig {
    /// Build a config, rejecting an overlap narrower than the widest possible match.
    pub fn new(chunk_size: usize, overlap: usize, max_whitespace: usize) -> PipelineResult<Self> {
        if chunk_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }
        let width = Self::match_width(max_whitespace);
        if overlap < width {
            return Err(PipelineError::InvalidConfig(format!(
                "overlap of {} bytes is narrower than the maximum match width of {} bytes",
                overlap, width
            )));
        }
        Ok(ScannerConfig {
            chunk_size,
            overlap,
            max_whitespace,
        })
    }

    /// Config with the given chunk size and the smallest safe overlap.
    pub fn with_chunk_size(chunk_size: usize) -> PipelineResult<Self> {
        Self::new(
            chunk_size,
            Self::match_width(DEFAULT_MAX_WHITESPACE),
            DEFAULT_MAX_WHITESPACE,
        )
    }

    /// Widest match: `"20YY-MM-DD"` (12) + ws + `:` + ws + `[`.
    pub fn match_width(max_whitespace: usize) -> usize {
        14 + 2 * max_whitespace
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn max_whitespace(&self) -> usize {
        self.max_whitespace
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            max_whitespace: DEFAULT_MAX_WHITESPACE,
        }
    }
}

/// What the manifest run does when one ticker's archive cannot be scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFailurePolicy {
    /// Fail the whole run; the previous manifest is left untouched.
    #[default]
    Abort,
    /// List the ticker without dates or side file and continue.
    Skip,
}

/// Settings shared by the manifest and split commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub base_dir: PathBuf,
    pub scanner: ScannerConfig,
    pub scan_failure: ScanFailurePolicy,
}

impl PipelineConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        PipelineConfig {
            base_dir: base_dir.into(),
            scanner: ScannerConfig::default(),
            scan_failure: ScanFailurePolicy::default(),
        }
    }

    /// `<cwd>/data_json`, falling back to a relative path when cwd is unavailable.
    pub fn default_base_dir() -> PathBuf {
        std::env::current_dir()
            .map(|cwd| cwd.join(DEFAULT_BASE_DIR))
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_BASE_DIR))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The base directory must exist before anything is listed or written.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.base_dir.is_dir() {
            return Err(PipelineError::BaseDirMissing(self.base_dir.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_overlap_covers_match() {
        let cfg = ScannerConfig::default();
        assert!(cfg.overlap() >= ScannerConfig::match_width(cfg.max_whitespace()));
        assert_eq!(cfg.chunk_size(), 1024 * 1024);
    }

    #[test]
    fn test_rejects_narrow_overlap() {
        assert!(matches!(
            ScannerConfig::new(1024, 10, 0),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(ScannerConfig::new(1024, 14, 0).is_ok());
    }

    #[test]
    fn test_rejects_zero_chunk() {
        assert!(ScannerConfig::new(0, 64, 16).is_err());
        assert!(ScannerConfig::with_chunk_size(1).is_ok());
    }

    #[test]
    fn test_validate_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PipelineConfig::new(dir.path()).validate().is_ok());
        let missing = PipelineConfig::new(dir.path().join("missing"));
        assert!(matches!(
            missing.validate(),
            Err(PipelineError::BaseDirMissing(_))
        ));
    }
}
