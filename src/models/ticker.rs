use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const DATE_INDEX_SUFFIX: &str = ".dates.json";
pub const JSON_SUFFIX: &str = ".json";
pub const JSON_GZ_SUFFIX: &str = ".json.gz";

/// Symbol identifier, taken verbatim from an archive filename stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerId(String);

impl TickerId {
    pub fn new(id: impl Into<String>) -> Self {
        TickerId(id.into())
    }

    /// Build from a user-supplied name, tolerating a trailing `.json`.
    pub fn from_arg(arg: &str) -> Self {
        let trimmed = arg.trim();
        if trimmed.len() > JSON_SUFFIX.len() && has_suffix_ci(trimmed, JSON_SUFFIX) {
            TickerId(trimmed[..trimmed.len() - JSON_SUFFIX.len()].to_string())
        } else {
            TickerId(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}{}", self.0, JSON_SUFFIX)
    }

    pub fn date_index_file_name(&self) -> String {
        format!("{}{}", self.0, DATE_INDEX_SUFFIX)
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage format of a ticker archive, decided by filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// Plain JSON, scannable and splittable.
    Json,
    /// Gzip-compressed JSON. Listed only.
    JsonGz,
}

impl ArchiveKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ArchiveKind::Json => JSON_SUFFIX,
            ArchiveKind::JsonGz => JSON_GZ_SUFFIX,
        }
    }

    pub fn is_scannable(&self) -> bool {
        matches!(self, ArchiveKind::Json)
    }
}

/// A discovered archive file and the ticker it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickerArchive {
    pub ticker: TickerId,
    pub kind: ArchiveKind,
    pub path: PathBuf,
}

/// ASCII case-insensitive suffix test.
pub(crate) fn has_suffix_ci(name: &str, suffix: &str) -> bool {
    let (n, s) = (name.as_bytes(), suffix.as_bytes());
    n.len() >= s.len() && n[n.len() - s.len()..].eq_ignore_ascii_case(s)
}
