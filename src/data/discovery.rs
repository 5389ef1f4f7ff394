use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::{PipelineError, PipelineResult};
use crate::models::ticker::{
    has_suffix_ci, ArchiveKind, TickerArchive, TickerId, DATE_INDEX_SUFFIX, JSON_GZ_SUFFIX,
    JSON_SUFFIX, MANIFEST_FILE,
};

/// Classify a directory entry name. `None` when it is not a ticker archive.
pub fn classify_file_name(name: &str) -> Option<(TickerId, ArchiveKind)> {
    if name == MANIFEST_FILE || has_suffix_ci(name, DATE_INDEX_SUFFIX) {
        return None;
    }
    let kind = if has_suffix_ci(name, JSON_GZ_SUFFIX) {
        ArchiveKind::JsonGz
    } else if has_suffix_ci(name, JSON_SUFFIX) {
        ArchiveKind::Json
    } else {
        return None;
    };
    let stem = &name[..name.len() - kind.suffix().len()];
    if stem.is_empty() {
        return None;
    }
    Some((TickerId::new(stem), kind))
}

/// List ticker archives directly under `base_dir`, sorted by ticker, one per ticker.
///
/// Subdirectories (including per-ticker shard folders) are not entered.
pub fn discover_tickers(base_dir: &Path) -> PipelineResult<Vec<TickerArchive>> {
    let entries = fs::read_dir(base_dir).map_err(|source| PipelineError::Read {
        path: base_dir.to_path_buf(),
        source,
    })?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            debug!("Skipping non UTF-8 file name {:?}", name);
            continue;
        };
        if let Some((ticker, kind)) = classify_file_name(name) {
            archives.push(TickerArchive {
                ticker,
                kind,
                path: entry.path(),
            });
        }
    }

    // A plain archive shadows a gzip one for the same ticker.
    archives.sort();
    archives.dedup_by(|later, first| later.ticker == first.ticker);
    debug!("Discovered {} ticker archives in {}", archives.len(), base_dir.display());
    Ok(archives)
}

/// Archives that can be scanned and split, keeping their discovered paths.
pub fn scannable(archives: Vec<TickerArchive>) -> Vec<TickerArchive> {
    archives
        .into_iter()
        .filter(|a| a.kind.is_scannable())
        .collect()
}
