use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::data::discovery::discover_tickers;
use crate::data::scanner::DateScanner;
use crate::errors::{ErrorResponse, PipelineResult};
use crate::models::config::{PipelineConfig, ScanFailurePolicy};
use crate::models::manifest::{DateIndex, Manifest};
use crate::models::ticker::{
    has_suffix_ci, TickerArchive, TickerId, DATE_INDEX_SUFFIX, MANIFEST_FILE,
};
use crate::utils::export::write_json;

/// Outcome of one manifest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestReport {
    pub manifest_path: PathBuf,
    pub tickers: usize,
    pub scanned: usize,
    /// Listed without dates because the archive is not scannable.
    pub listed_only: Vec<TickerId>,
    /// Scan failed and the policy allowed the run to continue.
    pub skipped: Vec<(TickerId, ErrorResponse)>,
    /// Side files removed because their ticker no longer has a scannable archive.
    pub pruned: Vec<PathBuf>,
    pub total_dates: usize,
}

/// Regenerates `manifest.json` and every `<TICKER>.dates.json` from scratch.
///
/// Prior output is overwritten, never merged, so the result reflects only
/// the archives present in the directory right now.
pub struct ManifestWriter {
    base_dir: PathBuf,
    scanner: DateScanner,
    policy: ScanFailurePolicy,
}

impl ManifestWriter {
    pub fn new(config: &PipelineConfig) -> Self {
        ManifestWriter {
            base_dir: config.base_dir.clone(),
            scanner: DateScanner::new(config.scanner),
            policy: config.scan_failure,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.base_dir.join(MANIFEST_FILE)
    }

    pub fn date_index_path(&self, ticker: &TickerId) -> PathBuf {
        self.base_dir.join(ticker.date_index_file_name())
    }

    /// Discover, scan, and write everything. Returns the manifest that was written.
    pub fn run(&self) -> PipelineResult<(Manifest, ManifestReport)> {
        let archives = discover_tickers(&self.base_dir)?;
        self.write_for(&archives)
    }

    /// Scan the given archives in order and write side files plus the manifest.
    pub fn write_for(
        &self,
        archives: &[TickerArchive],
    ) -> PipelineResult<(Manifest, ManifestReport)> {
        let mut manifest = Manifest {
            tickers: archives.iter().map(|a| a.ticker.clone()).collect(),
            ..Default::default()
        };
        let mut report = ManifestReport {
            manifest_path: self.manifest_path(),
            tickers: archives.len(),
            ..Default::default()
        };

        for archive in archives {
            if !archive.kind.is_scannable() {
                info!(
                    "Listing {} without dates ({} archive)",
                    archive.ticker,
                    archive.kind.suffix()
                );
                report.listed_only.push(archive.ticker.clone());
                continue;
            }

            info!(
                "Scanning dates for {} from {} ...",
                archive.ticker,
                file_name(&archive.path)
            );
            let dates = match self.scanner.scan_path(&archive.path) {
                Ok(dates) => dates,
                Err(e) if self.policy == ScanFailurePolicy::Skip => {
                    warn!("Skip {}: {}", archive.ticker, e);
                    report.skipped.push((archive.ticker.clone(), ErrorResponse::from(&e)));
                    continue;
                }
                Err(e) => return Err(e),
            };

            write_json(
                &DateIndex {
                    dates: dates.clone(),
                },
                &self.date_index_path(&archive.ticker),
            )?;
            report.scanned += 1;
            manifest.dates.insert(archive.ticker.clone(), dates);
        }

        report.total_dates = manifest.total_dates();
        write_json(&manifest, &report.manifest_path)?;
        // Only once the new manifest is in place.
        report.pruned = self.prune_stale_indexes(&manifest)?;
        info!(
            "Wrote manifest with {} tickers to {}",
            manifest.tickers.len(),
            report.manifest_path.display()
        );
        Ok((manifest, report))
    }

    /// Remove `*.dates.json` files not written by this run.
    fn prune_stale_indexes(&self, manifest: &Manifest) -> PipelineResult<Vec<PathBuf>> {
        let mut pruned = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !has_suffix_ci(name, DATE_INDEX_SUFFIX) || !path.is_file() {
                continue;
            }
            let stem = TickerId::new(&name[..name.len() - DATE_INDEX_SUFFIX.len()]);
            if manifest.dates.contains_key(&stem) {
                continue;
            }
            fs::remove_file(&path)?;
            info!("Removed stale date index {}", name);
            pruned.push(path);
        }
        pruned.sort();
        Ok(pruned)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use crate::models::config::ScannerConfig;
    use crate::models::ticker::ArchiveKind;
    use std::fs;

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ACME.json"),
            r#"{"days":{"2023-01-04":[{"time":2}],"2023-01-03":[{"time":1}]}}"#,
        )
        .unwrap();
        fs::write(dir.path().join("BETA.json"), r#"{"days":{}}"#).unwrap();
        fs::write(dir.path().join("GZIP.json.gz"), [0x1f, 0x8b]).unwrap();
        dir
    }

    #[test]
    fn test_manifest_contents() {
        let dir = setup();
        let writer = ManifestWriter::new(&PipelineConfig::new(dir.path()));
        let (manifest, report) = writer.run().unwrap();

        assert_eq!(report.tickers, 3);
        assert_eq!(report.scanned, 2);
        assert_eq!(report.listed_only, vec![TickerId::new("GZIP")]);
        assert_eq!(report.total_dates, 2);
        assert_eq!(manifest.tickers.len(), 3);

        let written = fs::read_to_string(dir.path().join("manifest.json")).unwrap();
        assert_eq!(
            written,
            r#"{"tickers":["ACME","BETA","GZIP"],"dates":{"ACME":["2023-01-03","2023-01-04"],"BETA":[]}}"#
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("ACME.dates.json")).unwrap(),
            r#"{"dates":["2023-01-03","2023-01-04"]}"#
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("BETA.dates.json")).unwrap(),
            r#"{"dates":[]}"#
        );
        assert!(!dir.path().join("GZIP.dates.json").exists());
    }

    #[test]
    fn test_rerun_is_byte_identical_and_ignores_own_output() {
        let dir = setup();
        let writer = ManifestWriter::new(&PipelineConfig::new(dir.path()));
        writer.run().unwrap();
        let first = fs::read(dir.path().join("manifest.json")).unwrap();
        let first_idx = fs::read(dir.path().join("ACME.dates.json")).unwrap();
        writer.run().unwrap();
        assert_eq!(fs::read(dir.path().join("manifest.json")).unwrap(), first);
        assert_eq!(fs::read(dir.path().join("ACME.dates.json")).unwrap(), first_idx);
    }

    #[test]
    fn test_regenerated_not_merged() {
        let dir = setup();
        let writer = ManifestWriter::new(&PipelineConfig::new(dir.path()));
        writer.run().unwrap();
        fs::remove_file(dir.path().join("BETA.json")).unwrap();
        fs::write(dir.path().join("ACME.json"), r#"{"days":{"2023-02-01":[]}}"#).unwrap();
        let (manifest, _) = writer.run().unwrap();
        assert_eq!(manifest.tickers, vec![TickerId::new("ACME"), TickerId::new("GZIP")]);
        assert_eq!(
            manifest.dates.get(&TickerId::new("ACME")).unwrap(),
            &vec!["2023-02-01".to_string()]
        );
        assert!(!manifest.dates.contains_key(&TickerId::new("BETA")));
        assert!(!dir.path().join("BETA.dates.json").exists());
    }

    #[test]
    fn test_failed_manifest_write_keeps_side_files() {
        let dir = setup();
        fs::write(dir.path().join("OLD.dates.json"), r#"{"dates":[]}"#).unwrap();
        // a directory in the manifest's place makes the final rename fail
        fs::create_dir(dir.path().join("manifest.json")).unwrap();

        let err = ManifestWriter::new(&PipelineConfig::new(dir.path()))
            .run()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
        assert!(dir.path().join("OLD.dates.json").exists());
    }

    #[test]
    fn test_small_chunks_give_same_manifest() {
        let dir = setup();
        let mut config = PipelineConfig::new(dir.path());
        config.scanner = ScannerConfig::with_chunk_size(3).unwrap();
        let (small, _) = ManifestWriter::new(&config).run().unwrap();
        let (default, _) = ManifestWriter::new(&PipelineConfig::new(dir.path()))
            .run()
            .unwrap();
        assert_eq!(small, default);
    }

    fn unreadable_archives(dir: &Path) -> Vec<TickerArchive> {
        let mut archives = discover_tickers(dir).unwrap();
        // no such file, so opening it fails
        archives.insert(
            1,
            TickerArchive {
                ticker: TickerId::new("BAD"),
                kind: ArchiveKind::Json,
                path: dir.join("BAD.missing"),
            },
        );
        archives
    }

    #[test]
    fn test_scan_failure_aborts_by_default() {
        let dir = setup();
        let writer = ManifestWriter::new(&PipelineConfig::new(dir.path()));
        let err = writer.write_for(&unreadable_archives(dir.path())).unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
        assert!(!dir.path().join("manifest.json").exists());
    }

    #[test]
    fn test_scan_failure_skipped_when_allowed() {
        let dir = setup();
        let mut config = PipelineConfig::new(dir.path());
        config.scan_failure = ScanFailurePolicy::Skip;
        let (manifest, report) = ManifestWriter::new(&config)
            .write_for(&unreadable_archives(dir.path()))
            .unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].1.code, "READ");
        assert!(manifest.tickers.contains(&TickerId::new("BAD")));
        assert!(!manifest.dates.contains_key(&TickerId::new("BAD")));
        assert!(!dir.path().join("BAD.dates.json").exists());
        assert!(dir.path().join("manifest.json").exists());
    }
}
