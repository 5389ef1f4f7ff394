use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{ErrorResponse, PipelineError, PipelineResult};
use crate::models::bar::{DayArchive, NormalizedBar, RawBar};
use crate::models::config::PipelineConfig;
use crate::models::ticker::{ArchiveKind, TickerArchive, TickerId, JSON_SUFFIX};
use crate::utils::export::write_json;

/// Result of splitting one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub ticker: TickerId,
    pub out_dir: PathBuf,
    pub days: usize,
    pub rows: usize,
}

/// Result of splitting a list of tickers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitRunReport {
    pub split: Vec<SplitReport>,
    pub skipped: Vec<(TickerId, ErrorResponse)>,
}

impl SplitRunReport {
    pub fn total_days(&self) -> usize {
        self.split.iter().map(|r| r.days).sum()
    }
}

/// Writes `<TICKER>/<DATE>.json` shards from a whole `<TICKER>.json` archive.
///
/// The archive is parsed in one piece; a document that fails to parse
/// produces no shards at all.
pub struct DaySplitter {
    base_dir: PathBuf,
}

impl DaySplitter {
    pub fn new(config: &PipelineConfig) -> Self {
        DaySplitter {
            base_dir: config.base_dir.clone(),
        }
    }

    pub fn archive_path(&self, ticker: &TickerId) -> PathBuf {
        self.base_dir.join(ticker.archive_file_name())
    }

    /// Archive for a ticker known only by name: `<base>/<TICKER>.json`.
    pub fn resolve(&self, ticker: &TickerId) -> TickerArchive {
        TickerArchive {
            ticker: ticker.clone(),
            kind: ArchiveKind::Json,
            path: self.archive_path(ticker),
        }
    }

    pub fn output_dir(&self, ticker: &TickerId) -> PathBuf {
        self.base_dir.join(ticker.as_str())
    }

    /// Split tickers by name. Missing archives are skipped; any other
    /// error stops the run.
    pub fn split_all(&self, tickers: &[TickerId]) -> PipelineResult<SplitRunReport> {
        let archives: Vec<TickerArchive> = tickers.iter().map(|t| self.resolve(t)).collect();
        self.split_archives(&archives)
    }

    /// Split archives in order, reading each from its own path.
    pub fn split_archives(&self, archives: &[TickerArchive]) -> PipelineResult<SplitRunReport> {
        let mut report = SplitRunReport::default();
        for archive in archives {
            match self.split_archive(archive) {
                Ok(r) => report.split.push(r),
                Err(e @ PipelineError::ArchiveNotFound { .. }) => {
                    warn!("Skip {}: {}", archive.ticker, e);
                    report
                        .skipped
                        .push((archive.ticker.clone(), ErrorResponse::from(&e)));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    pub fn split_ticker(&self, ticker: &TickerId) -> PipelineResult<SplitReport> {
        self.split_archive(&self.resolve(ticker))
    }

    pub fn split_archive(&self, archive: &TickerArchive) -> PipelineResult<SplitReport> {
        let ticker = &archive.ticker;
        let in_path = &archive.path;
        if !archive.kind.is_scannable() || !in_path.is_file() {
            return Err(PipelineError::ArchiveNotFound {
                ticker: ticker.to_string(),
                path: in_path.clone(),
            });
        }

        info!("Reading {} ...", in_path.display());
        let bytes = fs::read(in_path).map_err(|source| PipelineError::Read {
            path: in_path.clone(),
            source,
        })?;
        let doc: DayArchive =
            serde_json::from_slice(&bytes).map_err(|source| PipelineError::Parse {
                path: in_path.clone(),
                source,
            })?;
        drop(bytes);

        let out_dir = self.output_dir(ticker);
        let mut report = SplitReport {
            ticker: ticker.clone(),
            out_dir: out_dir.clone(),
            days: 0,
            rows: 0,
        };

        for (date, rows) in doc.days {
            if !is_safe_file_stem(&date) {
                warn!(
                    "Skipping day key {:?} for {}: not usable as a file name",
                    date, ticker
                );
                continue;
            }
            fs::create_dir_all(&out_dir).map_err(|e| PipelineError::Write {
                path: out_dir.clone(),
                message: e.to_string(),
            })?;

            let normalized = normalize_rows(rows);
            let out_path = out_dir.join(format!("{}{}", date, JSON_SUFFIX));
            write_json(&normalized, &out_path)?;
            report.days += 1;
            report.rows += normalized.len();
        }

        info!("Wrote {} day files to {}", report.days, out_dir.display());
        Ok(report)
    }
}

/// One output record per input record, order preserved.
pub fn normalize_rows(rows: Vec<RawBar>) -> Vec<NormalizedBar> {
    rows.into_iter().map(NormalizedBar::from).collect()
}

fn is_safe_file_stem(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}
