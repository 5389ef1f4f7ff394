//! Command-line surface
//!
//! - `manifest`: regenerate `manifest.json` and `<TICKER>.dates.json`
//! - `split`: write `<TICKER>/<DATE>.json` day shards
//! - `all`: manifest, then split every scannable ticker

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use crate::data::discovery::{discover_tickers, scannable};
use crate::data::manifest::{ManifestReport, ManifestWriter};
use crate::data::splitter::{DaySplitter, SplitRunReport};
use crate::errors::PipelineResult;
use crate::models::config::{
    PipelineConfig, ScanFailurePolicy, ScannerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_WHITESPACE,
    DEFAULT_OVERLAP,
};
use crate::models::ticker::{TickerArchive, TickerId};

/// Date manifest and day shard generator
#[derive(Debug, Parser)]
#[command(name = "day-shard")]
#[command(about = "Build date manifests and per-day shards from per-ticker JSON archives")]
#[command(version)]
pub struct Cli {
    /// Directory holding <TICKER>.json archives [default: ./data_json]
    #[arg(long, short = 'd', global = true)]
    pub base_dir: Option<PathBuf>,

    /// Scanner read size in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Bytes carried between scanner chunks
    #[arg(long, global = true, default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Regenerate the date manifest and per-ticker date indexes
    Manifest(ManifestArgs),
    /// Split ticker archives into per-day files
    Split(SplitArgs),
    /// Regenerate the manifest, then split every ticker
    All(ManifestArgs),
}

#[derive(Debug, Args)]
pub struct ManifestArgs {
    /// Keep going when a ticker archive cannot be read
    #[arg(long)]
    pub skip_unreadable: bool,
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Tickers to split [default: every <TICKER>.json in the base directory]
    pub tickers: Vec<String>,
}

impl Cli {
    pub fn pipeline_config(&self) -> PipelineResult<PipelineConfig> {
        let base_dir = self
            .base_dir
            .clone()
            .unwrap_or_else(PipelineConfig::default_base_dir);
        let mut config = PipelineConfig::new(base_dir);
        config.scanner = ScannerConfig::new(self.chunk_size, self.overlap, DEFAULT_MAX_WHITESPACE)?;
        config.scan_failure = match &self.command {
            Commands::Manifest(args) | Commands::All(args) if args.skip_unreadable => {
                ScanFailurePolicy::Skip
            }
            _ => ScanFailurePolicy::Abort,
        };
        Ok(config)
    }
}

/// Validate configuration and run the selected command.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = cli.pipeline_config()?;
    config.validate()?;
    debug!("Effective config: {}", serde_json::to_string(&config)?);

    match &cli.command {
        Commands::Manifest(_) => {
            run_manifest(&config)?;
        }
        Commands::Split(args) => {
            run_split(&config, &args.tickers)?;
        }
        Commands::All(_) => {
            run_manifest(&config)?;
            run_split(&config, &[])?;
        }
    }
    Ok(())
}

pub fn run_manifest(config: &PipelineConfig) -> Result<ManifestReport> {
    let (_, report) = ManifestWriter::new(config)
        .run()
        .with_context(|| format!("Manifest run over {} failed", config.base_dir.display()))?;
    if !report.skipped.is_empty() {
        info!("{} tickers skipped during scan", report.skipped.len());
    }
    Ok(report)
}

/// Split the named tickers, or every scannable ticker when none are named.
///
/// Archives found in the base directory are split from their real path, so
/// `ACME.JSON` is read as is. Only a named ticker with no such archive falls
/// back to `<base>/<TICKER>.json`.
pub fn run_split(config: &PipelineConfig, tickers: &[String]) -> Result<SplitRunReport> {
    let splitter = DaySplitter::new(config);
    let discovered = scannable(discover_tickers(config.base_dir())?);
    let archives: Vec<TickerArchive> = if tickers.is_empty() {
        discovered
    } else {
        tickers
            .iter()
            .map(|t| {
                let ticker = TickerId::from_arg(t);
                discovered
                    .iter()
                    .find(|a| a.ticker == ticker)
                    .cloned()
                    .unwrap_or_else(|| splitter.resolve(&ticker))
            })
            .collect()
    };

    let report = splitter
        .split_archives(&archives)
        .with_context(|| format!("Split run over {} failed", config.base_dir.display()))?;
    info!(
        "Split {} tickers into {} day files ({} skipped)",
        report.split.len(),
        report.total_days(),
        report.skipped.len()
    );
    Ok(report)
}
