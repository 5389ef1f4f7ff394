use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::{debug, trace};

use crate::data::matcher::DateKeyMatcher;
use crate::errors::{PipelineError, PipelineResult};
use crate::models::config::ScannerConfig;
use crate::models::manifest::DateKey;

/// Extracts the set of date keys from an archive without parsing it as JSON.
///
/// Reads fixed-size chunks and prepends the trailing `overlap` bytes of the
/// previous window to each one, so a key straddling a chunk boundary is always
/// seen whole at least once. Memory use is bounded by `chunk_size + overlap`
/// regardless of file size. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct DateScanner {
    config: ScannerConfig,
    matcher: DateKeyMatcher,
}

impl DateScanner {
    pub fn new(config: ScannerConfig) -> Self {
        DateScanner {
            matcher: DateKeyMatcher::new(config.max_whitespace()),
            config,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan one archive file. Sorted, deduplicated; empty when nothing matches.
    pub fn scan_path(&self, path: &Path) -> PipelineResult<Vec<DateKey>> {
        let read_err = |source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_err)?;
        let dates = self.scan_reader(file).map_err(read_err)?;
        debug!("Found {} dates in {}", dates.len(), path.display());
        Ok(dates)
    }

    /// Scan any byte stream. Read errors are returned as-is.
    pub fn scan_reader<R: Read>(&self, mut reader: R) -> io::Result<Vec<DateKey>> {
        let overlap = self.config.overlap();
        let mut chunk = vec![0u8; self.config.chunk_size()];
        let mut window: Vec<u8> = Vec::with_capacity(overlap + chunk.len());
        let mut found: HashSet<DateKey> = HashSet::new();
        let mut chunks = 0usize;

        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            chunks += 1;
            window.extend_from_slice(&chunk[..n]);

            for m in self.matcher.find_iter(&window) {
                match std::str::from_utf8(m.key) {
                    Ok(key) => {
                        if !found.contains(key) {
                            found.insert(key.to_string());
                        }
                    }
                    Err(e) => trace!("Discarding undecodable date candidate: {}", e),
                }
            }

            if window.len() > overlap {
                window.drain(..window.len() - overlap);
            }
        }

        trace!("Scanned {} chunks", chunks);
        let mut dates: Vec<DateKey> = found.into_iter().collect();
        dates.sort_unstable();
        Ok(dates)
    }
}

impl Default for DateScanner {
    fn default() -> Self {
        DateScanner::new(ScannerConfig::default())
    }
}
