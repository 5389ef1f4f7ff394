use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ticker::TickerId;

/// Calendar-date shaped key (`20YY-MM-DD`). Opaque; compared as a string.
pub type DateKey = String;

/// Consolidated index of every discovered ticker and its available dates.
///
/// Tickers without scannable archives appear in `tickers` but not in `dates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub tickers: Vec<TickerId>,
    pub dates: BTreeMap<TickerId, Vec<DateKey>>,
}

/// Per-ticker `<TICKER>.dates.json` side file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateIndex {
    pub dates: Vec<DateKey>,
}

impl Manifest {
    pub fn total_dates(&self) -> usize {
        self.dates.values().map(Vec::len).sum()
    }
}
