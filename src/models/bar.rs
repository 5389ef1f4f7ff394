use std::collections::BTreeMap;
use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single source bar as it appears in a ticker archive.
///
/// Every field is optional and kept as a JSON value, so the projection keeps
/// each value's type (`10` stays an integer, `"09:30"` stays a string).
/// Floats are re-printed in shortest form, so `1e3` is written as `1000.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBar {
    pub time: Option<Value>,
    pub open: Option<Value>,
    pub high: Option<Value>,
    pub low: Option<Value>,
    pub close: Option<Value>,
    pub volume: Option<Value>,
    pub count: Option<Value>,
}

/// Fixed viewer schema. Field order is the serialized key order.
///
/// Absent source fields serialize as `null`, never as a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBar {
    pub t: Option<Value>,
    pub o: Option<Value>,
    pub h: Option<Value>,
    pub l: Option<Value>,
    pub c: Option<Value>,
    pub v: Option<Value>,
    pub cnt: Option<Value>,
}

impl From<RawBar> for NormalizedBar {
    fn from(raw: RawBar) -> Self {
        NormalizedBar {
            t: raw.time,
            o: raw.open,
            h: raw.high,
            l: raw.low,
            c: raw.close,
            v: raw.volume,
            cnt: raw.count,
        }
    }
}

/// Top-level document of a `<TICKER>.json` archive.
///
/// The document must be a JSON object. Only `days` is read; other keys are
/// ignored. A missing or `null` `days` is an empty mapping.
#[derive(Debug, Clone, Default)]
pub struct DayArchive {
    pub days: BTreeMap<String, Vec<RawBar>>,
}

impl<'de> Deserialize<'de> for DayArchive {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DayArchiveVisitor)
    }
}

struct DayArchiveVisitor;

impl<'de> Visitor<'de> for DayArchiveVisitor {
    type Value = DayArchive;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an archive object with a `days` mapping")
    }

    // Only a map is accepted; arrays and scalars fall through to a type error.
    fn visit_map<A>(self, mut map: A) -> Result<DayArchive, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut days = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == "days" {
                days = map
                    .next_value::<Option<BTreeMap<String, Vec<RawBar>>>>()?
                    .unwrap_or_default();
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(DayArchive { days })
    }
}
