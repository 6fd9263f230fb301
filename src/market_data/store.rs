// =============================================================================
// Bar Store: the engine's only data boundary
// =============================================================================
//
// A store answers one question: "give me the newest `count` bars for this
// symbol and interval, newest-first".  It must either return exactly `count`
// bars or fail with a descriptive error.  Partial or empty answers are never
// returned in place of an error.
//
// Interval tokens ("1min", "5min", "1day", ...) are opaque here.
// =============================================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::Result;
use crate::market_data::bar::{Bar, RawBar};
use crate::market_data::series::BarSeries;

/// Failures that belong to the store rather than to indicator math.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No data exists for the requested key.
    #[error("no bars for {key}")]
    NotFound { key: SeriesKey },

    /// The source has fewer bars than requested.
    #[error("{key}: requested {requested} bars, source has {available}")]
    Insufficient {
        key: SeriesKey,
        requested: usize,
        available: usize,
    },

    /// The source could not be read.
    #[error("{key}: source unavailable at {path}")]
    Unavailable {
        key: SeriesKey,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider answered with an error document.
    #[error("{key}: provider error {code}: {message}")]
    Upstream {
        key: SeriesKey,
        code: i64,
        message: String,
    },

    /// The key cannot name a file inside the store directory.
    #[error("{key}: invalid series key: {reason}")]
    InvalidKey { key: SeriesKey, reason: String },

    /// The payload is not a time-series document.
    #[error("{key}: malformed payload")]
    Payload {
        key: SeriesKey,
        #[source]
        source: serde_json::Error,
    },
}

/// Identifies one bar series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub symbol: String,
    pub interval: String,
}

impl SeriesKey {
    pub fn new(symbol: &str, interval: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            interval: interval.trim().to_string(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

/// Source of newest-first bar series.
pub trait BarStore {
    /// Return exactly `count` bars for `symbol` / `interval`, newest-first.
    fn fetch_bars(&self, symbol: &str, interval: &str, count: usize) -> Result<BarSeries>;
}

impl<S: BarStore + ?Sized> BarStore for &S {
    fn fetch_bars(&self, symbol: &str, interval: &str, count: usize) -> Result<BarSeries> {
        (**self).fetch_bars(symbol, interval, count)
    }
}

/// Take the newest `count` bars or report how short the source is.
fn take_newest(key: SeriesKey, mut bars: Vec<Bar>, count: usize) -> Result<BarSeries> {
    if bars.len() < count {
        return Err(StoreError::Insufficient {
            key,
            requested: count,
            available: bars.len(),
        }
        .into());
    }
    bars.truncate(count);
    Ok(BarSeries::newest_first(key.symbol, key.interval, bars))
}

// ---------------------------------------------------------------------------
// InMemoryBarStore
// ---------------------------------------------------------------------------

/// Store backed by bars already held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBarStore {
    series: HashMap<SeriesKey, Vec<Bar>>,
}

impl InMemoryBarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bars ordered newest-first, replacing any previous entry.
    pub fn insert(&mut self, symbol: &str, interval: &str, bars_newest_first: Vec<Bar>) {
        self.series
            .insert(SeriesKey::new(symbol, interval), bars_newest_first);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_series(mut self, symbol: &str, interval: &str, bars_newest_first: Vec<Bar>) -> Self {
        self.insert(symbol, interval, bars_newest_first);
        self
    }
}

impl BarStore for InMemoryBarStore {
    fn fetch_bars(&self, symbol: &str, interval: &str, count: usize) -> Result<BarSeries> {
        let key = SeriesKey::new(symbol, interval);
        let bars = self
            .series
            .get(&key)
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })?;
        debug!(%key, count, available = bars.len(), "in-memory fetch");
        take_newest(key, bars.clone(), count)
    }
}

// ---------------------------------------------------------------------------
// JsonBarStore
// ---------------------------------------------------------------------------

/// The provider's `time_series` response document.
#[derive(Debug, Deserialize)]
struct TimeSeriesPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Vec<RawBar>,
}

/// Parse a provider `time_series` document into newest-first bars.
pub fn parse_time_series(key: &SeriesKey, text: &str) -> Result<Vec<Bar>> {
    let payload: TimeSeriesPayload =
        serde_json::from_str(text).map_err(|source| StoreError::Payload {
            key: key.clone(),
            source,
        })?;

    if payload.status.as_deref() == Some("error") {
        return Err(StoreError::Upstream {
            key: key.clone(),
            code: payload.code.unwrap_or_default(),
            message: payload.message.unwrap_or_else(|| "unknown error".into()),
        }
        .into());
    }

    payload.values.into_iter().map(Bar::try_from).collect()
}

/// Store that reads one provider document per series from a directory.
///
/// The file for `AAPL` / `5min` is `<dir>/AAPL_5min.json`.  Every fetch reads
/// the file again.
#[derive(Debug, Clone)]
pub struct JsonBarStore {
    dir: PathBuf,
}

impl JsonBarStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`'s series.  Symbols and intervals that could
    /// leave the store directory are rejected.
    pub fn path_for(&self, key: &SeriesKey) -> Result<PathBuf> {
        for (what, part) in [("symbol", &key.symbol), ("interval", &key.interval)] {
            let reason = if part.is_empty() {
                Some(format!("empty {what}"))
            } else if part.contains(['/', '\\']) {
                Some(format!("{what} `{part}` contains a path separator"))
            } else if part.contains("..") {
                Some(format!("{what} `{part}` contains `..`"))
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(StoreError::InvalidKey {
                    key: key.clone(),
                    reason,
                }
                .into());
            }
        }
        Ok(self.dir.join(format!("{}_{}.json", key.symbol, key.interval)))
    }
}

impl BarStore for JsonBarStore {
    fn fetch_bars(&self, symbol: &str, interval: &str, count: usize) -> Result<BarSeries> {
        let key = SeriesKey::new(symbol, interval);
        let path = self.path_for(&key)?;

        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound { key: key.clone() }
            } else {
                StoreError::Unavailable {
                    key: key.clone(),
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let bars = parse_time_series(&key, &text)?;
        debug!(%key, path = %path.display(), count, available = bars.len(), "file fetch");
        take_newest(key, bars, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndicatorError;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let base = 100.0 - i as f64;
                Bar::new(format!("t{i}"), base, base + 1.0, base - 1.0, base, 10.0)
            })
            .collect()
    }

    const PAYLOAD: &str = r#"{
        "meta": {"symbol": "AAPL", "interval": "5min"},
        "values": [
            {"datetime": "2024-03-01 15:55:00", "open": "180.1", "high": "180.9", "low": "179.8", "close": "180.5", "volume": "1500"},
            {"datetime": "2024-03-01 15:50:00", "open": "179.7", "high": "180.3", "low": "179.5", "close": "180.1", "volume": "1200"},
            {"datetime": "2024-03-01 15:45:00", "open": "179.9", "high": "180.0", "low": "179.2", "close": "179.7", "volume": "900"}
        ],
        "status": "ok"
    }"#;

    #[test]
    fn in_memory_returns_exactly_count() {
        let store = InMemoryBarStore::new().with_series("aapl", "1day", bars(10));
        let series = store.fetch_bars("AAPL", "1day", 4).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.newest().unwrap().timestamp, "t0");
        assert_eq!(series.oldest().unwrap().timestamp, "t3");
    }

    #[test]
    fn in_memory_rejects_short_and_unknown() {
        let store = InMemoryBarStore::new().with_series("AAPL", "1day", bars(3));
        assert!(matches!(
            store.fetch_bars("AAPL", "1day", 5),
            Err(IndicatorError::Store(StoreError::Insufficient {
                requested: 5,
                available: 3,
                ..
            }))
        ));
        assert!(matches!(
            store.fetch_bars("MSFT", "1day", 1),
            Err(IndicatorError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn parses_provider_document() {
        let key = SeriesKey::new("AAPL", "5min");
        let parsed = parse_time_series(&key, PAYLOAD).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].timestamp, "2024-03-01 15:55:00");
        assert!((parsed[2].close - 179.7).abs() < 1e-12);
    }

    #[test]
    fn provider_error_document_is_surfaced() {
        let key = SeriesKey::new("NOPE", "5min");
        let err = parse_time_series(
            &key,
            r#"{"code": 400, "message": "symbol not found", "status": "error"}"#,
        )
        .unwrap_err();
        match err {
            IndicatorError::Store(StoreError::Upstream { code, message, .. }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "symbol not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let key = SeriesKey::new("AAPL", "5min");
        assert!(matches!(
            parse_time_series(&key, "<html>rate limited</html>"),
            Err(IndicatorError::Store(StoreError::Payload { .. }))
        ));
    }

    #[test]
    fn malformed_number_is_a_bar_error() {
        let key = SeriesKey::new("AAPL", "5min");
        let text = PAYLOAD.replace("\"180.5\"", "\"--\"");
        assert!(matches!(
            parse_time_series(&key, &text),
            Err(IndicatorError::MalformedBar { .. })
        ));
    }

    #[test]
    fn json_store_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AAPL_5min.json"), PAYLOAD).unwrap();

        let store = JsonBarStore::new(dir.path());
        let series = store.fetch_bars("aapl", "5min", 2).unwrap();
        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.timestamps(), vec!["2024-03-01 15:55:00", "2024-03-01 15:50:00"]);

        assert!(matches!(
            store.fetch_bars("AAPL", "5min", 4),
            Err(IndicatorError::Store(StoreError::Insufficient { .. }))
        ));
        assert!(matches!(
            store.fetch_bars("MSFT", "5min", 1),
            Err(IndicatorError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn json_store_rejects_keys_outside_its_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("bars");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(root.path().join("X_1day.json"), PAYLOAD).unwrap();

        let store = JsonBarStore::new(&dir);
        for (symbol, interval) in [
            ("../X", "1day"),
            ("..", "1day"),
            ("AAPL", "../../etc/passwd"),
            ("AAPL", "5min/x"),
            ("AAPL", "5min\\x"),
            ("   ", "1day"),
            ("AAPL", ""),
        ] {
            assert!(
                matches!(
                    store.fetch_bars(symbol, interval, 1),
                    Err(IndicatorError::Store(StoreError::InvalidKey { .. }))
                ),
                "{symbol:?} / {interval:?} was accepted"
            );
        }
        assert!(store.path_for(&SeriesKey::new("brk.b", "1day")).is_ok());
    }
}
