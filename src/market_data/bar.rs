use serde::{Deserialize, Serialize};

use crate::error::{IndicatorError, Result};
use crate::types::BarField;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV observation for one interval.
///
/// `timestamp` is an opaque ordered token (typically the provider's
/// `datetime` string) and is carried through to derived series untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Read one numeric column.
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::Volume => self.volume,
        }
    }

    /// `high - low`. Zero for a flat bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

// ---------------------------------------------------------------------------
// Provider wire shape
// ---------------------------------------------------------------------------

/// A numeric field as the provider sends it: a JSON number or a numeric
/// string such as `"187.4400"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn parse(&self, timestamp: &str, name: &str) -> Result<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| IndicatorError::malformed_bar(timestamp, name, s.as_str()))?,
        };
        if !value.is_finite() {
            return Err(IndicatorError::malformed_bar(
                timestamp,
                name,
                value.to_string(),
            ));
        }
        Ok(value)
    }
}

/// One entry of the provider's `values` array, before numeric parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBar {
    pub datetime: String,
    pub open: NumericField,
    pub high: NumericField,
    pub low: NumericField,
    pub close: NumericField,
    /// Some instruments (FX, indices) are served without volume.
    #[serde(default)]
    pub volume: Option<NumericField>,
}

impl TryFrom<RawBar> for Bar {
    type Error = IndicatorError;

    fn try_from(raw: RawBar) -> Result<Self> {
        let ts = raw.datetime.as_str();
        let volume = match &raw.volume {
            Some(v) => v.parse(ts, "volume")?,
            None => 0.0,
        };
        if volume < 0.0 {
            return Err(IndicatorError::malformed_bar(
                ts,
                "volume",
                volume.to_string(),
            ));
        }
        Ok(Bar {
            open: raw.open.parse(ts, "open")?,
            high: raw.high.parse(ts, "high")?,
            low: raw.low.parse(ts, "low")?,
            close: raw.close.parse(ts, "close")?,
            volume,
            timestamp: raw.datetime,
        })
    }
}
