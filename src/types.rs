// =============================================================================
// Shared parameter types used across the indicator engine
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;

/// Which numeric column of a bar an indicator reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
}

impl std::fmt::Display for BarField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
            Self::Close => write!(f, "close"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

impl FromStr for BarField {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "volume" => Ok(Self::Volume),
            other => Err(IndicatorError::invalid_argument(format!(
                "unknown bar field `{other}` (expected open, high, low, close or volume)"
            ))),
        }
    }
}

/// Moving-average flavour for indicators that let the caller choose.
///
/// `Ma` is the provider's generic "moving average" token and is computed as a
/// simple moving average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
    Wma,
    Ma,
}

impl std::fmt::Display for MaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sma => write!(f, "SMA"),
            Self::Ema => write!(f, "EMA"),
            Self::Wma => write!(f, "WMA"),
            Self::Ma => write!(f, "MA"),
        }
    }
}

impl FromStr for MaType {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SMA" => Ok(Self::Sma),
            "EMA" => Ok(Self::Ema),
            "WMA" => Ok(Self::Wma),
            "MA" => Ok(Self::Ma),
            other => Err(IndicatorError::invalid_argument(format!(
                "unknown moving average type `{other}` (expected SMA, EMA, WMA or MA)"
            ))),
        }
    }
}
