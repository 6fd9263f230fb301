// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band is a moving average of the chosen field; upper and lower bands
// sit `k` population standard deviations of the same window above and below.
//
//   upper  = MA + k * σ
//   middle = MA
//   lower  = MA - k * σ

use serde::{Deserialize, Serialize};

use crate::error::{ensure_period, lookback, IndicatorError, Result};
use crate::indicators::moving_average::moving_average;
use crate::indicators::{column, stamp_newest};
use crate::market_data::{BarSeries, DerivedSeries};
use crate::types::{BarField, MaType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandPoint {
    /// Band width normalised by the middle band, in percent.
    pub fn width(&self) -> Option<f64> {
        if self.middle == 0.0 {
            return None;
        }
        Some((self.upper - self.lower) / self.middle * 100.0)
    }
}

pub fn validate_bollinger(period: usize, deviations: f64) -> Result<()> {
    ensure_period("BBANDS period", period)?;
    if !deviations.is_finite() || deviations < 0.0 {
        return Err(IndicatorError::invalid_argument(format!(
            "BBANDS deviation multiplier must be a non-negative number, got {deviations}"
        )));
    }
    Ok(())
}

/// Bollinger Bands for the newest `amount` bars.  Reads
/// `amount + period - 1` bars.
pub fn bollinger_bands(
    series: &BarSeries,
    amount: usize,
    period: usize,
    ma_type: MaType,
    deviations: f64,
    field: BarField,
) -> Result<DerivedSeries<BandPoint>> {
    validate_bollinger(period, deviations)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(amount, period - 1)?)?;
    let values = column(&window, field);
    let middles = moving_average(&values, ma_type, period)?;

    let period_f = period as f64;
    let out = values
        .windows(period)
        .zip(middles)
        .map(|(span, middle)| {
            let mean = span.iter().sum::<f64>() / period_f;
            let variance = span.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period_f;
            let spread = deviations * variance.sqrt();
            BandPoint {
                upper: middle + spread,
                middle,
                lower: middle - spread,
            }
        })
        .collect();
    Ok(stamp_newest(&window, out))
}
