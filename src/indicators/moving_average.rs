// =============================================================================
// Moving Averages (SMA / EMA / WMA)
// =============================================================================
//
// All three primitives take a chronological slice (oldest first) and return a
// chronological vector of `values.len() - period + 1` averages; element `j`
// covers the window ending at `values[j + period - 1]`.
//
// SMA:  sliding sum, updated in O(1) per step.
// EMA:  multiplier = 2 / (period + 1)
//       seed       = SMA of the oldest `period` values
//       EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
// WMA:  linear weights 1..=period, newest value weighted `period`.
// =============================================================================

use crate::error::{ensure_period, lookback, IndicatorError, Result};
use crate::indicators::{column, stamp_newest, tail};
use crate::market_data::{BarSeries, DerivedSeries};
use crate::types::{BarField, MaType};

fn check_window(name: &str, values: &[f64], period: usize) -> Result<()> {
    ensure_period(&format!("{name} period"), period)?;
    if values.len() < period {
        return Err(IndicatorError::invalid_argument(format!(
            "{name} period {period} exceeds series length {}",
            values.len()
        )));
    }
    Ok(())
}

/// Simple moving average over `period` values.
pub fn sma(values: &[f64], period: usize) -> Result<Vec<f64>> {
    check_window("SMA", values, period)?;

    let period_f = period as f64;
    let mut sum: f64 = values[..period].iter().sum();
    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(sum / period_f);

    for i in period..values.len() {
        sum = sum - values[i - period] + values[i];
        result.push(sum / period_f);
    }
    Ok(result)
}

/// Exponential moving average seeded with the SMA of the oldest `period`
/// values.
pub fn ema(values: &[f64], period: usize) -> Result<Vec<f64>> {
    check_window("EMA", values, period)?;

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(seed);

    let mut prev = seed;
    for &value in &values[period..] {
        let next = value * k + prev * (1.0 - k);
        result.push(next);
        prev = next;
    }
    Ok(result)
}

/// Linearly weighted moving average.
pub fn wma(values: &[f64], period: usize) -> Result<Vec<f64>> {
    check_window("WMA", values, period)?;

    let period_f = period as f64;
    let denominator = period_f * (period_f + 1.0) / 2.0;

    let mut numerator: f64 = values[..period]
        .iter()
        .enumerate()
        .map(|(j, v)| (j + 1) as f64 * v)
        .sum();
    let mut total: f64 = values[..period].iter().sum();

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(numerator / denominator);

    for i in period..values.len() {
        // Every weight in the window drops by one, the entering value gets
        // the top weight.
        numerator = numerator - total + period_f * values[i];
        total = total - values[i - period] + values[i];
        result.push(numerator / denominator);
    }
    Ok(result)
}

/// Dispatch on the moving-average type. `MaType::Ma` is a simple average.
pub fn moving_average(values: &[f64], ma_type: MaType, period: usize) -> Result<Vec<f64>> {
    match ma_type {
        MaType::Sma | MaType::Ma => sma(values, period),
        MaType::Ema => ema(values, period),
        MaType::Wma => wma(values, period),
    }
}

// =============================================================================
// Series-level averages
// =============================================================================

/// Moving average of one bar field for the newest `amount` bars.
///
/// Reads `amount + period - 1` bars.
pub fn moving_average_series(
    series: &BarSeries,
    amount: usize,
    ma_type: MaType,
    period: usize,
    field: BarField,
) -> Result<DerivedSeries> {
    ensure_period(&format!("{ma_type} period"), period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(amount, period - 1)?)?;
    let averages = moving_average(&column(&window, field), ma_type, period)?;
    Ok(stamp_newest(&window, averages))
}

/// Double exponential moving average: `2 * EMA - EMA(EMA)`.
///
/// Reads `amount + 2 * period - 2` bars.
pub fn dema(series: &BarSeries, amount: usize, period: usize, field: BarField) -> Result<DerivedSeries> {
    ensure_period("DEMA period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(lookback(amount, period - 1)?, period - 1)?)?;
    let first = ema(&column(&window, field), period)?;
    let second = ema(&first, period)?;

    let values = tail(&first, amount)
        .iter()
        .zip(tail(&second, amount))
        .map(|(e1, e2)| 2.0 * e1 - e2)
        .collect();
    Ok(stamp_newest(&window, values))
}
