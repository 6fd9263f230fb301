// =============================================================================
// Price transforms: AVGPRICE, HLC3, BOP
// =============================================================================

use crate::error::{IndicatorError, Result};
use crate::indicators::stamp_newest;
use crate::market_data::{Bar, BarSeries, DerivedSeries};

fn per_bar<F>(series: &BarSeries, amount: usize, f: F) -> Result<DerivedSeries>
where
    F: Fn(&Bar) -> Result<f64>,
{
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(amount)?;
    let values = window.iter().map(|b| f(b)).collect::<Result<Vec<_>>>()?;
    Ok(stamp_newest(&window, values))
}

/// `(open + high + low + close) / 4`
pub fn avgprice(series: &BarSeries, amount: usize) -> Result<DerivedSeries> {
    per_bar(series, amount, |b| Ok((b.open + b.high + b.low + b.close) / 4.0))
}

/// Typical price, `(high + low + close) / 3`.
pub fn hlc3(series: &BarSeries, amount: usize) -> Result<DerivedSeries> {
    per_bar(series, amount, |b| Ok((b.high + b.low + b.close) / 3.0))
}

/// Balance of Power, `(close - open) / (high - low)`.
pub fn bop(series: &BarSeries, amount: usize) -> Result<DerivedSeries> {
    per_bar(series, amount, |b| {
        let range = b.range();
        if range == 0.0 {
            return Err(IndicatorError::division_by_zero(format!(
                "BOP at {} (high equals low)",
                b.timestamp
            )));
        }
        Ok((b.close - b.open) / range)
    })
}
