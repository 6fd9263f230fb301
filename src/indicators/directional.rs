// =============================================================================
// Directional Movement: +DM / -DM / +DI / -DI / DX / ADX / ADXR
// =============================================================================
//
// Scalar building blocks:
//   +DM = currentHigh - previousHigh
//   -DM = previousLow - currentLow
//   +DI = (+DM / TR) * 100
//   -DI = (-DM / TR) * 100
//   DX  = (|+DI - -DI| / |+DI + -DI|) * 100
//
// Series pipeline (per bar-to-bar transition):
//   1. Raw moves; only the larger positive move counts as directional
//      movement, the other side is 0.
//   2. Wilder running sums of +DM, -DM and TR over `period` transitions.
//   3. +DI / -DI from the smoothed sums, DX from the two DIs.
//   4. ADX  = EMA(DX, period)
//      ADXR = (ADX_t + ADX_{t-period}) / 2
// =============================================================================

use crate::error::{ensure_period, lookback, IndicatorError, Result};
use crate::indicators::moving_average::ema;
use crate::indicators::true_range::true_range_value;
use crate::market_data::{Bar, BarSeries, DerivedSeries};

/// `+DM = currentHigh - previousHigh`.
pub fn positive_directional_movement(current_high: f64, previous_high: f64) -> f64 {
    current_high - previous_high
}

/// `-DM = previousLow - currentLow`.
pub fn negative_directional_movement(current_low: f64, previous_low: f64) -> f64 {
    previous_low - current_low
}

/// `+DI = (+DM / TR) * 100`.
pub fn positive_directional_indicator(positive_dm: f64, true_range: f64) -> Result<f64> {
    if true_range == 0.0 {
        return Err(IndicatorError::division_by_zero("+DI (true range is zero)"));
    }
    Ok(positive_dm / true_range * 100.0)
}

/// `-DI = (-DM / TR) * 100`.
pub fn negative_directional_indicator(negative_dm: f64, true_range: f64) -> Result<f64> {
    if true_range == 0.0 {
        return Err(IndicatorError::division_by_zero("-DI (true range is zero)"));
    }
    Ok(negative_dm / true_range * 100.0)
}

/// `DX = (|+DI - -DI| / |+DI + -DI|) * 100`.
pub fn directional_movement_index(positive_di: f64, negative_di: f64) -> Result<f64> {
    let sum = (positive_di + negative_di).abs();
    if sum == 0.0 {
        return Err(IndicatorError::division_by_zero("DX (+DI + -DI is zero)"));
    }
    Ok((positive_di - negative_di).abs() / sum * 100.0)
}

// =============================================================================
// Series
// =============================================================================

/// Bars needed for `amount` DX values.
pub fn dx_lookback(amount: usize, period: usize) -> Result<usize> {
    lookback(amount, period)
}

/// Bars needed for `amount` ADX values.
pub fn adx_lookback(amount: usize, period: usize) -> Result<usize> {
    lookback(dx_lookback(amount, period)?, period.saturating_sub(1))
}

/// Bars needed for `amount` ADXR values.
pub fn adxr_lookback(amount: usize, period: usize) -> Result<usize> {
    lookback(adx_lookback(amount, period)?, period)
}

/// DX for every transition once `period` transitions have been summed.
///
/// `bars` is chronological; the result has `bars.len() - period` values, the
/// first one belonging to `bars[period]`.
fn dx_values(bars: &[&Bar], period: usize) -> Result<Vec<f64>> {
    let transitions = bars.len().saturating_sub(1);
    if transitions < period {
        return Err(IndicatorError::insufficient_data(
            "DX",
            period + 1,
            bars.len(),
        ));
    }

    let mut plus_dm = Vec::with_capacity(transitions);
    let mut minus_dm = Vec::with_capacity(transitions);
    let mut tr_vals = Vec::with_capacity(transitions);

    for pair in bars.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let up_move = positive_directional_movement(cur.high, prev.high);
        let down_move = negative_directional_movement(cur.low, prev.low);

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        tr_vals.push(true_range_value(cur.high, cur.low, prev.close));
    }

    let period_f = period as f64;
    let mut smooth_plus: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr_vals[..period].iter().sum();

    let mut result = Vec::with_capacity(transitions - period + 1);
    result.push(smoothed_dx(smooth_plus, smooth_minus, smooth_tr)?);

    for i in period..transitions {
        smooth_plus = smooth_plus - smooth_plus / period_f + plus_dm[i];
        smooth_minus = smooth_minus - smooth_minus / period_f + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr_vals[i];
        result.push(smoothed_dx(smooth_plus, smooth_minus, smooth_tr)?);
    }
    Ok(result)
}

/// DX from Wilder sums. A window with no directional movement at all has
/// DX 0 rather than an undefined ratio.
fn smoothed_dx(smooth_plus: f64, smooth_minus: f64, smooth_tr: f64) -> Result<f64> {
    let plus_di = positive_directional_indicator(smooth_plus, smooth_tr)?;
    let minus_di = negative_directional_indicator(smooth_minus, smooth_tr)?;
    if plus_di + minus_di == 0.0 {
        return Ok(0.0);
    }
    directional_movement_index(plus_di, minus_di)
}

/// Directional Movement Index for the newest `amount` bars.
pub fn dx(series: &BarSeries, amount: usize, period: usize) -> Result<DerivedSeries> {
    ensure_period("DX period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(dx_lookback(amount, period)?)?;
    let values = dx_values(&window, period)?;
    Ok(DerivedSeries::zip_bars(&window[period..], values))
}

/// Average Directional Index: `EMA(DX, period)` for the newest `amount` bars.
pub fn adx(series: &BarSeries, amount: usize, period: usize) -> Result<DerivedSeries> {
    ensure_period("ADX period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let n = adx_lookback(amount, period)?;
    let window = series.window_chronological(n)?;
    let adx = ema(&dx_values(&window, period)?, period)?;
    Ok(DerivedSeries::zip_bars(&window[n - adx.len()..], adx))
}

/// ADX Rating: the mean of the current ADX and the ADX `period` bars earlier.
pub fn adxr(series: &BarSeries, amount: usize, period: usize) -> Result<DerivedSeries> {
    ensure_period("ADXR period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let n = adxr_lookback(amount, period)?;
    let window = series.window_chronological(n)?;
    let adx = ema(&dx_values(&window, period)?, period)?;

    // adx.len() == amount + period
    let values: Vec<f64> = (0..amount)
        .map(|j| (adx[j + period] + adx[j]) / 2.0)
        .collect();
    Ok(DerivedSeries::zip_bars(&window[n - amount..], values))
}
