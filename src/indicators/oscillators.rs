// =============================================================================
// Oscillators: APO, MACD, AROON, CMO, ROC, CCI
// =============================================================================
//
//   APO   = MA(short) - MA(long)
//   MACD  = EMA(fast) - EMA(slow);  signal = EMA(MACD, signal);
//           histogram = MACD - signal
//   AROON up   = (period - bars since period-high) / period * 100
//         down = (period - bars since period-low)  / period * 100
//         osc  = up - down
//   CMO   = (sum gains - sum losses) / (sum gains + sum losses) * 100
//   ROC   = (price - price_n) / price_n * 100
//   CCI   = (TP - SMA(TP)) / (0.015 * mean deviation),  TP = (H + L + C) / 3
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{ensure_period, lookback, IndicatorError, Result};
use crate::indicators::moving_average::{ema, moving_average};
use crate::indicators::{column, stamp_newest, tail};
use crate::market_data::{BarSeries, DerivedSeries};
use crate::types::{BarField, MaType};

fn ordered_periods(name: &str, short: usize, long: usize) -> Result<()> {
    ensure_period(&format!("{name} short period"), short)?;
    if long < short {
        return Err(IndicatorError::invalid_argument(format!(
            "{name} long period {long} is shorter than short period {short}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// APO
// ---------------------------------------------------------------------------

/// Bars needed for `amount` APO values.
pub fn apo_lookback(amount: usize, long: usize) -> Result<usize> {
    lookback(amount, long.saturating_sub(1))
}

pub fn validate_apo(short: usize, long: usize) -> Result<()> {
    ordered_periods("APO", short, long)
}

/// Absolute Price Oscillator for the newest `amount` bars.
pub fn apo(
    series: &BarSeries,
    amount: usize,
    ma_type: MaType,
    short: usize,
    long: usize,
    field: BarField,
) -> Result<DerivedSeries> {
    validate_apo(short, long)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(apo_lookback(amount, long)?)?;
    let values = column(&window, field);
    let fast = moving_average(&values, ma_type, short)?;
    let slow = moving_average(&values, ma_type, long)?;

    let out = tail(&fast, amount)
        .iter()
        .zip(tail(&slow, amount))
        .map(|(f, s)| f - s)
        .collect();
    Ok(stamp_newest(&window, out))
}

// ---------------------------------------------------------------------------
// MACD
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Bars needed for `amount` MACD values.
pub fn macd_lookback(amount: usize, slow: usize, signal: usize) -> Result<usize> {
    lookback(lookback(amount, slow.saturating_sub(1))?, signal.saturating_sub(1))
}

pub fn validate_macd(fast: usize, slow: usize, signal: usize) -> Result<()> {
    ordered_periods("MACD", fast, slow)?;
    ensure_period("MACD signal period", signal)
}

/// MACD line, signal line and histogram for the newest `amount` bars.
pub fn macd(
    series: &BarSeries,
    amount: usize,
    fast: usize,
    slow: usize,
    signal: usize,
    field: BarField,
) -> Result<DerivedSeries<MacdPoint>> {
    validate_macd(fast, slow, signal)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(macd_lookback(amount, slow, signal)?)?;
    let values = column(&window, field);

    let slow_ema = ema(&values, slow)?;
    let fast_ema = ema(&values, fast)?;
    let line: Vec<f64> = tail(&fast_ema, slow_ema.len())
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&line, signal)?;

    let out = tail(&line, amount)
        .iter()
        .zip(tail(&signal_line, amount))
        .map(|(&macd, &signal)| MacdPoint {
            macd,
            signal,
            histogram: macd - signal,
        })
        .collect();
    Ok(stamp_newest(&window, out))
}

// ---------------------------------------------------------------------------
// AROON
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AroonPoint {
    pub up: f64,
    pub down: f64,
    pub oscillator: f64,
}

/// Aroon up/down/oscillator for the newest `amount` bars.
///
/// Each value looks back over `period + 1` bars (the current bar and the
/// `period` before it).  On ties the most recent extreme wins.
pub fn aroon(series: &BarSeries, amount: usize, period: usize) -> Result<DerivedSeries<AroonPoint>> {
    ensure_period("AROON period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(amount, period)?)?;
    let period_f = period as f64;

    let out = (period..window.len())
        .map(|idx| {
            let span = &window[idx - period..=idx];
            let (mut hi, mut lo) = (0, 0);
            for (j, bar) in span.iter().enumerate() {
                if bar.high >= span[hi].high {
                    hi = j;
                }
                if bar.low <= span[lo].low {
                    lo = j;
                }
            }
            let up = (period_f - (period - hi) as f64) / period_f * 100.0;
            let down = (period_f - (period - lo) as f64) / period_f * 100.0;
            AroonPoint {
                up,
                down,
                oscillator: up - down,
            }
        })
        .collect();
    Ok(stamp_newest(&window, out))
}

// ---------------------------------------------------------------------------
// CMO
// ---------------------------------------------------------------------------

/// Chande Momentum Oscillator for the newest `amount` bars.
///
/// Reads `amount + period` bars; a window without any price change has no
/// defined value.
pub fn cmo(series: &BarSeries, amount: usize, period: usize, field: BarField) -> Result<DerivedSeries> {
    ensure_period("CMO period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(amount, period)?)?;
    let deltas: Vec<f64> = column(&window, field).windows(2).map(|w| w[1] - w[0]).collect();

    let mut out = Vec::with_capacity(amount);
    for (k, span) in deltas.windows(period).enumerate() {
        let (gains, losses) = span.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
        let total = gains + losses;
        if total == 0.0 {
            return Err(IndicatorError::division_by_zero(format!(
                "CMO at {} (no price movement over {period} bars)",
                window[k + period].timestamp
            )));
        }
        out.push((gains - losses) / total * 100.0);
    }
    Ok(stamp_newest(&window, out))
}

// ---------------------------------------------------------------------------
// ROC
// ---------------------------------------------------------------------------

/// Rate of Change in percent for the newest `amount` bars.
pub fn roc(series: &BarSeries, amount: usize, period: usize, field: BarField) -> Result<DerivedSeries> {
    ensure_period("ROC period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(amount, period)?)?;
    let values = column(&window, field);

    let mut out = Vec::with_capacity(amount);
    for i in period..values.len() {
        let prev = values[i - period];
        if prev == 0.0 {
            return Err(IndicatorError::division_by_zero(format!(
                "ROC at {} (reference {field} is zero)",
                window[i].timestamp
            )));
        }
        out.push((values[i] - prev) / prev * 100.0);
    }
    Ok(stamp_newest(&window, out))
}

// ---------------------------------------------------------------------------
// CCI
// ---------------------------------------------------------------------------

const CCI_CONSTANT: f64 = 0.015;

/// Commodity Channel Index for the newest `amount` bars.
pub fn cci(series: &BarSeries, amount: usize, period: usize) -> Result<DerivedSeries> {
    ensure_period("CCI period", period)?;
    if amount == 0 {
        return Ok(DerivedSeries::default());
    }
    let window = series.window_chronological(lookback(amount, period - 1)?)?;
    let typical: Vec<f64> = window
        .iter()
        .map(|b| (b.high + b.low + b.close) / 3.0)
        .collect();

    let period_f = period as f64;
    let mut out = Vec::with_capacity(amount);
    for (k, span) in typical.windows(period).enumerate() {
        let mean = span.iter().sum::<f64>() / period_f;
        let mean_dev = span.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period_f;
        if mean_dev == 0.0 {
            return Err(IndicatorError::division_by_zero(format!(
                "CCI at {} (typical price constant over {period} bars)",
                window[k + period - 1].timestamp
            )));
        }
        let current = span[period - 1];
        out.push((current - mean) / (CCI_CONSTANT * mean_dev));
    }
    Ok(stamp_newest(&window, out))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;

    fn series_from_closes(closes: &[f64]) -> BarSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(format!("t{i:02}"), c, c + 1.0, c - 1.0, c, 100.0))
            .collect();
        BarSeries::from_chronological("TEST", "1day", bars)
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.4).sin() * 8.0 + i as f64 * 0.1).collect()
    }

    // ---- apo ---------------------------------------------------------------

    #[test]
    fn apo_matches_manual_difference() {
        let closes = wave(40);
        let s = series_from_closes(&closes);
        let out = apo(&s, 4, MaType::Ema, 3, 8, BarField::Close).unwrap();
        assert_eq!(out.len(), 4);

        let window = &closes[closes.len() - apo_lookback(4, 8).unwrap()..];
        let fast = ema(window, 3).unwrap();
        let slow = ema(window, 8).unwrap();
        let expected = fast.last().unwrap() - slow.last().unwrap();
        assert!((out.last().unwrap().value - expected).abs() < 1e-9);
        assert_eq!(out.last().unwrap().timestamp, "t39");
    }

    #[test]
    fn apo_rejects_inverted_periods() {
        let s = series_from_closes(&wave(40));
        assert!(matches!(
            apo(&s, 4, MaType::Sma, 26, 12, BarField::Close),
            Err(IndicatorError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn apo_positive_in_uptrend() {
        let closes: Vec<f64> = (0..50).map(|i| 10.0 + i as f64).collect();
        let out = apo(&series_from_closes(&closes), 5, MaType::Sma, 3, 10, BarField::Close).unwrap();
        // SMA lag is (p - 1) / 2 on a unit-slope line: 4.5 - 1.0 = 3.5
        for v in out.values() {
            assert!((v - 3.5).abs() < 1e-9);
        }
    }

    // ---- macd --------------------------------------------------------------

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let s = series_from_closes(&wave(80));
        let out = macd(&s, 10, 12, 26, 9, BarField::Close).unwrap();
        assert_eq!(out.len(), 10);
        for p in out.points() {
            let m = p.value;
            assert!((m.histogram - (m.macd - m.signal)).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_exact_lookback() {
        let n = macd_lookback(3, 6, 4).unwrap();
        let s = series_from_closes(&wave(n));
        assert_eq!(macd(&s, 3, 3, 6, 4, BarField::Close).unwrap().len(), 3);
        assert!(macd(&s, 4, 3, 6, 4, BarField::Close).is_err());
        assert!(matches!(
            macd(&s, 3, 3, 6, 0, BarField::Close),
            Err(IndicatorError::InvalidArgument { .. })
        ));
    }

    // ---- aroon -------------------------------------------------------------

    #[test]
    fn aroon_in_steady_uptrend() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let out = aroon(&series_from_closes(&closes), 5, 14).unwrap();
        for p in out.points() {
            assert_eq!(p.value.up, 100.0);
            assert_eq!(p.value.down, 0.0);
            assert_eq!(p.value.oscillator, 100.0);
        }
    }

    #[test]
    fn aroon_counts_bars_since_extreme() {
        // High at 3 bars ago, low at 1 bar ago, period 4 (window of 5 bars).
        let closes = [5.0, 6.0, 9.0, 7.0, 2.0, 4.0];
        let out = aroon(&series_from_closes(&closes), 1, 4).unwrap();
        let p = out.last().unwrap().value;
        assert!((p.up - 25.0).abs() < 1e-9);
        assert!((p.down - 75.0).abs() < 1e-9);
        assert!((p.oscillator + 50.0).abs() < 1e-9);
    }

    // ---- cmo ---------------------------------------------------------------

    #[test]
    fn cmo_known_value() {
        // deltas: +2, -1, +3  => (5 - 1) / 6 * 100
        let s = series_from_closes(&[10.0, 12.0, 11.0, 14.0]);
        let out = cmo(&s, 1, 3, BarField::Close).unwrap();
        assert!((out.last().unwrap().value - 400.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn cmo_flat_is_division_by_zero() {
        let s = series_from_closes(&[10.0; 8]);
        assert!(matches!(
            cmo(&s, 2, 3, BarField::Close),
            Err(IndicatorError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn cmo_is_bounded() {
        let s = series_from_closes(&wave(60));
        for v in cmo(&s, 30, 14, BarField::Close).unwrap().values() {
            assert!((-100.0..=100.0).contains(&v));
        }
    }

    // ---- roc ---------------------------------------------------------------

    #[test]
    fn roc_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let out = roc(&series_from_closes(&closes), 6, 14, BarField::Close).unwrap();
        // From 1 to 15: (15 - 1) / 1 * 100
        assert!((out.first().unwrap().value - 1400.0).abs() < 1e-10);
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn roc_zero_reference_is_division_by_zero() {
        let s = series_from_closes(&[0.0, 1.0, 2.0]);
        assert!(matches!(
            roc(&s, 2, 1, BarField::Close),
            Err(IndicatorError::DivisionByZero { .. })
        ));
    }

    // ---- cci ---------------------------------------------------------------

    #[test]
    fn cci_known_value() {
        // TP equals close here (H and L symmetric).  Window [1, 2, 3]:
        // mean 2, mean deviation 2/3, CCI = (3 - 2) / (0.015 * 2/3) = 100.
        let s = series_from_closes(&[1.0, 2.0, 3.0]);
        let out = cci(&s, 1, 3).unwrap();
        assert!((out.last().unwrap().value - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cci_constant_price_is_division_by_zero() {
        let s = series_from_closes(&[5.0; 6]);
        assert!(matches!(
            cci(&s, 2, 3),
            Err(IndicatorError::DivisionByZero { .. })
        ));
    }
}
