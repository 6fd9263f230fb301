// =============================================================================
// True Range & Average True Range (ATR): Wilder's Smoothing Method
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
// where prevClose is the close of the next *older* bar (index + 1 in a
// newest-first series).  A window of N true ranges therefore needs N + 1 bars.
//
// ATR is the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
// =============================================================================

use crate::error::{ensure_period, lookback, IndicatorError, Result};
use crate::market_data::{BarSeries, DerivedSeries, Point};

/// True Range of one bar given the previous bar's close.
pub fn true_range_value(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// True Range for the newest `interval_amount` bars, oldest-to-newest.
pub fn true_range(series: &BarSeries, interval_amount: usize) -> Result<Vec<f64>> {
    Ok(true_range_series(series, interval_amount)?.values())
}

/// True Range for the newest `interval_amount` bars, stamped with each bar's
/// timestamp.
pub fn true_range_series(series: &BarSeries, interval_amount: usize) -> Result<DerivedSeries> {
    let required = lookback(interval_amount, 1)?;
    if series.len() < required {
        return Err(IndicatorError::insufficient_data(
            "true range (one extra bar for the previous close)",
            required,
            series.len(),
        ));
    }

    let bars = series.bars();
    let points = (0..interval_amount)
        .rev()
        .map(|i| Point {
            timestamp: bars[i].timestamp.clone(),
            value: true_range_value(bars[i].high, bars[i].low, bars[i + 1].close),
        })
        .collect();
    Ok(DerivedSeries::from_points(points))
}

/// Wilder-smoothed average of a chronological slice, seeded with the SMA of
/// the first `period` values. Returns `values.len() - period + 1` averages.
pub(crate) fn wilder_average(values: &[f64], period: usize) -> Result<Vec<f64>> {
    ensure_period("Wilder period", period)?;
    if values.len() < period {
        return Err(IndicatorError::insufficient_data(
            "Wilder smoothing",
            period,
            values.len(),
        ));
    }

    let period_f = period as f64;
    let seed = values[..period].iter().sum::<f64>() / period_f;

    let mut result = Vec::with_capacity(values.len() - period + 1);
    result.push(seed);
    let mut avg = seed;
    for &v in &values[period..] {
        avg = (avg * (period_f - 1.0) + v) / period_f;
        result.push(avg);
    }
    Ok(result)
}

/// Average True Range for the newest `interval_amount` bars.
///
/// Needs `interval_amount + period` bars: `period - 1` true ranges of warm-up
/// plus one extra bar for the oldest previous close.
pub fn average_true_range(
    series: &BarSeries,
    interval_amount: usize,
    period: usize,
) -> Result<DerivedSeries> {
    ensure_period("ATR period", period)?;
    if interval_amount == 0 {
        return Ok(DerivedSeries::default());
    }

    let tr = true_range_series(series, lookback(interval_amount, period - 1)?)?;
    let atr = wilder_average(&tr.values(), period)?;

    let points = tr.points()[period - 1..]
        .iter()
        .zip(atr)
        .map(|(p, value)| Point {
            timestamp: p.timestamp.clone(),
            value,
        })
        .collect();
    Ok(DerivedSeries::from_points(points))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Bar;

    /// Build a test bar with the given OHLC values.
    fn bar(ts: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(ts, open, high, low, close, 100.0)
    }

    fn chronological(bars: Vec<Bar>) -> BarSeries {
        BarSeries::from_chronological("TEST", "1day", bars)
    }

    #[test]
    fn true_range_uses_prev_close() {
        // Gap scenario: |H - prevClose| > H - L
        let s = chronological(vec![
            bar("t1", 100.0, 105.0, 95.0, 95.0),
            bar("t2", 110.0, 115.0, 108.0, 112.0),
            bar("t3", 112.0, 118.0, 110.0, 115.0),
        ]);
        let tr = true_range(&s, 2).unwrap();
        // t2: max(7, |115-95|=20, |108-95|=13) = 20; t3: max(8, 6, 2) = 8
        assert_eq!(tr, vec![20.0, 8.0]);
        assert_eq!(true_range_series(&s, 2).unwrap().timestamps(), vec!["t2", "t3"]);
    }

    #[test]
    fn true_range_gap_down_uses_low() {
        assert_eq!(true_range_value(90.0, 85.0, 100.0), 15.0);
    }

    #[test]
    fn true_range_needs_one_extra_bar() {
        let s = chronological(vec![
            bar("t1", 1.0, 2.0, 0.5, 1.5),
            bar("t2", 1.5, 2.5, 1.0, 2.0),
        ]);
        assert!(true_range(&s, 1).is_ok());
        assert!(matches!(
            true_range(&s, 2),
            Err(IndicatorError::InsufficientData { required: 3, available: 2, .. })
        ));
    }

    #[test]
    fn atr_constant_range_converges() {
        let bars = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(&format!("t{i:02}"), base, base + 5.0, base - 5.0, base)
            })
            .collect();
        let atr = average_true_range(&chronological(bars), 5, 14).unwrap();
        assert_eq!(atr.len(), 5);
        for v in atr.values() {
            assert!((v - 10.0).abs() < 0.5, "expected ATR near 10.0, got {v}");
        }
        assert_eq!(atr.last().unwrap().timestamp, "t29");
    }

    #[test]
    fn atr_exact_minimum_data() {
        // amount 2, period 3 => 5 bars.
        let bars: Vec<Bar> = vec![
            bar("t1", 100.0, 102.0, 98.0, 101.0),
            bar("t2", 101.0, 104.0, 99.0, 103.0),
            bar("t3", 103.0, 106.0, 100.0, 105.0),
            bar("t4", 105.0, 108.0, 102.0, 107.0),
            bar("t5", 107.0, 109.0, 104.0, 105.0),
        ];
        let s = chronological(bars);
        let atr = average_true_range(&s, 2, 3).unwrap();
        // TR (t2..t5) = 5, 6, 6, 5 ; seed = 17/3 ; next = (17/3 * 2 + 5) / 3
        let seed = 17.0 / 3.0;
        let next = (seed * 2.0 + 5.0) / 3.0;
        let values = atr.values();
        assert!((values[0] - seed).abs() < 1e-9);
        assert!((values[1] - next).abs() < 1e-9);

        assert!(average_true_range(&s, 3, 3).is_err());
        assert!(average_true_range(&s, 2, 0).is_err());
    }
}
