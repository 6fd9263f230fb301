// =============================================================================
// Chaikin Money Flow family: MFM, MFV, A/D line, A/D oscillator
// =============================================================================
//
//   MFM  = ((close - low) - (high - close)) / (high - low)
//   MFV  = MFM * volume
//   AD_k = AD_{k-1} + MFV_k                  (running sum, oldest bar first)
//   ADOSC = EMA(AD, short) - EMA(AD, long)
//
// A flat bar (high == low) has no defined buying/selling pressure and is
// reported as a division-by-zero error.
// =============================================================================

use crate::error::{ensure_period, lookback, IndicatorError, Result};
use crate::indicators::moving_average::ema;
use crate::market_data::{Bar, BarSeries, DerivedSeries, Point};

/// Money Flow Multiplier of a single bar, in `[-1, 1]` for well-formed bars.
pub fn money_flow_multiplier(bar: &Bar) -> Result<f64> {
    let range = bar.range();
    if range == 0.0 {
        return Err(IndicatorError::division_by_zero(format!(
            "money flow multiplier at {} (high == low == {})",
            bar.timestamp, bar.high
        )));
    }
    Ok(((bar.close - bar.low) - (bar.high - bar.close)) / range)
}

/// Money Flow Volume of a single bar.
pub fn money_flow_volume(bar: &Bar) -> Result<f64> {
    Ok(money_flow_multiplier(bar)? * bar.volume)
}

/// Chaikin Accumulation/Distribution line over the newest `interval_amount`
/// bars, oldest-to-newest.
pub fn chaikin_ad(series: &BarSeries, interval_amount: usize) -> Result<DerivedSeries> {
    if interval_amount > series.len() {
        return Err(IndicatorError::invalid_argument(format!(
            "ChaikinAD interval amount {interval_amount} exceeds {} available bars",
            series.len()
        )));
    }

    let mut points = Vec::with_capacity(interval_amount);
    let mut ad = 0.0;
    // Walk from the oldest requested bar toward index 0.
    for bar in series.bars()[..interval_amount].iter().rev() {
        ad += money_flow_volume(bar)?;
        points.push(Point {
            timestamp: bar.timestamp.clone(),
            value: ad,
        });
    }
    Ok(DerivedSeries::from_points(points))
}

/// Check ADOSC parameters. Runs before any data is requested.
pub fn validate_adosc(short_period: usize, long_period: usize) -> Result<()> {
    ensure_period("ADOSC short period", short_period)?;
    if long_period < short_period {
        return Err(IndicatorError::invalid_argument(format!(
            "ADOSC long period {long_period} is shorter than short period {short_period}"
        )));
    }
    Ok(())
}

/// Chaikin A/D Oscillator for the newest `interval_amount` bars.
///
/// The A/D line is computed over `interval_amount + long_period` bars so the
/// long EMA is warmed up before the first reported value.
pub fn adosc(
    series: &BarSeries,
    interval_amount: usize,
    short_period: usize,
    long_period: usize,
) -> Result<DerivedSeries> {
    validate_adosc(short_period, long_period)?;

    let ad_line = chaikin_ad(series, lookback(interval_amount, long_period)?)?;
    let ad_values = ad_line.values();

    let short_ema = ema(&ad_values, short_period)?;
    let long_ema = ema(&ad_values, long_period)?;

    for (name, len) in [("ADOSC short EMA", short_ema.len()), ("ADOSC long EMA", long_ema.len())] {
        if len < interval_amount {
            return Err(IndicatorError::insufficient_data(name, interval_amount, len));
        }
    }

    // All three sequences end at the newest bar; align on that end.
    let points = ad_line.points();
    let s0 = short_ema.len() - interval_amount;
    let l0 = long_ema.len() - interval_amount;
    let p0 = points.len() - interval_amount;

    let out = (0..interval_amount)
        .map(|j| Point {
            timestamp: points[p0 + j].timestamp.clone(),
            value: short_ema[s0 + j] - long_ema[l0 + j],
        })
        .collect();
    Ok(DerivedSeries::from_points(out))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: &str, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar::new(ts, (high + low) / 2.0, high, low, close, volume)
    }

    /// Newest-first series with varied closes inside each range.
    fn series(n: usize) -> BarSeries {
        let bars = (0..n)
            .map(|i| {
                let base = 50.0 + ((n - i) as f64 * 0.9).sin() * 4.0;
                let close_pos = ((i * 37) % 10) as f64 / 10.0;
                let low = base - 1.0;
                let high = base + 1.5;
                bar(
                    &format!("t{:03}", n - i),
                    high,
                    low,
                    low + (high - low) * close_pos,
                    1_000.0 + (i * 13 % 7) as f64 * 100.0,
                )
            })
            .collect();
        BarSeries::newest_first("TEST", "1day", bars)
    }

    #[test]
    fn multiplier_and_volume_scenario() {
        let b = bar("t", 10.0, 5.0, 8.0, 100.0);
        assert!((money_flow_multiplier(&b).unwrap() - 0.2).abs() < 1e-12);
        assert!((money_flow_volume(&b).unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn flat_bar_is_division_by_zero() {
        let b = bar("t", 7.0, 7.0, 7.0, 100.0);
        assert!(matches!(
            money_flow_multiplier(&b),
            Err(IndicatorError::DivisionByZero { .. })
        ));
        assert!(money_flow_volume(&b).is_err());
    }

    #[test]
    fn multiplier_is_bounded() {
        for b in series(60).bars() {
            let m = money_flow_multiplier(b).unwrap();
            assert!((-1.0..=1.0).contains(&m), "MFM {m} out of range");
        }
        assert_eq!(money_flow_multiplier(&bar("h", 2.0, 1.0, 2.0, 1.0)).unwrap(), 1.0);
        assert_eq!(money_flow_multiplier(&bar("l", 2.0, 1.0, 1.0, 1.0)).unwrap(), -1.0);
    }

    // ---- chaikin_ad --------------------------------------------------------

    #[test]
    fn ad_steps_equal_money_flow_volume() {
        let s = series(20);
        let ad = chaikin_ad(&s, 12).unwrap();
        assert_eq!(ad.len(), 12);

        // Oldest-to-newest: point k corresponds to bar index 11 - k.
        let bars = s.bars();
        let values = ad.values();
        assert!((values[0] - money_flow_volume(&bars[11]).unwrap()).abs() < 1e-9);
        for k in 1..values.len() {
            let mfv = money_flow_volume(&bars[11 - k]).unwrap();
            assert!((values[k] - values[k - 1] - mfv).abs() < 1e-9);
        }
        assert_eq!(ad.last().unwrap().timestamp, bars[0].timestamp);
        assert_eq!(ad.first().unwrap().timestamp, bars[11].timestamp);
    }

    #[test]
    fn ad_amount_bounds() {
        let s = series(5);
        assert!(chaikin_ad(&s, 0).unwrap().is_empty());
        assert_eq!(chaikin_ad(&s, 5).unwrap().len(), 5);
        assert!(matches!(
            chaikin_ad(&s, 6),
            Err(IndicatorError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn ad_propagates_flat_bar() {
        let bars = vec![
            bar("t3", 11.0, 10.0, 10.5, 10.0),
            bar("t2", 10.0, 10.0, 10.0, 10.0),
            bar("t1", 11.0, 9.0, 10.0, 10.0),
        ];
        let s = BarSeries::newest_first("X", "1min", bars);
        assert!(matches!(
            chaikin_ad(&s, 3),
            Err(IndicatorError::DivisionByZero { .. })
        ));
        // The flat bar is outside the newest single-bar window.
        assert_eq!(chaikin_ad(&s, 1).unwrap().len(), 1);
    }

    // ---- adosc -------------------------------------------------------------

    #[test]
    fn adosc_rejects_inverted_periods() {
        let s = series(30);
        assert!(matches!(
            adosc(&s, 5, 10, 3),
            Err(IndicatorError::InvalidArgument { .. })
        ));
        assert!(matches!(
            adosc(&s, 5, 0, 3),
            Err(IndicatorError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn adosc_matches_manual_composition() {
        let s = series(40);
        let (amount, short, long) = (8, 3, 10);
        let out = adosc(&s, amount, short, long).unwrap();
        assert_eq!(out.len(), amount);

        let ad = chaikin_ad(&s, amount + long).unwrap().values();
        let se = ema(&ad, short).unwrap();
        let le = ema(&ad, long).unwrap();
        let expected_last = se.last().unwrap() - le.last().unwrap();
        assert!((out.last().unwrap().value - expected_last).abs() < 1e-9);

        // Timestamps are the newest `amount` bars, oldest first.
        let expected_ts: Vec<&str> = s.bars()[..amount]
            .iter()
            .rev()
            .map(|b| b.timestamp.as_str())
            .collect();
        assert_eq!(out.timestamps(), expected_ts);
    }

    #[test]
    fn adosc_equal_periods_is_zero() {
        let out = adosc(&series(30), 6, 5, 5).unwrap();
        assert!(out.values().iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn adosc_needs_warm_up_bars() {
        // 5 + 10 bars are required.
        assert!(matches!(
            adosc(&series(14), 5, 3, 10),
            Err(IndicatorError::InvalidArgument { .. })
        ));
        assert!(adosc(&series(15), 5, 3, 10).is_ok());
    }

    #[test]
    fn adosc_huge_amount_is_invalid_not_a_panic() {
        assert!(matches!(
            adosc(&series(15), usize::MAX, 3, 10),
            Err(IndicatorError::InvalidArgument { .. })
        ));
    }
}
