// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator math.  Primitives work on chronological
// `&[f64]` slices; series-level indicators take a newest-first `BarSeries`
// and return an oldest-to-newest `DerivedSeries` of exactly the requested
// number of points.  Every failure is a typed `IndicatorError`.

pub mod bands;
pub mod directional;
pub mod money_flow;
pub mod moving_average;
pub mod oscillators;
pub mod price;
pub mod true_range;

pub use bands::{bollinger_bands, BandPoint};
pub use directional::{adx, adxr, dx};
pub use money_flow::{adosc, chaikin_ad, money_flow_multiplier, money_flow_volume};
pub use moving_average::{dema, ema, moving_average, moving_average_series, sma, wma};
pub use oscillators::{apo, aroon, cci, cmo, macd, roc, AroonPoint, MacdPoint};
pub use price::{avgprice, bop, hlc3};
pub use true_range::{average_true_range, true_range, true_range_series};

use crate::market_data::{Bar, DerivedSeries};
use crate::types::BarField;

/// One numeric column of a chronological bar window.
pub(crate) fn column(bars: &[&Bar], field: BarField) -> Vec<f64> {
    bars.iter().map(|b| b.field(field)).collect()
}

/// Stamp `values` (chronological, ending at the newest bar) with the
/// timestamps of the last `values.len()` bars of `window`.
pub(crate) fn stamp_newest<T>(window: &[&Bar], values: Vec<T>) -> DerivedSeries<T> {
    let start = window.len() - values.len();
    DerivedSeries::zip_bars(&window[start..], values)
}

/// The last `amount` elements of a chronological vector.
pub(crate) fn tail(values: &[f64], amount: usize) -> &[f64] {
    &values[values.len() - amount..]
}
