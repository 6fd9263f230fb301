// =============================================================================
// ohlcv-ta: technical-analysis indicators over OHLCV bar series
// =============================================================================
//
// Bars come from a `BarStore` newest-first; indicators return oldest-to-newest
// `DerivedSeries`.  `Analytics` ties the two together with one fetch per
// indicator call.
// =============================================================================

pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod types;

pub use engine::{Analytics, IndicatorKind, IndicatorOutput, IndicatorRequest, IndicatorValues};
pub use error::{IndicatorError, Result};
pub use market_data::{
    Bar, BarSeries, BarStore, DerivedSeries, InMemoryBarStore, JsonBarStore, Point, StoreError,
};
pub use runtime_config::RuntimeConfig;
pub use types::{BarField, MaType};
