pub mod bar;
pub mod series;
pub mod store;

// Re-export the core data types for convenient access (e.g. `use crate::market_data::Bar`).
pub use bar::{Bar, NumericField, RawBar};
pub use series::{BarSeries, DerivedSeries, Point, SeriesSummary};
pub use store::{BarStore, InMemoryBarStore, JsonBarStore, SeriesKey, StoreError};
