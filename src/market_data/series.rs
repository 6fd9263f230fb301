// =============================================================================
// Bar and derived series
// =============================================================================
//
// Orientation is part of each type's contract:
//   BarSeries      newest-first  (index 0 = most recent bar, i + 1 = older)
//   DerivedSeries  oldest-first  (chronological, ready for plotting)
//
// Numeric slices handed to the moving-average primitives are always
// chronological; use `field_chronological` to get one.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{IndicatorError, Result};
use crate::market_data::bar::Bar;
use crate::types::BarField;

/// Bars for one symbol and interval length, newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub interval: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Wrap bars that are already ordered newest-first.
    pub fn newest_first(symbol: impl Into<String>, interval: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            bars,
        }
    }

    /// Wrap bars ordered oldest-first, flipping them into the series order.
    pub fn from_chronological(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        mut bars: Vec<Bar>,
    ) -> Self {
        bars.reverse();
        Self::newest_first(symbol, interval, bars)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars newest-first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn newest(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn oldest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Extract one numeric column, preserving series order (newest-first).
    pub fn field(&self, field: BarField) -> Result<Vec<f64>> {
        if self.bars.is_empty() {
            return Err(IndicatorError::empty_input(format!(
                "{} field extraction on {}@{}",
                field, self.symbol, self.interval
            )));
        }
        Ok(self.bars.iter().map(|b| b.field(field)).collect())
    }

    /// Extract one numeric column oldest-first, the orientation expected by
    /// the moving-average primitives.
    pub fn field_chronological(&self, field: BarField) -> Result<Vec<f64>> {
        let mut values = self.field(field)?;
        values.reverse();
        Ok(values)
    }

    /// The newest `count` bars, oldest-first.
    pub fn window_chronological(&self, count: usize) -> Result<Vec<&Bar>> {
        if count > self.bars.len() {
            return Err(IndicatorError::insufficient_data(
                format!("{}@{} window", self.symbol, self.interval),
                count,
                self.bars.len(),
            ));
        }
        Ok(self.bars[..count].iter().rev().collect())
    }

    /// Timestamps newest-first.
    pub fn timestamps(&self) -> Vec<&str> {
        self.bars.iter().map(|b| b.timestamp.as_str()).collect()
    }

    /// Aggregate the whole series into a single OHLCV summary.
    pub fn summary(&self) -> Result<SeriesSummary> {
        let (Some(newest), Some(oldest)) = (self.bars.first(), self.bars.last()) else {
            return Err(IndicatorError::empty_input(format!(
                "summary of {}@{}",
                self.symbol, self.interval
            )));
        };
        let high = self.bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low = self.bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        Ok(SeriesSummary {
            from: oldest.timestamp.clone(),
            to: newest.timestamp.clone(),
            open: oldest.open,
            high,
            low,
            close: newest.close,
            volume: self.bars.iter().map(|b| b.volume).sum(),
            bars: self.bars.len(),
        })
    }
}

/// One bar spanning a whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub from: String,
    pub to: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub bars: usize,
}

// ---------------------------------------------------------------------------
// Derived series
// ---------------------------------------------------------------------------

/// A derived value stamped with the bar it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point<T = f64> {
    pub timestamp: String,
    pub value: T,
}

/// Indicator output, oldest-to-newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedSeries<T = f64> {
    points: Vec<Point<T>>,
}

impl<T> Default for DerivedSeries<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T> DerivedSeries<T> {
    /// Wrap points that are already oldest-first.
    pub fn from_points(points: Vec<Point<T>>) -> Self {
        Self { points }
    }

    /// Pair chronological `values` with the timestamps of the same-length
    /// chronological `bars`.
    pub(crate) fn zip_bars(bars: &[&Bar], values: Vec<T>) -> Self {
        debug_assert_eq!(bars.len(), values.len());
        Self {
            points: bars
                .iter()
                .zip(values)
                .map(|(bar, value)| Point {
                    timestamp: bar.timestamp.clone(),
                    value,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point<T>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point<T>> {
        self.points
    }

    pub fn first(&self) -> Option<&Point<T>> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point<T>> {
        self.points.last()
    }

    pub fn timestamps(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.timestamp.as_str()).collect()
    }

    /// Flip the orientation (newest-first), e.g. for tabular display.
    pub fn reversed(mut self) -> Self {
        self.points.reverse();
        self
    }
}

impl<T: Copy> DerivedSeries<T> {
    pub fn values(&self) -> Vec<T> {
        self.points.iter().map(|p| p.value).collect()
    }
}
