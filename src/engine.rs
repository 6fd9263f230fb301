// =============================================================================
// Analytics Engine: one fetch per indicator call
// =============================================================================
//
// `Analytics` owns a `BarStore` and exposes one method per indicator.  Every
// call follows the same steps:
//
//   1. validate the parameter set (no fetch on bad parameters)
//   2. compute how many bars the indicator reads, warm-up included
//   3. fetch exactly that many bars, newest-first
//   4. run the pure indicator function
//
// Nothing is retained between calls.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_period, lookback, Result};
use crate::indicators::{
    self, bands::validate_bollinger, directional, money_flow::validate_adosc,
    oscillators::{apo_lookback, macd_lookback, validate_apo, validate_macd},
    AroonPoint, BandPoint, MacdPoint,
};
use crate::market_data::{BarSeries, BarStore, DerivedSeries};
use crate::types::{BarField, MaType};

// =============================================================================
// Parameter sets
// =============================================================================

fn default_adosc_short() -> usize {
    3
}

fn default_adosc_long() -> usize {
    10
}

fn default_fourteen() -> usize {
    14
}

fn default_apo_short() -> usize {
    12
}

fn default_apo_long() -> usize {
    26
}

fn default_apo_ma_type() -> MaType {
    MaType::Ema
}

fn default_macd_signal() -> usize {
    9
}

fn default_avg_period() -> usize {
    9
}

fn default_bbands_period() -> usize {
    20
}

fn default_bbands_deviations() -> f64 {
    2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdoscParams {
    #[serde(default = "default_adosc_short")]
    pub short_period: usize,
    #[serde(default = "default_adosc_long")]
    pub long_period: usize,
}

impl Default for AdoscParams {
    fn default() -> Self {
        Self {
            short_period: default_adosc_short(),
            long_period: default_adosc_long(),
        }
    }
}

/// A single look-back period (ATR, DX, ADX, ADXR, AROON, CCI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodParams {
    #[serde(default = "default_fourteen")]
    pub period: usize,
}

impl PeriodParams {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Default for PeriodParams {
    fn default() -> Self {
        Self::new(default_fourteen())
    }
}

/// A period applied to one price field (CMO, ROC, DEMA).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPeriodParams {
    #[serde(default = "default_fourteen")]
    pub period: usize,
    #[serde(default)]
    pub field: BarField,
}

impl FieldPeriodParams {
    pub fn new(period: usize, field: BarField) -> Self {
        Self { period, field }
    }
}

impl Default for FieldPeriodParams {
    fn default() -> Self {
        Self::new(default_fourteen(), BarField::Close)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApoParams {
    #[serde(default = "default_apo_ma_type")]
    pub ma_type: MaType,
    #[serde(default = "default_apo_short")]
    pub short_period: usize,
    #[serde(default = "default_apo_long")]
    pub long_period: usize,
    #[serde(default)]
    pub field: BarField,
}

impl Default for ApoParams {
    fn default() -> Self {
        Self {
            ma_type: default_apo_ma_type(),
            short_period: default_apo_short(),
            long_period: default_apo_long(),
            field: BarField::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    #[serde(default = "default_apo_short")]
    pub fast_period: usize,
    #[serde(default = "default_apo_long")]
    pub slow_period: usize,
    #[serde(default = "default_macd_signal")]
    pub signal_period: usize,
    #[serde(default)]
    pub field: BarField,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: default_apo_short(),
            slow_period: default_apo_long(),
            signal_period: default_macd_signal(),
            field: BarField::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandsParams {
    #[serde(default = "default_bbands_period")]
    pub period: usize,
    #[serde(default)]
    pub ma_type: MaType,
    #[serde(default = "default_bbands_deviations")]
    pub deviations: f64,
    #[serde(default)]
    pub field: BarField,
}

impl Default for BandsParams {
    fn default() -> Self {
        Self {
            period: default_bbands_period(),
            ma_type: MaType::Sma,
            deviations: default_bbands_deviations(),
            field: BarField::Close,
        }
    }
}

/// Moving average of one field (AVG).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageParams {
    #[serde(default)]
    pub ma_type: MaType,
    #[serde(default = "default_avg_period")]
    pub period: usize,
    #[serde(default)]
    pub field: BarField,
}

impl Default for AverageParams {
    fn default() -> Self {
        Self {
            ma_type: MaType::Sma,
            period: default_avg_period(),
            field: BarField::Close,
        }
    }
}

// =============================================================================
// Requests & outputs
// =============================================================================

/// Indicator identifiers, as they appear in config files and output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    ChaikinAd,
    Adosc,
    TrueRange,
    Atr,
    Dx,
    Adx,
    Adxr,
    Apo,
    Macd,
    Aroon,
    Avg,
    AvgPrice,
    Hlc3,
    Bop,
    BBands,
    Cci,
    Cmo,
    Roc,
    Dema,
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ChaikinAd => "chaikinad",
            Self::Adosc => "adosc",
            Self::TrueRange => "truerange",
            Self::Atr => "atr",
            Self::Dx => "dx",
            Self::Adx => "adx",
            Self::Adxr => "adxr",
            Self::Apo => "apo",
            Self::Macd => "macd",
            Self::Aroon => "aroon",
            Self::Avg => "avg",
            Self::AvgPrice => "avgprice",
            Self::Hlc3 => "hlc3",
            Self::Bop => "bop",
            Self::BBands => "bbands",
            Self::Cci => "cci",
            Self::Cmo => "cmo",
            Self::Roc => "roc",
            Self::Dema => "dema",
        };
        f.write_str(name)
    }
}

/// An indicator together with its parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "indicator", rename_all = "lowercase")]
pub enum IndicatorRequest {
    ChaikinAd,
    Adosc(AdoscParams),
    TrueRange,
    Atr(PeriodParams),
    Dx(PeriodParams),
    Adx(PeriodParams),
    Adxr(PeriodParams),
    Apo(ApoParams),
    Macd(MacdParams),
    Aroon(PeriodParams),
    Avg(AverageParams),
    AvgPrice,
    Hlc3,
    Bop,
    BBands(BandsParams),
    Cci(PeriodParams),
    Cmo(FieldPeriodParams),
    Roc(FieldPeriodParams),
    Dema(FieldPeriodParams),
}

impl IndicatorRequest {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::ChaikinAd => IndicatorKind::ChaikinAd,
            Self::Adosc(_) => IndicatorKind::Adosc,
            Self::TrueRange => IndicatorKind::TrueRange,
            Self::Atr(_) => IndicatorKind::Atr,
            Self::Dx(_) => IndicatorKind::Dx,
            Self::Adx(_) => IndicatorKind::Adx,
            Self::Adxr(_) => IndicatorKind::Adxr,
            Self::Apo(_) => IndicatorKind::Apo,
            Self::Macd(_) => IndicatorKind::Macd,
            Self::Aroon(_) => IndicatorKind::Aroon,
            Self::Avg(_) => IndicatorKind::Avg,
            Self::AvgPrice => IndicatorKind::AvgPrice,
            Self::Hlc3 => IndicatorKind::Hlc3,
            Self::Bop => IndicatorKind::Bop,
            Self::BBands(_) => IndicatorKind::BBands,
            Self::Cci(_) => IndicatorKind::Cci,
            Self::Cmo(_) => IndicatorKind::Cmo,
            Self::Roc(_) => IndicatorKind::Roc,
            Self::Dema(_) => IndicatorKind::Dema,
        }
    }
}

/// The computed values of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndicatorValues {
    Scalar(DerivedSeries),
    Macd(DerivedSeries<MacdPoint>),
    Aroon(DerivedSeries<AroonPoint>),
    Bands(DerivedSeries<BandPoint>),
}

impl IndicatorValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(s) => s.len(),
            Self::Macd(s) => s.len(),
            Self::Aroon(s) => s.len(),
            Self::Bands(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One line of engine output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorOutput {
    pub symbol: String,
    pub interval: String,
    pub indicator: IndicatorKind,
    pub values: IndicatorValues,
}

// =============================================================================
// Analytics
// =============================================================================

/// Indicator engine over a bar store.
///
/// Errors split by where they are detected:
///
/// - bad parameters, or an amount whose warm-up does not fit in a `usize`:
///   [`IndicatorError::InvalidArgument`], before the store is touched
/// - a store holding fewer bars than the call needs:
///   [`IndicatorError::Store`] wrapping [`StoreError::Insufficient`], since
///   the store is asked for the full window up front
/// - a formula hitting a zero divisor: [`IndicatorError::DivisionByZero`]
///
/// [`IndicatorError::InvalidArgument`]: crate::error::IndicatorError::InvalidArgument
/// [`IndicatorError::Store`]: crate::error::IndicatorError::Store
/// [`IndicatorError::DivisionByZero`]: crate::error::IndicatorError::DivisionByZero
/// [`StoreError::Insufficient`]: crate::market_data::StoreError::Insufficient
#[derive(Debug, Clone)]
pub struct Analytics<S> {
    store: S,
}

impl<S: BarStore> Analytics<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn fetch(&self, indicator: IndicatorKind, symbol: &str, interval: &str, bars: usize) -> Result<BarSeries> {
        debug!(%indicator, symbol, interval, bars, "fetching bars");
        let series = self.store.fetch_bars(symbol, interval, bars)?;
        debug!(%indicator, symbol, interval, received = series.len(), "bars fetched");
        Ok(series)
    }

    // ── Money flow ─────────────────────────────────────────────────────────

    pub fn chaikin_ad(&self, symbol: &str, interval: &str, amount: usize) -> Result<DerivedSeries> {
        let series = self.fetch(IndicatorKind::ChaikinAd, symbol, interval, amount)?;
        indicators::chaikin_ad(&series, amount)
    }

    pub fn adosc(&self, symbol: &str, interval: &str, amount: usize, params: AdoscParams) -> Result<DerivedSeries> {
        validate_adosc(params.short_period, params.long_period)?;
        let series = self.fetch(IndicatorKind::Adosc, symbol, interval, lookback(amount, params.long_period)?)?;
        indicators::adosc(&series, amount, params.short_period, params.long_period)
    }

    // ── Range & direction ──────────────────────────────────────────────────

    pub fn true_range(&self, symbol: &str, interval: &str, amount: usize) -> Result<DerivedSeries> {
        let series = self.fetch(IndicatorKind::TrueRange, symbol, interval, lookback(amount, 1)?)?;
        indicators::true_range_series(&series, amount)
    }

    pub fn atr(&self, symbol: &str, interval: &str, amount: usize, params: PeriodParams) -> Result<DerivedSeries> {
        ensure_period("ATR period", params.period)?;
        let series = self.fetch(IndicatorKind::Atr, symbol, interval, lookback(amount, params.period)?)?;
        indicators::average_true_range(&series, amount, params.period)
    }

    pub fn dx(&self, symbol: &str, interval: &str, amount: usize, params: PeriodParams) -> Result<DerivedSeries> {
        ensure_period("DX period", params.period)?;
        let bars = directional::dx_lookback(amount, params.period)?;
        let series = self.fetch(IndicatorKind::Dx, symbol, interval, bars)?;
        indicators::dx(&series, amount, params.period)
    }

    pub fn adx(&self, symbol: &str, interval: &str, amount: usize, params: PeriodParams) -> Result<DerivedSeries> {
        ensure_period("ADX period", params.period)?;
        let bars = directional::adx_lookback(amount, params.period)?;
        let series = self.fetch(IndicatorKind::Adx, symbol, interval, bars)?;
        indicators::adx(&series, amount, params.period)
    }

    pub fn adxr(&self, symbol: &str, interval: &str, amount: usize, params: PeriodParams) -> Result<DerivedSeries> {
        ensure_period("ADXR period", params.period)?;
        let bars = directional::adxr_lookback(amount, params.period)?;
        let series = self.fetch(IndicatorKind::Adxr, symbol, interval, bars)?;
        indicators::adxr(&series, amount, params.period)
    }

    // ── Oscillators ────────────────────────────────────────────────────────

    pub fn apo(&self, symbol: &str, interval: &str, amount: usize, params: ApoParams) -> Result<DerivedSeries> {
        validate_apo(params.short_period, params.long_period)?;
        let bars = apo_lookback(amount, params.long_period)?;
        let series = self.fetch(IndicatorKind::Apo, symbol, interval, bars)?;
        indicators::apo(
            &series,
            amount,
            params.ma_type,
            params.short_period,
            params.long_period,
            params.field,
        )
    }

    pub fn macd(
        &self,
        symbol: &str,
        interval: &str,
        amount: usize,
        params: MacdParams,
    ) -> Result<DerivedSeries<MacdPoint>> {
        validate_macd(params.fast_period, params.slow_period, params.signal_period)?;
        let bars = macd_lookback(amount, params.slow_period, params.signal_period)?;
        let series = self.fetch(IndicatorKind::Macd, symbol, interval, bars)?;
        indicators::macd(
            &series,
            amount,
            params.fast_period,
            params.slow_period,
            params.signal_period,
            params.field,
        )
    }

    pub fn aroon(
        &self,
        symbol: &str,
        interval: &str,
        amount: usize,
        params: PeriodParams,
    ) -> Result<DerivedSeries<AroonPoint>> {
        ensure_period("AROON period", params.period)?;
        let series = self.fetch(IndicatorKind::Aroon, symbol, interval, lookback(amount, params.period)?)?;
        indicators::aroon(&series, amount, params.period)
    }

    pub fn cci(&self, symbol: &str, interval: &str, amount: usize, params: PeriodParams) -> Result<DerivedSeries> {
        ensure_period("CCI period", params.period)?;
        let series = self.fetch(IndicatorKind::Cci, symbol, interval, lookback(amount, params.period - 1)?)?;
        indicators::cci(&series, amount, params.period)
    }

    pub fn cmo(&self, symbol: &str, interval: &str, amount: usize, params: FieldPeriodParams) -> Result<DerivedSeries> {
        ensure_period("CMO period", params.period)?;
        let series = self.fetch(IndicatorKind::Cmo, symbol, interval, lookback(amount, params.period)?)?;
        indicators::cmo(&series, amount, params.period, params.field)
    }

    pub fn roc(&self, symbol: &str, interval: &str, amount: usize, params: FieldPeriodParams) -> Result<DerivedSeries> {
        ensure_period("ROC period", params.period)?;
        let series = self.fetch(IndicatorKind::Roc, symbol, interval, lookback(amount, params.period)?)?;
        indicators::roc(&series, amount, params.period, params.field)
    }

    // ── Averages & bands ───────────────────────────────────────────────────

    pub fn avg(&self, symbol: &str, interval: &str, amount: usize, params: AverageParams) -> Result<DerivedSeries> {
        ensure_period("AVG period", params.period)?;
        let series = self.fetch(IndicatorKind::Avg, symbol, interval, lookback(amount, params.period - 1)?)?;
        indicators::moving_average_series(&series, amount, params.ma_type, params.period, params.field)
    }

    pub fn dema(&self, symbol: &str, interval: &str, amount: usize, params: FieldPeriodParams) -> Result<DerivedSeries> {
        ensure_period("DEMA period", params.period)?;
        let bars = lookback(lookback(amount, params.period - 1)?, params.period - 1)?;
        let series = self.fetch(IndicatorKind::Dema, symbol, interval, bars)?;
        indicators::dema(&series, amount, params.period, params.field)
    }

    pub fn bollinger_bands(
        &self,
        symbol: &str,
        interval: &str,
        amount: usize,
        params: BandsParams,
    ) -> Result<DerivedSeries<BandPoint>> {
        validate_bollinger(params.period, params.deviations)?;
        let series = self.fetch(IndicatorKind::BBands, symbol, interval, lookback(amount, params.period - 1)?)?;
        indicators::bollinger_bands(
            &series,
            amount,
            params.period,
            params.ma_type,
            params.deviations,
            params.field,
        )
    }

    // ── Price transforms ───────────────────────────────────────────────────

    pub fn avgprice(&self, symbol: &str, interval: &str, amount: usize) -> Result<DerivedSeries> {
        let series = self.fetch(IndicatorKind::AvgPrice, symbol, interval, amount)?;
        indicators::avgprice(&series, amount)
    }

    pub fn hlc3(&self, symbol: &str, interval: &str, amount: usize) -> Result<DerivedSeries> {
        let series = self.fetch(IndicatorKind::Hlc3, symbol, interval, amount)?;
        indicators::hlc3(&series, amount)
    }

    pub fn bop(&self, symbol: &str, interval: &str, amount: usize) -> Result<DerivedSeries> {
        let series = self.fetch(IndicatorKind::Bop, symbol, interval, amount)?;
        indicators::bop(&series, amount)
    }

    // ── Generic dispatch ───────────────────────────────────────────────────

    /// Run any indicator described by `request`.
    pub fn run(&self, symbol: &str, interval: &str, amount: usize, request: IndicatorRequest) -> Result<IndicatorOutput> {
        use IndicatorRequest as R;
        use IndicatorValues as V;

        let values = match request {
            R::ChaikinAd => V::Scalar(self.chaikin_ad(symbol, interval, amount)?),
            R::Adosc(p) => V::Scalar(self.adosc(symbol, interval, amount, p)?),
            R::TrueRange => V::Scalar(self.true_range(symbol, interval, amount)?),
            R::Atr(p) => V::Scalar(self.atr(symbol, interval, amount, p)?),
            R::Dx(p) => V::Scalar(self.dx(symbol, interval, amount, p)?),
            R::Adx(p) => V::Scalar(self.adx(symbol, interval, amount, p)?),
            R::Adxr(p) => V::Scalar(self.adxr(symbol, interval, amount, p)?),
            R::Apo(p) => V::Scalar(self.apo(symbol, interval, amount, p)?),
            R::Macd(p) => V::Macd(self.macd(symbol, interval, amount, p)?),
            R::Aroon(p) => V::Aroon(self.aroon(symbol, interval, amount, p)?),
            R::Avg(p) => V::Scalar(self.avg(symbol, interval, amount, p)?),
            R::AvgPrice => V::Scalar(self.avgprice(symbol, interval, amount)?),
            R::Hlc3 => V::Scalar(self.hlc3(symbol, interval, amount)?),
            R::Bop => V::Scalar(self.bop(symbol, interval, amount)?),
            R::BBands(p) => V::Bands(self.bollinger_bands(symbol, interval, amount, p)?),
            R::Cci(p) => V::Scalar(self.cci(symbol, interval, amount, p)?),
            R::Cmo(p) => V::Scalar(self.cmo(symbol, interval, amount, p)?),
            R::Roc(p) => V::Scalar(self.roc(symbol, interval, amount, p)?),
            R::Dema(p) => V::Scalar(self.dema(symbol, interval, amount, p)?),
        };
        debug!(indicator = %request.kind(), symbol, interval, points = values.len(), "indicator computed");

        Ok(IndicatorOutput {
            symbol: symbol.to_uppercase(),
            interval: interval.to_string(),
            indicator: request.kind(),
            values,
        })
    }
}
