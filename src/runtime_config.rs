// =============================================================================
// Runtime Configuration: indicator run settings with atomic save
// =============================================================================
//
// Everything the `ohlcv-ta` binary needs for a run: which series to read,
// how many output points to produce, which indicators to compute and the
// parameter set for each of them.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry serde
// defaults so that a partial (or empty) JSON file still loads.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{
    AdoscParams, ApoParams, AverageParams, BandsParams, FieldPeriodParams, IndicatorKind,
    IndicatorRequest, MacdParams, PeriodParams,
};
use crate::types::BarField;

pub const ENV_SYMBOL: &str = "OHLCV_SYMBOL";
pub const ENV_INTERVAL: &str = "OHLCV_INTERVAL";
pub const ENV_BAR_DIR: &str = "OHLCV_BAR_DIR";
pub const ENV_CONFIG: &str = "OHLCV_CONFIG";

/// Config file used when `OHLCV_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "ohlcv_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbol() -> String {
    "IBM".to_string()
}

fn default_interval() -> String {
    "1day".to_string()
}

fn default_output_size() -> usize {
    30
}

fn default_bar_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_indicators() -> Vec<IndicatorKind> {
    vec![
        IndicatorKind::ChaikinAd,
        IndicatorKind::Adosc,
        IndicatorKind::Atr,
        IndicatorKind::Adx,
        IndicatorKind::Macd,
        IndicatorKind::BBands,
    ]
}

fn default_twenty() -> PeriodParams {
    PeriodParams::new(20)
}

fn default_roc() -> FieldPeriodParams {
    FieldPeriodParams::new(10, BarField::Close)
}

fn default_dema() -> FieldPeriodParams {
    FieldPeriodParams::new(9, BarField::Close)
}

// =============================================================================
// IndicatorDefaults
// =============================================================================

/// Parameter set used for each indicator kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefaults {
    #[serde(default)]
    pub adosc: AdoscParams,

    /// Shared by ATR, DX, ADX, ADXR and AROON.
    #[serde(default)]
    pub directional: PeriodParams,

    #[serde(default)]
    pub apo: ApoParams,

    #[serde(default)]
    pub macd: MacdParams,

    #[serde(default)]
    pub avg: AverageParams,

    #[serde(default)]
    pub bbands: BandsParams,

    #[serde(default = "default_twenty")]
    pub cci: PeriodParams,

    #[serde(default)]
    pub cmo: FieldPeriodParams,

    #[serde(default = "default_roc")]
    pub roc: FieldPeriodParams,

    #[serde(default = "default_dema")]
    pub dema: FieldPeriodParams,
}

impl Default for IndicatorDefaults {
    fn default() -> Self {
        Self {
            adosc: AdoscParams::default(),
            directional: PeriodParams::default(),
            apo: ApoParams::default(),
            macd: MacdParams::default(),
            avg: AverageParams::default(),
            bbands: BandsParams::default(),
            cci: default_twenty(),
            cmo: FieldPeriodParams::default(),
            roc: default_roc(),
            dema: default_dema(),
        }
    }
}

impl IndicatorDefaults {
    /// Pair `kind` with its configured parameters.
    pub fn request_for(&self, kind: IndicatorKind) -> IndicatorRequest {
        use IndicatorKind as K;
        use IndicatorRequest as R;

        match kind {
            K::ChaikinAd => R::ChaikinAd,
            K::Adosc => R::Adosc(self.adosc),
            K::TrueRange => R::TrueRange,
            K::Atr => R::Atr(self.directional),
            K::Dx => R::Dx(self.directional),
            K::Adx => R::Adx(self.directional),
            K::Adxr => R::Adxr(self.directional),
            K::Apo => R::Apo(self.apo),
            K::Macd => R::Macd(self.macd),
            K::Aroon => R::Aroon(self.directional),
            K::Avg => R::Avg(self.avg),
            K::AvgPrice => R::AvgPrice,
            K::Hlc3 => R::Hlc3,
            K::Bop => R::Bop,
            K::BBands => R::BBands(self.bbands),
            K::Cci => R::Cci(self.cci),
            K::Cmo => R::Cmo(self.cmo),
            K::Roc => R::Roc(self.roc),
            K::Dema => R::Dema(self.dema),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level settings for one `ohlcv-ta` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Series -------------------------------------------------------------

    /// Ticker symbol, e.g. "IBM".
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Opaque interval token, e.g. "1day" or "5min".
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Number of points each indicator reports.
    #[serde(default = "default_output_size")]
    pub output_size: usize,

    /// Directory holding `{SYMBOL}_{interval}.json` bar files.
    #[serde(default = "default_bar_dir")]
    pub bar_dir: PathBuf,

    // --- Indicators ---------------------------------------------------------

    #[serde(default = "default_indicators")]
    pub indicators: Vec<IndicatorKind>,

    #[serde(default)]
    pub params: IndicatorDefaults,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            interval: default_interval(),
            output_size: default_output_size(),
            bar_dir: default_bar_dir(),
            indicators: default_indicators(),
            params: IndicatorDefaults::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or unreadable file is an error; the caller decides whether
    /// to fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            interval = %config.interval,
            indicators = config.indicators.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` (write `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `OHLCV_SYMBOL`, `OHLCV_INTERVAL` and `OHLCV_BAR_DIR` overrides
    /// from `lookup`.  Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(symbol) = non_blank(ENV_SYMBOL) {
            self.symbol = symbol.to_uppercase();
        }
        if let Some(interval) = non_blank(ENV_INTERVAL) {
            self.interval = interval;
        }
        if let Some(dir) = non_blank(ENV_BAR_DIR) {
            self.bar_dir = PathBuf::from(dir);
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// The configured indicators, each paired with its parameter set.
    pub fn requests(&self) -> Vec<IndicatorRequest> {
        self.indicators
            .iter()
            .map(|&kind| self.params.request_for(kind))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::types::MaType;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbol, "IBM");
        assert_eq!(cfg.interval, "1day");
        assert_eq!(cfg.output_size, 30);
        assert_eq!(cfg.params.adosc, AdoscParams { short_period: 3, long_period: 10 });
        assert_eq!(cfg.params.directional.period, 14);
        assert_eq!(cfg.params.apo.ma_type, MaType::Ema);
        assert_eq!((cfg.params.apo.short_period, cfg.params.apo.long_period), (12, 26));
        assert_eq!(cfg.params.macd.signal_period, 9);
        assert_eq!(cfg.params.bbands.period, 20);
        assert!((cfg.params.bbands.deviations - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.params.bbands.ma_type, MaType::Sma);
        assert_eq!(cfg.params.cci.period, 20);
        assert_eq!(cfg.params.cmo.period, 14);
        assert_eq!(cfg.params.roc.period, 10);
        assert_eq!(cfg.params.dema.period, 9);
        assert_eq!(cfg.params.avg.period, 9);
        assert_eq!(cfg.params.avg.field, BarField::Close);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "symbol": "MSFT",
            "indicators": ["roc", "bbands", "chaikinad"],
            "params": { "roc": { "period": 5, "field": "open" }, "bbands": { "deviations": 1.5 } }
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbol, "MSFT");
        assert_eq!(cfg.interval, "1day");
        assert_eq!(cfg.params.roc, FieldPeriodParams::new(5, BarField::Open));
        assert_eq!(cfg.params.bbands.period, 20);
        assert!((cfg.params.bbands.deviations - 1.5).abs() < f64::EPSILON);
        assert_eq!(cfg.params.cci.period, 20);

        let requests = cfg.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], IndicatorRequest::Roc(FieldPeriodParams::new(5, BarField::Open)));
        assert_eq!(requests[2], IndicatorRequest::ChaikinAd);
    }

    #[test]
    fn overrides_replace_non_blank_values() {
        let env: HashMap<&str, &str> = [(ENV_SYMBOL, "aapl"), (ENV_INTERVAL, "  "), (ENV_BAR_DIR, "/tmp/bars")]
            .into_iter()
            .collect();
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.symbol, "AAPL");
        assert_eq!(cfg.interval, "1day");
        assert_eq!(cfg.bar_dir, PathBuf::from("/tmp/bars"));
    }

    #[test]
    fn every_kind_maps_to_its_request() {
        let defaults = IndicatorDefaults::default();
        for kind in [
            IndicatorKind::ChaikinAd,
            IndicatorKind::Adosc,
            IndicatorKind::TrueRange,
            IndicatorKind::Atr,
            IndicatorKind::Dx,
            IndicatorKind::Adx,
            IndicatorKind::Adxr,
            IndicatorKind::Apo,
            IndicatorKind::Macd,
            IndicatorKind::Aroon,
            IndicatorKind::Avg,
            IndicatorKind::AvgPrice,
            IndicatorKind::Hlc3,
            IndicatorKind::Bop,
            IndicatorKind::BBands,
            IndicatorKind::Cci,
            IndicatorKind::Cmo,
            IndicatorKind::Roc,
            IndicatorKind::Dema,
        ] {
            assert_eq!(defaults.request_for(kind).kind(), kind);
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = RuntimeConfig::default();
        cfg.output_size = 7;
        cfg.indicators = vec![IndicatorKind::Hlc3];
        cfg.save(&path).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(RuntimeConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RuntimeConfig::load(dir.path().join("absent.json")).is_err());
    }
}
