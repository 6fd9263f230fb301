// =============================================================================
// ohlcv-ta: Main Entry Point
// =============================================================================
//
// Reads bars from `{bar_dir}/{SYMBOL}_{interval}.json`, runs every configured
// indicator and prints one JSON line per indicator on stdout.  Failures are
// logged and the run carries on; the exit status reports whether any
// indicator failed.
// =============================================================================

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ohlcv_ta::runtime_config::{DEFAULT_CONFIG_PATH, ENV_CONFIG};
use ohlcv_ta::{Analytics, JsonBarStore, RuntimeConfig};

fn main() -> anyhow::Result<ExitCode> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var(ENV_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        symbol = %config.symbol,
        interval = %config.interval,
        output_size = config.output_size,
        bar_dir = %config.bar_dir.display(),
        "Starting indicator run"
    );

    // ── 2. Build the engine ──────────────────────────────────────────────
    let analytics = Analytics::new(JsonBarStore::new(config.bar_dir.clone()));

    // ── 3. Run indicators ────────────────────────────────────────────────
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;

    for request in config.requests() {
        let kind = request.kind();
        match analytics.run(&config.symbol, &config.interval, config.output_size, request) {
            Ok(output) => {
                let line = serde_json::to_string(&output)
                    .with_context(|| format!("failed to serialise {kind} output"))?;
                writeln!(out, "{line}").context("failed to write to stdout")?;
            }
            Err(e) => {
                failed += 1;
                error!(indicator = %kind, error = %e, "indicator failed");
            }
        }
    }
    out.flush().context("failed to flush stdout")?;

    if failed > 0 {
        warn!(failed, total = config.indicators.len(), "Run finished with failures");
        return Ok(ExitCode::FAILURE);
    }
    info!(total = config.indicators.len(), "Run finished");
    Ok(ExitCode::SUCCESS)
}
