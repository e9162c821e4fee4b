#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the glucose monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every pipeline constant (lookback/horizon/step/gap thresholds/cap/clamp)
//!   is a tunable here; nothing numeric is hardwired in the core.
use serde::Deserialize;

/// Vendor API endpoint and request headers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiCfg {
    pub base_url: String,
    /// `product` header expected by the vendor API.
    pub product: String,
    /// `version` header expected by the vendor API.
    pub version: String,
    /// Per-request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for ApiCfg {
    fn default() -> Self {
        Self {
            base_url: "https://api.libreview.io".to_string(),
            product: "llu.android".to_string(),
            version: "4.13.0".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Data-continuity and projection constants.
///
/// The stale-tail threshold (`gap_threshold_ms`) and the render-gap rule
/// (`expected_interval_ms` x `gap_factor`) are deliberately separate knobs;
/// historical deployments disagree on both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineCfg {
    /// Recent window used to fit the index-based trend (ms).
    pub lookback_ms: i64,
    /// How far into the future projections extend (ms).
    pub horizon_ms: i64,
    /// Step between index-based projection points (ms).
    pub step_ms: i64,
    /// Adjacent-sample gap beyond which the older history tail is dropped (ms).
    pub gap_threshold_ms: i64,
    /// Expected sampling interval, drives render-gap segmentation (ms).
    pub expected_interval_ms: i64,
    /// A render gap opens when spacing exceeds `gap_factor * expected_interval_ms`.
    pub gap_factor: f64,
    /// Maximum persisted history length; oldest entries are evicted first.
    pub history_cap: usize,
    /// Lower clamp bound for projected values (mg/dL).
    pub clamp_min: u16,
    /// Upper clamp bound for projected values (mg/dL).
    pub clamp_max: u16,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            lookback_ms: 30 * 60 * 1000,
            horizon_ms: 60 * 60 * 1000,
            step_ms: 5 * 60 * 1000,
            gap_threshold_ms: 30 * 60 * 1000,
            expected_interval_ms: 15 * 60 * 1000,
            gap_factor: 1.5,
            history_cap: 50,
            clamp_min: 0,
            clamp_max: 400,
        }
    }
}

/// Refresh cadence and retention.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshCfg {
    /// Scheduled fetch period (ms).
    pub interval_ms: u64,
    /// Minimum spacing between fetches; triggers inside it are ignored (ms).
    pub min_interval_ms: u64,
    /// Chart redraw/countdown tick while waiting for the next fetch (ms).
    pub display_tick_ms: u64,
    /// Samples older than now minus this window are trimmed on merge (ms).
    pub retention_ms: i64,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            min_interval_ms: 55_000,
            display_tick_ms: 1_000,
            retention_ms: 12 * 60 * 60 * 1000,
        }
    }
}

/// Terminal chart geometry.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ChartCfg {
    pub width: usize,
    pub height: usize,
    /// Bottom of the value axis (mg/dL).
    pub value_min: u16,
    /// Top of the value axis (mg/dL).
    pub value_max: u16,
}

impl Default for ChartCfg {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
            value_min: 0,
            value_max: 350,
        }
    }
}

/// History persistence location.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageCfg {
    /// Path to the JSON history file; defaults to `gluview_history.json`
    /// next to the process when absent.
    pub history_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiCfg,
    pub pipeline: PipelineCfg,
    pub refresh: RefreshCfg,
    pub chart: ChartCfg,
    pub storage: StorageCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // API
        if self.api.base_url.is_empty() {
            eyre::bail!("api.base_url must not be empty");
        }
        if self.api.timeout_ms == 0 {
            eyre::bail!("api.timeout_ms must be >= 1");
        }

        // Pipeline
        if self.pipeline.step_ms <= 0 {
            eyre::bail!("pipeline.step_ms must be > 0");
        }
        if self.pipeline.horizon_ms < self.pipeline.step_ms {
            eyre::bail!("pipeline.horizon_ms must be >= pipeline.step_ms");
        }
        if self.pipeline.lookback_ms <= 0 {
            eyre::bail!("pipeline.lookback_ms must be > 0");
        }
        if self.pipeline.gap_threshold_ms <= 0 {
            eyre::bail!("pipeline.gap_threshold_ms must be > 0");
        }
        if self.pipeline.expected_interval_ms <= 0 {
            eyre::bail!("pipeline.expected_interval_ms must be > 0");
        }
        if !self.pipeline.gap_factor.is_finite() || self.pipeline.gap_factor <= 0.0 {
            eyre::bail!("pipeline.gap_factor must be finite and > 0");
        }
        if self.pipeline.history_cap == 0 {
            eyre::bail!("pipeline.history_cap must be >= 1");
        }
        if self.pipeline.clamp_min >= self.pipeline.clamp_max {
            eyre::bail!("pipeline.clamp_min must be < pipeline.clamp_max");
        }

        // Refresh
        if self.refresh.interval_ms == 0 {
            eyre::bail!("refresh.interval_ms must be >= 1");
        }
        if self.refresh.min_interval_ms > self.refresh.interval_ms {
            eyre::bail!("refresh.min_interval_ms must be <= refresh.interval_ms");
        }
        if self.refresh.display_tick_ms == 0 {
            eyre::bail!("refresh.display_tick_ms must be >= 1");
        }
        if self.refresh.retention_ms <= 0 {
            eyre::bail!("refresh.retention_ms must be > 0");
        }

        // Chart
        if self.chart.width < 10 || self.chart.height < 4 {
            eyre::bail!("chart.width must be >= 10 and chart.height >= 4");
        }
        if self.chart.value_min >= self.chart.value_max {
            eyre::bail!("chart.value_min must be < chart.value_max");
        }

        Ok(())
    }
}
