#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core glucose pipeline (source- and storage-agnostic).
//!
//! This crate provides the data-continuity and projection pipeline. All
//! outside-world interactions go through `gluview_traits::GlucoseSource` and
//! `gluview_traits::HistoryStore`.
//!
//! ## Architecture
//!
//! - **History**: merge/dedupe, window trim, stale-tail drop, cap, and gap
//!   segmentation over sample series (`history` module)
//! - **Projection**: one shared OLS fit feeding the index-based and the
//!   time-aware forward projections (`projector` module)
//! - **Composition**: actual + projected series fused into render points with
//!   a smooth actual→projected join (`render` module)
//! - **Refresh**: the sequential fetch→merge→project→compose cycle and its
//!   rate gate (`runner` module)
//!
//! Every stage is a pure, synchronous transform; "no data" conditions yield
//! empty results, never errors.

pub mod conversions;
pub mod error;
pub mod history;
pub mod mocks;
pub mod projector;
pub mod render;
pub mod runner;
pub mod util;

pub use error::{MonitorError, Result};
pub use projector::{ProjectedPoint, ProjectionKind};
pub use render::{Frame, RenderPoint};

use crate::util::MILLIS_PER_MIN;

/// Data-continuity and projection constants.
///
/// Mirrors `gluview_config::PipelineCfg`; converted at the CLI edge via
/// `conversions`. Defaults match the shipped configuration.
#[derive(Debug, Clone)]
pub struct PipelineCfg {
    /// Recent window used to fit the index-based trend (ms).
    pub lookback_ms: i64,
    /// How far into the future projections extend (ms).
    pub horizon_ms: i64,
    /// Step between index-based projection points (ms).
    pub step_ms: i64,
    /// Adjacent-sample gap beyond which the older history tail is dropped (ms).
    pub gap_threshold_ms: i64,
    /// Expected sampling interval; drives render-gap segmentation (ms).
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
            lookback_ms: 30 * MILLIS_PER_MIN,
            horizon_ms: 60 * MILLIS_PER_MIN,
            step_ms: 5 * MILLIS_PER_MIN,
            gap_threshold_ms: 30 * MILLIS_PER_MIN,
            expected_interval_ms: 15 * MILLIS_PER_MIN,
            gap_factor: 1.5,
            history_cap: 50,
            clamp_min: 0,
            clamp_max: 400,
        }
    }
}

/// Refresh cadence and retention.
#[derive(Debug, Clone)]
pub struct RefreshCfg {
    /// Scheduled fetch period (ms).
    pub interval_ms: u64,
    /// Minimum spacing between fetch cycles; triggers inside it are ignored.
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
            retention_ms: 12 * 60 * MILLIS_PER_MIN,
        }
    }
}
