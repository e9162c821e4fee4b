//! `From` implementations bridging `gluview_config` types to `gluview_core`
//! types, so the CLI never maps fields by hand.

use crate::{PipelineCfg, RefreshCfg};

impl From<&gluview_config::PipelineCfg> for PipelineCfg {
    fn from(c: &gluview_config::PipelineCfg) -> Self {
        Self {
            lookback_ms: c.lookback_ms,
            horizon_ms: c.horizon_ms,
            step_ms: c.step_ms,
            gap_threshold_ms: c.gap_threshold_ms,
            expected_interval_ms: c.expected_interval_ms,
            gap_factor: c.gap_factor,
            history_cap: c.history_cap,
            clamp_min: c.clamp_min,
            clamp_max: c.clamp_max,
        }
    }
}

impl From<&gluview_config::RefreshCfg> for RefreshCfg {
    fn from(c: &gluview_config::RefreshCfg) -> Self {
        Self {
            interval_ms: c.interval_ms,
            min_interval_ms: c.min_interval_ms,
            display_tick_ms: c.display_tick_ms,
            retention_ms: c.retention_ms,
        }
    }
}
