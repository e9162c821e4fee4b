//! The periodic refresh cycle: fetch → merge → project → compose.
//!
//! Each cycle is one fully sequential pass; the pure stages never block and
//! never overlap. `RefreshGate` realizes the serialization rule: a trigger
//! arriving inside the minimum interval is ignored rather than interleaved,
//! so an eager re-fetch can never reintroduce already-evicted samples.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use gluview_traits::{Clock, GlucoseSource, HistoryStore, Sample};

use crate::error::{MonitorError, Result};
use crate::render::Frame;
use crate::{PipelineCfg, RefreshCfg, history, projector};

/// Serializes refresh cycles by spacing them at least `min_interval_ms`
/// apart; overlapping triggers are ignored (last writer wins).
#[derive(Debug)]
pub struct RefreshGate {
    min_interval_ms: u64,
    last_begin_ms: Option<i64>,
}

impl RefreshGate {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_begin_ms: None,
        }
    }

    /// Returns true when a cycle may start now; records the start time.
    pub fn try_begin(&mut self, now_ms: i64) -> bool {
        if let Some(last) = self.last_begin_ms
            && now_ms.saturating_sub(last) < self.min_interval_ms as i64
        {
            tracing::debug!(
                since_ms = now_ms.saturating_sub(last),
                min_ms = self.min_interval_ms,
                "refresh ignored inside the minimum interval"
            );
            return false;
        }
        self.last_begin_ms = Some(now_ms);
        true
    }
}

// Map any collaborator error to a typed MonitorError, with special handling
// for vendor API errors when the api-errors feature is enabled.
pub(crate) fn map_source_error_dyn(e: &(dyn std::error::Error + 'static)) -> MonitorError {
    #[cfg(feature = "api-errors")]
    if let Some(api) = e.downcast_ref::<gluview_api::ApiError>() {
        use gluview_api::ApiError;
        return match api {
            ApiError::Unauthorized | ApiError::MissingCredentials | ApiError::LoginRejected(_) => {
                MonitorError::Auth(api.to_string())
            }
            ApiError::Timeout => MonitorError::Timeout,
            ApiError::MalformedResponse(msg) => MonitorError::Data(msg.clone()),
            other => MonitorError::Source(other.to_string()),
        };
    }
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        MonitorError::Timeout
    } else {
        MonitorError::Source(s)
    }
}

/// Result of one refresh cycle: the updated history plus its render frame.
#[derive(Debug)]
pub struct CycleOutcome {
    pub history: Vec<Sample>,
    pub frame: Frame,
}

/// One strict cycle; fetch and save failures propagate as typed errors.
pub fn run_cycle<S, H>(
    source: &mut S,
    store: &mut H,
    history: Vec<Sample>,
    pipeline: &PipelineCfg,
    retention_ms: i64,
    now_ms: i64,
) -> Result<CycleOutcome>
where
    S: GlucoseSource,
    H: HistoryStore,
{
    let incoming = source
        .fetch_recent()
        .map_err(|e| eyre::Report::new(map_source_error_dyn(&*e)))
        .wrap_err("fetching readings")?;
    tracing::debug!(incoming = incoming.len(), "fetch complete");

    let mut merged = history::merge(&history, &incoming);
    merged = history::trim_to_recent_window(&merged, now_ms - retention_ms);
    merged = history::drop_stale_tail(&merged, pipeline.gap_threshold_ms);
    merged = history::cap(&merged, pipeline.history_cap);

    store
        .save(&merged)
        .map_err(|e| eyre::Report::new(MonitorError::Storage(e.to_string())))
        .wrap_err("saving history")?;

    let frame = compose_frame(&merged, pipeline, now_ms, false);
    tracing::info!(
        count = merged.len(),
        latest = frame.latest,
        "refresh cycle complete"
    );
    Ok(CycleOutcome {
        history: merged,
        frame,
    })
}

/// One lenient cycle: a fetch or save failure degrades to a stale frame over
/// the existing history instead of aborting the monitor loop.
pub fn run_cycle_lenient<S, H>(
    source: &mut S,
    store: &mut H,
    history: Vec<Sample>,
    pipeline: &PipelineCfg,
    retention_ms: i64,
    now_ms: i64,
) -> CycleOutcome
where
    S: GlucoseSource,
    H: HistoryStore,
{
    match run_cycle(source, store, history.clone(), pipeline, retention_ms, now_ms) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "refresh failed; rendering stored history");
            let frame = compose_frame(&history, pipeline, now_ms, true);
            CycleOutcome { history, frame }
        }
    }
}

/// Projection + composition over an already-merged series.
pub fn compose_frame(
    series: &[Sample],
    pipeline: &PipelineCfg,
    now_ms: i64,
    stale: bool,
) -> Frame {
    let standard = projector::project_standard(series, now_ms, pipeline);
    let time_aware = projector::project_time_aware(series, now_ms, pipeline);
    let marked = history::mark_gaps(series, pipeline.expected_interval_ms, pipeline.gap_factor);
    Frame::build(&marked, &standard, &time_aware, stale)
}

/// Monitor loop parameters, pre-converted from configuration.
#[derive(Debug, Clone, Default)]
pub struct MonitorParams {
    pub pipeline: PipelineCfg,
    pub refresh: RefreshCfg,
}

/// Run the monitor until the shutdown flag flips.
///
/// `on_frame` receives every frame together with the time remaining until
/// the next scheduled fetch, and is also invoked on display ticks between
/// fetches so a countdown can be redrawn.
pub fn run_monitor<S, H, C, F>(
    mut source: S,
    mut store: H,
    clock: &C,
    params: &MonitorParams,
    shutdown: &AtomicBool,
    mut on_frame: F,
) -> Result<()>
where
    S: GlucoseSource,
    H: HistoryStore,
    C: Clock,
    F: FnMut(&Frame, Duration),
{
    let mut history = store
        .load()
        .map_err(|e| eyre::Report::new(MonitorError::Storage(e.to_string())))
        .wrap_err("loading history")?;
    tracing::info!(count = history.len(), "history loaded");

    let mut gate = RefreshGate::new(params.refresh.min_interval_ms);
    let mut frame = Frame::default();
    let mut next_fetch_ms = clock.now_ms();

    while !shutdown.load(Ordering::Relaxed) {
        let now_ms = clock.now_ms();
        if now_ms >= next_fetch_ms && gate.try_begin(now_ms) {
            let outcome = run_cycle_lenient(
                &mut source,
                &mut store,
                std::mem::take(&mut history),
                &params.pipeline,
                params.refresh.retention_ms,
                now_ms,
            );
            history = outcome.history;
            frame = outcome.frame;
            next_fetch_ms = now_ms + params.refresh.interval_ms as i64;
        }

        let remaining_ms = next_fetch_ms.saturating_sub(clock.now_ms()).max(0) as u64;
        on_frame(&frame, Duration::from_millis(remaining_ms));

        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let tick_ms = params.refresh.display_tick_ms.min(remaining_ms.max(1));
        clock.sleep(Duration::from_millis(tick_ms));
    }
    tracing::info!("monitor stopped");
    Ok(())
}
