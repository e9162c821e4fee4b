use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use gluview_core::mocks::{MemoryStore, NoopSource, ScriptedSource};
use gluview_core::runner::{MonitorParams, run_cycle, run_cycle_lenient, run_monitor};
use gluview_core::{PipelineCfg, RefreshCfg};
use gluview_traits::{Clock, Sample};
use rstest::rstest;

const MIN: i64 = 60_000;

// Deterministic test clock we can manually advance.
#[derive(Clone)]
struct TestClock {
    ms: Arc<AtomicI64>,
}

impl TestClock {
    fn at(origin_ms: i64) -> Self {
        Self {
            ms: Arc::new(AtomicI64::new(origin_ms)),
        }
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> i64 {
        self.ms.load(Ordering::Relaxed)
    }
    fn sleep(&self, d: Duration) {
        self.ms.fetch_add(d.as_millis() as i64, Ordering::Relaxed);
    }
}

fn readings(points: &[(i64, u16)]) -> Vec<Sample> {
    points
        .iter()
        .map(|&(min, v)| Sample::reading(min * MIN, v))
        .collect()
}

#[rstest]
fn cycle_merges_persists_and_composes() {
    let mut source = ScriptedSource::new([readings(&[(10, 118), (15, 121), (20, 125)])]);
    let mut store = MemoryStore::default();
    let history = readings(&[(0, 110), (5, 114), (10, 118)]);
    let cfg = PipelineCfg::default();

    let outcome = run_cycle(&mut source, &mut store, history, &cfg, 12 * 60 * MIN, 20 * MIN)
        .expect("cycle succeeds");

    // Overlap at 10min deduplicated; five unique readings survive.
    assert_eq!(outcome.history.len(), 5);
    assert_eq!(store.save_count, 1);
    assert_eq!(store.series, outcome.history);

    let frame = outcome.frame;
    assert!(!frame.stale);
    assert_eq!(frame.latest, Some(125));
    assert_eq!(frame.last_actual_ms, Some(20 * MIN));
    // Actual points precede projections, and both projections fit (regular
    // 5min spacing, steadily rising values).
    let projected: Vec<_> = frame.points.iter().filter(|p| p.actual.is_none()).collect();
    assert!(!projected.is_empty());
    assert!(projected.iter().all(|p| p.time_ms > 20 * MIN));
}

#[rstest]
fn cycle_caps_history_across_fetches() {
    let cfg = PipelineCfg {
        history_cap: 4,
        ..PipelineCfg::default()
    };
    let mut store = MemoryStore::default();
    let mut source = ScriptedSource::new([
        readings(&[(0, 100), (5, 102), (10, 104), (15, 106)]),
        readings(&[(20, 108), (25, 110)]),
    ]);

    let first = run_cycle(&mut source, &mut store, Vec::new(), &cfg, 12 * 60 * MIN, 15 * MIN)
        .expect("first cycle");
    let second = run_cycle(
        &mut source,
        &mut store,
        first.history,
        &cfg,
        12 * 60 * MIN,
        25 * MIN,
    )
    .expect("second cycle");

    assert_eq!(second.history.len(), 4, "cap evicts oldest entries");
    assert_eq!(second.history[0].timestamp_ms, 10 * MIN);
    assert_eq!(store.save_count, 2);
}

#[rstest]
fn failed_fetch_degrades_to_a_stale_frame() {
    let mut store = MemoryStore::default();
    let history = readings(&[(0, 110), (5, 114)]);
    let cfg = PipelineCfg::default();

    let outcome = run_cycle_lenient(
        &mut NoopSource,
        &mut store,
        history.clone(),
        &cfg,
        12 * 60 * MIN,
        5 * MIN,
    );

    assert!(outcome.frame.stale);
    assert_eq!(outcome.history, history, "history is untouched on failure");
    assert_eq!(store.save_count, 0);
    assert_eq!(outcome.frame.latest, Some(114));
}

#[rstest]
fn strict_cycle_propagates_fetch_errors() {
    let mut store = MemoryStore::default();
    let err = run_cycle(
        &mut NoopSource,
        &mut store,
        Vec::new(),
        &PipelineCfg::default(),
        12 * 60 * MIN,
        0,
    )
    .expect_err("noop source must fail");
    assert!(err.to_string().contains("fetching readings"));
}

#[rstest]
fn stale_fetch_window_yields_no_projections() {
    // History ends long before "now": the lookback window is empty, so the
    // frame renders actuals only.
    let mut source = ScriptedSource::new([Vec::new()]);
    let mut store = MemoryStore::default();
    let history = readings(&[(0, 110), (5, 112)]);
    let cfg = PipelineCfg::default();

    let outcome = run_cycle(&mut source, &mut store, history, &cfg, 12 * 60 * MIN, 240 * MIN)
        .expect("cycle succeeds");
    assert!(outcome.frame.points.iter().all(|p| p.actual.is_some()));
}

#[rstest]
fn monitor_loop_renders_and_refetches_on_schedule() {
    let clock = TestClock::at(1_000_000 * MIN);
    let shutdown = Arc::new(AtomicBool::new(false));
    let frames = Arc::new(AtomicI64::new(0));

    let base_min = 1_000_000;
    let source = ScriptedSource::new([
        readings(&[(base_min - 10, 115), (base_min - 5, 118)]),
        readings(&[(base_min, 121)]),
    ]);
    let store = MemoryStore::default();
    let params = MonitorParams {
        pipeline: PipelineCfg::default(),
        refresh: RefreshCfg {
            interval_ms: 60_000,
            min_interval_ms: 55_000,
            display_tick_ms: 20_000,
            retention_ms: 12 * 60 * MIN,
        },
    };

    {
        let shutdown = shutdown.clone();
        let frames = frames.clone();
        run_monitor(source, store, &clock, &params, &shutdown, |frame, _remaining| {
            assert!(frame.latest.is_some());
            if frames.fetch_add(1, Ordering::Relaxed) >= 7 {
                shutdown.store(true, Ordering::Relaxed);
            }
        })
        .expect("monitor run");
    }

    // Display ticks re-render between fetches: more frames than fetches.
    assert!(frames.load(Ordering::Relaxed) >= 7);
}
