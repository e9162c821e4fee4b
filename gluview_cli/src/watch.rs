//! Command drivers: source/store assembly and the watch/fetch/self-check
//! entry points.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use gluview_api::{Credentials, LibreSource, SimulatedSource};
use gluview_config::Config;
use gluview_core::error::MonitorError;
use gluview_core::mocks::MemoryStore;
use gluview_core::runner::{self, MonitorParams};
use gluview_core::{Frame, RenderPoint};
use gluview_store::JsonHistoryStore;
use gluview_traits::{Clock, GlucoseSource, HistoryStore, WallClock};
use gluview_ui::{ChartLayout, render_frame};

const DEFAULT_HISTORY_FILE: &str = "gluview_history.json";

fn make_source(
    cfg: &Config,
    simulate: bool,
    now_ms: i64,
) -> eyre::Result<Box<dyn GlucoseSource>> {
    if simulate {
        // Anchor the waveform so its backlog ends near "now".
        let origin_ms = now_ms - 12 * 5 * 60_000;
        return Ok(Box::new(SimulatedSource::new(origin_ms)));
    }
    let credentials = Credentials::from_env()?;
    Ok(Box::new(LibreSource::new(cfg.api.clone(), credentials)))
}

fn make_store(cfg: &Config) -> JsonHistoryStore {
    let path = cfg
        .storage
        .history_path
        .clone()
        .unwrap_or_else(|| DEFAULT_HISTORY_FILE.to_string());
    JsonHistoryStore::new(path)
}

fn monitor_params(cfg: &Config, interval_override: Option<u64>) -> MonitorParams {
    let mut params = MonitorParams {
        pipeline: (&cfg.pipeline).into(),
        refresh: (&cfg.refresh).into(),
    };
    if let Some(ms) = interval_override {
        params.refresh.interval_ms = ms;
        params.refresh.min_interval_ms = params.refresh.min_interval_ms.min(ms);
    }
    params
}

fn print_frame(frame: &Frame, layout: &ChartLayout, remaining: Duration, interval: Duration, clear: bool) {
    let lines = render_frame(frame, layout, remaining, interval);
    if clear {
        // ANSI clear + home keeps the live chart in place.
        print!("\x1b[2J\x1b[H");
    }
    println!("{}", lines.join("\n"));
}

/// Live chart loop; `once` runs a single strict cycle instead.
pub fn run_watch(
    cfg: &Config,
    simulate: bool,
    once: bool,
    interval_override: Option<u64>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let clock = WallClock::new();
    let params = monitor_params(cfg, interval_override);
    let layout = ChartLayout::from(&cfg.chart);
    let interval = Duration::from_millis(params.refresh.interval_ms);
    let mut source = make_source(cfg, simulate, clock.now_ms())?;
    let mut store = make_store(cfg);

    if once {
        let outcome = run_one_cycle(&mut source, &mut store, &params, clock.now_ms())?;
        print_frame(&outcome.frame, &layout, Duration::ZERO, interval, false);
        return Ok(());
    }

    runner::run_monitor(source, store, &clock, &params, &shutdown, |frame, remaining| {
        print_frame(frame, &layout, remaining, interval, true);
    })
}

fn run_one_cycle<S: GlucoseSource, H: HistoryStore>(
    source: &mut S,
    store: &mut H,
    params: &MonitorParams,
    now_ms: i64,
) -> eyre::Result<runner::CycleOutcome> {
    let history = store
        .load()
        .map_err(|e| eyre::Report::new(MonitorError::Storage(e.to_string())))
        .wrap_err("loading history")?;
    runner::run_cycle(
        source,
        store,
        history,
        &params.pipeline,
        params.refresh.retention_ms,
        now_ms,
    )
}

fn point_json(p: &RenderPoint) -> serde_json::Value {
    serde_json::json!({
        "time_ms": p.time_ms,
        "actual": p.actual,
        "standard": p.standard,
        "time_aware": p.time_aware,
        "gap": p.is_gap_boundary,
    })
}

/// One strict refresh cycle, printed as chart or JSON.
pub fn run_fetch(cfg: &Config, simulate: bool, json: bool) -> eyre::Result<()> {
    let clock = WallClock::new();
    let params = monitor_params(cfg, None);
    let mut source = make_source(cfg, simulate, clock.now_ms())?;
    let mut store = make_store(cfg);
    let outcome = run_one_cycle(&mut source, &mut store, &params, clock.now_ms())?;

    if json {
        let frame = &outcome.frame;
        let readings = frame.points.iter().filter(|p| p.actual.is_some()).count();
        let obj = serde_json::json!({
            "latest": frame.latest,
            "stale": frame.stale,
            "readings": readings,
            "last_actual_ms": frame.last_actual_ms,
            "points": frame.points.iter().map(point_json).collect::<Vec<_>>(),
        });
        println!("{obj}");
    } else {
        let layout = ChartLayout::from(&cfg.chart);
        let interval = Duration::from_millis(params.refresh.interval_ms);
        print_frame(&outcome.frame, &layout, Duration::ZERO, interval, false);
    }
    Ok(())
}

/// Offline sanity check: config is already validated by the caller; this
/// exercises the pipeline against the simulated source and reports
/// credential/storage readiness.
pub fn run_self_check(cfg: &Config) -> eyre::Result<()> {
    let clock = WallClock::new();
    let params = monitor_params(cfg, None);

    let mut source = SimulatedSource::new(clock.now_ms() - 60 * 60_000);
    let mut store = MemoryStore::default();
    let outcome = runner::run_cycle(
        &mut source,
        &mut store,
        Vec::new(),
        &params.pipeline,
        params.refresh.retention_ms,
        clock.now_ms(),
    )
    .wrap_err("simulated pipeline cycle")?;
    if outcome.frame.points.is_empty() {
        eyre::bail!("simulated cycle produced an empty frame");
    }
    println!("pipeline: ok ({} readings)", outcome.history.len());

    match Credentials::from_env() {
        Ok(_) => println!("credentials: present"),
        Err(_) => println!("credentials: missing (set GLUVIEW_EMAIL / GLUVIEW_PASSWORD)"),
    }

    let mut file_store = make_store(cfg);
    let history = file_store
        .load()
        .map_err(|e| eyre::Report::new(MonitorError::Storage(e.to_string())))
        .wrap_err("reading history file")?;
    println!(
        "storage: ok ({} stored readings at {})",
        history.len(),
        file_store.path().display()
    );

    println!("self-check passed");
    Ok(())
}
