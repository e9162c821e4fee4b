//! Forward projections from the tail of the actual series.
//!
//! Two variants share one OLS fit and differ only in the independent
//! variable: the standard projection treats the sample index as x (stable
//! while sampling is regular), the time-aware projection uses elapsed
//! minutes (correct when recent samples arrived sparsely). Both return an
//! empty vector for insufficient or degenerate input; that is a normal
//! state, not a failure.

use gluview_traits::Sample;

use crate::PipelineCfg;
use crate::util::MILLIS_PER_MIN;

/// Fallback inter-sample interval when the series is too short to measure.
const DEFAULT_INTERVAL_MS: i64 = 5 * MILLIS_PER_MIN;
/// Time-aware projection step bounds.
const MIN_STEP_MS: i64 = MILLIS_PER_MIN;
const MAX_STEP_MS: i64 = 15 * MILLIS_PER_MIN;
/// The time-aware analysis window spans at least this many median intervals.
const WINDOW_INTERVALS: i64 = 6;

/// Which regression produced a projected point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionKind {
    /// Index-based regression, assumes roughly uniform spacing.
    Standard,
    /// Elapsed-minutes regression, compensates for irregular spacing.
    TimeAware,
}

/// A predicted future value; derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedPoint {
    pub timestamp_ms: i64,
    /// Predicted mg/dL, clamped to the configured bounds.
    pub value: u16,
    pub kind: ProjectionKind,
}

struct LinearFit {
    slope: f64,
    intercept: f64,
}

impl LinearFit {
    #[inline]
    fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares over (x, y) pairs in f64 accumulators.
///
/// Returns None for fewer than two points, a zero denominator
/// (all x identical), or a non-finite result, so callers never see NaN.
fn fit_ols<I>(points: I) -> Option<LinearFit>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut n = 0.0f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_xy = 0.0f64;
    let mut sum_xx = 0.0f64;
    for (x, y) in points {
        n += 1.0;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    if n < 2.0 {
        return None;
    }
    let denom = n * sum_xx - sum_x * sum_x;
    if !denom.is_finite() || denom == 0.0 {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }
    Some(LinearFit { slope, intercept })
}

#[inline]
fn clamp_round(raw: f64, clamp_min: u16, clamp_max: u16) -> u16 {
    if !raw.is_finite() {
        return clamp_min;
    }
    raw.clamp(f64::from(clamp_min), f64::from(clamp_max)).round() as u16
}

fn last_real_timestamp(series: &[Sample]) -> Option<i64> {
    series
        .iter()
        .rev()
        .find(|s| !s.is_gap)
        .map(|s| s.timestamp_ms)
}

/// Median of adjacent timestamp deltas across the whole series, robust to a
/// couple of outlier gaps. Falls back to five minutes under two samples.
pub fn median_interval_ms(series: &[Sample]) -> i64 {
    let ts: Vec<i64> = series
        .iter()
        .filter(|s| !s.is_gap)
        .map(|s| s.timestamp_ms)
        .collect();
    if ts.len() < 2 {
        return DEFAULT_INTERVAL_MS;
    }
    let mut deltas: Vec<i64> = ts.windows(2).map(|w| w[1] - w[0]).collect();
    deltas.sort_unstable();
    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 0 {
        (deltas[mid - 1] + deltas[mid]) / 2
    } else {
        deltas[mid]
    }
}

/// Index-based projection over the configured lookback window.
///
/// Filters real samples to the last `lookback_ms` from wall-clock `now_ms`
/// (stale data may leave the window near-empty), fits value against sample
/// index, and extrapolates one index step per `step_ms` across the horizon.
/// Output timestamps continue from the last sample of the input series.
pub fn project_standard(series: &[Sample], now_ms: i64, cfg: &PipelineCfg) -> Vec<ProjectedPoint> {
    if cfg.step_ms <= 0 {
        return Vec::new();
    }
    let window_start = now_ms - cfg.lookback_ms;
    let recent: Vec<&Sample> = series
        .iter()
        .filter(|s| !s.is_gap && s.timestamp_ms >= window_start)
        .collect();
    if recent.len() < 2 {
        return Vec::new();
    }
    let Some(fit) = fit_ols(
        recent
            .iter()
            .enumerate()
            .map(|(i, s)| (i as f64, f64::from(s.value))),
    ) else {
        return Vec::new();
    };
    let Some(last_ts) = last_real_timestamp(series) else {
        return Vec::new();
    };

    let n = recent.len();
    let steps = (cfg.horizon_ms / cfg.step_ms).max(0) as usize;
    let mut out = Vec::with_capacity(steps);
    for i in 1..=steps {
        let raw = fit.at((n + i) as f64);
        out.push(ProjectedPoint {
            timestamp_ms: last_ts + i as i64 * cfg.step_ms,
            value: clamp_round(raw, cfg.clamp_min, cfg.clamp_max),
            kind: ProjectionKind::Standard,
        });
    }
    out
}

/// Time-aware projection.
///
/// The analysis window stretches to `WINDOW_INTERVALS` median intervals when
/// sampling has been sparse (never below the configured lookback), and the
/// regression runs on elapsed minutes so a burst of late samples cannot
/// misstate the real rate of change. The projection step follows the median
/// interval, clamped to [1 min, 15 min].
pub fn project_time_aware(series: &[Sample], now_ms: i64, cfg: &PipelineCfg) -> Vec<ProjectedPoint> {
    let median_ms = median_interval_ms(series);
    let window_ms = cfg.lookback_ms.max(WINDOW_INTERVALS * median_ms);
    let window_start = now_ms - window_ms;
    let recent: Vec<&Sample> = series
        .iter()
        .filter(|s| !s.is_gap && s.timestamp_ms >= window_start)
        .collect();
    if recent.len() < 2 {
        return Vec::new();
    }

    let base_ms = recent[0].timestamp_ms;
    let minutes_since_base = |ts: i64| (ts - base_ms) as f64 / MILLIS_PER_MIN as f64;
    let Some(fit) = fit_ols(
        recent
            .iter()
            .map(|s| (minutes_since_base(s.timestamp_ms), f64::from(s.value))),
    ) else {
        return Vec::new();
    };
    let Some(last_ts) = last_real_timestamp(series) else {
        return Vec::new();
    };

    let step_ms = median_ms.clamp(MIN_STEP_MS, MAX_STEP_MS);
    let steps = {
        let q = cfg.horizon_ms / step_ms;
        let r = cfg.horizon_ms % step_ms;
        if (r > 0 && step_ms > 0) || (r < 0 && step_ms < 0) {
            q + 1
        } else {
            q
        }
    }
    .max(0) as usize;
    let mut out = Vec::with_capacity(steps);
    for i in 1..=steps {
        let ts = last_ts + i as i64 * step_ms;
        let raw = fit.at(minutes_since_base(ts));
        out.push(ProjectedPoint {
            timestamp_ms: ts,
            value: clamp_round(raw, cfg.clamp_min, cfg.clamp_max),
            kind: ProjectionKind::TimeAware,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::minutes_ms;

    fn rising_series(count: usize, start_value: u16, step_value: u16) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                Sample::reading(
                    minutes_ms(5 * i as i64),
                    start_value + step_value * i as u16,
                )
            })
            .collect()
    }

    #[test]
    fn fit_ols_rejects_degenerate_x() {
        assert!(fit_ols([(1.0, 2.0), (1.0, 3.0), (1.0, 4.0)]).is_none());
        assert!(fit_ols([(1.0, 2.0)]).is_none());
        assert!(fit_ols(std::iter::empty()).is_none());
    }

    #[test]
    fn fit_ols_recovers_a_line() {
        let fit = fit_ols((0..5).map(|i| (i as f64, 3.0 * i as f64 + 7.0))).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-9);
        assert!((fit.intercept - 7.0).abs() < 1e-9);
    }

    #[test]
    fn median_interval_handles_outlier_gaps() {
        // Regular 5min spacing with one 60min outage: median stays 5min.
        let mut series = rising_series(5, 100, 1);
        let last = series.last().copied().unwrap();
        series.push(Sample::reading(last.timestamp_ms + minutes_ms(60), 120));
        series.push(Sample::reading(last.timestamp_ms + minutes_ms(65), 121));
        assert_eq!(median_interval_ms(&series), minutes_ms(5));
    }

    #[test]
    fn median_interval_falls_back_under_two_points() {
        assert_eq!(median_interval_ms(&[]), minutes_ms(5));
        assert_eq!(
            median_interval_ms(&[Sample::reading(0, 100)]),
            minutes_ms(5)
        );
    }

    #[test]
    fn standard_projection_needs_two_points() {
        let cfg = PipelineCfg::default();
        assert!(project_standard(&[], 0, &cfg).is_empty());
        assert!(project_standard(&[Sample::reading(0, 120)], minutes_ms(5), &cfg).is_empty());
    }

    #[test]
    fn standard_projection_extends_a_steady_rise() {
        // Ten samples at 5min intervals rising 3 mg/dL per sample: twelve
        // projected points continuing the line at ~120 + 3*(10+i).
        let cfg = PipelineCfg::default();
        let series = rising_series(10, 120, 3);
        let now = series.last().unwrap().timestamp_ms;
        let points = project_standard(&series, now, &cfg);
        assert_eq!(points.len(), 12);
        for (idx, p) in points.iter().enumerate() {
            let i = idx as i64 + 1;
            let expected = 120 + 3 * (10 + i);
            assert!(
                (i64::from(p.value) - expected).abs() <= 1,
                "point {i}: got {} want ~{expected}",
                p.value
            );
            assert_eq!(p.timestamp_ms, now + minutes_ms(5 * i));
            assert_eq!(p.kind, ProjectionKind::Standard);
        }
        let mut values: Vec<u16> = points.iter().map(|p| p.value).collect();
        let sorted = {
            let mut v = values.clone();
            v.sort_unstable();
            v
        };
        assert_eq!(values, sorted, "steady rise must project monotonically");
        values.dedup();
        assert!(values.len() > 1);
    }

    #[test]
    fn projections_clamp_to_bounds() {
        let cfg = PipelineCfg::default();
        // Steep rise blows past 400 within the horizon.
        let rising = rising_series(6, 300, 40);
        let now = rising.last().unwrap().timestamp_ms;
        let points = project_standard(&rising, now, &cfg);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.value <= 400));
        assert_eq!(points.last().unwrap().value, 400);

        // Steep fall bottoms out at the lower bound.
        let falling: Vec<Sample> = (0..6)
            .map(|i| Sample::reading(minutes_ms(5 * i), (200 - 40 * i) as u16))
            .collect();
        let now = falling.last().unwrap().timestamp_ms;
        let points = project_time_aware(&falling, now, &cfg);
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.value >= cfg.clamp_min));
        assert_eq!(points.last().unwrap().value, cfg.clamp_min);
    }

    #[test]
    fn stale_series_leaves_the_lookback_window_empty() {
        let cfg = PipelineCfg::default();
        let series = rising_series(10, 120, 3);
        // Two hours after the last sample nothing falls inside the window.
        let now = series.last().unwrap().timestamp_ms + minutes_ms(120);
        assert!(project_standard(&series, now, &cfg).is_empty());
    }

    #[test]
    fn time_aware_projection_respects_the_median_step() {
        let cfg = PipelineCfg::default();
        let series = rising_series(10, 120, 3);
        let now = series.last().unwrap().timestamp_ms;
        let points = project_time_aware(&series, now, &cfg);
        // 60min horizon at a 5min median step: ceil(60/5) = 12 points.
        assert_eq!(points.len(), 12);
        assert_eq!(points[0].timestamp_ms, now + minutes_ms(5));
        assert!(points.iter().all(|p| p.kind == ProjectionKind::TimeAware));
    }

    #[test]
    fn time_aware_tracks_true_rate_across_sparse_samples() {
        // 1 mg/dL per minute, but samples 10 minutes apart: the time-aware
        // fit must project ~+10 per 10-minute step.
        let cfg = PipelineCfg {
            lookback_ms: minutes_ms(120),
            ..PipelineCfg::default()
        };
        let series: Vec<Sample> = (0..5)
            .map(|i| Sample::reading(minutes_ms(10 * i), 100 + 10 * i as u16))
            .collect();
        let now = series.last().unwrap().timestamp_ms;
        let points = project_time_aware(&series, now, &cfg);
        assert!(!points.is_empty());
        // Step clamps the 10min median into range, staying at 10min.
        assert_eq!(points[0].timestamp_ms, now + minutes_ms(10));
        assert_eq!(i64::from(points[0].value), 150);
        assert_eq!(i64::from(points[1].value), 160);
    }

    #[test]
    fn identical_timestamps_are_degenerate_for_time_aware() {
        let cfg = PipelineCfg::default();
        let series = vec![
            Sample::reading(minutes_ms(10), 100),
            Sample::reading(minutes_ms(10), 100),
        ];
        // All x equal once mapped to elapsed minutes: soft empty, no NaN.
        assert!(project_time_aware(&series, minutes_ms(10), &cfg).is_empty());
    }
}
