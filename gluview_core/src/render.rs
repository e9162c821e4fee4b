//! Fusion of actual and projected series into render-ready points.
//!
//! The composed sequence is actual points first, then projections, each half
//! ascending by time. The last real sample carries its value duplicated into
//! both projection fields so the projected lines continue the actual line
//! without a visual jump.

use gluview_traits::Sample;

use crate::projector::ProjectedPoint;

/// One plottable instant; built fresh every cycle, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPoint {
    pub time_ms: i64,
    /// Real reading, absent on gap markers and projected points.
    pub actual: Option<u16>,
    /// Index-based projection value.
    pub standard: Option<u16>,
    /// Time-aware projection value.
    pub time_aware: Option<u16>,
    /// Marks a missing-data break; renders as a disconnected segment.
    pub is_gap_boundary: bool,
}

/// One render point per (gap-marked) sample.
///
/// Gap markers produce `actual = None` and must never be drawn as readings.
/// The chronologically last real sample is the join point: its value fills
/// both projection fields.
pub fn compose_actual(series: &[Sample]) -> Vec<RenderPoint> {
    let last_real_ts = series
        .iter()
        .rev()
        .find(|s| !s.is_gap)
        .map(|s| s.timestamp_ms);
    series
        .iter()
        .map(|s| {
            if s.is_gap {
                RenderPoint {
                    time_ms: s.timestamp_ms,
                    actual: None,
                    standard: None,
                    time_aware: None,
                    is_gap_boundary: true,
                }
            } else {
                let joins = Some(s.timestamp_ms) == last_real_ts;
                RenderPoint {
                    time_ms: s.timestamp_ms,
                    actual: Some(s.value),
                    standard: joins.then_some(s.value),
                    time_aware: joins.then_some(s.value),
                    is_gap_boundary: false,
                }
            }
        })
        .collect()
}

/// Zip the two projection lists by position up to the longer one.
///
/// The lists may use different step sizes, so the pairing is positional, not
/// by timestamp equality; the standard timestamp wins when both exist. A
/// list that ran out leaves its field `None`, so the line stops instead of
/// dropping to zero.
pub fn compose_projected(
    standard: &[ProjectedPoint],
    time_aware: &[ProjectedPoint],
) -> Vec<RenderPoint> {
    let len = standard.len().max(time_aware.len());
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let s = standard.get(i);
        let t = time_aware.get(i);
        let Some(time_ms) = s.map(|p| p.timestamp_ms).or_else(|| t.map(|p| p.timestamp_ms))
        else {
            continue;
        };
        out.push(RenderPoint {
            time_ms,
            actual: None,
            standard: s.map(|p| p.value),
            time_aware: t.map(|p| p.value),
            is_gap_boundary: false,
        });
    }
    out
}

/// Actual points followed by projected points.
pub fn compose(
    series: &[Sample],
    standard: &[ProjectedPoint],
    time_aware: &[ProjectedPoint],
) -> Vec<RenderPoint> {
    let mut out = compose_actual(series);
    out.extend(compose_projected(standard, time_aware));
    out
}

/// One render-ready snapshot per refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub points: Vec<RenderPoint>,
    /// Most recent real reading, if any.
    pub latest: Option<u16>,
    /// Timestamp of the actual→projected boundary.
    pub last_actual_ms: Option<i64>,
    /// True when the last fetch failed and the frame shows old data.
    pub stale: bool,
}

impl Frame {
    pub fn build(
        marked_series: &[Sample],
        standard: &[ProjectedPoint],
        time_aware: &[ProjectedPoint],
        stale: bool,
    ) -> Self {
        let last_real = marked_series.iter().rev().find(|s| !s.is_gap);
        Self {
            points: compose(marked_series, standard, time_aware),
            latest: last_real.map(|s| s.value),
            last_actual_ms: last_real.map(|s| s.timestamp_ms),
            stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::ProjectionKind;
    use crate::util::minutes_ms;

    fn projected(kind: ProjectionKind, points: &[(i64, u16)]) -> Vec<ProjectedPoint> {
        points
            .iter()
            .map(|&(min, value)| ProjectedPoint {
                timestamp_ms: minutes_ms(min),
                value,
                kind,
            })
            .collect()
    }

    #[test]
    fn smooth_join_on_the_last_real_sample() {
        let series = vec![
            Sample::reading(0, 100),
            Sample::reading(minutes_ms(5), 110),
        ];
        let points = compose_actual(&series);
        assert_eq!(points[0].standard, None);
        assert_eq!(points[0].time_aware, None);
        let last = points.last().unwrap();
        assert_eq!(last.actual, Some(110));
        assert_eq!(last.standard, Some(110));
        assert_eq!(last.time_aware, Some(110));
    }

    #[test]
    fn gap_markers_never_plot_as_actual() {
        let series = vec![
            Sample::reading(0, 100),
            Sample::gap(minutes_ms(15)),
            Sample::reading(minutes_ms(40), 120),
        ];
        let points = compose_actual(&series);
        assert!(points[1].is_gap_boundary);
        assert_eq!(points[1].actual, None);
        // The join lands on the last *real* sample, not the gap marker.
        assert_eq!(points[2].standard, Some(120));
    }

    #[test]
    fn trailing_gap_marker_does_not_steal_the_join() {
        let series = vec![Sample::reading(0, 100), Sample::gap(minutes_ms(15))];
        let points = compose_actual(&series);
        assert_eq!(points[0].standard, Some(100));
        assert_eq!(points[1].standard, None);
    }

    #[test]
    fn longer_projection_defines_the_timeline() {
        let standard = projected(ProjectionKind::Standard, &[(5, 120), (10, 125)]);
        let time_aware = projected(
            ProjectionKind::TimeAware,
            &[(6, 121), (12, 126), (18, 131)],
        );
        let points = compose_projected(&standard, &time_aware);
        assert_eq!(points.len(), 3);
        // Standard's timestamp wins while it lasts, then time-aware takes over.
        assert_eq!(points[0].time_ms, minutes_ms(5));
        assert_eq!(points[2].time_ms, minutes_ms(18));
        assert_eq!(points[2].standard, None, "exhausted list stops, not zero");
        assert_eq!(points[2].time_aware, Some(131));
    }

    #[test]
    fn compose_orders_actual_before_projected() {
        let series = vec![Sample::reading(0, 100), Sample::reading(minutes_ms(5), 104)];
        let standard = projected(ProjectionKind::Standard, &[(10, 108)]);
        let points = compose(&series, &standard, &[]);
        assert_eq!(points.len(), 3);
        assert!(points[1].actual.is_some());
        assert!(points[2].actual.is_none());
        assert!(points.windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
    }

    #[test]
    fn frame_reports_latest_and_boundary() {
        let series = vec![
            Sample::reading(0, 100),
            Sample::reading(minutes_ms(5), 111),
            Sample::gap(minutes_ms(20)),
        ];
        let frame = Frame::build(&series, &[], &[], true);
        assert_eq!(frame.latest, Some(111));
        assert_eq!(frame.last_actual_ms, Some(minutes_ms(5)));
        assert!(frame.stale);
    }

    #[test]
    fn empty_frame_is_well_formed() {
        let frame = Frame::build(&[], &[], &[], false);
        assert!(frame.points.is_empty());
        assert_eq!(frame.latest, None);
        assert_eq!(frame.last_actual_ms, None);
    }
}
