//! Sample-series continuity operations.
//!
//! Upstream fetches arrive at irregular intervals, overlap previous windows,
//! and repeat points. These pure functions hide that behind a deduplicated,
//! gap-trimmed, capped series. Gap markers are inserted only by `mark_gaps`
//! for rendering; persisted history holds real readings exclusively.

use std::collections::HashSet;

use gluview_traits::Sample;

/// Merge incoming samples into existing history.
///
/// The timestamp is the identity key: an incoming sample whose timestamp is
/// already present is dropped (the stored copy wins). Synthetic gap markers
/// never enter history. The result is sorted ascending with unique
/// timestamps; merging into empty history degenerates to sorting the
/// incoming batch.
pub fn merge(existing: &[Sample], incoming: &[Sample]) -> Vec<Sample> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut out: Vec<Sample> = Vec::with_capacity(existing.len() + incoming.len());
    for s in existing.iter().chain(incoming.iter()) {
        if s.is_gap {
            continue;
        }
        if seen.insert(s.timestamp_ms) {
            out.push(*s);
        }
    }
    out.sort_by_key(|s| s.timestamp_ms);
    out
}

/// Drop all samples strictly older than `cutoff_ms`.
pub fn trim_to_recent_window(series: &[Sample], cutoff_ms: i64) -> Vec<Sample> {
    series
        .iter()
        .copied()
        .filter(|s| s.timestamp_ms >= cutoff_ms)
        .collect()
}

/// Discard a long-dead older history segment.
///
/// Scans from the newest sample backward. At the first adjacent gap larger
/// than `gap_threshold_ms`, everything older than the near side of that gap
/// is discarded, so a disconnected segment never lingers as phantom isolated
/// dots far in the past. Expects an ascending series; returns oldest→newest.
pub fn drop_stale_tail(series: &[Sample], gap_threshold_ms: i64) -> Vec<Sample> {
    debug_assert!(series.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    if series.len() < 2 {
        return series.to_vec();
    }
    let mut start = 0;
    for i in (1..series.len()).rev() {
        let gap = series[i]
            .timestamp_ms
            .saturating_sub(series[i - 1].timestamp_ms);
        if gap > gap_threshold_ms {
            // Keep the sample just before the break; drop the older remainder.
            start = i - 1;
            break;
        }
    }
    series[start..].to_vec()
}

/// Keep only the most recent `max_count` samples.
pub fn cap(series: &[Sample], max_count: usize) -> Vec<Sample> {
    if series.len() <= max_count {
        return series.to_vec();
    }
    series[series.len() - max_count..].to_vec()
}

/// Insert synthetic gap markers between real samples spaced further apart
/// than `gap_factor * expected_interval_ms`. The marker sits one expected
/// interval after the near sample and renders as a broken line segment.
pub fn mark_gaps(series: &[Sample], expected_interval_ms: i64, gap_factor: f64) -> Vec<Sample> {
    if series.len() < 2 {
        return series.to_vec();
    }
    let threshold_ms = (expected_interval_ms as f64 * gap_factor) as i64;
    let mut out = Vec::with_capacity(series.len() + 2);
    for (i, s) in series.iter().enumerate() {
        out.push(*s);
        if let Some(next) = series.get(i + 1) {
            let gap = next.timestamp_ms.saturating_sub(s.timestamp_ms);
            if gap > threshold_ms {
                out.push(Sample::gap(s.timestamp_ms + expected_interval_ms));
            }
        }
    }
    out
}
