use serde::{Deserialize, Serialize};

/// One glucose reading, keyed by its epoch-millisecond timestamp.
///
/// A sample is immutable once produced. Within a series the timestamp is the
/// identity used for de-duplication. Gap markers are synthetic entries that
/// denote a missing-data interval; they carry no real value and are never
/// persisted or plotted as actual readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
    /// Glucose in mg/dL (practical domain 0..=400).
    pub value: u16,
    /// Synthetic missing-data marker, not a real reading.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_gap: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Sample {
    /// A real reading.
    pub fn reading(timestamp_ms: i64, value: u16) -> Self {
        Self {
            timestamp_ms,
            value,
            is_gap: false,
        }
    }

    /// A synthetic gap marker at the given instant.
    pub fn gap(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            value: 0,
            is_gap: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_marker_carries_no_value() {
        let g = Sample::gap(1_000);
        assert!(g.is_gap);
        assert_eq!(g.value, 0);
    }

    #[test]
    fn serde_round_trip_omits_gap_flag_for_readings() {
        let s = Sample::reading(1_700_000_000_000, 123);
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("is_gap"));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
