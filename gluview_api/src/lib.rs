#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! LibreLinkUp ingestion for the glucose monitor.
//!
//! The vendor handshake is exactly three calls: login, connections (patient
//! id), graph (readings). Auth state is an immutable `AuthSession` value
//! threaded through the calls; a rejected token is re-authenticated at most
//! once per fetch under an explicit `RetryPolicy` budget.

pub mod auth;
pub mod client;
mod wire;

pub use auth::{AuthSession, Credentials, authenticate};
pub use client::{LibreSource, RetryPolicy, fetch_graph};

use gluview_traits::{GlucoseSource, Sample};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("credentials missing: set GLUVIEW_EMAIL and GLUVIEW_PASSWORD")]
    MissingCredentials,
    #[error("vendor API rejected the login: {0}")]
    LoginRejected(String),
    #[error("unauthorized (token expired or revoked)")]
    Unauthorized,
    #[error("vendor API returned status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Deterministic offline source: a smooth wave at five-minute spacing.
///
/// The first fetch emits a backlog so the chart starts populated; each later
/// fetch extends the series by one reading. Used by `--simulate` runs and
/// self-checks.
pub struct SimulatedSource {
    origin_ms: i64,
    interval_ms: i64,
    fetches: usize,
}

impl SimulatedSource {
    /// Number of readings emitted by the first fetch.
    const BACKLOG: usize = 12;

    pub fn new(origin_ms: i64) -> Self {
        Self {
            origin_ms,
            interval_ms: 5 * 60_000,
            fetches: 0,
        }
    }

    fn value_at(i: usize) -> u16 {
        (120.0 + 40.0 * (i as f64 / 6.0).sin()).round() as u16
    }
}

impl GlucoseSource for SimulatedSource {
    fn fetch_recent(
        &mut self,
    ) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        self.fetches += 1;
        let newest = Self::BACKLOG + self.fetches - 1;
        let oldest = newest.saturating_sub(Self::BACKLOG - 1);
        let out: Vec<Sample> = (oldest..=newest)
            .map(|i| {
                Sample::reading(
                    self.origin_ms + i as i64 * self.interval_ms,
                    Self::value_at(i),
                )
            })
            .collect();
        tracing::debug!(count = out.len(), "simulated fetch");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_fetches_overlap_and_extend() {
        let mut src = SimulatedSource::new(0);
        let first = src.fetch_recent().unwrap();
        let second = src.fetch_recent().unwrap();
        assert_eq!(first.len(), SimulatedSource::BACKLOG);
        assert_eq!(second.len(), SimulatedSource::BACKLOG);
        // One new reading per fetch, rest overlaps the previous window.
        assert_eq!(
            second.last().unwrap().timestamp_ms,
            first.last().unwrap().timestamp_ms + 5 * 60_000
        );
        assert!(second.iter().any(|s| s.timestamp_ms == first.last().unwrap().timestamp_ms));
    }

    #[test]
    fn simulated_values_stay_in_domain() {
        let mut src = SimulatedSource::new(0);
        for _ in 0..20 {
            for s in src.fetch_recent().unwrap() {
                assert!((60..=200).contains(&s.value));
            }
        }
    }
}
