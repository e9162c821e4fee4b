//! Serde shapes for the vendor API plus sample parsing.
//!
//! Graph entries with an unparsable timestamp or an out-of-range value are
//! skipped with a warning; one bad entry never aborts a fetch.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use gluview_traits::Sample;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "authTicket")]
    auth_ticket: Option<AuthTicket>,
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct AuthTicket {
    token: String,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

impl LoginResponse {
    pub(crate) fn token(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.auth_ticket.as_ref())
            .map(|t| t.token.clone())
    }

    pub(crate) fn account_id(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|d| d.user.as_ref())
            .map(|u| u.id.clone())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectionsResponse {
    data: Option<Vec<Connection>>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(rename = "patientId")]
    patient_id: String,
}

impl ConnectionsResponse {
    pub(crate) fn first_patient_id(&self) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|v| v.first())
            .map(|c| c.patient_id.clone())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse {
    data: Option<GraphData>,
}

#[derive(Debug, Deserialize)]
struct GraphData {
    #[serde(rename = "graphData", default)]
    graph_data: Vec<GraphEntry>,
    connection: Option<ConnectionInfo>,
}

#[derive(Debug, Deserialize)]
struct ConnectionInfo {
    #[serde(rename = "glucoseMeasurement")]
    glucose_measurement: Option<GraphEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphEntry {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Value")]
    value: f64,
}

/// The vendor formats timestamps like `1/31/2024 9:05:06 AM` in the
/// account's local timezone; entries we appended ourselves round-trip as
/// RFC 3339.
const VENDOR_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    let naive = NaiveDateTime::parse_from_str(raw, VENDOR_TIMESTAMP_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

impl GraphEntry {
    /// Upper acceptance bound; the practical domain is 0..=400 but sensor
    /// spikes above it are still real readings.
    const MAX_ACCEPTED_MGDL: f64 = 1_000.0;

    pub(crate) fn to_sample(&self) -> Option<Sample> {
        let timestamp_ms = parse_timestamp_ms(&self.timestamp)?;
        if !self.value.is_finite() || !(0.0..=Self::MAX_ACCEPTED_MGDL).contains(&self.value) {
            return None;
        }
        Some(Sample::reading(timestamp_ms, self.value.round() as u16))
    }
}

impl GraphResponse {
    /// Graph readings in arrival order, malformed entries skipped.
    pub(crate) fn samples(&self) -> Vec<Sample> {
        let Some(data) = self.data.as_ref() else {
            return Vec::new();
        };
        let mut skipped = 0usize;
        let mut out = Vec::with_capacity(data.graph_data.len() + 1);
        for entry in &data.graph_data {
            match entry.to_sample() {
                Some(s) => out.push(s),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "dropped malformed graph entries");
        }

        // The connection's current measurement is usually newer than the
        // last graph point; append it so the chart tip is live.
        if let Some(current) = data
            .connection
            .as_ref()
            .and_then(|c| c.glucose_measurement.as_ref())
            .and_then(GraphEntry::to_sample)
        {
            let newer = out.last().is_none_or(|last| current.timestamp_ms > last.timestamp_ms);
            if newer {
                tracing::debug!(value = current.value, "appended current measurement");
                out.push(current);
            }
        }
        out
    }
}
