//! HTTP API handlers.

use axum::{http::Uri, Json};
use chrono::{DateTime, Duration, Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::extract::{Params, Payload};
use crate::analysis::{self, Summary};
use crate::dates::{self, DateReport};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::process::{self, MemoryUsage};

/// Greeting returned by the root endpoint.
pub const GREETING: &str = "SBOM Example Application is running!";
/// Framework label reported by the root endpoint.
pub const FRAMEWORK: &str = "Axum";
/// Number of records served by `/data`.
pub const SAMPLE_SIZE: u32 = 10;

/// Root status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Greeting text.
    pub message: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Local time of the request.
    pub timestamp: String,
    /// Web framework label.
    pub framework: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "OK".
    pub status: &'static str,
    /// Seconds since process start.
    pub uptime: f64,
    /// Memory usage snapshot.
    pub memory: MemoryUsage,
}

/// One synthetic record.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    /// Sequential id starting at 1.
    pub id: u32,
    /// Random value in [0, 100].
    pub value: u8,
    /// Human label, `Item {id}`.
    pub label: String,
    /// Now minus `id` days.
    pub timestamp: String,
}

/// `/data` response.
#[derive(Debug, Serialize)]
pub struct SampleData {
    /// The records.
    pub data: Vec<SampleRecord>,
    /// Number of records.
    pub count: usize,
}

/// `/utils/date` query parameters.
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Moment-style pattern.
    pub format: Option<String>,
}

/// Build `SAMPLE_SIZE` records relative to `now`.
pub fn sample_records<R: Rng>(now: DateTime<Local>, rng: &mut R) -> Vec<SampleRecord> {
    (1..=SAMPLE_SIZE)
        .map(|id| SampleRecord {
            id,
            value: rng.gen_range(0..=100),
            label: format!("Item {}", id),
            timestamp: dates::local_timestamp(&(now - Duration::days(i64::from(id)))),
        })
        .collect()
}

/// Root handler - greeting and version.
pub async fn index() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: GREETING,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: dates::local_timestamp(&Local::now()),
        framework: FRAMEWORK,
    })
}

/// Health check handler - always returns 200.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        uptime: process::uptime(),
        memory: process::memory_usage(),
    })
}

/// Sample data handler.
pub async fn data() -> Json<SampleData> {
    let data = sample_records(Local::now(), &mut rand::thread_rng());
    let count = data.len();
    Json(SampleData { data, count })
}

/// Analysis handler - summary statistics over `numbers`.
pub async fn analyze(Payload(body): Payload) -> Result<Json<Summary>> {
    let summary = analysis::analyze(&body).inspect_err(|e| {
        metrics::inc_analyze_rejected();
        debug!(error = %e, "rejected analysis input");
    })?;

    Ok(Json(summary))
}

/// Date utility handler.
pub async fn date(Params(query): Params<DateQuery>) -> Json<DateReport> {
    let pattern = query.format.as_deref().unwrap_or(dates::DEFAULT_FORMAT);
    Json(DateReport::at(Utc::now(), pattern))
}

/// Fallback for unmatched method/path pairs.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound {
        path: uri.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_records_are_sequential_and_bounded() {
        let now = Local::now();
        let records = sample_records(now, &mut rand::thread_rng());

        assert_eq!(records.len(), SAMPLE_SIZE as usize);
        for (index, record) in records.iter().enumerate() {
            assert_eq!(record.id as usize, index + 1);
            assert!(record.value <= 100);
            assert_eq!(record.label, format!("Item {}", record.id));
        }
    }

    #[test]
    fn sample_timestamps_step_back_one_day() {
        let now = Local::now();
        let records = sample_records(now, &mut rand::thread_rng());

        let first = DateTime::parse_from_rfc3339(&records[0].timestamp).unwrap();
        let last = DateTime::parse_from_rfc3339(&records[9].timestamp).unwrap();
        assert_eq!((now.fixed_offset() - first).num_days(), 1);
        assert_eq!((first - last).num_days(), 9);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(response) = health().await;
        assert_eq!(response.status, "OK");
        assert!(response.uptime >= 0.0);
    }

    #[tokio::test]
    async fn not_found_echoes_path() {
        let uri: Uri = "/nope?x=1".parse().unwrap();
        match not_found(uri).await {
            AppError::NotFound { path } => assert_eq!(path, "/nope"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
