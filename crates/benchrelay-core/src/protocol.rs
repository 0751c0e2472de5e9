//! Wire protocol shared by the reporting client and the ingestion endpoints.
//!
//! The collector accepts form-encoded status reports and multipart result
//! bundles. Field names (several of which contain spaces) and the timestamp
//! format are fixed contracts; both sides import them from here instead of
//! repeating string literals.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::identity::RunIdentity;

/// Timestamp format used on the wire (`yyyy-MM-dd HH:mm`).
pub const WIRE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Name of the multipart file part carrying a result bundle.
pub const RESULT_FILE_FIELD: &str = "BenchmarkResults";

/// File name the runner gives a packaged result archive.
pub const RESULT_ARCHIVE_NAME: &str = "BenchmarkResults.zip";

/// Root directory the collector persists result bundles under.
pub const RESULTS_ROOT: &str = "BenchmarkResults";

/// Collector route receiving status reports.
pub const STATUS_PATH: &str = "/status";

/// Collector route receiving result bundles.
pub const RESULT_PATH: &str = "/result";

/// Form field names for status reports and result bundles.
pub mod fields {
    /// Shared-secret credential.
    pub const PASSWORD: &str = "password";
    /// Worker instance name.
    pub const INSTANCE_NAME: &str = "instance name";
    /// Benchmark project name.
    pub const BENCHMARK_PROJECT: &str = "benchmark project";
    /// Raw console line (or failure text) the report was derived from.
    pub const MESSAGE: &str = "message";
    /// `"true"` when the report carries a failure, `"false"` otherwise.
    pub const IS_ERROR: &str = "is error";
    /// Benchmarks still to run.
    pub const REMAINING: &str = "remaining benchmarks";
    /// Total benchmarks discovered for this run.
    pub const TOTAL: &str = "total benchmark count";
    /// Estimated finish timestamp, or empty when no ETA is known yet.
    pub const ESTIMATED_FINISH: &str = "estimated finish";
    /// Worker-side clock reading at report time.
    pub const CURRENT_TIME: &str = "current time";
}

/// One status report, as posted form-encoded to the collector.
///
/// Constructed by the reporter from a [`RunIdentity`] plus the classified
/// event fields; consumed once by the collector and not retained.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Shared-secret credential.
    #[serde(rename = "password")]
    pub password: String,
    /// Worker instance name.
    #[serde(rename = "instance name")]
    pub instance_name: String,
    /// Benchmark project name.
    #[serde(rename = "benchmark project")]
    pub project_name: String,
    /// Raw console line the report was derived from.
    #[serde(rename = "message")]
    pub message: String,
    /// Whether this report carries a failure.
    #[serde(rename = "is error")]
    pub is_error: bool,
    /// Benchmarks still to run. Absent on failure reports.
    #[serde(rename = "remaining benchmarks", skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// Total benchmarks discovered. Absent on failure reports.
    #[serde(rename = "total benchmark count", skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    /// Estimated finish timestamp, empty string when no ETA is known yet.
    /// Absent on failure reports.
    #[serde(rename = "estimated finish", skip_serializing_if = "Option::is_none")]
    pub estimated_finish: Option<String>,
    /// Worker clock reading at report time. Absent on failure reports.
    #[serde(rename = "current time", skip_serializing_if = "Option::is_none")]
    pub current_time: Option<String>,
}

impl StatusReport {
    /// Builds a progress report for the given identity.
    ///
    /// `estimated_finish` maps to the empty string when no ETA is known yet.
    #[must_use]
    pub fn progress(
        identity: &RunIdentity,
        credential: &str,
        message: impl Into<String>,
        remaining: u32,
        total: u32,
        estimated_finish: Option<NaiveDateTime>,
        current_time: NaiveDateTime,
    ) -> Self {
        Self {
            password: credential.to_string(),
            instance_name: identity.instance_name().to_string(),
            project_name: identity.project_name().to_string(),
            message: message.into(),
            is_error: false,
            remaining: Some(remaining),
            total: Some(total),
            estimated_finish: Some(
                estimated_finish.map_or_else(String::new, |ts| ts.format(WIRE_TIME_FORMAT).to_string()),
            ),
            current_time: Some(current_time.format(WIRE_TIME_FORMAT).to_string()),
        }
    }

    /// Builds a failure report for the given identity.
    ///
    /// Failure reports carry no numeric fields; the message is recorded
    /// by the collector as-is.
    #[must_use]
    pub fn failure(identity: &RunIdentity, credential: &str, message: impl Into<String>) -> Self {
        Self {
            password: credential.to_string(),
            instance_name: identity.instance_name().to_string(),
            project_name: identity.project_name().to_string(),
            message: message.into(),
            is_error: true,
            remaining: None,
            total: None,
            estimated_finish: None,
            current_time: None,
        }
    }
}
