//! `POST /status` - ingest one status report.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::Deserialize;

use benchrelay_core::observability::ingest_span;
use benchrelay_core::protocol::WIRE_TIME_FORMAT;

use crate::error::{ApiError, ApiResult};
use crate::progress::ProgressKey;
use crate::server::AppState;

/// Form fields of one status report. Everything arrives as text; numeric
/// and timestamp fields are validated explicitly so each failure yields a
/// distinct client error.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    /// Shared-secret credential.
    #[serde(rename = "password", default)]
    pub password: String,
    /// Worker instance name.
    #[serde(rename = "instance name", default)]
    pub instance_name: String,
    /// Benchmark project name.
    #[serde(rename = "benchmark project", default)]
    pub project_name: String,
    /// Raw console line the report was derived from.
    #[serde(rename = "message", default)]
    pub message: String,
    /// `"true"` when the report carries a failure.
    #[serde(rename = "is error", default)]
    pub is_error: String,
    /// Benchmarks still to run.
    #[serde(rename = "remaining benchmarks")]
    pub remaining: Option<String>,
    /// Total benchmarks discovered.
    #[serde(rename = "total benchmark count")]
    pub total: Option<String>,
    /// Estimated finish timestamp, or empty when no ETA is known.
    #[serde(rename = "estimated finish")]
    pub estimated_finish: Option<String>,
    /// Worker clock reading at report time.
    #[serde(rename = "current time")]
    pub current_time: Option<String>,
}

/// Handles one status report.
pub async fn post_status(
    State(state): State<Arc<AppState>>,
    form: Result<Form<StatusForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form.map_err(|_| {
        tracing::debug!("received status request with invalid media type");
        ApiError::bad_request("Unsupported Media Type")
    })?;

    if !state.auth.verify(&form.password) {
        tracing::debug!("received unauthorized status request");
        return Err(ApiError::unauthorized("invalid credential"));
    }

    let span = ingest_span("status", &form.instance_name, &form.project_name);
    let _guard = span.enter();

    // Anything other than an explicit "false" is treated as a failure
    // report; failure reports carry no numeric fields.
    if form.is_error == "false" {
        ingest_progress(&state, &form)?;
    } else {
        tracing::warn!(
            instance = %form.instance_name,
            project = %form.project_name,
            "worker reported failure: {}",
            form.message
        );
    }

    Ok(StatusCode::OK)
}

fn ingest_progress(state: &AppState, form: &StatusForm) -> ApiResult<()> {
    let remaining: u32 = parse_count(form.remaining.as_deref(), "remaining benchmarks")?;
    let total: u32 = parse_count(form.total.as_deref(), "total benchmark count")?;
    if remaining > total {
        return Err(ApiError::bad_request(
            "\"remaining benchmarks\" exceeds \"total benchmark count\".",
        ));
    }

    let estimated_finish = match form.estimated_finish.as_deref().unwrap_or("") {
        "" => None,
        raw => Some(parse_wire_time(raw, "estimated finish")?),
    };
    let current_time = parse_wire_time(
        form.current_time.as_deref().unwrap_or(""),
        "current time",
    )?;
    let time_remaining = estimated_finish.map(|eta| eta - current_time);

    tracing::info!(
        "instance {} running {}: completed {}/{}{}",
        form.instance_name,
        form.project_name,
        total - remaining,
        total,
        estimated_finish.map_or_else(String::new, |eta| format!(
            " estimated finish at {}",
            eta.format(WIRE_TIME_FORMAT)
        )),
    );

    state.progress.upsert(
        ProgressKey::new(&form.instance_name, &form.project_name),
        remaining,
        total,
        estimated_finish,
        time_remaining,
    );
    Ok(())
}

fn parse_count(raw: Option<&str>, field: &str) -> ApiResult<u32> {
    raw.unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid \"{field}\" provided.")))
}

fn parse_wire_time(raw: &str, field: &str) -> ApiResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, WIRE_TIME_FORMAT).map_err(|_| {
        ApiError::bad_request(format!(
            "Invalid \"{field}\" provided. (format is yyyy-MM-dd HH:mm)"
        ))
    })
}
