//! `POST /result` - ingest one uploaded result bundle.

use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt as _;

use benchrelay_core::protocol::{RESULT_ARCHIVE_NAME, RESULT_FILE_FIELD, fields};

use crate::error::{ApiError, ApiResult};
use crate::progress::ProgressKey;
use crate::server::AppState;

/// Handles one result bundle upload.
///
/// The file part is streamed to a scratch file in the storage root while
/// the remaining parts arrive; only after the credential and fields check
/// out is it moved to its collision-free destination. An early rejection
/// drops the scratch file.
pub async fn post_result(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<StatusCode> {
    let mut multipart = multipart.map_err(|_| {
        tracing::debug!("received result request with invalid media type");
        ApiError::bad_request("Unsupported Media Type")
    })?;

    let mut password = String::new();
    let mut instance = String::new();
    let mut project = String::new();
    let mut upload: Option<(String, NamedTempFile, u64)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart payload"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            fields::PASSWORD => password = field_text(field).await?,
            fields::INSTANCE_NAME => instance = field_text(field).await?,
            fields::BENCHMARK_PROJECT => project = field_text(field).await?,
            RESULT_FILE_FIELD => upload = Some(spool_file(&state, field).await?),
            _ => {
                // Unknown parts are drained and ignored.
                let _ = field.bytes().await;
            }
        }
    }

    if !state.auth.verify(&password) {
        tracing::debug!("received unauthorized result request");
        return Err(ApiError::unauthorized("invalid credential"));
    }

    let Some((file_name, scratch, size)) = upload else {
        tracing::debug!("received result request with missing file");
        return Err(ApiError::bad_request("Missing result file"));
    };

    validate_name(&instance, fields::INSTANCE_NAME)?;
    validate_name(&project, fields::BENCHMARK_PROJECT)?;

    let stored = state
        .store
        .persist(&instance, &project, &file_name, scratch)
        .await
        .map_err(|err| ApiError::internal(format!("failed to store result bundle: {err}")))?;

    tracing::info!(
        instance = %instance,
        project = %project,
        size_bytes = size,
        "received benchmark results, saved under {}",
        stored.display()
    );

    let notified = state
        .notifier
        .notify(
            &format!("Instance {instance} finished."),
            &format!(
                "{instance} finished project {project}. Results are saved under {}.",
                stored.display()
            ),
        )
        .await;
    if !notified {
        tracing::warn!(
            instance = %instance,
            project = %project,
            "notification failed while logging received result"
        );
    }

    state
        .progress
        .mark_uploaded(&ProgressKey::new(instance, project));

    Ok(StatusCode::OK)
}

async fn field_text(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart payload"))
}

/// Streams the file part into a scratch file, returning its client-supplied
/// file name (or the conventional archive name), the scratch handle, and
/// the byte count.
async fn spool_file(state: &AppState, mut field: Field<'_>) -> ApiResult<(String, NamedTempFile, u64)> {
    // Only the final path component of the client-supplied name is kept,
    // so an upload can never escape its storage partition.
    let file_name = field
        .file_name()
        .and_then(|name| std::path::Path::new(name).file_name())
        .map_or_else(
            || RESULT_ARCHIVE_NAME.to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

    let scratch = state
        .store
        .scratch_file()
        .map_err(|err| ApiError::internal(format!("failed to open scratch file: {err}")))?;
    let reopened = scratch
        .reopen()
        .map_err(|err| ApiError::internal(format!("failed to open scratch file: {err}")))?;
    let mut writer = tokio::fs::File::from_std(reopened);

    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart payload"))?
    {
        size += chunk.len() as u64;
        writer
            .write_all(&chunk)
            .await
            .map_err(|err| ApiError::internal(format!("failed to spool upload: {err}")))?;
    }
    writer
        .flush()
        .await
        .map_err(|err| ApiError::internal(format!("failed to spool upload: {err}")))?;

    Ok((file_name, scratch, size))
}

/// Rejects names that are empty or would escape the storage partition.
fn validate_name(value: &str, field: &str) -> ApiResult<()> {
    let escapes = value.contains('/') || value.contains('\\') || value == "." || value == "..";
    if value.is_empty() || escapes {
        return Err(ApiError::bad_request(format!(
            "Invalid \"{field}\" provided."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_rejects_traversal() {
        assert!(validate_name("worker-1", "instance name").is_ok());
        assert!(validate_name("", "instance name").is_err());
        assert!(validate_name("..", "instance name").is_err());
        assert!(validate_name("a/b", "instance name").is_err());
        assert!(validate_name("a\\b", "instance name").is_err());
    }
}
