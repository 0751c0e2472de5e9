//! Ingestion routes.
//!
//! Two operations, both authenticated with the shared secret:
//!
//! - `POST /status` - form-encoded progress/failure report
//! - `POST /result` - multipart result bundle upload
//!
//! Malformed content types, bad credentials, and unparsable fields each map
//! to a distinct client error; nothing a worker sends can fault the
//! collector.

pub mod result;
pub mod status;

use std::sync::Arc;

use axum::Router;
use axum::routing::post;

use benchrelay_core::protocol::{RESULT_PATH, STATUS_PATH};

use crate::server::AppState;

/// Builds the router for the ingestion operations.
pub fn ingestion_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(STATUS_PATH, post(status::post_status))
        .route(RESULT_PATH, post(result::post_result))
}
