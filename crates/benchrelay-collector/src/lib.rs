//! # benchrelay-collector
//!
//! HTTP collection point for the benchrelay distributed benchmark
//! coordinator. Worker instances post their progress and upload their
//! result bundles here.
//!
//! This crate handles:
//!
//! - **Authentication**: shared-secret credential checks on every report
//! - **Ingestion**: form-encoded status reports and multipart result bundles
//! - **Progress State**: the in-memory per-(instance, project) snapshot map
//! - **Persistence**: collision-safe, date-partitioned result storage
//!
//! ## Endpoints
//!
//! ```text
//! GET  /ping    - Liveness check, no auth
//! POST /status  - Status report (form-encoded)
//! POST /result  - Result bundle upload (multipart)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use benchrelay_collector::server::Server;
//!
//! let server = Server::builder()
//!     .port(8080)
//!     .secret("shared-secret")
//!     .build();
//!
//! server.serve().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod progress;
pub mod routes;
pub mod server;
pub mod store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
