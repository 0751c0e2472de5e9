//! # benchrelay-core
//!
//! Shared primitives for the benchrelay distributed benchmark coordinator.
//!
//! This crate provides the types used by both the runner (worker side) and
//! the collector (server side):
//!
//! - **Run Identity**: the immutable `(instance, project)` correlation key
//! - **Output Classification**: parsing benchmark process output lines into
//!   structured events
//! - **Wire Protocol**: the form/multipart field names and timestamp format
//!   shared by the reporting client and the ingestion endpoints
//! - **Error Types**: shared error definitions and result types
//! - **Observability**: tracing initialization helpers
//!
//! ## Crate Boundary
//!
//! `benchrelay-core` is the only crate allowed to define shared primitives.
//! The runner and the collector never depend on each other; everything they
//! must agree on lives here.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod classifier;
pub mod error;
pub mod identity;
pub mod observability;
pub mod protocol;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::classifier::{OutputEvent, classify_stderr, classify_stdout};
    pub use crate::error::{Error, Result};
    pub use crate::identity::RunIdentity;
    pub use crate::protocol::{StatusReport, WIRE_TIME_FORMAT};
}

// Re-export key types at crate root for ergonomics
pub use classifier::{OutputEvent, classify_stderr, classify_stdout};
pub use error::{Error, Result};
pub use identity::RunIdentity;
pub use observability::{LogFormat, init_logging};
pub use protocol::{StatusReport, WIRE_TIME_FORMAT};
