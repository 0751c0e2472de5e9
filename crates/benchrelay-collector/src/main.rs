//! `benchrelay-collector` binary entrypoint.
//!
//! Parses configuration from flags/environment and starts the HTTP server.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use benchrelay_collector::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use benchrelay_collector::server::Server;
use benchrelay_core::observability::{LogFormat, init_logging};

/// Benchmark collection point: receives worker status reports and stores
/// uploaded result bundles.
#[derive(Debug, Parser)]
#[command(name = "benchrelay-collector")]
#[command(version)]
struct Args {
    /// HTTP port to bind.
    #[arg(long, env = "BENCHRELAY_PORT", default_value = "8080")]
    port: u16,

    /// Shared secret workers must present.
    #[arg(long, env = "BENCHRELAY_SECRET")]
    secret: Option<String>,

    /// Root directory result bundles are persisted under.
    #[arg(long, env = "BENCHRELAY_STORAGE_ROOT", default_value = "BenchmarkResults")]
    storage_root: PathBuf,

    /// Maximum accepted upload size in bytes.
    #[arg(long, env = "BENCHRELAY_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Emit JSON logs instead of pretty ones.
    #[arg(long, env = "BENCHRELAY_JSON_LOGS")]
    json_logs: bool,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            port: self.port,
            secret: self.secret,
            storage_root: self.storage_root,
            max_upload_bytes: self.max_upload_bytes,
            json_logs: self.json_logs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config();

    init_logging(if config.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    if config.uses_default_secret() {
        tracing::warn!(
            "BENCHRELAY_SECRET not set; using the built-in default secret (do not expose this \
             collector beyond a trusted network)"
        );
    }

    let server = Server::new(config);
    server.serve().await?;
    Ok(())
}
