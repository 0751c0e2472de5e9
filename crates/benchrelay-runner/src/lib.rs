//! # benchrelay-runner
//!
//! Worker side of the benchrelay distributed benchmark coordinator.
//!
//! A runner instance is launched with a list of benchmark projects and
//! target frameworks. It executes them one at a time, watching each child
//! process's output for progress markers, and reports everything it learns
//! to the collector - live status while the run executes, and the packaged
//! result bundle once it exits.
//!
//! ## Usage
//!
//! ```bash
//! benchrelay-runner "Intro.csproj;Algos.csproj" "net8.0;net8.0" \
//!     worker-1 http://collector:8080 s3cret
//! ```
//!
//! ## Configuration
//!
//! The five positional arguments mirror how instances have always been
//! launched; tuning knobs are env-backed flags:
//!
//! - `BENCHRELAY_ARTIFACTS_DIR` - artifact directory to package after a run
//! - `BENCHRELAY_DOTNET` - dotnet executable to launch
//! - `BENCHRELAY_MAX_RETRIES` - report delivery retry cap

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod archive;
pub mod config;
pub mod reporter;
pub mod sequencer;
pub mod supervisor;

use std::path::PathBuf;

use clap::Parser;

/// benchrelay runner - supervise benchmark runs and report progress.
#[derive(Debug, Parser)]
#[command(name = "benchrelay-runner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// `;`-separated paths to benchmark project files.
    pub project_paths: String,

    /// `;`-separated target frameworks, positionally paired with the
    /// project paths.
    pub target_frameworks: String,

    /// Human-assigned name for this worker instance.
    pub instance_name: String,

    /// Collector base address (e.g. `http://collector:8080`).
    pub server_address: String,

    /// Shared secret presented with every report.
    pub shared_secret: String,

    /// Artifact directory the benchmark process writes its results to.
    #[arg(
        long,
        env = "BENCHRELAY_ARTIFACTS_DIR",
        default_value = "BenchmarkDotNet.Artifacts"
    )]
    pub artifacts_dir: PathBuf,

    /// dotnet executable used for the restore and run steps.
    #[arg(long, env = "BENCHRELAY_DOTNET", default_value = "dotnet")]
    pub dotnet_path: PathBuf,

    /// Maximum delivery retries per report after the initial attempt.
    #[arg(
        long,
        env = "BENCHRELAY_MAX_RETRIES",
        default_value_t = reporter::DEFAULT_MAX_RETRIES
    )]
    pub max_retries: u32,

    /// Skip the dependency-restore step before each run.
    #[arg(long)]
    pub skip_restore: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_positional_arguments() {
        let cli = Cli::parse_from([
            "benchrelay-runner",
            "Intro.csproj;Algos.csproj",
            "net8.0;net9.0",
            "worker-1",
            "http://collector:8080",
            "s3cret",
        ]);

        assert_eq!(cli.project_paths, "Intro.csproj;Algos.csproj");
        assert_eq!(cli.target_frameworks, "net8.0;net9.0");
        assert_eq!(cli.instance_name, "worker-1");
        assert_eq!(cli.server_address, "http://collector:8080");
        assert_eq!(cli.shared_secret, "s3cret");
        assert_eq!(cli.max_retries, 20);
        assert!(!cli.skip_restore);
    }

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = Cli::parse_from([
            "benchrelay-runner",
            "Intro.csproj",
            "net8.0",
            "worker-1",
            "http://collector:8080",
            "s3cret",
            "--max-retries",
            "3",
            "--skip-restore",
        ]);

        assert_eq!(cli.max_retries, 3);
        assert!(cli.skip_restore);
    }
}
