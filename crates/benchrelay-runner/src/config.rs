//! Runner configuration and run-set validation.
//!
//! Validation happens once, before anything is spawned. A malformed run set
//! aborts the whole invocation; partial execution against a half-valid
//! configuration is never attempted.

use std::path::PathBuf;

use benchrelay_core::{Error, Result};

use crate::Cli;

/// One (project, target framework) pair to execute.
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    /// Path to the benchmark project file.
    pub project_path: PathBuf,
    /// Project name derived from the project file stem; used as the run's
    /// identity and storage key.
    pub project_name: String,
    /// Target framework the project is executed under.
    pub framework: String,
}

/// Validated runner configuration.
#[derive(Clone)]
pub struct RunnerConfig {
    /// The runs to execute, in order.
    pub runs: Vec<BenchmarkRun>,
    /// Human-assigned name for this worker instance.
    pub instance_name: String,
    /// Collector base address, without a trailing slash.
    pub server_address: String,
    /// Shared secret presented with every report.
    pub shared_secret: String,
    /// Artifact directory packaged after each run.
    pub artifacts_dir: PathBuf,
    /// dotnet executable used for the restore and run steps.
    pub dotnet_path: PathBuf,
    /// Maximum delivery retries per report after the initial attempt.
    pub max_retries: u32,
    /// Skip the dependency-restore step before each run.
    pub skip_restore: bool,
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("runs", &self.runs)
            .field("instance_name", &self.instance_name)
            .field("server_address", &self.server_address)
            .field("shared_secret", &"[REDACTED]")
            .field("artifacts_dir", &self.artifacts_dir)
            .field("dotnet_path", &self.dotnet_path)
            .field("max_retries", &self.max_retries)
            .field("skip_restore", &self.skip_restore)
            .finish()
    }
}

impl RunnerConfig {
    /// Builds and validates a configuration from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the instance name or server
    /// address is empty, the project and framework counts differ, or any
    /// project path does not name an existing project file.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.instance_name.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "instance name must not be empty".to_string(),
            ));
        }
        if cli.server_address.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "server address must not be empty".to_string(),
            ));
        }

        let paths: Vec<&str> = split_list(&cli.project_paths);
        let frameworks: Vec<&str> = split_list(&cli.target_frameworks);

        if paths.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one benchmark project is required".to_string(),
            ));
        }
        if paths.len() != frameworks.len() {
            return Err(Error::InvalidConfig(format!(
                "project count ({}) does not match target framework count ({})",
                paths.len(),
                frameworks.len()
            )));
        }

        let mut runs = Vec::with_capacity(paths.len());
        for (path, framework) in paths.into_iter().zip(frameworks) {
            runs.push(validate_run(path, framework)?);
        }

        Ok(Self {
            runs,
            instance_name: cli.instance_name.clone(),
            server_address: cli.server_address.trim_end_matches('/').to_string(),
            shared_secret: cli.shared_secret.clone(),
            artifacts_dir: cli.artifacts_dir.clone(),
            dotnet_path: cli.dotnet_path.clone(),
            max_retries: cli.max_retries,
            skip_restore: cli.skip_restore,
        })
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

fn validate_run(path: &str, framework: &str) -> Result<BenchmarkRun> {
    let project_path = PathBuf::from(path);

    let file_name = project_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !file_name.ends_with("proj") {
        return Err(Error::InvalidConfig(format!(
            "invalid project path {path}: path with project file name is required"
        )));
    }
    if !project_path.is_file() {
        return Err(Error::InvalidConfig(format!(
            "project file {path} does not exist"
        )));
    }

    let project_name = project_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(BenchmarkRun {
        project_path,
        project_name,
        framework: framework.to_string(),
    })
}
