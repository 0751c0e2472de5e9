//! Benchmark process supervision.
//!
//! One supervisor drives one run at a time: optionally restore the
//! project's dependencies, launch the benchmark process with captured
//! output, stream both pipes through the classifier into the reporter as
//! lines arrive, and package/upload the artifact directory once the
//! process exits.
//!
//! The two output streams are drained on independent tasks. Within one
//! stream, lines are classified and reported in order; across streams no
//! ordering is guaranteed. Nothing that happens during a run - crashes,
//! missing artifacts, dropped reports - stops the surrounding sequence;
//! failures are reported and execution moves on.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt as _, AsyncRead, BufReader};
use tokio::process::Command;

use benchrelay_core::classifier::{OutputEvent, classify_stderr, classify_stdout};
use benchrelay_core::identity::RunIdentity;
use benchrelay_core::protocol::RESULT_ARCHIVE_NAME;

use crate::archive;
use crate::config::{BenchmarkRun, RunnerConfig};
use crate::reporter::{DeliveryOutcome, Reporter};

/// Lifecycle of one supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing has been launched yet.
    NotStarted,
    /// The dependency-restore step is executing.
    Restoring,
    /// The benchmark process is executing.
    Running,
    /// The benchmark process has exited.
    Completed {
        /// Whether the process exited with a zero status.
        success: bool,
    },
}

/// What one run ended as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Final lifecycle phase.
    pub phase: RunPhase,
    /// Whether the result bundle reached the collector.
    pub uploaded: bool,
}

/// Supervises benchmark processes for one worker instance.
pub struct ProcessSupervisor {
    config: Arc<RunnerConfig>,
    http: reqwest::Client,
}

impl ProcessSupervisor {
    /// Creates a supervisor over the given validated configuration.
    #[must_use]
    pub fn new(config: Arc<RunnerConfig>, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Executes one run to completion, reporting everything it produces.
    ///
    /// Never fails the caller: process and packaging problems are reported
    /// as failure events and folded into the returned outcome.
    pub async fn run(&self, run: &BenchmarkRun) -> RunOutcome {
        let identity = RunIdentity::new(&self.config.instance_name, &run.project_name);
        let reporter = Arc::new(Reporter::new(
            self.http.clone(),
            self.config.server_address.clone(),
            self.config.shared_secret.clone(),
            identity,
            self.config.max_retries,
        ));

        let mut phase = RunPhase::NotStarted;
        tracing::debug!(phase = ?phase, project = %run.project_name, "run created");

        if !self.config.skip_restore {
            phase = RunPhase::Restoring;
            tracing::debug!(phase = ?phase, "restoring dependencies");
            self.restore(run).await;
        }

        let mut command = Command::new(&self.config.dotnet_path);
        command
            .args(["run", "-c", "Release", "--framework"])
            .arg(&run.framework)
            .arg("--project")
            .arg(&run.project_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::error!(error = %err, "failed to launch benchmark process");
                reporter
                    .report_failure(&format!("failed to launch benchmark process: {err}"))
                    .await;
                return RunOutcome {
                    phase: RunPhase::Completed { success: false },
                    uploaded: false,
                };
            }
        };

        phase = RunPhase::Running;
        tracing::debug!(phase = ?phase, pid = child.id(), "benchmark process started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = stdout.map(|pipe| tokio::spawn(drain_stdout(pipe, Arc::clone(&reporter))));
        let stderr_task = stderr.map(|pipe| tokio::spawn(drain_stderr(pipe, Arc::clone(&reporter))));

        let status = child.wait().await;
        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        let success = match status {
            Ok(status) => status.success(),
            Err(err) => {
                tracing::error!(error = %err, "failed to await benchmark process");
                false
            }
        };
        phase = RunPhase::Completed { success };
        tracing::debug!(phase = ?phase, "benchmark process exited");

        let uploaded = self.package_and_upload(&reporter).await;
        RunOutcome { phase, uploaded }
    }

    /// Runs the dependency-restore step. Fire-and-forget: the exit code is
    /// not inspected and a failure here only logs.
    async fn restore(&self, run: &BenchmarkRun) {
        let result = Command::new(&self.config.dotnet_path)
            .arg("restore")
            .arg(&run.project_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, "dependency restore could not be started");
        }
    }

    /// Packages the artifact directory and uploads the archive, deleting
    /// the local copy afterwards. Packaging failures become failure events.
    async fn package_and_upload(&self, reporter: &Reporter) -> bool {
        let artifacts_dir = self.config.artifacts_dir.clone();
        if !artifacts_dir.is_dir() {
            reporter
                .report_failure(&format!(
                    "artifact directory {} does not exist",
                    artifacts_dir.display()
                ))
                .await;
            return false;
        }

        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                reporter
                    .report_failure(&format!("failed to create packaging directory: {err}"))
                    .await;
                return false;
            }
        };
        let archive_path = scratch.path().join(RESULT_ARCHIVE_NAME);

        let pack_target = archive_path.clone();
        let packed = tokio::task::spawn_blocking(move || {
            archive::pack_directory(&artifacts_dir, &pack_target)
        })
        .await;
        match packed {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                reporter
                    .report_failure(&format!("failed to package results: {err}"))
                    .await;
                return false;
            }
            Err(err) => {
                reporter
                    .report_failure(&format!("packaging task failed: {err}"))
                    .await;
                return false;
            }
        }

        let bytes = match tokio::fs::read(&archive_path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                reporter
                    .report_failure(&format!("failed to read packaged results: {err}"))
                    .await;
                return false;
            }
        };

        let outcome = reporter.upload_results(RESULT_ARCHIVE_NAME, bytes).await;
        if let Err(err) = tokio::fs::remove_file(&archive_path).await {
            tracing::warn!(error = %err, "failed to delete local archive");
        }
        outcome == DeliveryOutcome::Delivered
    }
}

/// Drains the benchmark process's stdout, reporting classified events as
/// they arrive. The discovered total is remembered so later progress
/// reports carry it; a progress line seen before discovery uses its own
/// remaining count as the total, which keeps remaining within bounds.
async fn drain_stdout<R: AsyncRead + Unpin>(pipe: R, reporter: Arc<Reporter>) {
    let mut lines = BufReader::new(pipe).lines();
    let mut total: Option<u32> = None;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match classify_stdout(Some(&line)) {
                OutputEvent::RunStarted { total: discovered } => {
                    total = Some(discovered);
                    reporter
                        .report_progress(&line, discovered, discovered, None)
                        .await;
                }
                OutputEvent::Progress {
                    remaining,
                    estimated_finish,
                } => {
                    let total = total.unwrap_or(remaining);
                    reporter
                        .report_progress(&line, remaining, total.max(remaining), estimated_finish)
                        .await;
                }
                OutputEvent::Failure { .. } | OutputEvent::Ignored => {}
            },
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "error reading benchmark stdout");
                break;
            }
        }
    }
}

/// Drains the benchmark process's stderr. Every line is a failure event,
/// and stream close is reported as one final empty failure - downstream
/// consumers treat that empty message as the stream's terminal signal.
async fn drain_stderr<R: AsyncRead + Unpin>(pipe: R, reporter: Arc<Reporter>) {
    let mut lines = BufReader::new(pipe).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let OutputEvent::Failure { message } = classify_stderr(Some(&line)) {
                    reporter.report_failure(&message).await;
                }
            }
            Ok(None) => {
                if let OutputEvent::Failure { message } = classify_stderr(None) {
                    reporter.report_failure(&message).await;
                }
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "error reading benchmark stderr");
                break;
            }
        }
    }
}
