//! Sequential execution of the configured run set.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument as _;

use benchrelay_core::observability::run_span;

use crate::config::RunnerConfig;
use crate::supervisor::{ProcessSupervisor, RunOutcome, RunPhase};

/// Executes the configured (project, framework) pairs strictly one after
/// another: a run's result upload completes before the next run starts.
pub struct RunSequencer {
    config: Arc<RunnerConfig>,
    supervisor: ProcessSupervisor,
}

impl RunSequencer {
    /// Creates a sequencer over a validated configuration.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "failed to configure reqwest client; using defaults"
                );
                reqwest::Client::new()
            }
        };

        let config = Arc::new(config);
        Self {
            supervisor: ProcessSupervisor::new(Arc::clone(&config), http),
            config,
        }
    }

    /// Executes every configured run. Individual run failures are reported
    /// and logged but never abort the sequence.
    pub async fn run_all(&self) -> Vec<RunOutcome> {
        let mut outcomes = Vec::with_capacity(self.config.runs.len());
        for run in &self.config.runs {
            let span = run_span(&run.project_name, &run.framework, &self.config.instance_name);
            let outcome = self.supervisor.run(run).instrument(span).await;

            match outcome.phase {
                RunPhase::Completed { success: true } => tracing::info!(
                    project = %run.project_name,
                    uploaded = outcome.uploaded,
                    "run finished"
                ),
                _ => tracing::warn!(
                    project = %run.project_name,
                    phase = ?outcome.phase,
                    uploaded = outcome.uploaded,
                    "run did not finish cleanly"
                ),
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}
