//! Report delivery with bounded retry.
//!
//! Every classified event becomes one HTTP request to the collector. The
//! network between a worker and the collector is assumed to be flaky;
//! transport failures are retried immediately up to a fixed cap, and a
//! report that exhausts its attempts is dropped so the run can continue.
//! There is no outbox and no replay: the system favors forward progress
//! over strict delivery.

use std::future::Future;

use chrono::Local;

use benchrelay_core::identity::RunIdentity;
use benchrelay_core::protocol::{
    RESULT_FILE_FIELD, RESULT_PATH, STATUS_PATH, StatusReport, fields,
};

/// Default number of delivery retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 20;

/// Outcome of one delivery attempt (or of a whole bounded-retry delivery).
///
/// Only transport-level failures count as failed: any HTTP response,
/// success or not, is final. A collector that answers 401 will keep
/// answering 401; retrying it would only hammer the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector answered; the report will not be re-sent.
    Delivered,
    /// No response was obtained from the collector.
    TransportFailed,
}

/// Reporting client bound to one run's identity.
///
/// Safe to share between the stdout and stderr reader tasks: all state is
/// set at construction and never mutated.
pub struct Reporter {
    http: reqwest::Client,
    server_address: String,
    credential: String,
    identity: RunIdentity,
    max_retries: u32,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("server_address", &self.server_address)
            .field("credential", &"[REDACTED]")
            .field("identity", &self.identity)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Reporter {
    /// Creates a reporter for one run.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        server_address: impl Into<String>,
        credential: impl Into<String>,
        identity: RunIdentity,
        max_retries: u32,
    ) -> Self {
        let server_address = server_address.into();
        Self {
            http,
            server_address: server_address.trim_end_matches('/').to_string(),
            credential: credential.into(),
            identity,
            max_retries,
        }
    }

    /// The identity every report from this reporter carries.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Reports a progress event derived from `line`.
    pub async fn report_progress(
        &self,
        line: &str,
        remaining: u32,
        total: u32,
        estimated_finish: Option<chrono::NaiveDateTime>,
    ) -> DeliveryOutcome {
        let report = StatusReport::progress(
            &self.identity,
            &self.credential,
            line,
            remaining,
            total,
            estimated_finish,
            Local::now().naive_local(),
        );
        self.deliver_status(&report).await
    }

    /// Reports a failure event. The message may be empty.
    pub async fn report_failure(&self, message: &str) -> DeliveryOutcome {
        let report = StatusReport::failure(&self.identity, &self.credential, message);
        self.deliver_status(&report).await
    }

    async fn deliver_status(&self, report: &StatusReport) -> DeliveryOutcome {
        let url = format!("{}{STATUS_PATH}", self.server_address);
        let url = url.as_str();
        let outcome = deliver_with_retry(self.max_retries, move |_| async move {
            match self.http.post(url).form(report).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        tracing::warn!(
                            status = %response.status(),
                            "collector rejected status report"
                        );
                    }
                    DeliveryOutcome::Delivered
                }
                Err(err) => {
                    tracing::debug!(error = %err, "status report transport failure");
                    DeliveryOutcome::TransportFailed
                }
            }
        })
        .await;

        if outcome == DeliveryOutcome::TransportFailed {
            tracing::warn!(
                identity = %self.identity,
                "dropping status report after {} attempts",
                self.max_retries + 1
            );
        }
        outcome
    }

    /// Uploads a packaged result bundle under the given file name.
    pub async fn upload_results(&self, file_name: &str, bytes: Vec<u8>) -> DeliveryOutcome {
        let url = format!("{}{RESULT_PATH}", self.server_address);
        let url = url.as_str();
        let bytes = &bytes;
        let outcome = deliver_with_retry(self.max_retries, move |_| {
            // Multipart bodies are consumed on send, so each attempt
            // rebuilds the form.
            let form = reqwest::multipart::Form::new()
                .text(fields::PASSWORD, self.credential.clone())
                .text(fields::INSTANCE_NAME, self.identity.instance_name().to_string())
                .text(
                    fields::BENCHMARK_PROJECT,
                    self.identity.project_name().to_string(),
                )
                .part(
                    RESULT_FILE_FIELD,
                    reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.to_string()),
                );
            async move {
                match self.http.post(url).multipart(form).send().await {
                    Ok(response) => {
                        if !response.status().is_success() {
                            tracing::warn!(
                                status = %response.status(),
                                "collector rejected result bundle"
                            );
                        }
                        DeliveryOutcome::Delivered
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "result upload transport failure");
                        DeliveryOutcome::TransportFailed
                    }
                }
            }
        })
        .await;

        if outcome == DeliveryOutcome::TransportFailed {
            tracing::warn!(
                identity = %self.identity,
                "dropping result bundle {} after {} attempts",
                file_name,
                self.max_retries + 1
            );
        }
        outcome
    }
}

/// Runs `attempt` until it delivers, up to `max_retries` retries after the
/// first attempt. Retries are immediate, with no backoff; the attempt count
/// is the only bound.
async fn deliver_with_retry<F, Fut>(max_retries: u32, mut attempt: F) -> DeliveryOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DeliveryOutcome>,
{
    let attempts = max_retries.saturating_add(1);
    for attempt_number in 1..=attempts {
        if attempt(attempt_number).await == DeliveryOutcome::Delivered {
            return DeliveryOutcome::Delivered;
        }
        tracing::debug!(attempt = attempt_number, "delivery attempt failed");
    }
    DeliveryOutcome::TransportFailed
}
