//! Notification collaborator interface.
//!
//! Result arrival can alert an operator through an external channel
//! (desktop notifications, chat webhooks, ...). Delivery itself is outside
//! this crate; the collector only talks to the interface, and a failed or
//! absent notifier never fails the upload that triggered it.

use async_trait::async_trait;

/// Collaborator alerted when a result bundle has been stored.
#[async_trait]
pub trait ResultNotifier: Send + Sync {
    /// Shows a notification. Returns `false` when delivery failed or the
    /// platform has no notification channel; implementations must not
    /// propagate errors.
    async fn notify(&self, title: &str, body: &str) -> bool;
}

/// Notifier that drops everything. Used when no channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl ResultNotifier for NoopNotifier {
    async fn notify(&self, _title: &str, _body: &str) -> bool {
        false
    }
}

/// Notifier that emits a tracing event. The default for server deployments,
/// where the log stream is the operator channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl ResultNotifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) -> bool {
        tracing::info!(title = %title, "{body}");
        true
    }
}
