//! # LogWriter: structured event logging
//!
//! Renders every [`Event`] as a `tracing` event with key/value fields. The level
//! follows the event's severity: failures are `error`, degraded connectivity and
//! discarded notifications are `warn`, the rest is `info` or `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  phase="create_session" bootstrap phase starting
//! WARN  status=BadConnectionClosed outstanding=2 defunct=0 keep-alive bad
//! INFO  delay_ms=10000 reconnecting
//! INFO  attempt=1 reconnected
//! INFO  line="Line1" downtime opened
//! INFO  line="Line1" elapsed_secs=42 downtime closed
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let phase = e.phase.map(|p| p.as_label());
        let status_text = e.status.map(|s| s.to_string());
        let status = status_text.as_deref();
        let line = e.line.as_deref();
        let tag = e.tag.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::CertificateAccepted => {
                info!(subject = e.subject.as_deref(), status, "accepted certificate");
            }
            EventKind::CertificateRejected => {
                warn!(subject = e.subject.as_deref(), status, "rejected certificate");
            }
            EventKind::PhaseStarting => {
                info!(phase, "bootstrap phase starting");
            }
            EventKind::PhaseCompleted => {
                debug!(phase, "bootstrap phase completed");
            }
            EventKind::PhaseFailed => {
                error!(phase, reason, "bootstrap phase failed");
            }
            EventKind::SessionConnected => {
                info!(endpoint = reason, "session connected");
            }
            EventKind::KeepAliveBad => {
                warn!(
                    status,
                    outstanding = e.outstanding,
                    defunct = e.defunct,
                    "keep-alive bad"
                );
            }
            EventKind::KeepAliveStopped => {
                error!("keep-alive stopped");
            }
            EventKind::ReconnectStarted => {
                info!(delay_ms = e.delay_ms, "reconnecting");
            }
            EventKind::ReconnectAttemptFailed => {
                warn!(
                    attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    reason,
                    "reconnect attempt failed"
                );
            }
            EventKind::SubscriptionRestored => {
                info!("subscription restored on new session");
            }
            EventKind::ReconnectCompleted => {
                info!(attempt = e.attempt, "reconnected");
            }
            EventKind::SessionClosed => match reason {
                Some(reason) => warn!(reason, "session closed with error"),
                None => info!("session closed"),
            },
            EventKind::DowntimeOpened => {
                info!(line, tag, "downtime opened");
            }
            EventKind::DowntimeClosed => {
                info!(line, elapsed_secs = e.elapsed_secs, reason, "downtime closed");
            }
            EventKind::DowntimeRemoved => {
                info!(line, entries = e.count, "downtime removed");
            }
            EventKind::TagUnmapped => {
                debug!(tag, value = reason, "notification for unmapped tag");
            }
            EventKind::TagValueUnmapped => {
                debug!(tag, line, value = reason, "value maps to no line state");
            }
            EventKind::NotificationRejected => {
                warn!(tag, line, status, "notification with bad status ignored");
            }
            EventKind::NotificationStale => {
                debug!(tag, line, "stale notification ignored");
            }
            EventKind::ShutdownRequested => {
                info!(cause = reason, "shutdown requested");
            }
            EventKind::GraceExceeded => {
                warn!(abandoned = e.count, "in-flight notifications abandoned");
            }
            EventKind::RunFinished => {
                info!(exit = reason, "run finished");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
