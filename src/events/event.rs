//! # Runtime events emitted by the session manager, dispatcher and registry.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **Certificate events**: trust decisions taken while creating the application
//! - **Bootstrap events**: one `PhaseStarting` / `PhaseCompleted` / `PhaseFailed` per phase
//! - **Connectivity events**: keep-alive health, reconnect lifecycle, session close
//! - **Downtime events**: open/close/remove transitions and ignored notifications
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, line and
//! tag names, the bootstrap phase, status codes and reconnect attempts.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use linevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DowntimeOpened)
//!     .with_line("Line1")
//!     .with_tag("Line1.State");
//!
//! assert_eq!(ev.kind, EventKind::DowntimeOpened);
//! assert_eq!(ev.line.as_deref(), Some("Line1"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::session::{BootstrapPhase, StatusCode};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Certificate events ===
    /// An untrusted server certificate was accepted by policy.
    ///
    /// Sets:
    /// - `subject`: certificate subject
    /// - `status`: validation status reported by the client
    CertificateAccepted,

    /// A server certificate was rejected.
    ///
    /// Sets:
    /// - `subject`: certificate subject
    /// - `status`: validation status reported by the client
    CertificateRejected,

    // === Bootstrap events ===
    /// A bootstrap phase is about to run.
    ///
    /// Sets:
    /// - `phase`: the phase
    PhaseStarting,

    /// A bootstrap phase finished successfully.
    ///
    /// Sets:
    /// - `phase`: the phase
    PhaseCompleted,

    /// A bootstrap phase failed; no later phase will run.
    ///
    /// Sets:
    /// - `phase`: the failing phase
    /// - `reason`: client error
    PhaseFailed,

    /// All bootstrap phases completed, the session is connected.
    ///
    /// Sets:
    /// - `phase`: `Running`
    /// - `reason`: endpoint url
    SessionConnected,

    // === Connectivity events ===
    /// The transport reported a non-good keep-alive status.
    ///
    /// Sets:
    /// - `status`: keep-alive status
    /// - `outstanding`, `defunct`: request counters reported with the keep-alive
    KeepAliveBad,

    /// The transport declared the connection permanently dead.
    KeepAliveStopped,

    /// A reconnect handler was created.
    ///
    /// Sets:
    /// - `delay_ms`: fixed period between attempts
    ReconnectStarted,

    /// A reconnect attempt failed; the handler will retry after the fixed period.
    ///
    /// Sets:
    /// - `attempt`: attempt number (1-based, per handler)
    /// - `delay_ms`: delay before the next attempt
    /// - `reason`: client error
    ReconnectAttemptFailed,

    /// The subscription had to be recreated on the new session.
    SubscriptionRestored,

    /// A reconnect handler swapped in a new session.
    ///
    /// Sets:
    /// - `attempt`: the successful attempt number
    ReconnectCompleted,

    /// The session was released by shutdown.
    ///
    /// Sets:
    /// - `reason`: close error, if the client failed to close cleanly
    SessionClosed,

    // === Downtime events ===
    /// A downtime interval was opened.
    ///
    /// Sets:
    /// - `line`: line name
    DowntimeOpened,

    /// A downtime interval was closed.
    ///
    /// Sets:
    /// - `line`: line name
    /// - `elapsed_secs`: final duration
    /// - `reason`: `shutdown` when closed by graceful shutdown
    DowntimeClosed,

    /// All intervals of a line were discarded.
    ///
    /// Sets:
    /// - `line`: line name
    /// - `count`: number of discarded entries
    DowntimeRemoved,

    /// A notification arrived for a tag with no line binding.
    ///
    /// Sets:
    /// - `tag`: tag display name
    /// - `reason`: reported value
    TagUnmapped,

    /// A notification for a bound tag carried a value in neither the down nor the running set.
    ///
    /// Sets:
    /// - `tag`, `line`, `reason`: reported value
    TagValueUnmapped,

    /// A notification was discarded because its status code is bad.
    ///
    /// Sets:
    /// - `tag`, `line`, `status`
    NotificationRejected,

    /// A notification was discarded because it is older than the last one applied to its line.
    ///
    /// Sets:
    /// - `tag`, `line`
    NotificationStale,

    // === Runtime events ===
    /// Shutdown requested (OS signal, run-time bound, keep-alive stop or caller).
    ///
    /// Sets:
    /// - `reason`: stop cause
    ShutdownRequested,

    /// In-flight notifications did not finish within the grace period.
    ///
    /// Sets:
    /// - `count`: number of abandoned dispatches
    GraceExceeded,

    /// The run finished.
    ///
    /// Sets:
    /// - `reason`: exit status label
    RunFinished,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Production line, if applicable.
    pub line: Option<Arc<str>>,
    /// Monitored tag display name, if applicable.
    pub tag: Option<Arc<str>>,
    /// Bootstrap phase, if applicable.
    pub phase: Option<BootstrapPhase>,
    /// Protocol status code, if applicable.
    pub status: Option<StatusCode>,
    /// Certificate subject, if applicable.
    pub subject: Option<Arc<str>>,
    /// Human-readable reason (errors, values, stop cause).
    pub reason: Option<Arc<str>>,
    /// Reconnect attempt number.
    pub attempt: Option<u32>,
    /// Number of items affected.
    pub count: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Downtime duration in seconds.
    pub elapsed_secs: Option<i64>,
    /// Outstanding request count reported with a keep-alive.
    pub outstanding: Option<u32>,
    /// Defunct request count reported with a keep-alive.
    pub defunct: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            line: None,
            tag: None,
            phase: None,
            status: None,
            subject: None,
            reason: None,
            attempt: None,
            count: None,
            delay_ms: None,
            elapsed_secs: None,
            outstanding: None,
            defunct: None,
        }
    }

    /// Attaches a line name.
    #[inline]
    pub fn with_line(mut self, line: impl Into<Arc<str>>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Attaches a tag display name.
    #[inline]
    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attaches a bootstrap phase.
    #[inline]
    pub fn with_phase(mut self, phase: BootstrapPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a status code.
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a certificate subject.
    #[inline]
    pub fn with_subject(mut self, subject: impl Into<Arc<str>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a reconnect attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches an item count, saturating at `u32::MAX`.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a downtime duration.
    #[inline]
    pub fn with_elapsed(mut self, secs: i64) -> Self {
        self.elapsed_secs = Some(secs);
        self
    }

    /// Attaches keep-alive request counters.
    #[inline]
    pub fn with_requests(mut self, outstanding: u32, defunct: u32) -> Self {
        self.outstanding = Some(outstanding);
        self.defunct = Some(defunct);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::KeepAliveBad);
        let b = Event::new(EventKind::KeepAliveBad);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::ReconnectStarted).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
