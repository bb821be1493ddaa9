//! # Signals pushed by a protocol client.
//!
//! The client reports two kinds of information from its own callback context:
//! connection health ([`KeepAlive`], keep-alive stopped) and data changes
//! ([`TagNotification`]). Both travel through one unbounded channel so that a
//! callback never waits on the consumer.
//!
//! ```text
//! UaClient callbacks ──► SignalSink ──► mpsc ──► Orchestrator pump
//!                                                  ├─► SessionManager::on_keep_alive
//!                                                  └─► NotificationDispatcher::dispatch
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::dispatch::TagValue;

use super::StatusCode;

/// Keep-alive report from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive {
    pub status: StatusCode,
    /// Requests sent but not yet answered.
    pub outstanding_requests: u32,
    /// Requests abandoned by the transport.
    pub defunct_requests: u32,
}

impl KeepAlive {
    /// A healthy keep-alive with no pending requests.
    pub const fn good() -> Self {
        Self {
            status: StatusCode::GOOD,
            outstanding_requests: 0,
            defunct_requests: 0,
        }
    }

    /// A keep-alive carrying `status`.
    pub const fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            outstanding_requests: 0,
            defunct_requests: 0,
        }
    }
}

/// One value change of a monitored tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagNotification {
    /// Display name of the monitored item.
    pub tag: Arc<str>,
    pub value: TagValue,
    /// Timestamp assigned by the data source.
    pub source_timestamp: DateTime<Utc>,
    pub status: StatusCode,
}

impl TagNotification {
    /// A good-status notification.
    pub fn new(tag: impl Into<Arc<str>>, value: impl Into<TagValue>, at: DateTime<Utc>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
            source_timestamp: at,
            status: StatusCode::GOOD,
        }
    }

    /// Replaces the status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

/// Everything a client can report.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    KeepAlive(KeepAlive),
    /// The transport gave up on the connection for good.
    KeepAliveStopped,
    Notification(TagNotification),
}

/// Cloneable handle a client uses to push [`SessionSignal`]s.
///
/// Sending never blocks; after the consumer is gone signals are discarded and
/// the methods return `false`.
#[derive(Debug, Clone)]
pub struct SignalSink {
    tx: mpsc::UnboundedSender<SessionSignal>,
}

impl SignalSink {
    /// Creates a sink and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn keep_alive(&self, keep_alive: KeepAlive) -> bool {
        self.tx.send(SessionSignal::KeepAlive(keep_alive)).is_ok()
    }

    pub fn keep_alive_stopped(&self) -> bool {
        self.tx.send(SessionSignal::KeepAliveStopped).is_ok()
    }

    pub fn notify(&self, notification: TagNotification) -> bool {
        self.tx.send(SessionSignal::Notification(notification)).is_ok()
    }

    /// True once the receiving end has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
