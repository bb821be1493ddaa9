//! # NotificationDispatcher: tag changes to downtime transitions.
//!
//! ```text
//! TagNotification
//!   ├─► bad status?          → NotificationRejected, ignored
//!   ├─► tag not mapped?      → TagUnmapped, ignored
//!   ├─► value not mapped?    → TagValueUnmapped, ignored
//!   └─► lock line ─► older than last accepted? → NotificationStale, ignored
//!                  ├─► Down    → registry.open(line)
//!                  └─► Running → registry.close(line)
//! ```
//!
//! Decisions for one line are serialized by a per-line async mutex held across
//! the registry call. Different lines use different mutexes and never wait on
//! each other.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::downtime::DowntimeRegistry;
use crate::events::{Bus, Event, EventKind};
use crate::session::TagNotification;

use super::mapping::{LineState, TagMapping};

/// What a single notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A downtime interval was opened.
    Opened,
    /// Down, but the line already had an open interval.
    AlreadyDown,
    /// The open interval was closed.
    Closed,
    /// Running, and nothing was open.
    AlreadyRunning,
    /// Tag has no line binding.
    Unmapped,
    /// Value is in neither the down nor the running set.
    UnknownValue,
    /// Notification carried a bad status code.
    BadStatus,
    /// Source timestamp is older than the last accepted one for the line.
    Stale,
}

#[derive(Default)]
struct LineCursor {
    last_source: Option<DateTime<Utc>>,
}

/// Translates tag notifications into registry operations.
pub struct NotificationDispatcher {
    registry: Arc<DowntimeRegistry>,
    mapping: TagMapping,
    lines: parking_lot::Mutex<HashMap<Arc<str>, Arc<tokio::sync::Mutex<LineCursor>>>>,
    bus: Bus,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<DowntimeRegistry>, mapping: TagMapping, bus: Bus) -> Self {
        Self {
            registry,
            mapping,
            lines: parking_lot::Mutex::new(HashMap::new()),
            bus,
        }
    }

    pub fn registry(&self) -> &Arc<DowntimeRegistry> {
        &self.registry
    }

    fn line_cursor(&self, line: &Arc<str>) -> Arc<tokio::sync::Mutex<LineCursor>> {
        let mut lines = self.lines.lock();
        Arc::clone(lines.entry(Arc::clone(line)).or_default())
    }

    /// Applies one notification.
    pub async fn dispatch(&self, n: TagNotification) -> Dispatch {
        if n.status.is_bad() {
            self.bus.publish(
                Event::new(EventKind::NotificationRejected)
                    .with_tag(Arc::clone(&n.tag))
                    .with_status(n.status),
            );
            return Dispatch::BadStatus;
        }

        let Some(binding) = self.mapping.get(&n.tag) else {
            self.bus.publish(
                Event::new(EventKind::TagUnmapped)
                    .with_tag(Arc::clone(&n.tag))
                    .with_reason(n.value.to_string()),
            );
            return Dispatch::Unmapped;
        };

        let Some(state) = binding.classify(&n.value) else {
            self.bus.publish(
                Event::new(EventKind::TagValueUnmapped)
                    .with_tag(Arc::clone(&n.tag))
                    .with_line(Arc::clone(&binding.line))
                    .with_reason(n.value.to_string()),
            );
            return Dispatch::UnknownValue;
        };

        let cursor = self.line_cursor(&binding.line);
        let mut cursor = cursor.lock().await;

        if cursor.last_source.is_some_and(|last| n.source_timestamp < last) {
            self.bus.publish(
                Event::new(EventKind::NotificationStale)
                    .with_tag(Arc::clone(&n.tag))
                    .with_line(Arc::clone(&binding.line))
                    .with_reason(state.as_label()),
            );
            return Dispatch::Stale;
        }
        cursor.last_source = Some(n.source_timestamp);

        match state {
            LineState::Down => {
                if self.registry.open(&binding.line).await.is_new() {
                    Dispatch::Opened
                } else {
                    Dispatch::AlreadyDown
                }
            }
            LineState::Running => match self.registry.close(&binding.line).await {
                Some(_) => Dispatch::Closed,
                None => Dispatch::AlreadyRunning,
            },
        }
    }
}
