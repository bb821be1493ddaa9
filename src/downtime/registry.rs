//! # DowntimeRegistry: the downtime ledger.
//!
//! Owns every [`DowntimeEntry`], grouped by line. Per line the history is a
//! vector in creation order and only its last element may be open, which makes
//! "at most one open entry per line" a structural property.
//!
//! ## Rules
//! - All reads and writes go through one registry-wide `RwLock`.
//! - The clock is read while the lock is held, so instants are ordered like the mutations.
//!   [`DowntimeRegistry::close_all_at`] is the exception: the caller supplies the instant.
//! - The lock covers only the map mutation; events are published after it is released.
//! - [`DowntimeRegistry::snapshot`] returns owned copies; callers never see a live entry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::events::{Bus, Event, EventKind};

use super::clock::TimeSource;
use super::entry::DowntimeEntry;

/// Result of [`DowntimeRegistry::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new entry was created.
    Opened(DowntimeEntry),
    /// The line already had an open entry; it is returned unchanged.
    AlreadyOpen(DowntimeEntry),
}

impl OpenOutcome {
    pub fn entry(&self) -> &DowntimeEntry {
        match self {
            Self::Opened(e) | Self::AlreadyOpen(e) => e,
        }
    }

    #[inline]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Opened(_))
    }
}

/// Concurrency-safe store of downtime intervals keyed by line.
pub struct DowntimeRegistry {
    entries: RwLock<HashMap<Arc<str>, Vec<DowntimeEntry>>>,
    clock: Arc<dyn TimeSource>,
    bus: Option<Bus>,
}

impl DowntimeRegistry {
    /// Creates an empty registry that publishes nothing.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            bus: None,
        }
    }

    /// Creates an empty registry that reports open/close/remove on `bus`.
    pub fn with_bus(clock: Arc<dyn TimeSource>, bus: Bus) -> Self {
        Self {
            bus: Some(bus),
            ..Self::new(clock)
        }
    }

    /// Current instant of the registry's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }

    /// Opens a downtime interval for `line` starting now, unless one is already open.
    pub async fn open(&self, line: &str) -> OpenOutcome {
        let outcome = {
            let mut map = self.entries.write().await;
            let history = map.entry(Arc::from(line)).or_default();
            match history.last() {
                Some(last) if last.is_open() => OpenOutcome::AlreadyOpen(last.clone()),
                _ => {
                    let entry = DowntimeEntry::open(line, self.clock.now());
                    history.push(entry.clone());
                    OpenOutcome::Opened(entry)
                }
            }
        };

        if outcome.is_new() {
            self.publish(Event::new(EventKind::DowntimeOpened).with_line(line));
        }
        outcome
    }

    /// Closes the open interval of `line` now; `None` if nothing was open.
    pub async fn close(&self, line: &str) -> Option<DowntimeEntry> {
        let closed = {
            let mut map = self.entries.write().await;
            let last = map.get_mut(line)?.last_mut()?;
            if !last.close(self.clock.now()) {
                return None;
            }
            last.clone()
        };

        self.publish(
            Event::new(EventKind::DowntimeClosed)
                .with_line(line)
                .with_elapsed(closed.elapsed_seconds()),
        );
        Some(closed)
    }

    /// Recomputes elapsed seconds of every open interval; returns how many were refreshed.
    pub async fn refresh_elapsed(&self) -> usize {
        let mut map = self.entries.write().await;
        let now = self.clock.now();
        let mut refreshed = 0;
        for entry in map.values_mut().filter_map(|h| h.last_mut()) {
            if entry.refresh(now) {
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Discards every interval of `line`, open or closed; returns how many were dropped.
    pub async fn remove(&self, line: &str) -> usize {
        let removed = {
            let mut map = self.entries.write().await;
            map.remove(line).map_or(0, |h| h.len())
        };
        if removed > 0 {
            self.publish(
                Event::new(EventKind::DowntimeRemoved)
                    .with_line(line)
                    .with_count(removed),
            );
        }
        removed
    }

    /// Closes every open interval at one shared instant `at`; returns the closed entries.
    ///
    /// Entries opened after `at` end at their own start.
    pub async fn close_all_at(&self, at: DateTime<Utc>) -> Vec<DowntimeEntry> {
        let closed: Vec<DowntimeEntry> = {
            let mut map = self.entries.write().await;
            map.values_mut()
                .filter_map(|h| h.last_mut())
                .filter_map(|e| e.close(at).then(|| e.clone()))
                .collect()
        };

        for e in &closed {
            self.publish(
                Event::new(EventKind::DowntimeClosed)
                    .with_line(e.line())
                    .with_elapsed(e.elapsed_seconds())
                    .with_reason("shutdown"),
            );
        }
        closed
    }

    /// Point-in-time copy of every entry, ordered by start time then line.
    pub async fn snapshot(&self) -> Vec<DowntimeEntry> {
        let mut all: Vec<DowntimeEntry> = {
            let map = self.entries.read().await;
            map.values().flatten().cloned().collect()
        };
        all.sort_by(|a, b| {
            a.start_time()
                .cmp(&b.start_time())
                .then_with(|| a.line().cmp(b.line()))
        });
        all
    }

    /// The open interval of `line`, if any.
    pub async fn open_entry(&self, line: &str) -> Option<DowntimeEntry> {
        let map = self.entries.read().await;
        map.get(line)?.last().filter(|e| e.is_open()).cloned()
    }

    /// Names of lines that currently have an open interval, sorted.
    pub async fn open_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = {
            let map = self.entries.read().await;
            map.iter()
                .filter(|(_, h)| h.last().is_some_and(|e| e.is_open()))
                .map(|(l, _)| l.to_string())
                .collect()
        };
        lines.sort();
        lines
    }

    /// Total number of entries held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
