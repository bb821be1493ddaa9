use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// One downtime interval of a line.
///
/// Open while `end_time` is `None`. Closing sets `end_time` once and freezes
/// `elapsed_seconds`; a closed entry never changes again. Entries are created
/// and mutated only by [`DowntimeRegistry`](crate::DowntimeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DowntimeEntry {
    line: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    elapsed_seconds: i64,
}

impl DowntimeEntry {
    pub(crate) fn open(line: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            line: line.into(),
            start_time: at,
            end_time: None,
            elapsed_seconds: 0,
        }
    }

    /// Recomputes elapsed seconds against `now`; no-op once closed.
    pub(crate) fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        if self.end_time.is_some() {
            return false;
        }
        self.elapsed_seconds = seconds_between(self.start_time, now);
        true
    }

    /// Closes at `at` (never earlier than the start). Returns false if already closed.
    pub(crate) fn close(&mut self, at: DateTime<Utc>) -> bool {
        if self.end_time.is_some() {
            return false;
        }
        let end = at.max(self.start_time);
        self.end_time = Some(end);
        self.elapsed_seconds = seconds_between(self.start_time, end);
        true
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed_seconds
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0)
}

impl fmt::Display for DowntimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downtime: line={} start={} end=",
            self.line,
            self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        match self.end_time {
            Some(end) => f.write_str(&end.to_rfc3339_opts(SecondsFormat::Secs, true))?,
            None => f.write_str("-")?,
        }
        write!(f, " elapsed={}", self.elapsed_seconds)
    }
}
