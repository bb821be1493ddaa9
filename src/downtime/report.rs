//! Line-oriented downtime report.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::entry::DowntimeEntry;

/// Output format of a [`Report`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One `Downtime: line=.. start=.. end=.. elapsed=..` line per entry.
    #[default]
    Text,
    /// A JSON array of entries.
    Json,
}

/// A rendered-on-demand view over a registry snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<DowntimeEntry>,
}

impl Report {
    pub fn new(entries: Vec<DowntimeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DowntimeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => serde_json::to_string_pretty(&self.entries),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            writeln!(f, "{e}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn json_lists_open_entries_with_null_end() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let mut closed = DowntimeEntry::open("Line1", t0);
        closed.close(t0 + Duration::seconds(8));
        let open = DowntimeEntry::open("Line2", t0 + Duration::seconds(2));

        let report = Report::new(vec![closed, open]);
        let json: serde_json::Value =
            serde_json::from_str(&report.render(ReportFormat::Json).unwrap()).unwrap();

        assert_eq!(json[0]["line"], "Line1");
        assert_eq!(json[0]["elapsed_seconds"], 8);
        assert!(json[1]["end_time"].is_null());

        let text = report.render(ReportFormat::Text).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Downtime: line=Line1"));
    }
}
