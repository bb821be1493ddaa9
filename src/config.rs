//! # Runtime configuration.
//!
//! [`Config`] is read with the `config` crate from an optional TOML file, then
//! overlaid with `LINEVISOR__*` environment variables (`__` separates nested
//! keys), then checked by [`Config::validate`].
//!
//! ```toml
//! endpoint = "opc.tcp://plc-01:4840"
//! accept_untrusted = true
//!
//! [[tags]]
//! display_name = "Line1.State"
//! address = "ns=2;s=Line1.State"
//! line = "Line1"
//! down = [0, 2]
//! running = [1]
//! ```
//!
//! - `LINEVISOR__ENDPOINT=opc.tcp://other:4840` -> `endpoint`
//! - `LINEVISOR__RUN_TIME_SECS=60` -> `run_time_secs`

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::TagValue;
use crate::downtime::ReportFormat;
use crate::error::{ConfigError, ValidationError};
use crate::session::SessionSettings;

/// One monitored tag and its down/running value sets.
#[derive(Debug, Clone, Deserialize)]
pub struct TagConfig {
    /// Name reported in notifications.
    pub display_name: String,
    /// Server node address.
    pub address: String,
    /// Line the tag belongs to; defaults to `display_name`.
    #[serde(default)]
    pub line: Option<String>,
    /// Values meaning the line is down.
    #[serde(default)]
    pub down: Vec<TagValue>,
    /// Values meaning the line is running.
    #[serde(default)]
    pub running: Vec<TagValue>,
}

impl TagConfig {
    pub fn line_name(&self) -> &str {
        self.line.as_deref().unwrap_or(&self.display_name)
    }
}

/// Process configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint url of the telemetry source.
    pub endpoint: String,
    /// Accept server certificates the store does not trust.
    pub accept_untrusted: bool,
    /// Delay between reconnect attempts.
    pub reconnect_period_secs: u64,
    /// Subscription publishing interval.
    pub publishing_interval_ms: u64,
    /// Period of elapsed-time refresh for open downtime entries.
    pub refresh_interval_ms: u64,
    /// Stop after this many seconds (0 = run until interrupted).
    pub run_time_secs: u64,
    /// Time allowed for in-flight notifications at shutdown.
    pub grace_secs: u64,
    /// Capacity of the event bus.
    pub bus_capacity: usize,
    /// Format of the final downtime report.
    pub report_format: ReportFormat,
    /// Monitored tags, in subscription order.
    pub tags: Vec<TagConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "opc.tcp://localhost:4840".to_string(),
            accept_untrusted: false,
            reconnect_period_secs: 10,
            publishing_interval_ms: 1000,
            refresh_interval_ms: 1000,
            run_time_secs: 0,
            grace_secs: 5,
            bus_capacity: 1024,
            report_format: ReportFormat::Text,
            tags: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (if any) and the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::Load`] if the file is missing or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg = builder
            .add_source(
                config::Environment::default()
                    .prefix("LINEVISOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    /// Checks cross-field consistency.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.endpoint.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => {}
            _ => return Err(ValidationError::InvalidEndpoint(self.endpoint.clone())),
        }

        for (field, value) in [
            ("reconnect_period_secs", self.reconnect_period_secs),
            ("publishing_interval_ms", self.publishing_interval_ms),
            ("refresh_interval_ms", self.refresh_interval_ms),
        ] {
            if value == 0 {
                return Err(ValidationError::ZeroDuration { field });
            }
        }

        if self.tags.is_empty() {
            return Err(ValidationError::NoTags);
        }

        let mut seen = HashSet::new();
        for tag in &self.tags {
            if !seen.insert(tag.display_name.as_str()) {
                return Err(ValidationError::DuplicateTag(tag.display_name.clone()));
            }
            if tag.address.trim().is_empty() {
                return Err(ValidationError::EmptyAddress(tag.display_name.clone()));
            }
            for (set, values) in [("down", &tag.down), ("running", &tag.running)] {
                if values.is_empty() {
                    return Err(ValidationError::EmptyValueSet {
                        tag: tag.display_name.clone(),
                        set,
                    });
                }
            }
            if let Some(v) = tag
                .down
                .iter()
                .find(|d| tag.running.iter().any(|r| r.matches(d)))
            {
                return Err(ValidationError::OverlappingValues {
                    tag: tag.display_name.clone(),
                    value: v.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn reconnect_period(&self) -> Duration {
        Duration::from_secs(self.reconnect_period_secs)
    }

    pub fn publishing_interval(&self) -> Duration {
        Duration::from_millis(self.publishing_interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Run-time bound, `None` when unbounded.
    pub fn run_time(&self) -> Option<Duration> {
        (self.run_time_secs > 0).then(|| Duration::from_secs(self.run_time_secs))
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::from_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tag(name: &str, down: Vec<TagValue>, running: Vec<TagValue>) -> TagConfig {
        TagConfig {
            display_name: name.to_string(),
            address: format!("ns=2;s={name}"),
            line: None,
            down,
            running,
        }
    }

    fn valid() -> Config {
        Config {
            tags: vec![tag("Line1", vec![TagValue::Int(0)], vec![TagValue::Int(1)])],
            ..Config::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.reconnect_period(), Duration::from_secs(10));
        assert_eq!(cfg.publishing_interval(), Duration::from_secs(1));
        assert_eq!(cfg.run_time(), None);
    }

    #[test]
    fn loads_tags_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
endpoint = "opc.tcp://plc-01:4840"
run_time_secs = 30
report_format = "json"

[[tags]]
display_name = "Line1.State"
address = "ns=2;s=Line1.State"
line = "Line1"
down = [0, 2]
running = [1]

[[tags]]
display_name = "Press"
address = "ns=2;s=Press.Fault"
down = [true]
running = [false]
"#
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.endpoint, "opc.tcp://plc-01:4840");
        assert_eq!(cfg.run_time(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.report_format, ReportFormat::Json);
        assert_eq!(cfg.tags.len(), 2);
        assert_eq!(cfg.tags[0].line_name(), "Line1");
        assert_eq!(cfg.tags[1].line_name(), "Press");
        assert_eq!(cfg.tags[1].down, vec![TagValue::Bool(true)]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validation_rejects_inconsistent_values() {
        assert!(valid().validate().is_ok());

        let mut cfg = valid();
        cfg.endpoint = "plc-01:4840".into();
        assert!(matches!(cfg.validate(), Err(ValidationError::InvalidEndpoint(_))));

        let mut cfg = valid();
        cfg.reconnect_period_secs = 0;
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::ZeroDuration { field: "reconnect_period_secs" })
        );

        let mut cfg = valid();
        cfg.tags.push(cfg.tags[0].clone());
        assert!(matches!(cfg.validate(), Err(ValidationError::DuplicateTag(_))));

        let mut cfg = valid();
        cfg.tags[0].running = vec![TagValue::Float(0.0)];
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::OverlappingValues { .. })
        ));

        let cfg = Config::default();
        assert_eq!(cfg.validate(), Err(ValidationError::NoTags));
    }
}
