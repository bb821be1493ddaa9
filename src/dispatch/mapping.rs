//! Tag-to-line bindings and value classification.
//!
//! Which values mean "down" and which mean "running" is deployment data; it is
//! read from configuration, one [`TagBinding`] per monitored tag.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;

use super::TagValue;

/// State of a line implied by one tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineState {
    Down,
    Running,
}

impl LineState {
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Running => "running",
        }
    }
}

/// Binding of one monitored tag to a line.
#[derive(Debug, Clone)]
pub struct TagBinding {
    pub tag: Arc<str>,
    pub line: Arc<str>,
    pub down: Vec<TagValue>,
    pub running: Vec<TagValue>,
}

impl TagBinding {
    pub fn new(
        tag: impl Into<Arc<str>>,
        line: impl Into<Arc<str>>,
        down: Vec<TagValue>,
        running: Vec<TagValue>,
    ) -> Self {
        Self {
            tag: tag.into(),
            line: line.into(),
            down,
            running,
        }
    }

    /// Classifies `value`; `None` if it is in neither set.
    ///
    /// Down wins if a value is listed in both (configuration validation rejects that).
    pub fn classify(&self, value: &TagValue) -> Option<LineState> {
        if self.down.iter().any(|v| v.matches(value)) {
            Some(LineState::Down)
        } else if self.running.iter().any(|v| v.matches(value)) {
            Some(LineState::Running)
        } else {
            None
        }
    }
}

/// All tag bindings, keyed by tag display name.
#[derive(Debug, Clone, Default)]
pub struct TagMapping {
    bindings: HashMap<Arc<str>, TagBinding>,
}

impl TagMapping {
    pub fn new(bindings: impl IntoIterator<Item = TagBinding>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|b| (Arc::clone(&b.tag), b))
                .collect(),
        }
    }

    /// Builds the mapping from `[[tags]]`; a tag without `line` binds to a line of its own name.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.tags.iter().map(|t| {
            TagBinding::new(
                t.display_name.as_str(),
                t.line_name(),
                t.down.clone(),
                t.running.clone(),
            )
        }))
    }

    pub fn get(&self, tag: &str) -> Option<&TagBinding> {
        self.bindings.get(tag)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
