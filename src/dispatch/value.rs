use std::fmt;

use serde::{Deserialize, Serialize};

/// Value carried by a tag notification or listed in a tag mapping.
///
/// Numeric comparison crosses representations: `Int(1)`, `Float(1.0)` and
/// `Bool(true)` all match each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl TagValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }

    /// True if `self` and `other` denote the same value.
    pub fn matches(&self, other: &TagValue) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for TagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for TagValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_match_across_representations() {
        assert!(TagValue::Int(1).matches(&TagValue::Float(1.0)));
        assert!(TagValue::Bool(true).matches(&TagValue::Int(1)));
        assert!(TagValue::Bool(false).matches(&TagValue::Float(0.0)));
        assert!(!TagValue::Int(2).matches(&TagValue::Int(3)));
    }

    #[test]
    fn text_matches_only_text() {
        assert!(TagValue::from("STOPPED").matches(&TagValue::from("STOPPED")));
        assert!(!TagValue::from("1").matches(&TagValue::Int(1)));
    }

    #[test]
    fn deserializes_untagged() {
        let v: Vec<TagValue> = serde_json::from_str(r#"[true, 3, 2.5, "idle"]"#).unwrap();
        assert_eq!(
            v,
            vec![
                TagValue::Bool(true),
                TagValue::Int(3),
                TagValue::Float(2.5),
                TagValue::Text("idle".into()),
            ]
        );
    }
}
