//! Extracted input values and validation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Result of validating one extracted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Input passed the handler check and the success path ran.
    Valid,
    /// Input failed the handler check and the failure path ran.
    Invalid,
    /// Field was absent (or the check does not apply); nothing ran.
    NotApplicable,
}

impl Outcome {
    /// Stable string id used in log lines and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::NotApplicable => "not_applicable",
        }
    }
}

/// Raw value extracted from a request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// First submitted value.
    Single(String),
    /// Every submitted value, in submission order.
    Many(Vec<String>),
}

impl InputValue {
    /// Returns the value when exactly one string was extracted.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value.as_str()),
            Self::Many(_) => None,
        }
    }

    /// Returns every extracted string.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Text form stored on the model: list values are joined with `,`.
impl Display for InputValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{value}"),
            Self::Many(values) => write!(f, "{}", values.join(",")),
        }
    }
}
