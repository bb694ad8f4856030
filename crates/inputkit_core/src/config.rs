//! Handler settings and declarative handler configuration.
//!
//! # Responsibility
//! - Hold the tunable characters/messages used by input handlers.
//! - Load handler sets from JSON documents.
//!
//! # Invariants
//! - Loaded settings are always validated before use.
//! - Unknown keys are rejected instead of silently ignored.

use crate::handler::HandlerKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Default delimiter reserved by the attribute-update mechanism.
pub const DEFAULT_FIELD_DELIMITER: char = ';';
/// Default prefix that new object names must not start with.
pub const DEFAULT_RESERVED_PREFIX: char = '_';
/// Default file suffix for directory-backed child objects.
pub const DEFAULT_OBJECT_SUFFIX: &str = ".json";
/// Default message reported when a check supplies no reason.
pub const DEFAULT_GENERIC_ERROR: &str = "Error!";

/// Tunables shared by every handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerSettings {
    /// Character that must never appear in a field name used for mutation.
    pub field_delimiter: char,
    /// Character that new object names must not start with.
    pub reserved_prefix: char,
    /// Suffix appended to child names by directory-backed stores.
    pub object_suffix: String,
    /// Fallback error shown when a check gives no reason.
    pub generic_error: String,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            field_delimiter: DEFAULT_FIELD_DELIMITER,
            reserved_prefix: DEFAULT_RESERVED_PREFIX,
            object_suffix: DEFAULT_OBJECT_SUFFIX.to_string(),
            generic_error: DEFAULT_GENERIC_ERROR.to_string(),
        }
    }
}

impl HandlerSettings {
    /// Parses and validates settings from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw).map_err(SettingsError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
        Self::from_json_str(raw.as_str())
    }

    /// Checks value-level constraints serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.object_suffix.is_empty() {
            return Err(SettingsError::EmptyObjectSuffix);
        }
        if self.object_suffix.contains(['/', '\\']) {
            return Err(SettingsError::InvalidObjectSuffix(
                self.object_suffix.clone(),
            ));
        }
        if self.generic_error.trim().is_empty() {
            return Err(SettingsError::BlankGenericError);
        }
        Ok(())
    }
}

/// One declared handler binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerSpec {
    /// Request field name bound by the handler.
    pub field: String,
    /// Validation variant.
    pub kind: HandlerKind,
    /// Object kind created by `new_object` handlers.
    #[serde(default)]
    pub object_kind: Option<String>,
}

/// Declarative handler set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    #[serde(default)]
    pub settings: HandlerSettings,
    #[serde(default)]
    pub handlers: Vec<HandlerSpec>,
}

impl FormConfig {
    /// Parses a form configuration and validates its settings block.
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let config: Self = serde_json::from_str(raw).map_err(SettingsError::Parse)?;
        config.settings.validate()?;
        Ok(config)
    }

    /// Reads a form configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
        Self::from_json_str(raw.as_str())
    }
}

/// Settings load/validation errors.
#[derive(Debug)]
pub enum SettingsError {
    /// Settings file could not be read.
    Io(std::io::Error),
    /// Document is not valid JSON for the expected shape.
    Parse(serde_json::Error),
    /// `object_suffix` is empty.
    EmptyObjectSuffix,
    /// `object_suffix` contains a path separator.
    InvalidObjectSuffix(String),
    /// `generic_error` is blank after trim.
    BlankGenericError,
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read settings: {err}"),
            Self::Parse(err) => write!(f, "invalid settings document: {err}"),
            Self::EmptyObjectSuffix => write!(f, "object_suffix must not be empty"),
            Self::InvalidObjectSuffix(value) => {
                write!(f, "object_suffix must not contain path separators: {value}")
            }
            Self::BlankGenericError => write!(f, "generic_error must not be blank"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FormConfig, HandlerSettings, SettingsError};
    use crate::handler::HandlerKind;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = HandlerSettings::from_json_str("{}").expect("defaults should load");
        assert_eq!(settings, HandlerSettings::default());
        assert_eq!(settings.field_delimiter, ';');
        assert_eq!(settings.reserved_prefix, '_');
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let settings = HandlerSettings::from_json_str(r#"{"reserved_prefix": "."}"#)
            .expect("partial settings should load");
        assert_eq!(settings.reserved_prefix, '.');
        assert_eq!(settings.object_suffix, ".json");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = HandlerSettings::from_json_str(r#"{"delimiter": ";"}"#)
            .expect_err("unknown key must fail");
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn rejects_suffix_with_separator() {
        let err = HandlerSettings::from_json_str(r#"{"object_suffix": "a/b"}"#)
            .expect_err("separator suffix must fail");
        assert!(matches!(err, SettingsError::InvalidObjectSuffix(value) if value == "a/b"));
    }

    #[test]
    fn rejects_blank_generic_error() {
        let err = HandlerSettings::from_json_str(r#"{"generic_error": "  "}"#)
            .expect_err("blank message must fail");
        assert!(matches!(err, SettingsError::BlankGenericError));
    }

    #[test]
    fn form_config_parses_handler_specs() {
        let config = FormConfig::from_json_str(
            r#"{
                "handlers": [
                    {"field": "age", "kind": "integer"},
                    {"field": "project", "kind": "new_object", "object_kind": "project"}
                ]
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.handlers.len(), 2);
        assert_eq!(config.handlers[0].kind, HandlerKind::Integer);
        assert_eq!(config.handlers[1].kind, HandlerKind::NewObject);
        assert_eq!(config.handlers[1].object_kind.as_deref(), Some("project"));
    }
}
