//! Handler registry: runs every bound field of a form over one request.
//!
//! # Invariants
//! - Field names are unique and non-blank within one registry.
//! - Processing order is sorted by field name.
//! - A fatal handler error aborts processing; later handlers do not run.

use crate::config::{FormConfig, HandlerSpec};
use crate::handler::input_handler::{HandleReport, HandlerError, InputHandler};
use crate::handler::HandlerKind;
use crate::model::attributes::FieldModel;
use crate::model::value::Outcome;
use crate::model::view::ViewDirectory;
use crate::request::FormRequest;
use crate::store::NamedObjectFactory;
use log::{error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registry build/processing errors.
#[derive(Debug)]
pub enum RegistryError {
    /// Field name is blank after trim.
    BlankField,
    /// Another handler already binds the field.
    DuplicateField(String),
    /// `new_object` entry without `object_kind`.
    MissingObjectKind(String),
    /// `custom` cannot be declared in configuration.
    UnsupportedKind { field: String, kind: HandlerKind },
    /// No view is bound for the field.
    ViewNotBound(String),
    /// Handler failed fatally.
    Handler { field: String, source: HandlerError },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField => write!(f, "handler field must not be blank"),
            Self::DuplicateField(field) => write!(f, "handler already registered: {field}"),
            Self::MissingObjectKind(field) => {
                write!(f, "new_object handler `{field}` requires object_kind")
            }
            Self::UnsupportedKind { field, kind } => write!(
                f,
                "handler kind `{}` cannot be configured for `{field}`",
                kind.as_str()
            ),
            Self::ViewNotBound(field) => write!(f, "no view bound for field: {field}"),
            Self::Handler { field, source } => write!(f, "handler `{field}` failed: {source}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Handler { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Reports of one processed request, sorted by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormReport {
    pub reports: Vec<HandleReport>,
}

impl FormReport {
    /// True when no handler reported invalid input.
    pub fn all_valid(&self) -> bool {
        self.reports
            .iter()
            .all(|report| report.outcome != Outcome::Invalid)
    }

    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields_where(|report| report.outcome == Outcome::Invalid)
    }

    pub fn changed_fields(&self) -> Vec<&str> {
        self.fields_where(|report| report.changed)
    }

    pub fn outcome_of(&self, field: &str) -> Option<Outcome> {
        self.get(field).map(|report| report.outcome)
    }

    pub fn get(&self, field: &str) -> Option<&HandleReport> {
        self.reports.iter().find(|report| report.field == field)
    }

    fn fields_where(&self, predicate: impl Fn(&HandleReport) -> bool) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|report| predicate(report))
            .map(|report| report.field.as_str())
            .collect()
    }
}

/// Field-keyed set of handlers for one form.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, InputHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds handlers from a declarative configuration.
    pub fn from_config(config: &FormConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in &config.handlers {
            let handler = build_handler(spec)?.with_settings(config.settings.clone());
            registry.register(handler)?;
        }
        info!(
            "event=registry_build module=registry status=ok handlers={}",
            registry.len()
        );
        Ok(registry)
    }

    /// Registers one handler under its field name.
    pub fn register(&mut self, handler: InputHandler) -> Result<(), RegistryError> {
        let field = handler.field();
        if field.trim().is_empty() {
            return Err(RegistryError::BlankField);
        }
        if self.handlers.contains_key(field) {
            return Err(RegistryError::DuplicateField(field.to_string()));
        }
        self.handlers.insert(field.to_string(), handler);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns sorted field names.
    pub fn fields(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn get(&self, field: &str) -> Option<&InputHandler> {
        self.handlers.get(field)
    }

    /// Runs every handler against `request`.
    pub fn process(
        &self,
        request: &FormRequest<'_>,
        model: &mut dyn FieldModel,
        views: &mut dyn ViewDirectory,
    ) -> Result<FormReport, RegistryError> {
        let mut reports = Vec::with_capacity(self.handlers.len());
        for (field, handler) in &self.handlers {
            let view = views
                .view_mut(field)
                .ok_or_else(|| RegistryError::ViewNotBound(field.clone()))?;
            let report = handler.handle(request, model, view).map_err(|source| {
                error!(
                    "event=form_process module=registry status=error field={} error={}",
                    field, source
                );
                RegistryError::Handler {
                    field: field.clone(),
                    source,
                }
            })?;
            reports.push(report);
        }

        let report = FormReport { reports };
        info!(
            "event=form_process module=registry status=ok handlers={} invalid={} changed={}",
            report.reports.len(),
            report.invalid_fields().len(),
            report.changed_fields().len()
        );
        Ok(report)
    }
}

fn build_handler(spec: &HandlerSpec) -> Result<InputHandler, RegistryError> {
    let field = spec.field.clone();
    let handler = match spec.kind {
        HandlerKind::Anything => InputHandler::anything(field),
        HandlerKind::Integer => InputHandler::integer(field),
        HandlerKind::Float => InputHandler::float(field),
        HandlerKind::List => InputHandler::list(field),
        HandlerKind::NewObject => {
            let kind = spec
                .object_kind
                .as_deref()
                .map(str::trim)
                .filter(|kind| !kind.is_empty())
                .ok_or_else(|| RegistryError::MissingObjectKind(spec.field.clone()))?;
            InputHandler::new_object(field, NamedObjectFactory::new(kind))
        }
        HandlerKind::Custom => {
            return Err(RegistryError::UnsupportedKind {
                field,
                kind: spec.kind,
            })
        }
    };
    Ok(handler)
}
