//! Validation policies applied to extracted input.
//!
//! # Invariants
//! - Checks only run on present values; absence is decided before a check.
//! - Name checks reject reserved prefixes before consulting the store.

use crate::config::HandlerSettings;
use crate::handler::input_handler::HandlerError;
use crate::handler::HandlerKind;
use crate::model::value::{InputValue, Outcome};
use crate::request::FormRequest;
use crate::store::ObjectFactory;
use once_cell::sync::Lazy;
use regex::Regex;

static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid integer regex"));

/// Check result for one present value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Rejected; the reason is shown to the user when present.
    Invalid(Option<String>),
    NotApplicable,
}

impl Verdict {
    /// Rejection carrying a user-facing reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(Some(reason.into()))
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Valid => Outcome::Valid,
            Self::Invalid(_) => Outcome::Invalid,
            Self::NotApplicable => Outcome::NotApplicable,
        }
    }
}

/// Caller-defined validation predicate.
pub trait InputCheck {
    fn check(
        &self,
        request: &FormRequest<'_>,
        value: &InputValue,
    ) -> Result<Verdict, HandlerError>;
}

/// Validation policy of one handler.
pub enum Validation {
    /// Any present value.
    Anything,
    /// Decimal integer of any magnitude.
    Integer,
    /// Anything `f64` parses.
    Float,
    /// Never applies; list handlers only expose their input.
    Skip,
    /// Unique child name; valid names create an object with the factory.
    NewObjectName(Box<dyn ObjectFactory>),
    Custom(Box<dyn InputCheck>),
}

impl Validation {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Anything => HandlerKind::Anything,
            Self::Integer => HandlerKind::Integer,
            Self::Float => HandlerKind::Float,
            Self::Skip => HandlerKind::List,
            Self::NewObjectName(_) => HandlerKind::NewObject,
            Self::Custom(_) => HandlerKind::Custom,
        }
    }

    /// Runs the policy against a present value.
    pub fn verdict(
        &self,
        request: &FormRequest<'_>,
        value: &InputValue,
        settings: &HandlerSettings,
    ) -> Result<Verdict, HandlerError> {
        match self {
            Self::Anything => Ok(Verdict::Valid),
            Self::Integer => Ok(check_integer(value)),
            Self::Float => Ok(check_float(value)),
            Self::Skip => Ok(Verdict::NotApplicable),
            Self::NewObjectName(_) => check_object_name(request, value, settings),
            Self::Custom(check) => check.check(request, value),
        }
    }
}

fn check_integer(value: &InputValue) -> Verdict {
    match value.as_single() {
        Some(raw) if INTEGER_RE.is_match(raw.trim()) => Verdict::Valid,
        _ => Verdict::invalid(format!(
            "{value} is not an integer. Please enter an integer."
        )),
    }
}

fn check_float(value: &InputValue) -> Verdict {
    match value.as_single() {
        Some(raw) if raw.trim().parse::<f64>().is_ok() => Verdict::Valid,
        _ => Verdict::invalid(format!("{value} is not a float. Please enter a float.")),
    }
}

fn check_object_name(
    request: &FormRequest<'_>,
    value: &InputValue,
    settings: &HandlerSettings,
) -> Result<Verdict, HandlerError> {
    let name = value.to_string();
    if name.is_empty() {
        return Ok(Verdict::invalid("An object's name must not be empty."));
    }
    if name.starts_with(settings.reserved_prefix) {
        return Ok(Verdict::invalid(format!(
            "An object's name must not start with `{}`.",
            settings.reserved_prefix
        )));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Ok(Verdict::invalid(
            "An object's name must not contain path separators.",
        ));
    }

    let container = request.parent_container()?;
    if container.contains(name.as_str())? {
        return Ok(Verdict::invalid(name_in_use(&name)));
    }
    Ok(Verdict::Valid)
}

pub(crate) fn name_in_use(name: &str) -> String {
    format!("The name {name} is already in use.")
}
