//! Single-field input handler.
//!
//! # Responsibility
//! - Extract one field, run its validation policy, dispatch the result.
//! - Apply valid values to the model, or create a child object for
//!   new-object handlers.
//!
//! # Invariants
//! - The model is assigned at most once per distinct value: a value equal to
//!   the view's cached value is a no-op.
//! - A field name containing the reserved delimiter never reaches the model.

use crate::config::HandlerSettings;
use crate::handler::check::{name_in_use, InputCheck, Validation, Verdict};
use crate::handler::extract::Extraction;
use crate::handler::HandlerKind;
use crate::model::attributes::{ChangeSet, FieldModel, ModelError};
use crate::model::value::{InputValue, Outcome};
use crate::model::view::FieldView;
use crate::request::{FormRequest, RequestError};
use crate::store::{ObjectFactory, StoreError};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fatal handler errors; user input problems never end up here.
#[derive(Debug)]
pub enum HandlerError {
    /// Field name contains the delimiter reserved for attribute updates.
    ReservedDelimiter { field: String, delimiter: char },
    /// Model refused the keyed assignment.
    Model(ModelError),
    /// Request lacks what the handler needs to locate objects.
    Request(RequestError),
    /// Object store failure during lookup or creation.
    Store(StoreError),
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservedDelimiter { field, delimiter } => write!(
                f,
                "handler field `{field}` contains reserved delimiter `{delimiter}`"
            ),
            Self::Model(err) => write!(f, "{err}"),
            Self::Request(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReservedDelimiter { .. } => None,
            Self::Model(err) => Some(err),
            Self::Request(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ModelError> for HandlerError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<RequestError> for HandlerError {
    fn from(value: RequestError) -> Self {
        Self::Request(value)
    }
}

impl From<StoreError> for HandlerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// What one `handle` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleReport {
    pub field: String,
    pub outcome: Outcome,
    /// Extracted value; `None` when the field was absent.
    pub value: Option<InputValue>,
    /// Whether the model was assigned or a child object was created.
    pub changed: bool,
}

impl HandleReport {
    /// Splits into the `(outcome, value)` pair callers usually branch on.
    pub fn into_pair(self) -> (Outcome, Option<InputValue>) {
        (self.outcome, self.value)
    }
}

/// Result of the success action for a valid value.
enum Applied {
    Changed(bool),
    /// The store refused the name after validation passed.
    Rejected(String),
}

/// Binds one request field to extraction, validation and a success action.
pub struct InputHandler {
    field: String,
    extraction: Extraction,
    validation: Validation,
    settings: HandlerSettings,
}

impl InputHandler {
    pub fn new(field: impl Into<String>, extraction: Extraction, validation: Validation) -> Self {
        Self {
            field: field.into(),
            extraction,
            validation,
            settings: HandlerSettings::default(),
        }
    }

    /// Accepts any present value.
    pub fn anything(field: impl Into<String>) -> Self {
        Self::new(field, Extraction::FirstValue, Validation::Anything)
    }

    /// Accepts a single decimal integer.
    pub fn integer(field: impl Into<String>) -> Self {
        Self::new(field, Extraction::FirstValue, Validation::Integer)
    }

    /// Accepts a single float.
    pub fn float(field: impl Into<String>) -> Self {
        Self::new(field, Extraction::FirstValue, Validation::Float)
    }

    /// Exposes every submitted value without validating or applying it.
    pub fn list(field: impl Into<String>) -> Self {
        Self::new(field, Extraction::AllValues, Validation::Skip)
    }

    /// Creates a child object named by the field value under the request's
    /// parent container.
    pub fn new_object(field: impl Into<String>, factory: impl ObjectFactory + 'static) -> Self {
        Self::new(
            field,
            Extraction::FirstValue,
            Validation::NewObjectName(Box::new(factory)),
        )
    }

    /// Uses a caller-supplied check; valid values are applied to the model.
    pub fn custom(
        field: impl Into<String>,
        extraction: Extraction,
        check: impl InputCheck + 'static,
    ) -> Self {
        Self::new(field, extraction, Validation::Custom(Box::new(check)))
    }

    pub fn with_settings(mut self, settings: HandlerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn extraction(&self) -> Extraction {
        self.extraction
    }

    pub fn kind(&self) -> HandlerKind {
        self.validation.kind()
    }

    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Extracts, validates and dispatches this handler's field.
    ///
    /// # Errors
    /// - `ReservedDelimiter` when a valid value would be assigned through a
    ///   field name containing the reserved delimiter.
    /// - `Model`, `Request`, `Store` when a collaborator fails.
    pub fn handle(
        &self,
        request: &FormRequest<'_>,
        model: &mut dyn FieldModel,
        view: &mut dyn FieldView,
    ) -> Result<HandleReport, HandlerError> {
        let value = self.extraction.extract(request, &self.field);
        let verdict = match &value {
            Some(value) => self.validation.verdict(request, value, &self.settings)?,
            None => Verdict::NotApplicable,
        };

        let (outcome, changed) = match (verdict, &value) {
            (Verdict::Valid, Some(value)) => {
                match self.handle_valid(request, value, model, view)? {
                    Applied::Changed(changed) => (Outcome::Valid, changed),
                    Applied::Rejected(reason) => {
                        self.handle_invalid(Some(reason), view);
                        (Outcome::Invalid, false)
                    }
                }
            }
            (Verdict::Invalid(reason), Some(_)) => {
                self.handle_invalid(reason, view);
                (Outcome::Invalid, false)
            }
            (verdict, _) => (verdict.outcome(), false),
        };

        debug!(
            "event=input_handle module=handler status=ok field={} kind={} outcome={} changed={}",
            self.field,
            self.kind().as_str(),
            outcome.as_str(),
            changed
        );

        Ok(HandleReport {
            field: self.field.clone(),
            outcome,
            value,
            changed,
        })
    }

    fn handle_valid(
        &self,
        request: &FormRequest<'_>,
        value: &InputValue,
        model: &mut dyn FieldModel,
        view: &mut dyn FieldView,
    ) -> Result<Applied, HandlerError> {
        match &self.validation {
            Validation::NewObjectName(factory) => {
                self.create_object(request, value, factory.as_ref())
            }
            _ => self.apply_to_model(value, model, view).map(Applied::Changed),
        }
    }

    fn apply_to_model(
        &self,
        value: &InputValue,
        model: &mut dyn FieldModel,
        view: &mut dyn FieldView,
    ) -> Result<bool, HandlerError> {
        let text = value.to_string();
        let delimiter = self.settings.field_delimiter;
        if self.field.contains(delimiter) {
            error!(
                "event=input_apply module=handler status=error error_code=reserved_delimiter field={}",
                self.field
            );
            return Err(HandlerError::ReservedDelimiter {
                field: self.field.clone(),
                delimiter,
            });
        }

        if view.cached_value() == Some(text.as_str()) {
            return Ok(false);
        }

        model.assign(&self.field, &text)?;
        let mut changes = ChangeSet::new();
        changes.insert(self.field.clone(), text.clone());
        model.notify(&changes);
        view.sync_value(&text);
        Ok(true)
    }

    fn create_object(
        &self,
        request: &FormRequest<'_>,
        value: &InputValue,
        factory: &dyn ObjectFactory,
    ) -> Result<Applied, HandlerError> {
        let name = value.to_string();
        let container = request.parent_container()?;
        let object = factory.create(&name);
        match container.create_child(&name, &object) {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { .. }) => {
                info!(
                    "event=object_create module=handler status=rejected reason=name_in_use field={} parent={}",
                    self.field,
                    container.location()
                );
                return Ok(Applied::Rejected(name_in_use(&name)));
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            "event=object_create module=handler status=ok field={} kind={} uuid={} parent={}",
            self.field,
            object.kind,
            object.uuid,
            container.location()
        );
        Ok(Applied::Changed(true))
    }

    fn handle_invalid(&self, reason: Option<String>, view: &mut dyn FieldView) {
        let message = reason.unwrap_or_else(|| self.settings.generic_error.clone());
        view.set_error(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::{HandlerError, InputHandler};
    use crate::config::HandlerSettings;
    use crate::handler::check::{InputCheck, Verdict};
    use crate::handler::extract::Extraction;
    use crate::model::attributes::RecordModel;
    use crate::model::value::{InputValue, Outcome};
    use crate::model::view::{FieldView, WidgetView};
    use crate::request::FormRequest;

    struct RejectAll;

    impl InputCheck for RejectAll {
        fn check(
            &self,
            _request: &FormRequest<'_>,
            _value: &InputValue,
        ) -> Result<Verdict, HandlerError> {
            Ok(Verdict::Invalid(None))
        }
    }

    #[test]
    fn invalid_without_reason_reports_generic_error() {
        let handler = InputHandler::custom("title", Extraction::FirstValue, RejectAll);
        let request = FormRequest::new().with_arg("title", "x");
        let mut model = RecordModel::new();
        let mut view = WidgetView::new();

        let report = handler.handle(&request, &mut model, &mut view).unwrap();
        assert_eq!(report.outcome, Outcome::Invalid);
        assert_eq!(view.error(), Some("Error!"));
        assert!(model.values().is_empty());
    }

    #[test]
    fn generic_error_follows_settings() {
        let settings = HandlerSettings {
            generic_error: "Nope".to_string(),
            ..HandlerSettings::default()
        };
        let handler =
            InputHandler::custom("title", Extraction::FirstValue, RejectAll).with_settings(settings);
        let request = FormRequest::new().with_arg("title", "x");
        let mut view = WidgetView::new();

        handler
            .handle(&request, &mut RecordModel::new(), &mut view)
            .unwrap();
        assert_eq!(view.error(), Some("Nope"));
    }

    #[test]
    fn delimiter_check_runs_before_cache_comparison() {
        let handler = InputHandler::anything("a;b");
        let request = FormRequest::new().with_arg("a;b", "same");
        let mut view = WidgetView::with_cached("same");

        let err = handler
            .handle(&request, &mut RecordModel::new(), &mut view)
            .unwrap_err();
        assert!(matches!(err, HandlerError::ReservedDelimiter { delimiter: ';', .. }));
    }

    #[test]
    fn custom_delimiter_is_honoured() {
        let settings = HandlerSettings {
            field_delimiter: '|',
            ..HandlerSettings::default()
        };
        let request = FormRequest::new().with_arg("a;b", "v").with_arg("a|b", "v");
        let mut model = RecordModel::new();

        InputHandler::anything("a;b")
            .with_settings(settings.clone())
            .handle(&request, &mut model, &mut WidgetView::new())
            .unwrap();
        assert_eq!(model.get("a;b"), Some("v"));

        let err = InputHandler::anything("a|b")
            .with_settings(settings)
            .handle(&request, &mut model, &mut WidgetView::new())
            .unwrap_err();
        assert!(matches!(err, HandlerError::ReservedDelimiter { delimiter: '|', .. }));
    }

    #[test]
    fn into_pair_returns_outcome_and_value() {
        let request = FormRequest::new().with_arg("age", "3");
        let report = InputHandler::integer("age")
            .handle(&request, &mut RecordModel::new(), &mut WidgetView::new())
            .unwrap();
        assert_eq!(
            report.into_pair(),
            (Outcome::Valid, Some(InputValue::Single("3".to_string())))
        );
    }

    #[test]
    fn valid_apply_syncs_view() {
        let request = FormRequest::new().with_arg("age", "3");
        let mut view = WidgetView::new();
        InputHandler::integer("age")
            .handle(&request, &mut RecordModel::new(), &mut view)
            .unwrap();
        assert_eq!(view.cached_value(), Some("3"));
    }
}
