//! View contracts for handler feedback.

use std::collections::BTreeMap;

/// View widget bound to one handler field.
pub trait FieldView {
    /// Value currently shown for the field, if any.
    fn cached_value(&self) -> Option<&str>;
    /// Reports a user-facing validation error.
    fn set_error(&mut self, message: &str);
    /// Mirrors a value just written to the model.
    fn sync_value(&mut self, _value: &str) {}
}

/// In-memory widget keeping its cached value and last error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetView {
    cached: Option<String>,
    error: Option<String>,
}

impl WidgetView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a widget already showing `value`.
    pub fn with_cached(value: impl Into<String>) -> Self {
        Self {
            cached: Some(value.into()),
            error: None,
        }
    }

    /// Last reported error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl FieldView for WidgetView {
    fn cached_value(&self) -> Option<&str> {
        self.cached.as_deref()
    }

    fn set_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn sync_value(&mut self, value: &str) {
        self.cached = Some(value.to_string());
        self.error = None;
    }
}

/// Lookup of views by handler field name.
pub trait ViewDirectory {
    fn view_mut(&mut self, field: &str) -> Option<&mut dyn FieldView>;
}

impl<V: FieldView> ViewDirectory for BTreeMap<String, V> {
    fn view_mut(&mut self, field: &str) -> Option<&mut dyn FieldView> {
        self.get_mut(field).map(|view| view as &mut dyn FieldView)
    }
}
