//! Keyed-setter models updated by input handlers.
//!
//! # Responsibility
//! - Map field names to explicit setter functions.
//! - Fan out change notifications to registered observers.
//!
//! # Invariants
//! - Assigning an unregistered field fails; nothing is created implicitly on
//!   `AttributeModel`.
//! - Observers receive the change set exactly once per `notify` call.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field name to new text value, as passed to observers.
pub type ChangeSet = BTreeMap<String, String>;

/// Setter bound to one field of a model target.
pub type FieldSetter<T> = Box<dyn Fn(&mut T, &str) -> Result<(), String>>;

/// Observer callback invoked after a model change.
pub type ModelObserver = Box<dyn Fn(&ChangeSet)>;

/// Errors from keyed model updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No setter is registered for the field.
    UnknownField(String),
    /// Setter refused the value.
    Rejected { field: String, message: String },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(field) => write!(f, "model has no setter for field `{field}`"),
            Self::Rejected { field, message } => {
                write!(f, "model rejected value for field `{field}`: {message}")
            }
        }
    }
}

impl Error for ModelError {}

/// Model contract used by the apply-to-model success path.
pub trait FieldModel {
    /// Assigns text to one named attribute.
    fn assign(&mut self, field: &str, value: &str) -> Result<(), ModelError>;
    /// Notifies observers of changed attributes.
    fn notify(&mut self, changes: &ChangeSet);
}

/// Model wrapping a typed target with one setter per exposed field.
pub struct AttributeModel<T> {
    target: T,
    setters: BTreeMap<String, FieldSetter<T>>,
    observers: Vec<ModelObserver>,
}

impl<T> AttributeModel<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            setters: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    /// Builder form of [`AttributeModel::register_setter`].
    pub fn with_setter(
        mut self,
        field: impl Into<String>,
        setter: impl Fn(&mut T, &str) -> Result<(), String> + 'static,
    ) -> Self {
        self.register_setter(field, setter);
        self
    }

    /// Binds `field` to a setter, replacing any previous binding.
    pub fn register_setter(
        &mut self,
        field: impl Into<String>,
        setter: impl Fn(&mut T, &str) -> Result<(), String> + 'static,
    ) {
        self.setters.insert(field.into(), Box::new(setter));
    }

    /// Registers an observer called on every `notify`.
    pub fn subscribe(&mut self, observer: impl Fn(&ChangeSet) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.setters.contains_key(field)
    }

    /// Returns registered field names in sorted order.
    pub fn fields(&self) -> Vec<&str> {
        self.setters.keys().map(String::as_str).collect()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }
}

impl<T> FieldModel for AttributeModel<T> {
    fn assign(&mut self, field: &str, value: &str) -> Result<(), ModelError> {
        let setter = self
            .setters
            .get(field)
            .ok_or_else(|| ModelError::UnknownField(field.to_string()))?;
        setter(&mut self.target, value).map_err(|message| ModelError::Rejected {
            field: field.to_string(),
            message,
        })
    }

    fn notify(&mut self, changes: &ChangeSet) {
        for observer in &self.observers {
            observer(changes);
        }
    }
}

/// Untyped string record that accepts any field.
///
/// Every `notify` call is kept in `notifications` for later inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordModel {
    values: BTreeMap<String, String>,
    notifications: Vec<ChangeSet>,
}

impl RecordModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn notifications(&self) -> &[ChangeSet] {
        &self.notifications
    }
}

impl FieldModel for RecordModel {
    fn assign(&mut self, field: &str, value: &str) -> Result<(), ModelError> {
        self.values.insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn notify(&mut self, changes: &ChangeSet) {
        self.notifications.push(changes.clone());
    }
}
