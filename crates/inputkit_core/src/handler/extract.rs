//! Request extraction strategies.

use crate::model::value::InputValue;
use crate::request::FormRequest;

/// How a handler reads its field from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Every submitted value.
    AllValues,
    /// Only the first submitted value.
    FirstValue,
}

impl Extraction {
    /// Returns the field value, or `None` when the field is absent or empty.
    pub fn extract(self, request: &FormRequest<'_>, field: &str) -> Option<InputValue> {
        let values = request.args(field).filter(|values| !values.is_empty())?;
        match self {
            Self::AllValues => Some(InputValue::Many(values.to_vec())),
            Self::FirstValue => values.first().cloned().map(InputValue::Single),
        }
    }
}
