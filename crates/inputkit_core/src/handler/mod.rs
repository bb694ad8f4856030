//! Input handlers: extract, validate, then apply or create.
//!
//! # Responsibility
//! - Bind one request field to a validation policy and a success action.
//! - Route user input errors to the view, never to `Err`.
//!
//! # Invariants
//! - An absent field yields `Outcome::NotApplicable` with no side effects.
//! - Invalid input never mutates the model.
//! - Configuration mistakes surface as `HandlerError`/`RegistryError`.

pub mod check;
pub mod extract;
pub mod input_handler;
pub mod registry;

pub use check::{InputCheck, Validation, Verdict};
pub use extract::Extraction;
pub use input_handler::{HandleReport, HandlerError, InputHandler};
pub use registry::{FormReport, HandlerRegistry, RegistryError};

use serde::Deserialize;

/// Handler variant tag used in configuration and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Anything,
    Integer,
    Float,
    List,
    NewObject,
    /// Caller-supplied check; not constructible from configuration.
    #[serde(skip)]
    Custom,
}

impl HandlerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anything => "anything",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::List => "list",
            Self::NewObject => "new_object",
            Self::Custom => "custom",
        }
    }
}
