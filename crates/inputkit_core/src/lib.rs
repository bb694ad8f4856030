//! Input-validation handlers for MVC-style web forms.
//! This crate owns the extract/validate/apply protocol and its collaborators.

pub mod config;
pub mod handler;
pub mod logging;
pub mod model;
pub mod request;
pub mod store;

pub use config::{FormConfig, HandlerSettings, HandlerSpec, SettingsError};
pub use handler::{
    Extraction, FormReport, HandleReport, HandlerError, HandlerKind, HandlerRegistry, InputCheck,
    InputHandler, RegistryError, Validation, Verdict,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attributes::{AttributeModel, ChangeSet, FieldModel, ModelError, RecordModel};
pub use model::value::{InputValue, Outcome};
pub use model::view::{FieldView, ViewDirectory, WidgetView};
pub use request::{FormRequest, PathRef, RequestError};
pub use store::schema::{open_object_db, open_object_db_in_memory};
pub use store::{
    DirectoryObjectStore, NamedObjectFactory, ObjectFactory, ObjectStore, ParentContainer,
    SqliteObjectStore, StoreError, StoreResult, StoredObject,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
