//! Child-object persistence collaborators.
//!
//! # Responsibility
//! - Define the store contract used for name-collision checks and creation.
//! - Provide directory-backed and SQLite-backed implementations.
//!
//! # Invariants
//! - A child name is unique within one parent container.
//! - `create_child` never overwrites an existing child.
//! - Handlers only see the store through [`ParentContainer`]; no storage
//!   layout leaks into validation code.

use crate::request::PathRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod directory_store;
pub mod schema;
pub mod sqlite_store;

pub use directory_store::DirectoryObjectStore;
pub use sqlite_store::SqliteObjectStore;

/// Result type used by object store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from object store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure.
    Io(std::io::Error),
    /// SQLite failure.
    Sqlite(rusqlite::Error),
    /// Database schema was written by a newer build.
    SchemaTooNew {
        db_version: u32,
        latest_supported: u32,
    },
    /// Object could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Parent container does not exist.
    ParentNotFound(PathRef),
    /// A child with the same name already exists under the parent.
    AlreadyExists { parent: PathRef, name: String },
    /// Name or path segment cannot be mapped onto the store.
    InvalidName(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted back into a stored object.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "object store io error: {err}"),
            Self::Sqlite(err) => write!(f, "object store sqlite error: {err}"),
            Self::SchemaTooNew {
                db_version,
                latest_supported,
            } => write!(
                f,
                "object store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Serialization(err) => write!(f, "object serialization failed: {err}"),
            Self::ParentNotFound(parent) => write!(f, "parent container not found: {parent}"),
            Self::AlreadyExists { parent, name } => {
                write!(f, "child `{name}` already exists under {parent}")
            }
            Self::InvalidName(name) => write!(f, "invalid object name: {name:?}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "object store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid stored object data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Domain object persisted as a named child of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Stable identity assigned at construction.
    pub uuid: Uuid,
    /// Object type tag, e.g. `project`.
    pub kind: String,
    /// Child name inside the parent container.
    pub name: String,
    /// Free-form string attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl StoredObject {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind: kind.into(),
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Builds the domain object created by new-object handlers.
pub trait ObjectFactory {
    /// Kind tag of created objects.
    fn kind(&self) -> &str;
    /// Constructs a fresh object for `name`.
    fn create(&self, name: &str) -> StoredObject;
}

/// Factory producing objects of one kind with fixed default attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedObjectFactory {
    kind: String,
    defaults: BTreeMap<String, String>,
}

impl NamedObjectFactory {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            defaults: BTreeMap::new(),
        }
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }
}

impl ObjectFactory for NamedObjectFactory {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn create(&self, name: &str) -> StoredObject {
        let mut object = StoredObject::new(self.kind.as_str(), name);
        object.attributes = self.defaults.clone();
        object
    }
}

/// Store contract for named children under parent containers.
pub trait ObjectStore {
    /// Returns whether `parent` already has a child called `name`.
    fn child_exists(&self, parent: &PathRef, name: &str) -> StoreResult<bool>;
    /// Persists `object` as child `name` of `parent`.
    fn create_child(&self, parent: &PathRef, name: &str, object: &StoredObject)
        -> StoreResult<()>;
    /// Loads one child, if present.
    fn load_child(&self, parent: &PathRef, name: &str) -> StoreResult<Option<StoredObject>>;
    /// Lists child names under `parent` in sorted order.
    fn list_children(&self, parent: &PathRef) -> StoreResult<Vec<String>>;
}

/// Parent container resolved from a request path reference.
pub struct ParentContainer<'a> {
    store: &'a dyn ObjectStore,
    location: PathRef,
}

impl<'a> ParentContainer<'a> {
    pub fn new(store: &'a dyn ObjectStore, location: PathRef) -> Self {
        Self { store, location }
    }

    pub fn location(&self) -> &PathRef {
        &self.location
    }

    /// Returns whether a sibling named `name` already exists.
    pub fn contains(&self, name: &str) -> StoreResult<bool> {
        self.store.child_exists(&self.location, name)
    }

    /// Persists `object` as a named child of this container.
    pub fn create_child(&self, name: &str, object: &StoredObject) -> StoreResult<()> {
        self.store.create_child(&self.location, name, object)
    }
}

/// Rejects names that cannot be mapped to one path segment.
pub(crate) fn ensure_segment(name: &str) -> StoreResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
