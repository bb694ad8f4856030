//! Request view consumed by input handlers.
//!
//! # Responsibility
//! - Carry multi-valued form arguments keyed by field name.
//! - Resolve the parent container used for new-object creation.
//!
//! # Invariants
//! - Arguments keep submission order per field.
//! - Handlers only read from a request; side effects go through the store.

use crate::store::{ObjectStore, ParentContainer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `/`-separated locator of an object inside a store hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathRef {
    segments: Vec<String>,
}

impl PathRef {
    /// Root container locator.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a/b/c`; empty segments are ignored.
    pub fn parse(raw: &str) -> Self {
        Self {
            segments: raw
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Locator of the containing container; `None` at root.
    pub fn parent(&self) -> Option<PathRef> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    pub fn child(&self, name: impl Into<String>) -> PathRef {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Display for PathRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Errors resolving request collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Request carries no path reference.
    MissingPathRef,
    /// Path reference points at root, which has no parent.
    NoParent(PathRef),
    /// Request carries no object store.
    MissingObjectStore,
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPathRef => write!(f, "request has no path reference"),
            Self::NoParent(path) => write!(f, "path reference has no parent: {path}"),
            Self::MissingObjectStore => write!(f, "request has no object store"),
        }
    }
}

impl Error for RequestError {}

/// Form request: named multi-valued arguments plus object location.
#[derive(Default)]
pub struct FormRequest<'a> {
    args: BTreeMap<String, Vec<String>>,
    path_ref: Option<PathRef>,
    objects: Option<&'a dyn ObjectStore>,
}

impl<'a> FormRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a request from `(field, value)` pairs in submission order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = Self::new();
        for (field, value) in pairs {
            request.push_arg(field, value);
        }
        request
    }

    /// Appends one value to `field`.
    pub fn with_arg(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_arg(field, value);
        self
    }

    /// Appends several values to `field`.
    pub fn with_args<V: Into<String>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.args
            .entry(field.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_path_ref(mut self, path_ref: PathRef) -> Self {
        self.path_ref = Some(path_ref);
        self
    }

    pub fn with_object_store(mut self, objects: &'a dyn ObjectStore) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn push_arg(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.args.entry(field.into()).or_default().push(value.into());
    }

    /// Submitted values for `field`, if the field was sent at all.
    pub fn args(&self, field: &str) -> Option<&[String]> {
        self.args.get(field).map(Vec::as_slice)
    }

    /// Submitted field names in sorted order.
    pub fn fields(&self) -> Vec<&str> {
        self.args.keys().map(String::as_str).collect()
    }

    pub fn path_ref(&self) -> Option<&PathRef> {
        self.path_ref.as_ref()
    }

    /// Resolves the container that holds the object this request points at.
    pub fn parent_container(&self) -> Result<ParentContainer<'a>, RequestError> {
        let path_ref = self.path_ref.as_ref().ok_or(RequestError::MissingPathRef)?;
        let parent = path_ref
            .parent()
            .ok_or_else(|| RequestError::NoParent(path_ref.clone()))?;
        let objects = self.objects.ok_or(RequestError::MissingObjectStore)?;
        Ok(ParentContainer::new(objects, parent))
    }
}
