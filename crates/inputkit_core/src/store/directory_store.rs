//! Directory-backed object store.
//!
//! # Responsibility
//! - Map each container path to one directory under a root.
//! - Persist children as `<name><suffix>` JSON documents.
//!
//! # Invariants
//! - Existence checks are answered from the parent directory listing.
//! - A child file appears only once fully written; it is never overwritten.
//! - Staged files never outlive the `create_child` call that wrote them.

use super::{ensure_segment, ObjectStore, StoreError, StoreResult, StoredObject};
use crate::config::HandlerSettings;
use crate::request::PathRef;
use log::{error, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Store rooted at one filesystem directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryObjectStore {
    root: PathBuf,
    suffix: String,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    /// Creates a store using the configured object suffix.
    pub fn from_settings(root: impl Into<PathBuf>, settings: &HandlerSettings) -> Self {
        Self::new(root, settings.object_suffix.as_str())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Creates the directory for `container` (and its ancestors).
    pub fn create_container(&self, container: &PathRef) -> StoreResult<PathBuf> {
        let dir = self.container_dir(container)?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn container_dir(&self, container: &PathRef) -> StoreResult<PathBuf> {
        let mut dir = self.root.clone();
        for segment in container.segments() {
            ensure_segment(segment)?;
            dir.push(segment);
        }
        Ok(dir)
    }

    fn existing_container_dir(&self, container: &PathRef) -> StoreResult<PathBuf> {
        let dir = self.container_dir(container)?;
        if !dir.is_dir() {
            return Err(StoreError::ParentNotFound(container.clone()));
        }
        Ok(dir)
    }

    fn file_name(&self, name: &str) -> String {
        format!("{name}{}", self.suffix)
    }

    fn listing(&self, dir: &Path) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn child_exists(&self, parent: &PathRef, name: &str) -> StoreResult<bool> {
        let dir = self.existing_container_dir(parent)?;
        let file_name = self.file_name(name);
        Ok(self.listing(&dir)?.iter().any(|entry| *entry == file_name))
    }

    fn create_child(
        &self,
        parent: &PathRef,
        name: &str,
        object: &StoredObject,
    ) -> StoreResult<()> {
        ensure_segment(name)?;
        let dir = self.existing_container_dir(parent)?;
        let file_name = self.file_name(name);
        let target = dir.join(&file_name);
        let staged = dir.join(format!(".{file_name}.{}.staged", Uuid::new_v4().simple()));

        let published = publish_new_file(&target, &staged, |writer| {
            serde_json::to_writer_pretty(writer, object)?;
            Ok(())
        })
        .map_err(|err| {
            error!(
                "event=object_write module=store status=error backend=directory error={}",
                err
            );
            err
        })?;
        if !published {
            return Err(StoreError::AlreadyExists {
                parent: parent.clone(),
                name: name.to_string(),
            });
        }

        info!(
            "event=object_write module=store status=ok backend=directory kind={} uuid={}",
            object.kind, object.uuid
        );
        Ok(())
    }

    fn load_child(&self, parent: &PathRef, name: &str) -> StoreResult<Option<StoredObject>> {
        ensure_segment(name)?;
        let dir = self.existing_container_dir(parent)?;
        let raw = match fs::read_to_string(dir.join(self.file_name(name))) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(raw.as_str())?))
    }

    fn list_children(&self, parent: &PathRef) -> StoreResult<Vec<String>> {
        let dir = self.existing_container_dir(parent)?;
        let mut names: Vec<String> = self
            .listing(&dir)?
            .into_iter()
            .filter_map(|entry| {
                entry
                    .strip_suffix(self.suffix.as_str())
                    .filter(|stem| !stem.is_empty())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Writes `staged`, then hard-links it to `target`.
///
/// Returns `false` when `target` already exists. The staged file is removed
/// on every path, so a failed write leaves nothing behind.
fn publish_new_file(
    target: &Path,
    staged: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> StoreResult<()>,
) -> StoreResult<bool> {
    let published = stage_and_link(target, staged, write);
    if let Err(err) = fs::remove_file(staged) {
        if err.kind() != ErrorKind::NotFound {
            warn!(
                "event=object_write module=store status=warn backend=directory error_code=staged_cleanup_failed path={} error={}",
                staged.display(),
                err
            );
        }
    }
    published
}

fn stage_and_link(
    target: &Path,
    staged: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> StoreResult<()>,
) -> StoreResult<bool> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staged)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    match fs::hard_link(staged, target) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{publish_new_file, DirectoryObjectStore};
    use crate::request::PathRef;
    use crate::store::{ObjectStore, StoreError, StoredObject};
    use std::io::Write;

    fn entries(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn child_exists_reads_directory_listing_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.json"), "{}").unwrap();
        std::fs::write(dir.path().join("beta.txt"), "").unwrap();
        let store = DirectoryObjectStore::new(dir.path(), ".json");

        assert!(store.child_exists(&PathRef::root(), "alpha").unwrap());
        assert!(!store.child_exists(&PathRef::root(), "beta").unwrap());
    }

    #[test]
    fn missing_parent_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::new(dir.path(), ".json");
        let parent = PathRef::parse("nope");

        let err = store.child_exists(&parent, "alpha").unwrap_err();
        assert!(matches!(err, StoreError::ParentNotFound(path) if path == parent));
    }

    #[test]
    fn create_child_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryObjectStore::new(dir.path(), ".json");
        let object = StoredObject::new("project", "alpha");

        store
            .create_child(&PathRef::root(), "alpha", &object)
            .unwrap();
        let err = store
            .create_child(&PathRef::root(), "alpha", &object)
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { name, .. } if name == "alpha"));
        assert_eq!(entries(dir.path()), vec!["alpha.json"]);
        assert_eq!(
            store.load_child(&PathRef::root(), "alpha").unwrap(),
            Some(object)
        );
    }

    #[test]
    fn failed_write_leaves_name_free() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("alpha.json");
        let staged = dir.path().join(".alpha.json.staged");

        let err = publish_new_file(&target, &staged, |writer| {
            writer.write_all(b"{\"uuid\":")?;
            Err(StoreError::InvalidData("device full".to_string()))
        })
        .unwrap_err();

        assert!(matches!(err, StoreError::InvalidData(_)));
        assert!(entries(dir.path()).is_empty());
        let store = DirectoryObjectStore::new(dir.path(), ".json");
        assert!(!store.child_exists(&PathRef::root(), "alpha").unwrap());
        store
            .create_child(&PathRef::root(), "alpha", &StoredObject::new("project", "alpha"))
            .unwrap();
    }
}
