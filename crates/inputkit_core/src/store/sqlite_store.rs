//! SQLite-backed object store.
//!
//! # Responsibility
//! - Persist children in `stored_objects`, keyed by `(parent_path, name)`.
//!
//! # Invariants
//! - Connection must be migrated to the latest schema version.
//! - Every container path implicitly exists; there is no container table.

use super::{ensure_segment, ObjectStore, StoreError, StoreResult, StoredObject};
use super::schema::{latest_version, schema_version};
use crate::request::PathRef;
use log::info;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Object store over a migrated SQLite connection.
pub struct SqliteObjectStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteObjectStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl ObjectStore for SqliteObjectStore<'_> {
    fn child_exists(&self, parent: &PathRef, name: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM stored_objects WHERE parent_path = ?1 AND name = ?2
            );",
            params![parent.to_string(), name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_child(
        &self,
        parent: &PathRef,
        name: &str,
        object: &StoredObject,
    ) -> StoreResult<()> {
        ensure_segment(name)?;
        let attributes_json = serde_json::to_string(&object.attributes)?;
        let inserted = self.conn.execute(
            "INSERT INTO stored_objects (parent_path, name, uuid, kind, attributes_json)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                parent.to_string(),
                name,
                object.uuid.to_string(),
                object.kind,
                attributes_json
            ],
        );

        match inserted {
            Ok(_) => {
                info!(
                    "event=object_write module=store status=ok backend=sqlite kind={} uuid={}",
                    object.kind, object.uuid
                );
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::AlreadyExists {
                    parent: parent.clone(),
                    name: name.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn load_child(&self, parent: &PathRef, name: &str) -> StoreResult<Option<StoredObject>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, kind, name, attributes_json
                 FROM stored_objects
                 WHERE parent_path = ?1 AND name = ?2;",
                params![parent.to_string(), name],
                read_raw_object,
            )
            .optional()?;
        row.map(RawObject::into_object).transpose()
    }

    fn list_children(&self, parent: &PathRef) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM stored_objects WHERE parent_path = ?1 ORDER BY name ASC;",
        )?;
        let names = stmt
            .query_map([parent.to_string()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

struct RawObject {
    uuid: String,
    kind: String,
    name: String,
    attributes_json: String,
}

impl RawObject {
    fn into_object(self) -> StoreResult<StoredObject> {
        let uuid = Uuid::parse_str(self.uuid.as_str())
            .map_err(|err| StoreError::InvalidData(format!("uuid `{}`: {err}", self.uuid)))?;
        let attributes: BTreeMap<String, String> =
            serde_json::from_str(self.attributes_json.as_str()).map_err(|err| {
                StoreError::InvalidData(format!("attributes of `{}`: {err}", self.name))
            })?;
        Ok(StoredObject {
            uuid,
            kind: self.kind,
            name: self.name,
            attributes,
        })
    }
}

fn read_raw_object(row: &Row<'_>) -> rusqlite::Result<RawObject> {
    Ok(RawObject {
        uuid: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        attributes_json: row.get(3)?,
    })
}
