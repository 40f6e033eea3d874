use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use bson::{Bson, Document};
use imbl::{OrdMap, Vector};

use crate::error::StoreError;

use super::snapshot::Snapshot;

/// Attribute rows keyed by `(entity_id, key)`; one key may hold several values.
pub(crate) type Attributes = OrdMap<(i64, String), Vector<Bson>>;

#[derive(Clone, Default)]
pub(crate) struct Tables {
    pub(crate) entities: OrdMap<i64, Document>,
    pub(crate) attributes: Attributes,
}

/// In-memory entity table plus key/value attribute table.
///
/// Readers take a [`Snapshot`] without locking; writers are serialized by a
/// mutex and publish a new version atomically when their closure succeeds.
pub struct MemoryStore {
    tables: ArcSwap<Tables>,
    write_lock: Mutex<()>,
    id_field: String,
}

impl MemoryStore {
    /// `id_field` names the integer field of each entity document used as its key.
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            tables: ArcSwap::from_pointee(Tables::default()),
            write_lock: Mutex::new(()),
            id_field: id_field.into(),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Point-in-time view. Cheap due to imbl structural sharing.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.tables.load_full())
    }

    /// Run `f` against a private copy of the tables and publish it on success.
    /// On error nothing is written.
    pub fn write<T>(
        &self,
        f: impl FnOnce(&mut Writer<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        let mut tables = (**self.tables.load()).clone();
        let mut writer = Writer {
            tables: &mut tables,
            id_field: &self.id_field,
        };
        let out = f(&mut writer)?;
        self.tables.store(Arc::new(tables));
        Ok(out)
    }

    pub fn insert(&self, doc: Document) -> Result<i64, StoreError> {
        self.write(|w| w.insert(doc))
    }

    pub fn add_attribute(
        &self,
        entity_id: i64,
        key: &str,
        value: impl Into<Bson>,
    ) -> Result<(), StoreError> {
        let value = value.into();
        self.write(|w| w.add_attribute(entity_id, key, value))
    }

    pub fn remove(&self, entity_id: i64) -> Result<bool, StoreError> {
        self.write(|w| Ok(w.remove(entity_id)))
    }
}

/// Mutable access handed to [`MemoryStore::write`].
pub struct Writer<'a> {
    tables: &'a mut Tables,
    id_field: &'a str,
}

impl Writer<'_> {
    pub fn insert(&mut self, doc: Document) -> Result<i64, StoreError> {
        let id = match doc.get(self.id_field) {
            Some(Bson::Int32(n)) => *n as i64,
            Some(Bson::Int64(n)) => *n,
            _ => return Err(StoreError::MissingId(self.id_field.to_string())),
        };
        if self.tables.entities.contains_key(&id) {
            return Err(StoreError::Duplicate(id));
        }
        self.tables.entities.insert(id, doc);
        tracing::trace!(id, "entity inserted");
        Ok(id)
    }

    pub fn add_attribute(
        &mut self,
        entity_id: i64,
        key: &str,
        value: impl Into<Bson>,
    ) -> Result<(), StoreError> {
        if !self.tables.entities.contains_key(&entity_id) {
            return Err(StoreError::NotFound(entity_id));
        }
        self.tables
            .attributes
            .entry((entity_id, key.to_string()))
            .or_insert_with(Vector::new)
            .push_back(value.into());
        Ok(())
    }

    /// Removes the entity and all of its attribute rows.
    pub fn remove(&mut self, entity_id: i64) -> bool {
        if self.tables.entities.remove(&entity_id).is_none() {
            return false;
        }
        let keys: Vec<(i64, String)> = self
            .tables
            .attributes
            .range((entity_id, String::new())..)
            .take_while(|((id, _), _)| *id == entity_id)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            self.tables.attributes.remove(&key);
        }
        true
    }
}
