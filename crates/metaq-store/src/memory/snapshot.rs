use std::sync::Arc;

use bson::{Bson, Document};

use super::store::Tables;

/// Read-only view of the tables at the moment it was taken.
#[derive(Clone)]
pub struct Snapshot {
    tables: Arc<Tables>,
}

impl Snapshot {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.entities.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Document> {
        self.tables.entities.get(&id)
    }

    /// Entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = (i64, &Document)> + '_ {
        self.tables.entities.iter().map(|(id, doc)| (*id, doc))
    }

    /// Values stored under `key` for one entity, in insertion order.
    pub fn attribute(&self, id: i64, key: &str) -> impl Iterator<Item = &Bson> + '_ {
        self.tables
            .attributes
            .get(&(id, key.to_string()))
            .into_iter()
            .flat_map(|values| values.iter())
    }

    pub fn has_attribute(&self, id: i64, key: &str) -> bool {
        self.tables
            .attributes
            .contains_key(&(id, key.to_string()))
    }
}
