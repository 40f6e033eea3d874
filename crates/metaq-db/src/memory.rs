use bson::Document;
use metaq_store::MemoryStore;

use crate::compiled::CompiledQuery;
use crate::error::StorageError;
use crate::eval;
use crate::storage::Storage;

/// Runs compiled queries directly against a [`MemoryStore`] snapshot by
/// evaluating the predicate tree; no SQL is involved.
impl Storage for MemoryStore {
    fn fetch_rows(&self, query: &CompiledQuery) -> Result<Vec<Document>, StorageError> {
        if query.is_count() {
            return Err(StorageError::new("count query passed to fetch_rows"));
        }
        let snapshot = self.snapshot();

        let mut rows: Vec<_> = snapshot
            .entities()
            .filter(|(id, doc)| eval::matches(query, &snapshot, *id, doc))
            .map(|(_, doc)| (eval::sort_key(doc, &query.order), doc))
            .collect();
        // stable: ties keep ascending id order
        rows.sort_by(|a, b| eval::compare_keys(&a.0, &b.0, &query.order));

        let (skip, take) = match query.limit {
            Some(window) => (window.offset as usize, window.limit as usize),
            None => (0, usize::MAX),
        };
        let out: Vec<Document> = rows
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, doc)| doc.clone())
            .collect();

        tracing::debug!(returned = out.len(), "memory fetch");
        Ok(out)
    }

    fn fetch_count(&self, query: &CompiledQuery) -> Result<u64, StorageError> {
        let snapshot = self.snapshot();
        let count = snapshot
            .entities()
            .filter(|(id, doc)| eval::matches(query, &snapshot, *id, doc))
            .count();
        Ok(count as u64)
    }
}
