use bson::Document;

use crate::compiled::CompiledQuery;
use crate::error::StorageError;

/// The engine that runs compiled queries. Retry policy is the
/// implementation's concern.
pub trait Storage {
    /// Rows for a [`Projection::Rows`](crate::Projection::Rows) query, already
    /// ordered and sliced by the query's limit.
    fn fetch_rows(&self, query: &CompiledQuery) -> Result<Vec<Document>, StorageError>;

    /// Number of matching rows, ignoring any limit.
    fn fetch_count(&self, query: &CompiledQuery) -> Result<u64, StorageError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn fetch_rows(&self, query: &CompiledQuery) -> Result<Vec<Document>, StorageError> {
        (**self).fetch_rows(query)
    }

    fn fetch_count(&self, query: &CompiledQuery) -> Result<u64, StorageError> {
        (**self).fetch_count(query)
    }
}
