use metaq_query::Query;

use crate::compiled::CompiledQuery;
use crate::compiler;
use crate::error::DbError;
use crate::pager::{Fetched, PagedResult, paginate};
use crate::schema::Schema;
use crate::storage::Storage;

/// Compiles queries against one schema and runs them on a storage collaborator.
pub struct Executor<S> {
    schema: Schema,
    storage: S,
}

impl<S: Storage> Executor<S> {
    /// Fails with [`DbError::InvalidSchema`] if any schema name is not a plain
    /// identifier.
    pub fn new(schema: Schema, storage: S) -> Result<Self, DbError> {
        schema.validate()?;
        Ok(Self { schema, storage })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn compile(&self, query: &Query) -> Result<CompiledQuery, DbError> {
        compiler::compile(&self.schema, query)
    }

    pub fn execute(&self, query: &Query) -> Result<PagedResult, DbError> {
        let compiled = self.compile(query)?;
        let fetched = self.fetch(&compiled)?;
        Ok(paginate(fetched, query.offset, query.limit))
    }

    /// Like [`execute`](Self::execute), but a paginated rows query also runs
    /// its count form so the page carries `total_available`.
    pub fn execute_with_total(&self, query: &Query) -> Result<PagedResult, DbError> {
        let result = self.execute(query)?;
        let page = match result {
            PagedResult::Rows(page) if page.info.is_some() => page,
            other => return Ok(other),
        };

        let compiled = self.compile(&query.to_count())?;
        let total = match self.fetch(&compiled)? {
            Fetched::Count(n) => n,
            Fetched::Rows(rows) => rows.len() as u64,
        };
        Ok(PagedResult::Rows(page.with_total(total)))
    }

    fn fetch(&self, compiled: &CompiledQuery) -> Result<Fetched, DbError> {
        let fetched = if compiled.is_count() {
            self.storage.fetch_count(compiled).map(Fetched::Count)
        } else {
            self.storage.fetch_rows(compiled).map(Fetched::Rows)
        };

        match fetched {
            Ok(fetched) => {
                if let Fetched::Rows(rows) = &fetched {
                    tracing::debug!(table = %compiled.table, rows = rows.len(), "fetched rows");
                }
                Ok(fetched)
            }
            Err(e) => {
                tracing::warn!(table = %compiled.table, error = %e, "storage failed");
                Err(e.into())
            }
        }
    }
}
