mod compiled;
mod compiler;
mod error;
#[cfg(feature = "memory")]
mod eval;
mod executor;
#[cfg(feature = "memory")]
mod memory;
mod pager;
mod schema;
mod sql;
mod storage;

pub use bson::{Bson, Document};
pub use compiled::{CompiledQuery, Join, OrderTerm, Predicate, Projection, describe};
pub use compiler::compile;
pub use error::{DbError, StorageError};
pub use executor::Executor;
pub use pager::{Fetched, Page, PageInfo, PagedResult, Window, paginate};
pub use schema::{Schema, Scope};
pub use sql::{ALWAYS_TRUE, alias, literal};
pub use storage::Storage;

#[cfg(feature = "memory")]
pub use metaq_store::MemoryStore;
