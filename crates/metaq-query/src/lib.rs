mod criterion;
mod error;
mod operator;
mod parse_query;
mod query;
mod sort;
mod value;

pub use criterion::{Criteria, Criterion, CriterionKind, is_identifier};
pub use error::CriterionError;
pub use operator::{CompareOp, Operator, SetOp, parse_operator};
pub use parse_query::parse_query;
pub use query::Query;
pub use sort::{Sort, SortDirection};
pub use value::Value;
