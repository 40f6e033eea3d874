use std::cmp::Ordering;

use bson::Document;
use metaq_query::{CompareOp, SetOp, SortDirection, Value};
use metaq_store::Snapshot;

use crate::compiled::{CompiledQuery, OrderTerm, Predicate};

/// Whether an entity satisfies every conjunct of `query`.
///
/// Meta predicates follow the LEFT JOIN: they hold when any attribute row
/// under the join's key satisfies them, and an entity without such rows is
/// compared as NULL.
pub(crate) fn matches(query: &CompiledQuery, snapshot: &Snapshot, id: i64, doc: &Document) -> bool {
    query
        .conjuncts()
        .all(|predicate| eval(query, snapshot, id, doc, predicate))
}

fn eval(
    query: &CompiledQuery,
    snapshot: &Snapshot,
    id: i64,
    doc: &Document,
    predicate: &Predicate,
) -> bool {
    match predicate {
        Predicate::Column { column, op, value } => {
            compare(field_value(doc, column).as_ref(), *op, value)
        }
        Predicate::Set { column, op, values } => {
            // NULL [NOT] IN (...) is never true
            let Some(field) = field_value(doc, column) else {
                return false;
            };
            let hit = values
                .iter()
                .any(|v| value_cmp(&field, v) == Some(Ordering::Equal));
            match op {
                SetOp::In => hit,
                SetOp::NotIn => !hit,
            }
        }
        Predicate::MetaValue {
            alias, op, value, ..
        } => {
            let Some(join) = query.join(alias) else {
                return false;
            };
            let mut rows = snapshot.attribute(id, &join.key).peekable();
            if rows.peek().is_none() {
                return compare(None, *op, value);
            }
            rows.any(|raw| {
                let meta = Value::try_from(raw).ok().filter(|v| !v.is_null());
                compare(meta.as_ref(), *op, value)
            })
        }
        Predicate::MetaExists { alias, .. } => query
            .join(alias)
            .is_some_and(|join| snapshot.has_attribute(id, &join.key)),
    }
}

/// Scalar value of a document field; missing, null and non-scalar fields are `None`.
pub(crate) fn field_value(doc: &Document, column: &str) -> Option<Value> {
    doc.get(column)
        .and_then(|raw| Value::try_from(raw).ok())
        .filter(|v| !v.is_null())
}

fn compare(field: Option<&Value>, op: CompareOp, value: &Value) -> bool {
    if op.is_identity() {
        let is = match value {
            Value::Null => field.is_none(),
            Value::Bool(expected) => field.and_then(truthy) == Some(*expected),
            _ => false,
        };
        return if op == CompareOp::Is { is } else { !is };
    }

    let Some(ord) = field.and_then(|f| value_cmp(f, value)) else {
        return false;
    };
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
        CompareOp::Is | CompareOp::IsNot => false,
    }
}

/// Compare two scalars with SQL-style coercion: strings compare as strings,
/// anything mixed with a number compares numerically. `None` when either side
/// is NULL or the string is not numeric.
pub(crate) fn value_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => as_f64(a)?.partial_cmp(&as_f64(b)?),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => None,
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        other => as_f64(other).map(|n| n != 0.0),
    }
}

/// Sort keys for one row, one per order term.
pub(crate) fn sort_key(doc: &Document, order: &[OrderTerm]) -> Vec<Option<Value>> {
    order
        .iter()
        .map(|term| field_value(doc, &term.column))
        .collect()
}

/// NULLs sort first ascending, last descending.
pub(crate) fn compare_keys(
    a: &[Option<Value>],
    b: &[Option<Value>],
    order: &[OrderTerm],
) -> Ordering {
    for ((x, y), term) in a.iter().zip(b).zip(order) {
        let ord = match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => value_cmp(x, y).unwrap_or(Ordering::Equal),
        };
        let ord = match term.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
