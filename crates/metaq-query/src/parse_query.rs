use bson::{Bson, Document};

use crate::criterion::{Criteria, CriterionKind};
use crate::error::CriterionError;
use crate::operator::{CompareOp, Operator, SetOp, parse_operator};
use crate::query::Query;
use crate::sort::{Sort, SortDirection};
use crate::value::Value;

const META_QUERY: &str = "meta_query";
const ORDER_BY: &str = "order_by";
const ORDER: &str = "order";
const OFFSET: &str = "offset";
const PER_PAGE: &str = "per_page";
const PAGE: &str = "page";
const COUNT: &str = "count";

/// Parse a loosely-typed media query document into a [`Query`].
///
/// Recognized shapes:
/// - `{ "field": scalar }` is an equality
/// - `{ "field": [a, b] }` is set membership
/// - `{ "field": { "value": v, "compare": "NOT IN" } }` picks the operator
/// - `{ "meta_query": [{ "key": k, "value": v, "compare": ">" }] }` joins meta rows
/// - `order_by`, `order`, `offset`, `per_page`, `page`, `count` shape the result
///
/// Entries are turned into criteria in document order.
pub fn parse_query(doc: &Document) -> Result<Query, CriterionError> {
    let mut criteria = Criteria::new();
    let mut order_by: Option<String> = None;
    let mut direction = SortDirection::Desc;
    let mut saw_order = false;
    let mut offset: Option<i64> = None;
    let mut per_page: Option<i64> = None;
    let mut page: Option<i64> = None;
    let mut count_only = false;

    for (key, value) in doc.iter() {
        match key.as_str() {
            META_QUERY => parse_meta_query(value, &mut criteria)?,
            ORDER_BY => match value {
                Bson::String(s) => order_by = Some(s.trim().to_string()),
                _ => return Err(malformed("order_by must be a string")),
            },
            ORDER => {
                saw_order = true;
                direction = match value {
                    Bson::String(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                    Bson::String(s) if s.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                    _ => return Err(malformed("order must be \"ASC\" or \"DESC\"")),
                };
            }
            OFFSET => offset = Some(integer(OFFSET, value)?),
            PER_PAGE => per_page = Some(integer(PER_PAGE, value)?),
            PAGE => page = Some(integer(PAGE, value)?),
            COUNT => match value {
                Bson::Boolean(b) => count_only = *b,
                _ => return Err(malformed("count must be a boolean")),
            },
            field => parse_field(field, value, &mut criteria)?,
        }
    }

    let mut query = Query::new(criteria);
    query.count_only = count_only;

    match order_by {
        Some(field) => query.sort.push(Sort { field, direction }),
        None if saw_order => return Err(malformed("order given without order_by")),
        None => {}
    }

    match (page, per_page, offset) {
        (Some(_), _, Some(_)) => return Err(malformed("page and offset are exclusive")),
        (Some(page), Some(per_page), None) => query = query.page(page, per_page),
        (Some(_), None, None) => return Err(malformed("page requires per_page")),
        (None, per_page, offset) => {
            query.offset = offset;
            query.limit = per_page;
        }
    }

    Ok(query)
}

fn parse_field(field: &str, value: &Bson, criteria: &mut Criteria) -> Result<(), CriterionError> {
    match value {
        Bson::Array(items) => {
            criteria.push(CriterionKind::In {
                field: field.to_string(),
                values: scalars(items)?,
                op: SetOp::In,
            })?;
        }
        Bson::Document(sub) => parse_field_operator_doc(field, sub, criteria)?,
        scalar => {
            criteria.push(CriterionKind::Equals {
                field: field.to_string(),
                value: Value::try_from(scalar)?,
            })?;
        }
    }
    Ok(())
}

/// `{ "value": ..., "compare": ... }` for a primary-table column.
fn parse_field_operator_doc(
    field: &str,
    doc: &Document,
    criteria: &mut Criteria,
) -> Result<(), CriterionError> {
    let value = doc
        .get("value")
        .ok_or_else(|| malformed(&format!("{field}: operator document needs a value")))?;
    let op = match doc.get("compare") {
        Some(Bson::String(s)) => Some(parse_operator(s)?),
        Some(_) => return Err(malformed(&format!("{field}: compare must be a string"))),
        None => None,
    };
    if let Some(extra) = doc.keys().find(|k| *k != "value" && *k != "compare") {
        return Err(malformed(&format!("{field}: unexpected key {extra}")));
    }

    let kind = match (op, value) {
        (None, Bson::Array(items)) => CriterionKind::In {
            field: field.to_string(),
            values: scalars(items)?,
            op: SetOp::In,
        },
        (None, scalar) => CriterionKind::Equals {
            field: field.to_string(),
            value: Value::try_from(scalar)?,
        },
        (Some(Operator::Set(op)), Bson::Array(items)) => CriterionKind::In {
            field: field.to_string(),
            values: scalars(items)?,
            op,
        },
        // A scalar under a set operator is a one-element set.
        (Some(Operator::Set(op)), scalar) => CriterionKind::In {
            field: field.to_string(),
            values: vec![Value::try_from(scalar)?],
            op,
        },
        (Some(Operator::Compare(_)), Bson::Array(_)) => {
            return Err(malformed(&format!(
                "{field}: scalar operator used with an array value"
            )));
        }
        (Some(Operator::Compare(op)), scalar) => CriterionKind::Compare {
            field: field.to_string(),
            op,
            value: Value::try_from(scalar)?,
        },
    };
    criteria.push(kind)?;
    Ok(())
}

fn parse_meta_query(value: &Bson, criteria: &mut Criteria) -> Result<(), CriterionError> {
    let entries = match value {
        Bson::Array(entries) => entries,
        _ => return Err(malformed("meta_query must be an array")),
    };

    for entry in entries {
        let entry = match entry {
            Bson::Document(d) => d,
            _ => return Err(malformed("meta_query entries must be documents")),
        };

        let key = match entry.get("key") {
            Some(Bson::String(s)) => s.clone(),
            Some(_) => return Err(malformed("meta_query key must be a string")),
            None => return Err(CriterionError::EmptyMetaKey),
        };
        let value = entry.get("value").map(Value::try_from).transpose()?;
        let op: Option<CompareOp> = match entry.get("compare") {
            Some(Bson::String(s)) => match parse_operator(s)? {
                Operator::Compare(op) => Some(op),
                Operator::Set(op) => {
                    return Err(malformed(&format!(
                        "meta_query compare {op} is not a scalar operator"
                    )));
                }
            },
            Some(_) => return Err(malformed("meta_query compare must be a string")),
            None => None,
        };

        criteria.add_meta_match(key, value, op)?;
    }
    Ok(())
}

fn scalars(items: &[Bson]) -> Result<Vec<Value>, CriterionError> {
    items.iter().map(Value::try_from).collect()
}

/// Integers, or strings holding one (query strings arrive as text).
fn integer(key: &str, value: &Bson) -> Result<i64, CriterionError> {
    match value {
        Bson::Int32(n) => Ok(*n as i64),
        Bson::Int64(n) => Ok(*n),
        Bson::String(s) => s
            .trim()
            .parse()
            .map_err(|_| malformed(&format!("{key} must be an integer, got {s:?}"))),
        _ => Err(malformed(&format!("{key} must be an integer"))),
    }
}

fn malformed(msg: &str) -> CriterionError {
    CriterionError::Malformed(msg.to_string())
}
