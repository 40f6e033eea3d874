use metaq_query::{
    CompareOp, Criterion, CriterionError, CriterionKind, Query, SortDirection, is_identifier,
};

use crate::compiled::{CompiledQuery, Join, OrderTerm, Predicate, Projection};
use crate::error::DbError;
use crate::pager::Window;
use crate::schema::{Schema, Scope};
use crate::sql;

/// Lower a query against `schema`.
///
/// Criteria become conjuncts in their original order; each meta match gets
/// its own sequentially-aliased join. Without an explicit sort the schema's
/// default column is used, descending. Offset and limit are clamped, and a
/// count query drops both the order and the limit. Output depends only on the
/// inputs, so compiling the same query twice yields identical text.
///
/// An offset without a limit skips rows but caps nothing.
///
/// Fails without producing anything if the schema holds a name that is not a
/// plain identifier, or a criterion names a column the schema does not allow
/// or has a kind this compiler cannot lower.
pub fn compile(schema: &Schema, query: &Query) -> Result<CompiledQuery, DbError> {
    schema.validate()?;

    let mut joins: Vec<Join> = Vec::new();
    let mut predicates = Vec::with_capacity(query.criteria.len());

    for criterion in &query.criteria {
        if let Some(field) = criterion.field() {
            check_allowed(schema, field)?;
        }
        predicates.push(lower(schema, criterion, &mut joins)?);
    }

    // sorts are checked even when a count discards them
    let order = lower_sort(schema, query)?;

    let (projection, order, limit) = if query.count_only {
        (Projection::Count, Vec::new(), None)
    } else {
        (Projection::Rows, order, lower_limit(query))
    };

    let compiled = CompiledQuery {
        projection,
        table: schema.table.clone(),
        id_column: schema.id_column.clone(),
        scope: schema.scope.as_ref().map(scope_predicate),
        joins,
        predicates,
        order,
        limit,
    };

    tracing::debug!(
        table = %compiled.table,
        joins = compiled.joins.len(),
        predicates = compiled.predicates.len(),
        count = compiled.is_count(),
        "compiled query"
    );
    tracing::trace!(sql = %compiled, "compiled sql");

    Ok(compiled)
}

fn lower(
    schema: &Schema,
    criterion: &Criterion,
    joins: &mut Vec<Join>,
) -> Result<Predicate, DbError> {
    let predicate = match criterion.kind() {
        CriterionKind::Equals { field, value } => Predicate::Column {
            column: field.clone(),
            op: CompareOp::Eq,
            value: value.clone(),
        },
        CriterionKind::In { field, values, op } => Predicate::Set {
            column: field.clone(),
            op: *op,
            values: values.clone(),
        },
        CriterionKind::Compare { field, op, value } => Predicate::Column {
            column: field.clone(),
            op: *op,
            value: value.clone(),
        },
        CriterionKind::MetaMatch { key, value, op } => {
            let alias = sql::alias(joins.len());
            joins.push(Join {
                alias: alias.clone(),
                table: schema.meta_table.clone(),
                entity_column: schema.meta_entity_column.clone(),
                key_column: schema.meta_key_column.clone(),
                key: key.clone(),
            });
            match value {
                Some(value) => Predicate::MetaValue {
                    alias,
                    column: schema.meta_value_column.clone(),
                    op: op.unwrap_or(CompareOp::Eq),
                    value: value.clone(),
                },
                None => Predicate::MetaExists {
                    alias,
                    column: schema.meta_entity_column.clone(),
                },
            }
        }
        other => {
            return Err(DbError::UnsupportedCriterion(format!("{other:?}")));
        }
    };
    Ok(predicate)
}

fn lower_limit(query: &Query) -> Option<Window> {
    let window = Window::clamp(query.offset, query.limit)?;
    if query.offset.is_some_and(|o| o < 0) || query.limit.is_some_and(|l| l < 1) {
        tracing::debug!(
            requested_offset = ?query.offset,
            requested_limit = ?query.limit,
            offset = window.offset,
            limit = window.limit,
            "clamped pagination"
        );
    }
    Some(window)
}

fn lower_sort(schema: &Schema, query: &Query) -> Result<Vec<OrderTerm>, DbError> {
    if query.sort.is_empty() {
        return Ok(vec![OrderTerm {
            column: schema.default_order.clone(),
            direction: SortDirection::Desc,
        }]);
    }

    query
        .sort
        .iter()
        .map(|sort| -> Result<OrderTerm, DbError> {
            if !is_identifier(&sort.field) {
                return Err(CriterionError::InvalidField(sort.field.clone()).into());
            }
            check_allowed(schema, &sort.field)?;
            Ok(OrderTerm {
                column: sort.field.clone(),
                direction: sort.direction,
            })
        })
        .collect()
}

fn check_allowed(schema: &Schema, field: &str) -> Result<(), DbError> {
    if schema.allows(field) {
        Ok(())
    } else {
        Err(DbError::UnsupportedCriterion(format!(
            "field {field} is not queryable on {}",
            schema.table
        )))
    }
}

fn scope_predicate(scope: &Scope) -> Predicate {
    Predicate::Column {
        column: scope.column.clone(),
        op: CompareOp::Eq,
        value: scope.value.clone(),
    }
}
