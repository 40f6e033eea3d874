use std::fmt;

use metaq_query::{CompareOp, SetOp, SortDirection, Value};

use crate::pager::Window;
use crate::sql::{self, ALWAYS_TRUE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Rows,
    Count,
}

/// One aliased join against the attribute table, restricted to a single key.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub alias: String,
    pub table: String,
    pub entity_column: String,
    pub key_column: String,
    pub key: String,
}

/// A single conjunct of the WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `<table>.<column> <op> <value>`
    Column {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// `<table>.<column> [NOT] IN (<values>)`
    Set {
        column: String,
        op: SetOp,
        values: Vec<Value>,
    },
    /// `<alias>.<column> <op> <value>` on a joined meta row.
    MetaValue {
        alias: String,
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// The aliased join found a row: `<alias>.<column> IS NOT NULL`.
    MetaExists { alias: String, column: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: String,
    pub direction: SortDirection,
}

/// Fully lowered query. Joins and predicates stay structured so they can be
/// logged, audited, or evaluated without SQL; [`CompiledQuery::to_sql`] is the
/// final serialization step.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub projection: Projection,
    pub table: String,
    pub id_column: String,
    pub scope: Option<Predicate>,
    pub joins: Vec<Join>,
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderTerm>,
    pub limit: Option<Window>,
}

impl CompiledQuery {
    pub fn is_count(&self) -> bool {
        self.projection == Projection::Count
    }

    pub fn join(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    /// Scope first, then criteria in order.
    pub fn conjuncts(&self) -> impl Iterator<Item = &Predicate> {
        self.scope.iter().chain(self.predicates.iter())
    }

    /// `LEFT JOIN ...` clauses, one per meta criterion.
    pub fn join_clauses(&self) -> Vec<String> {
        self.joins
            .iter()
            .map(|join| {
                let mut out = String::new();
                self.push_join(&mut out, join);
                out
            })
            .collect()
    }

    /// Predicate text without the `WHERE` keyword.
    pub fn where_clause(&self) -> String {
        let mut out = String::from(ALWAYS_TRUE);
        for predicate in self.conjuncts() {
            out.push_str(" AND ");
            self.push_predicate(&mut out, predicate);
        }
        out
    }

    pub fn order_clause(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        let terms: Vec<String> = self
            .order
            .iter()
            .map(|term| {
                format!(
                    "{}.{} {}",
                    self.table,
                    term.column,
                    term.direction.as_sql()
                )
            })
            .collect();
        Some(terms.join(", "))
    }

    /// Rendered statement. With meta joins an entity holding several rows
    /// under one key would repeat, so rows are `DISTINCT` and the count is
    /// over distinct ids.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(128);
        let distinct = !self.joins.is_empty();
        match self.projection {
            Projection::Rows => {
                sql.push_str(if distinct { "SELECT DISTINCT " } else { "SELECT " });
                sql.push_str(&self.table);
                sql.push_str(".*");
            }
            Projection::Count if distinct => {
                sql.push_str(&format!("SELECT COUNT(DISTINCT {}.{})", self.table, self.id_column));
            }
            Projection::Count => sql.push_str("SELECT COUNT(*)"),
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            sql.push(' ');
            self.push_join(&mut sql, join);
        }

        sql.push_str(" WHERE ");
        sql.push_str(&self.where_clause());

        if let Some(order) = self.order_clause() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        if let Some(window) = self.limit {
            sql.push_str(&format!(" LIMIT {}, {}", window.offset, window.limit));
        }
        sql
    }

    fn push_join(&self, out: &mut String, join: &Join) {
        out.push_str(&format!(
            "LEFT JOIN {table} AS {alias} ON ({primary}.{id} = {alias}.{entity} AND {alias}.{key_col} = ",
            table = join.table,
            alias = join.alias,
            primary = self.table,
            id = self.id_column,
            entity = join.entity_column,
            key_col = join.key_column,
        ));
        sql::push_literal(out, &Value::String(join.key.clone()));
        out.push(')');
    }

    fn push_predicate(&self, out: &mut String, predicate: &Predicate) {
        match predicate {
            Predicate::Column { column, op, value } => {
                let qualified = format!("{}.{column}", self.table);
                sql::push_comparison(out, &qualified, *op, value);
            }
            Predicate::Set { column, op, values } => {
                out.push_str(&format!("{}.{column} {} ", self.table, op.as_sql()));
                sql::push_list(out, values);
            }
            Predicate::MetaValue {
                alias,
                column,
                op,
                value,
            } => {
                let qualified = format!("{alias}.{column}");
                sql::push_comparison(out, &qualified, *op, value);
            }
            Predicate::MetaExists { alias, column } => {
                out.push_str(&format!("{alias}.{column} IS NOT NULL"));
            }
        }
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Human-readable listing of a compiled query: projection, joins, predicates,
/// order and limit on separate lines.
pub fn describe(query: &CompiledQuery) -> String {
    let mut out = String::new();
    let projection = match query.projection {
        Projection::Rows => "rows",
        Projection::Count => "count",
    };
    out.push_str(&format!("projection: {projection}\n"));
    out.push_str(&format!("from: {}\n", query.table));

    if query.joins.is_empty() {
        out.push_str("joins: none\n");
    } else {
        out.push_str("joins:\n");
        for (join, clause) in query.joins.iter().zip(query.join_clauses()) {
            out.push_str(&format!("  {} [{}]: {clause}\n", join.alias, join.key));
        }
    }

    out.push_str("predicates:\n");
    out.push_str(&format!("  {ALWAYS_TRUE}\n"));
    for predicate in query.conjuncts() {
        let mut text = String::new();
        query.push_predicate(&mut text, predicate);
        out.push_str(&format!("  AND {text}\n"));
    }

    match query.order_clause() {
        Some(order) => out.push_str(&format!("order: {order}\n")),
        None => out.push_str("order: none\n"),
    }
    match query.limit {
        Some(window) if !window.is_bounded() => {
            out.push_str(&format!("limit: offset {}, count all\n", window.offset))
        }
        Some(window) => out.push_str(&format!(
            "limit: offset {}, count {}\n",
            window.offset, window.limit
        )),
        None => out.push_str("limit: none\n"),
    }
    out
}
