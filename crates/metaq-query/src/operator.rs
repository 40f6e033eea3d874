use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CriterionError;

/// Scalar comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Is,
    IsNot,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Is => "IS",
            CompareOp::IsNot => "IS NOT",
        }
    }

    /// `IS` / `IS NOT` only take `NULL`, `TRUE` or `FALSE` operands.
    pub fn is_identity(self) -> bool {
        matches!(self, CompareOp::Is | CompareOp::IsNot)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Set-membership operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOp {
    #[default]
    In,
    NotIn,
}

impl SetOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            SetOp::In => "IN",
            SetOp::NotIn => "NOT IN",
        }
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Operator named by a `compare` entry in an option bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Compare(CompareOp),
    Set(SetOp),
}

/// Parse a SQL-style operator string, case-insensitive, tolerant of extra
/// whitespace (`"not  in"`, `"is not"`, `"<>"`).
pub fn parse_operator(raw: &str) -> Result<Operator, CriterionError> {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();

    let op = match normalized.as_str() {
        "=" | "==" => Operator::Compare(CompareOp::Eq),
        "!=" | "<>" => Operator::Compare(CompareOp::Ne),
        ">" => Operator::Compare(CompareOp::Gt),
        ">=" => Operator::Compare(CompareOp::Gte),
        "<" => Operator::Compare(CompareOp::Lt),
        "<=" => Operator::Compare(CompareOp::Lte),
        "IS" => Operator::Compare(CompareOp::Is),
        "IS NOT" => Operator::Compare(CompareOp::IsNot),
        "IN" => Operator::Set(SetOp::In),
        "NOT IN" => Operator::Set(SetOp::NotIn),
        _ => return Err(CriterionError::UnknownOperator(raw.to_string())),
    };
    Ok(op)
}
