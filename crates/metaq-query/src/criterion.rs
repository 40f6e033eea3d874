use serde::{Deserialize, Serialize};

use crate::error::CriterionError;
use crate::operator::{CompareOp, SetOp};
use crate::value::Value;

/// The shape of a single filter condition.
///
/// Column criteria name a field of the primary table; `MetaMatch` names a key
/// in the attribute table instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum CriterionKind {
    Equals {
        field: String,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
        #[serde(default)]
        op: SetOp,
    },
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Key-only existence check when `value` is `None`.
    MetaMatch {
        key: String,
        value: Option<Value>,
        op: Option<CompareOp>,
    },
}

/// A validated filter condition. Only constructible through [`Criterion::new`]
/// (or deserialization, which runs the same checks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CriterionKind", into = "CriterionKind")]
pub struct Criterion {
    kind: CriterionKind,
}

impl Criterion {
    pub fn new(kind: CriterionKind) -> Result<Self, CriterionError> {
        let kind = match kind {
            CriterionKind::Equals { field, value } => {
                check_field(&field)?;
                check_operand(CompareOp::Eq, &value)?;
                CriterionKind::Equals { field, value }
            }
            CriterionKind::In { field, values, op } => {
                check_field(&field)?;
                if values.is_empty() {
                    return Err(CriterionError::EmptySet(field));
                }
                if let Some(bad) = values.iter().find(|v| !is_literal(v)) {
                    return Err(CriterionError::InvalidOperand {
                        op: op.as_sql().to_string(),
                        value: bad.to_string(),
                    });
                }
                CriterionKind::In { field, values, op }
            }
            CriterionKind::Compare { field, op, value } => {
                check_field(&field)?;
                check_operand(op, &value)?;
                CriterionKind::Compare { field, op, value }
            }
            CriterionKind::MetaMatch { key, value, op } => {
                if key.trim().is_empty() {
                    return Err(CriterionError::EmptyMetaKey);
                }
                match value {
                    Some(value) => {
                        let op = op.unwrap_or(CompareOp::Eq);
                        check_operand(op, &value)?;
                        CriterionKind::MetaMatch {
                            key,
                            value: Some(value),
                            op: Some(op),
                        }
                    }
                    None => CriterionKind::MetaMatch {
                        key,
                        value: None,
                        op: None,
                    },
                }
            }
        };
        Ok(Self { kind })
    }

    pub fn kind(&self) -> &CriterionKind {
        &self.kind
    }

    /// Primary-table column this criterion filters on; `None` for meta matches.
    pub fn field(&self) -> Option<&str> {
        match &self.kind {
            CriterionKind::Equals { field, .. }
            | CriterionKind::In { field, .. }
            | CriterionKind::Compare { field, .. } => Some(field),
            CriterionKind::MetaMatch { .. } => None,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.kind, CriterionKind::MetaMatch { .. })
    }
}

impl TryFrom<CriterionKind> for Criterion {
    type Error = CriterionError;

    fn try_from(kind: CriterionKind) -> Result<Self, Self::Error> {
        Criterion::new(kind)
    }
}

impl From<Criterion> for CriterionKind {
    fn from(criterion: Criterion) -> Self {
        criterion.kind
    }
}

/// Returns true for a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn check_field(field: &str) -> Result<(), CriterionError> {
    if is_identifier(field) {
        Ok(())
    } else {
        Err(CriterionError::InvalidField(field.to_string()))
    }
}

fn check_operand(op: CompareOp, value: &Value) -> Result<(), CriterionError> {
    let ok = if op.is_identity() {
        matches!(value, Value::Null | Value::Bool(_))
    } else {
        is_literal(value)
    };
    if ok {
        Ok(())
    } else {
        Err(CriterionError::InvalidOperand {
            op: op.as_sql().to_string(),
            value: value.to_string(),
        })
    }
}

/// Non-null and, for floats, finite: anything that renders as a SQL literal.
fn is_literal(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Float(n) => n.is_finite(),
        _ => true,
    }
}

/// Ordered conjunction of criteria, accumulated by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    items: Vec<Criterion>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_equals(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, CriterionError> {
        self.push(CriterionKind::Equals {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn add_in<V: Into<Value>>(
        &mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self, CriterionError> {
        self.push(CriterionKind::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            op: SetOp::In,
        })
    }

    pub fn add_not_in<V: Into<Value>>(
        &mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self, CriterionError> {
        self.push(CriterionKind::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            op: SetOp::NotIn,
        })
    }

    pub fn add_compare(
        &mut self,
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> Result<&mut Self, CriterionError> {
        self.push(CriterionKind::Compare {
            field: field.into(),
            op,
            value: value.into(),
        })
    }

    /// `op` defaults to `=` when a value is given and is ignored otherwise.
    pub fn add_meta_match(
        &mut self,
        meta_key: impl Into<String>,
        meta_value: Option<Value>,
        op: Option<CompareOp>,
    ) -> Result<&mut Self, CriterionError> {
        self.push(CriterionKind::MetaMatch {
            key: meta_key.into(),
            value: meta_value,
            op,
        })
    }

    pub fn push(&mut self, kind: CriterionKind) -> Result<&mut Self, CriterionError> {
        self.items.push(Criterion::new(kind)?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Criterion> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Criterion> {
        self.items
    }
}

impl From<Criteria> for Vec<Criterion> {
    fn from(criteria: Criteria) -> Self {
        criteria.items
    }
}
