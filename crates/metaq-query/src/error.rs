/// Rejected criterion or malformed option bag.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriterionError {
    #[error("invalid field name: {0:?}")]
    InvalidField(String),

    #[error("empty value set for field {0}")]
    EmptySet(String),

    #[error("meta match requires a non-empty meta key")]
    EmptyMetaKey,

    #[error("operator {op} cannot be used with value {value}")]
    InvalidOperand { op: String, value: String },

    #[error("unknown compare operator: {0}")]
    UnknownOperator(String),

    #[error("malformed query: {0}")]
    Malformed(String),
}
