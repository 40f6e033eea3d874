#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("write lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("entity is missing integer id field {0:?}")]
    MissingId(String),

    #[error("duplicate entity id: {0}")]
    Duplicate(i64),

    #[error("entity not found: {0}")]
    NotFound(i64),
}
