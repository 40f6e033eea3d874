use std::error::Error as StdError;

use metaq_query::CriterionError;

/// Failure reported by a storage collaborator. Opaque to the compiler; the
/// caller decides whether to retry.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StorageError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "memory")]
impl From<metaq_store::StoreError> for StorageError {
    fn from(e: metaq_store::StoreError) -> Self {
        StorageError::with_source("memory store failure", e)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid criterion: {0}")]
    InvalidCriterion(#[from] CriterionError),

    #[error("unsupported criterion: {0}")]
    UnsupportedCriterion(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
