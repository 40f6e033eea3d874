use metaq_query::{Value, is_identifier};
use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// Names of the primary table and its attribute table.
///
/// Defaults describe the media table and its meta table. Every name is
/// interpolated into SQL, so [`Schema::validate`] only accepts plain identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub table: String,
    pub id_column: String,
    pub meta_table: String,
    /// Attribute-table column holding the owning entity's id.
    pub meta_entity_column: String,
    pub meta_key_column: String,
    pub meta_value_column: String,
    /// Column used when a query has no explicit sort; always descending.
    pub default_order: String,
    /// Fixed equality applied to every query (e.g. the current blog id).
    pub scope: Option<Scope>,
    /// When set, criteria and sorts may only name these columns (plus the id).
    pub allowed_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub column: String,
    pub value: Value,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            table: "wp_rt_rtm_media".into(),
            id_column: "id".into(),
            meta_table: "wp_rt_rtm_media_meta".into(),
            meta_entity_column: "media_id".into(),
            meta_key_column: "meta_key".into(),
            meta_value_column: "meta_value".into(),
            default_order: "id".into(),
            scope: None,
            allowed_fields: None,
        }
    }
}

impl Schema {
    /// Parse and validate a JSON schema. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, DbError> {
        let schema: Schema =
            serde_json::from_str(json).map_err(|e| DbError::InvalidSchema(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn with_scope(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.scope = Some(Scope {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<(), DbError> {
        let names = [
            ("table", &self.table),
            ("id_column", &self.id_column),
            ("meta_table", &self.meta_table),
            ("meta_entity_column", &self.meta_entity_column),
            ("meta_key_column", &self.meta_key_column),
            ("meta_value_column", &self.meta_value_column),
            ("default_order", &self.default_order),
        ];
        for (what, name) in names {
            if !is_identifier(name) {
                return Err(DbError::InvalidSchema(format!("{what}: {name:?}")));
            }
        }

        if let Some(scope) = &self.scope {
            if !is_identifier(&scope.column) {
                return Err(DbError::InvalidSchema(format!(
                    "scope column: {:?}",
                    scope.column
                )));
            }
            if scope.value.is_null() {
                return Err(DbError::InvalidSchema("scope value must not be null".into()));
            }
        }

        if let Some(fields) = &self.allowed_fields {
            if let Some(bad) = fields.iter().find(|f| !is_identifier(f)) {
                return Err(DbError::InvalidSchema(format!("allowed field: {bad:?}")));
            }
        }
        Ok(())
    }

    /// Whether `field` may be filtered or sorted on under this schema.
    pub fn allows(&self, field: &str) -> bool {
        match &self.allowed_fields {
            None => true,
            Some(fields) => field == self.id_column || fields.iter().any(|f| f == field),
        }
    }
}
