use serde::{Deserialize, Serialize};

use crate::criterion::{Criteria, Criterion};
use crate::sort::Sort;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub criteria: Vec<Criterion>,
    /// Empty means the schema's default order (identifier, descending).
    #[serde(default)]
    pub sort: Vec<Sort>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub count_only: bool,
}

impl Query {
    pub fn new(criteria: impl Into<Vec<Criterion>>) -> Self {
        Self {
            criteria: criteria.into(),
            ..Default::default()
        }
    }

    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Raw offset/limit; out-of-range values are clamped when compiled.
    pub fn slice(mut self, offset: i64, limit: i64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// 1-based page of `per_page` rows.
    pub fn page(self, page: i64, per_page: i64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.slice(offset, per_page)
    }

    pub fn count(mut self) -> Self {
        self.count_only = true;
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }

    /// The same filter as a count query: no slicing, no explicit sort.
    pub fn to_count(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            sort: Vec::new(),
            offset: None,
            limit: None,
            count_only: true,
        }
    }
}

impl From<Criteria> for Query {
    fn from(criteria: Criteria) -> Self {
        Query::new(criteria)
    }
}
