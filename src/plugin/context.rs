use std::collections::{BTreeMap, BTreeSet};

use crate::candidate::{QueryFilters, SemanticParseCandidate};
use crate::schema::SchemaElementMatch;

/// Per-request state shared by the recall steps.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    /// Raw query text.
    pub query_text: String,
    /// Requester's tenant, if known.
    pub tenant_id: Option<i64>,
    /// Models the request is scoped to; empty means all.
    pub model_ids: BTreeSet<i64>,
    /// Schema elements recognized in the query, per model.
    pub element_matches: BTreeMap<i64, Vec<SchemaElementMatch>>,
    /// Filters supplied with the request.
    pub filters: QueryFilters,
    /// Candidates produced so far; recall appends to this.
    pub candidates: Vec<SemanticParseCandidate>,
}

impl QueryContext {
    /// A context for `query_text` with nothing else known yet.
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Self::default()
        }
    }

    /// Query length in characters, the unit scores are compared against.
    pub fn query_len(&self) -> usize {
        self.query_text.chars().count()
    }

    /// Element matches recognized for `model_id`.
    pub fn matches_for(&self, model_id: i64) -> &[SchemaElementMatch] {
        self.element_matches
            .get(&model_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
