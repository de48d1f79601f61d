use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidate::filter::QueryFilter;
use crate::schema::SchemaElementMatch;

/// Property key naming the recalled plugin.
pub const PLUGIN_ID_PROPERTY: &str = "plugin_id";
/// Property key carrying the recalled plugin's display name.
pub const PLUGIN_NAME_PROPERTY: &str = "name";
/// Property key carrying the recalled plugin's type tag.
pub const PLUGIN_TYPE_PROPERTY: &str = "type";
/// Value of [`PLUGIN_TYPE_PROPERTY`] on plugin candidates.
pub const PLUGIN_TYPE_MARKER: &str = "plugin";
/// Model id used when a candidate is not bound to one model.
pub const ANY_MODEL: i64 = -1;

/// SQL text attached to a candidate and the fields extracted from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlInfo {
    /// SQL as generated, before correction.
    #[serde(default)]
    pub raw_sql: String,
    /// Result of one full correction pass over `raw_sql`.
    #[serde(default)]
    pub corrected_sql: String,
    /// Business name to `"<operator> <value>"` for each resolved WHERE field.
    #[serde(default)]
    pub filter_fields: BTreeMap<String, String>,
    /// Business names of resolved SELECT fields, in projection order.
    #[serde(default)]
    pub select_fields: Vec<String>,
}

/// Date window recognized in the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInfo {
    /// Inclusive start, `YYYY-MM-DD`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive end, `YYYY-MM-DD`.
    #[serde(default)]
    pub end_date: Option<String>,
}

/// One interpretation of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticParseCandidate {
    /// Model the interpretation is bound to; [`ANY_MODEL`] when unbound.
    #[serde(default)]
    pub model_id: Option<i64>,
    /// How the candidate is fulfilled, e.g. `LLM_S2SQL` or `PLUGIN`.
    #[serde(default)]
    pub query_mode: String,
    /// Schema elements recognized in the query.
    #[serde(default)]
    pub element_matches: Vec<SchemaElementMatch>,
    /// Ranking score.
    #[serde(default)]
    pub score: f64,
    /// Generated SQL and extracted fields.
    #[serde(default)]
    pub sql_info: SqlInfo,
    /// Free-form attributes, e.g. plugin identity.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    /// Filters synthesized from element matches.
    #[serde(default)]
    pub dimension_filters: Vec<QueryFilter>,
    /// Recognized date window.
    #[serde(default)]
    pub date_info: Option<DateInfo>,
}

impl SemanticParseCandidate {
    /// Model ids the candidate touches, for schema lookups. Empty when unbound.
    pub fn model_scope(&self) -> BTreeSet<i64> {
        match self.model_id {
            Some(id) if id != ANY_MODEL => BTreeSet::from([id]),
            _ => BTreeSet::new(),
        }
    }

    /// Whether generated SQL is present.
    pub fn has_sql(&self) -> bool {
        !self.sql_info.raw_sql.trim().is_empty()
    }
}
