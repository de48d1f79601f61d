use serde::Serialize;
use serde_json::Value;

use crate::candidate::{QueryFilters, SemanticParseCandidate};
use crate::error::Result;
use crate::plugin::model::{ParamType, Plugin};
use crate::schema::SchemaElementMatch;

/// One key/value pair handed to the external plugin client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamBinding {
    /// Parameter name.
    pub key: String,
    /// Parameter value.
    pub value: Value,
}

impl ParamBinding {
    fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Parameters for invoking `plugin` on behalf of `candidate`.
///
/// Semantic parameters take the word of an exact VALUE/ID match on their
/// element, unless a request filter on that element disagrees. Custom
/// parameters take their fixed value; forwarded ones are left to the caller.
pub fn build_param_bindings(
    plugin: &Plugin,
    candidate: &SemanticParseCandidate,
    filters: &QueryFilters,
    tenant_id: Option<i64>,
) -> Result<Vec<ParamBinding>> {
    let mut bindings = Vec::new();

    for param in &plugin.params {
        match param.param_type {
            ParamType::Semantic => {
                let Some(element_id) = param.element_id else {
                    continue;
                };
                if let Some(word) = semantic_value(&candidate.element_matches, filters, element_id) {
                    bindings.push(ParamBinding::new(param.key.clone(), word));
                }
            }
            ParamType::Custom => {
                if let Some(value) = &param.value {
                    bindings.push(ParamBinding::new(param.key.clone(), value.clone()));
                }
            }
            ParamType::Forward => {}
        }
    }

    if let Some(date) = &candidate.date_info {
        if let Some(start) = &date.start_date {
            bindings.push(ParamBinding::new("start_date", start.clone()));
        }
        if let Some(end) = &date.end_date {
            bindings.push(ParamBinding::new("end_date", end.clone()));
        }
    }
    if let Some(tenant) = tenant_id.filter(|t| *t > 0) {
        bindings.push(ParamBinding::new("tenant_id", tenant));
    }
    bindings.push(ParamBinding::new(
        "filter_fields_map",
        serde_json::to_string(&candidate.sql_info.filter_fields)?,
    ));
    bindings.push(ParamBinding::new(
        "select_fields",
        serde_json::to_string(&candidate.sql_info.select_fields)?,
    ));
    Ok(bindings)
}

fn semantic_value(
    matches: &[SchemaElementMatch],
    filters: &QueryFilters,
    element_id: i64,
) -> Option<String> {
    let found = matches.iter().find(|m| {
        m.element.id == element_id
            && m.element.element_type.is_filterable()
            && m.similarity >= 1.0
    })?;
    if let Some(filter) = filters.for_element(element_id) {
        if filter.value.as_str() != Some(found.word.as_str()) {
            return None;
        }
    }
    Some(found.word.clone())
}
