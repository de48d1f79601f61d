use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::element::{SchemaElement, SchemaElementType};

/// Read-only snapshot of schema metadata across models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticSchema {
    /// All elements, in declaration order.
    #[serde(default)]
    pub elements: Vec<SchemaElement>,
}

impl SemanticSchema {
    /// Wrap a list of elements.
    pub fn new(elements: Vec<SchemaElement>) -> Self {
        Self { elements }
    }

    /// Parse a schema document.
    pub fn load_from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a schema document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::load_from_json(&raw)
    }

    /// Elements of the given models. An empty set selects every model.
    pub fn elements_of<'a>(
        &'a self,
        model_ids: &'a BTreeSet<i64>,
    ) -> impl Iterator<Item = &'a SchemaElement> + 'a {
        self.elements
            .iter()
            .filter(move |e| in_scope(model_ids, e))
    }

    /// Dimensions of the given models.
    pub fn dimensions<'a>(
        &'a self,
        model_ids: &'a BTreeSet<i64>,
    ) -> impl Iterator<Item = &'a SchemaElement> + 'a {
        self.elements_of(model_ids)
            .filter(|e| e.element_type == SchemaElementType::Dimension)
    }

    /// First declared dimension of the given models with this business name.
    pub fn dimension_by_biz_name(
        &self,
        model_ids: &BTreeSet<i64>,
        biz_name: &str,
    ) -> Option<&SchemaElement> {
        self.elements.iter().find(|e| {
            in_scope(model_ids, e)
                && e.element_type == SchemaElementType::Dimension
                && e.biz_name == biz_name
        })
    }

    /// Element by id.
    pub fn element(&self, id: i64) -> Option<&SchemaElement> {
        self.elements.iter().find(|e| e.id == id)
    }
}

fn in_scope(model_ids: &BTreeSet<i64>, element: &SchemaElement) -> bool {
    model_ids.is_empty() || model_ids.contains(&element.model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimension(id: i64, model_id: i64, name: &str, biz_name: &str) -> SchemaElement {
        SchemaElement {
            id,
            model_id,
            name: name.to_string(),
            biz_name: biz_name.to_string(),
            alias: Vec::new(),
            element_type: SchemaElementType::Dimension,
            value_maps: Vec::new(),
        }
    }

    #[test]
    fn dimension_lookup_is_model_scoped_and_first_wins() {
        let schema = SemanticSchema::new(vec![
            dimension(1, 1, "租户", "tenant_id"),
            dimension(2, 1, "租户ID", "tenant_id"),
            dimension(3, 2, "租户编号", "tenant_id"),
        ]);

        let found = schema
            .dimension_by_biz_name(&BTreeSet::from([1]), "tenant_id")
            .expect("tenant dimension should resolve");
        assert_eq!(found.name, "租户");

        let found = schema
            .dimension_by_biz_name(&BTreeSet::from([2]), "tenant_id")
            .expect("tenant dimension should resolve");
        assert_eq!(found.name, "租户编号");

        assert!(schema
            .dimension_by_biz_name(&BTreeSet::from([9]), "tenant_id")
            .is_none());
    }

    #[test]
    fn dimension_lookup_outlives_a_temporary_scope() {
        let schema = SemanticSchema::new(vec![dimension(1, 1, "租户", "tenant_id")]);
        let found = {
            let scope = BTreeSet::from([1]);
            schema.dimension_by_biz_name(&scope, "tenant_id")
        };
        assert_eq!(found.map(|e| e.id), Some(1));
    }

    #[test]
    fn empty_model_set_selects_everything() {
        let schema = SemanticSchema::new(vec![dimension(1, 1, "a", "a"), dimension(2, 2, "b", "b")]);
        assert_eq!(schema.dimensions(&BTreeSet::new()).count(), 2);
    }
}
