use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaElementType {
    /// A groupable attribute.
    Dimension,
    /// An aggregatable measure.
    Metric,
    /// A concrete value of a dimension.
    Value,
    /// An identifier column.
    Id,
    /// A business entity.
    Entity,
    /// A tag element.
    Tag,
}

impl SchemaElementType {
    /// VALUE and ID elements are the only ones that become equality filters.
    pub fn is_filterable(self) -> bool {
        matches!(self, SchemaElementType::Value | SchemaElementType::Id)
    }

    /// DIMENSION and METRIC elements are the only ones that become select fields.
    pub fn is_selectable(self) -> bool {
        matches!(self, SchemaElementType::Dimension | SchemaElementType::Metric)
    }
}

impl fmt::Display for SchemaElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaElementType::Dimension => write!(f, "DIMENSION"),
            SchemaElementType::Metric => write!(f, "METRIC"),
            SchemaElementType::Value => write!(f, "VALUE"),
            SchemaElementType::Id => write!(f, "ID"),
            SchemaElementType::Entity => write!(f, "ENTITY"),
            SchemaElementType::Tag => write!(f, "TAG"),
        }
    }
}

/// Mapping from a business-facing value (and its aliases) to the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaValueMap {
    /// Business name of the value, e.g. `qq_music`.
    #[serde(default)]
    pub biz_name: Option<String>,
    /// Value as stored, e.g. `t_001`.
    #[serde(default)]
    pub tech_name: Option<String>,
    /// Display aliases, e.g. `QQ音乐`.
    #[serde(default)]
    pub alias: Vec<String>,
}

/// A dimension, metric, value, or id exposed by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaElement {
    /// Element id, unique within the schema.
    pub id: i64,
    /// Owning model.
    pub model_id: i64,
    /// Display name, the form used in generated SQL.
    pub name: String,
    /// Stable business identifier.
    pub biz_name: String,
    /// Alternate display names.
    #[serde(default)]
    pub alias: Vec<String>,
    /// Element kind.
    #[serde(rename = "type")]
    pub element_type: SchemaElementType,
    /// Business-name/alias to technical value mappings.
    #[serde(default)]
    pub value_maps: Vec<SchemaValueMap>,
}

impl SchemaElement {
    /// Whether `field` names this element by display name, business name, or alias.
    pub fn is_named(&self, field: &str) -> bool {
        self.name == field || self.biz_name == field || self.alias.iter().any(|a| a == field)
    }
}

/// A schema element recognized in the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaElementMatch {
    /// The matched element.
    pub element: SchemaElement,
    /// Word from the dictionary that produced the match.
    pub word: String,
    /// Match quality in `[0, 1]`.
    #[serde(default = "full_similarity")]
    pub similarity: f64,
    /// The query text span that was searched.
    #[serde(default)]
    pub detect_word: Option<String>,
}

fn full_similarity() -> f64 {
    1.0
}
