//! Nature tags attached to dictionary terms.
//!
//! Tags follow the `_<modelId>_<elementId>_<kind>` convention, e.g.
//! `_1_12_dimension` or `_3_40_metric`. A bare `_<modelId>_<elementId>` tag
//! marks a dimension value. Suffix-trie variants append [`SUFFIX_MARKER`].

use std::collections::BTreeSet;

/// Separator between the components of a nature tag.
pub const NATURE_SPLIT: char = '_';
/// Marker appended to tags stored in the suffix trie.
pub const SUFFIX_MARKER: &str = "_suffix";
/// Trailing marker of tags that name whole entities.
pub const ENTITY_MARKER: &str = "entity";

/// Word class encoded in a nature tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordKind {
    /// `_<model>` or `_<model>_model`.
    Model,
    /// A metric name or alias.
    Metric,
    /// A dimension name or alias.
    Dimension,
    /// A dimension value (no trailing kind).
    Value,
    /// An entity name.
    Entity,
    /// A tag element.
    Tag,
    /// Anything else, including tags outside the convention.
    Other,
}

impl WordKind {
    fn from_marker(marker: &str) -> Self {
        match marker {
            "metric" => WordKind::Metric,
            "dimension" => WordKind::Dimension,
            "entity" => WordKind::Entity,
            "tag" => WordKind::Tag,
            "model" => WordKind::Model,
            _ => WordKind::Other,
        }
    }
}

/// Parsed view of one nature tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatureTag {
    /// Model the term belongs to, when the tag encodes one.
    pub model_id: Option<i64>,
    /// Schema element the term belongs to, when the tag encodes one.
    pub element_id: Option<i64>,
    /// Word class.
    pub kind: WordKind,
    /// Whether the tag carries the suffix-trie marker.
    pub suffix: bool,
}

impl NatureTag {
    /// Parse a raw tag. Unrecognized shapes yield [`WordKind::Other`] with no ids.
    pub fn parse(raw: &str) -> Self {
        let (body, suffix) = match raw.strip_suffix(SUFFIX_MARKER) {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let Some(body) = body.strip_prefix(NATURE_SPLIT) else {
            return Self {
                model_id: None,
                element_id: None,
                kind: WordKind::Other,
                suffix,
            };
        };

        let parts: Vec<&str> = body.split(NATURE_SPLIT).collect();
        let model_id = parts.first().and_then(|p| p.parse::<i64>().ok());
        let element_id = parts.get(1).and_then(|p| p.parse::<i64>().ok());

        let kind = match (model_id, element_id, parts.len()) {
            (None, _, _) => WordKind::Other,
            (Some(_), None, 1) => WordKind::Model,
            (Some(_), None, _) => WordKind::from_marker(parts[1]),
            (Some(_), Some(_), 2) => WordKind::Value,
            (Some(_), Some(_), _) => WordKind::from_marker(parts[2]),
        };

        Self {
            model_id,
            element_id,
            kind,
            suffix,
        }
    }
}

/// Remove the suffix-trie marker from a tag.
pub fn strip_suffix_marker(tag: &str) -> String {
    tag.replace(SUFFIX_MARKER, "")
}

/// True for tags that mark whole-entity terms.
pub fn is_entity(tag: &str) -> bool {
    tag.ends_with(ENTITY_MARKER)
}

/// True when at least one tag names a metric or dimension.
pub fn is_metric_or_dimension(tags: &[String]) -> bool {
    tags.iter().any(|tag| {
        matches!(
            NatureTag::parse(tag).kind,
            WordKind::Metric | WordKind::Dimension
        )
    })
}

/// True when at least one tag belongs to a model in `model_ids`.
pub fn belongs_to_any(tags: &[String], model_ids: &BTreeSet<i64>) -> bool {
    tags.iter()
        .filter_map(|tag| NatureTag::parse(tag).model_id)
        .any(|model_id| model_ids.contains(&model_id))
}

/// Union `incoming` into `existing`, keeping first-seen order.
pub fn merge_into(existing: &mut Vec<String>, incoming: &[String]) {
    for tag in incoming {
        if !existing.contains(tag) {
            existing.push(tag.clone());
        }
    }
}
