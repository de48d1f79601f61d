#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use s2sql::candidate::QueryFilters;
use s2sql::config::EngineConfig;
use s2sql::dictionary::DictionaryIndex;
use s2sql::matcher::SegmentMatcher;
use s2sql::plugin::model::{load_plugins, Plugin};
use s2sql::schema::{SchemaElementMatch, SemanticSchema};

pub(crate) fn fixture_dir(fixture: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(fixture)
}

pub(crate) fn fixture_path(fixture: &str, file: &str) -> PathBuf {
    fixture_dir(fixture).join(file)
}

pub(crate) fn read_fixture(fixture: &str, file: &str) -> String {
    std::fs::read_to_string(fixture_path(fixture, file)).expect("fixture should be readable")
}

pub(crate) fn load_config(fixture: &str) -> EngineConfig {
    EngineConfig::from_path(&fixture_path(fixture, "config.json"))
        .expect("fixture config should parse")
}

pub(crate) fn load_dictionary(fixture: &str) -> DictionaryIndex {
    DictionaryIndex::from_path(
        &fixture_path(fixture, "dictionary.json"),
        s2sql::config::DEFAULT_SEARCH_SIZE,
    )
    .expect("fixture dictionary should parse")
}

pub(crate) fn load_schema(fixture: &str) -> SemanticSchema {
    SemanticSchema::from_path(&fixture_path(fixture, "schema.json"))
        .expect("fixture schema should parse")
}

pub(crate) fn load_plugins_fixture(fixture: &str) -> Vec<Plugin> {
    load_plugins(&fixture_path(fixture, "plugins.json")).expect("fixture plugins should parse")
}

pub(crate) fn load_filters(fixture: &str) -> QueryFilters {
    serde_json::from_str(&read_fixture(fixture, "filters.json"))
        .expect("fixture filters should parse")
}

pub(crate) fn matcher(fixture: &str) -> SegmentMatcher {
    let config = EngineConfig {
        worker_threads: Some(2),
        ..EngineConfig::default()
    };
    SegmentMatcher::new(Arc::new(load_dictionary(fixture)), &config)
        .expect("matcher pool should build")
}

/// Exact match of schema element `id` on `word`.
pub(crate) fn element_match(schema: &SemanticSchema, id: i64, word: &str) -> SchemaElementMatch {
    let element = schema
        .element(id)
        .cloned()
        .expect("fixture element should exist");
    SchemaElementMatch {
        element,
        word: word.to_string(),
        similarity: 1.0,
        detect_word: Some(word.to_string()),
    }
}

pub(crate) fn tags(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}
