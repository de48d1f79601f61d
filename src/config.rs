use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on results returned by a single dictionary lookup.
pub const DEFAULT_SEARCH_SIZE: usize = 200;
/// Per-call limit used by the segment matcher for each prefix/suffix lookup.
pub const DEFAULT_SEGMENT_SEARCH_SIZE: usize = 3;
/// Business name of the dimension that carries the tenant identifier.
pub const DEFAULT_TENANT_BIZ_NAME: &str = "tenant_id";

/// Runtime configuration for the matcher, recall engine, and corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Global cap applied after sorting lookup results.
    pub search_size: usize,
    /// Limit passed to each prefix/suffix lookup while scanning segments.
    pub segment_search_size: usize,
    /// Size of the segment-matching worker pool. `None` uses available parallelism.
    pub worker_threads: Option<usize>,
    /// Localized names of the time dimensions recognized in WHERE clauses.
    pub time_dimensions: TimeDimensionNames,
    /// Business name resolved to the tenant dimension during filter injection.
    pub tenant_biz_name: String,
    /// Query modes that identify plugin-backed candidates.
    pub plugin_query_modes: Vec<String>,
    /// Which plugin recall family is active.
    pub recall: RecallStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_size: DEFAULT_SEARCH_SIZE,
            segment_search_size: DEFAULT_SEGMENT_SEARCH_SIZE,
            worker_threads: None,
            time_dimensions: TimeDimensionNames::default(),
            tenant_biz_name: DEFAULT_TENANT_BIZ_NAME.to_string(),
            plugin_query_modes: vec![
                "PLUGIN".to_string(),
                "WEB_PAGE".to_string(),
                "WEB_SERVICE".to_string(),
            ],
            recall: RecallStrategy::Keyword,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document. Missing fields take their defaults.
    pub fn load_from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::load_from_json(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.search_size == 0 {
            return Err(Error::Config("search_size must be positive".to_string()));
        }
        if self.segment_search_size == 0 {
            return Err(Error::Config(
                "segment_search_size must be positive".to_string(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(Error::Config("worker_threads must be positive".to_string()));
        }
        if self.tenant_biz_name.trim().is_empty() {
            return Err(Error::Config("tenant_biz_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Whether `mode` is registered as a plugin query mode.
    pub fn is_plugin_mode(&self, mode: &str) -> bool {
        self.plugin_query_modes.iter().any(|m| m == mode)
    }
}

/// Localized display names of the built-in time dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeDimensionNames {
    /// Day granularity; also the column used for the default date filter.
    pub day: String,
    /// Week granularity.
    pub week: String,
    /// Month granularity.
    pub month: String,
}

impl Default for TimeDimensionNames {
    fn default() -> Self {
        Self {
            day: "数据日期".to_string(),
            week: "数据日期_周".to_string(),
            month: "数据日期_月".to_string(),
        }
    }
}

impl TimeDimensionNames {
    /// True when any of `fields` names a recognized time dimension.
    pub fn contains_any<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        fields.iter().any(|field| {
            let field = field.as_ref();
            field == self.day || field == self.week || field == self.month
        })
    }
}

/// Plugin recall family selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallStrategy {
    /// Plain keyword containment.
    Keyword,
    /// Regular-expression triggers.
    Pattern,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::load_from_json(r#"{"segment_search_size": 5}"#)
            .expect("partial config should parse");
        assert_eq!(config.segment_search_size, 5);
        assert_eq!(config.search_size, DEFAULT_SEARCH_SIZE);
        assert_eq!(config.tenant_biz_name, "tenant_id");
        assert_eq!(config.time_dimensions.day, "数据日期");
        assert_eq!(config.recall, RecallStrategy::Keyword);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = EngineConfig::load_from_json(r#"{"search_size": 0}"#)
            .expect_err("zero search size should fail validation");
        assert!(err.to_string().contains("search_size"));

        let err = EngineConfig::load_from_json(r#"{"worker_threads": 0}"#)
            .expect_err("zero worker count should fail validation");
        assert!(err.to_string().contains("worker_threads"));
    }

    #[test]
    fn recall_strategy_uses_snake_case() {
        let config = EngineConfig::load_from_json(r#"{"recall": "pattern"}"#)
            .expect("config should parse");
        assert_eq!(config.recall, RecallStrategy::Pattern);
    }

    #[test]
    fn time_dimension_detection_matches_exact_names() {
        let names = TimeDimensionNames::default();
        assert!(names.contains_any(&["城市", "数据日期_月"]));
        assert!(!names.contains_any(&["日期", "城市"]));
        assert!(!names.contains_any::<&str>(&[]));
    }

    #[test]
    fn plugin_modes_are_checked_by_exact_name() {
        let config = EngineConfig::default();
        assert!(config.is_plugin_mode("WEB_PAGE"));
        assert!(!config.is_plugin_mode("LLM_S2SQL"));
    }
}
