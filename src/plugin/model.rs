use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where a plugin parameter takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamType {
    /// Bound to a recognized schema element.
    Semantic,
    /// A fixed value from the plugin definition.
    Custom,
    /// Forwarded from the caller's request; not bound here.
    Forward,
}

/// One parameter of a plugin's invocation template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamOption {
    /// Parameter name sent to the plugin.
    pub key: String,
    /// Value source.
    pub param_type: ParamType,
    /// Element bound by a [`ParamType::Semantic`] parameter.
    #[serde(default)]
    pub element_id: Option<i64>,
    /// Model of the bound element.
    #[serde(default)]
    pub model_id: Option<i64>,
    /// Fixed value of a [`ParamType::Custom`] parameter.
    #[serde(default)]
    pub value: Option<String>,
}

/// An externally configured alternate fulfillment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    /// Plugin id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Type tag, e.g. `WEB_PAGE` or `WEB_SERVICE`.
    #[serde(rename = "type", default = "default_plugin_type")]
    pub plugin_type: String,
    /// Models the plugin serves.
    #[serde(default)]
    pub model_ids: BTreeSet<i64>,
    /// Serves every model regardless of `model_ids`.
    #[serde(default)]
    pub contains_all_model: bool,
    /// Trigger keywords for keyword recall.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Trigger regular expressions for pattern recall.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Invocation parameter template.
    #[serde(default)]
    pub params: Vec<ParamOption>,
}

fn default_plugin_type() -> String {
    "PLUGIN".to_string()
}

impl Plugin {
    /// Models of `requested` this plugin may answer for.
    ///
    /// `None` means the plugin is not eligible. An empty set means eligible
    /// without a specific model: the plugin spans every model, or nothing
    /// narrower was requested and it declares no models.
    pub fn eligible_models(&self, requested: &BTreeSet<i64>) -> Option<BTreeSet<i64>> {
        if self.contains_all_model {
            return Some(BTreeSet::new());
        }
        if requested.is_empty() {
            return Some(self.model_ids.clone());
        }
        let shared: BTreeSet<i64> = self.model_ids.intersection(requested).copied().collect();
        if shared.is_empty() {
            None
        } else {
            Some(shared)
        }
    }
}

/// Outcome of a successful plugin recall.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRecallResult {
    /// The recalled plugin.
    pub plugin: Plugin,
    /// Models to build candidates for; empty when model-agnostic.
    pub model_ids: BTreeSet<i64>,
    /// Unmatched characters of the query; lower is better.
    pub distance: f64,
    /// Recall score, copied onto each candidate.
    pub score: f64,
}

/// Parse a JSON array of plugin definitions.
pub fn load_plugins_from_json(json: &str) -> Result<Vec<Plugin>> {
    Ok(serde_json::from_str(json)?)
}

/// Read plugin definitions from disk.
pub fn load_plugins(path: &Path) -> Result<Vec<Plugin>> {
    let raw = std::fs::read_to_string(path)?;
    load_plugins_from_json(&raw)
}
