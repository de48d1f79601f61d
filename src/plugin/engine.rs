use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::candidate::parse_info::{
    ANY_MODEL, PLUGIN_ID_PROPERTY, PLUGIN_NAME_PROPERTY, PLUGIN_TYPE_MARKER,
    PLUGIN_TYPE_PROPERTY,
};
use crate::candidate::{QueryFilter, SemanticParseCandidate, SqlInfo};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::parser::fields::{select_fields, where_expressions};
use crate::parser::sql_parser::parse_select;
use crate::plugin::context::QueryContext;
use crate::plugin::model::{Plugin, PluginRecallResult};
use crate::plugin::recall::{recaller_for, PluginRecaller};
use crate::schema::{SchemaElement, SchemaElementMatch};

/// Recalls plugin candidates alongside the default SQL candidates.
pub struct PluginRecallEngine {
    recaller: Box<dyn PluginRecaller>,
    plugin_query_modes: Vec<String>,
    plugin_query_mode: String,
}

impl std::fmt::Debug for PluginRecallEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecallEngine")
            .field("plugin_query_modes", &self.plugin_query_modes)
            .finish_non_exhaustive()
    }
}

impl PluginRecallEngine {
    /// Engine around an explicit recaller.
    pub fn new(recaller: Box<dyn PluginRecaller>, config: &EngineConfig) -> Self {
        let plugin_query_mode = config
            .plugin_query_modes
            .first()
            .cloned()
            .unwrap_or_else(|| PLUGIN_TYPE_MARKER.to_uppercase());
        Self {
            recaller,
            plugin_query_modes: config.plugin_query_modes.clone(),
            plugin_query_mode,
        }
    }

    /// Engine using the recall family selected in `config`.
    pub fn from_config(config: &EngineConfig, plugins: Vec<Plugin>) -> Result<Self> {
        Ok(Self::new(recaller_for(config.recall, plugins)?, config))
    }

    fn is_plugin_mode(&self, mode: &str) -> bool {
        self.plugin_query_modes.iter().any(|m| m == mode)
    }

    /// The plugin's own type when it is a registered mode, else the default mode.
    fn query_mode_for(&self, plugin: &Plugin) -> String {
        if self.is_plugin_mode(&plugin.plugin_type) {
            plugin.plugin_type.clone()
        } else {
            debug!(
                plugin = plugin.id,
                plugin_type = %plugin.plugin_type,
                "unregistered plugin type, using the default plugin mode"
            );
            self.plugin_query_mode.clone()
        }
    }

    /// True when an existing plugin-mode candidate already scores at least the
    /// query length, in which case recall is skipped.
    pub fn should_skip(&self, ctx: &QueryContext) -> bool {
        let threshold = ctx.query_len() as f64;
        ctx.candidates
            .iter()
            .any(|c| c.score >= threshold && self.is_plugin_mode(&c.query_mode))
    }

    /// Run recall for `ctx`, appending any plugin candidates to
    /// `ctx.candidates`. Returns how many were added.
    pub fn parse(&self, ctx: &mut QueryContext) -> usize {
        if self.should_skip(ctx) {
            debug!("plugin recall skipped, a dominant plugin candidate exists");
            return 0;
        }
        if !self.recaller.check_pre_condition(ctx) {
            return 0;
        }
        let Some(recalled) = self.recaller.recall_plugin(ctx) else {
            return 0;
        };
        let mut built = self.build_candidates(ctx, &recalled);
        fill_sql_fields(ctx, &mut built);
        info!(
            plugin = recalled.plugin.id,
            candidates = built.len(),
            score = recalled.score,
            "plugin recalled"
        );
        let added = built.len();
        ctx.candidates.extend(built);
        added
    }

    /// One candidate per eligible model, or a single unbound candidate.
    pub fn build_candidates(
        &self,
        ctx: &QueryContext,
        recalled: &PluginRecallResult,
    ) -> Vec<SemanticParseCandidate> {
        let model_ids: Vec<i64> =
            if recalled.plugin.contains_all_model || recalled.model_ids.is_empty() {
                vec![ANY_MODEL]
            } else {
                recalled.model_ids.iter().copied().collect()
            };
        model_ids
            .into_iter()
            .map(|model_id| self.candidate_for(ctx, recalled, model_id))
            .collect()
    }

    fn candidate_for(
        &self,
        ctx: &QueryContext,
        recalled: &PluginRecallResult,
        model_id: i64,
    ) -> SemanticParseCandidate {
        let element_matches = ctx.matches_for(model_id).to_vec();
        let dimension_filters = element_filters(&element_matches);
        let properties = BTreeMap::from([
            (
                PLUGIN_ID_PROPERTY.to_string(),
                Value::from(recalled.plugin.id),
            ),
            (
                PLUGIN_NAME_PROPERTY.to_string(),
                Value::from(recalled.plugin.name.as_str()),
            ),
            (
                PLUGIN_TYPE_PROPERTY.to_string(),
                Value::from(PLUGIN_TYPE_MARKER),
            ),
        ]);
        SemanticParseCandidate {
            model_id: Some(model_id),
            query_mode: self.query_mode_for(&recalled.plugin),
            element_matches,
            score: recalled.score,
            sql_info: SqlInfo::default(),
            properties,
            dimension_filters,
            date_info: None,
        }
    }
}

/// EQUALS filters for every VALUE or ID match.
fn element_filters(matches: &[SchemaElementMatch]) -> Vec<QueryFilter> {
    matches
        .iter()
        .filter(|m| m.element.element_type.is_filterable())
        .map(|m| {
            QueryFilter::equals(
                &m.element.biz_name,
                &m.element.name,
                Value::from(m.word.as_str()),
                Some(m.element.id),
            )
        })
        .collect()
}

/// Copy WHERE and SELECT fields of the first prior SQL candidate onto `targets`.
///
/// Field tokens resolve against that candidate's element matches; tokens that
/// match nothing are dropped. Any missing prerequisite leaves `targets` as-is.
pub fn fill_sql_fields(ctx: &QueryContext, targets: &mut [SemanticParseCandidate]) {
    let Some(source) = ctx.candidates.iter().find(|c| {
        !c.properties.contains_key(PLUGIN_ID_PROPERTY)
            && c.has_sql()
            && !c.element_matches.is_empty()
    }) else {
        return;
    };
    let statement = match parse_select(&source.sql_info.raw_sql) {
        Ok(statement) => statement,
        Err(e) => {
            debug!(error = %e, "prior candidate SQL unusable for field resolution");
            return;
        }
    };

    let mut filter_fields = BTreeMap::new();
    for expression in where_expressions(&statement) {
        if let Some(element) = resolve_field(&source.element_matches, &expression.field, false) {
            filter_fields.insert(
                element.biz_name.clone(),
                format!("{} {}", expression.operator, expression.value),
            );
        }
    }
    let selected: Vec<String> = select_fields(&statement)
        .iter()
        .filter_map(|field| resolve_field(&source.element_matches, field, true))
        .map(|element| element.biz_name.clone())
        .collect();

    for target in targets.iter_mut() {
        target.sql_info.filter_fields = filter_fields.clone();
        target.sql_info.select_fields = selected.clone();
    }
}

/// Element named `field`: display name first, then business name, then alias.
fn resolve_field<'a>(
    matches: &'a [SchemaElementMatch],
    field: &str,
    selectable_only: bool,
) -> Option<&'a SchemaElement> {
    let pool = matches
        .iter()
        .map(|m| &m.element)
        .filter(move |e| !selectable_only || e.element_type.is_selectable());
    pool.clone()
        .find(|e| e.name == field)
        .or_else(|| pool.clone().find(|e| e.biz_name == field))
        .or_else(|| pool.clone().find(|e| e.alias.iter().any(|a| a == field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::recall::KeywordRecaller;
    use crate::schema::SchemaElementType;
    use std::collections::BTreeSet;

    fn element(id: i64, name: &str, biz: &str, alias: &[&str], kind: SchemaElementType) -> SchemaElement {
        SchemaElement {
            id,
            model_id: 1,
            name: name.to_string(),
            biz_name: biz.to_string(),
            alias: alias.iter().map(|s| (*s).to_string()).collect(),
            element_type: kind,
            value_maps: Vec::new(),
        }
    }

    fn matched(element: SchemaElement, word: &str) -> SchemaElementMatch {
        SchemaElementMatch {
            element,
            word: word.to_string(),
            similarity: 1.0,
            detect_word: None,
        }
    }

    fn weather_plugin(models: &[i64], all: bool) -> Plugin {
        Plugin {
            id: 11,
            name: "天气".to_string(),
            plugin_type: "WEB_SERVICE".to_string(),
            model_ids: models.iter().copied().collect(),
            contains_all_model: all,
            keywords: vec!["天气".to_string()],
            patterns: Vec::new(),
            params: Vec::new(),
        }
    }

    fn engine(plugin: Plugin) -> PluginRecallEngine {
        PluginRecallEngine::new(
            Box::new(KeywordRecaller::new(vec![plugin])),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn dominant_plugin_candidate_blocks_recall() {
        let engine = engine(weather_plugin(&[1], false));
        let mut ctx = QueryContext::new("天气");
        ctx.candidates.push(SemanticParseCandidate {
            query_mode: "PLUGIN".to_string(),
            score: 2.0,
            ..SemanticParseCandidate::default()
        });
        assert!(engine.should_skip(&ctx));
        assert_eq!(engine.parse(&mut ctx), 0);
    }

    #[test]
    fn high_scoring_non_plugin_candidate_does_not_block() {
        let engine = engine(weather_plugin(&[1], false));
        let mut ctx = QueryContext::new("天气");
        ctx.candidates.push(SemanticParseCandidate {
            query_mode: "LLM_S2SQL".to_string(),
            score: 10.0,
            ..SemanticParseCandidate::default()
        });
        assert!(!engine.should_skip(&ctx));
        assert_eq!(engine.parse(&mut ctx), 1);
    }

    #[test]
    fn one_candidate_per_model_with_value_filters() {
        let engine = engine(weather_plugin(&[1, 2], false));
        let mut ctx = QueryContext::new("北京天气");
        ctx.element_matches.insert(
            1,
            vec![
                matched(element(5, "城市", "city", &[], SchemaElementType::Value), "北京"),
                matched(element(6, "温度", "temp", &[], SchemaElementType::Metric), "温度"),
            ],
        );
        assert_eq!(engine.parse(&mut ctx), 2);

        let first = &ctx.candidates[0];
        assert_eq!(first.model_id, Some(1));
        assert_eq!(first.query_mode, "WEB_SERVICE");
        assert_eq!(first.score, 2.0);
        assert_eq!(first.properties[PLUGIN_ID_PROPERTY], Value::from(11));
        assert_eq!(first.properties[PLUGIN_NAME_PROPERTY], Value::from("天气"));
        assert_eq!(first.dimension_filters.len(), 1);
        assert_eq!(first.dimension_filters[0].to_sql(), "城市 = '北京'");

        let second = &ctx.candidates[1];
        assert_eq!(second.model_id, Some(2));
        assert!(second.element_matches.is_empty());
    }

    #[test]
    fn model_agnostic_plugins_use_the_sentinel() {
        let engine = engine(weather_plugin(&[1, 2], true));
        let mut ctx = QueryContext::new("天气");
        ctx.model_ids = BTreeSet::from([3]);
        assert_eq!(engine.parse(&mut ctx), 1);
        assert_eq!(ctx.candidates[0].model_id, Some(ANY_MODEL));
    }

    #[test]
    fn unregistered_plugin_types_fall_back_to_the_default_mode() {
        let mut plugin = weather_plugin(&[1], false);
        plugin.plugin_type = "DSL".to_string();
        let engine = engine(plugin);
        let mut ctx = QueryContext::new("天气");
        assert_eq!(engine.parse(&mut ctx), 1);
        assert_eq!(ctx.candidates[0].query_mode, "PLUGIN");
    }

    #[test]
    fn sql_fields_resolve_by_name_then_biz_name_then_alias() {
        let engine = engine(weather_plugin(&[1], false));
        let mut ctx = QueryContext::new("北京天气");
        ctx.candidates.push(SemanticParseCandidate {
            model_id: Some(1),
            query_mode: "LLM_S2SQL".to_string(),
            element_matches: vec![
                matched(element(5, "城市", "city", &["城市名"], SchemaElementType::Dimension), "城市"),
                matched(element(6, "温度", "temp", &[], SchemaElementType::Metric), "温度"),
                matched(element(7, "日期", "dt", &[], SchemaElementType::Value), "今天"),
            ],
            sql_info: SqlInfo {
                raw_sql: "SELECT 城市名, AVG(temp), dt FROM t WHERE 城市 = '北京' AND 未知 = 1 AND dt >= '2024-01-01'"
                    .to_string(),
                ..SqlInfo::default()
            },
            ..SemanticParseCandidate::default()
        });
        assert_eq!(engine.parse(&mut ctx), 1);

        let info = &ctx.candidates[1].sql_info;
        assert_eq!(
            info.filter_fields,
            BTreeMap::from([
                ("city".to_string(), "= 北京".to_string()),
                ("dt".to_string(), ">= 2024-01-01".to_string()),
            ])
        );
        assert_eq!(info.select_fields, vec!["city", "temp"]);
    }

    #[test]
    fn unparseable_prior_sql_is_ignored() {
        let mut ctx = QueryContext::new("q");
        ctx.candidates.push(SemanticParseCandidate {
            element_matches: vec![matched(
                element(5, "城市", "city", &[], SchemaElementType::Dimension),
                "城市",
            )],
            sql_info: SqlInfo {
                raw_sql: "SELEC nonsense".to_string(),
                ..SqlInfo::default()
            },
            ..SemanticParseCandidate::default()
        });
        let mut targets = vec![SemanticParseCandidate::default()];
        fill_sql_fields(&ctx, &mut targets);
        assert!(targets[0].sql_info.filter_fields.is_empty());
        assert!(targets[0].sql_info.select_fields.is_empty());
    }
}
