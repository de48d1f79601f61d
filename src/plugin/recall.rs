use regex::Regex;
use tracing::debug;

use crate::config::RecallStrategy;
use crate::error::{Error, Result};
use crate::plugin::context::QueryContext;
use crate::plugin::model::{Plugin, PluginRecallResult};

/// One family of plugin triggers.
pub trait PluginRecaller: Send + Sync {
    /// Cheap gate run before [`Self::recall_plugin`].
    fn check_pre_condition(&self, ctx: &QueryContext) -> bool;

    /// Best plugin for the query, if any triggers.
    fn recall_plugin(&self, ctx: &QueryContext) -> Option<PluginRecallResult>;
}

/// Build the recaller selected by `strategy`.
pub fn recaller_for(
    strategy: RecallStrategy,
    plugins: Vec<Plugin>,
) -> Result<Box<dyn PluginRecaller>> {
    Ok(match strategy {
        RecallStrategy::Keyword => Box::new(KeywordRecaller::new(plugins)),
        RecallStrategy::Pattern => Box::new(PatternRecaller::new(plugins)?),
    })
}

/// Picks the eligible plugin with the longest trigger hit; first declared wins ties.
fn best_hit<'a, I>(ctx: &QueryContext, hits: I) -> Option<PluginRecallResult>
where
    I: Iterator<Item = (&'a Plugin, usize)>,
{
    let mut best: Option<(&Plugin, usize, _)> = None;
    for (plugin, length) in hits {
        if length == 0 {
            continue;
        }
        let Some(models) = plugin.eligible_models(&ctx.model_ids) else {
            debug!(plugin = plugin.id, "plugin triggered outside requested models");
            continue;
        };
        if best.as_ref().map_or(true, |(_, len, _)| length > *len) {
            best = Some((plugin, length, models));
        }
    }
    best.map(|(plugin, length, model_ids)| PluginRecallResult {
        plugin: plugin.clone(),
        model_ids,
        distance: ctx.query_len().saturating_sub(length) as f64,
        score: length as f64,
    })
}

/// Recalls plugins whose keywords occur in the query, case-insensitively.
#[derive(Debug, Clone)]
pub struct KeywordRecaller {
    plugins: Vec<Plugin>,
}

impl KeywordRecaller {
    /// Recaller over `plugins`.
    pub fn new(plugins: Vec<Plugin>) -> Self {
        Self { plugins }
    }
}

impl PluginRecaller for KeywordRecaller {
    fn check_pre_condition(&self, ctx: &QueryContext) -> bool {
        !ctx.query_text.trim().is_empty() && self.plugins.iter().any(|p| !p.keywords.is_empty())
    }

    fn recall_plugin(&self, ctx: &QueryContext) -> Option<PluginRecallResult> {
        let text = ctx.query_text.to_lowercase();
        best_hit(
            ctx,
            self.plugins.iter().map(|plugin| {
                let longest = plugin
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty() && text.contains(k.as_str()))
                    .map(|k| k.chars().count())
                    .max()
                    .unwrap_or(0);
                (plugin, longest)
            }),
        )
    }
}

/// Recalls plugins whose regular expressions match the query.
#[derive(Debug, Clone)]
pub struct PatternRecaller {
    plugins: Vec<(Plugin, Vec<Regex>)>,
}

impl PatternRecaller {
    /// Compile every plugin's patterns.
    pub fn new(plugins: Vec<Plugin>) -> Result<Self> {
        let plugins = plugins
            .into_iter()
            .map(|plugin| {
                let compiled = plugin
                    .patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| {
                            Error::Config(format!(
                                "Invalid pattern `{p}` for plugin {}: {e}",
                                plugin.id
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((plugin, compiled))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { plugins })
    }
}

impl PluginRecaller for PatternRecaller {
    fn check_pre_condition(&self, ctx: &QueryContext) -> bool {
        !ctx.query_text.trim().is_empty() && self.plugins.iter().any(|(_, res)| !res.is_empty())
    }

    fn recall_plugin(&self, ctx: &QueryContext) -> Option<PluginRecallResult> {
        best_hit(
            ctx,
            self.plugins.iter().map(|(plugin, patterns)| {
                let longest = patterns
                    .iter()
                    .filter_map(|re| re.find(&ctx.query_text))
                    .map(|m| m.as_str().chars().count())
                    .max()
                    .unwrap_or(0);
                (plugin, longest)
            }),
        )
    }
}
