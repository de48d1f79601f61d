/// Parameter bindings for the external plugin client.
pub mod bindings;
/// Per-request recall state.
pub mod context;
/// Recall gate, candidate construction, and SQL field resolution.
pub mod engine;
/// Plugin definitions and recall results.
pub mod model;
/// Keyword and pattern recall families behind one trait.
pub mod recall;

pub use bindings::{build_param_bindings, ParamBinding};
pub use context::QueryContext;
pub use engine::PluginRecallEngine;
pub use model::{ParamOption, ParamType, Plugin, PluginRecallResult};
pub use recall::{KeywordRecaller, PatternRecaller, PluginRecaller};
