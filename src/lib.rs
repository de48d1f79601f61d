//! Match schema terms in natural-language queries and turn generated SQL into
//! executable, tenant-safe SQL.
#![warn(missing_docs)]

/// Parse candidates, their SQL, and query filters.
pub mod candidate;
/// Engine configuration loaded from JSON.
pub mod config;
/// SQL correction passes and the pipeline that orders them.
pub mod corrector;
/// Multi-tenant trie dictionary with prefix and suffix lookups.
pub mod dictionary;
/// Crate error type.
pub mod error;
/// Concurrent segment matching over the dictionary.
pub mod matcher;
/// SQL parsing and field extraction helpers.
pub mod parser;
/// Plugin recall: triggers, candidate construction, parameter bindings.
pub mod plugin;
/// Schema metadata: dimensions, metrics, values, and value maps.
pub mod schema;

pub use error::{Error, Result};
