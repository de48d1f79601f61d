use thiserror::Error;

/// Errors raised while loading inputs or rewriting SQL.
///
/// Correction passes and recall steps catch these at their own boundary and
/// degrade to "no change"; only loaders hand them back to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// The input could not be parsed as SQL.
    #[error("SQL parse error: {0}")]
    SqlParse(#[from] sqlparser::parser::ParserError),

    /// The SQL parsed, but is not a single plain `SELECT` query.
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// A joined filter string did not parse as a standalone boolean expression.
    #[error("Invalid filter expression `{expression}`: {reason}")]
    InvalidFilterExpression {
        /// The filter text that was rejected.
        expression: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Configuration is present but semantically invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading a dictionary, schema, or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document did not match the expected shape.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
