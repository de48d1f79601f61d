/// SQL expression helpers: column names, literals, conjunct handling.
pub mod expr;
/// WHERE and SELECT field extraction for field resolution and date detection.
pub mod fields;
/// Identifier and function-name normalization (quoted identifiers, qualified names).
pub mod names;
/// Statement and condition parsing in the execution dialect.
pub mod sql_parser;
