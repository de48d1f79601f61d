/// Request and element filters, and their SQL rendering.
pub mod filter;
/// Parse candidates and the SQL attached to them.
pub mod parse_info;

pub use filter::{FilterOperator, QueryFilter, QueryFilters};
pub use parse_info::{DateInfo, SemanticParseCandidate, SqlInfo};
