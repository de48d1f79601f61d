/// Business-name and alias to technical-value substitution.
pub mod alias;
/// Inputs to a correction run besides the SQL.
pub mod context;
/// Default date filter.
pub mod date;
/// `DATEDIFF` to `TIMESTAMPDIFF` normalization.
pub mod date_diff;
/// Request and tenant filter injection.
pub mod filter;
/// Ordered pass runner.
pub mod pipeline;
/// Reference date sources for the default date filter.
pub mod reference_date;

pub use context::CorrectionContext;
pub use pipeline::{CorrectionPass, SqlCorrectionPipeline};
pub use reference_date::{
    parse_reference_date, ReferenceDateSource, RelativeReferenceDate, StaticReferenceDates,
};
