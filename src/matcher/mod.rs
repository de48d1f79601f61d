/// Concurrent per-segment dictionary matching over a bounded worker pool.
pub mod search;
/// Segment keys and split-point computation around protected tokens.
pub mod segment;

pub use search::{SegmentMatcher, SegmentMatches};
pub use segment::{protected_ranges, ProtectedToken, Segment};
