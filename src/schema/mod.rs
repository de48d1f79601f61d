/// Dimensions, metrics, values, and their alias/value maps.
pub mod element;
/// Model-scoped lookups over the loaded schema.
pub mod semantic_schema;

pub use element::{SchemaElement, SchemaElementMatch, SchemaElementType, SchemaValueMap};
pub use semantic_schema::SemanticSchema;
