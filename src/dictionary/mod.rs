/// Multi-tenant index over forward, tenant, and suffix tries with snapshot publishing.
pub mod index;
/// Nature-tag conventions: model/element ids, word kinds, suffix and entity markers.
pub mod nature;
/// Character trie with bounded breadth-first prefix search.
pub mod trie;

pub use index::{
    DictionaryBuilder, DictionaryEntry, DictionaryFile, DictionaryIndex, DictionarySnapshot,
    MatchResult, ModelScope,
};
