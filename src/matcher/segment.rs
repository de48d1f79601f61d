use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One unit of matching work: the text consumed so far and the remainder searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    /// Prefix of the query before the segment start.
    pub reg_text: String,
    /// Suffix of the query starting at the segment start.
    pub detect_segment: String,
}

/// A token recognized upstream that must not be split, e.g. a number or date literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedToken {
    /// Character offset of the token in the query.
    pub offset: usize,
    /// Token length in characters.
    pub length: usize,
}

/// Collapse tokens into an offset→length map. A later token at the same
/// offset replaces an earlier one.
pub fn protected_ranges(tokens: &[ProtectedToken]) -> BTreeMap<usize, usize> {
    tokens
        .iter()
        .map(|token| (token.offset, token.length))
        .collect()
}

/// Offsets where a segment may start.
///
/// Every character offset qualifies except those strictly inside a protected
/// token: reaching a token's start jumps straight past it.
pub fn segment_starts(text_len: usize, protected: &BTreeMap<usize, usize>) -> Vec<usize> {
    let mut starts = Vec::with_capacity(text_len);
    let mut index = 0;
    while index < text_len {
        starts.push(index);
        index += match protected.get(&index) {
            Some(&length) if length > 0 => length,
            _ => 1,
        };
    }
    starts
}

/// Split `chars` at `start` into its segment.
pub fn segment_at(chars: &[char], start: usize) -> Segment {
    Segment {
        reg_text: chars[..start].iter().collect(),
        detect_segment: chars[start..].iter().collect(),
    }
}
