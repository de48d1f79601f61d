use std::collections::{BTreeMap, VecDeque};

use crate::dictionary::nature;

/// Character trie mapping normalized keys to nature-tag lists.
///
/// Children are kept in a `BTreeMap`, so every traversal visits siblings in
/// character order.
#[derive(Debug, Clone, Default)]
pub struct Trie {
    root: Node,
    len: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<char, Node>,
    natures: Option<Vec<String>>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.children.is_empty() && self.natures.is_none()
    }
}

impl Trie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terminal keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no key is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `key`, unioning `natures` into any tags already stored for it.
    pub fn insert(&mut self, key: &str, natures: &[String]) {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        match &mut node.natures {
            Some(existing) => nature::merge_into(existing, natures),
            None => {
                let mut fresh = Vec::with_capacity(natures.len());
                nature::merge_into(&mut fresh, natures);
                node.natures = Some(fresh);
                self.len += 1;
            }
        }
    }

    /// Remove `key` and return its tags. Branches left empty are pruned.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let chars: Vec<char> = key.chars().collect();
        let removed = remove_from(&mut self.root, &chars);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Exact lookup.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.descend(key)?.natures.as_deref()
    }

    fn descend(&self, key: &str) -> Option<&Node> {
        let mut node = &self.root;
        for ch in key.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    /// Collect up to `limit` terminal entries at or below `prefix`.
    ///
    /// Returns nothing unless every character of `prefix` has a matching
    /// child. The subtree is walked breadth-first so shorter keys are
    /// collected before longer ones; `accept` decides which terminals count
    /// toward the limit. The result is ordered by key.
    pub fn prefix_search<F>(&self, prefix: &str, limit: usize, accept: F) -> Vec<(String, Vec<String>)>
    where
        F: Fn(&[String]) -> bool,
    {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }
        let Some(start) = self.descend(prefix) else {
            return found;
        };

        let mut queue: VecDeque<(String, &Node)> = VecDeque::new();
        queue.push_back((prefix.to_string(), start));
        while let Some((key, node)) = queue.pop_front() {
            if found.len() >= limit {
                break;
            }
            if let Some(natures) = &node.natures {
                if accept(natures) {
                    found.push((key.clone(), natures.clone()));
                }
            }
            for (ch, child) in &node.children {
                let mut child_key = key.clone();
                child_key.push(*ch);
                queue.push_back((child_key, child));
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    /// Every stored entry in key order.
    pub fn entries(&self) -> Vec<(String, Vec<String>)> {
        let mut out = Vec::with_capacity(self.len);
        collect_entries(&self.root, &mut String::new(), &mut out);
        out
    }
}

fn remove_from(node: &mut Node, chars: &[char]) -> Option<Vec<String>> {
    let Some((first, rest)) = chars.split_first() else {
        return node.natures.take();
    };
    let child = node.children.get_mut(first)?;
    let removed = remove_from(child, rest);
    if removed.is_some() && child.is_empty() {
        node.children.remove(first);
    }
    removed
}

fn collect_entries(node: &Node, key: &mut String, out: &mut Vec<(String, Vec<String>)>) {
    if let Some(natures) = &node.natures {
        out.push((key.clone(), natures.clone()));
    }
    for (ch, child) in &node.children {
        key.push(*ch);
        collect_entries(child, key, out);
        key.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn accept_all(_: &[String]) -> bool {
        true
    }

    #[test]
    fn insert_merges_homographs() {
        let mut trie = Trie::new();
        trie.insert("访问次数", &tags(&["_1_2_metric"]));
        trie.insert("访问次数", &tags(&["_2_8_metric", "_1_2_metric"]));

        assert_eq!(trie.len(), 1);
        assert_eq!(
            trie.get("访问次数"),
            Some(&tags(&["_1_2_metric", "_2_8_metric"])[..])
        );
    }

    #[test]
    fn prefix_search_requires_full_prefix_path() {
        let mut trie = Trie::new();
        trie.insert("abc", &tags(&["_1_1_dimension"]));
        assert!(trie.prefix_search("abd", 10, accept_all).is_empty());
        assert!(trie.prefix_search("abcd", 10, accept_all).is_empty());
        assert_eq!(trie.prefix_search("ab", 10, accept_all).len(), 1);
    }

    #[test]
    fn prefix_search_prefers_shallow_keys_under_limit() {
        let mut trie = Trie::new();
        for key in ["abzz", "ab", "abc", "abd"] {
            trie.insert(key, &tags(&["_1_1_dimension"]));
        }
        let found: Vec<String> = trie
            .prefix_search("ab", 3, accept_all)
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(found, vec!["ab", "abc", "abd"]);
    }

    #[test]
    fn prefix_search_skips_rejected_terminals() {
        let mut trie = Trie::new();
        trie.insert("ab", &tags(&["_9_1_dimension"]));
        trie.insert("abc", &tags(&["_1_1_dimension"]));
        let found = trie.prefix_search("a", 5, |natures| {
            natures.iter().all(|n| n.starts_with("_1_"))
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "abc");
    }

    #[test]
    fn remove_prunes_empty_branches_but_keeps_shared_ones() {
        let mut trie = Trie::new();
        trie.insert("ab", &tags(&["x"]));
        trie.insert("abcd", &tags(&["y"]));

        assert_eq!(trie.remove("abcd"), Some(tags(&["y"])));
        assert_eq!(trie.len(), 1);
        assert!(trie.get("abc").is_none());
        assert_eq!(trie.get("ab"), Some(&tags(&["x"])[..]));
        assert_eq!(trie.remove("abcd"), None);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn entries_are_in_key_order() {
        let mut trie = Trie::new();
        for key in ["b", "a", "ab"] {
            trie.insert(key, &tags(&["t"]));
        }
        let keys: Vec<String> = trie.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "ab", "b"]);
    }
}
