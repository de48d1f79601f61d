use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_SEARCH_SIZE;
use crate::dictionary::nature::{self, NatureTag, WordKind};
use crate::dictionary::trie::Trie;
use crate::error::Result;

/// Separator used in stored keys in place of a space.
pub const WORD_SEPARATOR: char = '#';

/// One schema term to be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Surface text of the term.
    pub term: String,
    /// Owning tenant. `None` or `0` means the global dictionary.
    #[serde(default)]
    pub tenant_id: Option<i64>,
    /// Word-class tags, e.g. `_1_12_dimension`.
    pub natures: Vec<String>,
}

/// On-disk dictionary layout: forward entries plus suffix variants.
///
/// Suffix entries are written in forward reading order; the builder reverses
/// them before insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictionaryFile {
    /// Forward entries, global or tenant-scoped.
    #[serde(default)]
    pub entries: Vec<DictionaryEntry>,
    /// Terms indexed by their tail for suffix matching.
    #[serde(default)]
    pub suffixes: Vec<DictionaryEntry>,
}

/// A dictionary hit returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchResult {
    /// Matched term with separators restored.
    pub surface_form: String,
    /// Tags of the matched term.
    pub natures: Vec<String>,
    /// The text window that was searched.
    pub originating_segment: String,
}

/// Restricts lookups to terms tagged with one of the listed models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModelScope {
    /// No restriction.
    #[default]
    All,
    /// Only terms carrying a tag for one of these models.
    Models(BTreeSet<i64>),
}

impl ModelScope {
    fn accepts(&self, natures: &[String]) -> bool {
        match self {
            ModelScope::All => true,
            ModelScope::Models(ids) => nature::belongs_to_any(natures, ids),
        }
    }
}

/// Where a tenant id routes an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TenantScope {
    Global,
    Tenant(i64),
    Rejected(i64),
}

impl From<Option<i64>> for TenantScope {
    fn from(value: Option<i64>) -> Self {
        match value {
            None | Some(0) => TenantScope::Global,
            Some(id) if id > 0 => TenantScope::Tenant(id),
            Some(id) => TenantScope::Rejected(id),
        }
    }
}

/// Normalize a term into its stored key: lower-cased, spaces as `#`.
pub fn normalize_key(term: &str) -> String {
    term.to_lowercase().replace(' ', &WORD_SEPARATOR.to_string())
}

/// Character-reverse a term.
pub fn reverse_term(term: &str) -> String {
    term.chars().rev().collect()
}

fn restore_separators(key: &str) -> String {
    key.replace(WORD_SEPARATOR, " ")
}

/// One immutable generation of every trie.
///
/// The tenant map is the only part touched by readers: an unseen tenant gets
/// an empty trie on first lookup.
#[derive(Debug, Clone, Default)]
pub struct DictionarySnapshot {
    forward: Trie,
    suffix: Trie,
    tenants: DashMap<i64, Trie>,
}

impl DictionarySnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, term: &str, tenant_id: Option<i64>, natures: &[String]) {
        let key = normalize_key(term);
        match TenantScope::from(tenant_id) {
            TenantScope::Global => self.forward.insert(&key, natures),
            TenantScope::Tenant(id) => self.tenants.entry(id).or_default().insert(&key, natures),
            TenantScope::Rejected(id) => {
                warn!(term, tenant_id = id, "dropping dictionary entry with invalid tenant id");
            }
        }
    }

    fn insert_suffix(&mut self, reversed_key: &str, natures: &[String]) {
        self.suffix.insert(&normalize_key(reversed_key), natures);
    }

    fn remove(&mut self, term: &str, retained_natures: &[String]) {
        let key = normalize_key(term);
        let removed = self.forward.remove(&key);
        if !retained_natures.is_empty() {
            self.forward.insert(&key, retained_natures);
        }
        if removed
            .as_deref()
            .is_some_and(nature::is_metric_or_dimension)
        {
            self.suffix.remove(&reverse_term(&key));
        }
    }

    /// Number of keys in the global forward trie.
    pub fn global_len(&self) -> usize {
        self.forward.len()
    }

    /// Number of keys in the suffix trie.
    pub fn suffix_len(&self) -> usize {
        self.suffix.len()
    }

    /// Whether a trie exists for `tenant_id`, populated or not.
    pub fn has_tenant(&self, tenant_id: i64) -> bool {
        self.tenants.contains_key(&tenant_id)
    }

    fn search_tenant(
        &self,
        tenant_id: i64,
        key: &str,
        limit: usize,
        scope: &ModelScope,
    ) -> Vec<(String, Vec<String>)> {
        // An unseen tenant is registered with an empty trie and searched in the same call,
        // so its first lookup always misses.
        let trie = self.tenants.entry(tenant_id).or_default().downgrade();
        trie.prefix_search(key, limit, |natures| scope.accepts(natures))
    }
}

/// Builds a snapshot off to the side so it can be published in one swap.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    snapshot: DictionarySnapshot,
    suffixes: BTreeMap<String, Vec<String>>,
}

impl DictionaryBuilder {
    /// Start from an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a forward entry.
    pub fn add(&mut self, entry: &DictionaryEntry) -> &mut Self {
        self.snapshot
            .insert(&entry.term, entry.tenant_id, &entry.natures);
        self
    }

    /// Add a suffix variant given in forward reading order. Repeated terms
    /// have their tags merged before insertion.
    pub fn add_suffix(&mut self, entry: &DictionaryEntry) -> &mut Self {
        let tags = self.suffixes.entry(reverse_term(&entry.term)).or_default();
        nature::merge_into(tags, &entry.natures);
        self
    }

    /// Add every entry of a dictionary file.
    pub fn add_file(&mut self, file: &DictionaryFile) -> &mut Self {
        for entry in &file.entries {
            self.add(entry);
        }
        for entry in &file.suffixes {
            self.add_suffix(entry);
        }
        self
    }

    /// Finish the snapshot.
    pub fn build(mut self) -> DictionarySnapshot {
        for (reversed, natures) in std::mem::take(&mut self.suffixes) {
            self.snapshot.insert_suffix(&reversed, &natures);
        }
        self.snapshot
    }
}

/// Process-wide dictionary with atomically swapped snapshots.
///
/// Readers clone the current `Arc` and search it without holding the lock.
/// Writers copy the snapshot if readers still hold it, mutate the copy, and
/// publish it under the write lock, so no reader sees a half-built trie.
#[derive(Debug)]
pub struct DictionaryIndex {
    current: RwLock<Arc<DictionarySnapshot>>,
    search_size: usize,
}

impl Default for DictionaryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DictionaryIndex {
    /// Empty index with the default global result cap.
    pub fn new() -> Self {
        Self::with_search_size(DEFAULT_SEARCH_SIZE)
    }

    /// Empty index with a custom global result cap.
    pub fn with_search_size(search_size: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(DictionarySnapshot::new())),
            search_size,
        }
    }

    /// Index serving an already built snapshot.
    pub fn from_snapshot(snapshot: DictionarySnapshot, search_size: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            search_size,
        }
    }

    /// Parse a dictionary file document and build an index from it.
    pub fn load_from_json(json: &str, search_size: usize) -> Result<Self> {
        let file: DictionaryFile = serde_json::from_str(json)?;
        let mut builder = DictionaryBuilder::new();
        builder.add_file(&file);
        Ok(Self::from_snapshot(builder.build(), search_size))
    }

    /// Read a dictionary file from disk.
    pub fn from_path(path: &Path, search_size: usize) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::load_from_json(&raw, search_size)
    }

    /// The snapshot currently served to readers.
    pub fn snapshot(&self) -> Arc<DictionarySnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the served snapshot wholesale.
    pub fn publish(&self, snapshot: DictionarySnapshot) {
        info!(
            global = snapshot.global_len(),
            suffix = snapshot.suffix_len(),
            tenants = snapshot.tenants.len(),
            "publishing dictionary snapshot"
        );
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }

    /// Build a snapshot with `builder` and publish it.
    pub fn reload(&self, builder: DictionaryBuilder) {
        self.publish(builder.build());
    }

    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut DictionarySnapshot),
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        mutate(Arc::make_mut(&mut guard));
    }

    /// Add or merge a forward entry.
    pub fn insert(&self, term: &str, tenant_id: Option<i64>, natures: &[String]) {
        self.update(|snapshot| snapshot.insert(term, tenant_id, natures));
    }

    /// Add or merge a suffix entry under its already reversed key.
    pub fn insert_suffix(&self, reversed_key: &str, natures: &[String]) {
        self.update(|snapshot| snapshot.insert_suffix(reversed_key, natures));
    }

    /// Delete a global term, optionally re-adding it with `retained_natures`.
    ///
    /// Metric and dimension terms are also dropped from the suffix trie.
    pub fn remove(&self, term: &str, retained_natures: &[String]) {
        self.update(|snapshot| snapshot.remove(term, retained_natures));
    }

    /// Swap in empty global, suffix, and tenant tries.
    pub fn clear(&self) {
        info!("clearing all dictionary tries");
        self.publish(DictionarySnapshot::new());
    }

    /// Forward lookup: global first, then the tenant's trie on a global miss.
    pub fn lookup_prefix(&self, tenant_id: i64, key: &str, limit: usize) -> Vec<MatchResult> {
        self.lookup_prefix_in(tenant_id, key, limit, &ModelScope::All)
    }

    /// [`Self::lookup_prefix`] restricted to `scope`.
    pub fn lookup_prefix_in(
        &self,
        tenant_id: i64,
        key: &str,
        limit: usize,
        scope: &ModelScope,
    ) -> Vec<MatchResult> {
        let snapshot = self.snapshot();
        let normalized = normalize_key(key);

        let mut hits = snapshot
            .forward
            .prefix_search(&normalized, limit, |natures| scope.accepts(natures));
        if hits.is_empty() && tenant_id > 0 {
            debug!(tenant_id, key, "global miss, searching tenant dictionary");
            hits = snapshot.search_tenant(tenant_id, &normalized, limit, scope);
        }

        let results = hits
            .into_iter()
            .map(|(stored, natures)| MatchResult {
                surface_form: restore_separators(&stored),
                natures,
                originating_segment: key.to_string(),
            })
            .collect();
        self.rank(results)
    }

    /// Suffix lookup: finds terms ending with `key`.
    ///
    /// `key` is given in reading order and reversed here; surface forms are
    /// re-reversed and suffix markers stripped from the tags. Suffix
    /// variants are global only, so `tenant_id` does not route this search.
    pub fn lookup_suffix(&self, tenant_id: i64, key: &str, limit: usize) -> Vec<MatchResult> {
        self.lookup_suffix_in(tenant_id, key, limit, &ModelScope::All)
    }

    /// [`Self::lookup_suffix`] restricted to `scope`.
    ///
    /// The tenant argument mirrors [`Self::lookup_prefix_in`]. Suffix variants
    /// are stored once for every tenant, so it never narrows the search.
    pub fn lookup_suffix_in(
        &self,
        _tenant_id: i64,
        key: &str,
        limit: usize,
        scope: &ModelScope,
    ) -> Vec<MatchResult> {
        let snapshot = self.snapshot();
        let reversed = normalize_key(&reverse_term(key));

        let results = snapshot
            .suffix
            .prefix_search(&reversed, limit, |natures| scope.accepts(natures))
            .into_iter()
            .map(|(stored, natures)| MatchResult {
                surface_form: reverse_term(&restore_separators(&stored)),
                natures: natures
                    .iter()
                    .map(|tag| nature::strip_suffix_marker(tag))
                    .collect(),
                originating_segment: key.to_string(),
            })
            .collect();
        self.rank(results)
    }

    /// Longest surface form first, capped at the global search size.
    fn rank(&self, mut results: Vec<MatchResult>) -> Vec<MatchResult> {
        results.sort_by_key(|r| std::cmp::Reverse(r.surface_form.chars().count()));
        results.truncate(self.search_size);
        results
    }

    /// Every global value term of dimension `element_id` in `model_id`.
    pub fn dimension_values(&self, model_id: i64, element_id: i64) -> Vec<String> {
        self.snapshot()
            .forward
            .entries()
            .into_iter()
            .filter(|(_, natures)| {
                natures.iter().any(|tag| {
                    let parsed = NatureTag::parse(tag);
                    parsed.kind == WordKind::Value
                        && parsed.model_id == Some(model_id)
                        && parsed.element_id == Some(element_id)
                })
            })
            .map(|(key, _)| restore_separators(&key))
            .collect()
    }
}
