use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::EngineConfig;
use crate::dictionary::nature;
use crate::dictionary::{DictionaryIndex, MatchResult, ModelScope};
use crate::error::{Error, Result};
use crate::matcher::segment::{segment_at, segment_starts, Segment};

/// Dictionary hits for every segment of one query.
pub type SegmentMatches = HashMap<Segment, Vec<MatchResult>>;

/// Scans a query for dictionary terms at every viable split point.
///
/// Work fans out over a dedicated, bounded rayon pool. Each unit reads the
/// shared dictionary snapshot and writes one distinct map key.
pub struct SegmentMatcher {
    index: Arc<DictionaryIndex>,
    pool: ThreadPool,
    search_size: usize,
}

impl std::fmt::Debug for SegmentMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentMatcher")
            .field("threads", &self.pool.current_num_threads())
            .field("search_size", &self.search_size)
            .finish()
    }
}

impl SegmentMatcher {
    /// Build a matcher over `index` using the pool size and per-lookup limit from `config`.
    pub fn new(index: Arc<DictionaryIndex>, config: &EngineConfig) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("segment-match-{i}"));
        if let Some(threads) = config.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build segment worker pool: {e}")))?;
        Ok(Self {
            index,
            pool,
            search_size: config.segment_search_size,
        })
    }

    /// The dictionary this matcher reads.
    pub fn index(&self) -> &Arc<DictionaryIndex> {
        &self.index
    }

    /// Match every segment of `text`.
    ///
    /// `protected` maps character offsets to the length of tokens that must
    /// not be split. A missing tenant searches the global dictionary only.
    pub fn match_text(
        &self,
        text: &str,
        protected: &BTreeMap<usize, usize>,
        tenant_id: Option<i64>,
    ) -> SegmentMatches {
        self.match_text_in(text, protected, tenant_id, &ModelScope::All)
    }

    /// [`Self::match_text`] restricted to terms of the models in `scope`.
    pub fn match_text_in(
        &self,
        text: &str,
        protected: &BTreeMap<usize, usize>,
        tenant_id: Option<i64>,
        scope: &ModelScope,
    ) -> SegmentMatches {
        let tenant_id = tenant_id.unwrap_or(0);
        let chars: Vec<char> = text.chars().collect();
        let starts = segment_starts(chars.len(), protected);
        let results: DashMap<Segment, Vec<MatchResult>> = DashMap::with_capacity(starts.len());

        self.pool.install(|| {
            starts.par_iter().for_each(|&start| {
                let segment = segment_at(&chars, start);
                if segment.detect_segment.is_empty() {
                    return;
                }
                let hits = self.match_segment(tenant_id, &segment.detect_segment, scope);
                results.insert(segment, hits);
            });
        });

        debug!(
            tenant_id,
            segments = results.len(),
            "matched query segments"
        );
        results.into_iter().collect()
    }

    fn match_segment(&self, tenant_id: i64, detect: &str, scope: &ModelScope) -> Vec<MatchResult> {
        let mut hits = self
            .index
            .lookup_prefix_in(tenant_id, detect, self.search_size, scope);
        hits.extend(
            self.index
                .lookup_suffix_in(tenant_id, detect, self.search_size, scope),
        );
        hits.retain(has_non_entity_nature);
        hits
    }
}

/// Entity names are linked elsewhere; keep only hits with some other nature.
fn has_non_entity_nature(hit: &MatchResult) -> bool {
    hit.natures.iter().any(|tag| !nature::is_entity(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn matcher_with(entries: &[(&str, &[&str])]) -> SegmentMatcher {
        let index = DictionaryIndex::new();
        for (term, natures) in entries {
            index.insert(term, None, &tags(natures));
        }
        let config = EngineConfig {
            worker_threads: Some(2),
            ..EngineConfig::default()
        };
        SegmentMatcher::new(Arc::new(index), &config).expect("pool should build")
    }

    #[test]
    fn every_start_gets_an_entry() {
        let matcher = matcher_with(&[("访问", &["_1_2_metric"])]);
        let matches = matcher.match_text("超音数访问", &BTreeMap::new(), None);
        assert_eq!(matches.len(), 5);

        let key = Segment {
            reg_text: "超音数".to_string(),
            detect_segment: "访问".to_string(),
        };
        let hits = matches.get(&key).expect("segment should be present");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].surface_form, "访问");
    }

    #[test]
    fn entity_only_hits_are_dropped() {
        let matcher = matcher_with(&[
            ("周杰伦", &["_1_5_entity"]),
            ("周杰伦专辑", &["_1_5_entity", "_1_6_dimension"]),
        ]);
        let matches = matcher.match_text("周杰伦", &BTreeMap::new(), None);
        let key = Segment {
            reg_text: String::new(),
            detect_segment: "周杰伦".to_string(),
        };
        let hits = &matches[&key];
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].surface_form, "周杰伦专辑");
    }

    #[test]
    fn protected_offsets_produce_no_segments() {
        let matcher = matcher_with(&[]);
        let protected = BTreeMap::from([(1, 2)]);
        let matches = matcher.match_text("近30天", &protected, Some(0));
        let mut regs: Vec<usize> = matches.keys().map(|s| s.reg_text.chars().count()).collect();
        regs.sort_unstable();
        assert_eq!(regs, vec![0, 1, 3]);
    }

    #[test]
    fn debug_output_reports_pool_size() {
        let config = EngineConfig {
            worker_threads: Some(1),
            ..EngineConfig::default()
        };
        let matcher = SegmentMatcher::new(Arc::new(DictionaryIndex::new()), &config)
            .expect("single-thread pool should build");
        assert!(format!("{matcher:?}").contains("threads: 1"));
    }
}
