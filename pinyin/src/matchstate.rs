//! Matcher-state caches for the pinyin dictionary.
//!
//! The cache is scoped to one context and one dictionary set. It keys
//! per-node search paths by segment-graph [`NodeId`] and caches trie
//! positions and matched words per dictionary index; the context must
//! clear or partially discard it whenever the graph merges, an option
//! changes or a dictionary mutates.

use std::num::NonZeroUsize;
use std::rc::Rc;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use lru::LruCache;

use libhan_core::{NodeId, SegmentPath};

use crate::correction::PinyinCorrectionProfile;
use crate::dictionary::PinyinDictFlags;
use crate::encoder::PinyinFuzzyFlags;
use crate::shuangpin::ShuangpinProfile;

const MATCH_CACHE_SIZE: usize = 80;

/// Trie positions reached by matching some syllable path, each with
/// the number of fuzzy expansions spent along the way.
#[derive(Debug, Clone)]
pub(crate) struct MatchedPinyinTrieNodes {
    pub(crate) trie_index: usize,
    pub(crate) positions: Vec<(u64, usize)>,
    /// Number of syllables consumed.
    pub(crate) size: usize,
}

/// A search path through the segment graph and its trie match state.
#[derive(Debug, Clone)]
pub(crate) struct MatchedPinyinPath {
    pub(crate) result: Rc<MatchedPinyinTrieNodes>,
    pub(crate) path: SegmentPath,
    pub(crate) flags: PinyinDictFlags,
}

impl MatchedPinyinPath {
    pub(crate) fn new(trie_index: usize, size: usize, path: SegmentPath, flags: PinyinDictFlags) -> Self {
        MatchedPinyinPath {
            result: Rc::new(MatchedPinyinTrieNodes {
                trie_index,
                positions: vec![(0, 0)],
                size,
            }),
            path,
            flags,
        }
    }

    pub(crate) fn trie_index(&self) -> usize {
        self.result.trie_index
    }

    /// Number of syllables, not necessarily `path.len() - 1` because of
    /// separator segments.
    pub(crate) fn size(&self) -> usize {
        self.result.size
    }
}

/// One cached dictionary hit for a syllable path.
#[derive(Debug, Clone)]
pub(crate) struct PinyinMatchResult {
    pub(crate) word: String,
    pub(crate) value: f32,
    pub(crate) encoded: Vec<u8>,
    pub(crate) correction: bool,
}

pub(crate) type NodeCache = AHashMap<usize, LruCache<String, Rc<MatchedPinyinTrieNodes>>>;
pub(crate) type WordCache = AHashMap<usize, LruCache<String, Rc<Vec<PinyinMatchResult>>>>;

pub(crate) fn lru() -> LruCache<String, Rc<MatchedPinyinTrieNodes>> {
    LruCache::new(NonZeroUsize::new(MATCH_CACHE_SIZE).expect("cache size is non-zero"))
}

pub(crate) fn word_lru() -> LruCache<String, Rc<Vec<PinyinMatchResult>>> {
    LruCache::new(NonZeroUsize::new(MATCH_CACHE_SIZE).expect("cache size is non-zero"))
}

/// Incremental matcher state owned by one pinyin context.
#[derive(Default)]
pub struct PinyinMatchState {
    pub(crate) matched_paths: AHashMap<NodeId, Vec<MatchedPinyinPath>>,
    pub(crate) node_cache: NodeCache,
    pub(crate) word_cache: WordCache,
    pub(crate) fuzzy_flags: PinyinFuzzyFlags,
    pub(crate) sp_profile: Option<Arc<ShuangpinProfile>>,
    pub(crate) correction_profile: Option<Arc<PinyinCorrectionProfile>>,
    pub(crate) partial_long_word_limit: usize,
}

impl std::fmt::Debug for PinyinMatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinyinMatchState")
            .field("matched_nodes", &self.matched_paths.len())
            .field("fuzzy_flags", &self.fuzzy_flags)
            .field("partial_long_word_limit", &self.partial_long_word_limit)
            .finish()
    }
}

impl PinyinMatchState {
    pub fn new() -> Self {
        PinyinMatchState::default()
    }

    pub fn clear(&mut self) {
        self.matched_paths.clear();
        self.node_cache.clear();
        self.word_cache.clear();
    }

    /// Invalidate everything touching the given discarded graph nodes.
    /// Merge only ever discards a suffix of the graph, so a path whose
    /// head is discarded always ends at a discarded node as well and
    /// removing the end-node keys covers both.
    pub fn discard_node(&mut self, nodes: &AHashSet<NodeId>) {
        for id in nodes {
            self.matched_paths.remove(id);
        }
    }

    /// Drop cached positions and words of one dictionary.
    pub fn discard_dictionary(&mut self, idx: usize) {
        self.node_cache.remove(&idx);
        self.word_cache.remove(&idx);
    }

    /// Configure the matching options for the next decode.
    pub fn configure(
        &mut self,
        fuzzy_flags: PinyinFuzzyFlags,
        sp_profile: Option<Arc<ShuangpinProfile>>,
        correction_profile: Option<Arc<PinyinCorrectionProfile>>,
        partial_long_word_limit: usize,
    ) {
        self.fuzzy_flags = fuzzy_flags;
        self.sp_profile = sp_profile;
        self.correction_profile = correction_profile;
        self.partial_long_word_limit = partial_long_word_limit;
    }
}
