//! Pinyin dictionary over named double-array tries.
//!
//! Keys are contiguous `(initial, final)` byte pairs, a separator byte
//! `!`, then the word's UTF-8 text; values are log10 costs. Matching
//! runs a BFS over the segment graph: per node it extends every live
//! trie position by the syllable readings of the incoming segment,
//! counting fuzzy expansions, and reports each word it can complete.
//! Found positions and words are cached per `(dictionary, path)` in
//! the caller's [`PinyinMatchState`].

use std::io::{BufRead, BufReader, Read, Write};
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use tracing::warn;

use libhan_core::datrie::DATrie;
use libhan_core::io;
use libhan_core::{
    Dictionary, Error, MatchCallback, MatchedWord, NodeId, Result, SegmentGraph, SegmentPath,
};

use crate::data;
use crate::encoder::{
    decode_full_pinyin, encode_full_pinyin_with_flags, shuangpin_to_syllables,
    string_to_initial, string_to_syllables_in, MatchedPinyinSyllables, PinyinFinal,
    PinyinFuzzyFlags, PinyinInitial, FIRST_FINAL, LAST_FINAL,
};
use crate::matchstate::{
    lru, word_lru, MatchedPinyinPath, MatchedPinyinTrieNodes, NodeCache, PinyinMatchResult,
    PinyinMatchState, WordCache,
};

const MINIMUM_LONG_WORD_LENGTH: usize = 3;
const INVALID_PINYIN_COST: f32 = -100.0;
const PINYIN_HANZI_SEP: u8 = b'!';

const PINYIN_BINARY_FORMAT_MAGIC: u32 = 0x000f_c613;
const PINYIN_BINARY_FORMAT_VERSION: u32 = 0x1;

fn fuzzy_cost() -> f32 {
    0.5f32.log10()
}

/// Per-dictionary behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinyinDictFlags(u32);

impl PinyinDictFlags {
    pub const NONE: Self = Self(0);
    /// Only report words covering the whole graph.
    pub const FULL_MATCH: Self = Self(1 << 0);
    /// Skip this dictionary entirely.
    pub const DISABLED: Self = Self(1 << 1);

    pub fn test(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Extra lattice data carried by pinyin matches.
#[derive(Debug, Clone, Default)]
pub struct PinyinPayload {
    pub encoded: Vec<u8>,
    pub correction: bool,
}

/// Text or big-endian binary with magic `0x000fc613`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinyinDictFormat {
    Text,
    Binary,
}

pub struct PinyinDictionary {
    tries: Vec<DATrie<f32>>,
    flags: Vec<PinyinDictFlags>,
    generation: u64,
    observers: Vec<Box<dyn FnMut(usize)>>,
}

impl std::fmt::Debug for PinyinDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinyinDictionary")
            .field("dicts", &self.tries.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for PinyinDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl PinyinDictionary {
    pub const SYSTEM_DICT: usize = 0;
    pub const USER_DICT: usize = 1;

    /// A dictionary set with the system and user slots.
    pub fn new() -> Self {
        PinyinDictionary {
            tries: vec![DATrie::new(), DATrie::new()],
            flags: vec![PinyinDictFlags::NONE, PinyinDictFlags::NONE],
            generation: 0,
            observers: Vec::new(),
        }
    }

    pub fn dict_count(&self) -> usize {
        self.tries.len()
    }

    /// Append an extra dictionary slot, returning its index.
    pub fn add_extra_dict(&mut self) -> usize {
        self.tries.push(DATrie::new());
        self.flags.push(PinyinDictFlags::NONE);
        self.tries.len() - 1
    }

    pub fn remove_extra_dict(&mut self, idx: usize) -> Result<()> {
        if idx <= Self::USER_DICT || idx >= self.tries.len() {
            return Err(Error::invalid_argument("dictionary index out of range"));
        }
        self.tries.remove(idx);
        self.flags.remove(idx);
        self.emit_changed(idx);
        Ok(())
    }

    pub fn set_flags(&mut self, idx: usize, flags: PinyinDictFlags) {
        if let Some(slot) = self.flags.get_mut(idx) {
            *slot = flags;
        }
    }

    pub fn dict_flags(&self, idx: usize) -> PinyinDictFlags {
        self.flags.get(idx).copied().unwrap_or_default()
    }

    /// Bumped on every mutation; contexts compare it to invalidate
    /// their match caches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register for mutation notifications with the changed index.
    pub fn connect_dictionary_changed(&mut self, observer: Box<dyn FnMut(usize)>) {
        self.observers.push(observer);
    }

    fn emit_changed(&mut self, idx: usize) {
        self.generation += 1;
        for observer in &mut self.observers {
            observer(idx);
        }
    }

    pub fn load(&mut self, idx: usize, reader: &mut impl Read, format: PinyinDictFormat) -> Result<()> {
        if idx >= self.tries.len() {
            return Err(Error::invalid_argument("dictionary index out of range"));
        }
        let trie = match format {
            PinyinDictFormat::Text => Self::load_text(reader)?,
            PinyinDictFormat::Binary => Self::load_binary(reader)?,
        };
        self.tries[idx] = trie;
        self.emit_changed(idx);
        Ok(())
    }

    fn load_text(reader: &mut impl Read) -> Result<DATrie<f32>> {
        let mut trie = DATrie::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let mut tokens = line.split_ascii_whitespace();
            let (Some(hanzi), Some(pinyin)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            let prob: f32 = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0.0);
            match encode_full_pinyin_with_flags(pinyin, PinyinFuzzyFlags::VE_UE) {
                Ok(mut key) => {
                    key.push(PINYIN_HANZI_SEP);
                    key.extend_from_slice(hanzi.as_bytes());
                    trie.set(&key, prob);
                }
                Err(_) => {
                    warn!(line = %line, "failed to parse line, skipping");
                }
            }
        }
        Ok(trie)
    }

    fn load_binary(reader: &mut impl Read) -> Result<DATrie<f32>> {
        let magic = io::read_u32(reader)?;
        if magic != PINYIN_BINARY_FORMAT_MAGIC {
            return Err(Error::invalid_data("invalid pinyin dictionary magic"));
        }
        let version = io::read_u32(reader)?;
        if version != PINYIN_BINARY_FORMAT_VERSION {
            return Err(Error::invalid_data("invalid pinyin dictionary version"));
        }
        DATrie::load(reader)
    }

    pub fn save(&mut self, idx: usize, writer: &mut impl Write, format: PinyinDictFormat) -> Result<()> {
        if idx >= self.tries.len() {
            return Err(Error::invalid_argument("dictionary index out of range"));
        }
        match format {
            PinyinDictFormat::Text => self.save_text(idx, writer),
            PinyinDictFormat::Binary => {
                io::write_u32(writer, PINYIN_BINARY_FORMAT_MAGIC)?;
                io::write_u32(writer, PINYIN_BINARY_FORMAT_VERSION)?;
                self.tries[idx].save(writer)
            }
        }
    }

    fn save_text(&self, idx: usize, writer: &mut impl Write) -> Result<()> {
        let trie = &self.tries[idx];
        let mut failure = None;
        trie.foreach(|value, len, pos| {
            let entry = trie.suffix(len, pos);
            let Some(sep) = entry.iter().position(|&b| b == PINYIN_HANZI_SEP) else {
                return true;
            };
            let Ok(full_pinyin) = decode_full_pinyin(&entry[..sep]) else {
                return true;
            };
            let Ok(hanzi) = std::str::from_utf8(&entry[sep + 1..]) else {
                return true;
            };
            if let Err(e) = writeln!(writer, "{} {} {}", hanzi, full_pinyin, value) {
                failure = Some(e);
                return false;
            }
            true
        });
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn encode_entry(full_pinyin: &str, hanzi: &str) -> Result<Vec<u8>> {
        let mut key = encode_full_pinyin_with_flags(full_pinyin, PinyinFuzzyFlags::VE_UE)?;
        key.push(PINYIN_HANZI_SEP);
        key.extend_from_slice(hanzi.as_bytes());
        Ok(key)
    }

    pub fn add_word(
        &mut self,
        idx: usize,
        full_pinyin: &str,
        hanzi: &str,
        cost: f32,
    ) -> Result<()> {
        let key = Self::encode_entry(full_pinyin, hanzi)?;
        self.tries[idx].set(&key, cost);
        self.emit_changed(idx);
        Ok(())
    }

    pub fn remove_word(&mut self, idx: usize, full_pinyin: &str, hanzi: &str) -> Result<bool> {
        let key = Self::encode_entry(full_pinyin, hanzi)?;
        let removed = self.tries[idx].erase(&key);
        if removed {
            self.emit_changed(idx);
        }
        Ok(removed)
    }

    pub fn lookup_word(&self, idx: usize, full_pinyin: &str, hanzi: &str) -> Option<f32> {
        let key = Self::encode_entry(full_pinyin, hanzi).ok()?;
        let v = self.tries[idx].exact_match(&key);
        DATrie::<f32>::is_valid(v).then_some(v)
    }

    pub fn word_count(&self, idx: usize) -> usize {
        self.tries[idx].size()
    }
}

// ---- graph matching ------------------------------------------------

struct MatchRun<'a, 'b> {
    dict: &'a PinyinDictionary,
    graph: &'a SegmentGraph,
    ignore: &'a AHashSet<NodeId>,
    matched_paths: &'a mut AHashMap<NodeId, Vec<MatchedPinyinPath>>,
    node_cache: Option<&'a mut NodeCache>,
    word_cache: Option<&'a mut WordCache>,
    flags: PinyinFuzzyFlags,
    sp_profile: Option<std::sync::Arc<crate::shuangpin::ShuangpinProfile>>,
    correction_profile: Option<std::sync::Arc<crate::correction::PinyinCorrectionProfile>>,
    partial_long_word_limit: usize,
    callback: &'a mut MatchCallback<'b, PinyinPayload>,
    aborted: bool,
}

fn path_to_pinyins(graph: &SegmentGraph, path: &[usize]) -> String {
    let mut out = String::new();
    for pair in path.windows(2) {
        let seg = graph.segment(pair[0], pair[1]);
        if seg.starts_with('\'') {
            continue;
        }
        out.push_str(seg);
        out.push('|');
    }
    out
}

/// The predecessor when it is reached through a pure separator
/// segment; separators always sit in their own segment.
fn prev_is_separator(graph: &SegmentGraph, offset: usize) -> Option<usize> {
    let node = graph.node(offset)?;
    if node.prevs().len() == 1 {
        let prev = node.prevs()[0];
        if graph.segment(prev, offset).starts_with('\'') {
            return Some(prev);
        }
    }
    None
}

fn traverse_one_step(
    trie: &DATrie<f32>,
    path: &MatchedPinyinPath,
    syls: &MatchedPinyinSyllables,
) -> Vec<(u64, usize)> {
    let mut positions = Vec::new();
    for &(pos, fuzzies) in &path.result.positions {
        for (initial, finals) in syls {
            let mut after_initial = pos;
            let result = trie.traverse(&[initial.to_byte()], &mut after_initial);
            if DATrie::<f32>::is_no_path(result) {
                continue;
            }
            let mut try_final = |fin: u8, fuzzy: bool| {
                let mut after_final = after_initial;
                let result = trie.traverse(&[fin], &mut after_final);
                if !DATrie::<f32>::is_no_path(result) {
                    positions.push((after_final, fuzzies + usize::from(fuzzy)));
                }
            };
            if finals.len() > 1 || finals[0].0 != PinyinFinal::Invalid {
                for &(fin, fuzzy) in finals {
                    try_final(fin.to_byte(), fuzzy);
                }
            } else {
                // a bare initial matches every possible final, fuzzily
                for fin in FIRST_FINAL..=LAST_FINAL {
                    try_final(fin, true);
                }
            }
        }
    }
    positions
}

fn match_words_on_trie(
    trie: &DATrie<f32>,
    path: &MatchedPinyinPath,
    match_long_word: bool,
    mut found: impl FnMut(&[u8], &str, f32) -> bool,
) -> bool {
    let syllables = path.size();
    for &(pos, fuzzies) in &path.result.positions {
        let extra_cost = fuzzies as f32 * fuzzy_cost();
        if match_long_word {
            let ok = trie.foreach_from(
                |value, len, fpos| {
                    let entry = trie.suffix(len + syllables * 2, fpos);
                    if let Some(sep) = entry[syllables * 2..]
                        .iter()
                        .position(|&b| b == PINYIN_HANZI_SEP)
                    {
                        let sep = sep + syllables * 2;
                        let encoded = &entry[..sep];
                        let Ok(hanzi) = std::str::from_utf8(&entry[sep + 1..]) else {
                            return true;
                        };
                        let over_length_cost =
                            fuzzy_cost() * (encoded.len() / 2 - syllables) as f32;
                        return found(encoded, hanzi, value + extra_cost + over_length_cost);
                    }
                    true
                },
                pos,
            );
            if !ok {
                return false;
            }
        } else {
            let mut at_sep = pos;
            let result = trie.traverse(&[PINYIN_HANZI_SEP], &mut at_sep);
            if DATrie::<f32>::is_no_path(result) {
                continue;
            }
            let ok = trie.foreach_from(
                |value, len, fpos| {
                    let entry = trie.suffix(len + syllables * 2 + 1, fpos);
                    let encoded = &entry[..syllables * 2];
                    let Ok(hanzi) = std::str::from_utf8(&entry[syllables * 2 + 1..]) else {
                        return true;
                    };
                    found(encoded, hanzi, value + extra_cost)
                },
                at_sep,
            );
            if !ok {
                return false;
            }
        }
    }
    true
}

impl<'a, 'b> MatchRun<'a, 'b> {
    fn syllables_of(&self, pinyin: &str) -> MatchedPinyinSyllables {
        if let Some(profile) = &self.sp_profile {
            return shuangpin_to_syllables(pinyin, profile, self.flags);
        }
        let map = match &self.correction_profile {
            Some(profile) => profile.pinyin_map(),
            None => data::pinyin_map(),
        };
        string_to_syllables_in(map, pinyin, self.flags)
    }

    /// Whether this segment only parses through a corrected spelling.
    fn segment_is_correction(&self, pinyin: &str) -> bool {
        if self.correction_profile.is_none() {
            return false;
        }
        let plain = data::pinyin_map();
        let lowered = pinyin.to_ascii_lowercase();
        if plain.find(&lowered).any(|e| self.flags.test(e.flags)) {
            return false;
        }
        string_to_initial(&lowered) == PinyinInitial::Invalid
    }

    fn path_has_correction(&self, path: &[usize]) -> bool {
        path.windows(2).any(|pair| {
            let seg = self.graph.segment(pair[0], pair[1]);
            !seg.starts_with('\'') && self.segment_is_correction(seg)
        })
    }

    fn add_empty_match(&mut self, offset: usize, matches: &mut Vec<MatchedPinyinPath>) {
        let graph = self.graph;
        if offset != graph.size()
            && !graph.segment(offset, offset + 1).starts_with('\'')
        {
            let mut path = SegmentPath::new();
            if let Some(prev) = prev_is_separator(graph, offset) {
                path.push(prev);
            }
            path.push(offset);
            for i in 0..self.dict.dict_count() {
                let flags = self.dict.flags[i];
                if flags.test(PinyinDictFlags::FULL_MATCH) && offset != 0 {
                    continue;
                }
                if flags.test(PinyinDictFlags::DISABLED) {
                    continue;
                }
                matches.push(MatchedPinyinPath::new(i, 0, path.clone(), flags));
            }
        }
    }

    fn match_words_for_one_path(&mut self, path: &MatchedPinyinPath) -> bool {
        debug_assert!(path.path.len() >= 2);
        let mut matched = false;

        if path.flags.test(PinyinDictFlags::FULL_MATCH)
            && (path.path[0] != 0 || *path.path.last().expect("non-empty path") != self.graph.size())
        {
            return false;
        }

        // minimum length keeps the partial long-word scan bounded
        let match_long_word_enabled = self.partial_long_word_limit > 0
            && MINIMUM_LONG_WORD_LENGTH.max(self.partial_long_word_limit) + 1 <= path.path.len()
            && !path.flags.test(PinyinDictFlags::FULL_MATCH);
        let match_long_word = *path.path.last().expect("non-empty path") == self.graph.size()
            && match_long_word_enabled;

        let trie = &self.dict.tries[path.trie_index()];
        let is_correction = self.path_has_correction(&path.path);
        let syllables = path.size();

        if let Some(word_cache) = self.word_cache.as_deref_mut() {
            let mut emit = |word: &str,
                            encoded: &[u8],
                            cost: f32,
                            callback: &mut MatchCallback<'b, PinyinPayload>|
             -> bool {
                let ok = callback(MatchedWord::new(
                    path.path.clone(),
                    word.to_string(),
                    cost,
                    PinyinPayload {
                        encoded: encoded.to_vec(),
                        correction: is_correction,
                    },
                ));
                if syllables == 1 {
                    matched = true;
                }
                ok
            };
            let cache = word_cache.entry(path.trie_index()).or_insert_with(word_lru);
            let key = path_to_pinyins(self.graph, &path.path);
            let results = match cache.get(&key) {
                Some(results) => results.clone(),
                None => {
                    let mut items = Vec::new();
                    match_words_on_trie(trie, path, match_long_word_enabled, |encoded, hanzi, cost| {
                        items.push(PinyinMatchResult {
                            word: hanzi.to_string(),
                            value: cost,
                            encoded: encoded.to_vec(),
                            correction: is_correction,
                        });
                        true
                    });
                    let results = Rc::new(items);
                    cache.put(key, results.clone());
                    results
                }
            };
            for item in results.iter() {
                if !match_long_word && item.encoded.len() / 2 > syllables {
                    continue;
                }
                if !emit(&item.word, &item.encoded, item.value, &mut *self.callback) {
                    self.aborted = true;
                    break;
                }
            }
        } else {
            let callback = &mut *self.callback;
            let mut aborted = false;
            match_words_on_trie(trie, path, match_long_word, |encoded, hanzi, cost| {
                let ok = callback(MatchedWord::new(
                    path.path.clone(),
                    hanzi.to_string(),
                    cost,
                    PinyinPayload {
                        encoded: encoded.to_vec(),
                        correction: is_correction,
                    },
                ));
                if syllables == 1 {
                    matched = true;
                }
                if !ok {
                    aborted = true;
                }
                ok
            });
            if aborted {
                self.aborted = true;
            }
        }

        matched
    }

    fn find_matches_between(
        &mut self,
        prev: usize,
        current: usize,
        current_matches: &mut Vec<MatchedPinyinPath>,
    ) {
        let graph = self.graph;
        let pinyin = graph.segment(prev, current);
        let prev_id = graph.node_id(prev).expect("prev node exists");
        let current_id = graph.node_id(current).expect("current node exists");

        // Separators extend every existing path without consuming a
        // syllable.
        if pinyin.starts_with('\'') {
            let prev_matches = self
                .matched_paths
                .get(&prev_id)
                .cloned()
                .unwrap_or_default();
            for m in prev_matches {
                let mut path = m.path.clone();
                path.push(current);
                current_matches.push(MatchedPinyinPath {
                    result: m.result.clone(),
                    path,
                    flags: m.flags,
                });
            }
            if current == graph.size() {
                // trailing separator still needs a lattice edge
                if !(self.callback)(MatchedWord::new(
                    vec![prev, current],
                    String::new(),
                    0.0,
                    PinyinPayload::default(),
                )) {
                    self.aborted = true;
                }
            }
            return;
        }

        let syls = self.syllables_of(pinyin);
        let prev_matches = self
            .matched_paths
            .get(&prev_id)
            .cloned()
            .unwrap_or_default();
        let mut new_paths: Vec<MatchedPinyinPath> = Vec::new();
        for m in &prev_matches {
            let mut segment_path = m.path.clone();
            segment_path.push(current);

            let trie = &self.dict.tries[m.trie_index()];
            if let Some(node_cache) = self.node_cache.as_deref_mut() {
                let cache = node_cache.entry(m.trie_index()).or_insert_with(lru);
                let key = path_to_pinyins(graph, &segment_path);
                let result = match cache.get(&key) {
                    Some(r) => r.clone(),
                    None => {
                        let result = Rc::new(MatchedPinyinTrieNodes {
                            trie_index: m.trie_index(),
                            positions: traverse_one_step(trie, m, &syls),
                            size: m.size() + 1,
                        });
                        cache.put(key, result.clone());
                        result
                    }
                };
                debug_assert_eq!(result.size, m.size() + 1);
                if !result.positions.is_empty() {
                    new_paths.push(MatchedPinyinPath {
                        result,
                        path: segment_path,
                        flags: m.flags,
                    });
                }
            } else {
                let positions = traverse_one_step(trie, m, &syls);
                if !positions.is_empty() {
                    new_paths.push(MatchedPinyinPath {
                        result: Rc::new(MatchedPinyinTrieNodes {
                            trie_index: m.trie_index(),
                            positions,
                            size: m.size() + 1,
                        }),
                        path: segment_path,
                        flags: m.flags,
                    });
                }
            }
        }

        if !self.ignore.contains(&current_id) {
            let mut matched = false;
            for path in &new_paths {
                matched |= self.match_words_for_one_path(path);
                if self.aborted {
                    return;
                }
            }
            if !matched {
                // no single-syllable word: emit the raw segment so the
                // lattice stays connected
                let mut path = SegmentPath::new();
                if let Some(prev_prev) = prev_is_separator(graph, prev) {
                    path.push(prev_prev);
                }
                path.push(prev);
                path.push(current);
                if !(self.callback)(MatchedWord::new(
                    path,
                    pinyin.to_string(),
                    INVALID_PINYIN_COST,
                    PinyinPayload::default(),
                )) {
                    self.aborted = true;
                    return;
                }
            }
        }

        current_matches.extend(new_paths);
    }

    fn match_node(&mut self, offset: usize) {
        let Some(id) = self.graph.node_id(offset) else {
            return;
        };
        if self.matched_paths.contains_key(&id) {
            return;
        }
        let mut current_matches = Vec::new();
        self.add_empty_match(offset, &mut current_matches);

        let prevs: Vec<usize> = self
            .graph
            .node(offset)
            .map(|n| n.prevs().to_vec())
            .unwrap_or_default();
        for prev in prevs {
            self.find_matches_between(prev, offset, &mut current_matches);
            if self.aborted {
                return;
            }
        }
        self.matched_paths.insert(id, current_matches);
    }
}

impl Dictionary for PinyinDictionary {
    type Payload = PinyinPayload;
    type Helper = PinyinMatchState;

    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        ignore: &AHashSet<NodeId>,
        helper: Option<&mut PinyinMatchState>,
        callback: &mut MatchCallback<'_, PinyinPayload>,
    ) {
        let mut local_paths = AHashMap::new();
        let mut run = match helper {
            Some(state) => MatchRun {
                dict: self,
                graph,
                ignore,
                matched_paths: &mut state.matched_paths,
                node_cache: Some(&mut state.node_cache),
                word_cache: Some(&mut state.word_cache),
                flags: state.fuzzy_flags,
                sp_profile: state.sp_profile.clone(),
                correction_profile: state.correction_profile.clone(),
                partial_long_word_limit: state.partial_long_word_limit,
                callback,
                aborted: false,
            },
            None => MatchRun {
                dict: self,
                graph,
                ignore,
                matched_paths: &mut local_paths,
                node_cache: None,
                word_cache: None,
                flags: PinyinFuzzyFlags::NONE,
                sp_profile: None,
                correction_profile: None,
                partial_long_word_limit: 0,
                callback,
                aborted: false,
            },
        };

        // Visit in ascending offset order so predecessors are matched
        // before their successors.
        graph.bfs(0, |_, offset| {
            run.match_node(offset);
            !run.aborted
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::parse_user_pinyin;

    fn test_dict() -> PinyinDictionary {
        let mut dict = PinyinDictionary::new();
        let data = "\
你好 ni'hao -2.0
你 ni -3.0
尼 ni -4.0
好 hao -3.5
显示 xian'shi -2.2
现实 xian'shi -2.8
先是 xian'shi -3.2
";
        dict.load(
            PinyinDictionary::SYSTEM_DICT,
            &mut data.as_bytes(),
            PinyinDictFormat::Text,
        )
        .unwrap();
        dict
    }

    fn collect_words(dict: &PinyinDictionary, input: &str, flags: PinyinFuzzyFlags) -> Vec<String> {
        let graph = parse_user_pinyin(input.to_string(), None, flags);
        let ignore = AHashSet::new();
        let mut words = Vec::new();
        let mut callback = |m: MatchedWord<PinyinPayload>| {
            words.push(m.word);
            true
        };
        dict.match_prefix(&graph, &ignore, None, &mut callback);
        words
    }

    #[test]
    fn words_match_along_graph_paths() {
        let dict = test_dict();
        let words = collect_words(&dict, "nihao", PinyinFuzzyFlags::NONE);
        assert!(words.contains(&"你好".to_string()));
        assert!(words.contains(&"你".to_string()));
        assert!(words.contains(&"好".to_string()));
    }

    #[test]
    fn inner_fuzzy_reaches_xianshi_variants() {
        let dict = test_dict();
        let words = collect_words(&dict, "xianshi", PinyinFuzzyFlags::INNER);
        assert!(words.contains(&"显示".to_string()));
        assert!(words.contains(&"现实".to_string()));
        assert!(words.contains(&"先是".to_string()));
    }

    #[test]
    fn match_state_caches_are_reused() {
        let dict = test_dict();
        let graph = parse_user_pinyin("nihao".to_string(), None, PinyinFuzzyFlags::NONE);
        let ignore = AHashSet::new();
        let mut state = PinyinMatchState::new();

        let mut count_first = 0;
        dict.match_prefix(&graph, &ignore, Some(&mut state), &mut |_| {
            count_first += 1;
            true
        });
        assert!(count_first > 0);
        assert!(!state.matched_paths.is_empty());

        // Second run with every node already matched yields nothing new.
        let ignore: AHashSet<NodeId> = state.matched_paths.keys().copied().collect();
        let mut count_second = 0;
        dict.match_prefix(&graph, &ignore, Some(&mut state), &mut |_| {
            count_second += 1;
            true
        });
        assert_eq!(count_second, 0);
    }

    #[test]
    fn callback_false_aborts_match() {
        let dict = test_dict();
        let graph = parse_user_pinyin("nihao".to_string(), None, PinyinFuzzyFlags::NONE);
        let ignore = AHashSet::new();
        let mut calls = 0;
        dict.match_prefix(&graph, &ignore, None, &mut |_| {
            calls += 1;
            false
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn full_match_dictionary_only_covers_whole_input() {
        let mut dict = test_dict();
        dict.add_word(PinyinDictionary::USER_DICT, "ni", "拟", -1.0)
            .unwrap();
        dict.set_flags(
            PinyinDictionary::USER_DICT,
            PinyinDictFlags::FULL_MATCH,
        );
        // whole-graph key still matches
        let words = collect_words(&dict, "ni", PinyinFuzzyFlags::NONE);
        assert!(words.contains(&"拟".to_string()));
        // but a partial span of a longer input does not
        let words = collect_words(&dict, "nihao", PinyinFuzzyFlags::NONE);
        assert!(!words.contains(&"拟".to_string()));

        dict.set_flags(PinyinDictionary::USER_DICT, PinyinDictFlags::DISABLED);
        let words = collect_words(&dict, "ni", PinyinFuzzyFlags::NONE);
        assert!(!words.contains(&"拟".to_string()));
    }

    #[test]
    fn add_remove_lookup_word() {
        let mut dict = PinyinDictionary::new();
        dict.add_word(PinyinDictionary::USER_DICT, "zi'ji", "自己", -1.0)
            .unwrap();
        assert_eq!(
            dict.lookup_word(PinyinDictionary::USER_DICT, "zi'ji", "自己"),
            Some(-1.0)
        );
        assert!(dict
            .remove_word(PinyinDictionary::USER_DICT, "zi'ji", "自己")
            .unwrap());
        assert_eq!(
            dict.lookup_word(PinyinDictionary::USER_DICT, "zi'ji", "自己"),
            None
        );
        assert!(!dict
            .remove_word(PinyinDictionary::USER_DICT, "zi'ji", "自己")
            .unwrap());
    }

    #[test]
    fn binary_roundtrip_preserves_words() {
        let mut dict = test_dict();
        let mut buf = Vec::new();
        dict.save(
            PinyinDictionary::SYSTEM_DICT,
            &mut buf,
            PinyinDictFormat::Binary,
        )
        .unwrap();

        let mut loaded = PinyinDictionary::new();
        loaded
            .load(
                PinyinDictionary::SYSTEM_DICT,
                &mut std::io::Cursor::new(&buf),
                PinyinDictFormat::Binary,
            )
            .unwrap();
        assert_eq!(
            loaded.lookup_word(PinyinDictionary::SYSTEM_DICT, "ni'hao", "你好"),
            Some(-2.0)
        );
    }

    #[test]
    fn bad_magic_is_invalid_data() {
        let mut dict = PinyinDictionary::new();
        let buf = [0u8; 16];
        assert!(matches!(
            dict.load(
                PinyinDictionary::SYSTEM_DICT,
                &mut std::io::Cursor::new(&buf[..]),
                PinyinDictFormat::Binary,
            ),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn generation_bumps_on_mutation() {
        let mut dict = PinyinDictionary::new();
        let g0 = dict.generation();
        dict.add_word(PinyinDictionary::USER_DICT, "ni", "你", 0.0)
            .unwrap();
        assert!(dict.generation() > g0);
    }
}
