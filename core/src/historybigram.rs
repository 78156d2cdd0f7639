//! User history model: tiered MRU pools of committed sentences.
//!
//! Three pools sized 128 / 8192 / 65536. New sentences enter pool 0;
//! when a pool overflows, its oldest sentence migrates into the next
//! (lower-weight) pool. Each pool keeps unigram and bigram counts in
//! count-valued tries; pool weights follow a geometric distribution
//! with p = 1 / (1 + alpha) and sum to one before normalizing by pool
//! capacity.

use std::collections::VecDeque;
use std::io::{Read, Write};

use ahash::AHashSet;

use crate::constants::{HISTORY_BIGRAM_ALPHA, UNKNOWN_PROBABILITY_PENALTY};
use crate::datrie::DATrie;
use crate::{io, Error, Result};

const HISTORY_BINARY_FORMAT_MAGIC: u32 = 0x000f_c315;
const HISTORY_BINARY_FORMAT_VERSION: u32 = 2;

const POOL_SIZES: [usize; 3] = [128, 8192, 65536];

/// Count trie that tracks the sum of its values.
#[derive(Debug, Clone, Default)]
struct WeightedTrie {
    trie: DATrie<i32>,
    weighted_size: i32,
}

impl WeightedTrie {
    fn clear(&mut self) {
        self.trie.clear();
        self.weighted_size = 0;
    }

    fn freq(&self, key: &[u8]) -> i32 {
        let v = self.trie.exact_match(key);
        if !DATrie::<i32>::is_valid(v) {
            return 0;
        }
        v
    }

    fn inc_freq(&mut self, key: &[u8], delta: i32) {
        self.trie.update(key, |v| v + delta);
        self.weighted_size += delta;
    }

    fn dec_freq(&mut self, key: &[u8], delta: i32) {
        let v = self.trie.exact_match(key);
        if !DATrie::<i32>::is_valid(v) {
            return;
        }
        if v <= delta {
            self.trie.erase(key);
            self.dec_weighted_size(v);
        } else {
            self.trie.set(key, v - delta);
            self.dec_weighted_size(delta);
        }
    }

    fn dec_weighted_size(&mut self, v: i32) {
        self.weighted_size = (self.weighted_size - v).max(0);
    }

    fn fill_predict(&self, words: &mut AHashSet<String>, prefix: &[u8], max_size: usize) {
        self.trie.foreach_prefix(prefix, |_, len, pos| {
            let bytes = self.trie.suffix(len, pos);
            if let Ok(word) = String::from_utf8(bytes) {
                if word != "<s>" && word != "</s>" {
                    words.insert(word);
                }
            }
            !(max_size > 0 && words.len() >= max_size)
        });
    }
}

#[derive(Debug, Clone)]
struct HistoryBigramPool {
    max_size: usize,
    /// Front is the most recent sentence.
    recent: VecDeque<Vec<String>>,
    unigram: WeightedTrie,
    bigram: WeightedTrie,
}

fn bigram_key(prev: &str, cur: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prev.len() + cur.len() + 1);
    key.extend_from_slice(prev.as_bytes());
    key.push(b'|');
    key.extend_from_slice(cur.as_bytes());
    key
}

impl HistoryBigramPool {
    fn new(max_size: usize) -> Self {
        HistoryBigramPool {
            max_size,
            recent: VecDeque::new(),
            unigram: WeightedTrie::default(),
            bigram: WeightedTrie::default(),
        }
    }

    fn clear(&mut self) {
        self.recent.clear();
        self.unigram.clear();
        self.bigram.clear();
    }

    /// Add a sentence, returning any sentences displaced by overflow
    /// (oldest first).
    fn add(&mut self, sentence: &[String]) -> Vec<Vec<String>> {
        let mut popped = Vec::new();
        if sentence.is_empty() {
            return popped;
        }
        while self.recent.len() >= self.max_size {
            let oldest = self.recent.pop_back().expect("non-empty by loop guard");
            self.remove(&oldest);
            popped.push(oldest);
        }

        let delta = 1;
        for (i, word) in sentence.iter().enumerate() {
            self.unigram.inc_freq(word.as_bytes(), delta);
            if let Some(next) = sentence.get(i + 1) {
                self.bigram.inc_freq(&bigram_key(word, next), delta);
            }
        }
        self.recent.push_front(sentence.to_vec());
        self.unigram.inc_freq(b"<s>", delta);
        self.unigram.inc_freq(b"</s>", delta);
        self.bigram
            .inc_freq(&bigram_key("<s>", &sentence[0]), delta);
        self.bigram
            .inc_freq(&bigram_key(sentence.last().expect("non-empty"), "</s>"), delta);
        popped
    }

    fn remove(&mut self, sentence: &[String]) {
        let delta = 1;
        for (i, word) in sentence.iter().enumerate() {
            self.unigram.dec_freq(word.as_bytes(), delta);
            if let Some(next) = sentence.get(i + 1) {
                self.bigram.dec_freq(&bigram_key(word, next), delta);
            }
        }
        self.bigram
            .dec_freq(&bigram_key("<s>", &sentence[0]), delta);
        self.bigram
            .dec_freq(&bigram_key(sentence.last().expect("non-empty"), "</s>"), delta);
    }

    fn unigram_freq(&self, word: &str) -> f32 {
        self.unigram.freq(word.as_bytes()) as f32
    }

    fn bigram_freq(&self, prev: &str, cur: &str) -> f32 {
        self.bigram.freq(&bigram_key(prev, cur)) as f32
    }

    fn is_unknown(&self, word: &str) -> bool {
        self.unigram_freq(word) == 0.0
    }

    fn forget(&mut self, word: &str) {
        let mut i = 0;
        while i < self.recent.len() {
            if self.recent[i].iter().any(|w| w == word) {
                let sentence = self.recent.remove(i).expect("index is in range");
                self.remove(&sentence);
            } else {
                i += 1;
            }
        }
    }

    fn load(&mut self, reader: &mut impl Read) -> Result<()> {
        self.clear();
        let count = io::read_u32(reader)?;
        for _ in 0..count {
            let size = io::read_u32(reader)?;
            let mut sentence = Vec::with_capacity(size as usize);
            for _ in 0..size {
                sentence.push(io::read_string(reader)?);
            }
            self.add(&sentence);
        }
        Ok(())
    }

    fn save(&self, writer: &mut impl Write) -> Result<()> {
        io::write_u32(writer, self.recent.len() as u32)?;
        // Oldest first, so that loading through add() restores order.
        for sentence in self.recent.iter().rev() {
            io::write_u32(writer, sentence.len() as u32)?;
            for word in sentence {
                io::write_string(writer, word)?;
            }
        }
        Ok(())
    }

    fn dump(&self, writer: &mut impl Write) -> Result<()> {
        for sentence in &self.recent {
            writeln!(writer, "{}", sentence.join(" "))?;
        }
        Ok(())
    }

    fn fill_predict(&self, words: &mut AHashSet<String>, prefix: &[u8], max_size: usize) {
        self.bigram.fill_predict(words, prefix, max_size);
    }
}

#[derive(Debug, Clone)]
pub struct HistoryBigram {
    pools: Vec<HistoryBigramPool>,
    pool_weight: Vec<f32>,
    unknown: f32,
    use_only_unigram: bool,
}

impl Default for HistoryBigram {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBigram {
    pub fn new() -> Self {
        let p = 1.0 / (1.0 + HISTORY_BIGRAM_ALPHA);
        let mut pools = Vec::new();
        let mut pool_weight = Vec::new();
        for (i, &size) in POOL_SIZES.iter().enumerate() {
            pools.push(HistoryBigramPool::new(size));
            let mut portion = 1.0f32;
            if i + 1 != POOL_SIZES.len() {
                portion *= 1.0 - p;
            }
            portion *= p.powi(i as i32);
            pool_weight.push(portion / size as f32);
        }
        HistoryBigram {
            pools,
            pool_weight,
            unknown: UNKNOWN_PROBABILITY_PENALTY.log10(),
            use_only_unigram: false,
        }
    }

    pub fn set_unknown_penalty(&mut self, unknown: f32) {
        self.unknown = unknown;
    }

    pub fn unknown_penalty(&self) -> f32 {
        self.unknown
    }

    pub fn set_use_only_unigram(&mut self, use_only_unigram: bool) {
        self.use_only_unigram = use_only_unigram;
    }

    pub fn use_only_unigram(&self) -> bool {
        self.use_only_unigram
    }

    /// Record a committed sentence; overflow migrates through pools.
    pub fn add(&mut self, sentence: &[String]) {
        let mut popped = self.pools[0].add(sentence);
        for i in 1..self.pools.len() {
            if popped.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for sentence in popped {
                next.extend(self.pools[i].add(&sentence));
            }
            popped = next;
        }
    }

    pub fn unigram_freq(&self, word: &str) -> f32 {
        self.pools
            .iter()
            .zip(&self.pool_weight)
            .map(|(pool, w)| pool.unigram_freq(word) * w)
            .sum()
    }

    pub fn bigram_freq(&self, prev: &str, cur: &str) -> f32 {
        self.pools
            .iter()
            .zip(&self.pool_weight)
            .map(|(pool, w)| pool.bigram_freq(prev, cur) * w)
            .sum()
    }

    fn unigram_size(&self) -> f32 {
        self.pools
            .iter()
            .zip(&self.pool_weight)
            .map(|(pool, w)| pool.max_size as f32 * w)
            .sum()
    }

    pub fn is_unknown(&self, word: &str) -> bool {
        self.pools.iter().all(|pool| pool.is_unknown(word))
    }

    pub fn contains_bigram(&self, prev: &str, cur: &str) -> bool {
        self.bigram_freq(prev, cur) > 0.0
    }

    /// log10 probability of `cur` following `prev` by interpolating the
    /// bigram and unigram relative frequencies; the unknown penalty
    /// when the history knows neither.
    pub fn score(&self, prev: Option<&str>, cur: &str) -> f32 {
        let prev = match prev {
            Some(p) if !p.is_empty() => p,
            _ => "<s>",
        };
        let cur = if cur.is_empty() { "<unk>" } else { cur };

        let uf0 = self.unigram_freq(prev);
        let bf = self.bigram_freq(prev, cur);
        let uf1 = self.unigram_freq(cur);

        let bigram_weight = if self.use_only_unigram { 0.0f32 } else { 0.68f32 };
        // add half the first pool weight to avoid division by zero
        let w0 = self.pool_weight[0];
        let mut pr = 0.0f32;
        pr += bigram_weight * bf / (uf0 + w0 / 2.0);
        pr += (1.0 - bigram_weight) * uf1 / (self.unigram_size() + w0 / 2.0);

        if pr >= 1.0 {
            pr = 1.0;
        }
        if pr == 0.0 {
            return self.unknown;
        }
        pr.log10()
    }

    /// Drop every resident sentence containing `word`.
    pub fn forget(&mut self, word: &str) {
        for pool in &mut self.pools {
            pool.forget(word);
        }
    }

    pub fn clear(&mut self) {
        for pool in &mut self.pools {
            pool.clear();
        }
    }

    /// Collect words the history has seen after the last word of
    /// `sentence` (after `<s>` when empty).
    pub fn fill_predict(
        &self,
        words: &mut AHashSet<String>,
        sentence: &[String],
        max_size: usize,
    ) {
        if max_size > 0 && words.len() >= max_size {
            return;
        }
        let mut lookup = sentence
            .last()
            .map(String::as_str)
            .unwrap_or("<s>")
            .to_string();
        lookup.push('|');
        for pool in &self.pools {
            pool.fill_predict(words, lookup.as_bytes(), max_size);
        }
    }

    pub fn load(&mut self, reader: &mut impl Read) -> Result<()> {
        let magic = io::read_u32(reader)?;
        if magic != HISTORY_BINARY_FORMAT_MAGIC {
            return Err(Error::invalid_data("invalid history magic"));
        }
        let version = io::read_u32(reader)?;
        self.clear();
        match version {
            1 => {
                for pool in self.pools.iter_mut().take(2) {
                    pool.load(reader)?;
                }
            }
            HISTORY_BINARY_FORMAT_VERSION => {
                for pool in self.pools.iter_mut() {
                    pool.load(reader)?;
                }
            }
            _ => return Err(Error::invalid_data("invalid history version")),
        }
        Ok(())
    }

    pub fn save(&self, writer: &mut impl Write) -> Result<()> {
        io::write_u32(writer, HISTORY_BINARY_FORMAT_MAGIC)?;
        io::write_u32(writer, HISTORY_BINARY_FORMAT_VERSION)?;
        for pool in &self.pools {
            pool.save(writer)?;
        }
        Ok(())
    }

    /// Write the resident sentences as plain text, newest first per pool.
    pub fn dump(&self, writer: &mut impl Write) -> Result<()> {
        for pool in &self.pools {
            pool.dump(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn added_sentence_has_positive_unigrams() {
        let mut history = HistoryBigram::new();
        history.add(&sentence(&["你好", "中国"]));
        assert!(history.unigram_freq("你好") > 0.0);
        assert!(history.unigram_freq("中国") > 0.0);
        assert!(history.bigram_freq("你好", "中国") > 0.0);
        assert_eq!(history.unigram_freq("不见"), 0.0);
    }

    #[test]
    fn score_prefers_seen_bigram() {
        let mut history = HistoryBigram::new();
        history.add(&sentence(&["你好", "中国"]));
        history.add(&sentence(&["你好", "世界"]));
        history.add(&sentence(&["你好", "世界"]));
        let seen = history.score(Some("你好"), "世界");
        let rare = history.score(Some("你好"), "中国");
        let unseen = history.score(Some("你好"), "火星");
        assert!(seen > rare);
        assert!(rare > unseen);
        assert_eq!(unseen, history.unknown_penalty());
    }

    #[test]
    fn only_unigram_disables_bigram_part() {
        let mut history = HistoryBigram::new();
        history.add(&sentence(&["你好", "中国"]));
        let with_bigram = history.score(Some("你好"), "中国");
        history.set_use_only_unigram(true);
        let without = history.score(Some("你好"), "中国");
        assert!(with_bigram > without);
    }

    #[test]
    fn overflow_migrates_to_next_pool() {
        let mut history = HistoryBigram::new();
        // Fill pool 0 past capacity; the first sentence must migrate
        // but remain known to the model.
        history.add(&sentence(&["首句"]));
        for i in 0..POOL_SIZES[0] {
            history.add(&sentence(&[&format!("词{}", i)]));
        }
        assert!(history.unigram_freq("首句") > 0.0);
        assert!(!history.is_unknown("首句"));
        // But it weighs less than a sentence still in pool 0.
        assert!(history.unigram_freq("首句") < history.unigram_freq(&format!("词{}", POOL_SIZES[0] - 1)));
    }

    #[test]
    fn forget_removes_containing_sentences() {
        let mut history = HistoryBigram::new();
        history.add(&sentence(&["你好", "中国"]));
        history.add(&sentence(&["世界"]));
        history.forget("你好");
        assert_eq!(history.unigram_freq("你好"), 0.0);
        assert_eq!(history.unigram_freq("中国"), 0.0);
        assert!(history.unigram_freq("世界") > 0.0);
    }

    #[test]
    fn binary_roundtrip() {
        let mut history = HistoryBigram::new();
        history.add(&sentence(&["你好", "中国"]));
        history.add(&sentence(&["各自", "子集"]));
        let mut buf = Vec::new();
        history.save(&mut buf).unwrap();

        let mut loaded = HistoryBigram::new();
        loaded
            .load(&mut std::io::Cursor::new(&buf))
            .unwrap();
        assert_eq!(
            loaded.unigram_freq("你好"),
            history.unigram_freq("你好")
        );
        assert_eq!(
            loaded.bigram_freq("各自", "子集"),
            history.bigram_freq("各自", "子集")
        );
    }

    #[test]
    fn bad_magic_is_invalid_data() {
        let mut buf = Vec::new();
        io::write_u32(&mut buf, 0xdeadbeef).unwrap();
        io::write_u32(&mut buf, 2).unwrap();
        let mut history = HistoryBigram::new();
        assert!(matches!(
            history.load(&mut std::io::Cursor::new(&buf)),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn fill_predict_suggests_followers() {
        let mut history = HistoryBigram::new();
        history.add(&sentence(&["你好", "世界"]));
        let mut words = AHashSet::new();
        history.fill_predict(&mut words, &sentence(&["你好"]), 0);
        assert!(words.contains("世界"));
        assert!(!words.contains("</s>"));
    }
}
