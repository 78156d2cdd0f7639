//! Static n-gram language model.
//!
//! A backoff 1/2/3-gram table over an interned vocabulary, scoring in
//! log10 space. The decoding state is an opaque fixed-size byte buffer:
//! callers may copy and compare it but never inspect it; typed access
//! happens only through the accessors in this module (the user model
//! stores its last-word handle in a reserved slot of the same buffer).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_PROBABILITY_PENALTY;
use crate::Result;

pub type WordIndex = u32;

/// Marker for lattice nodes whose word has not been indexed yet.
pub const INVALID_WORD_INDEX: WordIndex = u32::MAX;

/// Size of the opaque model state buffer in bytes.
pub const STATE_SIZE: usize = 32;

const CONTEXT_WORD0: usize = 0;
const CONTEXT_WORD1: usize = 4;
const CONTEXT_LEN: usize = 8;
const LAST_WORD_HANDLE: usize = 12;

/// Opaque scoring state. All-zero is the null (empty-context) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    data: [u8; STATE_SIZE],
}

impl Default for State {
    fn default() -> Self {
        State {
            data: [0; STATE_SIZE],
        }
    }
}

impl State {
    fn read_u32(&self, at: usize) -> u32 {
        u32::from_le_bytes([
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ])
    }

    fn write_u32(&mut self, at: usize, v: u32) {
        self.data[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn context(&self) -> ([WordIndex; 2], usize) {
        let len = self.data[CONTEXT_LEN] as usize;
        (
            [self.read_u32(CONTEXT_WORD0), self.read_u32(CONTEXT_WORD1)],
            len.min(2),
        )
    }

    pub(crate) fn set_context(&mut self, words: &[WordIndex]) {
        let len = words.len().min(2);
        self.data[CONTEXT_LEN] = len as u8;
        self.write_u32(CONTEXT_WORD0, words.first().copied().unwrap_or(0));
        self.write_u32(CONTEXT_WORD1, words.get(1).copied().unwrap_or(0));
    }

    pub(crate) fn last_word_handle(&self) -> u32 {
        self.read_u32(LAST_WORD_HANDLE)
    }

    pub(crate) fn set_last_word_handle(&mut self, handle: u32) {
        self.write_u32(LAST_WORD_HANDLE, handle);
    }
}

/// Serialized n-gram data: vocabulary plus log10 probabilities and
/// backoff weights. `<unk>`, `<s>` and `</s>` occupy the first three
/// vocabulary slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NGramModel {
    vocab: Vec<String>,
    /// (log10 p, log10 backoff) per vocabulary slot.
    unigram: Vec<(f32, f32)>,
    bigram: HashMap<(u32, u32), (f32, f32)>,
    trigram: HashMap<(u32, u32, u32), f32>,
    #[serde(skip)]
    index: AHashMap<String, u32>,
}

pub const UNKNOWN_WORD: &str = "<unk>";
pub const BEGIN_SENTENCE_WORD: &str = "<s>";
pub const END_SENTENCE_WORD: &str = "</s>";

impl Default for NGramModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NGramModel {
    pub fn new() -> Self {
        let mut model = NGramModel {
            vocab: Vec::new(),
            unigram: Vec::new(),
            bigram: HashMap::new(),
            trigram: HashMap::new(),
            index: AHashMap::new(),
        };
        let floor = UNKNOWN_PROBABILITY_PENALTY.log10();
        for word in [UNKNOWN_WORD, BEGIN_SENTENCE_WORD, END_SENTENCE_WORD] {
            model.add_word(word, floor);
        }
        model
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .vocab
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
    }

    /// Intern `word` with the given unigram log10 probability. Returns
    /// its index; re-adding updates the probability.
    pub fn add_word(&mut self, word: &str, log_prob: f32) -> u32 {
        if let Some(&idx) = self.index.get(word) {
            self.unigram[idx as usize].0 = log_prob;
            return idx;
        }
        let idx = self.vocab.len() as u32;
        self.vocab.push(word.to_string());
        self.unigram.push((log_prob, 0.0));
        self.index.insert(word.to_string(), idx);
        idx
    }

    pub fn set_unigram_backoff(&mut self, word: &str, backoff: f32) {
        if let Some(&idx) = self.index.get(word) {
            self.unigram[idx as usize].1 = backoff;
        }
    }

    pub fn set_bigram(&mut self, w1: &str, w2: &str, log_prob: f32, backoff: f32) {
        let (Some(&a), Some(&b)) = (self.index.get(w1), self.index.get(w2)) else {
            return;
        };
        self.bigram.insert((a, b), (log_prob, backoff));
    }

    pub fn set_trigram(&mut self, w1: &str, w2: &str, w3: &str, log_prob: f32) {
        let (Some(&a), Some(&b), Some(&c)) =
            (self.index.get(w1), self.index.get(w2), self.index.get(w3))
        else {
            return;
        };
        self.trigram.insert((a, b, c), log_prob);
    }

    pub fn word_index(&self, word: &str) -> u32 {
        self.index.get(word).copied().unwrap_or(0)
    }

    pub fn word(&self, idx: u32) -> &str {
        self.vocab
            .get(idx as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_WORD)
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// log10 P(w | context) with standard backoff.
    fn score_with_context(&self, ctx: &[u32], w: u32) -> f32 {
        match ctx {
            [c0, c1] => {
                if let Some(&p) = self.trigram.get(&(*c0, *c1, w)) {
                    return p;
                }
                let backoff = self.bigram.get(&(*c0, *c1)).map(|v| v.1).unwrap_or(0.0);
                backoff + self.score_with_context(&ctx[1..], w)
            }
            [c0] => {
                if let Some(&(p, _)) = self.bigram.get(&(*c0, w)) {
                    return p;
                }
                let backoff = self
                    .unigram
                    .get(*c0 as usize)
                    .map(|v| v.1)
                    .unwrap_or(0.0);
                backoff + self.score_with_context(&[], w)
            }
            _ => {
                self.unigram
                    .get(w as usize)
                    .map(|v| v.0)
                    .unwrap_or_else(|| self.unigram[0].0)
            }
        }
    }

    /// Longest n-gram order this model knows for the word sequence.
    pub fn max_ngram_length(&self, words: &[&str]) -> usize {
        let ids: Vec<u32> = words.iter().map(|w| self.word_index(w)).collect();
        let mut max = 0;
        for window in ids.windows(3) {
            if self
                .trigram
                .contains_key(&(window[0], window[1], window[2]))
            {
                max = max.max(3);
            }
        }
        for window in ids.windows(2) {
            if self.bigram.contains_key(&(window[0], window[1])) {
                max = max.max(2);
            }
        }
        if max == 0 && !ids.is_empty() {
            max = 1;
        }
        max
    }

    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)
            .map_err(|e| crate::Error::invalid_data(e.to_string()))?;
        Ok(())
    }

    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut model: NGramModel = bincode::deserialize_from(reader)
            .map_err(|e| crate::Error::invalid_data(e.to_string()))?;
        model.rebuild_index();
        Ok(model)
    }
}

/// Common surface of the static model and the user-fused model; this
/// is what the decoder scores against.
pub trait LanguageModelBase {
    fn begin_state(&self) -> State;
    fn null_state(&self) -> State;
    fn begin_sentence(&self) -> WordIndex;
    fn end_sentence(&self) -> WordIndex;
    fn unknown(&self) -> WordIndex;
    fn index(&self, word: &str) -> WordIndex;
    /// log10 probability of `word` following `state`; `out` receives
    /// the successor state.
    fn score(&self, state: &State, word: &str, idx: WordIndex, out: &mut State) -> f32;
    fn is_unknown(&self, idx: WordIndex, word: &str) -> bool;
    fn unknown_penalty(&self) -> f32;

    fn single_word_score(&self, word: &str) -> f32 {
        let mut out = State::default();
        let idx = self.index(word);
        self.score(&self.null_state(), word, idx, &mut out)
    }

    fn single_word_score_from(&self, state: &State, word: &str) -> f32 {
        self.words_score(state, &[word])
    }

    /// Score a word sequence as a sequential fold: the output state of
    /// word `i` is the input state of word `i + 1`. Callers relying on
    /// per-word independence must reset the state themselves.
    fn words_score(&self, state: &State, words: &[&str]) -> f32 {
        let mut total = 0.0;
        let mut current = *state;
        let mut out = State::default();
        for word in words {
            let idx = self.index(word);
            total += self.score(&current, word, idx, &mut out);
            current = out;
        }
        total
    }
}

/// Static language model: shared n-gram data plus the begin/null states
/// and the unknown-word penalty.
#[derive(Debug, Clone)]
pub struct LanguageModel {
    data: Arc<NGramModel>,
    begin_state: State,
    null_state: State,
    unknown: f32,
}

impl LanguageModel {
    pub fn new(data: Arc<NGramModel>) -> Self {
        let mut begin_state = State::default();
        begin_state.set_context(&[data.word_index(BEGIN_SENTENCE_WORD)]);
        LanguageModel {
            data,
            begin_state,
            null_state: State::default(),
            unknown: UNKNOWN_PROBABILITY_PENALTY.log10(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(LanguageModel::new(Arc::new(NGramModel::load_bincode(path)?)))
    }

    pub fn data(&self) -> &Arc<NGramModel> {
        &self.data
    }

    pub fn set_unknown_penalty(&mut self, penalty: f32) {
        self.unknown = penalty;
    }
}

impl LanguageModelBase for LanguageModel {
    fn begin_state(&self) -> State {
        self.begin_state
    }

    fn null_state(&self) -> State {
        self.null_state
    }

    fn begin_sentence(&self) -> WordIndex {
        self.data.word_index(BEGIN_SENTENCE_WORD)
    }

    fn end_sentence(&self) -> WordIndex {
        self.data.word_index(END_SENTENCE_WORD)
    }

    fn unknown(&self) -> WordIndex {
        0
    }

    fn index(&self, word: &str) -> WordIndex {
        self.data.word_index(word)
    }

    fn score(&self, state: &State, _word: &str, idx: WordIndex, out: &mut State) -> f32 {
        let (ctx, len) = state.context();
        let base = self.data.score_with_context(&ctx[..len], idx);
        let next = if len == 0 {
            [idx, 0]
        } else {
            [ctx[len - 1], idx]
        };
        *out = State::default();
        out.set_context(if len == 0 { &next[..1] } else { &next[..2] });
        base + if idx == self.unknown() { self.unknown } else { 0.0 }
    }

    fn is_unknown(&self, idx: WordIndex, _word: &str) -> bool {
        idx == self.unknown()
    }

    fn unknown_penalty(&self) -> f32 {
        self.unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_model() -> NGramModel {
        let mut m = NGramModel::new();
        m.add_word("你好", -2.0);
        m.add_word("世界", -2.5);
        m.set_bigram("你好", "世界", -0.5, 0.0);
        m
    }

    #[test]
    fn reserved_words_come_first() {
        let m = NGramModel::new();
        assert_eq!(m.word_index(UNKNOWN_WORD), 0);
        assert_eq!(m.word_index(BEGIN_SENTENCE_WORD), 1);
        assert_eq!(m.word_index(END_SENTENCE_WORD), 2);
        assert_eq!(m.word_index("没有"), 0);
    }

    #[test]
    fn bigram_beats_backoff() {
        let m = tiny_model();
        let lm = LanguageModel::new(Arc::new(m));
        let mut state = State::default();
        let idx = lm.index("你好");
        let first = lm.score(&lm.null_state(), "你好", idx, &mut state);
        assert!((first - (-2.0)).abs() < 1e-6);

        let mut out = State::default();
        let idx = lm.index("世界");
        let second = lm.score(&state, "世界", idx, &mut out);
        assert!((second - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn unknown_words_are_penalized() {
        let lm = LanguageModel::new(Arc::new(tiny_model()));
        let score = lm.single_word_score("不存在");
        // unigram floor plus the unknown penalty
        assert!(score < UNKNOWN_PROBABILITY_PENALTY.log10());
        assert!(lm.is_unknown(lm.index("不存在"), "不存在"));
        assert!(!lm.is_unknown(lm.index("你好"), "你好"));
    }

    #[test]
    fn words_score_folds_state_forward() {
        let lm = LanguageModel::new(Arc::new(tiny_model()));
        let folded = lm.words_score(&lm.null_state(), &["你好", "世界"]);
        assert!((folded - (-2.0 - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn state_copies_compare_equal() {
        let lm = LanguageModel::new(Arc::new(tiny_model()));
        let a = lm.begin_state();
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, lm.null_state());
    }
}
