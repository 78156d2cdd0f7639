//! Fusion of the static n-gram model with the user history.
//!
//! Scores are combined in probability space through a log-sum-exp of
//! the two log10 scores, weighted by `log10(1 - w)` and `log10(w)`,
//! and floored at the static score so the history can only ever raise
//! a word's probability.
//!
//! The state buffer carries the static model's context plus a handle
//! to the previously scored word; handles are interned word ids owned
//! by this model, read and written only through typed accessors.

use std::cell::RefCell;
use std::io::{Read, Write};

use ahash::AHashMap;

use crate::constants::{MIN_FLOAT_LOG10, USER_LANGUAGE_MODEL_USER_WEIGHT};
use crate::historybigram::HistoryBigram;
use crate::model::{LanguageModel, LanguageModelBase, State, WordIndex};
use crate::Result;

const LOG_10: f32 = std::f32::consts::LN_10;

// log10(exp10(a) + exp10(b))
//   = b + log1p(exp10(a - b)) / ln(10)   for a <= b
fn log1p10exp(x: f32) -> f32 {
    if x < MIN_FLOAT_LOG10 {
        0.0
    } else {
        10f32.powf(x).ln_1p() / LOG_10
    }
}

fn sum_log_prob(a: f32, b: f32) -> f32 {
    if a > b {
        a + log1p10exp(b - a)
    } else {
        b + log1p10exp(a - b)
    }
}

#[derive(Debug, Default)]
struct WordInterner {
    words: Vec<String>,
    ids: AHashMap<String, u32>,
}

impl WordInterner {
    /// Handles are 1-based; 0 means "no previous word".
    fn intern(&mut self, word: &str) -> u32 {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        self.words.push(word.to_string());
        let id = self.words.len() as u32;
        self.ids.insert(word.to_string(), id);
        id
    }

    fn get(&self, handle: u32) -> Option<&str> {
        if handle == 0 {
            return None;
        }
        self.words.get(handle as usize - 1).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct UserLanguageModel {
    lm: LanguageModel,
    history: HistoryBigram,
    weight: f32,
    wa: f32,
    wb: f32,
    use_only_unigram: bool,
    begin_state: State,
    null_state: State,
    words: RefCell<WordInterner>,
}

impl UserLanguageModel {
    pub fn new(lm: LanguageModel) -> Self {
        let weight = USER_LANGUAGE_MODEL_USER_WEIGHT;
        let mut begin_state = lm.begin_state();
        begin_state.set_last_word_handle(0);
        let mut null_state = lm.null_state();
        null_state.set_last_word_handle(0);
        UserLanguageModel {
            lm,
            history: HistoryBigram::new(),
            weight,
            wa: (1.0 - weight).log10(),
            wb: weight.log10(),
            use_only_unigram: false,
            begin_state,
            null_state,
            words: RefCell::new(WordInterner::default()),
        }
    }

    pub fn language_model(&self) -> &LanguageModel {
        &self.lm
    }

    pub fn history(&self) -> &HistoryBigram {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryBigram {
        &mut self.history
    }

    pub fn set_history_weight(&mut self, w: f32) {
        assert!((0.0..=1.0).contains(&w));
        self.weight = w;
        self.wa = (1.0 - w).log10();
        self.wb = w.log10();
    }

    pub fn history_weight(&self) -> f32 {
        self.weight
    }

    pub fn set_use_only_unigram(&mut self, use_only_unigram: bool) {
        self.use_only_unigram = use_only_unigram;
        self.history.set_use_only_unigram(use_only_unigram);
    }

    pub fn use_only_unigram(&self) -> bool {
        self.use_only_unigram
    }

    /// Replace the history with one loaded from `reader`, keeping the
    /// configured unknown penalty.
    pub fn load_history(&mut self, reader: &mut impl Read) -> Result<()> {
        let mut history = HistoryBigram::new();
        history.set_unknown_penalty(self.history.unknown_penalty());
        history.set_use_only_unigram(self.use_only_unigram);
        history.load(reader)?;
        self.history = history;
        Ok(())
    }

    pub fn save_history(&self, writer: &mut impl Write) -> Result<()> {
        self.history.save(writer)
    }

    /// Whether scoring `words` involves any order-2+ knowledge, from
    /// either the history or the static model.
    pub fn contains_non_unigram(&self, words: &[&str]) -> bool {
        if words.len() <= 1 || self.use_only_unigram {
            return false;
        }
        for pair in words.windows(2) {
            if self.history.contains_bigram(pair[0], pair[1]) {
                return true;
            }
        }
        self.lm.data().max_ngram_length(words) > 1
    }
}

impl LanguageModelBase for UserLanguageModel {
    fn begin_state(&self) -> State {
        self.begin_state
    }

    fn null_state(&self) -> State {
        self.null_state
    }

    fn begin_sentence(&self) -> WordIndex {
        self.lm.begin_sentence()
    }

    fn end_sentence(&self) -> WordIndex {
        self.lm.end_sentence()
    }

    fn unknown(&self) -> WordIndex {
        self.lm.unknown()
    }

    fn index(&self, word: &str) -> WordIndex {
        self.lm.index(word)
    }

    fn score(&self, state: &State, word: &str, idx: WordIndex, out: &mut State) -> f32 {
        let score = if self.use_only_unigram {
            self.lm.score(&self.null_state, word, idx, out)
        } else {
            self.lm.score(state, word, idx, out)
        };
        let user_score = {
            let words = self.words.borrow();
            let prev = words.get(state.last_word_handle());
            self.history.score(prev, word)
        };
        let handle = self.words.borrow_mut().intern(word);
        out.set_last_word_handle(handle);
        score.max(sum_log_prob(score + self.wa, user_score + self.wb))
    }

    fn is_unknown(&self, idx: WordIndex, word: &str) -> bool {
        idx == self.unknown() && self.history.is_unknown(word)
    }

    fn unknown_penalty(&self) -> f32 {
        self.lm.unknown_penalty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NGramModel;
    use std::sync::Arc;

    fn model() -> UserLanguageModel {
        let mut data = NGramModel::new();
        data.add_word("你好", -2.0);
        data.add_word("中国", -2.5);
        UserLanguageModel::new(LanguageModel::new(Arc::new(data)))
    }

    #[test]
    fn history_never_lowers_a_score() {
        let ulm = model();
        let base = ulm.lm.single_word_score("你好");
        let fused = ulm.single_word_score("你好");
        assert!(fused >= base);
    }

    #[test]
    fn learned_words_score_higher() {
        let mut ulm = model();
        let before = ulm.single_word_score("中国");
        ulm.history_mut()
            .add(&["中国".to_string()]);
        let after = ulm.single_word_score("中国");
        assert!(after > before);
    }

    #[test]
    fn state_carries_last_word_for_bigram_history() {
        let mut ulm = model();
        ulm.history_mut()
            .add(&["你好".to_string(), "中国".to_string()]);

        let mut after_nihao = State::default();
        let idx = ulm.index("你好");
        ulm.score(&ulm.null_state(), "你好", idx, &mut after_nihao);

        let mut out = State::default();
        let idx = ulm.index("中国");
        let with_context = ulm.score(&after_nihao, "中国", idx, &mut out);
        let without_context = ulm.score(&ulm.null_state(), "中国", idx, &mut out);
        assert!(with_context > without_context);
    }

    #[test]
    fn unknown_requires_both_models() {
        let mut ulm = model();
        assert!(ulm.is_unknown(ulm.index("火星"), "火星"));
        ulm.history_mut().add(&["火星".to_string()]);
        assert!(!ulm.is_unknown(ulm.index("火星"), "火星"));
    }

    #[test]
    fn history_roundtrip_through_model() {
        let mut ulm = model();
        ulm.history_mut()
            .add(&["你好".to_string(), "中国".to_string()]);
        let mut buf = Vec::new();
        ulm.save_history(&mut buf).unwrap();

        let mut other = model();
        other
            .load_history(&mut std::io::Cursor::new(&buf))
            .unwrap();
        assert!(other.history().unigram_freq("你好") > 0.0);
    }
}
