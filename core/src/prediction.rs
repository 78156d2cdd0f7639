//! Follow-word prediction after a commit.
//!
//! Candidate words come from the history bigram pools (and optionally a
//! float trie of model-shipped continuations keyed `prev|next`), then
//! get ranked by their single-word score from the committed state.

use ahash::AHashSet;

use crate::datrie::DATrie;
use crate::historybigram::HistoryBigram;
use crate::model::{LanguageModelBase, State};

#[derive(Debug, Default)]
pub struct Prediction {
    prediction_trie: Option<DATrie<f32>>,
}

impl Prediction {
    pub fn new() -> Self {
        Prediction::default()
    }

    /// Attach a model-shipped continuation trie keyed `prev|next`.
    pub fn set_prediction_trie(&mut self, trie: DATrie<f32>) {
        self.prediction_trie = Some(trie);
    }

    /// Predict follow words for `sentence` already scored into `state`.
    pub fn predict(
        &self,
        model: &dyn LanguageModelBase,
        history: &HistoryBigram,
        state: &State,
        sentence: &[String],
        max_size: usize,
    ) -> Vec<String> {
        // Search more, keep less; scoring trims the tail.
        let search_size = max_size * 2;
        let mut words: AHashSet<String> = AHashSet::new();

        if let Some(trie) = &self.prediction_trie {
            let mut prefix = sentence
                .last()
                .map(String::as_str)
                .unwrap_or("<unk>")
                .to_string();
            prefix.push('|');
            trie.foreach_prefix(prefix.as_bytes(), |_, len, pos| {
                if let Ok(word) = String::from_utf8(trie.suffix(len, pos)) {
                    words.insert(word);
                }
                !(search_size > 0 && words.len() >= search_size)
            });
        }

        history.fill_predict(&mut words, sentence, search_size);

        let mut scored: Vec<(f32, String)> = words
            .into_iter()
            .map(|word| (model.single_word_score_from(state, &word), word))
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });

        let mut result: Vec<String> = scored.into_iter().map(|(_, w)| w).collect();
        result.truncate(max_size);
        result
    }

    /// Convenience: fold `sentence` through the model first.
    pub fn predict_sentence(
        &self,
        model: &dyn LanguageModelBase,
        history: &HistoryBigram,
        sentence: &[String],
        max_size: usize,
    ) -> Vec<String> {
        let mut state = model.null_state();
        let mut out = State::default();
        for word in sentence {
            let idx = model.index(word);
            model.score(&state, word, idx, &mut out);
            state = out;
        }
        self.predict(model, history, &state, sentence, max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LanguageModel, NGramModel};
    use crate::userlanguagemodel::UserLanguageModel;
    use std::sync::Arc;

    #[test]
    fn predicts_history_followers_ranked() {
        let mut data = NGramModel::new();
        data.add_word("你好", -2.0);
        data.add_word("世界", -2.2);
        data.add_word("中国", -3.0);
        let mut ulm = UserLanguageModel::new(LanguageModel::new(Arc::new(data)));
        for _ in 0..3 {
            ulm.history_mut()
                .add(&["你好".to_string(), "世界".to_string()]);
        }
        ulm.history_mut()
            .add(&["你好".to_string(), "中国".to_string()]);

        let prediction = Prediction::new();
        let sentence = vec!["你好".to_string()];
        let result = prediction.predict_sentence(&ulm, ulm.history(), &sentence, 5);
        assert!(!result.is_empty());
        assert_eq!(result[0], "世界");
        assert!(result.contains(&"中国".to_string()));
    }

    #[test]
    fn empty_history_predicts_nothing() {
        let ulm = UserLanguageModel::new(LanguageModel::new(Arc::new(NGramModel::new())));
        let prediction = Prediction::new();
        let result = prediction.predict_sentence(&ulm, ulm.history(), &[], 5);
        assert!(result.is_empty());
    }
}
