//! Stateful table input session.
//!
//! Holds the raw code buffer and committed segments, drives the decoder
//! over the current code's graph and orders candidates per the table's
//! order policy. Auto-select commits the leading candidate when the
//! code reaches the configured length or regex, or when the newest
//! keystroke would leave the code without any match.

use std::cell::RefCell;

use ahash::AHashMap;

use libhan_core::decoder::{decode, DecodeParams};
use libhan_core::{
    LanguageModelBase, Lattice, SegmentGraph, SentenceResult, State, UserLanguageModel, WordIndex,
};

use crate::decoder::{graph_for_code, TableDecoderHook};
use crate::dictionary::{PhraseFlag, TableBasedDictionary, TablePayload};
use crate::options::OrderPolicy;

const TABLE_DEFAULT_MIN_DISTANCE: f32 = 1.0;
const PINYIN_PENALTY: f32 = -0.5;
const TABLE_BEAM_SIZE: usize = 20;
const TABLE_FRAME_SIZE: usize = 10;

fn length_less_than_limit(length: usize, limit: i32) -> bool {
    if limit < 0 {
        false
    } else {
        length < limit as usize
    }
}

#[derive(Debug, Clone)]
struct SelectedCode {
    offset: usize,
    word: String,
    word_idx: WordIndex,
    code: String,
    flag: PhraseFlag,
    commit: bool,
}

type TableSentence = SentenceResult<TablePayload>;

fn sentence_code_length(sentence: &TableSentence) -> usize {
    sentence
        .sentence()
        .first()
        .map(|w| w.payload.code.chars().count())
        .unwrap_or(0)
}

fn sentence_flag(sentence: &TableSentence) -> PhraseFlag {
    if sentence.size() == 1 {
        sentence.sentence()[0].payload.flag
    } else {
        PhraseFlag::Auto
    }
}

pub fn sentence_code(sentence: &TableSentence) -> String {
    if sentence.size() == 1 {
        sentence.sentence()[0].payload.code.clone()
    } else {
        String::new()
    }
}

pub fn is_pinyin(sentence: &TableSentence) -> bool {
    sentence.size() == 1 && sentence_flag(sentence) == PhraseFlag::Pinyin
}

pub fn is_auto(sentence: &TableSentence) -> bool {
    sentence.size() != 1 || sentence_flag(sentence) == PhraseFlag::Auto
}

/// Larger sorts first.
fn sentence_index(sentence: &TableSentence) -> i64 {
    let word = &sentence.sentence()[0];
    if word.payload.flag == PhraseFlag::User {
        word.payload.index as i64
    } else {
        -(word.payload.index as i64)
    }
}

fn candidate_less(
    lhs: &TableSentence,
    rhs: &TableSentence,
    policy: OrderPolicy,
    no_sort_input_length: i32,
    sort_by_code_length: bool,
) -> bool {
    let l_auto = is_auto(lhs);
    let r_auto = is_auto(rhs);
    if l_auto != r_auto {
        return !l_auto;
    }
    if !l_auto {
        let l_pinyin = is_pinyin(lhs);
        let r_pinyin = is_pinyin(rhs);
        let l_length = sentence_code_length(lhs);
        let r_length = sentence_code_length(rhs);
        let l_short = l_length as i32 <= no_sort_input_length && !l_pinyin;
        let r_short = r_length as i32 <= no_sort_input_length && !r_pinyin;
        if l_short != r_short {
            return l_short;
        }
        if sort_by_code_length && l_length != r_length {
            return l_length < r_length;
        }
        if l_short {
            return sentence_index(lhs) > sentence_index(rhs);
        }
        return match policy {
            OrderPolicy::No | OrderPolicy::Fast => sentence_index(lhs) > sentence_index(rhs),
            OrderPolicy::Freq => {
                if lhs.score() != rhs.score() {
                    lhs.score() > rhs.score()
                } else {
                    sentence_index(lhs) > sentence_index(rhs)
                }
            }
        };
    }
    lhs.score() > rhs.score()
}

fn should_replace_candidate(
    old: &TableSentence,
    new: &TableSentence,
    policy: OrderPolicy,
) -> bool {
    if new.size() != old.size() {
        return new.size() < old.size();
    }
    if new.size() == 1 {
        let old_code = sentence_code_length(new);
        let new_code = sentence_code_length(old);
        if old_code != new_code {
            return old_code < new_code;
        }
        let new_flag = sentence_flag(new);
        match policy {
            OrderPolicy::No => {
                if new_flag != PhraseFlag::User {
                    return true;
                }
            }
            OrderPolicy::Freq => {
                if new.score() != old.score() {
                    return new.score() > old.score();
                }
                if new_flag == PhraseFlag::User {
                    return true;
                }
            }
            OrderPolicy::Fast => {
                if new_flag == PhraseFlag::User {
                    return true;
                }
            }
        }
    }
    false
}

pub struct TableContext<'a> {
    dict: &'a RefCell<TableBasedDictionary>,
    model: &'a RefCell<UserLanguageModel>,
    buffer: String,
    selected: Vec<Vec<SelectedCode>>,
    graph: SegmentGraph,
    lattice: Lattice<TablePayload>,
    candidates: Vec<TableSentence>,
    auto_select_index: usize,
}

impl<'a> TableContext<'a> {
    pub fn new(
        dict: &'a RefCell<TableBasedDictionary>,
        model: &'a RefCell<UserLanguageModel>,
    ) -> Self {
        TableContext {
            dict,
            model,
            buffer: String::new(),
            selected: Vec::new(),
            graph: SegmentGraph::new(String::new()),
            lattice: Lattice::new(),
            candidates: Vec::new(),
            auto_select_index: 0,
        }
    }

    pub fn dict(&self) -> &RefCell<TableBasedDictionary> {
        self.dict
    }

    pub fn model(&self) -> &RefCell<UserLanguageModel> {
        self.model
    }

    pub fn user_input(&self) -> &str {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The undecoded code segment.
    pub fn current_code(&self) -> &str {
        self.graph.data()
    }

    pub fn candidates(&self) -> &[TableSentence] {
        &self.candidates
    }

    pub fn is_valid_input(&self, c: char) -> bool {
        let dict = self.dict.borrow();
        dict.is_input_code(c)
            || dict.table_options().matching_key == Some(c)
            || (dict.has_pinyin() && c.is_ascii_lowercase())
    }

    /// Type characters one at a time; stops at the first rejected one.
    pub fn type_str(&mut self, s: &str) -> bool {
        let mut changed = false;
        for c in s.chars() {
            if !self.type_one_char(c) {
                break;
            }
            changed = true;
        }
        changed
    }

    fn type_one_char(&mut self, c: char) -> bool {
        let last_seg = self.buffer[self.selected_length()..].to_string();
        let last_seg_length = last_seg.chars().count();
        self.buffer.push(c);

        let do_auto_select = {
            let dict = self.dict.borrow();
            let options = dict.table_options();
            let mut do_auto_select = options.auto_select;
            if do_auto_select {
                // pinyin entries have no length cap
                let mut auto = !dict.has_pinyin()
                    && !length_less_than_limit(last_seg_length, dict.max_length() as i32);
                auto = auto
                    || (last_seg_length > 0
                        && last_seg.chars().last().map_or(false, |c| dict.is_end_key(c)));
                // the new keystroke would leave the code unmatched
                auto = auto
                    || (Self::check_no_match_auto_select(&dict, &last_seg)
                        && !dict.has_matching_words(&last_seg, &c.to_string()));
                do_auto_select = auto;
            }
            do_auto_select
        };

        if do_auto_select {
            self.auto_select();
            let dict = self.dict.borrow();
            self.graph = graph_for_code(&c.to_string(), &dict);
        } else {
            let mut code = last_seg;
            code.push(c);
            let dict = self.dict.borrow();
            self.graph = graph_for_code(&code, &dict);
        }

        self.update();
        true
    }

    pub fn erase(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let to = to.min(self.buffer.len());
        if from >= to {
            return;
        }
        if from == 0 && to >= self.size() {
            self.reset_matching_state();
            self.selected.clear();
            self.buffer.clear();
        } else {
            self.cancel_till(from);
            self.buffer.replace_range(from..to, "");
            let last_seg = self.buffer[self.selected_length()..].to_string();
            let dict = self.dict.borrow();
            self.graph = graph_for_code(&last_seg, &dict);
        }
        self.update();
    }

    /// Undo the last committed segment.
    pub fn cancel(&mut self) {
        if !self.selected.is_empty() {
            self.selected.pop();
            let last_seg = self.buffer[self.selected_length()..].to_string();
            let dict = self.dict.borrow();
            self.graph = graph_for_code(&last_seg, &dict);
        }
        self.update();
    }

    fn cancel_till(&mut self, pos: usize) -> bool {
        let mut cancelled = false;
        while self.selected_length() > pos {
            self.selected.pop();
            cancelled = true;
        }
        cancelled
    }

    fn reset_matching_state(&mut self) {
        self.lattice.clear();
        self.candidates.clear();
        self.graph = SegmentGraph::new(String::new());
    }

    // ---- selection -------------------------------------------------

    pub fn selected(&self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        self.selected
            .last()
            .and_then(|s| s.last())
            .map_or(false, |item| item.offset == self.buffer.len())
    }

    pub fn selected_length(&self) -> usize {
        self.selected
            .last()
            .and_then(|s| s.last())
            .map_or(0, |item| item.offset)
    }

    pub fn selected_size(&self) -> usize {
        self.selected.len()
    }

    /// Committed text; segments flagged no-commit are skipped.
    pub fn selected_sentence(&self) -> String {
        let mut out = String::new();
        for s in &self.selected {
            for item in s {
                if item.commit {
                    out.push_str(&item.word);
                }
            }
        }
        out
    }

    pub fn selected_segment(&self, idx: usize) -> (String, bool) {
        let mut result = String::new();
        let mut commit = true;
        for item in &self.selected[idx] {
            if !item.commit {
                commit = false;
            }
            result.push_str(&item.word);
        }
        (result, commit)
    }

    pub fn selected_code(&self, idx: usize) -> String {
        let mut result = String::new();
        for item in &self.selected[idx] {
            result.push_str(&item.code);
        }
        result
    }

    pub fn selected_segment_length(&self, idx: usize) -> usize {
        let prev = if idx > 0 {
            self.selected[idx - 1].last().map_or(0, |item| item.offset)
        } else {
            0
        };
        self.selected[idx].last().map_or(prev, |item| item.offset) - prev
    }

    pub fn select(&mut self, idx: usize) {
        let offset = self.selected_length();
        let sentence = self.candidates[idx].clone();
        let mut selection = Vec::new();
        {
            let model = self.model.borrow();
            for word in sentence.sentence() {
                selection.push(SelectedCode {
                    offset: offset + word.to,
                    word: word.word.clone(),
                    word_idx: model.index(&word.word),
                    code: word.payload.code.clone(),
                    flag: word.payload.flag,
                    commit: true,
                });
            }
        }
        self.selected.push(selection);
        self.update();
    }

    pub fn set_auto_select_index(&mut self, index: usize) {
        self.auto_select_index = index;
    }

    /// Commit the leading candidate, or the raw code when nothing
    /// matched.
    pub fn auto_select(&mut self) {
        if self.selected() {
            return;
        }

        if self.can_do_auto_select() {
            let mut select_index = self.auto_select_index;
            self.auto_select_index = 0;
            if select_index >= self.candidates.len() {
                select_index = 0;
            }
            self.select(select_index);
        } else {
            if self.current_code().is_empty() {
                return;
            }
            let offset = self.selected_length();
            let commit = self.dict.borrow().table_options().commit_raw_input;
            let word_idx = self.model.borrow().unknown();
            let code = self.graph.data().to_string();
            self.selected.push(vec![SelectedCode {
                offset: offset + code.len(),
                word: code.clone(),
                word_idx,
                code,
                flag: PhraseFlag::Invalid,
                commit,
            }]);
        }

        self.update();
    }

    fn can_do_auto_select(&self) -> bool {
        !self.candidates.is_empty() && !is_auto(&self.candidates[0])
    }

    fn has_only_one_autoselect_choice(&self) -> bool {
        if !self.can_do_auto_select() || self.candidates.len() != 1 {
            return false;
        }
        if self.candidates[0].size() != 1 {
            return false;
        }
        let dict = self.dict.borrow();
        sentence_code(&self.candidates[0]) == self.current_code()
            && (!dict.table_options().exact_match
                || dict.has_one_matching_word(self.current_code()))
    }

    fn check_auto_select(dict: &TableBasedDictionary, code: &str) -> bool {
        let length = code.chars().count();
        if dict.table_options().auto_select_length != 0
            && !length_less_than_limit(length, dict.table_options().auto_select_length)
        {
            return true;
        }
        dict.auto_select_regex
            .as_ref()
            .map_or(false, |re| re.is_match(code))
    }

    fn check_no_match_auto_select(dict: &TableBasedDictionary, code: &str) -> bool {
        let length = code.chars().count();
        if dict.table_options().no_match_auto_select_length != 0
            && !length_less_than_limit(length, dict.table_options().no_match_auto_select_length)
        {
            return true;
        }
        dict.no_match_auto_select_regex
            .as_ref()
            .map_or(false, |re| re.is_match(code))
    }

    fn current_state(&self) -> State {
        let model = self.model.borrow();
        let mut state = model.null_state();
        let mut out = State::default();
        for s in &self.selected {
            for item in s {
                if item.word.is_empty() {
                    continue;
                }
                model.score(&state, &item.word, item.word_idx, &mut out);
                state = out;
            }
        }
        state
    }

    // ---- decoding --------------------------------------------------

    fn update(&mut self) {
        self.auto_select_index = 0;
        if self.is_empty() {
            self.reset_matching_state();
            self.buffer.clear();
            self.selected.clear();
            return;
        }

        if self.selected() {
            self.reset_matching_state();
            return;
        }

        self.lattice.clear();
        let state = self.current_state();
        self.candidates.clear();

        let last_seg_length = self.graph.data().chars().count();
        let (decoded, order_policy, no_sort_input_length, sort_by_code_length, max_length) = {
            let dict = self.dict.borrow();
            let model = self.model.borrow();
            let nbest = if last_seg_length == dict.max_length() as usize
                && !dict.table_options().auto_rule_set.is_empty()
            {
                5
            } else {
                1
            };
            let params = DecodeParams {
                nbest,
                max_distance: f32::MAX,
                min_path: -f32::MAX,
                beam_size: TABLE_BEAM_SIZE,
                frame_size: TABLE_FRAME_SIZE,
            };
            let decoded = decode(
                &mut self.lattice,
                &*dict,
                &*model,
                &self.graph,
                &params,
                state,
                None,
                &TableDecoderHook,
            );
            (
                decoded,
                dict.table_options().order_policy,
                dict.table_options().no_sort_input_length as i32,
                dict.table_options().sort_by_code_length,
                dict.max_length(),
            )
        };

        if decoded {
            let mut dup: AHashMap<String, usize> = AHashMap::new();
            let mut insert_candidate =
                |candidates: &mut Vec<TableSentence>, sentence: TableSentence| {
                    let text = sentence.text();
                    if let Some(&idx) = dup.get(&text) {
                        if should_replace_candidate(&candidates[idx], &sentence, order_policy) {
                            candidates[idx] = sentence;
                        }
                    } else {
                        candidates.push(sentence);
                        dup.insert(text, candidates.len() - 1);
                    }
                };

            // single words spanning the whole code
            let end = self.graph.size();
            if let Some(end_id) = self.graph.node_id(end) {
                for &id in self.lattice.nodes(end_id) {
                    let node = self.lattice.node(id);
                    if node.from() == Some(0) && node.to() == Some(end) {
                        let mut sentence = self.lattice.backtrace(id, 0.0);
                        if is_pinyin(&sentence) {
                            sentence.adjust_score(PINYIN_PENALTY);
                        }
                        insert_candidate(&mut self.candidates, sentence);
                    }
                }
            }

            let mut min = 0.0f32;
            for candidate in &self.candidates {
                min = min.min(candidate.score());
            }

            // multi-word sentences within the allowed distance
            for i in 0..self.lattice.sentence_size() {
                let mut sentence = self.lattice.sentence(i).clone();
                if is_pinyin(&sentence) {
                    sentence.adjust_score(PINYIN_PENALTY);
                }
                let score = sentence
                    .sentence()
                    .last()
                    .map(|w| w.score)
                    .unwrap_or_else(|| sentence.score());
                if min - score < TABLE_DEFAULT_MIN_DISTANCE || self.candidates.is_empty() {
                    insert_candidate(&mut self.candidates, sentence);
                }
            }

            let no_sort_length = (last_seg_length as i32).min(no_sort_input_length);
            self.candidates.sort_by(|a, b| {
                if candidate_less(a, b, order_policy, no_sort_length, sort_by_code_length) {
                    std::cmp::Ordering::Less
                } else if candidate_less(b, a, order_policy, no_sort_length, sort_by_code_length) {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            });

            // keep a real word first even when a pinyin entry wins
            if self.candidates.first().map_or(false, is_pinyin) {
                if let Some(pos) = self
                    .candidates
                    .iter()
                    .position(|c| !is_auto(c) && !is_pinyin(c))
                {
                    let preferred = self.candidates.remove(pos);
                    self.candidates.insert(0, preferred);
                }
            }
        }

        // second pass: single-choice auto select
        let should_auto_select = {
            let dict = self.dict.borrow();
            dict.table_options().auto_select
                && self.has_only_one_autoselect_choice()
                && last_seg_length <= max_length as usize
                && Self::check_auto_select(&dict, self.graph.data())
        };
        if should_auto_select {
            self.auto_select();
        }
    }

    // ---- rendering and learning ------------------------------------

    /// Committed segments (parenthesized when not committed) plus the
    /// pending code.
    pub fn preedit(&self) -> String {
        let mut result = String::new();
        for i in 0..self.selected_size() {
            let (text, commit) = self.selected_segment(i);
            if commit {
                result.push_str(&text);
            } else {
                result.push('(');
                result.push_str(&text);
                result.push(')');
            }
        }
        result.push_str(self.current_code());
        result
    }

    /// Remaining code of candidate `idx` (prompt-mapped when `custom`).
    pub fn candidate_hint(&self, idx: usize, custom: bool) -> String {
        let candidate = &self.candidates[idx];
        if candidate.size() != 1 {
            return String::new();
        }
        let word = &candidate.sentence()[0];
        if word.word.is_empty() {
            return String::new();
        }
        let dict = self.dict.borrow();
        if word.payload.flag == PhraseFlag::Pinyin {
            if word.word.chars().count() == 1 {
                if let Some(code) = dict.reverse_lookup(&word.word, PhraseFlag::None) {
                    return if custom { dict.hint(&code) } else { code };
                }
            }
            return String::new();
        }
        let mut code = word.payload.code.as_str();
        let matching_key = dict.table_options().matching_key;
        let show_full = matching_key
            .map_or(false, |key| self.current_code().contains(key));
        if !show_full {
            code = &code[self.current_code().len().min(code.len())..];
        }
        if custom {
            dict.hint(code)
        } else {
            code.to_string()
        }
    }

    fn learn_word(&self, selection: &[SelectedCode]) -> bool {
        let mut dict = self.dict.borrow_mut();
        if selection.len() == 1 {
            let select = &selection[0];
            match select.flag {
                PhraseFlag::None | PhraseFlag::User => {
                    dict.insert(&select.code, &select.word, PhraseFlag::User, false);
                }
                PhraseFlag::Auto => {
                    // promote out of the auto dict
                    dict.remove_word(&select.code, &select.word);
                    dict.insert(&select.code, &select.word, PhraseFlag::User, false);
                }
                _ => {}
            }
            return true;
        }
        let mut word = String::new();
        for selected in selection {
            if !selected.commit {
                return true;
            }
            word.push_str(&selected.word);
        }
        dict.insert_phrase(&word, PhraseFlag::User)
    }

    /// Learn every committed segment and feed the sentence into the
    /// history model.
    pub fn learn(&mut self) {
        if !self.dict.borrow().table_options().learning || self.selected.is_empty() {
            return;
        }

        let selected = self.selected.clone();
        for s in &selected {
            if !self.learn_word(s) {
                return;
            }
        }
        let mut sentence = Vec::new();
        for s in &selected {
            let mut word = String::new();
            let mut commit = true;
            for item in s {
                if !item.commit {
                    commit = false;
                    break;
                }
                word.push_str(&item.word);
            }
            if commit && !word.is_empty() {
                sentence.push(word);
            }
        }
        if !sentence.is_empty() {
            self.model.borrow_mut().history_mut().add(&sentence);
        }
    }

    /// Learn only the most recent committed segment.
    pub fn learn_last(&mut self) {
        if !self.dict.borrow().table_options().learning || self.selected.is_empty() {
            return;
        }
        let last = self.selected.last().expect("non-empty").clone();
        if !self.learn_word(&last) {
            return;
        }
        let mut word = String::new();
        for item in &last {
            if !item.commit {
                return;
            }
            word.push_str(&item.word);
        }
        if !word.is_empty() {
            self.model.borrow_mut().history_mut().add(&[word]);
        }
    }

    /// Capture auto phrases from `history`: every 2..=autoPhraseLength
    /// suffix window whose code can be derived gets recorded.
    pub fn learn_auto_phrase(&mut self, history: &str, hints: &[String]) {
        let (learning, auto_phrase_length) = {
            let dict = self.dict.borrow();
            (
                dict.table_options().learning,
                dict.table_options().auto_phrase_length,
            )
        };
        if !learning || auto_phrase_length <= 1 {
            return;
        }

        let chars: Vec<(usize, char)> = history.char_indices().collect();
        for (i, &(byte_offset, _)) in chars.iter().enumerate() {
            let remaining = chars.len() - i;
            if remaining < 2 || remaining > auto_phrase_length as usize {
                continue;
            }
            let word = &history[byte_offset..];
            let current_hints: Vec<String> = hints.get(i..).map(|h| h.to_vec()).unwrap_or_default();
            let mut dict = self.dict.borrow_mut();
            let Some(code) = dict.generate_with_hint(word, &current_hints) else {
                continue;
            };
            let flag = dict.word_exists(&code, word);
            if flag == PhraseFlag::None || flag == PhraseFlag::User {
                continue;
            }
            dict.insert(&code, word, PhraseFlag::Auto, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TableFormat;
    use crate::options::TableOptions;
    use libhan_core::{LanguageModel, NGramModel};
    use std::sync::Arc;

    const TEST_TABLE: &str = "\
KeyCode=abcdefghijklmnopqrstuvwxy
Length=4
Pinyin=@
[Rule]
e2=p11+p12+p21+p22
[Data]
xycq 测
jghh 好
kkkk 你
@ce 测
lcc 测试
";

    fn fixtures() -> (RefCell<TableBasedDictionary>, RefCell<UserLanguageModel>) {
        let mut dict = TableBasedDictionary::new();
        dict.load(&mut TEST_TABLE.as_bytes(), TableFormat::Text)
            .unwrap();
        let mut model = NGramModel::new();
        model.add_word("测", -2.0);
        model.add_word("好", -2.1);
        model.add_word("你", -2.2);
        model.add_word("测试", -1.9);
        let model = UserLanguageModel::new(LanguageModel::new(Arc::new(model)));
        (RefCell::new(dict), RefCell::new(model))
    }

    #[test]
    fn typing_code_offers_word() {
        let (dict, model) = fixtures();
        let mut ctx = TableContext::new(&dict, &model);
        assert!(ctx.type_str("xycq"));
        assert_eq!(ctx.current_code(), "xycq");
        let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
        assert!(texts.contains(&"测".to_string()), "{texts:?}");
    }

    #[test]
    fn prefix_offers_longer_codes() {
        let (dict, model) = fixtures();
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("lc");
        let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
        assert!(texts.contains(&"测试".to_string()), "{texts:?}");
    }

    #[test]
    fn select_commits_and_preedit_shows_it() {
        let (dict, model) = fixtures();
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("xycq");
        let idx = ctx
            .candidates()
            .iter()
            .position(|c| c.text() == "测")
            .unwrap();
        ctx.select(idx);
        assert!(ctx.selected());
        assert_eq!(ctx.selected_sentence(), "测");
        assert_eq!(ctx.preedit(), "测");
    }

    #[test]
    fn auto_select_on_max_length() {
        let (dict, model) = fixtures();
        {
            let mut d = dict.borrow_mut();
            let mut options = TableOptions::default();
            options.auto_select = true;
            options.auto_select_length = -1; // max length
            d.set_table_options(options);
        }
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("kkkk");
        // single exact choice at full length commits automatically
        assert!(ctx.selected());
        assert_eq!(ctx.selected_sentence(), "你");
    }

    #[test]
    fn no_match_auto_select_commits_previous_segment() {
        let (dict, model) = fixtures();
        {
            let mut d = dict.borrow_mut();
            let mut options = TableOptions::default();
            options.auto_select = true;
            options.no_match_auto_select_length = 1;
            d.set_table_options(options);
        }
        // no pinyin key in this table variant
        let plain = "\
KeyCode=abcdefghijklmnopqrstuvwxy
Length=4
[Data]
xycq 测
jghh 好
";
        dict.borrow_mut()
            .load(&mut plain.as_bytes(), TableFormat::Text)
            .unwrap();
        {
            let mut d = dict.borrow_mut();
            let mut options = TableOptions::default();
            options.auto_select = true;
            options.no_match_auto_select_length = 1;
            d.set_table_options(options);
        }
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("xy");
        assert!(!ctx.selected());
        // 'j' cannot extend "xy"; the previous segment commits first
        ctx.type_str("j");
        assert_eq!(ctx.selected_length(), 2);
        assert_eq!(ctx.current_code(), "j");
    }

    #[test]
    fn learn_inserts_user_word_and_history() {
        let (dict, model) = fixtures();
        {
            let mut d = dict.borrow_mut();
            let mut options = TableOptions::default();
            options.learning = true;
            d.set_table_options(options);
        }
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("xycq");
        let idx = ctx
            .candidates()
            .iter()
            .position(|c| c.text() == "测")
            .unwrap();
        ctx.select(idx);
        ctx.learn();
        assert_eq!(dict.borrow().word_exists("xycq", "测"), PhraseFlag::User);
        assert!(model.borrow().history().unigram_freq("测") > 0.0);
    }

    #[test]
    fn erase_clears_last_code_char() {
        let (dict, model) = fixtures();
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("xyc");
        ctx.erase(2, 3);
        assert_eq!(ctx.current_code(), "xy");
        ctx.erase(0, 2);
        assert!(ctx.is_empty());
    }

    #[test]
    fn candidate_hint_shows_code_remainder() {
        let (dict, model) = fixtures();
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("xy");
        let idx = ctx
            .candidates()
            .iter()
            .position(|c| c.text() == "测")
            .unwrap();
        assert_eq!(ctx.candidate_hint(idx, false), "cq");
    }

    #[test]
    fn pinyin_fallback_matches() {
        let (dict, model) = fixtures();
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("ce");
        let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
        assert!(texts.contains(&"测".to_string()), "{texts:?}");
    }
}
