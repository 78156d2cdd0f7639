//! Stateful pinyin input session.
//!
//! A context owns the raw keystroke buffer, the committed selections,
//! the segment graph over the unselected tail, the lattice and the
//! matcher caches. Every edit re-parses the tail, merges the new graph
//! into the old one (invalidating caches through the discard set),
//! re-decodes incrementally and rebuilds the candidate list.

use std::cell::{Cell, RefCell};

use ahash::AHashSet;

use libhan_core::decoder::{decode, DecodeParams, DecoderHook};
use libhan_core::{
    LanguageModelBase, Lattice, SegmentGraph, SentenceResult, State, WordIndex,
};

use crate::dictionary::{PinyinDictionary, PinyinPayload};
use crate::encoder::{
    decode_full_pinyin, initial_final_to_pinyin_string, initial_to_string, parse_user_pinyin,
    parse_user_shuangpin, shuangpin_to_syllables, string_to_syllables, PinyinFinal, PinyinFuzzyFlags,
    PinyinInitial,
};
use crate::ime::{PinyinIme, PinyinPreeditMode};
use crate::matchstate::PinyinMatchState;

/// Divisor of the unknown penalty for per-hop distance demotion of
/// mid-input word candidates.
const DISTANCE_PENALTY_FACTOR: f32 = 2.0;

/// Drops unknown single-syllable words that neither start the input
/// nor open their frame; they would never surface as candidates.
struct PinyinDecoderHook;

impl DecoderHook<PinyinPayload> for PinyinDecoderHook {
    fn accept(
        &self,
        _graph: &SegmentGraph,
        model: &dyn LanguageModelBase,
        word: &str,
        idx: WordIndex,
        path: &[usize],
        payload: &PinyinPayload,
        only_path: bool,
    ) -> bool {
        if model.is_unknown(idx, word)
            && payload.encoded.len() == 2
            && path.first() != Some(&0)
            && !only_path
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone)]
struct SelectedPinyin {
    offset: usize,
    word: String,
    word_idx: WordIndex,
    encoded: Vec<u8>,
    custom: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LearnWordResult {
    Normal,
    Custom,
    Ignored,
}

pub struct PinyinContext<'a> {
    ime: &'a PinyinIme,
    buffer: String,
    cursor: usize,
    use_shuangpin: bool,
    max_sentence_length: i32,
    selected: Vec<Vec<SelectedPinyin>>,
    segs: SegmentGraph,
    lattice: Lattice<PinyinPayload>,
    match_state: PinyinMatchState,
    candidates: Vec<SentenceResult<PinyinPayload>>,
    candidates_set: AHashSet<String>,
    to_cursor_dirty: Cell<bool>,
    to_cursor: RefCell<Vec<SentenceResult<PinyinPayload>>>,
    to_cursor_set: RefCell<AHashSet<String>>,
    seen_dict_generation: u64,
    seen_option_generation: u64,
}

impl<'a> PinyinContext<'a> {
    pub fn new(ime: &'a PinyinIme) -> Self {
        PinyinContext {
            seen_dict_generation: ime.dict().generation(),
            seen_option_generation: ime.option_generation(),
            ime,
            buffer: String::new(),
            cursor: 0,
            use_shuangpin: false,
            max_sentence_length: -1,
            selected: Vec::new(),
            segs: SegmentGraph::new(String::new()),
            lattice: Lattice::new(),
            match_state: PinyinMatchState::new(),
            candidates: Vec::new(),
            candidates_set: AHashSet::new(),
            to_cursor_dirty: Cell::new(false),
            to_cursor: RefCell::new(Vec::new()),
            to_cursor_set: RefCell::new(AHashSet::new()),
        }
    }

    pub fn ime(&self) -> &PinyinIme {
        self.ime
    }

    pub fn set_use_shuangpin(&mut self, sp: bool) {
        self.use_shuangpin = sp;
        self.match_state.clear();
    }

    pub fn use_shuangpin(&self) -> bool {
        self.use_shuangpin
    }

    /// Cap on the decoded sentence length in syllables; negative
    /// disables the cap.
    pub fn set_max_sentence_length(&mut self, length: i32) {
        self.max_sentence_length = length;
        self.match_state.clear();
    }

    pub fn max_sentence_length(&self) -> i32 {
        self.max_sentence_length
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

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Append keystrokes at the cursor. Returns false when the input
    /// is rejected (non-ASCII, or the sentence-length cap would be
    /// crossed).
    pub fn type_str(&mut self, s: &str) -> bool {
        if s.is_empty() || !s.is_ascii() {
            return false;
        }
        if self.max_sentence_length > 0 && !self.candidates.is_empty() {
            let mut size = 0usize;
            for word in self.candidates[0].sentence() {
                size += word.path.len().max(1) - 1;
            }
            if size > self.max_sentence_length as usize {
                return false;
            }
        }
        self.cancel_till(self.cursor);
        self.buffer.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.update();
        true
    }

    /// Remove `[from, to)` from the buffer; no-op when empty.
    pub fn erase(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let to = to.min(self.buffer.len());
        if from >= to {
            return;
        }

        if from == 0 && to >= self.size() {
            self.reset_decoding_state();
            self.selected.clear();
            self.buffer.clear();
            self.cursor = 0;
        } else {
            self.cancel_till(from);
            self.buffer.replace_range(from..to, "");
            if self.cursor >= to {
                self.cursor -= to - from;
            } else if self.cursor > from {
                self.cursor = from;
            }
        }
        self.update();
    }

    pub fn set_cursor(&mut self, pos: usize) {
        let pos = pos.min(self.buffer.len());
        let old_cursor = self.cursor;
        let cancelled = self.cancel_till(pos);
        self.cursor = pos;
        if cancelled {
            self.update();
        } else if self.cursor != old_cursor {
            self.to_cursor_dirty.set(true);
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.selected.clear();
        self.reset_decoding_state();
    }

    fn reset_decoding_state(&mut self) {
        self.lattice.clear();
        self.match_state.clear();
        self.segs = SegmentGraph::new(String::new());
        self.clear_candidates();
    }

    fn clear_candidates(&mut self) {
        self.candidates.clear();
        self.candidates_set.clear();
        self.to_cursor.borrow_mut().clear();
        self.to_cursor_set.borrow_mut().clear();
        self.to_cursor_dirty.set(false);
    }

    pub fn candidates(&self) -> &[SentenceResult<PinyinPayload>] {
        &self.candidates
    }

    pub fn candidate_set(&self) -> &AHashSet<String> {
        &self.candidates_set
    }

    // ---- selection -------------------------------------------------

    pub fn selected(&self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }
        self.selected
            .last()
            .and_then(|s| s.last())
            .map_or(false, |item| item.offset == self.size())
    }

    pub fn selected_length(&self) -> usize {
        self.selected
            .last()
            .and_then(|s| s.last())
            .map_or(0, |item| item.offset)
    }

    pub fn selected_sentence(&self) -> String {
        let mut out = String::new();
        for s in &self.selected {
            for item in s {
                out.push_str(&item.word);
            }
        }
        out
    }

    pub fn selected_words(&self) -> Vec<String> {
        let mut out = Vec::new();
        for s in &self.selected {
            for item in s {
                if !item.word.is_empty() {
                    out.push(item.word.clone());
                }
            }
        }
        out
    }

    pub fn selected_words_with_pinyin(&self) -> Vec<(String, Vec<u8>)> {
        let mut out = Vec::new();
        for s in &self.selected {
            for item in s {
                if !item.word.is_empty() {
                    out.push((item.word.clone(), item.encoded.clone()));
                }
            }
        }
        out
    }

    pub fn selected_full_pinyin(&self) -> String {
        let mut pinyin = String::new();
        for s in &self.selected {
            for item in s {
                if item.word.is_empty() {
                    continue;
                }
                if !pinyin.is_empty() {
                    pinyin.push('\'');
                }
                if let Ok(decoded) = decode_full_pinyin(&item.encoded) {
                    pinyin.push_str(&decoded);
                }
            }
        }
        pinyin
    }

    pub fn candidate_full_pinyin(&self, idx: usize) -> String {
        let mut pinyin = String::new();
        for word in self.candidates[idx].sentence() {
            if word.word.is_empty() {
                continue;
            }
            if !pinyin.is_empty() {
                pinyin.push('\'');
            }
            if let Ok(decoded) = decode_full_pinyin(&word.payload.encoded) {
                pinyin.push_str(&decoded);
            }
        }
        pinyin
    }

    /// Commit candidate `idx`.
    pub fn select(&mut self, idx: usize) {
        let sentence = self.candidates[idx].clone();
        self.select_sentence(&sentence);
    }

    /// Commit candidate `idx` of the to-cursor list.
    pub fn select_candidates_to_cursor(&mut self, idx: usize) {
        let sentence = self.candidates_to_cursor()[idx].clone();
        self.select_sentence(&sentence);
    }

    fn select_sentence(&mut self, sentence: &SentenceResult<PinyinPayload>) {
        let offset = self.selected_length();
        let mut selection = Vec::new();
        {
            let model = self.ime.model();
            for word in sentence.sentence() {
                selection.push(SelectedPinyin {
                    offset: offset + word.to,
                    word: word.word.clone(),
                    word_idx: model.index(&word.word),
                    encoded: word.payload.encoded.clone(),
                    custom: false,
                });
            }
        }
        self.push_selection(selection);
    }

    /// Commit an arbitrary text for the next `input_length` bytes.
    pub fn select_custom(
        &mut self,
        input_length: usize,
        segment: &str,
        encoded_pinyin: &[u8],
    ) -> libhan_core::Result<()> {
        if input_length == 0 || self.selected_length() + input_length > self.size() {
            return Err(libhan_core::Error::invalid_argument("invalid input length"));
        }
        if encoded_pinyin.len() % 2 != 0 {
            return Err(libhan_core::Error::invalid_argument(
                "invalid encoded pinyin",
            ));
        }
        let offset = self.selected_length();
        let word_idx = self.ime.model().index(segment);
        self.push_selection(vec![SelectedPinyin {
            offset: offset + input_length,
            word: segment.to_string(),
            word_idx,
            encoded: encoded_pinyin.to_vec(),
            custom: true,
        }]);
        Ok(())
    }

    fn push_selection(&mut self, mut selection: Vec<SelectedPinyin>) {
        if selection.is_empty() {
            return;
        }
        // a trailing run of separators is committed as an empty word
        let end = selection.last().expect("non-empty selection").offset;
        let remain = &self.buffer[end..];
        if !remain.is_empty() && remain.bytes().all(|b| b == b'\'') {
            selection.push(SelectedPinyin {
                offset: self.size(),
                word: String::new(),
                word_idx: 0,
                encoded: Vec::new(),
                custom: false,
            });
        }
        self.selected.push(selection);
        self.update();
    }

    /// Undo the last selection. No-op without one.
    pub fn cancel(&mut self) {
        if !self.selected.is_empty() {
            self.selected.pop();
            // The begin state changed; no cached matching state can be
            // reused.
            self.reset_decoding_state();
        }
        self.update();
    }

    fn cancel_till(&mut self, pos: usize) -> bool {
        let mut cancelled = false;
        while self.selected_length() > pos {
            if !self.selected.is_empty() {
                self.selected.pop();
                self.reset_decoding_state();
            }
            cancelled = true;
        }
        cancelled
    }

    /// Model state after the committed prefix.
    pub fn state(&self) -> State {
        let model = self.ime.model();
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

    fn check_generations(&mut self) {
        let option_generation = self.ime.option_generation();
        if option_generation != self.seen_option_generation {
            self.seen_option_generation = option_generation;
            self.reset_decoding_state();
        }
        let dict_generation = self.ime.dict().generation();
        if dict_generation != self.seen_dict_generation {
            self.seen_dict_generation = dict_generation;
            self.match_state.clear();
        }
    }

    fn update(&mut self) {
        self.check_generations();
        if self.is_empty() {
            self.clear();
            return;
        }

        if self.selected() {
            self.clear_candidates();
        } else {
            self.redecode();
        }

        if self.cursor < self.selected_length() {
            self.cursor = self.selected_length();
        }
    }

    fn redecode(&mut self) {
        let ime = self.ime;
        let start = self.selected_length();
        let state = self.state();
        let flags = ime.fuzzy_flags();

        let sp_profile = if self.use_shuangpin {
            ime.shuangpin_profile()
        } else {
            None
        };
        let correction_profile = if flags.test(PinyinFuzzyFlags::CORRECTION) {
            ime.correction_profile()
        } else {
            None
        };

        let tail = self.buffer[start..].to_string();
        let new_graph = match &sp_profile {
            Some(profile) => parse_user_shuangpin(tail, profile, flags),
            None => parse_user_pinyin(tail, correction_profile.as_deref(), flags),
        };

        {
            let lattice = &mut self.lattice;
            let match_state = &mut self.match_state;
            self.segs.merge(new_graph, |nodes| {
                lattice.discard_node(nodes);
                match_state.discard_node(nodes);
            });
        }

        self.match_state.configure(
            flags,
            sp_profile,
            correction_profile,
            ime.partial_long_word_limit(),
        );

        let params = DecodeParams {
            nbest: ime.nbest(),
            max_distance: ime.max_distance(),
            min_path: ime.min_path(),
            beam_size: ime.beam_size(),
            frame_size: ime.frame_size(),
        };
        let decoded = {
            let dict = ime.dict();
            let model = ime.model();
            decode(
                &mut self.lattice,
                &*dict,
                &*model,
                &self.segs,
                &params,
                state,
                Some(&mut self.match_state),
                &PinyinDecoderHook,
            )
        };

        self.clear_candidates();
        if !decoded {
            return;
        }

        for i in 0..self.lattice.sentence_size() {
            let sentence = self.lattice.sentence(i).clone();
            self.candidates_set.insert(sentence.text());
            self.candidates.push(sentence);
        }

        let begin_size = self.candidates.len();
        let model = ime.model();
        let distance_penalty = model.unknown_penalty() / DISTANCE_PENALTY_FACTOR;
        let max_distance = ime.max_distance();

        for i in (1..=self.segs.size()).rev() {
            let Some(node_id) = self.segs.node_id(i) else {
                continue;
            };
            let distance = self.segs.distance_to_end(i);
            let adjust = distance as f32 * distance_penalty;
            let ids = self.lattice.nodes(node_id).to_vec();

            let mut min = 0.0f32;
            let mut max = -f32::MAX;

            // dictionary words without correction
            for &id in &ids {
                let node = self.lattice.node(id);
                if node.from() != Some(0) || node.payload().correction {
                    continue;
                }
                if !model.is_unknown(node.idx(), node.word()) {
                    min = min.min(node.score());
                    max = max.max(node.score());
                }
                if self.candidates_set.contains(node.word()) {
                    continue;
                }
                let word = node.word().to_string();
                let result = self.lattice.backtrace(id, adjust);
                self.candidates.push(result);
                self.candidates_set.insert(word);
            }

            // corrected words survive only when they stay competitive
            for &id in &ids {
                let node = self.lattice.node(id);
                if node.from() != Some(0) || !node.payload().correction {
                    continue;
                }
                if self.candidates_set.contains(node.word()) {
                    continue;
                }
                if (node.score() > min && node.score() + max_distance > max)
                    || node.payload().encoded.len() <= 2
                {
                    let word = node.word().to_string();
                    let result = self.lattice.backtrace(id, adjust);
                    self.candidates.push(result);
                    self.candidates_set.insert(word);
                }
            }

            // phrases assembled mid-lattice
            for &id in &ids {
                let node = self.lattice.node(id);
                if node.from() == Some(0)
                    || node.score() <= min
                    || node.score() + max_distance <= max
                {
                    continue;
                }
                if self
                    .lattice
                    .any_on_path(id, |n| n.payload().correction)
                {
                    continue;
                }
                let full_word = self.lattice.full_word(id);
                if self.candidates_set.contains(&full_word) {
                    continue;
                }
                let result = self.lattice.backtrace(id, adjust);
                self.candidates.push(result);
                self.candidates_set.insert(full_word);
            }
        }
        drop(model);

        self.candidates[begin_size..].sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.sentence().len().cmp(&b.sentence().len()))
        });

        let limit = ime.word_candidate_limit();
        if limit > 0 {
            let mut count = 0;
            let candidates_set = &mut self.candidates_set;
            let mut index = 0;
            self.candidates.retain(|candidate| {
                let keep;
                if index < begin_size {
                    keep = true;
                } else {
                    let is_single_pinyin_word = candidate.sentence().len() == 1
                        && candidate.sentence()[0].payload.encoded.len() == 2;
                    if is_single_pinyin_word {
                        keep = true;
                    } else if count >= limit {
                        candidates_set.remove(&candidate.text());
                        keep = false;
                    } else {
                        count += 1;
                        keep = true;
                    }
                }
                index += 1;
                keep
            });
        }

        self.to_cursor_dirty.set(true);
    }

    // ---- cursor-limited candidates ---------------------------------

    fn align_cursor_to_next_segment(&self) -> usize {
        let start = self.selected_length();
        let mut current = self.cursor;
        if current < start {
            return start;
        }
        while current < self.size() && self.segs.node(current - start).is_none() {
            current += 1;
        }
        current
    }

    fn need_candidates_to_cursor(&self) -> bool {
        if self.cursor == self.selected_length() {
            return false;
        }
        self.align_cursor_to_next_segment() != self.size()
    }

    fn update_candidates_to_cursor(&self) {
        if !self.to_cursor_dirty.get() {
            return;
        }
        self.to_cursor_dirty.set(false);
        let mut list = self.to_cursor.borrow_mut();
        let mut set = self.to_cursor_set.borrow_mut();
        list.clear();
        set.clear();

        let start = self.selected_length();
        let current_cursor = self.align_cursor_to_next_segment();

        // Best partial sentence ending at the cursor segment.
        if let Some(node_id) = self.segs.node_id(current_cursor - start) {
            if let Some(&first) = self.lattice.nodes(node_id).first() {
                let result = self.lattice.backtrace(first, 0.0);
                set.insert(result.text());
                list.push(result);
            }
        }

        for candidate in &self.candidates {
            let sentence = candidate.sentence();
            if sentence.len() == 1 {
                if sentence[0].to + start > current_cursor {
                    continue;
                }
                let text = candidate.text();
                if set.contains(&text) {
                    continue;
                }
                list.push(candidate.clone());
                set.insert(text);
            } else if sentence.len() > 1 {
                let mut words = sentence.to_vec();
                while words
                    .last()
                    .map_or(false, |w| w.to + start > current_cursor)
                {
                    words.pop();
                }
                if words.is_empty() {
                    continue;
                }
                let score = words.last().expect("non-empty").score;
                let partial = SentenceResult::new(words, score);
                let text = partial.text();
                if set.contains(&text) {
                    continue;
                }
                list.push(partial);
                set.insert(text);
            }
        }
    }

    /// Candidates whose span ends at or before the cursor, with
    /// partial-sentence extraction.
    pub fn candidates_to_cursor(&self) -> std::cell::Ref<'_, Vec<SentenceResult<PinyinPayload>>> {
        if !self.need_candidates_to_cursor() {
            // keep the full list mirrored for a uniform return type
            if self.to_cursor_dirty.get() {
                self.to_cursor_dirty.set(false);
                let mut list = self.to_cursor.borrow_mut();
                let mut set = self.to_cursor_set.borrow_mut();
                list.clear();
                set.clear();
                list.extend(self.candidates.iter().cloned());
                set.extend(self.candidates_set.iter().cloned());
            }
            return self.to_cursor.borrow();
        }
        self.update_candidates_to_cursor();
        self.to_cursor.borrow()
    }

    /// Byte range of the decoded syllable under the cursor (start).
    pub fn pinyin_before_cursor(&self) -> Option<usize> {
        let len = self.selected_length();
        let c = self.cursor.checked_sub(len)?;
        let first = self.candidates.first()?;
        for word in first.sentence() {
            for pair in word.path.windows(2) {
                if pair[1] >= c {
                    return Some(pair[0] + len);
                }
            }
        }
        None
    }

    /// Byte range of the decoded syllable under the cursor (end).
    pub fn pinyin_after_cursor(&self) -> Option<usize> {
        let len = self.selected_length();
        let c = self.cursor.checked_sub(len)?;
        let first = self.candidates.first()?;
        for word in first.sentence() {
            for pair in word.path.windows(2) {
                if pair[1] > c {
                    return Some(pair[1] + len);
                }
            }
        }
        None
    }

    // ---- preedit ---------------------------------------------------

    pub fn preedit(&self) -> (String, usize) {
        self.preedit_with_mode(self.ime.preedit_mode())
    }

    /// Render the committed prefix plus the best remaining sentence's
    /// per-syllable spelling (or the raw keystrokes), with the byte
    /// offset of the cursor inside the rendered string.
    pub fn preedit_with_mode(&self, mode: PinyinPreeditMode) -> (String, usize) {
        let mut out = self.selected_sentence();
        let len = self.selected_length();
        let c = self.cursor.max(len);
        let mut actual_cursor = out.len();
        let mut result_size = out.len();

        if let Some(best) = self.candidates.first() {
            let mut first = true;
            for word in best.sentence() {
                for (nth, pair) in word.path.windows(2).enumerate() {
                    if !first {
                        out.push(' ');
                        result_size += 1;
                    } else {
                        first = false;
                    }
                    let (from, to) = (pair[0], pair[1]);
                    let start_pivot = result_size;
                    let pinyin_seg = self.segs.segment(from, to);

                    let syls = if mode == PinyinPreeditMode::Pinyin {
                        // always parse without fuzzy so typed typos stay
                        // visible instead of silently "fixed"
                        if self.use_shuangpin {
                            self.ime
                                .shuangpin_profile()
                                .map(|p| {
                                    shuangpin_to_syllables(pinyin_seg, &p, PinyinFuzzyFlags::NONE)
                                })
                                .unwrap_or_default()
                        } else {
                            string_to_syllables(pinyin_seg, PinyinFuzzyFlags::NONE)
                        }
                    } else {
                        Vec::new()
                    };

                    let mut actual_pinyin = String::new();
                    if !syls.is_empty() && !syls[0].1.is_empty() {
                        let candidate_pinyin = &word.payload.encoded;
                        let mut best_initial = syls[0].0;
                        let mut best_final = syls[0].1[0].0;
                        if nth * 2 + 2 <= candidate_pinyin.len() {
                            let cand_initial =
                                PinyinInitial::from_byte(candidate_pinyin[nth * 2]);
                            let cand_final =
                                PinyinFinal::from_byte(candidate_pinyin[nth * 2 + 1]);
                            // first non-fuzzy reading matching the
                            // candidate's encoded syllable wins
                            'search: for (initial, finals) in &syls {
                                for &(fin, fuzzy) in finals {
                                    if fuzzy {
                                        continue;
                                    }
                                    if cand_initial == *initial
                                        && (fin == PinyinFinal::Invalid || cand_final == fin)
                                    {
                                        best_initial = *initial;
                                        if fin != PinyinFinal::Invalid {
                                            best_final = fin;
                                        }
                                        break 'search;
                                    }
                                }
                            }
                        }
                        actual_pinyin =
                            initial_final_to_pinyin_string(best_initial, best_final);
                        if !self.use_shuangpin {
                            actual_pinyin = match_pinyin_case(pinyin_seg, actual_pinyin);
                        }
                    }

                    let in_segment = c > from + len && c <= to + len;
                    if !actual_pinyin.is_empty() {
                        let mut cursor_in_pinyin = c.saturating_sub(from + len);
                        if in_segment {
                            if self.use_shuangpin {
                                match cursor_in_pinyin {
                                    0 => {}
                                    1 => {
                                        if pinyin_seg.len() == 2
                                            && syls[0].0 == PinyinInitial::Zero
                                        {
                                            actual_pinyin.insert(0, '_');
                                        }
                                        if syls[0].0 != PinyinInitial::Zero {
                                            cursor_in_pinyin =
                                                initial_to_string(syls[0].0).len();
                                        }
                                    }
                                    _ => cursor_in_pinyin = actual_pinyin.len(),
                                }
                            } else {
                                let chars = cursor_in_pinyin.min(actual_pinyin.chars().count());
                                cursor_in_pinyin = actual_pinyin
                                    .chars()
                                    .take(chars)
                                    .map(char::len_utf8)
                                    .sum();
                            }
                        }
                        out.push_str(&actual_pinyin);
                        result_size += actual_pinyin.len();
                        if in_segment {
                            actual_cursor = start_pivot + cursor_in_pinyin;
                        }
                    } else {
                        out.push_str(pinyin_seg);
                        result_size += pinyin_seg.len();
                        if in_segment {
                            actual_cursor = start_pivot + (c - from - len);
                        }
                    }
                }
            }
        }
        if c == self.size() {
            actual_cursor = result_size;
        }
        (out, actual_cursor)
    }

    // ---- learning --------------------------------------------------

    fn learn_word(&mut self) -> LearnWordResult {
        if self.selected.is_empty() {
            return LearnWordResult::Ignored;
        }
        // an existing single word teaches nothing
        if self.selected.len() == 1 && self.selected[0].len() == 1 {
            return LearnWordResult::Ignored;
        }

        let mut has_custom = false;
        let mut total_pinyin_length = 0usize;
        let mut all_single_word = true;
        for s in &self.selected {
            all_single_word = all_single_word
                && (s.is_empty()
                    || (s.len() == 1 && (s[0].word.is_empty() || s[0].encoded.len() == 2)));
            for item in s {
                if item.word.is_empty() {
                    continue;
                }
                if item.custom {
                    has_custom = true;
                }
                // non-pinyin words cannot be learned
                if item.encoded.is_empty() || item.encoded.len() % 2 != 0 {
                    return LearnWordResult::Ignored;
                }
                total_pinyin_length += item.encoded.len() / 2;
            }
        }
        if !all_single_word && !has_custom && total_pinyin_length > 4 {
            return LearnWordResult::Ignored;
        }

        let mut word = String::new();
        let mut pinyin = String::new();
        for s in &self.selected {
            for item in s {
                if item.word.is_empty() {
                    continue;
                }
                word.push_str(&item.word);
                if !pinyin.is_empty() {
                    pinyin.push('\'');
                }
                if let Ok(decoded) = decode_full_pinyin(&item.encoded) {
                    pinyin.push_str(&decoded);
                }
            }
        }

        let mut dict = self.ime.dict_mut();
        if dict
            .lookup_word(PinyinDictionary::USER_DICT, &pinyin, &word)
            .is_some()
        {
            return LearnWordResult::Normal;
        }
        let cost = if has_custom { -1.0 } else { 0.0 };
        if dict
            .add_word(PinyinDictionary::USER_DICT, &pinyin, &word, cost)
            .is_err()
        {
            return LearnWordResult::Ignored;
        }
        if has_custom {
            LearnWordResult::Custom
        } else {
            LearnWordResult::Normal
        }
    }

    /// Learn the fully selected sentence into the user dictionary and
    /// the history model.
    pub fn learn(&mut self) {
        if !self.selected() {
            return;
        }

        match self.learn_word() {
            LearnWordResult::Normal => {
                let sentence = self.selected_words();
                self.ime.model_mut().history_mut().add(&sentence);
            }
            LearnWordResult::Custom => {
                // custom words stay out of the history on first use
            }
            LearnWordResult::Ignored => {
                let mut sentence = Vec::new();
                for s in &self.selected {
                    for item in s {
                        if item.word.is_empty() {
                            continue;
                        }
                        if item.encoded.is_empty() {
                            return; // non-pinyin word
                        }
                        sentence.push(item.word.clone());
                    }
                }
                self.ime.model_mut().history_mut().add(&sentence);
            }
        }
    }
}

/// Restore the user's letter case from `reference` onto the rendered
/// spelling when lengths line up.
fn match_pinyin_case(reference: &str, actual: String) -> String {
    if reference.len() != actual.chars().count() {
        return actual;
    }
    reference
        .chars()
        .zip(actual.chars())
        .map(|(r, a)| {
            if r.is_ascii_uppercase() {
                if a == 'ü' {
                    'Ü'
                } else if a.is_ascii_lowercase() {
                    a.to_ascii_uppercase()
                } else {
                    a
                }
            } else {
                a
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_pinyin_case_restores_upper() {
        assert_eq!(match_pinyin_case("NIhao", "nihao".to_string()), "NIhao");
        assert_eq!(match_pinyin_case("NV", "nü".to_string()), "NÜ");
        // length mismatch leaves the spelling untouched
        assert_eq!(match_pinyin_case("ni", "nihao".to_string()), "nihao");
    }
}
