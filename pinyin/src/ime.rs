//! Shared engine state for pinyin contexts.
//!
//! One `PinyinIme` owns the dictionary set, the fused language model
//! and the decoding options; any number of contexts borrow it. Option
//! and dictionary mutations bump generation counters that contexts
//! check on their next update to invalidate cached matcher state.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::sync::Arc;

use libhan_core::decoder::{BEAM_SIZE_DEFAULT, FRAME_SIZE_DEFAULT};
use libhan_core::UserLanguageModel;

use crate::correction::PinyinCorrectionProfile;
use crate::dictionary::PinyinDictionary;
use crate::encoder::PinyinFuzzyFlags;
use crate::shuangpin::ShuangpinProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinyinPreeditMode {
    /// Show the raw keystrokes.
    RawText,
    /// Show the corrected per-syllable pinyin spelling.
    Pinyin,
}

pub struct PinyinIme {
    dict: RefCell<PinyinDictionary>,
    model: RefCell<UserLanguageModel>,
    fuzzy_flags: Cell<PinyinFuzzyFlags>,
    nbest: Cell<usize>,
    beam_size: Cell<usize>,
    frame_size: Cell<usize>,
    partial_long_word_limit: Cell<usize>,
    max_distance: Cell<f32>,
    min_path: Cell<f32>,
    word_candidate_limit: Cell<usize>,
    preedit_mode: Cell<PinyinPreeditMode>,
    sp_profile: RefCell<Option<Arc<ShuangpinProfile>>>,
    correction_profile: RefCell<Option<Arc<PinyinCorrectionProfile>>>,
    option_generation: Cell<u64>,
}

impl PinyinIme {
    pub fn new(dict: PinyinDictionary, model: UserLanguageModel) -> Self {
        PinyinIme {
            dict: RefCell::new(dict),
            model: RefCell::new(model),
            fuzzy_flags: Cell::new(PinyinFuzzyFlags::NONE),
            nbest: Cell::new(1),
            beam_size: Cell::new(BEAM_SIZE_DEFAULT),
            frame_size: Cell::new(FRAME_SIZE_DEFAULT),
            partial_long_word_limit: Cell::new(0),
            max_distance: Cell::new(f32::MAX),
            min_path: Cell::new(-f32::MAX),
            word_candidate_limit: Cell::new(0),
            preedit_mode: Cell::new(PinyinPreeditMode::RawText),
            sp_profile: RefCell::new(None),
            correction_profile: RefCell::new(None),
            option_generation: Cell::new(0),
        }
    }

    fn option_changed(&self) {
        self.option_generation.set(self.option_generation.get() + 1);
    }

    /// Bumped whenever a decoding option changes; contexts drop their
    /// cached state when they observe a new value.
    pub fn option_generation(&self) -> u64 {
        self.option_generation.get()
    }

    pub fn dict(&self) -> Ref<'_, PinyinDictionary> {
        self.dict.borrow()
    }

    pub fn dict_mut(&self) -> RefMut<'_, PinyinDictionary> {
        self.dict.borrow_mut()
    }

    pub fn model(&self) -> Ref<'_, UserLanguageModel> {
        self.model.borrow()
    }

    pub fn model_mut(&self) -> RefMut<'_, UserLanguageModel> {
        self.model.borrow_mut()
    }

    pub fn fuzzy_flags(&self) -> PinyinFuzzyFlags {
        self.fuzzy_flags.get()
    }

    pub fn set_fuzzy_flags(&self, flags: PinyinFuzzyFlags) {
        if self.fuzzy_flags.get() != flags {
            self.fuzzy_flags.set(flags);
            self.option_changed();
        }
    }

    pub fn nbest(&self) -> usize {
        self.nbest.get()
    }

    pub fn set_nbest(&self, n: usize) {
        if self.nbest.get() != n {
            self.nbest.set(n);
            self.option_changed();
        }
    }

    pub fn beam_size(&self) -> usize {
        self.beam_size.get()
    }

    pub fn set_beam_size(&self, n: usize) {
        if self.beam_size.get() != n {
            self.beam_size.set(n);
            self.option_changed();
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size.get()
    }

    pub fn set_frame_size(&self, n: usize) {
        if self.frame_size.get() != n {
            self.frame_size.set(n);
            self.option_changed();
        }
    }

    pub fn partial_long_word_limit(&self) -> usize {
        self.partial_long_word_limit.get()
    }

    pub fn set_partial_long_word_limit(&self, n: usize) {
        if self.partial_long_word_limit.get() != n {
            self.partial_long_word_limit.set(n);
            self.option_changed();
        }
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance.get()
    }

    pub fn min_path(&self) -> f32 {
        self.min_path.get()
    }

    /// Score-based pruning of alternative sentences and word
    /// candidates.
    pub fn set_score_filter(&self, max_distance: f32, min_path: f32) {
        if self.max_distance.get() != max_distance || self.min_path.get() != min_path {
            self.max_distance.set(max_distance);
            self.min_path.set(min_path);
            self.option_changed();
        }
    }

    pub fn word_candidate_limit(&self) -> usize {
        self.word_candidate_limit.get()
    }

    pub fn set_word_candidate_limit(&self, n: usize) {
        if self.word_candidate_limit.get() != n {
            self.word_candidate_limit.set(n);
            self.option_changed();
        }
    }

    pub fn preedit_mode(&self) -> PinyinPreeditMode {
        self.preedit_mode.get()
    }

    pub fn set_preedit_mode(&self, mode: PinyinPreeditMode) {
        if self.preedit_mode.get() != mode {
            self.preedit_mode.set(mode);
            self.option_changed();
        }
    }

    pub fn shuangpin_profile(&self) -> Option<Arc<ShuangpinProfile>> {
        self.sp_profile.borrow().clone()
    }

    pub fn set_shuangpin_profile(&self, profile: Option<Arc<ShuangpinProfile>>) {
        *self.sp_profile.borrow_mut() = profile;
        self.option_changed();
    }

    pub fn correction_profile(&self) -> Option<Arc<PinyinCorrectionProfile>> {
        self.correction_profile.borrow().clone()
    }

    pub fn set_correction_profile(&self, profile: Option<Arc<PinyinCorrectionProfile>>) {
        *self.correction_profile.borrow_mut() = profile;
        self.option_changed();
    }
}
