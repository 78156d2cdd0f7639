//! libhan-pinyin
//!
//! Pinyin and shuangpin decoding on top of libhan-core: the syllable
//! tables and typo-tolerant segmenter, shuangpin profiles, the trie
//! dictionary with its matcher caches, and the user-facing input
//! context.
//!
//! Public API:
//! - `encoder` - syllable types, encode/decode, `parse_user_pinyin`
//! - `ShuangpinProfile` - builtin and textual double-pinyin layouts
//! - `PinyinDictionary` - system/user/extra tries with graph matching
//! - `PinyinIme` / `PinyinContext` - shared options and the session

pub mod data;
pub use data::{PinyinEntry, PinyinMap};

pub mod encoder;
pub use encoder::{
    decode_full_pinyin, encode_full_pinyin, encode_full_pinyin_with_flags, parse_user_pinyin,
    parse_user_shuangpin, string_to_syllables, MatchedPinyinSyllables, PinyinFinal,
    PinyinFuzzyFlags, PinyinInitial, PinyinSyllable,
};

pub mod correction;
pub use correction::{BuiltinCorrectionLayout, PinyinCorrectionProfile};

pub mod shuangpin;
pub use shuangpin::{ShuangpinBuiltinProfile, ShuangpinProfile};

pub mod matchstate;
pub use matchstate::PinyinMatchState;

pub mod dictionary;
pub use dictionary::{PinyinDictFlags, PinyinDictFormat, PinyinDictionary, PinyinPayload};

pub mod ime;
pub use ime::{PinyinIme, PinyinPreeditMode};

pub mod context;
pub use context::PinyinContext;
