//! libhan-table
//!
//! Shape-code ("table") input on top of libhan-core: construct-phrase
//! rules, the table dictionary with user/extra/deletion tries and
//! auto-phrase capture, the table decoder pieces and the session
//! context with auto-select.

pub mod rule;
pub use rule::{TableRule, TableRuleEntry, TableRuleEntryFlag, TableRuleFlag};

pub mod options;
pub use options::{OrderPolicy, TableOptions};

pub mod autophrase;
pub use autophrase::AutoPhraseDict;

pub mod dictionary;
pub use dictionary::{
    PhraseFlag, TableBasedDictionary, TableFormat, TableMatchMode, TablePayload,
};

pub mod decoder;
pub use decoder::{graph_for_code, TableDecoderHook};

pub mod context;
pub use context::{is_auto, is_pinyin, sentence_code, TableContext};
