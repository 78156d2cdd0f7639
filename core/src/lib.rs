//! libhan-core
//!
//! Core decoding primitives shared by the language-specific crates
//! (libhan-pinyin, libhan-table):
//!
//! - `DATrie` - editable double-array trie used as the dictionary store
//! - `SegmentGraph` - DAG over the raw keystroke buffer
//! - `Lattice` / `decode` - word lattice, forward viterbi and N-best search
//! - `NGramModel` / `LanguageModel` - static n-gram scorer with opaque states
//! - `HistoryBigram` - tiered user history with decayed pool weights
//! - `UserLanguageModel` - log-linear fusion of the two models
//! - `Prediction` - follow-word suggestions from history

pub mod datrie;
pub use datrie::{DATrie, TrieValue};

pub mod io;

pub mod segment;
pub use segment::{NodeId, SegmentGraph, SegmentNode, SegmentPath};

pub mod lattice;
pub use lattice::{Lattice, LatticeNode, LatticeNodeId, SentenceResult, SentenceWord};

pub mod model;
pub use model::{
    LanguageModel, LanguageModelBase, NGramModel, State, WordIndex, INVALID_WORD_INDEX, STATE_SIZE,
};

pub mod historybigram;
pub use historybigram::HistoryBigram;

pub mod userlanguagemodel;
pub use userlanguagemodel::UserLanguageModel;

pub mod dictionary;
pub use dictionary::{Dictionary, MatchCallback, MatchedWord};

pub mod decoder;
pub use decoder::{decode, DecodeParams, DecoderHook, DefaultDecoderHook};

pub mod prediction;
pub use prediction::Prediction;

use thiserror::Error;

/// Error kinds surfaced by load/save and explicit-argument checks.
///
/// Per-line problems in text formats are logged and skipped instead of
/// failing the whole load; a refused `type_*` call reports `false`, not
/// an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_data(msg: impl Into<String>) -> Error {
        Error::InvalidData(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Error {
        Error::InvalidArgument(msg.into())
    }
}

/// Shared numeric constants.
pub mod constants {
    /// Probability assigned to a word the static model has never seen.
    pub const UNKNOWN_PROBABILITY_PENALTY: f32 = 1.0 / 60_000_000.0;
    /// log10 of the smallest normal f32, used to cut off log-sum-exp.
    pub const MIN_FLOAT_LOG10: f32 = -38.230_81;
    /// Default mixing weight of the user history model.
    pub const USER_LANGUAGE_MODEL_USER_WEIGHT: f32 = 0.1;
    /// Decay parameter alpha for the history pools, p = 1 / (1 + alpha).
    pub const HISTORY_BIGRAM_ALPHA: f32 = 1.0;
}
