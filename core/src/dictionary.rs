//! Dictionary matching contract.
//!
//! A dictionary enumerates every word whose key matches some path of
//! the segment graph, invoking a callback per hit. The callback may
//! return false to abort the whole match cooperatively. Matcher-state
//! caches are typed per dictionary (`Helper`); dictionaries that keep
//! no cache use `()`.

use ahash::AHashSet;

use crate::model::{WordIndex, INVALID_WORD_INDEX};
use crate::segment::{NodeId, SegmentGraph, SegmentPath};

/// One matched word reported to the decoder.
#[derive(Debug, Clone)]
pub struct MatchedWord<P> {
    /// Node offsets of the matched graph path, start to end.
    pub path: SegmentPath,
    pub word: String,
    /// Cost adjustment (log10) added on top of the model score.
    pub adjust: f32,
    /// Word index if the dictionary already knows it.
    pub idx: WordIndex,
    pub payload: P,
}

impl<P> MatchedWord<P> {
    pub fn new(path: SegmentPath, word: String, adjust: f32, payload: P) -> Self {
        MatchedWord {
            path,
            word,
            adjust,
            idx: INVALID_WORD_INDEX,
            payload,
        }
    }
}

pub type MatchCallback<'a, P> = dyn FnMut(MatchedWord<P>) -> bool + 'a;

pub trait Dictionary {
    /// Extra per-word data attached to lattice nodes.
    type Payload: Clone + Default;
    /// Matcher-state cache threaded through repeated matches; `()` for
    /// dictionaries that do not keep one.
    type Helper;

    /// Invoke `callback` for every word matching a path of `graph` that
    /// does not end at an ignored node. Matching aborts when the
    /// callback returns false.
    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        ignore: &AHashSet<NodeId>,
        helper: Option<&mut Self::Helper>,
        callback: &mut MatchCallback<'_, Self::Payload>,
    );
}
