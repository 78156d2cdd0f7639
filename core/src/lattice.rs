//! Word lattice over a segment graph.
//!
//! Lattice nodes live in an arena owned by the lattice for the duration
//! of a decode; links between nodes are arena indices, and the buckets
//! map a segment-graph [`NodeId`] (the word's end node) to the nodes
//! ending there. The synthetic end-of-sentence node lives in its own
//! bucket.

use ahash::{AHashMap, AHashSet};

use crate::model::{State, WordIndex};
use crate::segment::{NodeId, SegmentPath};

/// Index of a lattice node inside its lattice's arena.
pub type LatticeNodeId = usize;

#[derive(Debug, Clone)]
pub struct LatticeNode<P> {
    pub(crate) word: String,
    pub(crate) idx: WordIndex,
    pub(crate) path: SegmentPath,
    pub(crate) from: Option<usize>,
    pub(crate) to: Option<usize>,
    pub(crate) state: State,
    pub(crate) cost: f32,
    pub(crate) score: f32,
    pub(crate) prev: Option<LatticeNodeId>,
    pub(crate) payload: P,
}

impl<P> LatticeNode<P> {
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn idx(&self) -> WordIndex {
        self.idx
    }

    /// Byte offsets of the segment-graph nodes this word spans.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Start offset; `None` only for the begin-of-sentence node.
    pub fn from(&self) -> Option<usize> {
        self.from
    }

    /// End offset; `None` only for the end-of-sentence node.
    pub fn to(&self) -> Option<usize> {
        self.to
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Best cumulative score reaching this node, set by the forward pass.
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn prev(&self) -> Option<LatticeNodeId> {
        self.prev
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

/// One word of a materialized sentence candidate.
#[derive(Debug, Clone)]
pub struct SentenceWord<P> {
    pub word: String,
    pub idx: WordIndex,
    pub from: usize,
    pub to: usize,
    pub path: SegmentPath,
    pub score: f32,
    pub payload: P,
}

/// A ranked sentence: its words and the cumulative score.
#[derive(Debug, Clone)]
pub struct SentenceResult<P> {
    sentence: Vec<SentenceWord<P>>,
    score: f32,
}

impl<P> SentenceResult<P> {
    pub fn new(sentence: Vec<SentenceWord<P>>, score: f32) -> Self {
        SentenceResult { sentence, score }
    }

    pub fn sentence(&self) -> &[SentenceWord<P>] {
        &self.sentence
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn adjust_score(&mut self, delta: f32) {
        self.score += delta;
    }

    pub fn size(&self) -> usize {
        self.sentence.len()
    }

    /// Surface string of the whole sentence.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for w in &self.sentence {
            out.push_str(&w.word);
        }
        out
    }
}

#[derive(Debug)]
pub struct Lattice<P> {
    arena: Vec<LatticeNode<P>>,
    buckets: AHashMap<NodeId, Vec<LatticeNodeId>>,
    /// Bucket for the synthetic end-of-sentence node.
    eos: Vec<LatticeNodeId>,
    nbests: Vec<SentenceResult<P>>,
}

impl<P: Clone> Default for Lattice<P> {
    fn default() -> Self {
        Lattice::new()
    }
}

impl<P: Clone> Lattice<P> {
    pub fn new() -> Self {
        Lattice {
            arena: Vec::new(),
            buckets: AHashMap::new(),
            eos: Vec::new(),
            nbests: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.buckets.clear();
        self.eos.clear();
        self.nbests.clear();
    }

    pub fn node(&self, id: LatticeNodeId) -> &LatticeNode<P> {
        &self.arena[id]
    }

    pub(crate) fn node_mut(&mut self, id: LatticeNodeId) -> &mut LatticeNode<P> {
        &mut self.arena[id]
    }

    /// Lattice nodes ending at the given segment-graph node.
    pub fn nodes(&self, node: NodeId) -> &[LatticeNodeId] {
        self.buckets.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.buckets.contains_key(&node)
    }

    pub(crate) fn bucket_keys(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.buckets.keys().copied()
    }

    pub(crate) fn eos_nodes(&self) -> &[LatticeNodeId] {
        &self.eos
    }

    pub(crate) fn push_node(&mut self, node: LatticeNode<P>, key: Option<NodeId>) -> LatticeNodeId {
        let id = self.arena.len();
        self.arena.push(node);
        match key {
            Some(key) => self.buckets.entry(key).or_default().push(id),
            None => self.eos.push(id),
        }
        id
    }

    pub(crate) fn clear_eos(&mut self) {
        self.eos.clear();
    }

    pub(crate) fn sort_bucket_by_score(&mut self, key: Option<NodeId>) {
        let arena = &self.arena;
        let bucket = match key {
            Some(key) => match self.buckets.get_mut(&key) {
                Some(b) => b,
                None => return,
            },
            None => &mut self.eos,
        };
        bucket.sort_by(|&a, &b| {
            arena[b]
                .score
                .partial_cmp(&arena[a].score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Drop the buckets of discarded segment-graph nodes. Arena slots
    /// referenced by surviving backtraces stay alive until `clear`.
    pub fn discard_node(&mut self, nodes: &AHashSet<NodeId>) {
        for id in nodes {
            self.buckets.remove(id);
        }
    }

    pub(crate) fn clear_nbests(&mut self) {
        self.nbests.clear();
    }

    pub(crate) fn push_nbest(&mut self, result: SentenceResult<P>) {
        self.nbests.push(result);
    }

    pub fn sentence_size(&self) -> usize {
        self.nbests.len()
    }

    pub fn sentence(&self, idx: usize) -> &SentenceResult<P> {
        &self.nbests[idx]
    }

    /// Materialize the sentence ending at `id` by walking the forward
    /// backtrace; `adjust` is added to the reported score.
    pub fn backtrace(&self, id: LatticeNodeId, adjust: f32) -> SentenceResult<P> {
        let score = self.arena[id].score + adjust;
        let mut words = Vec::new();
        let mut cursor = Some(id);
        while let Some(at) = cursor {
            let node = &self.arena[at];
            if let (Some(from), Some(to)) = (node.from, node.to) {
                words.push(SentenceWord {
                    word: node.word.clone(),
                    idx: node.idx,
                    from,
                    to,
                    path: node.path.clone(),
                    score: node.score,
                    payload: node.payload.clone(),
                });
            }
            cursor = node.prev;
        }
        words.reverse();
        SentenceResult::new(words, score)
    }

    /// True when any node along the backtrace from `id` satisfies the
    /// predicate.
    pub fn any_on_path(&self, id: LatticeNodeId, pred: impl Fn(&LatticeNode<P>) -> bool) -> bool {
        let mut cursor = Some(id);
        while let Some(at) = cursor {
            let node = &self.arena[at];
            if pred(node) {
                return true;
            }
            cursor = node.prev;
        }
        false
    }

    /// Surface string of the backtrace ending at `id` (the "full word"
    /// of a mid-lattice phrase).
    pub fn full_word(&self, id: LatticeNodeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(at) = cursor {
            let node = &self.arena[at];
            parts.push(node.word.as_str());
            cursor = node.prev;
        }
        parts.reverse();
        parts.concat()
    }
}
