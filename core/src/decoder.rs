//! Lattice decoding: build, forward viterbi, backward N-best.
//!
//! `decode` drives the dictionary matcher over a segment graph, prunes
//! each `(start, end)` frame to the best entries, runs a beam-limited
//! forward pass selecting the optimal predecessor per lattice node, and
//! finally extracts N-best alternatives with a best-first backward
//! search over the scored lattice.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::dictionary::{Dictionary, MatchedWord};
use crate::lattice::{Lattice, LatticeNode, LatticeNodeId, SentenceResult, SentenceWord};
use crate::model::{LanguageModelBase, State, WordIndex, INVALID_WORD_INDEX};
use crate::segment::{NodeId, SegmentGraph};

/// Hard cap on pops of the backward best-first queue.
pub const MAX_BACKWARD_SEARCH_SIZE: usize = 10000;

pub const BEAM_SIZE_DEFAULT: usize = 20;
pub const FRAME_SIZE_DEFAULT: usize = 200;

#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    pub nbest: usize,
    /// Prune partials scoring worse than the best by more than this.
    pub max_distance: f32,
    /// Drop backward edges whose forward score falls below this.
    pub min_path: f32,
    pub beam_size: usize,
    pub frame_size: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        DecodeParams {
            nbest: 1,
            max_distance: f32::MAX,
            min_path: -f32::MAX,
            beam_size: BEAM_SIZE_DEFAULT,
            frame_size: FRAME_SIZE_DEFAULT,
        }
    }
}

/// Per-input-method customization points of the decoder.
pub trait DecoderHook<P> {
    /// Whether the lattice bucket of `node` (None: end of sentence)
    /// should be sorted by score after the forward step.
    fn need_sort(&self, _graph: &SegmentGraph, _node: Option<usize>) -> bool {
        true
    }

    /// Gatekeeper for freshly matched words; returning false drops the
    /// node. `only_path` is true when this is the first entry of its
    /// frame.
    fn accept(
        &self,
        _graph: &SegmentGraph,
        _model: &dyn LanguageModelBase,
        _word: &str,
        _idx: WordIndex,
        _path: &[usize],
        _payload: &P,
        _only_path: bool,
    ) -> bool {
        true
    }
}

/// Hook with the default behavior on both counts.
pub struct DefaultDecoderHook;

impl<P> DecoderHook<P> for DefaultDecoderHook {}

/// Decode `graph` into `lattice`. Returns false when no path of the
/// graph reaches the end node with at least one dictionary word; the
/// lattice is left consistent either way.
#[allow(clippy::too_many_arguments)]
pub fn decode<D: Dictionary>(
    lattice: &mut Lattice<D::Payload>,
    dict: &D,
    model: &dyn LanguageModelBase,
    graph: &SegmentGraph,
    params: &DecodeParams,
    begin_state: State,
    helper: Option<&mut D::Helper>,
    hook: &dyn DecoderHook<D::Payload>,
) -> bool {
    lattice.clear_nbests();
    lattice.clear_eos();
    // Segment-graph nodes that already carry lattice entries keep them.
    let ignore: AHashSet<NodeId> = lattice.bucket_keys().collect();

    let t0 = Instant::now();
    if !build_lattice(
        lattice, dict, model, graph, params.frame_size, begin_state, &ignore, helper, hook,
    ) {
        return false;
    }
    debug!(elapsed = ?t0.elapsed(), "build lattice");
    forward_search(lattice, model, graph, &ignore, params.beam_size, hook);
    debug!(elapsed = ?t0.elapsed(), "forward search");
    backward_search(lattice, model, graph, params);
    debug!(elapsed = ?t0.elapsed(), "backward search");
    true
}

#[allow(clippy::too_many_arguments)]
fn build_lattice<D: Dictionary>(
    lattice: &mut Lattice<D::Payload>,
    dict: &D,
    model: &dyn LanguageModelBase,
    graph: &SegmentGraph,
    frame_size: usize,
    begin_state: State,
    ignore: &AHashSet<NodeId>,
    helper: Option<&mut D::Helper>,
    hook: &dyn DecoderHook<D::Payload>,
) -> bool {
    let start_key = graph.node_id(0).expect("graph has a start node");
    if !lattice.contains(start_key) {
        lattice.push_node(
            LatticeNode {
                word: String::new(),
                idx: model.begin_sentence(),
                path: vec![0],
                from: None,
                to: Some(0),
                state: begin_state,
                cost: 0.0,
                score: 0.0,
                prev: None,
                payload: D::Payload::default(),
            },
            Some(start_key),
        );
    }

    let mut frames: AHashMap<(usize, usize), Vec<LatticeNode<D::Payload>>> = AHashMap::new();
    {
        let mut callback = |mut matched: MatchedWord<D::Payload>| {
            if matched.idx == INVALID_WORD_INDEX {
                matched.idx = model.index(&matched.word);
            }
            let from = *matched.path.first().expect("matched path is never empty");
            let to = *matched.path.last().expect("matched path is never empty");
            let frame_key = (from, to);
            let only_path = frames.get(&frame_key).map_or(true, Vec::is_empty);
            if !hook.accept(
                graph,
                model,
                &matched.word,
                matched.idx,
                &matched.path,
                &matched.payload,
                only_path,
            ) {
                return true;
            }
            let apply_frame_size = from != 0 && frame_size > 0;
            let frame = frames.entry(frame_key).or_default();
            frame.push(LatticeNode {
                word: matched.word,
                idx: matched.idx,
                from: Some(from),
                to: Some(to),
                path: matched.path,
                state: model.null_state(),
                cost: matched.adjust,
                score: 0.0,
                prev: None,
                payload: matched.payload,
            });
            if !apply_frame_size {
                return true;
            }
            if frame.len() == frame_size {
                for node in frame.iter_mut() {
                    // Cache the standalone score for pruning.
                    node.score = model.single_word_score(&node.word) + node.cost;
                }
            } else if frame.len() == frame_size + 1 {
                let last = frame.len() - 1;
                frame[last].score = model.single_word_score(&frame[last].word) + frame[last].cost;
                let mut min_i = 0;
                for i in 1..last {
                    if frame[i].score < frame[min_i].score {
                        min_i = i;
                    }
                }
                if frame[last].score > frame[min_i].score {
                    frame.swap(min_i, last);
                }
                frame.pop();
            }
            true
        };
        dict.match_prefix(graph, ignore, helper, &mut callback);
    }

    for ((_, to), nodes) in frames {
        let key = graph.node_id(to).expect("matched paths end on graph nodes");
        for node in nodes {
            lattice.push_node(node, Some(key));
        }
    }

    let end_key = graph.node_id(graph.size()).expect("graph has an end node");
    if !lattice.contains(end_key) {
        return false;
    }

    lattice.push_node(
        LatticeNode {
            word: String::new(),
            idx: model.end_sentence(),
            path: vec![graph.size()],
            from: Some(graph.size()),
            to: None,
            state: model.null_state(),
            cost: 0.0,
            score: 0.0,
            prev: None,
            payload: D::Payload::default(),
        },
        None,
    );
    true
}

fn forward_search<P: Clone>(
    lattice: &mut Lattice<P>,
    model: &dyn LanguageModelBase,
    graph: &SegmentGraph,
    ignore: &AHashSet<NodeId>,
    beam_size: usize,
    hook: &dyn DecoderHook<P>,
) {
    // Unknown-word expansions from the same predecessor all score the
    // same; share one computation per predecessor offset.
    let mut unknown_cache: AHashMap<usize, (f32, LatticeNodeId, State)> = AHashMap::new();

    let update_bucket =
        |lattice: &mut Lattice<P>,
         unknown_cache: &mut AHashMap<usize, (f32, LatticeNodeId, State)>,
         ids: Vec<LatticeNodeId>| {
            for id in ids {
                let (word, idx, cost, from_offset) = {
                    let node = lattice.node(id);
                    (
                        node.word().to_string(),
                        node.idx(),
                        node.cost(),
                        node.from().expect("forward pass never visits bos"),
                    )
                };
                let is_unknown = model.is_unknown(idx, &word);
                let mut best: Option<(f32, LatticeNodeId, State)> = if is_unknown {
                    unknown_cache.get(&from_offset).cloned()
                } else {
                    None
                };
                if best.is_none() {
                    let from_key = match graph.node_id(from_offset) {
                        Some(key) => key,
                        None => continue,
                    };
                    let parents = lattice.nodes(from_key);
                    if parents.is_empty() {
                        continue;
                    }
                    let search = if beam_size > 0 {
                        beam_size.min(parents.len())
                    } else {
                        parents.len()
                    };
                    let mut max_score = -f32::MAX;
                    let mut max_node = None;
                    let mut max_state = State::default();
                    for &pid in &parents[..search] {
                        let parent = lattice.node(pid);
                        let mut out = State::default();
                        let score = parent.score()
                            + model.score(parent.state(), &word, idx, &mut out);
                        if score > max_score {
                            max_score = score;
                            max_node = Some(pid);
                            max_state = out;
                        }
                    }
                    let Some(max_node) = max_node else {
                        continue;
                    };
                    best = Some((max_score, max_node, max_state));
                    if is_unknown {
                        unknown_cache.insert(from_offset, best.clone().unwrap());
                    }
                }
                let (score, prev, state) = best.unwrap();
                let node = lattice.node_mut(id);
                node.score = score + node.cost;
                node.prev = Some(prev);
                node.state = state;
            }
        };

    graph.bfs(0, |g, offset| {
        if offset == 0 {
            return true;
        }
        let Some(key) = g.node_id(offset) else {
            return true;
        };
        if ignore.contains(&key) || !lattice.contains(key) {
            return true;
        }
        let ids = lattice.nodes(key).to_vec();
        update_bucket(lattice, &mut unknown_cache, ids);
        if hook.need_sort(g, Some(offset)) {
            lattice.sort_bucket_by_score(Some(key));
        }
        true
    });

    let eos_ids = lattice.eos_nodes().to_vec();
    update_bucket(lattice, &mut unknown_cache, eos_ids);
    if hook.need_sort(graph, None) {
        lattice.sort_bucket_by_score(None);
    }
}

struct NBestNode {
    node: LatticeNodeId,
    /// Accumulated backward cost.
    gn: f32,
    /// gn plus the node's forward score.
    f: f32,
    next: Option<Rc<NBestNode>>,
}

struct QueueItem(Rc<NBestNode>);

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.0.f == other.0.f
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .f
            .partial_cmp(&other.0.f)
            .unwrap_or(Ordering::Equal)
    }
}

fn backward_search<P: Clone>(
    lattice: &mut Lattice<P>,
    model: &dyn LanguageModelBase,
    graph: &SegmentGraph,
    params: &DecodeParams,
) {
    let eos_id = lattice.eos_nodes()[0];
    let best = lattice.backtrace(eos_id, 0.0);
    lattice.push_nbest(best);

    if params.nbest <= 1 {
        return;
    }

    let start_key = graph.node_id(0).expect("graph has a start node");
    let bos_id = lattice.nodes(start_key)[0];
    let eos_score = lattice.node(eos_id).score();

    let concat = |lattice: &Lattice<P>, head: &NBestNode| {
        let mut text = String::new();
        let mut cursor: Option<&NBestNode> = Some(head);
        while let Some(nb) = cursor {
            text.push_str(lattice.node(nb.node).word());
            cursor = nb.next.as_deref();
        }
        text
    };

    let mut dup: AHashSet<String> = AHashSet::new();
    dup.insert(lattice.sentence(0).text());

    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::new();
    let mut results: BinaryHeap<QueueItem> = BinaryHeap::new();
    queue.push(QueueItem(Rc::new(NBestNode {
        node: eos_id,
        gn: 0.0,
        f: -f32::MAX,
        next: None,
    })));
    let mut accepted = 0usize;

    'search: while let Some(QueueItem(nb)) = queue.pop() {
        if nb.node == bos_id {
            let sentence = concat(lattice, &nb);
            if dup.contains(&sentence) {
                continue;
            }
            if eos_score - nb.f > params.max_distance {
                break;
            }
            results.push(QueueItem(nb.clone()));
            if results.len() >= params.nbest {
                break;
            }
            dup.insert(sentence);
        } else {
            if accepted >= MAX_BACKWARD_SEARCH_SIZE {
                continue;
            }
            let (word, idx, cost, from_offset) = {
                let node = lattice.node(nb.node);
                (
                    node.word().to_string(),
                    node.idx(),
                    node.cost(),
                    node.from().expect("backward search never expands bos"),
                )
            };
            let Some(from_key) = graph.node_id(from_offset) else {
                continue;
            };
            for &fid in lattice.nodes(from_key) {
                let parent_node = lattice.node(fid);
                let mut out = State::default();
                let score = model.score(parent_node.state(), &word, idx, &mut out) + cost;
                if fid != bos_id && score < params.min_path {
                    continue;
                }
                let gn = score + nb.gn;
                let parent = Rc::new(NBestNode {
                    node: fid,
                    gn,
                    f: gn + parent_node.score(),
                    next: Some(nb.clone()),
                });
                if eos_score - nb.gn <= params.max_distance {
                    queue.push(QueueItem(parent));
                    accepted += 1;
                    if accepted >= MAX_BACKWARD_SEARCH_SIZE {
                        continue 'search;
                    }
                }
            }
        }
    }

    while let Some(QueueItem(nb)) = results.pop() {
        let mut words = Vec::new();
        let mut cursor = nb.next.as_deref(); // skip bos
        while let Some(item) = cursor {
            let node = lattice.node(item.node);
            if let (Some(from), Some(to)) = (node.from(), node.to()) {
                words.push(SentenceWord {
                    word: node.word().to_string(),
                    idx: node.idx(),
                    from,
                    to,
                    path: node.path().to_vec(),
                    score: node.score(),
                    payload: node.payload().clone(),
                });
            }
            cursor = item.next.as_deref();
        }
        let result = SentenceResult::new(words, nb.f);
        lattice.push_nbest(result);
    }
}
