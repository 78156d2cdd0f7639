//! End-to-end decoding over a toy syllable dictionary.

use std::sync::Arc;

use ahash::AHashSet;
use libhan_core::decoder::{decode, DecodeParams, DefaultDecoderHook};
use libhan_core::{
    Dictionary, LanguageModel, LanguageModelBase, Lattice, MatchCallback, MatchedWord, NGramModel,
    NodeId, SegmentGraph, UserLanguageModel,
};

/// Maps segment text (joined with `'`) to scored words.
struct ToyDict {
    entries: Vec<(&'static str, &'static str, f32)>,
}

impl ToyDict {
    fn lookup(&self, key: &str) -> Vec<(&'static str, f32)> {
        self.entries
            .iter()
            .filter(|(k, _, _)| *k == key)
            .map(|(_, w, c)| (*w, *c))
            .collect()
    }
}

impl Dictionary for ToyDict {
    type Payload = ();
    type Helper = ();

    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        ignore: &AHashSet<NodeId>,
        _helper: Option<&mut ()>,
        callback: &mut MatchCallback<'_, ()>,
    ) {
        // Enumerate every contiguous sub-path of the graph.
        let mut stack: Vec<Vec<usize>> = (0..=graph.size())
            .filter(|&i| graph.node(i).is_some())
            .map(|i| vec![i])
            .collect();
        while let Some(path) = stack.pop() {
            let last = *path.last().unwrap();
            if let Some(node) = graph.node(last) {
                for &next in node.nexts() {
                    let mut longer = path.clone();
                    longer.push(next);
                    stack.push(longer);
                }
            }
            if path.len() < 2 {
                continue;
            }
            let end = *path.last().unwrap();
            if ignore.contains(&graph.node_id(end).unwrap()) {
                continue;
            }
            let key: Vec<&str> = path
                .windows(2)
                .map(|w| graph.segment(w[0], w[1]))
                .collect();
            let key = key.join("'");
            for (word, cost) in self.lookup(&key) {
                if !callback(MatchedWord::new(path.clone(), word.to_string(), cost, ())) {
                    return;
                }
            }
        }
    }
}

fn toy_model() -> UserLanguageModel {
    let mut data = NGramModel::new();
    data.add_word("你", -2.5);
    data.add_word("好", -2.5);
    data.add_word("你好", -2.0);
    data.add_word("尼", -4.0);
    data.set_bigram("你", "好", -0.3, 0.0);
    UserLanguageModel::new(LanguageModel::new(Arc::new(data)))
}

fn nihao_graph() -> SegmentGraph {
    let mut graph = SegmentGraph::new("nihao".to_string());
    graph.add_next(0, 2);
    graph.add_next(2, 5);
    graph
}

fn toy_dict() -> ToyDict {
    ToyDict {
        entries: vec![
            ("ni", "你", 0.0),
            ("ni", "尼", 0.0),
            ("hao", "好", 0.0),
            ("ni'hao", "你好", 0.0),
        ],
    }
}

#[test]
fn best_sentence_prefers_the_likelier_word() {
    let dict = toy_dict();
    let model = toy_model();
    let graph = nihao_graph();
    let mut lattice = Lattice::new();

    let ok = decode(
        &mut lattice,
        &dict,
        &model,
        &graph,
        &DecodeParams::default(),
        model.begin_state(),
        None,
        &DefaultDecoderHook,
    );
    assert!(ok);
    assert!(lattice.sentence_size() >= 1);
    assert_eq!(lattice.sentence(0).text(), "你好");
}

#[test]
fn nbest_yields_distinct_alternatives() {
    let dict = toy_dict();
    let model = toy_model();
    let graph = nihao_graph();
    let mut lattice = Lattice::new();

    let params = DecodeParams {
        nbest: 3,
        ..DecodeParams::default()
    };
    assert!(decode(
        &mut lattice,
        &dict,
        &model,
        &graph,
        &params,
        model.begin_state(),
        None,
        &DefaultDecoderHook,
    ));
    let mut seen = std::collections::HashSet::new();
    for i in 0..lattice.sentence_size() {
        assert!(seen.insert(lattice.sentence(i).text()), "duplicate candidate");
    }
    assert!(seen.contains("你好"));
    assert!(seen.contains("尼好"));
}

#[test]
fn unmatched_graph_fails_to_build() {
    let dict = ToyDict { entries: vec![] };
    let model = toy_model();
    let graph = nihao_graph();
    let mut lattice = Lattice::new();
    assert!(!decode(
        &mut lattice,
        &dict,
        &model,
        &graph,
        &DecodeParams::default(),
        model.begin_state(),
        None,
        &DefaultDecoderHook,
    ));
    assert_eq!(lattice.sentence_size(), 0);
}

#[test]
fn incremental_decode_reuses_existing_nodes() {
    let dict = toy_dict();
    let model = toy_model();
    let mut graph = nihao_graph();
    let mut lattice = Lattice::new();

    assert!(decode(
        &mut lattice,
        &dict,
        &model,
        &graph,
        &DecodeParams::default(),
        model.begin_state(),
        None,
        &DefaultDecoderHook,
    ));

    // Extend the input; merge discards the old end node's lattice
    // entries and decode fills in only the changed region.
    let mut newer = SegmentGraph::new("nihaoni".to_string());
    newer.add_next(0, 2);
    newer.add_next(2, 5);
    newer.add_next(5, 7);
    graph.merge(newer, |dropped| lattice.discard_node(dropped));

    assert!(decode(
        &mut lattice,
        &dict,
        &model,
        &graph,
        &DecodeParams::default(),
        model.begin_state(),
        None,
        &DefaultDecoderHook,
    ));
    assert_eq!(lattice.sentence(0).text(), "你好你");
}
