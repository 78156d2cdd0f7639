//! Segment graph: a DAG over byte offsets of the raw keystroke buffer.
//!
//! Slot `i` holds at most one node for byte offset `i`; edges always go
//! from a smaller offset to a larger one and label the text in between
//! (one plausible syllable / code segment). Nodes carry a
//! process-unique [`NodeId`] so caches can key on node identity without
//! relying on addresses, and `merge` reports exactly which ids were
//! discarded.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashSet;

/// Stable identity of a segment-graph node, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    fn alloc() -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A path through the graph as a list of node byte offsets.
pub type SegmentPath = Vec<usize>;

#[derive(Debug)]
pub struct SegmentNode {
    id: NodeId,
    index: usize,
    nexts: Vec<usize>,
    prevs: Vec<usize>,
}

impl SegmentNode {
    fn new(index: usize) -> SegmentNode {
        SegmentNode {
            id: NodeId::alloc(),
            index,
            nexts: Vec::new(),
            prevs: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn nexts(&self) -> &[usize] {
        &self.nexts
    }

    pub fn prevs(&self) -> &[usize] {
        &self.prevs
    }
}

#[derive(Debug)]
pub struct SegmentGraph {
    data: String,
    nodes: Vec<Option<SegmentNode>>,
}

impl SegmentGraph {
    pub fn new(data: String) -> SegmentGraph {
        let mut graph = SegmentGraph {
            nodes: Vec::new(),
            data,
        };
        graph.nodes.resize_with(graph.data.len() + 1, || None);
        if !graph.data.is_empty() {
            let end = graph.data.len();
            graph.nodes[end] = Some(SegmentNode::new(end));
        }
        graph.nodes[0] = Some(SegmentNode::new(0));
        graph
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Length of the underlying byte buffer.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn start(&self) -> &SegmentNode {
        self.node(0).expect("graph always has a start node")
    }

    pub fn end(&self) -> &SegmentNode {
        self.node(self.data.len()).expect("graph always has an end node")
    }

    pub fn node(&self, idx: usize) -> Option<&SegmentNode> {
        self.nodes.get(idx).and_then(|slot| slot.as_ref())
    }

    pub fn node_id(&self, idx: usize) -> Option<NodeId> {
        self.node(idx).map(|n| n.id)
    }

    pub fn segment(&self, from: usize, to: usize) -> &str {
        &self.data[from..to]
    }

    fn ensure_node(&mut self, idx: usize) -> &mut SegmentNode {
        if self.nodes[idx].is_none() {
            self.nodes[idx] = Some(SegmentNode::new(idx));
        }
        self.nodes[idx].as_mut().unwrap()
    }

    /// Add an edge `from -> to`, creating the nodes as needed.
    pub fn add_next(&mut self, from: usize, to: usize) {
        assert!(from < to);
        assert!(to <= self.data.len());
        self.ensure_node(to);
        let node = self.ensure_node(from);
        if !node.nexts.contains(&to) {
            node.nexts.push(to);
        }
        let node = self.nodes[to].as_mut().unwrap();
        if !node.prevs.contains(&from) {
            node.prevs.push(from);
        }
    }

    /// Visit nodes reachable from `from` in ascending index order, so
    /// every predecessor is seen before its successors. Returning false
    /// from the callback aborts the walk.
    pub fn bfs(&self, from: usize, mut callback: impl FnMut(&SegmentGraph, usize) -> bool) -> bool {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(from));
        let mut visited = vec![false; self.nodes.len()];
        while let Some(Reverse(idx)) = heap.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            if !callback(self, idx) {
                return false;
            }
            if let Some(node) = self.node(idx) {
                for &next in &node.nexts {
                    heap.push(Reverse(next));
                }
            }
        }
        true
    }

    /// Enumerate every start-to-end path; the callback receives the end
    /// offsets of the path's segments.
    pub fn dfs(&self, mut callback: impl FnMut(&SegmentGraph, &[usize]) -> bool) -> bool {
        let mut path = Vec::new();
        self.dfs_helper(&mut path, 0, &mut callback)
    }

    fn dfs_helper(
        &self,
        path: &mut Vec<usize>,
        start: usize,
        callback: &mut impl FnMut(&SegmentGraph, &[usize]) -> bool,
    ) -> bool {
        if start == self.data.len() {
            return callback(self, path);
        }
        let Some(node) = self.node(start) else {
            return true;
        };
        let nexts = node.nexts.clone();
        for next in nexts {
            path.push(next);
            if !self.dfs_helper(path, next, callback) {
                return false;
            }
            path.pop();
        }
        true
    }

    /// Hop count to the end node following first edges. Not necessarily
    /// the shortest path.
    pub fn distance_to_end(&self, mut idx: usize) -> usize {
        let end = self.data.len();
        let mut distance = 0;
        while idx != end {
            idx = self.node(idx).expect("interior node")
                .nexts
                .first()
                .copied()
                .expect("interior nodes reach the end");
            distance += 1;
        }
        distance
    }

    pub fn is_list(&self) -> bool {
        let mut idx = 0;
        let end = self.data.len();
        while idx != end {
            let Some(node) = self.node(idx) else {
                return false;
            };
            if node.nexts.len() != 1 {
                return false;
            }
            idx = node.nexts[0];
        }
        true
    }

    /// Every interior node must be reachable from start and reach end.
    pub fn check_graph(&self) -> bool {
        let mut all: AHashSet<usize> = AHashSet::new();
        for i in 0..self.data.len() {
            if let Some(node) = self.node(i) {
                if node.nexts.is_empty() && i != self.data.len() {
                    return false;
                }
                all.insert(i);
            }
        }
        if self.node(self.data.len()).is_some() {
            all.insert(self.data.len());
        }
        self.bfs(0, |_, idx| {
            all.remove(&idx);
            true
        });
        all.is_empty()
    }

    /// Longest structurally common prefix with `other`: the smallest
    /// node index whose edge fan-out or labels differ, or `len + 1`
    /// when the graphs are identical.
    fn common_prefix(&self, other: &SegmentGraph) -> usize {
        let mut heap = BinaryHeap::new();
        heap.push(Reverse(0usize));
        let mut visited = vec![false; self.nodes.len().max(1)];
        while let Some(Reverse(idx)) = heap.pop() {
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            let (old, now) = match (self.node(idx), other.node(idx)) {
                (Some(a), Some(b)) => (a, b),
                _ => return idx,
            };
            if old.nexts.len() != now.nexts.len() {
                return idx;
            }
            for (&a, &b) in old.nexts.iter().zip(now.nexts.iter()) {
                if a != b || self.segment(idx, a) != other.segment(idx, b) {
                    return idx;
                }
            }
            for &a in &old.nexts {
                heap.push(Reverse(a));
            }
        }
        self.data.len() + 1
    }

    /// Replace this graph's contents with `other`, reusing the longest
    /// common structural prefix. Every node that is dropped (from the
    /// old suffix, or orphaned slots of `other`'s prefix) is reported
    /// through `discard` so caches keyed on [`NodeId`] can invalidate.
    pub fn merge(&mut self, mut other: SegmentGraph, discard: impl FnOnce(&AHashSet<NodeId>)) {
        let since = self.common_prefix(&other);
        let mut dropped: AHashSet<NodeId> = AHashSet::new();
        for slot in self.nodes.iter().skip(since) {
            if let Some(node) = slot {
                dropped.insert(node.id);
            }
        }

        let new_len = other.data.len() + 1;
        self.data = std::mem::take(&mut other.data);
        if self.nodes.len() < new_len {
            self.nodes.resize_with(new_len, || None);
        } else {
            self.nodes.truncate(new_len);
        }
        for i in since..new_len {
            self.nodes[i] = other.nodes[i].take();
        }

        discard(&dropped);
    }

    /// Cut the buffer and graph down to `idx` bytes.
    pub fn remove_suffix_from(&mut self, idx: usize) {
        if idx >= self.data.len() {
            return;
        }

        let mut at = self.data.len();
        while at != 0 && self.node(at).map_or(false, |n| n.index > idx) {
            at = self.node(at).expect("walked node exists").prevs[0];
        }

        self.data.truncate(idx);
        let new_len = self.data.len() + 1;
        self.nodes.truncate(new_len);
        for slot in self.nodes.iter_mut() {
            if let Some(node) = slot {
                node.nexts.retain(|&n| n < new_len);
                node.prevs.retain(|&p| p < new_len);
            }
        }
        if self.data.is_empty() {
            return;
        }
        if self.node(at).map_or(false, |n| n.index == idx) {
            return;
        }
        let end = self.data.len();
        self.nodes[end] = Some(SegmentNode::new(end));
        self.add_next(at, end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph(text: &str, cuts: &[usize]) -> SegmentGraph {
        let mut g = SegmentGraph::new(text.to_string());
        let mut prev = 0;
        for &c in cuts {
            g.add_next(prev, c);
            prev = c;
        }
        g
    }

    #[test]
    fn start_and_end_always_exist() {
        let g = SegmentGraph::new(String::new());
        assert_eq!(g.start().index(), 0);
        assert_eq!(g.end().index(), 0);

        let g = line_graph("nihao", &[2, 5]);
        assert_eq!(g.end().index(), 5);
        assert!(g.check_graph());
        assert!(g.is_list());
    }

    #[test]
    fn segment_returns_labels() {
        let g = line_graph("nihao", &[2, 5]);
        assert_eq!(g.segment(0, 2), "ni");
        assert_eq!(g.segment(2, 5), "hao");
    }

    #[test]
    fn bfs_visits_in_index_order() {
        let mut g = SegmentGraph::new("xian".to_string());
        g.add_next(0, 2);
        g.add_next(2, 4);
        g.add_next(0, 4);
        let mut order = Vec::new();
        g.bfs(0, |_, idx| {
            order.push(idx);
            true
        });
        assert_eq!(order, vec![0, 2, 4]);
    }

    #[test]
    fn dfs_paths_concatenate_to_data() {
        let mut g = SegmentGraph::new("xian".to_string());
        g.add_next(0, 2);
        g.add_next(2, 4);
        g.add_next(0, 4);
        let mut paths = Vec::new();
        g.dfs(|g, path| {
            let mut s = String::new();
            let mut prev = 0;
            for &p in path {
                s.push_str(g.segment(prev, p));
                prev = p;
            }
            assert_eq!(s, "xian");
            paths.push(path.to_vec());
            true
        });
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn merge_keeps_common_prefix_nodes() {
        let mut g = line_graph("nihao", &[2, 5]);
        let kept_ids: Vec<_> = [0, 2].iter().map(|&i| g.node_id(i).unwrap()).collect();
        let old_end = g.node_id(5).unwrap();

        let mut newer = line_graph("nihaoma", &[2, 5]);
        newer.add_next(5, 7);

        let mut dropped = Vec::new();
        g.merge(newer, |set| {
            dropped.extend(set.iter().copied());
        });

        assert_eq!(g.data(), "nihaoma");
        assert!(g.check_graph());
        // prefix nodes survive with identity intact
        assert_eq!(g.node_id(0).unwrap(), kept_ids[0]);
        assert_eq!(g.node_id(2).unwrap(), kept_ids[1]);
        // the old end node was replaced by the adopted suffix
        assert!(dropped.contains(&old_end));
        assert_ne!(g.node_id(5).unwrap(), old_end);
    }

    #[test]
    fn merge_identical_graph_discards_nothing() {
        let mut g = line_graph("nihao", &[2, 5]);
        let other = line_graph("nihao", &[2, 5]);
        let mut count = 0;
        g.merge(other, |set| count = set.len());
        assert_eq!(count, 0);
        assert!(g.check_graph());
    }

    #[test]
    fn remove_suffix_truncates_and_reconnects() {
        let mut g = line_graph("nihao", &[2, 5]);
        g.remove_suffix_from(2);
        assert_eq!(g.data(), "ni");
        assert!(g.check_graph());
        assert_eq!(g.end().index(), 2);
    }
}
