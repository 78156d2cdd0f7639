//! Table-specific decoding pieces.
//!
//! Shape-code graphs are mostly linear, so the lattice sort after the
//! forward pass only happens when the start node actually fans out.
//! `graph_for_code` builds the segment graph for a code, adding the
//! per-character splits of any auto rule that covers the input.

use libhan_core::decoder::DecoderHook;
use libhan_core::SegmentGraph;

use crate::dictionary::{TableBasedDictionary, TablePayload};
use crate::rule::{TableRule, TableRuleEntryFlag, TableRuleFlag};

pub struct TableDecoderHook;

impl DecoderHook<TablePayload> for TableDecoderHook {
    fn need_sort(&self, graph: &SegmentGraph, _node: Option<usize>) -> bool {
        graph.start().nexts().len() != 1
    }
}

/// An auto rule must take the first N codes of each character in
/// order, so the split positions are well defined.
fn usable_as_auto_rule(rule: &TableRule) -> bool {
    if rule.flag() != TableRuleFlag::LengthEqual {
        return false;
    }
    let entries: Vec<_> = rule
        .entries()
        .iter()
        .filter(|e| !e.is_placeholder())
        .collect();
    let mut at = 0usize;
    let mut current_char = 1u8;
    while at < entries.len() {
        let mut current_index = 1u8;
        let mut valid = false;
        while at < entries.len() {
            let entry = entries[at];
            if entry.character() != current_char {
                break;
            }
            if entry.flag() == TableRuleEntryFlag::FromFront
                && entry.encoding_index() == current_index
            {
                current_index += 1;
                valid = true;
            } else {
                valid = false;
                break;
            }
            at += 1;
        }
        if !valid {
            return false;
        }
        current_char += 1;
    }
    current_char == rule.phrase_length() + 1
}

fn nth_char_offset(s: &str, n: usize) -> usize {
    s.char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Segment graph for a raw code: the whole code as one edge, plus the
/// per-character split of every applicable auto rule.
pub fn graph_for_code(s: &str, dict: &TableBasedDictionary) -> SegmentGraph {
    let mut graph = SegmentGraph::new(s.to_string());
    if s.is_empty() {
        return graph;
    }
    graph.add_next(0, graph.size());
    let code_length = s.chars().count();
    if dict.has_rule() && !dict.table_options().auto_rule_set.is_empty() {
        let mut rule_names: Vec<&String> = dict.table_options().auto_rule_set.iter().collect();
        rule_names.sort();
        for rule_name in rule_names {
            let Some(rule) = dict.find_rule(rule_name) else {
                continue;
            };
            if code_length != rule.code_length() || !usable_as_auto_rule(rule) {
                continue;
            }

            let mut char_sizes = vec![0usize; rule.phrase_length() as usize];
            for entry in rule.entries().iter().filter(|e| !e.is_placeholder()) {
                let slot = &mut char_sizes[entry.character() as usize - 1];
                *slot = (*slot).max(entry.encoding_index() as usize);
            }

            let mut last_index = 0usize;
            for &char_size in &char_sizes {
                graph.add_next(
                    nth_char_offset(graph.data(), last_index),
                    nth_char_offset(graph.data(), last_index + char_size),
                );
                last_index += char_size;
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::TableFormat;
    use crate::options::TableOptions;

    fn dict_with_auto_rule() -> TableBasedDictionary {
        let text = "\
KeyCode=abcdefghijklmnopqrstuvwxy
Length=4
[Rule]
e2=p11+p12+p21+p22
[Data]
aabb 测
ccdd 好
";
        let mut dict = TableBasedDictionary::new();
        dict.load(&mut text.as_bytes(), TableFormat::Text).unwrap();
        let mut options = TableOptions::default();
        options.auto_rule_set.insert("e2".to_string());
        dict.set_table_options(options);
        dict
    }

    #[test]
    fn e2_rule_is_usable_as_auto_rule() {
        let rule = TableRule::parse("e2=p11+p12+p21+p22", 4).unwrap();
        assert!(usable_as_auto_rule(&rule));
        // from-back entries cannot drive a split
        let rule = TableRule::parse("e2=p11+p12+p21+n11", 4).unwrap();
        assert!(!usable_as_auto_rule(&rule));
    }

    #[test]
    fn graph_gets_rule_split() {
        let dict = dict_with_auto_rule();
        let graph = graph_for_code("aacc", &dict);
        assert!(graph.check_graph());
        let start = graph.node(0).unwrap();
        assert!(start.nexts().contains(&4), "whole-code edge");
        assert!(start.nexts().contains(&2), "rule split edge");
    }

    #[test]
    fn short_code_is_one_edge() {
        let dict = dict_with_auto_rule();
        let graph = graph_for_code("aab", &dict);
        assert!(graph.is_list());
    }
}
