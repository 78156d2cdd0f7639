//! Keyboard-adjacency correction profiles.
//!
//! A correction profile re-maps every spelling in the derived table by
//! substituting each character with its neighbor keys, flagging the
//! variants `Correction`. The segmenter then recognizes slips like
//! `wimg` for `wing`; corrected candidates are demoted and marked.

use ahash::AHashMap;

use crate::data::{pinyin_map_v2, PinyinEntry, PinyinMap};
use crate::encoder::PinyinFuzzyFlags;

/// Builtin adjacency layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCorrectionLayout {
    Qwerty,
}

fn mapping_from_rows(rows: &[&str]) -> AHashMap<char, Vec<char>> {
    let mut result = AHashMap::new();
    for row in rows {
        let chars: Vec<char> = row.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            let mut items = Vec::new();
            if i > 0 {
                items.push(chars[i - 1]);
            }
            if i + 1 < chars.len() {
                items.push(chars[i + 1]);
            }
            result.insert(c, items);
        }
    }
    result
}

#[derive(Debug, Clone)]
pub struct PinyinCorrectionProfile {
    map: PinyinMap,
    correction_map: AHashMap<char, Vec<char>>,
}

impl PinyinCorrectionProfile {
    pub fn builtin(layout: BuiltinCorrectionLayout) -> Self {
        let mapping = match layout {
            BuiltinCorrectionLayout::Qwerty => {
                mapping_from_rows(&["qwertyuiop", "asdfghjkl", "zxcvbnm"])
            }
        };
        Self::from_mapping(mapping)
    }

    pub fn from_mapping(mapping: AHashMap<char, Vec<char>>) -> Self {
        let mut map = pinyin_map_v2().clone();
        if !mapping.is_empty() {
            let mut new_entries = Vec::new();
            for entry in map.iter() {
                let bytes = entry.pinyin.as_bytes();
                for (i, &b) in bytes.iter().enumerate() {
                    let Some(subs) = mapping.get(&(b as char)) else {
                        continue;
                    };
                    for &sub in subs {
                        let mut spelling = entry.pinyin.clone();
                        // adjacency stays within ascii
                        unsafe { spelling.as_bytes_mut()[i] = sub as u8 };
                        new_entries.push(PinyinEntry {
                            pinyin: spelling,
                            initial: entry.initial,
                            fin: entry.fin,
                            flags: entry.flags | PinyinFuzzyFlags::CORRECTION,
                        });
                    }
                }
            }
            for entry in new_entries {
                map.insert(entry);
            }
        }
        PinyinCorrectionProfile {
            map,
            correction_map: mapping,
        }
    }

    pub fn pinyin_map(&self) -> &PinyinMap {
        &self.map
    }

    pub fn correction_map(&self) -> &AHashMap<char, Vec<char>> {
        &self.correction_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qwerty_neighbors_are_corrections() {
        let profile = PinyinCorrectionProfile::builtin(BuiltinCorrectionLayout::Qwerty);
        // "wang" with 'a' slipped to 's': wsng
        assert!(profile
            .map
            .find("wsng")
            .any(|e| e.flags.test(PinyinFuzzyFlags::CORRECTION)));
        // original spellings survive unflagged
        assert!(profile.map.contains_exact("wang"));
    }

    #[test]
    fn empty_mapping_keeps_table_as_is() {
        let profile = PinyinCorrectionProfile::from_mapping(AHashMap::new());
        assert!(profile.map.contains_exact("zhong"));
        assert!(!profile.map.contains("zhomg"));
    }
}
