//! Pinyin encoding and the typo-tolerant segmenter.
//!
//! A syllable is an `(initial, final)` pair; encoded full pinyin is a
//! contiguous byte string of such pairs. `parse_user_pinyin` builds the
//! segment graph for raw input with single-source longest matching,
//! the trailing `a/e/g/n/o/r` ambiguity rule and optional inner-syllable
//! splits.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::ops::{BitOr, BitOrAssign};

use libhan_core::{Error, Result, SegmentGraph};

use crate::correction::PinyinCorrectionProfile;
use crate::data::{self, PinyinMap};
use crate::shuangpin::ShuangpinProfile;

pub const MAX_PINYIN_LENGTH: usize = 6;

/// Equivalence classes accepted on top of exact spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PinyinFuzzyFlags(u32);

impl PinyinFuzzyFlags {
    pub const NONE: Self = Self(0);
    pub const NG_GN: Self = Self(1 << 0);
    pub const V_U: Self = Self(1 << 1);
    pub const AN_ANG: Self = Self(1 << 2);
    pub const EN_ENG: Self = Self(1 << 3);
    pub const IAN_IANG: Self = Self(1 << 4);
    pub const IN_ING: Self = Self(1 << 5);
    pub const U_OU: Self = Self(1 << 6);
    pub const UAN_UANG: Self = Self(1 << 7);
    pub const C_CH: Self = Self(1 << 8);
    pub const F_H: Self = Self(1 << 9);
    pub const L_N: Self = Self(1 << 10);
    pub const S_SH: Self = Self(1 << 11);
    pub const Z_ZH: Self = Self(1 << 12);
    pub const VE_UE: Self = Self(1 << 13);
    pub const INNER: Self = Self(1 << 14);
    pub const INNER_SHORT: Self = Self(1 << 15);
    pub const PARTIAL_FINAL: Self = Self(1 << 16);
    pub const PARTIAL_SP: Self = Self(1 << 17);
    pub const COMMON_TYPO: Self = Self(1 << 18);
    pub const ADVANCED_TYPO: Self = Self(1 << 19);
    pub const CORRECTION: Self = Self(1 << 20);

    /// All of `required`'s classes are enabled in `self`.
    pub fn test(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for PinyinFuzzyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign for PinyinFuzzyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.with(rhs);
    }
}

macro_rules! byte_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal,)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum $name {
            Invalid = 0,
            $($variant = $value,)*
        }

        impl $name {
            pub fn from_byte(b: u8) -> Self {
                match b {
                    $($value => Self::$variant,)*
                    _ => Self::Invalid,
                }
            }

            pub fn to_byte(self) -> u8 {
                self as u8
            }
        }
    };
}

byte_enum! {
    /// Consonant onsets, including the zero initial.
    PinyinInitial {
        B = 65, P = 66, M = 67, F = 68, D = 69, T = 70, N = 71, L = 72,
        G = 73, K = 74, H = 75, J = 76, Q = 77, X = 78, ZH = 79, CH = 80,
        SH = 81, R = 82, Z = 83, C = 84, S = 85, Y = 86, W = 87, Zero = 88,
    }
}

byte_enum! {
    /// Vowel rimes, including the zero final.
    PinyinFinal {
        A = 65, AI = 66, AN = 67, ANG = 68, AO = 69, E = 70, EI = 71,
        EN = 72, ENG = 73, ER = 74, O = 75, ONG = 76, OU = 77, I = 78,
        IA = 79, IE = 80, IAO = 81, IU = 82, IAN = 83, IN = 84, IANG = 85,
        ING = 86, IONG = 87, U = 88, UA = 89, UO = 90, UAI = 91, UI = 92,
        UAN = 93, UN = 94, UANG = 95, V = 96, VE = 97, UE = 98, NG = 99,
        Zero = 100,
    }
}

pub const FIRST_INITIAL: u8 = PinyinInitial::B as u8;
pub const LAST_INITIAL: u8 = PinyinInitial::Zero as u8;
pub const FIRST_FINAL: u8 = PinyinFinal::A as u8;
pub const LAST_FINAL: u8 = PinyinFinal::Zero as u8;

static INITIAL_STRINGS: [&str; 24] = [
    "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "j", "q", "x", "zh", "ch", "sh", "r",
    "z", "c", "s", "y", "w", "",
];

static FINAL_STRINGS: [&str; 36] = [
    "a", "ai", "an", "ang", "ao", "e", "ei", "en", "eng", "er", "o", "ong", "ou", "i", "ia", "ie",
    "iao", "iu", "ian", "in", "iang", "ing", "iong", "u", "ua", "uo", "uai", "ui", "uan", "un",
    "uang", "v", "ve", "ue", "ng", "",
];

pub fn initial_to_string(initial: PinyinInitial) -> &'static str {
    let b = initial.to_byte();
    if (FIRST_INITIAL..=LAST_INITIAL).contains(&b) {
        INITIAL_STRINGS[(b - FIRST_INITIAL) as usize]
    } else {
        ""
    }
}

pub fn string_to_initial(s: &str) -> PinyinInitial {
    for (i, candidate) in INITIAL_STRINGS.iter().enumerate() {
        if *candidate == s {
            return PinyinInitial::from_byte(FIRST_INITIAL + i as u8);
        }
    }
    PinyinInitial::Invalid
}

pub fn final_to_string(fin: PinyinFinal) -> &'static str {
    let b = fin.to_byte();
    if (FIRST_FINAL..=LAST_FINAL).contains(&b) {
        FINAL_STRINGS[(b - FIRST_FINAL) as usize]
    } else {
        ""
    }
}

pub fn string_to_final(s: &str) -> PinyinFinal {
    for (i, candidate) in FINAL_STRINGS.iter().enumerate() {
        if *candidate == s {
            return PinyinFinal::from_byte(FIRST_FINAL + i as u8);
        }
    }
    PinyinFinal::Invalid
}

pub fn is_valid_initial(b: u8) -> bool {
    (FIRST_INITIAL..=LAST_INITIAL).contains(&b)
}

pub fn is_valid_final(b: u8) -> bool {
    (FIRST_FINAL..=LAST_FINAL).contains(&b)
}

/// Whether the `(initial, final)` combination occurs in the syllable
/// inventory.
pub fn is_valid_initial_final(initial: PinyinInitial, fin: PinyinFinal) -> bool {
    if initial == PinyinInitial::Invalid || fin == PinyinFinal::Invalid {
        return false;
    }
    data::is_encoded_initial_final(
        (initial.to_byte() - FIRST_INITIAL) as usize * (LAST_FINAL - FIRST_FINAL + 1) as usize
            + (fin.to_byte() - FIRST_FINAL) as usize,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinyinSyllable {
    pub initial: PinyinInitial,
    pub fin: PinyinFinal,
}

impl PinyinSyllable {
    pub fn new(initial: PinyinInitial, fin: PinyinFinal) -> Self {
        PinyinSyllable { initial, fin }
    }

    pub fn to_spelling(self) -> String {
        let mut out = String::from(initial_to_string(self.initial));
        out.push_str(final_to_string(self.fin));
        out
    }
}

/// Use "ü" where orthography does, e.g. nü / lüe.
pub fn initial_final_to_pinyin_string(initial: PinyinInitial, fin: PinyinFinal) -> String {
    let mut result = String::from(initial_to_string(initial));
    let final_string = match fin {
        PinyinFinal::VE | PinyinFinal::V
            if initial == PinyinInitial::N || initial == PinyinInitial::L =>
        {
            if fin == PinyinFinal::VE {
                "üe"
            } else {
                "ü"
            }
        }
        _ => final_to_string(fin),
    };
    result.push_str(final_string);
    result
}

/// Per-initial final alternatives; the bool marks fuzzy-expanded pairs.
pub type MatchedPinyinSyllables = Vec<(PinyinInitial, Vec<(PinyinFinal, bool)>)>;

/// Longest prefix of `s` (bounded at 6 bytes) recognized by `map` under
/// `flags`. Complete means a real syllable, not just an initial, and
/// not one of the bare `m`/`n`/`r` spellings.
fn longest_match(s: &str, flags: PinyinFuzzyFlags, map: &PinyinMap) -> (usize, bool) {
    let mut len = s.len().min(MAX_PINYIN_LENGTH);
    while len > 0 {
        let range = &s[..len];
        if map.find(range).any(|e| flags.test(e.flags)) {
            let complete = range != "m" && range != "n" && range != "r";
            return (len, complete);
        }
        if len <= 2 && string_to_initial(range) != PinyinInitial::Invalid {
            return (len, false);
        }
        len -= 1;
    }
    (1, false)
}

/// Build the segment graph for raw pinyin input.
pub fn parse_user_pinyin(
    pinyin: String,
    profile: Option<&PinyinCorrectionProfile>,
    flags: PinyinFuzzyFlags,
) -> SegmentGraph {
    let mut graph = SegmentGraph::new(pinyin);
    let lowered = graph.data().to_ascii_lowercase();
    let map = match profile {
        Some(p) => p.pinyin_map(),
        None => data::pinyin_map(),
    };
    let bytes = lowered.as_bytes();
    let len = bytes.len();

    let mut q: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    q.push(Reverse(0));
    while let Some(Reverse(top)) = q.pop() {
        while q.peek() == Some(&Reverse(top)) {
            q.pop();
        }
        if top >= len {
            continue;
        }
        if bytes[top] == b'\'' {
            // coalesce consecutive separators into one edge
            let mut next = top;
            while next < len && bytes[next] == b'\'' {
                next += 1;
            }
            graph.add_next(top, next);
            if next < len {
                q.push(Reverse(next));
            }
            continue;
        }
        let (match_len, complete) = longest_match(&lowered[top..], flags, map);
        if !complete {
            graph.add_next(top, top + match_len);
            q.push(Reverse(top + match_len));
            continue;
        }

        // Trailing a/e/g/n/o/r may belong to the next syllable: weigh
        // both splits by total span, preferring complete continuations
        // on ties; emit both edges when truly equal.
        let matched = &lowered[top..top + match_len];
        let mut next_sizes = [0usize; 2];
        let mut n_next = 0;
        let last = matched.as_bytes()[match_len - 1];
        if match_len > 1
            && top + match_len < len
            && bytes[top + match_len] != b'\''
            && matches!(last, b'a' | b'e' | b'g' | b'n' | b'o' | b'r')
            && map.contains(&matched[..match_len - 1])
        {
            let next_match = longest_match(&lowered[top + match_len..], flags, map);
            let next_match_alt = longest_match(&lowered[top + match_len - 1..], flags, map);
            let this = (match_len + next_match.0, next_match.1);
            let alt = (match_len - 1 + next_match_alt.0, next_match_alt.1);
            if this >= alt {
                graph.add_next(top, top + match_len);
                q.push(Reverse(top + match_len));
                next_sizes[n_next] = match_len;
                n_next += 1;
            }
            if this <= alt {
                graph.add_next(top, top + match_len - 1);
                q.push(Reverse(top + match_len - 1));
                next_sizes[n_next] = match_len - 1;
                n_next += 1;
            }
        } else {
            graph.add_next(top, top + match_len);
            q.push(Reverse(top + match_len));
            next_sizes[n_next] = match_len;
            n_next += 1;
        }

        for &size in next_sizes.iter().take(n_next) {
            if size >= 3 && flags.test(PinyinFuzzyFlags::INNER) {
                if let Some(&(head, tail)) = data::INNER_SEGMENT.get(&lowered[top..top + size]) {
                    let _ = tail;
                    graph.add_next(top, top + head.len());
                    graph.add_next(top + head.len(), top + size);
                }
            }
        }
    }
    graph
}

/// Build the segment graph for shuangpin input: greedy one- or
/// two-byte steps through the profile table.
pub fn parse_user_shuangpin(
    pinyin: String,
    profile: &ShuangpinProfile,
    flags: PinyinFuzzyFlags,
) -> SegmentGraph {
    let mut graph = SegmentGraph::new(pinyin);
    let lowered = graph.data().to_ascii_lowercase();
    let bytes = lowered.as_bytes();
    let table = profile.table();

    let mut i = 0;
    while i < bytes.len() {
        let start = i;
        while i < bytes.len() && bytes[i] == b'\'' {
            i += 1;
        }
        if start != i {
            graph.add_next(start, i);
            continue;
        }
        let mut candidate = String::new();
        candidate.push(bytes[i] as char);
        if i + 1 < bytes.len() && bytes[i + 1] != b'\'' {
            candidate.push(bytes[i + 1] as char);
        }

        let mut matched_len = 0;
        while !candidate.is_empty() {
            if let Some(entries) = table.get(&candidate) {
                if entries.iter().any(|(_, f)| flags.test(*f)) {
                    matched_len = candidate.len();
                    break;
                }
            }
            candidate.pop();
        }

        if matched_len > 0 {
            graph.add_next(i, i + matched_len);
            i += matched_len;
        } else {
            graph.add_next(i, i + 1);
            i += 1;
        }
    }
    graph
}

fn get_fuzzy(
    syls: &mut MatchedPinyinSyllables,
    syl: PinyinSyllable,
    mut flags: PinyinFuzzyFlags,
) {
    // ng/gn is handled by the table itself
    let mut initials = [syl.initial, PinyinInitial::Invalid];
    let mut finals = [syl.fin, PinyinFinal::Invalid];
    let mut initial_size = 1;
    let mut final_size = 1;

    // bare z/c/s also match their retroflex sibling
    if syl.fin == PinyinFinal::Invalid {
        match syl.initial {
            PinyinInitial::C => flags |= PinyinFuzzyFlags::C_CH,
            PinyinInitial::Z => flags |= PinyinFuzzyFlags::Z_ZH,
            PinyinInitial::S => flags |= PinyinFuzzyFlags::S_SH,
            _ => {}
        }
    }

    const INITIAL_FUZZIES: [(PinyinInitial, PinyinInitial, PinyinFuzzyFlags); 5] = [
        (PinyinInitial::C, PinyinInitial::CH, PinyinFuzzyFlags::C_CH),
        (PinyinInitial::S, PinyinInitial::SH, PinyinFuzzyFlags::S_SH),
        (PinyinInitial::Z, PinyinInitial::ZH, PinyinFuzzyFlags::Z_ZH),
        (PinyinInitial::F, PinyinInitial::H, PinyinFuzzyFlags::F_H),
        (PinyinInitial::L, PinyinInitial::N, PinyinFuzzyFlags::L_N),
    ];
    for (a, b, flag) in INITIAL_FUZZIES {
        if (syl.initial == a || syl.initial == b) && flags.test(flag) {
            initials[1] = if syl.initial == a { b } else { a };
            initial_size = 2;
            break;
        }
    }

    const FINAL_FUZZIES: [(PinyinFinal, PinyinFinal, PinyinFuzzyFlags); 8] = [
        (PinyinFinal::V, PinyinFinal::U, PinyinFuzzyFlags::V_U),
        (PinyinFinal::AN, PinyinFinal::ANG, PinyinFuzzyFlags::AN_ANG),
        (PinyinFinal::EN, PinyinFinal::ENG, PinyinFuzzyFlags::EN_ENG),
        (PinyinFinal::IAN, PinyinFinal::IANG, PinyinFuzzyFlags::IAN_IANG),
        (PinyinFinal::IN, PinyinFinal::ING, PinyinFuzzyFlags::IN_ING),
        (PinyinFinal::U, PinyinFinal::OU, PinyinFuzzyFlags::U_OU),
        (PinyinFinal::UAN, PinyinFinal::UANG, PinyinFuzzyFlags::UAN_UANG),
        (PinyinFinal::VE, PinyinFinal::UE, PinyinFuzzyFlags::VE_UE),
    ];
    for (a, b, flag) in FINAL_FUZZIES {
        if (syl.fin == a || syl.fin == b) && flags.test(flag) {
            finals[1] = if syl.fin == a { b } else { a };
            final_size = 2;
            break;
        }
    }

    for i in 0..initial_size {
        for j in 0..final_size {
            let initial = initials[i];
            let fin = finals[j];
            if (i == 0 && j == 0)
                || fin == PinyinFinal::Invalid
                || is_valid_initial_final(initial, fin)
            {
                let slot = match syls.iter().position(|(ini, _)| *ini == initial) {
                    Some(p) => p,
                    None => {
                        syls.push((initial, Vec::new()));
                        syls.len() - 1
                    }
                };
                let finals_list = &mut syls[slot].1;
                if !finals_list.iter().any(|(f, _)| *f == fin) {
                    finals_list.push((fin, i > 0 || j > 0));
                }
            }
        }
    }
}

/// All `(initial, final)` readings of one segment under the fuzzy
/// flags. A lone valid initial yields `(initial, Invalid)`; unknown
/// text yields the single invalid pair.
pub fn string_to_syllables(pinyin: &str, flags: PinyinFuzzyFlags) -> MatchedPinyinSyllables {
    string_to_syllables_in(data::pinyin_map(), pinyin, flags)
}

/// [`string_to_syllables`] against an explicit spelling table, e.g. a
/// correction-augmented one.
pub fn string_to_syllables_in(
    map: &PinyinMap,
    pinyin: &str,
    flags: PinyinFuzzyFlags,
) -> MatchedPinyinSyllables {
    let mut result: MatchedPinyinSyllables = Vec::new();
    let lowered = pinyin.to_ascii_lowercase();
    // bare m/n/r only match as initials so every dictionary final works
    if lowered != "m" && lowered != "n" && lowered != "r" {
        for entry in map.find(&lowered) {
            if flags.test(entry.flags) {
                get_fuzzy(
                    &mut result,
                    PinyinSyllable::new(entry.initial, entry.fin),
                    flags,
                );
            }
        }
    }

    let initial = string_to_initial(&lowered);
    if initial != PinyinInitial::Invalid {
        get_fuzzy(
            &mut result,
            PinyinSyllable::new(initial, PinyinFinal::Invalid),
            flags,
        );
    }

    if result.is_empty() {
        result.push((
            PinyinInitial::Invalid,
            vec![(PinyinFinal::Invalid, false)],
        ));
    }

    result
}

/// Readings of a 1-2 key shuangpin chunk through the profile table.
pub fn shuangpin_to_syllables(
    pinyin: &str,
    profile: &ShuangpinProfile,
    flags: PinyinFuzzyFlags,
) -> MatchedPinyinSyllables {
    debug_assert!(pinyin.len() <= 2);
    let lowered = pinyin.to_ascii_lowercase();
    let mut result: MatchedPinyinSyllables = Vec::new();
    if let Some(entries) = profile.table().get(&lowered) {
        for (syl, entry_flags) in entries {
            if flags.test(*entry_flags) {
                get_fuzzy(&mut result, *syl, flags);
            }
        }
    }
    if result.is_empty() {
        result.push((
            PinyinInitial::Invalid,
            vec![(PinyinFinal::Invalid, false)],
        ));
    }
    result
}

/// Canonical full-pinyin spelling of a shuangpin chunk, empty when the
/// chunk has no exact (non-fuzzy) reading.
pub fn shuangpin_to_pinyin(pinyin: &str, profile: &ShuangpinProfile) -> String {
    let syls = shuangpin_to_syllables(pinyin, profile, PinyinFuzzyFlags::NONE);
    if let Some((initial, finals)) = syls.first() {
        if let Some((fin, fuzzy)) = finals.first() {
            if !fuzzy {
                let mut out = String::from(initial_to_string(*initial));
                out.push_str(final_to_string(*fin));
                return out;
            }
        }
    }
    String::new()
}

/// Encode a quote-separated pinyin string (`ni'hao`) into initial and
/// final byte pairs. Only exact spellings are accepted.
pub fn encode_full_pinyin(pinyin: &str) -> Result<Vec<u8>> {
    encode_full_pinyin_with_flags(pinyin, PinyinFuzzyFlags::NONE)
}

/// Like [`encode_full_pinyin`] but also accepting spellings whose fuzzy
/// classes are covered by `flags`.
pub fn encode_full_pinyin_with_flags(pinyin: &str, flags: PinyinFuzzyFlags) -> Result<Vec<u8>> {
    let map = data::pinyin_map();
    let mut result = Vec::new();
    for syllable in pinyin.split('\'') {
        let entry = map
            .find(syllable)
            .find(|e| flags.test(e.flags))
            .ok_or_else(|| {
                Error::invalid_argument(format!("invalid full pinyin: {}", pinyin))
            })?;
        result.push(entry.initial.to_byte());
        result.push(entry.fin.to_byte());
    }
    Ok(result)
}

/// Encode raw user pinyin by taking the first segmentation and the
/// first exact reading of each segment. Empty when anything is off.
pub fn encode_one_user_pinyin(pinyin: String) -> Vec<u8> {
    if pinyin.is_empty() {
        return Vec::new();
    }
    let graph = parse_user_pinyin(pinyin, None, PinyinFuzzyFlags::NONE);
    let mut result = Vec::new();
    let mut index = 0;
    while let Some(node) = graph.node(index) {
        let Some(&next) = node.nexts().first() else {
            break;
        };
        let seg = graph.segment(index, next);
        index = next;
        if seg.is_empty() || seg.starts_with('\'') {
            continue;
        }
        let syls = string_to_syllables(seg, PinyinFuzzyFlags::NONE);
        if syls.is_empty() || syls[0].0 == PinyinInitial::Invalid {
            return Vec::new();
        }
        result.push(syls[0].0.to_byte());
        result.push(syls[0].1[0].0.to_byte());
    }
    result
}

pub fn is_valid_user_pinyin(data: &[u8]) -> bool {
    if data.len() % 2 != 0 {
        return false;
    }
    data.chunks(2).all(|pair| is_valid_initial(pair[0]))
}

/// Decode encoded pinyin back into a quote-separated spelling.
pub fn decode_full_pinyin(data: &[u8]) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(Error::invalid_argument("invalid pinyin key"));
    }
    let mut result = String::new();
    for (i, pair) in data.chunks(2).enumerate() {
        if i != 0 {
            result.push('\'');
        }
        result.push_str(initial_to_string(PinyinInitial::from_byte(pair[0])));
        result.push_str(final_to_string(PinyinFinal::from_byte(pair[1])));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str, flags: PinyinFuzzyFlags) -> SegmentGraph {
        parse_user_pinyin(s.to_string(), None, flags)
    }

    fn segments_of_first_path(graph: &SegmentGraph) -> Vec<String> {
        let mut out = Vec::new();
        let mut idx = 0;
        while let Some(node) = graph.node(idx) {
            let Some(&next) = node.nexts().first() else {
                break;
            };
            out.push(graph.segment(idx, next).to_string());
            idx = next;
        }
        out
    }

    #[test]
    fn encode_decode_round_trip() {
        let encoded = encode_full_pinyin("ni'hao").unwrap();
        assert_eq!(encoded.len(), 4);
        assert_eq!(decode_full_pinyin(&encoded).unwrap(), "ni'hao");
        assert!(is_valid_user_pinyin(&encoded));
    }

    #[test]
    fn every_exact_spelling_round_trips() {
        for entry in crate::data::pinyin_map().iter().filter(|e| e.flags.is_none()) {
            let encoded = encode_full_pinyin(&entry.pinyin).unwrap();
            assert_eq!(
                decode_full_pinyin(&encoded).unwrap(),
                entry.pinyin,
                "{} did not round trip",
                entry.pinyin
            );
        }
    }

    #[test]
    fn invalid_spelling_is_rejected() {
        assert!(encode_full_pinyin("nihao").is_err());
        assert!(encode_full_pinyin("xyz").is_err());
        // the relaxed variant accepts the covered fuzzy class
        assert!(encode_full_pinyin("lve").is_ok());
        assert!(encode_full_pinyin_with_flags("lue", PinyinFuzzyFlags::VE_UE).is_ok());
    }

    #[test]
    fn simple_segmentation() {
        let graph = parse("nihao", PinyinFuzzyFlags::NONE);
        assert!(graph.check_graph());
        assert_eq!(segments_of_first_path(&graph), vec!["ni", "hao"]);
    }

    #[test]
    fn separator_is_its_own_segment() {
        let graph = parse("ni''hao", PinyinFuzzyFlags::NONE);
        assert!(graph.check_graph());
        assert_eq!(segments_of_first_path(&graph), vec!["ni", "''", "hao"]);
    }

    #[test]
    fn xian_gets_both_splits() {
        // "xian" is both one syllable and xi + an
        let graph = parse("xianshi", PinyinFuzzyFlags::INNER);
        assert!(graph.check_graph());
        let node = graph.node(0).unwrap();
        assert!(node.nexts().contains(&4), "whole xian edge");
        assert!(node.nexts().contains(&2), "inner xi edge");
    }

    #[test]
    fn jinan_is_not_ji_n(){
        // separator after the match keeps jin'an as jin + an
        let graph = parse("jin'an", PinyinFuzzyFlags::NONE);
        assert_eq!(segments_of_first_path(&graph), vec!["jin", "'", "an"]);
    }

    #[test]
    fn fangan_prefers_longer_total_span() {
        // fang + an vs fan + gan: both span everything, gan is complete
        // so both edges are emitted
        let graph = parse("fangan", PinyinFuzzyFlags::NONE);
        let node = graph.node(0).unwrap();
        assert!(node.nexts().contains(&3), "fan edge");
        assert!(node.nexts().contains(&4), "fang edge");
    }

    #[test]
    fn all_parses_concatenate_to_input() {
        for input in ["nihao", "xianshi", "zhongguo", "fangan", "nva"] {
            let graph = parse(input, PinyinFuzzyFlags::INNER);
            graph.dfs(|g, path| {
                let mut s = String::new();
                let mut prev = 0;
                for &p in path {
                    s.push_str(g.segment(prev, p));
                    prev = p;
                }
                assert_eq!(s, input);
                true
            });
        }
    }

    #[test]
    fn string_to_syllables_expands_fuzzy() {
        let exact = string_to_syllables("zhong", PinyinFuzzyFlags::NONE);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].0, PinyinInitial::ZH);

        let fuzzy = string_to_syllables("zong", PinyinFuzzyFlags::Z_ZH);
        assert!(fuzzy.iter().any(|(i, _)| *i == PinyinInitial::Z));
        assert!(fuzzy.iter().any(|(i, _)| *i == PinyinInitial::ZH));
    }

    #[test]
    fn lone_initial_matches_partial() {
        let syls = string_to_syllables("zh", PinyinFuzzyFlags::NONE);
        assert!(syls
            .iter()
            .any(|(i, f)| *i == PinyinInitial::ZH && f.iter().any(|(fi, _)| *fi == PinyinFinal::Invalid)));
    }

    #[test]
    fn unknown_text_yields_invalid_pair() {
        let syls = string_to_syllables("v", PinyinFuzzyFlags::NONE);
        assert_eq!(syls.len(), 1);
        assert_eq!(syls[0].0, PinyinInitial::Invalid);
    }

    #[test]
    fn nl_use_umlaut_in_display() {
        assert_eq!(
            initial_final_to_pinyin_string(PinyinInitial::N, PinyinFinal::V),
            "nü"
        );
        assert_eq!(
            initial_final_to_pinyin_string(PinyinInitial::L, PinyinFinal::VE),
            "lüe"
        );
        assert_eq!(
            initial_final_to_pinyin_string(PinyinInitial::ZH, PinyinFinal::UANG),
            "zhuang"
        );
    }

    #[test]
    fn valid_initial_final_inventory() {
        assert!(is_valid_initial_final(PinyinInitial::ZH, PinyinFinal::UANG));
        assert!(is_valid_initial_final(PinyinInitial::Zero, PinyinFinal::A));
        assert!(!is_valid_initial_final(PinyinInitial::B, PinyinFinal::UANG));
    }
}
