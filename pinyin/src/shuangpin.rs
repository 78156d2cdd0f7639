//! Shuangpin ("double pinyin") profiles.
//!
//! A profile maps 1-2 key sequences to candidate syllables. It is
//! derived once from a layout descriptor: builtin layouts ship as
//! (initial, final) key tables; textual descriptors use `=<zero>`,
//! `final=key`, `initial=key` and `syllable=keys` lines. The derived
//! table covers full syllables, zero-initial forms, partial inputs and
//! optional keyboard corrections.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};

use ahash::{AHashMap, AHashSet};

use libhan_core::Result;

use crate::correction::PinyinCorrectionProfile;
use crate::data::pinyin_map_v2;
use crate::encoder::{
    encode_full_pinyin, final_to_string, initial_to_string, is_valid_initial_final,
    string_to_final, string_to_initial, PinyinFinal, PinyinFuzzyFlags, PinyinInitial,
    PinyinSyllable, FIRST_FINAL, FIRST_INITIAL, LAST_FINAL, LAST_INITIAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuangpinBuiltinProfile {
    Ziranma,
    Ms,
    Ziguang,
    Abc,
    Zhongwenzhixing,
    PinyinJiajia,
    Xiaohe,
}

struct BuiltinLayout {
    zero: &'static str,
    initials: &'static [(char, &'static str)],
    finals: &'static [(char, &'static str)],
}

static ZIRANMA: BuiltinLayout = BuiltinLayout {
    zero: "o*",
    initials: &[('u', "sh"), ('i', "ch"), ('v', "zh")],
    finals: &[
        ('q', "iu"),
        ('w', "ia"),
        ('w', "ua"),
        ('r', "uan"),
        ('t', "ve"),
        ('t', "ue"),
        ('y', "uai"),
        ('y', "ing"),
        ('o', "uo"),
        ('p', "un"),
        ('s', "ong"),
        ('s', "iong"),
        ('d', "uang"),
        ('d', "iang"),
        ('f', "en"),
        ('g', "eng"),
        ('h', "ang"),
        ('j', "an"),
        ('k', "ao"),
        ('l', "ai"),
        ('z', "ei"),
        ('x', "ie"),
        ('c', "iao"),
        ('v', "ui"),
        ('b', "ou"),
        ('n', "in"),
        ('m', "ian"),
    ],
};

static MS: BuiltinLayout = BuiltinLayout {
    zero: "o",
    initials: &[('u', "sh"), ('i', "ch"), ('v', "zh")],
    finals: &[
        ('q', "iu"),
        ('w', "ia"),
        ('w', "ua"),
        ('r', "uan"),
        ('r', "er"),
        ('t', "ue"),
        ('y', "uai"),
        ('y', "v"),
        ('o', "uo"),
        ('p', "un"),
        ('s', "ong"),
        ('s', "iong"),
        ('d', "uang"),
        ('d', "iang"),
        ('f', "en"),
        ('g', "eng"),
        ('h', "ang"),
        ('j', "an"),
        ('k', "ao"),
        ('l', "ai"),
        ('z', "ei"),
        ('x', "ie"),
        ('c', "iao"),
        ('v', "ui"),
        ('v', "ve"),
        ('b', "ou"),
        ('n', "in"),
        ('m', "ian"),
    ],
};

static ZIGUANG: BuiltinLayout = BuiltinLayout {
    zero: "o",
    initials: &[('u', "ch"), ('i', "sh"), ('a', "zh")],
    finals: &[
        ('q', "ao"),
        ('w', "en"),
        ('r', "an"),
        ('t', "eng"),
        ('y', "in"),
        ('y', "uai"),
        ('o', "uo"),
        ('p', "ai"),
        ('s', "ang"),
        ('d', "ie"),
        ('f', "ian"),
        ('g', "uang"),
        ('g', "iang"),
        ('h', "ong"),
        ('h', "iong"),
        ('j', "iu"),
        ('j', "er"),
        ('k', "ei"),
        ('l', "uan"),
        ('l', "ing"),
        ('z', "ou"),
        ('x', "ia"),
        ('x', "ua"),
        ('c', "iao"),
        ('v', "ui"),
        ('v', "v"),
        ('b', "in"),
        ('n', "un"),
        ('m', "ue"),
        ('m', "ve"),
    ],
};

static ABC: BuiltinLayout = BuiltinLayout {
    zero: "o",
    initials: &[('a', "zh"), ('e', "ch"), ('v', "sh")],
    finals: &[
        ('q', "ei"),
        ('w', "ian"),
        ('r', "iu"),
        ('r', "er"),
        ('t', "iang"),
        ('t', "uang"),
        ('y', "ing"),
        ('o', "uo"),
        ('p', "uan"),
        ('s', "ong"),
        ('s', "iong"),
        ('d', "ua"),
        ('d', "ia"),
        ('f', "en"),
        ('g', "eng"),
        ('h', "ang"),
        ('j', "an"),
        ('k', "ao"),
        ('l', "ai"),
        ('z', "iao"),
        ('x', "ie"),
        ('c', "in"),
        ('c', "uai"),
        ('v', "ve"),
        ('b', "ou"),
        ('n', "un"),
        ('m', "ue"),
        ('m', "ui"),
    ],
};

static ZHONGWENZHIXING: BuiltinLayout = BuiltinLayout {
    zero: "o",
    initials: &[('u', "sh"), ('i', "ch"), ('v', "zh")],
    finals: &[
        ('q', "iu"),
        ('w', "ia"),
        ('w', "ua"),
        ('r', "er"),
        ('t', "ue"),
        ('t', "ve"),
        ('y', "uai"),
        ('y', "v"),
        ('o', "uo"),
        ('p', "un"),
        ('s', "ong"),
        ('s', "iong"),
        ('d', "uang"),
        ('d', "iang"),
        ('f', "en"),
        ('g', "eng"),
        ('h', "ang"),
        ('j', "an"),
        ('k', "ao"),
        ('l', "ai"),
        ('z', "ei"),
        ('x', "ie"),
        ('c', "iao"),
        ('v', "ui"),
        ('b', "ou"),
        ('n', "in"),
        ('m', "ian"),
    ],
};

static PINYINJIAJIA: BuiltinLayout = BuiltinLayout {
    zero: "o*",
    initials: &[('u', "sh"), ('i', "ch"), ('v', "zh")],
    finals: &[
        ('q', "er"),
        ('w', "ei"),
        ('r', "en"),
        ('t', "eng"),
        ('y', "iong"),
        ('y', "ong"),
        ('o', "uo"),
        ('p', "ou"),
        ('s', "ai"),
        ('d', "ao"),
        ('f', "an"),
        ('g', "ang"),
        ('h', "uang"),
        ('h', "iang"),
        ('j', "ian"),
        ('k', "iao"),
        ('l', "in"),
        ('z', "un"),
        ('x', "uai"),
        ('x', "ue"),
        ('c', "uan"),
        ('v', "ui"),
        ('v', "v"),
        ('b', "ia"),
        ('b', "ua"),
        ('n', "iu"),
        ('m', "ing"),
    ],
};

static XIAOHE: BuiltinLayout = BuiltinLayout {
    zero: "*",
    initials: &[('u', "sh"), ('i', "ch"), ('v', "zh")],
    finals: &[
        ('q', "iu"),
        ('w', "ei"),
        ('r', "uan"),
        ('t', "ve"),
        ('t', "ue"),
        ('y', "un"),
        ('o', "uo"),
        ('p', "ie"),
        ('s', "ong"),
        ('s', "iong"),
        ('d', "ai"),
        ('f', "en"),
        ('g', "eng"),
        ('h', "ang"),
        ('j', "an"),
        ('k', "ing"),
        ('k', "uai"),
        ('l', "iang"),
        ('l', "uang"),
        ('z', "ou"),
        ('x', "ia"),
        ('x', "ua"),
        ('c', "ao"),
        ('v', "v"),
        ('v', "ui"),
        ('b', "in"),
        ('n', "iao"),
        ('m', "ian"),
    ],
};

fn builtin_layout(profile: ShuangpinBuiltinProfile) -> &'static BuiltinLayout {
    match profile {
        ShuangpinBuiltinProfile::Ziranma => &ZIRANMA,
        ShuangpinBuiltinProfile::Ms => &MS,
        ShuangpinBuiltinProfile::Ziguang => &ZIGUANG,
        ShuangpinBuiltinProfile::Abc => &ABC,
        ShuangpinBuiltinProfile::Zhongwenzhixing => &ZHONGWENZHIXING,
        ShuangpinBuiltinProfile::PinyinJiajia => &PINYINJIAJIA,
        ShuangpinBuiltinProfile::Xiaohe => &XIAOHE,
    }
}

pub type ShuangpinTable = AHashMap<String, Vec<(PinyinSyllable, PinyinFuzzyFlags)>>;

#[derive(Debug, Clone, Default)]
pub struct ShuangpinProfile {
    table: ShuangpinTable,
    valid_inputs: AHashSet<char>,
    valid_initials: AHashSet<char>,
}

#[derive(Debug, Default, Clone)]
struct LayoutSpec {
    zero: String,
    final_map: Vec<(char, PinyinFinal)>,
    initial_map: Vec<(char, PinyinInitial)>,
    initial_final_map: Vec<(String, (PinyinInitial, PinyinFinal))>,
}

impl ShuangpinProfile {
    pub fn builtin(profile: ShuangpinBuiltinProfile) -> Self {
        Self::builtin_with_correction(profile, None)
    }

    pub fn builtin_with_correction(
        profile: ShuangpinBuiltinProfile,
        correction: Option<&PinyinCorrectionProfile>,
    ) -> Self {
        let layout = builtin_layout(profile);
        let mut spec = LayoutSpec {
            zero: layout.zero.to_string(),
            ..LayoutSpec::default()
        };
        for &(key, final_str) in layout.finals {
            let fin = string_to_final(final_str);
            debug_assert!(fin != PinyinFinal::Invalid, "bad layout final {final_str}");
            spec.final_map.push((key, fin));
        }
        for &(key, initial_str) in layout.initials {
            spec.initial_map
                .push((key, string_to_initial(initial_str)));
        }
        build_profile(spec, correction)
    }

    /// Parse a textual layout descriptor.
    pub fn from_text(reader: impl Read) -> Result<Self> {
        Self::from_text_with_correction(reader, None)
    }

    pub fn from_text_with_correction(
        reader: impl Read,
        correction: Option<&PinyinCorrectionProfile>,
    ) -> Result<Self> {
        let mut spec = LayoutSpec {
            zero: "o".to_string(),
            ..LayoutSpec::default()
        };
        let mut is_default = false;
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("方案名称=") {
                let name = name.trim();
                is_default = matches!(
                    name,
                    "自然码" | "微软" | "紫光" | "拼音加加" | "中文之星" | "智能ABC" | "小鹤"
                );
            }
            if is_default {
                continue;
            }

            if let Some(zero) = line.strip_prefix('=') {
                if !zero.is_empty() {
                    spec.zero = zero.to_ascii_lowercase();
                }
                continue;
            }

            let Some(equal) = line.find('=') else {
                continue;
            };
            if equal == 0 {
                continue;
            }
            let (pinyin, keys) = line.split_at(equal);
            let keys = &keys[1..];
            if keys.len() == 1 {
                let key = keys
                    .chars()
                    .next()
                    .expect("length checked")
                    .to_ascii_lowercase();
                let fin = string_to_final(pinyin);
                if fin != PinyinFinal::Invalid {
                    spec.final_map.push((key, fin));
                } else {
                    let initial = string_to_initial(pinyin);
                    if initial != PinyinInitial::Invalid {
                        spec.initial_map.push((key, initial));
                    }
                }
            } else if keys.len() == 2 {
                let keys = keys.to_ascii_lowercase();
                if let Ok(encoded) = encode_full_pinyin(pinyin) {
                    if encoded.len() == 2 {
                        spec.initial_final_map.push((
                            keys,
                            (
                                PinyinInitial::from_byte(encoded[0]),
                                PinyinFinal::from_byte(encoded[1]),
                            ),
                        ));
                    }
                }
            }
        }
        Ok(build_profile(spec, correction))
    }

    /// Map from 1-2 key sequences to candidate syllables.
    pub fn table(&self) -> &ShuangpinTable {
        &self.table
    }

    pub fn valid_input(&self) -> &AHashSet<char> {
        &self.valid_inputs
    }

    pub fn valid_initial(&self) -> &AHashSet<char> {
        &self.valid_initials
    }
}

fn add_pinyin_to_list(
    pys: &mut Vec<(PinyinSyllable, PinyinFuzzyFlags)>,
    initial: PinyinInitial,
    fin: PinyinFinal,
    flags: PinyinFuzzyFlags,
) {
    let syl = PinyinSyllable::new(initial, fin);
    if flags.is_none() {
        // a non-fuzzy reading replaces fuzzy ones of the same syllable
        if pys.iter().any(|(s, f)| *s == syl && !f.is_none()) {
            pys.retain(|(s, _)| *s != syl);
            pys.push((syl, flags));
            return;
        }
        if !pys.iter().any(|(s, _)| *s == syl) {
            pys.push((syl, flags));
        }
    } else {
        if let Some((_, first_flags)) = pys.iter().find(|(s, _)| *s == syl) {
            if first_flags.is_none() {
                return;
            }
            if pys.iter().any(|(s, f)| *s == syl && *f == flags) {
                return;
            }
        }
        pys.push((syl, flags));
    }
}

fn add_pinyin(pys: &mut Vec<(PinyinSyllable, PinyinFuzzyFlags)>, py: &str) {
    for entry in pinyin_map_v2().find(py) {
        // Swapped-order typos would map shuangpin keys to the wrong
        // syllable entirely; plain typos like ng -> gn are fine.
        if entry.flags.test(PinyinFuzzyFlags::ADVANCED_TYPO) {
            continue;
        }
        add_pinyin_to_list(pys, entry.initial, entry.fin, entry.flags);
    }
}

fn build_profile(spec: LayoutSpec, correction: Option<&PinyinCorrectionProfile>) -> ShuangpinProfile {
    let mut profile = ShuangpinProfile::default();
    let mut final_map = spec.final_map.clone();

    for c in 'a'..='z' {
        profile.valid_inputs.insert(c);
    }
    for (c, _) in &spec.initial_map {
        profile.valid_inputs.insert(*c);
    }
    let mut single_char_final: BTreeMap<PinyinFinal, char> = BTreeMap::new();
    for (c, fin) in &final_map {
        profile.valid_inputs.insert(*c);
        if final_to_string(*fin).len() == 1 {
            single_char_final.insert(*fin, *c);
        }
    }
    for (keys, _) in &spec.initial_final_map {
        for c in keys.chars() {
            profile.valid_inputs.insert(c);
        }
    }

    let mut initial_chars: AHashSet<char> = AHashSet::new();
    for zero in spec.zero.chars() {
        if zero != '*' {
            profile.valid_inputs.insert(zero);
            initial_chars.insert(zero);
        }
    }
    for b in FIRST_INITIAL..=LAST_INITIAL {
        let s = initial_to_string(PinyinInitial::from_byte(b));
        if s.len() == 1 {
            initial_chars.insert(s.chars().next().expect("length checked"));
        }
    }
    for (c, _) in &spec.initial_map {
        initial_chars.insert(*c);
    }

    let mut final_chars: AHashSet<char> = AHashSet::new();
    for b in FIRST_FINAL..=LAST_FINAL {
        let fin = PinyinFinal::from_byte(b);
        let s = final_to_string(fin);
        if s.len() == 1 && !single_char_final.contains_key(&fin) {
            let c = s.chars().next().expect("length checked");
            final_chars.insert(c);
            single_char_final.insert(fin, c);
        }
    }
    for (c, _) in &final_map {
        final_chars.insert(*c);
    }

    for (&fin, &chr) in &single_char_final {
        if !final_map.iter().any(|(c, f)| *c == chr && *f == fin) {
            final_map.push((chr, fin));
        }
    }

    // Ziranma/Xiaohe style zero handling: aa/ee/oo for one-letter
    // finals, single-final-key + key for longer ones.
    if spec.zero.contains('*') {
        for &c in &final_chars {
            for (key, fin) in final_map.iter().filter(|(key, _)| *key == c) {
                let _ = key;
                if !is_valid_initial_final(PinyinInitial::Zero, *fin) {
                    continue;
                }
                let final_string = final_to_string(*fin);
                let input = if final_string.len() == 1 {
                    let mut s = String::new();
                    s.push(c);
                    s.push(c);
                    s
                } else {
                    let first = string_to_final(&final_string[..1]);
                    match (first != PinyinFinal::Invalid)
                        .then(|| single_char_final.get(&first))
                        .flatten()
                    {
                        Some(&single) => {
                            let mut s = String::new();
                            s.push(single);
                            s.push(c);
                            s
                        }
                        None => continue,
                    }
                };
                profile
                    .table
                    .entry(input)
                    .or_default()
                    .push((PinyinSyllable::new(PinyinInitial::Zero, *fin), PinyinFuzzyFlags::NONE));
            }
        }
    }

    // Every initial-key x final-key combination.
    for &c1 in &initial_chars {
        for &c2 in &final_chars {
            let input: String = [c1, c2].iter().collect();
            let mut pys = profile.table.remove(&input).unwrap_or_default();

            let mut initials: Vec<PinyinInitial> = spec
                .initial_map
                .iter()
                .filter(|(c, _)| *c == c1)
                .map(|(_, i)| *i)
                .collect();
            let direct = string_to_initial(&c1.to_string());
            if direct != PinyinInitial::Invalid {
                initials.push(direct);
            }
            if spec.zero.contains(c1) {
                initials.push(PinyinInitial::Zero);
            }

            let finals: Vec<PinyinFinal> = final_map
                .iter()
                .filter(|(c, _)| *c == c2)
                .map(|(_, f)| *f)
                .collect();

            for &i in &initials {
                for &f in &finals {
                    let mut py = String::from(initial_to_string(i));
                    py.push_str(final_to_string(f));
                    add_pinyin(&mut pys, &py);
                }
            }

            if !pys.is_empty() {
                profile.table.insert(input, pys);
            }
        }
    }

    // Explicit syllable-to-keys mappings.
    for (keys, (initial, fin)) in &spec.initial_final_map {
        let pys = profile.table.entry(keys.clone()).or_default();
        let mut py = String::from(initial_to_string(*initial));
        py.push_str(final_to_string(*fin));
        add_pinyin(pys, &py);
        if pys.is_empty() {
            profile.table.remove(keys);
        }
    }

    // Zero-initial two-letter syllables typed as themselves.
    for entry in pinyin_map_v2().iter() {
        if entry.pinyin == "ng" {
            continue;
        }
        if entry.pinyin.len() == 2
            && entry.initial == PinyinInitial::Zero
            && (!profile.table.contains_key(&entry.pinyin) || spec.zero.contains('*'))
        {
            let pys = profile.table.entry(entry.pinyin.clone()).or_default();
            add_pinyin_to_list(pys, entry.initial, entry.fin, entry.flags);
        }
    }

    // Single keys match partially.
    let valid_inputs: Vec<char> = profile.valid_inputs.iter().copied().collect();
    for c in valid_inputs {
        let input = c.to_string();
        let mut pys = profile.table.remove(&input).unwrap_or_default();
        let initial = string_to_initial(&input);
        if initial != PinyinInitial::Invalid {
            add_pinyin_to_list(&mut pys, initial, PinyinFinal::Invalid, PinyinFuzzyFlags::NONE);
        }
        for (_, i) in spec.initial_map.iter().filter(|(key, _)| *key == c) {
            add_pinyin_to_list(&mut pys, *i, PinyinFinal::Invalid, PinyinFuzzyFlags::NONE);
        }
        for (_, fin) in final_map.iter().filter(|(key, _)| *key == c) {
            if final_to_string(*fin).len() == 1
                && is_valid_initial_final(PinyinInitial::Zero, *fin)
                && pys.is_empty()
            {
                add_pinyin_to_list(&mut pys, PinyinInitial::Zero, *fin, PinyinFuzzyFlags::NONE);
            }
        }
        if !pys.is_empty() {
            profile.table.insert(input, pys);
        }
    }

    // Keyboard-correction variants of every entry.
    if let Some(correction) = correction {
        let correction_map = correction.correction_map();
        let mut new_entries: Vec<(String, PinyinSyllable, PinyinFuzzyFlags)> = Vec::new();
        for (input, pys) in &profile.table {
            let bytes = input.as_bytes();
            for (i, &b) in bytes.iter().enumerate() {
                let Some(subs) = correction_map.get(&(b as char)) else {
                    continue;
                };
                for &sub in subs {
                    let mut new_input = input.clone();
                    unsafe { new_input.as_bytes_mut()[i] = sub as u8 };
                    for (syl, flags) in pys {
                        new_entries.push((
                            new_input.clone(),
                            *syl,
                            *flags | PinyinFuzzyFlags::CORRECTION,
                        ));
                    }
                }
            }
        }
        for (input, syl, flags) in new_entries {
            let pys = profile.table.entry(input).or_default();
            if !pys.iter().any(|(s, f)| *s == syl && *f == flags) {
                pys.push((syl, flags));
            }
        }
    }

    for input in profile.table.keys() {
        debug_assert!(!input.is_empty() && input.len() <= 2);
        profile
            .valid_initials
            .insert(input.chars().next().expect("non-empty key"));
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(profile: &ShuangpinProfile, keys: &str) -> Vec<String> {
        profile
            .table()
            .get(keys)
            .map(|pys| pys.iter().map(|(s, _)| s.to_spelling()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn xiaohe_decodes_bing_qi_lin() {
        let profile = ShuangpinProfile::builtin(ShuangpinBuiltinProfile::Xiaohe);
        assert!(readings(&profile, "bk").contains(&"bing".to_string()));
        assert!(readings(&profile, "qi").contains(&"qi".to_string()));
        assert!(readings(&profile, "lb").contains(&"lin".to_string()));
    }

    #[test]
    fn xiaohe_double_letter_zero_initial() {
        let profile = ShuangpinProfile::builtin(ShuangpinBuiltinProfile::Xiaohe);
        assert!(readings(&profile, "aa").contains(&"a".to_string()));
        // two-letter zero-initial syllables type as themselves
        assert!(readings(&profile, "an").contains(&"an".to_string()));
    }

    #[test]
    fn ms_sh_on_u_key() {
        let profile = ShuangpinProfile::builtin(ShuangpinBuiltinProfile::Ms);
        assert!(readings(&profile, "ui").contains(&"shi".to_string()));
        assert!(readings(&profile, "uh").contains(&"shang".to_string()));
    }

    #[test]
    fn single_key_is_partial_initial() {
        let profile = ShuangpinProfile::builtin(ShuangpinBuiltinProfile::Ziranma);
        let entries = profile.table().get("u").expect("u maps to sh");
        assert!(entries
            .iter()
            .any(|(s, _)| s.initial == PinyinInitial::SH && s.fin == PinyinFinal::Invalid));
        assert!(profile.valid_initial().contains(&'u'));
    }

    #[test]
    fn text_profile_overrides_layout() {
        let text = "方案名称=测试\n=o\niu=q\nsh=u\nuan=r\n";
        let profile = ShuangpinProfile::from_text(text.as_bytes()).unwrap();
        assert!(readings(&profile, "ur").contains(&"shuan".to_string()));
        assert!(profile.valid_input().contains(&'q'));
    }

    #[test]
    fn keys_never_exceed_two_chars() {
        let profile = ShuangpinProfile::builtin(ShuangpinBuiltinProfile::Xiaohe);
        assert!(profile.table().keys().all(|k| (1..=2).contains(&k.len())));
    }
}
