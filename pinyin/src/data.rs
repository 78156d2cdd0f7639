//! Syllable inventory and derived spelling tables.
//!
//! `pinyin_map()` is the hand-curated table: every recognized spelling
//! with its `(initial, final)` reading and the fuzzy classes required
//! to accept it (common typos such as `zhon` and `zogn` included).
//! `pinyin_map_v2()` is derived from its exact subset by systematically
//! applying each fuzzy class and the typo transformations; it backs
//! shuangpin table construction and correction profiles.

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::encoder::{PinyinFinal, PinyinFuzzyFlags, PinyinInitial};

type I = PinyinInitial;
type Fi = PinyinFinal;
type F = PinyinFuzzyFlags;

#[derive(Debug, Clone, PartialEq)]
pub struct PinyinEntry {
    pub pinyin: String,
    pub initial: PinyinInitial,
    pub fin: PinyinFinal,
    pub flags: PinyinFuzzyFlags,
}

/// Spelling-indexed multimap of syllable entries; spellings are not
/// unique, fuzzy variants of one spelling carry different flags.
#[derive(Debug, Default, Clone)]
pub struct PinyinMap {
    entries: Vec<PinyinEntry>,
    index: AHashMap<String, Vec<usize>>,
}

impl PinyinMap {
    pub fn new() -> Self {
        PinyinMap::default()
    }

    /// Insert unless an identical entry is already present.
    pub fn insert(&mut self, entry: PinyinEntry) {
        if self.find(&entry.pinyin).any(|e| *e == entry) {
            return;
        }
        let idx = self.entries.len();
        self.index
            .entry(entry.pinyin.clone())
            .or_default()
            .push(idx);
        self.entries.push(entry);
    }

    pub fn find<'a>(&'a self, pinyin: &str) -> impl Iterator<Item = &'a PinyinEntry> {
        self.index
            .get(pinyin)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    pub fn contains(&self, pinyin: &str) -> bool {
        self.index.contains_key(pinyin)
    }

    /// Whether `pinyin` has an entry with no fuzzy requirement.
    pub fn contains_exact(&self, pinyin: &str) -> bool {
        self.find(pinyin).any(|e| e.flags.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinyinEntry> {
        self.entries.iter()
    }
}

/// The primary spelling table used by the segmenter.
pub fn pinyin_map() -> &'static PinyinMap {
    static MAP: Lazy<PinyinMap> = Lazy::new(|| {
        let mut map = PinyinMap::new();
        for &(pinyin, initial, fin, flags) in PINYIN_TABLE {
            map.insert(PinyinEntry {
                pinyin: pinyin.to_string(),
                initial,
                fin,
                flags,
            });
        }
        map
    });
    &MAP
}

/// Derived table: exact spellings plus systematic fuzzy and typo
/// variants. Backs shuangpin tables and correction profiles.
pub fn pinyin_map_v2() -> &'static PinyinMap {
    static MAP: Lazy<PinyinMap> = Lazy::new(|| {
        let mut map = PinyinMap::new();
        for entry in pinyin_map().iter() {
            if entry.flags.is_none() {
                map.insert(entry.clone());
            }
        }

        for flag in [
            F::U_OU,
            F::IN_ING,
            F::EN_ENG,
            F::AN_ANG,
            F::UAN_UANG,
            F::IAN_IANG,
            F::VE_UE,
            F::F_H,
            F::L_N,
            F::Z_ZH,
            F::S_SH,
            F::C_CH,
        ] {
            apply_fuzzy_to_map(&mut map, |e| apply_fuzzy(e, flag), false);
        }

        for phase in [
            TypoPhase::CommonUvJqxy,
            TypoPhase::CommonOnOng,
            TypoPhase::CommonInIng,
            TypoPhase::CommonSwapNgUeUaUan,
            TypoPhase::CommonSwapUang,
            TypoPhase::AdvancedSwapXhUn,
            TypoPhase::AdvancedSwapLength2,
            TypoPhase::AdvancedSwapLength3,
            TypoPhase::AdvancedSwapLength4,
            TypoPhase::AdvancedSwapXhyXyh,
        ] {
            // din -> ding shadows an exact entry on purpose
            let force = phase == TypoPhase::CommonInIng;
            apply_fuzzy_to_map(&mut map, |e| apply_typo(e, phase), force);
        }
        map
    });
    &MAP
}

fn apply_fuzzy_to_map(
    map: &mut PinyinMap,
    apply: impl Fn(&PinyinEntry) -> Option<PinyinEntry>,
    force: bool,
) {
    let new_entries: Vec<PinyinEntry> = map.iter().filter_map(apply).collect();
    for entry in new_entries {
        if !force && map.find(&entry.pinyin).any(|e| e.flags.is_none()) {
            continue;
        }
        map.insert(entry);
    }
}

/// Produce the spelling variant of `entry` under one fuzzy class, or
/// None when the class does not apply.
fn apply_fuzzy(entry: &PinyinEntry, flag: PinyinFuzzyFlags) -> Option<PinyinEntry> {
    let mut result = entry.pinyin.clone();
    match flag {
        F::VE_UE => {
            if result.ends_with("ve") {
                let idx = result.len() - 2;
                replace_at(&mut result, idx, b'u');
            }
        }
        F::IAN_IANG => {
            if result.ends_with("ian") {
                result.push('g');
            } else if result.ends_with("iang") {
                result.pop();
            }
        }
        F::UAN_UANG => {
            if !entry.flags.is_none() {
                return None;
            }
            if result.ends_with("uan") {
                result.push('g');
            } else if result.ends_with("uang") {
                result.pop();
            }
        }
        F::AN_ANG => {
            if result.ends_with("uan")
                || result.ends_with("uang")
                || result.ends_with("ian")
                || result.ends_with("iang")
            {
                return None;
            }
            if result.ends_with("an") {
                result.push('g');
            } else if result.ends_with("ang") {
                result.pop();
            }
        }
        F::EN_ENG => {
            if result.ends_with("en") {
                result.push('g');
            } else if result.ends_with("eng") {
                result.pop();
            }
        }
        F::IN_ING => {
            if result.ends_with("in") {
                result.push('g');
            } else if result.ends_with("ing") {
                result.pop();
            }
        }
        F::U_OU => {
            if result.ends_with("ou") {
                result.pop();
                let at = result.len() - 1;
                replace_at(&mut result, at, b'u');
            } else if result.ends_with('u') && !result.ends_with("iu") {
                let at = result.len() - 1;
                replace_at(&mut result, at, b'o');
                result.push('u');
            }
        }
        F::C_CH => {
            if !entry.flags.is_none() {
                return None;
            }
            toggle_retroflex(&mut result, 'c');
        }
        F::S_SH => {
            if !entry.flags.is_none() {
                return None;
            }
            toggle_retroflex(&mut result, 's');
        }
        F::Z_ZH => {
            if !entry.flags.is_none() {
                return None;
            }
            toggle_retroflex(&mut result, 'z');
        }
        F::F_H => {
            if result.starts_with('f') {
                replace_at(&mut result, 0, b'h');
            } else if result.starts_with('h') {
                replace_at(&mut result, 0, b'f');
            }
        }
        F::L_N => {
            if result.starts_with('l') {
                replace_at(&mut result, 0, b'n');
            } else if result.starts_with('n') {
                replace_at(&mut result, 0, b'l');
            }
        }
        _ => {}
    }
    if result == entry.pinyin {
        return None;
    }
    Some(PinyinEntry {
        pinyin: result,
        initial: entry.initial,
        fin: entry.fin,
        flags: entry.flags | flag,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypoPhase {
    CommonUvJqxy,
    CommonOnOng,
    CommonInIng,
    CommonSwapNgUeUaUan,
    CommonSwapUang,
    AdvancedSwapXhUn,
    AdvancedSwapLength2,
    AdvancedSwapLength3,
    AdvancedSwapLength4,
    AdvancedSwapXhyXyh,
}

impl TypoPhase {
    fn flag(self) -> PinyinFuzzyFlags {
        match self {
            TypoPhase::CommonUvJqxy
            | TypoPhase::CommonOnOng
            | TypoPhase::CommonInIng
            | TypoPhase::CommonSwapNgUeUaUan
            | TypoPhase::CommonSwapUang => F::COMMON_TYPO,
            _ => F::ADVANCED_TYPO,
        }
    }
}

fn replace_at(s: &mut String, at: usize, byte: u8) {
    // spellings are plain ascii
    unsafe { s.as_bytes_mut()[at] = byte }
}

fn swap_bytes(s: &mut String, a: usize, b: usize) {
    unsafe { s.as_bytes_mut().swap(a, b) }
}

fn toggle_retroflex(result: &mut String, plain: char) {
    let retroflex: String = format!("{}h", plain);
    if result.starts_with(&retroflex) {
        result.remove(1);
    } else if result.starts_with(plain) {
        result.insert(1, 'h');
    }
}

/// Produce a common/advanced typo variant of `entry` for one phase.
fn apply_typo(entry: &PinyinEntry, phase: TypoPhase) -> Option<PinyinEntry> {
    if matches!(entry.pinyin.as_str(), "m" | "n" | "r" | "ng" | "ou") {
        return None;
    }
    let mut result = entry.pinyin.clone();
    let len = result.len();
    match phase {
        TypoPhase::CommonUvJqxy => {
            // non-standard jv jve jvan jvang spellings
            if result.starts_with(['j', 'q', 'x', 'y']) {
                if result.ends_with('u') && !result.ends_with("iu") && !result.ends_with("ou") {
                    replace_at(&mut result, len - 1, b'v');
                }
                if result.ends_with("ue") || result.ends_with("un") {
                    replace_at(&mut result, len - 2, b'v');
                }
                if result.ends_with("uan") {
                    replace_at(&mut result, len - 3, b'v');
                }
                if result.ends_with("uang") {
                    replace_at(&mut result, len - 4, b'v');
                }
            }
        }
        TypoPhase::CommonOnOng => {
            // lon -> long
            if result.ends_with("ong") {
                result.pop();
            }
        }
        TypoPhase::CommonInIng => {
            // din -> ding
            if result == "ding" {
                result.pop();
            }
        }
        TypoPhase::CommonSwapNgUeUaUan => {
            if result.ends_with("ng") {
                replace_at(&mut result, len - 2, b'g');
                replace_at(&mut result, len - 1, b'n');
            } else if result.ends_with("ue") {
                replace_at(&mut result, len - 2, b'e');
                replace_at(&mut result, len - 1, b'u');
            } else if result.ends_with("ve") {
                replace_at(&mut result, len - 2, b'e');
                replace_at(&mut result, len - 1, b'v');
            } else if result.ends_with("ua") {
                replace_at(&mut result, len - 2, b'a');
                replace_at(&mut result, len - 1, b'u');
            } else if result.ends_with("uai") || result.ends_with("uan") {
                replace_at(&mut result, len - 3, b'a');
                replace_at(&mut result, len - 2, b'u');
            } else if result.ends_with("van") {
                replace_at(&mut result, len - 3, b'a');
                replace_at(&mut result, len - 2, b'v');
            }
        }
        TypoPhase::CommonSwapUang => {
            // conflicts with the "ng" rule, separate pass
            if result.ends_with("uang") {
                replace_at(&mut result, len - 4, b'a');
                replace_at(&mut result, len - 3, b'u');
            } else if result.ends_with("vang") {
                replace_at(&mut result, len - 4, b'a');
                replace_at(&mut result, len - 3, b'v');
            }
        }
        TypoPhase::AdvancedSwapXhUn => {
            if result.starts_with("zh") || result.starts_with("sh") || result.starts_with("ch") {
                swap_bytes(&mut result, 0, 1);
            } else if result.ends_with("un") && !result.ends_with("aun") {
                replace_at(&mut result, len - 2, b'n');
                replace_at(&mut result, len - 1, b'u');
            }
        }
        TypoPhase::AdvancedSwapLength2 => {
            if entry.flags.test(F::ADVANCED_TYPO) {
                return None;
            }
            for two in ["ai", "ia", "ei", "ie", "ao", "uo", "ou", "iu", "an", "en", "in"] {
                if result.ends_with(two) {
                    swap_bytes(&mut result, len - 2, len - 1);
                }
            }
        }
        TypoPhase::AdvancedSwapLength3 => {
            if entry.flags.test(F::ADVANCED_TYPO) {
                return None;
            }
            for three in ["ang", "eng", "ing", "ong", "iao", "ian"] {
                if result.ends_with(three) {
                    swap_bytes(&mut result, len - 3, len - 2);
                }
            }
        }
        TypoPhase::AdvancedSwapLength4 => {
            if entry.flags.test(F::ADVANCED_TYPO) {
                return None;
            }
            for four in ["iang", "iong"] {
                if result.ends_with(four) {
                    swap_bytes(&mut result, len - 4, len - 3);
                }
            }
        }
        TypoPhase::AdvancedSwapXhyXyh => {
            if entry.flags.test(F::ADVANCED_TYPO) {
                return None;
            }
            // zhe -> zeh
            if result.len() == 3 && result.as_bytes()[1] == b'h' && entry.flags.is_none() {
                swap_bytes(&mut result, 1, 2);
            }
        }
    }
    if result == entry.pinyin {
        return None;
    }
    Some(PinyinEntry {
        pinyin: result,
        initial: entry.initial,
        fin: entry.fin,
        flags: entry.flags | phase.flag(),
    })
}

pub(crate) fn is_encoded_initial_final(encoded: usize) -> bool {
    static TABLE: Lazy<[bool; 900]> = Lazy::new(|| {
        let mut table = [false; 900];
        for &i in ENCODED_INITIAL_FINAL {
            table[i as usize] = true;
        }
        table
    });
    encoded < TABLE.len() && TABLE[encoded]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_indexes_fuzzy_variants_of_one_spelling() {
        let map = pinyin_map();
        // zuagn records both the uan/uang and the z/zh readings
        let entries: Vec<_> = map.find("zuagn").collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.flags.test(F::COMMON_TYPO)));
    }

    #[test]
    fn exact_spellings_do_not_require_flags() {
        let map = pinyin_map();
        assert!(map.contains_exact("zhong"));
        assert!(map.contains_exact("nihao") == false);
        assert!(!map.contains_exact("zhon"));
        assert!(map.contains("zhon"));
    }

    #[test]
    fn v2_adds_typo_swaps() {
        let map = pinyin_map_v2();
        // qing -> qign (ng swap, common typo)
        assert!(map
            .find("qign")
            .any(|e| e.fin == Fi::ING && e.flags.test(F::COMMON_TYPO)));
        // zhe -> hze (advanced typo)
        assert!(map.find("hze").any(|e| e.flags.test(F::ADVANCED_TYPO)));
        // jv non-standard spelling
        assert!(map.find("jv").any(|e| e.flags.test(F::COMMON_TYPO)));
    }

    #[test]
    fn inner_segment_known_splits() {
        assert_eq!(INNER_SEGMENT.get("xian"), Some(&("xi", "an")));
        assert_eq!(INNER_SEGMENT.get("zhuang"), Some(&("zhu", "ang")));
        assert!(INNER_SEGMENT.get("hao").is_none());
    }
}
static PINYIN_TABLE: &[(&str, I, Fi, F)] = &[
    ("zuo", I::Z, Fi::UO, F::NONE),
    ("zun", I::Z, Fi::UN, F::NONE),
    ("zui", I::Z, Fi::UI, F::NONE),
    ("zuagn", I::Z, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("zuang", I::Z, Fi::UAN, F::UAN_UANG),
    ("zuagn", I::ZH, Fi::UANG, F::Z_ZH.with(F::COMMON_TYPO)),
    ("zuang", I::ZH, Fi::UANG, F::Z_ZH),
    ("zuan", I::Z, Fi::UAN, F::NONE),
    ("zuai", I::ZH, Fi::UAI, F::Z_ZH),
    ("zua", I::ZH, Fi::UA, F::Z_ZH),
    ("zu", I::Z, Fi::U, F::NONE),
    ("zou", I::Z, Fi::OU, F::NONE),
    ("zogn", I::Z, Fi::ONG, F::COMMON_TYPO),
    ("zon", I::Z, Fi::ONG, F::COMMON_TYPO),
    ("zong", I::Z, Fi::ONG, F::NONE),
    ("zi", I::Z, Fi::I, F::NONE),
    ("zhuo", I::ZH, Fi::UO, F::NONE),
    ("zhun", I::ZH, Fi::UN, F::NONE),
    ("zhui", I::ZH, Fi::UI, F::NONE),
    ("zhuagn", I::ZH, Fi::UANG, F::COMMON_TYPO),
    ("zhuang", I::ZH, Fi::UANG, F::NONE),
    ("zhuan", I::ZH, Fi::UAN, F::NONE),
    ("zhuai", I::ZH, Fi::UAI, F::NONE),
    ("zhua", I::ZH, Fi::UA, F::NONE),
    ("zhu", I::ZH, Fi::U, F::NONE),
    ("zhou", I::ZH, Fi::OU, F::NONE),
    ("zhogn", I::ZH, Fi::ONG, F::COMMON_TYPO),
    ("zhon", I::ZH, Fi::ONG, F::COMMON_TYPO),
    ("zhong", I::ZH, Fi::ONG, F::NONE),
    ("zhi", I::ZH, Fi::I, F::NONE),
    ("zhegn", I::ZH, Fi::ENG, F::COMMON_TYPO),
    ("zheng", I::ZH, Fi::ENG, F::NONE),
    ("zhen", I::ZH, Fi::EN, F::NONE),
    ("zhei", I::ZH, Fi::EI, F::NONE),
    ("zhe", I::ZH, Fi::E, F::NONE),
    ("zhao", I::ZH, Fi::AO, F::NONE),
    ("zhagn", I::ZH, Fi::ANG, F::COMMON_TYPO),
    ("zhang", I::ZH, Fi::ANG, F::NONE),
    ("zhan", I::ZH, Fi::AN, F::NONE),
    ("zhai", I::ZH, Fi::AI, F::NONE),
    ("zha", I::ZH, Fi::A, F::NONE),
    ("zegn", I::Z, Fi::ENG, F::COMMON_TYPO),
    ("zeng", I::Z, Fi::ENG, F::NONE),
    ("zen", I::Z, Fi::EN, F::NONE),
    ("zei", I::Z, Fi::EI, F::NONE),
    ("ze", I::Z, Fi::E, F::NONE),
    ("zao", I::Z, Fi::AO, F::NONE),
    ("zagn", I::Z, Fi::ANG, F::COMMON_TYPO),
    ("zang", I::Z, Fi::ANG, F::NONE),
    ("zan", I::Z, Fi::AN, F::NONE),
    ("zai", I::Z, Fi::AI, F::NONE),
    ("za", I::Z, Fi::A, F::NONE),
    ("yun", I::Y, Fi::UN, F::NONE),
    ("yue", I::Y, Fi::UE, F::NONE),
    ("yve", I::Y, Fi::UE, F::COMMON_TYPO),
    ("yuagn", I::Y, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("yuang", I::Y, Fi::UAN, F::UAN_UANG),
    ("yvagn", I::Y, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("yvang", I::Y, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("yuan", I::Y, Fi::UAN, F::NONE),
    ("yvan", I::Y, Fi::UAN, F::COMMON_TYPO),
    ("yu", I::Y, Fi::U, F::NONE),
    ("yv", I::Y, Fi::U, F::COMMON_TYPO),
    ("you", I::Y, Fi::OU, F::NONE),
    ("yogn", I::Y, Fi::ONG, F::COMMON_TYPO),
    ("yon", I::Y, Fi::ONG, F::COMMON_TYPO),
    ("yong", I::Y, Fi::ONG, F::NONE),
    ("yo", I::Y, Fi::O, F::NONE),
    ("yign", I::Y, Fi::ING, F::COMMON_TYPO),
    ("ying", I::Y, Fi::ING, F::NONE),
    ("yin", I::Y, Fi::IN, F::NONE),
    ("yi", I::Y, Fi::I, F::NONE),
    ("ye", I::Y, Fi::E, F::NONE),
    ("yao", I::Y, Fi::AO, F::NONE),
    ("yagn", I::Y, Fi::ANG, F::COMMON_TYPO),
    ("yang", I::Y, Fi::ANG, F::NONE),
    ("yan", I::Y, Fi::AN, F::NONE),
    ("ya", I::Y, Fi::A, F::NONE),
    ("xun", I::X, Fi::UN, F::NONE),
    ("xue", I::X, Fi::UE, F::NONE),
    ("xve", I::X, Fi::UE, F::COMMON_TYPO),
    ("xuagn", I::X, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("xuang", I::X, Fi::UAN, F::UAN_UANG),
    ("xvagn", I::X, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("xvang", I::X, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("xuan", I::X, Fi::UAN, F::NONE),
    ("xvan", I::X, Fi::UAN, F::COMMON_TYPO),
    ("xu", I::X, Fi::U, F::NONE),
    ("xv", I::X, Fi::U, F::COMMON_TYPO),
    ("xou", I::X, Fi::U, F::U_OU),
    ("xiu", I::X, Fi::IU, F::NONE),
    ("xiogn", I::X, Fi::IONG, F::COMMON_TYPO),
    ("xion", I::X, Fi::IONG, F::COMMON_TYPO),
    ("xiong", I::X, Fi::IONG, F::NONE),
    ("xign", I::X, Fi::ING, F::COMMON_TYPO),
    ("xing", I::X, Fi::ING, F::NONE),
    ("xin", I::X, Fi::IN, F::NONE),
    ("xie", I::X, Fi::IE, F::NONE),
    ("xiao", I::X, Fi::IAO, F::NONE),
    ("xiagn", I::X, Fi::IANG, F::COMMON_TYPO),
    ("xiang", I::X, Fi::IANG, F::NONE),
    ("xian", I::X, Fi::IAN, F::NONE),
    ("xia", I::X, Fi::IA, F::NONE),
    ("xi", I::X, Fi::I, F::NONE),
    ("wu", I::W, Fi::U, F::NONE),
    ("wo", I::W, Fi::O, F::NONE),
    ("wong", I::W, Fi::ONG, F::NONE),
    ("won", I::W, Fi::ONG, F::COMMON_TYPO),
    ("wogn", I::W, Fi::ONG, F::COMMON_TYPO),
    ("wegn", I::W, Fi::ENG, F::COMMON_TYPO),
    ("weng", I::W, Fi::ENG, F::NONE),
    ("wen", I::W, Fi::EN, F::NONE),
    ("wei", I::W, Fi::EI, F::NONE),
    ("wagn", I::W, Fi::ANG, F::COMMON_TYPO),
    ("wang", I::W, Fi::ANG, F::NONE),
    ("wan", I::W, Fi::AN, F::NONE),
    ("wai", I::W, Fi::AI, F::NONE),
    ("wa", I::W, Fi::A, F::NONE),
    ("tuo", I::T, Fi::UO, F::NONE),
    ("tun", I::T, Fi::UN, F::NONE),
    ("tui", I::T, Fi::UI, F::NONE),
    ("tuagn", I::T, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("tuang", I::T, Fi::UAN, F::UAN_UANG),
    ("tuan", I::T, Fi::UAN, F::NONE),
    ("tu", I::T, Fi::U, F::NONE),
    ("tou", I::T, Fi::OU, F::NONE),
    ("togn", I::T, Fi::ONG, F::COMMON_TYPO),
    ("ton", I::T, Fi::ONG, F::COMMON_TYPO),
    ("tong", I::T, Fi::ONG, F::NONE),
    ("tign", I::T, Fi::ING, F::COMMON_TYPO),
    ("ting", I::T, Fi::ING, F::NONE),
    ("tin", I::T, Fi::ING, F::IN_ING),
    ("tie", I::T, Fi::IE, F::NONE),
    ("tiao", I::T, Fi::IAO, F::NONE),
    ("tiagn", I::T, Fi::IAN, F::IAN_IANG.with(F::COMMON_TYPO)),
    ("tiang", I::T, Fi::IAN, F::IAN_IANG),
    ("tian", I::T, Fi::IAN, F::NONE),
    ("ti", I::T, Fi::I, F::NONE),
    ("tegn", I::T, Fi::ENG, F::COMMON_TYPO),
    ("teng", I::T, Fi::ENG, F::NONE),
    ("ten", I::T, Fi::ENG, F::EN_ENG),
    ("tei", I::T, Fi::EI, F::NONE),
    ("te", I::T, Fi::E, F::NONE),
    ("tao", I::T, Fi::AO, F::NONE),
    ("tagn", I::T, Fi::ANG, F::COMMON_TYPO),
    ("tang", I::T, Fi::ANG, F::NONE),
    ("tan", I::T, Fi::AN, F::NONE),
    ("tai", I::T, Fi::AI, F::NONE),
    ("ta", I::T, Fi::A, F::NONE),
    ("suo", I::S, Fi::UO, F::NONE),
    ("sun", I::S, Fi::UN, F::NONE),
    ("sui", I::S, Fi::UI, F::NONE),
    ("suagn", I::SH, Fi::UANG, F::S_SH.with(F::COMMON_TYPO)),
    ("suang", I::SH, Fi::UANG, F::S_SH),
    ("suagn", I::S, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("suang", I::S, Fi::UAN, F::UAN_UANG),
    ("suan", I::S, Fi::UAN, F::NONE),
    ("suai", I::SH, Fi::UAI, F::S_SH),
    ("sua", I::SH, Fi::UA, F::S_SH),
    ("su", I::S, Fi::U, F::NONE),
    ("sou", I::S, Fi::OU, F::NONE),
    ("sogn", I::S, Fi::ONG, F::COMMON_TYPO),
    ("son", I::S, Fi::ONG, F::COMMON_TYPO),
    ("song", I::S, Fi::ONG, F::NONE),
    ("si", I::S, Fi::I, F::NONE),
    ("shuo", I::SH, Fi::UO, F::NONE),
    ("shun", I::SH, Fi::UN, F::NONE),
    ("shui", I::SH, Fi::UI, F::NONE),
    ("shuagn", I::SH, Fi::UANG, F::COMMON_TYPO),
    ("shuang", I::SH, Fi::UANG, F::NONE),
    ("shuan", I::SH, Fi::UAN, F::NONE),
    ("shuai", I::SH, Fi::UAI, F::NONE),
    ("shua", I::SH, Fi::UA, F::NONE),
    ("shu", I::SH, Fi::U, F::NONE),
    ("shou", I::SH, Fi::OU, F::NONE),
    ("shi", I::SH, Fi::I, F::NONE),
    ("shegn", I::SH, Fi::ENG, F::COMMON_TYPO),
    ("sheng", I::SH, Fi::ENG, F::NONE),
    ("shen", I::SH, Fi::EN, F::NONE),
    ("shei", I::SH, Fi::EI, F::NONE),
    ("she", I::SH, Fi::E, F::NONE),
    ("shao", I::SH, Fi::AO, F::NONE),
    ("shagn", I::SH, Fi::ANG, F::COMMON_TYPO),
    ("shang", I::SH, Fi::ANG, F::NONE),
    ("shan", I::SH, Fi::AN, F::NONE),
    ("shai", I::SH, Fi::AI, F::NONE),
    ("sha", I::SH, Fi::A, F::NONE),
    ("segn", I::S, Fi::ENG, F::COMMON_TYPO),
    ("seng", I::S, Fi::ENG, F::NONE),
    ("sen", I::S, Fi::EN, F::NONE),
    ("se", I::S, Fi::E, F::NONE),
    ("sao", I::S, Fi::AO, F::NONE),
    ("sagn", I::S, Fi::ANG, F::COMMON_TYPO),
    ("sang", I::S, Fi::ANG, F::NONE),
    ("san", I::S, Fi::AN, F::NONE),
    ("sai", I::S, Fi::AI, F::NONE),
    ("sa", I::S, Fi::A, F::NONE),
    ("rua", I::R, Fi::UA, F::NONE),
    ("r", I::R, Fi::Zero, F::NONE),
    ("ruo", I::R, Fi::UO, F::NONE),
    ("run", I::R, Fi::UN, F::NONE),
    ("rui", I::R, Fi::UI, F::NONE),
    ("ruagn", I::R, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("ruang", I::R, Fi::UAN, F::UAN_UANG),
    ("ruan", I::R, Fi::UAN, F::NONE),
    ("ru", I::R, Fi::U, F::NONE),
    ("rou", I::R, Fi::OU, F::NONE),
    ("rogn", I::R, Fi::ONG, F::COMMON_TYPO),
    ("ron", I::R, Fi::ONG, F::COMMON_TYPO),
    ("rong", I::R, Fi::ONG, F::NONE),
    ("ri", I::R, Fi::I, F::NONE),
    ("regn", I::R, Fi::ENG, F::COMMON_TYPO),
    ("reng", I::R, Fi::ENG, F::NONE),
    ("ren", I::R, Fi::EN, F::NONE),
    ("re", I::R, Fi::E, F::NONE),
    ("rao", I::R, Fi::AO, F::NONE),
    ("ragn", I::R, Fi::ANG, F::COMMON_TYPO),
    ("rang", I::R, Fi::ANG, F::NONE),
    ("ran", I::R, Fi::AN, F::NONE),
    ("qun", I::Q, Fi::UN, F::NONE),
    ("que", I::Q, Fi::UE, F::NONE),
    ("qve", I::Q, Fi::UE, F::COMMON_TYPO),
    ("quagn", I::Q, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("quang", I::Q, Fi::UAN, F::UAN_UANG),
    ("qvagn", I::Q, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("qvang", I::Q, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("quan", I::Q, Fi::UAN, F::NONE),
    ("qvan", I::Q, Fi::UAN, F::COMMON_TYPO),
    ("qu", I::Q, Fi::U, F::NONE),
    ("qv", I::Q, Fi::U, F::COMMON_TYPO),
    ("qiu", I::Q, Fi::IU, F::NONE),
    ("qiogn", I::Q, Fi::IONG, F::COMMON_TYPO),
    ("qion", I::Q, Fi::IONG, F::COMMON_TYPO),
    ("qiong", I::Q, Fi::IONG, F::NONE),
    ("qign", I::Q, Fi::ING, F::COMMON_TYPO),
    ("qing", I::Q, Fi::ING, F::NONE),
    ("qin", I::Q, Fi::IN, F::NONE),
    ("qie", I::Q, Fi::IE, F::NONE),
    ("qiao", I::Q, Fi::IAO, F::NONE),
    ("qiagn", I::Q, Fi::IANG, F::COMMON_TYPO),
    ("qiang", I::Q, Fi::IANG, F::NONE),
    ("qian", I::Q, Fi::IAN, F::NONE),
    ("qia", I::Q, Fi::IA, F::NONE),
    ("qi", I::Q, Fi::I, F::NONE),
    ("pu", I::P, Fi::U, F::NONE),
    ("pou", I::P, Fi::OU, F::NONE),
    ("po", I::P, Fi::O, F::NONE),
    ("pign", I::P, Fi::ING, F::COMMON_TYPO),
    ("ping", I::P, Fi::ING, F::NONE),
    ("pin", I::P, Fi::IN, F::NONE),
    ("pie", I::P, Fi::IE, F::NONE),
    ("piao", I::P, Fi::IAO, F::NONE),
    ("piagn", I::P, Fi::IAN, F::IAN_IANG.with(F::COMMON_TYPO)),
    ("piang", I::P, Fi::IAN, F::IAN_IANG),
    ("pian", I::P, Fi::IAN, F::NONE),
    ("pi", I::P, Fi::I, F::NONE),
    ("pegn", I::P, Fi::ENG, F::COMMON_TYPO),
    ("peng", I::P, Fi::ENG, F::NONE),
    ("pen", I::P, Fi::EN, F::NONE),
    ("pei", I::P, Fi::EI, F::NONE),
    ("pao", I::P, Fi::AO, F::NONE),
    ("pagn", I::P, Fi::ANG, F::COMMON_TYPO),
    ("pang", I::P, Fi::ANG, F::NONE),
    ("pan", I::P, Fi::AN, F::NONE),
    ("pai", I::P, Fi::AI, F::NONE),
    ("pa", I::P, Fi::A, F::NONE),
    ("ou", I::Zero, Fi::OU, F::NONE),
    ("o", I::Zero, Fi::O, F::NONE),
    ("nve", I::N, Fi::VE, F::NONE),
    ("nv", I::N, Fi::V, F::NONE),
    ("nuo", I::N, Fi::UO, F::NONE),
    ("nun", I::N, Fi::UN, F::NONE),
    ("nue", I::N, Fi::VE, F::VE_UE),
    ("nuagn", I::N, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("nuang", I::N, Fi::UAN, F::UAN_UANG),
    ("nuan", I::N, Fi::UAN, F::NONE),
    ("nu", I::N, Fi::U, F::NONE),
    ("nou", I::N, Fi::OU, F::NONE),
    ("nogn", I::N, Fi::ONG, F::COMMON_TYPO),
    ("non", I::N, Fi::ONG, F::COMMON_TYPO),
    ("nong", I::N, Fi::ONG, F::NONE),
    ("niu", I::N, Fi::IU, F::NONE),
    ("nign", I::N, Fi::ING, F::COMMON_TYPO),
    ("ning", I::N, Fi::ING, F::NONE),
    ("nia", I::N, Fi::IA, F::NONE),
    ("nin", I::N, Fi::IN, F::NONE),
    ("nie", I::N, Fi::IE, F::NONE),
    ("niao", I::N, Fi::IAO, F::NONE),
    ("niagn", I::N, Fi::IANG, F::COMMON_TYPO),
    ("niang", I::N, Fi::IANG, F::NONE),
    ("nian", I::N, Fi::IAN, F::NONE),
    ("ni", I::N, Fi::I, F::NONE),
    ("ng", I::Zero, Fi::NG, F::NONE),
    ("negn", I::N, Fi::ENG, F::COMMON_TYPO),
    ("neng", I::N, Fi::ENG, F::NONE),
    ("nen", I::N, Fi::EN, F::NONE),
    ("nei", I::N, Fi::EI, F::NONE),
    ("ne", I::N, Fi::E, F::NONE),
    ("nao", I::N, Fi::AO, F::NONE),
    ("nagn", I::N, Fi::ANG, F::COMMON_TYPO),
    ("nang", I::N, Fi::ANG, F::NONE),
    ("nan", I::N, Fi::AN, F::NONE),
    ("nai", I::N, Fi::AI, F::NONE),
    ("na", I::N, Fi::A, F::NONE),
    ("n", I::N, Fi::Zero, F::NONE),
    ("mu", I::M, Fi::U, F::NONE),
    ("mou", I::M, Fi::OU, F::NONE),
    ("mo", I::M, Fi::O, F::NONE),
    ("miu", I::M, Fi::IU, F::NONE),
    ("mign", I::M, Fi::ING, F::COMMON_TYPO),
    ("ming", I::M, Fi::ING, F::NONE),
    ("min", I::M, Fi::IN, F::NONE),
    ("mie", I::M, Fi::IE, F::NONE),
    ("miao", I::M, Fi::IAO, F::NONE),
    ("miagn", I::M, Fi::IAN, F::IAN_IANG.with(F::COMMON_TYPO)),
    ("miang", I::M, Fi::IAN, F::IAN_IANG),
    ("mian", I::M, Fi::IAN, F::NONE),
    ("mi", I::M, Fi::I, F::NONE),
    ("megn", I::M, Fi::ENG, F::COMMON_TYPO),
    ("meng", I::M, Fi::ENG, F::NONE),
    ("men", I::M, Fi::EN, F::NONE),
    ("mei", I::M, Fi::EI, F::NONE),
    ("me", I::M, Fi::E, F::NONE),
    ("mao", I::M, Fi::AO, F::NONE),
    ("magn", I::M, Fi::ANG, F::COMMON_TYPO),
    ("mang", I::M, Fi::ANG, F::NONE),
    ("man", I::M, Fi::AN, F::NONE),
    ("mai", I::M, Fi::AI, F::NONE),
    ("ma", I::M, Fi::A, F::NONE),
    ("m", I::M, Fi::Zero, F::NONE),
    ("lve", I::L, Fi::VE, F::NONE),
    ("lv", I::L, Fi::V, F::NONE),
    ("luo", I::L, Fi::UO, F::NONE),
    ("lun", I::L, Fi::UN, F::NONE),
    ("lue", I::L, Fi::VE, F::VE_UE),
    ("luagn", I::L, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("luang", I::L, Fi::UAN, F::UAN_UANG),
    ("luan", I::L, Fi::UAN, F::NONE),
    ("lu", I::L, Fi::U, F::NONE),
    ("lou", I::L, Fi::OU, F::NONE),
    ("logn", I::L, Fi::ONG, F::COMMON_TYPO),
    ("lon", I::L, Fi::ONG, F::COMMON_TYPO),
    ("long", I::L, Fi::ONG, F::NONE),
    ("lo", I::L, Fi::O, F::NONE),
    ("liu", I::L, Fi::IU, F::NONE),
    ("lign", I::L, Fi::ING, F::COMMON_TYPO),
    ("ling", I::L, Fi::ING, F::NONE),
    ("lin", I::L, Fi::IN, F::NONE),
    ("lie", I::L, Fi::IE, F::NONE),
    ("liao", I::L, Fi::IAO, F::NONE),
    ("liagn", I::L, Fi::IANG, F::COMMON_TYPO),
    ("liang", I::L, Fi::IANG, F::NONE),
    ("lian", I::L, Fi::IAN, F::NONE),
    ("lia", I::L, Fi::IA, F::NONE),
    ("li", I::L, Fi::I, F::NONE),
    ("legn", I::L, Fi::ENG, F::COMMON_TYPO),
    ("leng", I::L, Fi::ENG, F::NONE),
    ("len", I::L, Fi::ENG, F::EN_ENG),
    ("lei", I::L, Fi::EI, F::NONE),
    ("le", I::L, Fi::E, F::NONE),
    ("lao", I::L, Fi::AO, F::NONE),
    ("lagn", I::L, Fi::ANG, F::COMMON_TYPO),
    ("lang", I::L, Fi::ANG, F::NONE),
    ("lan", I::L, Fi::AN, F::NONE),
    ("lai", I::L, Fi::AI, F::NONE),
    ("la", I::L, Fi::A, F::NONE),
    ("kuo", I::K, Fi::UO, F::NONE),
    ("kun", I::K, Fi::UN, F::NONE),
    ("kui", I::K, Fi::UI, F::NONE),
    ("kuagn", I::K, Fi::UANG, F::COMMON_TYPO),
    ("kuang", I::K, Fi::UANG, F::NONE),
    ("kuan", I::K, Fi::UAN, F::NONE),
    ("kuai", I::K, Fi::UAI, F::NONE),
    ("kua", I::K, Fi::UA, F::NONE),
    ("ku", I::K, Fi::U, F::NONE),
    ("kou", I::K, Fi::OU, F::NONE),
    ("kogn", I::K, Fi::ONG, F::COMMON_TYPO),
    ("kon", I::K, Fi::ONG, F::COMMON_TYPO),
    ("kong", I::K, Fi::ONG, F::NONE),
    ("kegn", I::K, Fi::ENG, F::COMMON_TYPO),
    ("keng", I::K, Fi::ENG, F::NONE),
    ("ken", I::K, Fi::EN, F::NONE),
    ("kei", I::K, Fi::EI, F::NONE),
    ("ke", I::K, Fi::E, F::NONE),
    ("kao", I::K, Fi::AO, F::NONE),
    ("kagn", I::K, Fi::ANG, F::COMMON_TYPO),
    ("kang", I::K, Fi::ANG, F::NONE),
    ("kan", I::K, Fi::AN, F::NONE),
    ("kai", I::K, Fi::AI, F::NONE),
    ("ka", I::K, Fi::A, F::NONE),
    ("jun", I::J, Fi::UN, F::NONE),
    ("jue", I::J, Fi::UE, F::NONE),
    ("jve", I::J, Fi::UE, F::COMMON_TYPO),
    ("juagn", I::J, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("juang", I::J, Fi::UAN, F::UAN_UANG),
    ("jvagn", I::J, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("jvang", I::J, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("juan", I::J, Fi::UAN, F::NONE),
    ("jvan", I::J, Fi::UAN, F::COMMON_TYPO),
    ("ju", I::J, Fi::U, F::NONE),
    ("jv", I::J, Fi::U, F::COMMON_TYPO),
    ("jiu", I::J, Fi::IU, F::NONE),
    ("jiogn", I::J, Fi::IONG, F::COMMON_TYPO),
    ("jion", I::J, Fi::IONG, F::COMMON_TYPO),
    ("jiong", I::J, Fi::IONG, F::NONE),
    ("jign", I::J, Fi::ING, F::COMMON_TYPO),
    ("jing", I::J, Fi::ING, F::NONE),
    ("jin", I::J, Fi::IN, F::NONE),
    ("jie", I::J, Fi::IE, F::NONE),
    ("jiao", I::J, Fi::IAO, F::NONE),
    ("jiagn", I::J, Fi::IANG, F::COMMON_TYPO),
    ("jiang", I::J, Fi::IANG, F::NONE),
    ("jian", I::J, Fi::IAN, F::NONE),
    ("jia", I::J, Fi::IA, F::NONE),
    ("ji", I::J, Fi::I, F::NONE),
    ("huo", I::H, Fi::UO, F::NONE),
    ("hun", I::H, Fi::UN, F::NONE),
    ("hui", I::H, Fi::UI, F::NONE),
    ("huagn", I::H, Fi::UANG, F::COMMON_TYPO),
    ("huang", I::H, Fi::UANG, F::NONE),
    ("huan", I::H, Fi::UAN, F::NONE),
    ("huai", I::H, Fi::UAI, F::NONE),
    ("hua", I::H, Fi::UA, F::NONE),
    ("hu", I::H, Fi::U, F::NONE),
    ("hou", I::H, Fi::OU, F::NONE),
    ("hogn", I::H, Fi::ONG, F::COMMON_TYPO),
    ("hon", I::H, Fi::ONG, F::COMMON_TYPO),
    ("hong", I::H, Fi::ONG, F::NONE),
    ("hegn", I::H, Fi::ENG, F::COMMON_TYPO),
    ("heng", I::H, Fi::ENG, F::NONE),
    ("hen", I::H, Fi::EN, F::NONE),
    ("hei", I::H, Fi::EI, F::NONE),
    ("he", I::H, Fi::E, F::NONE),
    ("hao", I::H, Fi::AO, F::NONE),
    ("hagn", I::H, Fi::ANG, F::COMMON_TYPO),
    ("hang", I::H, Fi::ANG, F::NONE),
    ("han", I::H, Fi::AN, F::NONE),
    ("hai", I::H, Fi::AI, F::NONE),
    ("ha", I::H, Fi::A, F::NONE),
    ("guo", I::G, Fi::UO, F::NONE),
    ("gun", I::G, Fi::UN, F::NONE),
    ("gui", I::G, Fi::UI, F::NONE),
    ("guagn", I::G, Fi::UANG, F::COMMON_TYPO),
    ("guang", I::G, Fi::UANG, F::NONE),
    ("guan", I::G, Fi::UAN, F::NONE),
    ("guai", I::G, Fi::UAI, F::NONE),
    ("gua", I::G, Fi::UA, F::NONE),
    ("gu", I::G, Fi::U, F::NONE),
    ("gou", I::G, Fi::OU, F::NONE),
    ("gogn", I::G, Fi::ONG, F::COMMON_TYPO),
    ("gon", I::G, Fi::ONG, F::COMMON_TYPO),
    ("gong", I::G, Fi::ONG, F::NONE),
    ("gegn", I::G, Fi::ENG, F::COMMON_TYPO),
    ("geng", I::G, Fi::ENG, F::NONE),
    ("gen", I::G, Fi::EN, F::NONE),
    ("gei", I::G, Fi::EI, F::NONE),
    ("ge", I::G, Fi::E, F::NONE),
    ("gao", I::G, Fi::AO, F::NONE),
    ("gagn", I::G, Fi::ANG, F::COMMON_TYPO),
    ("gang", I::G, Fi::ANG, F::NONE),
    ("gan", I::G, Fi::AN, F::NONE),
    ("gai", I::G, Fi::AI, F::NONE),
    ("ga", I::G, Fi::A, F::NONE),
    ("fuai", I::H, Fi::UAI, F::F_H),
    ("fu", I::F, Fi::U, F::NONE),
    ("fou", I::F, Fi::OU, F::NONE),
    ("fo", I::F, Fi::O, F::NONE),
    ("fiao", I::F, Fi::IAO, F::NONE),
    ("fegn", I::F, Fi::ENG, F::COMMON_TYPO),
    ("feng", I::F, Fi::ENG, F::NONE),
    ("fen", I::F, Fi::EN, F::NONE),
    ("fei", I::F, Fi::EI, F::NONE),
    ("fagn", I::F, Fi::ANG, F::COMMON_TYPO),
    ("fang", I::F, Fi::ANG, F::NONE),
    ("fan", I::F, Fi::AN, F::NONE),
    ("fa", I::F, Fi::A, F::NONE),
    ("er", I::Zero, Fi::ER, F::NONE),
    ("egn", I::Zero, Fi::ENG, F::COMMON_TYPO),
    ("eng", I::Zero, Fi::ENG, F::NONE),
    ("en", I::Zero, Fi::EN, F::NONE),
    ("ei", I::Zero, Fi::EI, F::NONE),
    ("e", I::Zero, Fi::E, F::NONE),
    ("duo", I::D, Fi::UO, F::NONE),
    ("dun", I::D, Fi::UN, F::NONE),
    ("dui", I::D, Fi::UI, F::NONE),
    ("duagn", I::D, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("duang", I::D, Fi::UAN, F::UAN_UANG),
    ("duan", I::D, Fi::UAN, F::NONE),
    ("du", I::D, Fi::U, F::NONE),
    ("dou", I::D, Fi::OU, F::NONE),
    ("dogn", I::D, Fi::ONG, F::COMMON_TYPO),
    ("don", I::D, Fi::ONG, F::COMMON_TYPO),
    ("dong", I::D, Fi::ONG, F::NONE),
    ("diu", I::D, Fi::IU, F::NONE),
    ("dign", I::D, Fi::ING, F::COMMON_TYPO),
    ("ding", I::D, Fi::ING, F::NONE),
    ("din", I::D, Fi::IN, F::NONE),
    ("din", I::D, Fi::ING, F::COMMON_TYPO),
    ("die", I::D, Fi::IE, F::NONE),
    ("diao", I::D, Fi::IAO, F::NONE),
    ("diagn", I::D, Fi::IAN, F::IAN_IANG.with(F::COMMON_TYPO)),
    ("diang", I::D, Fi::IAN, F::IAN_IANG),
    ("dian", I::D, Fi::IAN, F::NONE),
    ("dia", I::D, Fi::IA, F::NONE),
    ("di", I::D, Fi::I, F::NONE),
    ("degn", I::D, Fi::ENG, F::COMMON_TYPO),
    ("deng", I::D, Fi::ENG, F::NONE),
    ("den", I::D, Fi::EN, F::NONE),
    ("dei", I::D, Fi::EI, F::NONE),
    ("de", I::D, Fi::E, F::NONE),
    ("dao", I::D, Fi::AO, F::NONE),
    ("dagn", I::D, Fi::ANG, F::COMMON_TYPO),
    ("dang", I::D, Fi::ANG, F::NONE),
    ("dan", I::D, Fi::AN, F::NONE),
    ("dai", I::D, Fi::AI, F::NONE),
    ("da", I::D, Fi::A, F::NONE),
    ("cuo", I::C, Fi::UO, F::NONE),
    ("cun", I::C, Fi::UN, F::NONE),
    ("cui", I::C, Fi::UI, F::NONE),
    ("cuagn", I::C, Fi::UAN, F::UAN_UANG.with(F::COMMON_TYPO)),
    ("cuang", I::C, Fi::UAN, F::UAN_UANG),
    ("cuagn", I::CH, Fi::UANG, F::C_CH.with(F::COMMON_TYPO)),
    ("cuang", I::CH, Fi::UANG, F::C_CH),
    ("cuan", I::C, Fi::UAN, F::NONE),
    ("cuai", I::CH, Fi::UAI, F::C_CH),
    ("cu", I::C, Fi::U, F::NONE),
    ("cou", I::C, Fi::OU, F::NONE),
    ("cogn", I::C, Fi::ONG, F::COMMON_TYPO),
    ("con", I::C, Fi::ONG, F::COMMON_TYPO),
    ("cong", I::C, Fi::ONG, F::NONE),
    ("ci", I::C, Fi::I, F::NONE),
    ("chuo", I::CH, Fi::UO, F::NONE),
    ("chun", I::CH, Fi::UN, F::NONE),
    ("chui", I::CH, Fi::UI, F::NONE),
    ("chuagn", I::CH, Fi::UANG, F::COMMON_TYPO),
    ("chuang", I::CH, Fi::UANG, F::NONE),
    ("chuan", I::CH, Fi::UAN, F::NONE),
    ("chuai", I::CH, Fi::UAI, F::NONE),
    ("chua", I::CH, Fi::UA, F::NONE),
    ("chu", I::CH, Fi::U, F::NONE),
    ("chou", I::CH, Fi::OU, F::NONE),
    ("chogn", I::CH, Fi::ONG, F::COMMON_TYPO),
    ("chon", I::CH, Fi::ONG, F::COMMON_TYPO),
    ("chong", I::CH, Fi::ONG, F::NONE),
    ("chi", I::CH, Fi::I, F::NONE),
    ("chegn", I::CH, Fi::ENG, F::COMMON_TYPO),
    ("cheng", I::CH, Fi::ENG, F::NONE),
    ("chen", I::CH, Fi::EN, F::NONE),
    ("che", I::CH, Fi::E, F::NONE),
    ("chao", I::CH, Fi::AO, F::NONE),
    ("chagn", I::CH, Fi::ANG, F::COMMON_TYPO),
    ("chang", I::CH, Fi::ANG, F::NONE),
    ("chan", I::CH, Fi::AN, F::NONE),
    ("chai", I::CH, Fi::AI, F::NONE),
    ("cha", I::CH, Fi::A, F::NONE),
    ("cegn", I::C, Fi::ENG, F::COMMON_TYPO),
    ("ceng", I::C, Fi::ENG, F::NONE),
    ("cen", I::C, Fi::EN, F::NONE),
    ("ce", I::C, Fi::E, F::NONE),
    ("cao", I::C, Fi::AO, F::NONE),
    ("cagn", I::C, Fi::ANG, F::COMMON_TYPO),
    ("cang", I::C, Fi::ANG, F::NONE),
    ("can", I::C, Fi::AN, F::NONE),
    ("cai", I::C, Fi::AI, F::NONE),
    ("ca", I::C, Fi::A, F::NONE),
    ("bu", I::B, Fi::U, F::NONE),
    ("bogn", I::B, Fi::ONG, F::COMMON_TYPO),
    ("bong", I::B, Fi::ONG, F::NONE),
    ("bon", I::B, Fi::ONG, F::COMMON_TYPO),
    ("bo", I::B, Fi::O, F::NONE),
    ("bign", I::B, Fi::ING, F::COMMON_TYPO),
    ("bing", I::B, Fi::ING, F::NONE),
    ("bin", I::B, Fi::IN, F::NONE),
    ("bie", I::B, Fi::IE, F::NONE),
    ("biao", I::B, Fi::IAO, F::NONE),
    ("biagn", I::B, Fi::IANG, F::COMMON_TYPO),
    ("biang", I::B, Fi::IANG, F::NONE),
    ("bian", I::B, Fi::IAN, F::NONE),
    ("bi", I::B, Fi::I, F::NONE),
    ("begn", I::B, Fi::ENG, F::COMMON_TYPO),
    ("beng", I::B, Fi::ENG, F::NONE),
    ("ben", I::B, Fi::EN, F::NONE),
    ("bei", I::B, Fi::EI, F::NONE),
    ("bao", I::B, Fi::AO, F::NONE),
    ("bagn", I::B, Fi::ANG, F::COMMON_TYPO),
    ("bang", I::B, Fi::ANG, F::NONE),
    ("ban", I::B, Fi::AN, F::NONE),
    ("bai", I::B, Fi::AI, F::NONE),
    ("ba", I::B, Fi::A, F::NONE),
    ("ao", I::Zero, Fi::AO, F::NONE),
    ("agn", I::Zero, Fi::ANG, F::COMMON_TYPO),
    ("ang", I::Zero, Fi::ANG, F::NONE),
    ("an", I::Zero, Fi::AN, F::NONE),
    ("ai", I::Zero, Fi::AI, F::NONE),
    ("a", I::Zero, Fi::A, F::NONE),
];

static ENCODED_INITIAL_FINAL: &[u16] = &[
    660, 241, 384, 481, 388, 409, 415, 326, 497, 425, 327, 329, 220, 331, 55, 332,
    336, 350, 352, 253, 43, 255, 799, 256, 417, 257, 272, 268, 567, 269, 353, 224,
    264, 144, 36, 448, 277, 271, 217, 283, 107, 72, 73, 74, 75, 78, 79, 533,
    450, 275, 254, 115, 80, 85, 90, 182, 583, 360, 87, 91, 237, 330, 95, 77,
    410, 605, 221, 10, 727, 222, 542, 335, 862, 234, 236, 232, 231, 196, 785, 233,
    347, 239, 245, 247, 158, 838, 840, 733, 38, 652, 76, 44, 619, 162, 328, 228,
    18, 49, 54, 51, 218, 37, 52, 57, 46, 447, 198, 424, 449, 460, 455, 251,
    465, 461, 614, 615, 160, 390, 616, 413, 532, 775, 416, 7, 802, 267, 349, 484,
    367, 648, 620, 798, 756, 262, 589, 485, 280, 548, 419, 749, 386, 451, 411, 649,
    759, 496, 564, 625, 656, 59, 219, 777, 508, 201, 490, 227, 659, 445, 487, 745,
    606, 793, 209, 676, 270, 324, 312, 768, 348, 795, 184, 767, 482, 834, 314, 412,
    512, 654, 454, 815, 639, 223, 603, 761, 244, 385, 88, 675, 486, 723, 289, 637,
    779, 517, 292, 651, 6, 452, 527, 183, 784, 661, 325, 155, 835, 429, 769, 89,
    207, 789, 483, 653, 195, 724, 489, 229, 551, 531, 576, 171, 792, 760, 260, 581,
    208, 453, 623, 677, 530, 266, 418, 650, 2, 515, 516, 351, 510, 509, 265, 671,
    501, 281, 504, 235, 636, 655, 534, 640, 528, 186, 511, 641, 263, 371, 582, 387,
    553, 721, 588, 673, 506, 541, 203, 192, 40, 191, 617, 193, 758, 188, 794, 216,
    185, 248, 258, 584, 748, 505, 361, 725, 766, 488, 48, 82, 93, 414, 149, 491,
    181, 284, 180, 577, 600, 747, 159, 205, 743, 732, 731, 13, 800, 836, 601, 42,
    728, 604, 579, 84, 16, 602, 599, 580, 354, 252, 711, 722, 39, 720, 389, 647,
    624, 578, 507, 273, 635, 529, 446, 383, 317, 372, 368, 366, 365, 364, 566, 363,
    362, 313, 315, 685, 318, 316, 3, 311, 300, 299, 296, 295, 294, 543, 293, 291,
    290, 288, 15, 131, 120, 118, 124, 156, 116, 114, 111, 110, 108, 837, 833, 169,
    173, 172, 167, 161, 165, 157, 152, 151, 150, 687, 148, 147, 146, 145, 709, 713,
    4, 712, 707, 696, 695, 697, 565, 569, 570, 568, 563, 552, 547, 545, 544, 540,
    692, 691, 689, 688, 686, 684, 23, 21, 19, 8, 1, 0, 832, 831, 830, 829,
    828, 230, 20, 163, 803, 11,
];

/// Spellings hiding an inner two-syllable boundary and their split.
pub static INNER_SEGMENT: phf::Map<&'static str, (&'static str, &'static str)> = phf::phf_map! {
    "zuo" => ("zu", "o"),
    "zao" => ("za", "o"),
    "yue" => ("yu", "e"),
    "yve" => ("yv", "e"),
    "yao" => ("ya", "o"),
    "xue" => ("xu", "e"),
    "xve" => ("xv", "e"),
    "xie" => ("xi", "e"),
    "xia" => ("xi", "a"),
    "tuo" => ("tu", "o"),
    "tie" => ("ti", "e"),
    "tao" => ("ta", "o"),
    "suo" => ("su", "o"),
    "sao" => ("sa", "o"),
    "rua" => ("ru", "a"),
    "ruo" => ("ru", "o"),
    "que" => ("qu", "e"),
    "qve" => ("qv", "e"),
    "qie" => ("qi", "e"),
    "qia" => ("qi", "a"),
    "pie" => ("pi", "e"),
    "pao" => ("pa", "o"),
    "nve" => ("nv", "e"),
    "nue" => ("nu", "e"),
    "nuo" => ("nu", "o"),
    "nie" => ("ni", "e"),
    "nao" => ("na", "o"),
    "mie" => ("mi", "e"),
    "mao" => ("ma", "o"),
    "lve" => ("lv", "e"),
    "lue" => ("lu", "e"),
    "luo" => ("lu", "o"),
    "lie" => ("li", "e"),
    "lia" => ("li", "a"),
    "lao" => ("la", "o"),
    "kuo" => ("ku", "o"),
    "kua" => ("ku", "a"),
    "kao" => ("ka", "o"),
    "jue" => ("ju", "e"),
    "jve" => ("jv", "e"),
    "jie" => ("ji", "e"),
    "jia" => ("ji", "a"),
    "huo" => ("hu", "o"),
    "hua" => ("hu", "a"),
    "hao" => ("ha", "o"),
    "guo" => ("gu", "o"),
    "gua" => ("gu", "a"),
    "gao" => ("ga", "o"),
    "duo" => ("du", "o"),
    "die" => ("di", "e"),
    "dia" => ("di", "a"),
    "dao" => ("da", "o"),
    "cuo" => ("cu", "o"),
    "cao" => ("ca", "o"),
    "bie" => ("bi", "e"),
    "bao" => ("ba", "o"),
    "nia" => ("ni", "a"),
    "xiao" => ("xi", "ao"),
    "xiang" => ("xi", "ang"),
    "xian" => ("xi", "an"),
    "jiao" => ("ji", "ao"),
    "jiang" => ("ji", "ang"),
    "jian" => ("ji", "an"),
    "luan" => ("lu", "an"),
    "miao" => ("mi", "ao"),
    "mian" => ("mi", "an"),
    "kuang" => ("ku", "ang"),
    "kuan" => ("ku", "an"),
    "kuai" => ("ku", "ai"),
    "nuan" => ("nu", "an"),
    "piao" => ("pi", "ao"),
    "pian" => ("pi", "an"),
    "quan" => ("qu", "an"),
    "quang" => ("qu", "ang"),
    "qvan" => ("qv", "an"),
    "qvang" => ("qv", "ang"),
    "juan" => ("ju", "an"),
    "juang" => ("ju", "ang"),
    "jvan" => ("jv", "an"),
    "jvang" => ("jv", "ang"),
    "qiao" => ("qi", "ao"),
    "qiang" => ("qi", "ang"),
    "qian" => ("qi", "an"),
    "yuang" => ("yu", "ang"),
    "yvang" => ("yv", "ang"),
    "yuan" => ("yu", "an"),
    "yvan" => ("yv", "an"),
    "zhuang" => ("zhu", "ang"),
    "zhuan" => ("zhu", "an"),
    "zhuai" => ("zhu", "ai"),
    "niao" => ("ni", "ao"),
    "niang" => ("ni", "ang"),
    "nian" => ("ni", "an"),
    "liao" => ("li", "ao"),
    "liang" => ("li", "ang"),
    "lian" => ("li", "an"),
    "zuan" => ("zu", "an"),
    "tuan" => ("tu", "an"),
    "tiao" => ("ti", "ao"),
    "tian" => ("ti", "an"),
    "xuang" => ("xu", "ang"),
    "xvang" => ("xv", "ang"),
    "xuan" => ("xu", "an"),
    "xvan" => ("xv", "an"),
    "suan" => ("su", "an"),
    "biao" => ("bi", "ao"),
    "bian" => ("bi", "an"),
    "shuang" => ("shu", "ang"),
    "shuan" => ("shu", "an"),
    "shuai" => ("shu", "ai"),
    "ruan" => ("ru", "an"),
    "huang" => ("hu", "ang"),
    "huan" => ("hu", "an"),
    "huai" => ("hu", "ai"),
    "guang" => ("gu", "ang"),
    "guan" => ("gu", "an"),
    "guai" => ("gu", "ai"),
    "duan" => ("du", "an"),
    "diao" => ("di", "ao"),
    "dian" => ("di", "an"),
    "cuan" => ("cu", "an"),
    "chuang" => ("chu", "ang"),
    "chuan" => ("chu", "an"),
    "chuai" => ("chu", "ai"),
    "biang" => ("bi", "ang"),
};
