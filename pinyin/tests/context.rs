//! End-to-end pinyin session tests over a small built-in fixture.

use std::sync::Arc;

use libhan_core::{LanguageModel, NGramModel, UserLanguageModel};
use libhan_pinyin::{
    PinyinContext, PinyinDictFormat, PinyinDictionary, PinyinFuzzyFlags, PinyinIme,
    PinyinPreeditMode, ShuangpinBuiltinProfile, ShuangpinProfile,
};

const DICT: &str = "\
你好 ni'hao -1.8
你 ni -2.5
尼 ni -4.0
好 hao -2.6
中国 zhong'guo -1.9
中 zhong -2.8
国 guo -2.9
显示 xian'shi -2.0
先是 xian'shi -3.0
现实 xian'shi -2.4
子集 zi'ji -2.6
各自 ge'zi -2.7
冰淇淋 bing'qi'lin -2.2
冰 bing -3.0
其 qi -3.1
林 lin -3.2
";

fn fixture_model() -> NGramModel {
    let mut m = NGramModel::new();
    for (w, p) in [
        ("你好", -1.8f32),
        ("你", -2.5),
        ("尼", -4.0),
        ("好", -2.6),
        ("中国", -1.9),
        ("中", -2.8),
        ("国", -2.9),
        ("显示", -2.0),
        ("先是", -3.0),
        ("现实", -2.4),
        ("子集", -2.6),
        ("各自", -2.7),
        ("冰淇淋", -2.2),
        ("冰", -3.0),
        ("其", -3.1),
        ("林", -3.2),
    ] {
        m.add_word(w, p);
    }
    m.set_bigram("你好", "中国", -0.4, 0.0);
    m
}

fn fixture_ime() -> PinyinIme {
    let mut dict = PinyinDictionary::new();
    dict.load(
        PinyinDictionary::SYSTEM_DICT,
        &mut DICT.as_bytes(),
        PinyinDictFormat::Text,
    )
    .unwrap();
    let model = UserLanguageModel::new(LanguageModel::new(Arc::new(fixture_model())));
    PinyinIme::new(dict, model)
}

#[test]
fn xianshi_candidates_include_all_variants() {
    let ime = fixture_ime();
    ime.set_fuzzy_flags(PinyinFuzzyFlags::INNER);
    let mut ctx = PinyinContext::new(&ime);
    assert!(ctx.type_str("xianshi"));

    let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
    assert!(texts.contains(&"显示".to_string()), "{texts:?}");
    assert!(texts.contains(&"先是".to_string()), "{texts:?}");
    assert!(texts.contains(&"现实".to_string()), "{texts:?}");
    assert_eq!(texts[0], "显示");
}

#[test]
fn cancel_restores_full_candidates() {
    let ime = fixture_ime();
    ime.set_fuzzy_flags(PinyinFuzzyFlags::INNER);
    let mut ctx = PinyinContext::new(&ime);
    ctx.type_str("xianshi");
    let before: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();

    ctx.select(0);
    assert!(ctx.selected());
    ctx.cancel();
    assert!(!ctx.selected());
    let after: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
    assert_eq!(before, after);

    // cancel with nothing selected is a no-op
    ctx.cancel();
    assert_eq!(ctx.user_input(), "xianshi");
}

#[test]
fn nihaozhongguo_select_all() {
    let ime = fixture_ime();
    let mut ctx = PinyinContext::new(&ime);
    assert!(ctx.type_str("nihaozhongguo"));
    assert_eq!(ctx.candidates()[0].text(), "你好中国");

    ctx.select(0);
    assert!(ctx.selected());
    assert_eq!(ctx.selected_sentence(), "你好中国");
}

#[test]
fn learning_reaches_history() {
    let ime = fixture_ime();
    let mut ctx = PinyinContext::new(&ime);
    assert!(ctx.type_str("zi'ji'ge'zi'"));

    let idx = ctx
        .candidates()
        .iter()
        .position(|c| c.text() == "子集")
        .expect("子集 offered");
    ctx.select(idx);
    let idx = ctx
        .candidates()
        .iter()
        .position(|c| c.text() == "各自")
        .expect("各自 offered");
    ctx.select(idx);

    assert!(ctx.selected());
    ctx.learn();
    assert!(ime.model().history().unigram_freq("各自") > 0.0);
    assert!(ime.model().history().unigram_freq("子集") > 0.0);
}

#[test]
fn empty_input_has_no_candidates() {
    let ime = fixture_ime();
    let ctx = PinyinContext::new(&ime);
    assert!(ctx.candidates().is_empty());
    assert!(!ctx.selected());
}

#[test]
fn unknown_single_letter_still_offers_raw_candidate() {
    let ime = fixture_ime();
    let mut ctx = PinyinContext::new(&ime);
    assert!(ctx.type_str("v"));
    // not a valid initial: the raw segment is the only candidate
    assert!(!ctx.candidates().is_empty());
    assert_eq!(ctx.candidates()[0].text(), "v");
}

#[test]
fn erase_everything_resets() {
    let ime = fixture_ime();
    let mut ctx = PinyinContext::new(&ime);
    ctx.type_str("nihao");
    assert!(!ctx.candidates().is_empty());
    ctx.erase(0, ctx.size());
    assert!(ctx.is_empty());
    assert!(ctx.candidates().is_empty());
    // erase with from == to is a no-op
    ctx.erase(0, 0);
    assert!(ctx.is_empty());
}

#[test]
fn incremental_typing_matches_full_typing() {
    let ime = fixture_ime();
    let mut a = PinyinContext::new(&ime);
    for c in "nihao".chars() {
        assert!(a.type_str(&c.to_string()));
    }
    let mut b = PinyinContext::new(&ime);
    b.type_str("nihao");
    let texts_a: Vec<String> = a.candidates().iter().map(|c| c.text()).collect();
    let texts_b: Vec<String> = b.candidates().iter().map(|c| c.text()).collect();
    assert_eq!(texts_a, texts_b);
    assert_eq!(texts_a[0], "你好");
}

#[test]
fn candidates_have_unique_surface_strings() {
    let ime = fixture_ime();
    ime.set_fuzzy_flags(PinyinFuzzyFlags::INNER);
    let mut ctx = PinyinContext::new(&ime);
    ctx.type_str("xianshi");
    let mut seen = std::collections::HashSet::new();
    for c in ctx.candidates() {
        assert!(seen.insert(c.text()), "duplicate candidate {}", c.text());
    }
}

#[test]
fn preedit_renders_selected_prefix_and_pinyin() {
    let ime = fixture_ime();
    ime.set_preedit_mode(PinyinPreeditMode::Pinyin);
    let mut ctx = PinyinContext::new(&ime);
    ctx.type_str("nihao");
    let (text, cursor) = ctx.preedit();
    assert_eq!(text, "ni hao");
    assert_eq!(cursor, text.len());

    let idx = ctx
        .candidates()
        .iter()
        .position(|c| c.text() == "你")
        .expect("你 offered");
    ctx.select(idx);
    let (text, _) = ctx.preedit();
    assert!(text.starts_with('你'), "{text}");
    assert!(text.contains("hao"), "{text}");
}

#[test]
fn xiaohe_shuangpin_types_bingqilin() {
    let ime = fixture_ime();
    ime.set_shuangpin_profile(Some(Arc::new(ShuangpinProfile::builtin(
        ShuangpinBuiltinProfile::Xiaohe,
    ))));
    let mut ctx = PinyinContext::new(&ime);
    ctx.set_use_shuangpin(true);
    assert!(ctx.type_str("bkqilb"));
    let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
    assert!(texts.contains(&"冰淇淋".to_string()), "{texts:?}");
}

#[test]
fn selected_sentence_matches_committed_words() {
    let ime = fixture_ime();
    let mut ctx = PinyinContext::new(&ime);
    ctx.type_str("nihao");
    ctx.select(0);
    assert!(ctx.selected());
    assert_eq!(ctx.selected_sentence(), "你好");
    assert_eq!(ctx.selected_words(), vec!["你好".to_string()]);
    assert_eq!(ctx.selected_full_pinyin(), "ni'hao");
}

#[test]
fn dictionary_mutation_invalidates_match_caches() {
    let ime = fixture_ime();
    let mut ctx = PinyinContext::new(&ime);
    ctx.type_str("nihao");
    assert_eq!(ctx.candidates()[0].text(), "你好");

    ime.dict_mut()
        .add_word(PinyinDictionary::USER_DICT, "ni'hao", "妮好", -0.1)
        .unwrap();
    // retype; the context notices the generation change
    ctx.erase(0, ctx.size());
    ctx.type_str("nihao");
    let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
    assert!(texts.contains(&"妮好".to_string()), "{texts:?}");
}
