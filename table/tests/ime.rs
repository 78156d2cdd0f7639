//! End-to-end table input over a small wubi-like fixture.

use std::cell::RefCell;
use std::sync::Arc;

use libhan_core::{LanguageModel, NGramModel, UserLanguageModel};
use libhan_table::{
    OrderPolicy, PhraseFlag, TableBasedDictionary, TableContext, TableFormat, TableOptions,
};

const TABLE: &str = "\
KeyCode=abcdefghijklmnopqrstuvwxy
Length=4
[Rule]
e2=p11+p12+p21+p22
a4=p11+p21+p31+n11
[Data]
ggll 王
ssss 林
ggg 三
aaaa 工
aaa 式
lc 测试
";

fn fixtures() -> (RefCell<TableBasedDictionary>, RefCell<UserLanguageModel>) {
    let mut dict = TableBasedDictionary::new();
    dict.load(&mut TABLE.as_bytes(), TableFormat::Text).unwrap();
    let mut model = NGramModel::new();
    for (w, p) in [("王", -2.0f32), ("林", -2.1), ("三", -2.2), ("测试", -1.9)] {
        model.add_word(w, p);
    }
    let model = UserLanguageModel::new(LanguageModel::new(Arc::new(model)));
    (RefCell::new(dict), RefCell::new(model))
}

#[test]
fn full_code_and_selection() {
    let (dict, model) = fixtures();
    let mut ctx = TableContext::new(&dict, &model);
    assert!(ctx.type_str("ggll"));
    let idx = ctx
        .candidates()
        .iter()
        .position(|c| c.text() == "王")
        .expect("王 offered");
    ctx.select(idx);
    assert!(ctx.selected());
    assert_eq!(ctx.selected_sentence(), "王");
}

#[test]
fn learned_phrase_comes_back() {
    let (dict, model) = fixtures();
    {
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("ggll");
        let idx = ctx
            .candidates()
            .iter()
            .position(|c| c.text() == "王")
            .unwrap();
        ctx.select(idx);
        ctx.type_str("ssss");
        let idx = ctx
            .candidates()
            .iter()
            .position(|c| c.text() == "林")
            .unwrap();
        ctx.select(idx);
        assert!(ctx.selected());
        ctx.learn();
    }
    // each committed segment entered the user dictionary
    assert_eq!(dict.borrow().word_exists("ggll", "王"), PhraseFlag::User);
    assert_eq!(dict.borrow().word_exists("ssss", "林"), PhraseFlag::User);
    // and the sentence fed the history bigram
    let model = model.borrow();
    assert!(model.history().unigram_freq("王") > 0.0);
    assert!(model.history().bigram_freq("王", "林") > 0.0);
}

#[test]
fn freq_policy_prefers_history() {
    let (dict, model) = fixtures();
    {
        let mut options = TableOptions::default();
        options.order_policy = OrderPolicy::Freq;
        dict.borrow_mut().set_table_options(options);
    }
    model
        .borrow_mut()
        .history_mut()
        .add(&["式".to_string()]);
    let mut ctx = TableContext::new(&dict, &model);
    ctx.type_str("aaa");
    let texts: Vec<String> = ctx.candidates().iter().map(|c| c.text()).collect();
    assert!(texts.contains(&"工".to_string()), "{texts:?}");
    assert!(texts.contains(&"式".to_string()), "{texts:?}");
    assert_eq!(texts[0], "式");
}

#[test]
fn user_dict_roundtrip_through_context() {
    let (dict, model) = fixtures();
    {
        let mut ctx = TableContext::new(&dict, &model);
        ctx.type_str("ggll");
        let idx = ctx
            .candidates()
            .iter()
            .position(|c| c.text() == "王")
            .unwrap();
        ctx.select(idx);
        ctx.learn();
    }
    let mut buf = Vec::new();
    dict.borrow_mut()
        .save_user(&mut buf, TableFormat::Binary)
        .unwrap();

    let (dict2, _model2) = fixtures();
    dict2
        .borrow_mut()
        .load_user(&mut std::io::Cursor::new(&buf), TableFormat::Binary)
        .unwrap();
    assert_eq!(dict2.borrow().word_exists("ggll", "王"), PhraseFlag::User);
}
