//! Runtime options of a table input method.

use std::collections::HashSet;

/// Candidate ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Dictionary index order (plus code length when configured).
    #[default]
    No,
    /// User-learned words first, then index order.
    Fast,
    /// By history-bigram and model sentence score.
    Freq,
}

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub order_policy: OrderPolicy,
    /// Codes up to this length keep a stable dictionary order.
    pub no_sort_input_length: u32,
    pub auto_select: bool,
    /// Commit automatically when the code reaches this length;
    /// negative means the table's code length.
    pub auto_select_length: i32,
    pub auto_select_regex: String,
    /// Commit the previous segment when a keystroke has no match and
    /// the code reaches this length; negative means the code length.
    pub no_match_auto_select_length: i32,
    pub no_match_auto_select_regex: String,
    pub commit_raw_input: bool,
    pub end_key: HashSet<char>,
    /// Wildcard key matching any input code, if any.
    pub matching_key: Option<char>,
    pub exact_match: bool,
    pub learning: bool,
    /// Maximum learned auto-phrase length; negative means the code
    /// length.
    pub auto_phrase_length: i32,
    /// Promote an auto phrase into the user dictionary after this many
    /// hits; zero or negative disables promotion.
    pub save_auto_phrase_after: i32,
    /// Rules usable for segmenting max-length input.
    pub auto_rule_set: HashSet<String>,
    pub language_code: String,
    pub sort_by_code_length: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            order_policy: OrderPolicy::No,
            no_sort_input_length: 0,
            auto_select: false,
            auto_select_length: 0,
            auto_select_regex: String::new(),
            no_match_auto_select_length: 0,
            no_match_auto_select_regex: String::new(),
            commit_raw_input: false,
            end_key: HashSet::new(),
            matching_key: None,
            exact_match: false,
            learning: true,
            auto_phrase_length: -1,
            save_auto_phrase_after: -1,
            auto_rule_set: HashSet::new(),
            language_code: String::new(),
            sort_by_code_length: false,
        }
    }
}
