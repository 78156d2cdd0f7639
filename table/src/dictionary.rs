//! Table ("shape code") dictionary.
//!
//! Entries are `code \x01 word` strings in count-indexed tries: the
//! base phrase trie, the user trie, optional extra tries, plus reverse
//! lookup tries for single characters (driving construct-phrase rules),
//! a prompt trie and a deletion trie masking base entries. Binary
//! formats carry a big-endian magic and version followed by a
//! zstd-compressed payload.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};

use regex::Regex;
use tracing::warn;

use ahash::AHashSet;
use libhan_core::datrie::DATrie;
use libhan_core::{
    io, Dictionary, Error, MatchCallback, MatchedWord, NodeId, Result, SegmentGraph,
};

use crate::autophrase::AutoPhraseDict;
use crate::options::TableOptions;
use crate::rule::{TableRule, TableRuleEntryFlag, TableRuleFlag};

pub(crate) const KEY_VALUE_SEPARATOR: char = '\u{1}';

const TABLE_BINARY_FORMAT_MAGIC: u32 = 0x000f_cabe;
const TABLE_BINARY_FORMAT_VERSION: u32 = 0x2;
const USER_TABLE_BINARY_FORMAT_MAGIC: u32 = 0x356f_cabe;
const USER_TABLE_BINARY_FORMAT_VERSION: u32 = 0x3;
const EXTRA_TABLE_BINARY_FORMAT_MAGIC: u32 = 0x6b0f_cabe;
const EXTRA_TABLE_BINARY_FORMAT_VERSION: u32 = 0x1;

pub(crate) const TABLE_AUTOPHRASE_SIZE: usize = 256;

const USER_DICT_AUTO_MARK: &str = "[Auto]";
const USER_DICT_DELETE_MARK: &str = "[Delete]";

/// Origin and handling class of a dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhraseFlag {
    #[default]
    None,
    Pinyin,
    Prompt,
    ConstructPhrase,
    User,
    Auto,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Text,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMatchMode {
    Exact,
    Prefix,
}

/// Extra lattice data carried by table matches.
#[derive(Debug, Clone, Default)]
pub struct TablePayload {
    pub code: String,
    pub index: u32,
    pub flag: PhraseFlag,
}

pub type TableMatchCallback<'a> = dyn FnMut(&str, &str, u32, PhraseFlag) -> bool + 'a;

fn entry_of(key: &str, value: &str) -> String {
    let mut out = String::with_capacity(key.len() + value.len() + 1);
    out.push_str(key);
    out.push(KEY_VALUE_SEPARATOR);
    out.push_str(value);
    out
}

fn maybe_unescape_value(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    } else {
        value.to_string()
    }
}

fn maybe_escape_value(value: &str) -> String {
    if value
        .chars()
        .any(|c| c.is_whitespace() || c == '"' || c == '\\')
    {
        let mut out = String::from("\"");
        for c in value.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        out
    } else {
        value.to_string()
    }
}

fn max_value(trie: &DATrie<u32>) -> u32 {
    let mut max = 0;
    trie.foreach(|value, _, _| {
        max = max.max(value + 1);
        true
    });
    max
}

fn insert_or_update_trie(
    trie: &mut DATrie<u32>,
    index: &mut u32,
    entry: &str,
    update_existing: bool,
) -> bool {
    if trie.has_exact_match(entry.as_bytes()) && !update_existing {
        return false;
    }
    trie.set(entry.as_bytes(), *index);
    *index += 1;
    true
}

/// Keep only the longest key per value in a reverse lookup trie.
fn update_reverse_lookup_entry(
    trie: &mut DATrie<i32>,
    key: &str,
    value: &str,
    mut reverse_trie: Option<&mut DATrie<i32>>,
) {
    let reverse_entry = entry_of(value, "");
    let mut insert = true;
    let mut stale: Option<(u64, Vec<u8>)> = None;
    trie.foreach_prefix(reverse_entry.as_bytes(), |_, len, pos| {
        if key.len() > len {
            stale = Some((pos, trie.suffix(len, pos)));
        } else {
            insert = false;
        }
        false
    });
    if let Some((pos, old_key)) = stale {
        trie.erase_at(pos);
        if let Some(reverse) = reverse_trie.as_deref_mut() {
            if let Ok(old_key) = String::from_utf8(old_key) {
                reverse.erase(entry_of(&old_key, value).as_bytes());
            }
        }
    }
    if insert {
        let mut full = reverse_entry;
        full.push_str(key);
        trie.set(full.as_bytes(), 1);
        if let Some(reverse) = reverse_trie {
            reverse.set(entry_of(key, value).as_bytes(), 1);
        }
    }
}

fn save_trie_to_text(trie: &DATrie<u32>, writer: &mut impl Write) -> Result<()> {
    let mut entries: Vec<(String, String, u32)> = Vec::new();
    trie.foreach(|value, len, pos| {
        let bytes = trie.suffix(len, pos);
        if let Ok(text) = String::from_utf8(bytes) {
            if let Some(sep) = text.find(KEY_VALUE_SEPARATOR) {
                entries.push((
                    text[..sep].to_string(),
                    text[sep + KEY_VALUE_SEPARATOR.len_utf8()..].to_string(),
                    value,
                ));
            }
        }
        true
    });
    entries.sort_by_key(|(_, _, index)| *index);
    for (key, value, _) in entries {
        writeln!(writer, "{} {}", key, maybe_escape_value(&value))?;
    }
    Ok(())
}

fn zstd_compress_into(writer: &mut impl Write, payload: &[u8]) -> Result<()> {
    let compressed =
        zstd::stream::encode_all(payload, 0).map_err(|e| Error::Io(e))?;
    writer.write_all(&compressed)?;
    Ok(())
}

fn zstd_decompress(reader: &mut impl Read) -> Result<Vec<u8>> {
    zstd::stream::decode_all(reader).map_err(|e| Error::invalid_data(e.to_string()))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    #[default]
    Config,
    Rule,
    Data,
    Phrase,
}

pub struct TableBasedDictionary {
    rules: Vec<TableRule>,
    input_code: HashSet<char>,
    ignore_chars: HashSet<char>,
    pinyin_key: Option<char>,
    prompt_key: Option<char>,
    phrase_key: Option<char>,
    code_length: u32,
    phrase_trie: DATrie<u32>,
    phrase_trie_index: u32,
    user_trie: DATrie<u32>,
    user_trie_index: u32,
    deletion_trie: DATrie<u32>,
    single_char_trie: DATrie<i32>,
    single_char_const_trie: DATrie<i32>,
    single_char_lookup_trie: DATrie<i32>,
    prompt_trie: DATrie<u32>,
    extra_tries: Vec<(DATrie<u32>, u32)>,
    auto_phrase_dict: AutoPhraseDict,
    options: TableOptions,
    pub(crate) auto_select_regex: Option<Regex>,
    pub(crate) no_match_auto_select_regex: Option<Regex>,
    generation: u64,
}

impl std::fmt::Debug for TableBasedDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableBasedDictionary")
            .field("code_length", &self.code_length)
            .field("rules", &self.rules.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for TableBasedDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBasedDictionary {
    pub fn new() -> Self {
        TableBasedDictionary {
            rules: Vec::new(),
            input_code: HashSet::new(),
            ignore_chars: HashSet::new(),
            pinyin_key: None,
            prompt_key: None,
            phrase_key: None,
            code_length: 0,
            phrase_trie: DATrie::new(),
            phrase_trie_index: 0,
            user_trie: DATrie::new(),
            user_trie_index: 0,
            deletion_trie: DATrie::new(),
            single_char_trie: DATrie::new(),
            single_char_const_trie: DATrie::new(),
            single_char_lookup_trie: DATrie::new(),
            prompt_trie: DATrie::new(),
            extra_tries: Vec::new(),
            auto_phrase_dict: AutoPhraseDict::new(TABLE_AUTOPHRASE_SIZE),
            options: TableOptions::default(),
            auto_select_regex: None,
            no_match_auto_select_regex: None,
            generation: 0,
        }
    }

    fn reset(&mut self) {
        let generation = self.generation;
        let language_code = std::mem::take(&mut self.options.language_code);
        *self = TableBasedDictionary::new();
        self.generation = generation;
        self.options.language_code = language_code;
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_rule(&self) -> bool {
        !self.rules.is_empty()
    }

    pub fn has_custom_prompt(&self) -> bool {
        !self.prompt_trie.is_empty()
    }

    pub fn has_pinyin(&self) -> bool {
        self.pinyin_key.is_some()
    }

    /// Configured code length of the table.
    pub fn max_length(&self) -> u32 {
        self.code_length
    }

    pub fn is_valid_length(&self, length: usize) -> bool {
        length <= self.code_length as usize
    }

    pub fn is_input_code(&self, c: char) -> bool {
        self.input_code.contains(&c)
    }

    pub fn is_all_input_code(&self, code: &str) -> bool {
        code.chars().all(|c| self.is_input_code(c))
    }

    pub fn is_end_key(&self, c: char) -> bool {
        self.options.end_key.contains(&c)
    }

    pub fn find_rule(&self, name: &str) -> Option<&TableRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    pub fn table_options(&self) -> &TableOptions {
        &self.options
    }

    pub fn set_table_options(&mut self, mut options: TableOptions) {
        if options.auto_select_length < 0 {
            options.auto_select_length = self.max_length() as i32;
        }
        if options.no_match_auto_select_length < 0 {
            options.no_match_auto_select_length = self.max_length() as i32;
        }
        if options.auto_phrase_length < 0 {
            options.auto_phrase_length = self.max_length() as i32;
        }
        self.auto_select_regex = (!options.auto_select_regex.is_empty())
            .then(|| Regex::new(&options.auto_select_regex).ok())
            .flatten();
        self.no_match_auto_select_regex = (!options.no_match_auto_select_regex.is_empty())
            .then(|| Regex::new(&options.no_match_auto_select_regex).ok())
            .flatten();
        self.options = options;
    }

    fn validate_config(&self) -> Result<()> {
        if self.input_code.is_empty() {
            return Err(Error::invalid_data("table has no KeyCode"));
        }
        for key in [self.pinyin_key, self.prompt_key, self.phrase_key]
            .into_iter()
            .flatten()
        {
            if self.input_code.contains(&key) {
                return Err(Error::invalid_data("special key overlaps input code"));
            }
        }
        Ok(())
    }

    // ---- text format -----------------------------------------------

    pub fn load(&mut self, reader: &mut impl Read, format: TableFormat) -> Result<()> {
        match format {
            TableFormat::Text => self.load_text(reader),
            TableFormat::Binary => self.load_binary(reader),
        }
    }

    fn load_text(&mut self, reader: &mut impl Read) -> Result<()> {
        self.reset();

        let mut phase = LoadPhase::Config;
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            match phase {
                LoadPhase::Config => {
                    if line.starts_with('#') {
                        continue;
                    }
                    if let Some(code) = strip_option(line, "键码=", "KeyCode=") {
                        self.input_code = code.chars().collect();
                    } else if let Some(len) = strip_option(line, "码长=", "Length=") {
                        self.code_length = len.parse().map_err(|_| {
                            Error::invalid_data("invalid code length")
                        })?;
                    } else if let Some(chars) = strip_option(line, "规避字符=", "InvalidChar=") {
                        self.ignore_chars = chars.chars().collect();
                    } else if let Some(key) = strip_option(line, "拼音=", "Pinyin=") {
                        self.pinyin_key = key.chars().next();
                    } else if let Some(key) = strip_option(line, "提示=", "Prompt=") {
                        self.prompt_key = key.chars().next();
                    } else if let Some(key) = strip_option(line, "构词=", "ConstructPhrase=") {
                        self.phrase_key = key.chars().next();
                    } else if strip_option(line, "拼音长度=", "PinyinLength=").is_some() {
                        // deprecated option
                    } else if is_section(line, "[数据]", "[Data]") {
                        self.validate_config()?;
                        phase = LoadPhase::Data;
                    } else if is_section(line, "[组词规则]", "[Rule]") {
                        phase = LoadPhase::Rule;
                    }
                }
                LoadPhase::Rule => {
                    if line.starts_with('#') || line.is_empty() {
                        continue;
                    }
                    if is_section(line, "[数据]", "[Data]") {
                        self.validate_config()?;
                        phase = LoadPhase::Data;
                        continue;
                    }
                    match TableRule::parse(line, self.code_length) {
                        Ok(rule) => self.rules.push(rule),
                        Err(_) => warn!(line = %line, "invalid rule line, skipping"),
                    }
                }
                LoadPhase::Data => {
                    if is_section(line, "[词组]", "[Phrase]") {
                        if !self.has_rule() {
                            return Err(Error::invalid_data(
                                "file has a phrase section but no rule",
                            ));
                        }
                        phase = LoadPhase::Phrase;
                        continue;
                    }
                    self.insert_data_line(line, false);
                }
                LoadPhase::Phrase => {
                    let value = maybe_unescape_value(line);
                    if !value.is_empty() {
                        self.insert_phrase(&value, PhraseFlag::None);
                    }
                }
            }
        }

        if phase != LoadPhase::Data && phase != LoadPhase::Phrase {
            return Err(Error::invalid_data("table text is missing a data section"));
        }
        self.bump();
        Ok(())
    }

    fn parse_data_line(&self, line: &str, user: bool) -> Option<(String, String, PhraseFlag)> {
        let mut split = line.splitn(2, char::is_whitespace);
        let key = split.next()?;
        let value = split.next()?.trim_start();
        if key.is_empty() || value.is_empty() {
            return None;
        }
        let value = maybe_unescape_value(value);

        let mut key = key.to_string();
        let mut flag = if user { PhraseFlag::User } else { PhraseFlag::None };
        let first = key.chars().next()?;
        let special = [
            (self.pinyin_key, PhraseFlag::Pinyin),
            (self.phrase_key, PhraseFlag::ConstructPhrase),
            (self.prompt_key, PhraseFlag::Prompt),
        ];
        for (special_key, special_flag) in special {
            if special_key == Some(first) {
                if user {
                    return None;
                }
                flag = special_flag;
                key.drain(..first.len_utf8());
                break;
            }
        }
        Some((key, value, flag))
    }

    fn insert_data_line(&mut self, line: &str, user: bool) {
        if let Some((key, value, flag)) = self.parse_data_line(line, user) {
            self.insert(&key, &value, flag, false);
        }
    }

    pub fn save(&mut self, writer: &mut impl Write, format: TableFormat) -> Result<()> {
        match format {
            TableFormat::Text => self.save_text(writer),
            TableFormat::Binary => self.save_binary(writer),
        }
    }

    fn save_text(&mut self, writer: &mut impl Write) -> Result<()> {
        write!(writer, "KeyCode=")?;
        let mut codes: Vec<char> = self.input_code.iter().copied().collect();
        codes.sort_unstable();
        for c in codes {
            write!(writer, "{}", c)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Length={}", self.code_length)?;
        if !self.ignore_chars.is_empty() {
            let mut chars: Vec<char> = self.ignore_chars.iter().copied().collect();
            chars.sort_unstable();
            write!(writer, "InvalidChar=")?;
            for c in chars {
                write!(writer, "{}", c)?;
            }
            writeln!(writer)?;
        }
        if let Some(key) = self.pinyin_key {
            writeln!(writer, "Pinyin={}", key)?;
        }
        if let Some(key) = self.prompt_key {
            writeln!(writer, "Prompt={}", key)?;
        }
        if let Some(key) = self.phrase_key {
            writeln!(writer, "ConstructPhrase={}", key)?;
        }
        if self.has_rule() {
            writeln!(writer, "[Rule]")?;
            for rule in &self.rules {
                writeln!(writer, "{}", rule.to_rule_string())?;
            }
        }
        writeln!(writer, "[Data]")?;
        if let Some(prompt_key) = self.prompt_key {
            let trie = &self.prompt_trie;
            let mut rows = Vec::new();
            trie.foreach(|_, len, pos| {
                if let Ok(text) = String::from_utf8(trie.suffix(len, pos)) {
                    if let Some(sep) = text.find(KEY_VALUE_SEPARATOR) {
                        rows.push((text[..sep].to_string(), text[sep + 1..].to_string()));
                    }
                }
                true
            });
            for (key, value) in rows {
                writeln!(writer, "{}{} {}", prompt_key, value, maybe_escape_value(&key))?;
            }
        }
        if let Some(phrase_key) = self.phrase_key {
            let trie = &self.single_char_const_trie;
            let mut rows = Vec::new();
            trie.foreach(|_, len, pos| {
                if let Ok(text) = String::from_utf8(trie.suffix(len, pos)) {
                    if let Some(sep) = text.find(KEY_VALUE_SEPARATOR) {
                        rows.push((text[..sep].to_string(), text[sep + 1..].to_string()));
                    }
                }
                true
            });
            for (key, value) in rows {
                writeln!(writer, "{}{} {}", phrase_key, value, maybe_escape_value(&key))?;
            }
        }
        save_trie_to_text(&self.phrase_trie, writer)
    }

    // ---- binary format ---------------------------------------------

    fn load_binary(&mut self, reader: &mut impl Read) -> Result<()> {
        let magic = io::read_u32(reader)?;
        if magic != TABLE_BINARY_FORMAT_MAGIC {
            return Err(Error::invalid_data("invalid table magic"));
        }
        let version = io::read_u32(reader)?;
        match version {
            1 => self.load_binary_payload(reader)?,
            TABLE_BINARY_FORMAT_VERSION => {
                let payload = zstd_decompress(reader)?;
                self.load_binary_payload(&mut std::io::Cursor::new(payload))?;
            }
            _ => return Err(Error::invalid_data("invalid table version")),
        }
        self.bump();
        Ok(())
    }

    fn load_binary_payload(&mut self, reader: &mut impl Read) -> Result<()> {
        self.reset();
        self.pinyin_key = char_from_u32(io::read_u32(reader)?);
        self.prompt_key = char_from_u32(io::read_u32(reader)?);
        self.phrase_key = char_from_u32(io::read_u32(reader)?);
        self.code_length = io::read_u32(reader)?;

        let count = io::read_u32(reader)?;
        for _ in 0..count {
            if let Some(c) = char_from_u32(io::read_u32(reader)?) {
                self.input_code.insert(c);
            }
        }
        let count = io::read_u32(reader)?;
        for _ in 0..count {
            if let Some(c) = char_from_u32(io::read_u32(reader)?) {
                self.ignore_chars.insert(c);
            }
        }
        let count = io::read_u32(reader)?;
        for _ in 0..count {
            self.rules.push(TableRule::load(reader)?);
        }
        self.phrase_trie = DATrie::load(reader)?;
        self.phrase_trie_index = max_value(&self.phrase_trie);
        self.single_char_trie = DATrie::load(reader)?;
        if self.has_rule() {
            self.single_char_const_trie = DATrie::load(reader)?;
            self.single_char_lookup_trie = DATrie::load(reader)?;
        }
        if self.prompt_key.is_some() {
            self.prompt_trie = DATrie::load(reader)?;
        }
        Ok(())
    }

    fn save_binary(&mut self, writer: &mut impl Write) -> Result<()> {
        io::write_u32(writer, TABLE_BINARY_FORMAT_MAGIC)?;
        io::write_u32(writer, TABLE_BINARY_FORMAT_VERSION)?;

        let mut payload = Vec::new();
        io::write_u32(&mut payload, char_to_u32(self.pinyin_key))?;
        io::write_u32(&mut payload, char_to_u32(self.prompt_key))?;
        io::write_u32(&mut payload, char_to_u32(self.phrase_key))?;
        io::write_u32(&mut payload, self.code_length)?;
        let mut codes: Vec<char> = self.input_code.iter().copied().collect();
        codes.sort_unstable();
        io::write_u32(&mut payload, codes.len() as u32)?;
        for c in codes {
            io::write_u32(&mut payload, c as u32)?;
        }
        let mut chars: Vec<char> = self.ignore_chars.iter().copied().collect();
        chars.sort_unstable();
        io::write_u32(&mut payload, chars.len() as u32)?;
        for c in chars {
            io::write_u32(&mut payload, c as u32)?;
        }
        io::write_u32(&mut payload, self.rules.len() as u32)?;
        for rule in &self.rules {
            rule.save(&mut payload)?;
        }
        self.phrase_trie.save(&mut payload)?;
        self.single_char_trie.save(&mut payload)?;
        if self.has_rule() {
            self.single_char_const_trie.save(&mut payload)?;
            self.single_char_lookup_trie.save(&mut payload)?;
        }
        if self.prompt_key.is_some() {
            self.prompt_trie.save(&mut payload)?;
        }
        zstd_compress_into(writer, &payload)
    }

    // ---- user dictionary -------------------------------------------

    pub fn load_user(&mut self, reader: &mut impl Read, format: TableFormat) -> Result<()> {
        match format {
            TableFormat::Binary => {
                let magic = io::read_u32(reader)?;
                if magic != USER_TABLE_BINARY_FORMAT_MAGIC {
                    return Err(Error::invalid_data("invalid user table magic"));
                }
                let version = io::read_u32(reader)?;
                match version {
                    1 | 2 => self.load_user_binary(reader, version)?,
                    USER_TABLE_BINARY_FORMAT_VERSION => {
                        let payload = zstd_decompress(reader)?;
                        self.load_user_binary(&mut std::io::Cursor::new(payload), version)?;
                    }
                    _ => return Err(Error::invalid_data("invalid user table version")),
                }
            }
            TableFormat::Text => {
                #[derive(PartialEq)]
                enum UserDictState {
                    Phrase,
                    Auto,
                    Delete,
                }
                let mut state = UserDictState::Phrase;
                for line in BufReader::new(reader).lines() {
                    let line = line?;
                    let line = line.trim();
                    if line == USER_DICT_AUTO_MARK {
                        state = UserDictState::Auto;
                        continue;
                    }
                    if line == USER_DICT_DELETE_MARK {
                        state = UserDictState::Delete;
                        continue;
                    }
                    match state {
                        UserDictState::Phrase => self.insert_data_line(line, true),
                        UserDictState::Auto => {
                            let tokens: Vec<&str> = line.split_whitespace().collect();
                            if tokens.len() != 3 || !self.is_all_input_code(tokens[0]) {
                                continue;
                            }
                            let value = maybe_unescape_value(tokens[1]);
                            let Ok(hit) = tokens[2].parse::<u32>() else {
                                continue;
                            };
                            self.auto_phrase_dict
                                .insert(&entry_of(tokens[0], &value), hit);
                        }
                        UserDictState::Delete => {
                            if let Some((key, value, _)) = self.parse_data_line(line, true) {
                                self.deletion_trie.set(entry_of(&key, &value).as_bytes(), 0);
                            }
                        }
                    }
                }
            }
        }
        self.bump();
        Ok(())
    }

    fn load_user_binary(&mut self, reader: &mut impl Read, version: u32) -> Result<()> {
        self.user_trie = DATrie::load(reader)?;
        self.user_trie_index = max_value(&self.user_trie);
        self.auto_phrase_dict = AutoPhraseDict::new(TABLE_AUTOPHRASE_SIZE);
        self.auto_phrase_dict.load(reader)?;
        if version >= 2 {
            self.deletion_trie = DATrie::load(reader)?;
        } else {
            self.deletion_trie = DATrie::new();
        }
        Ok(())
    }

    pub fn save_user(&mut self, writer: &mut impl Write, format: TableFormat) -> Result<()> {
        match format {
            TableFormat::Binary => {
                io::write_u32(writer, USER_TABLE_BINARY_FORMAT_MAGIC)?;
                io::write_u32(writer, USER_TABLE_BINARY_FORMAT_VERSION)?;
                let mut payload = Vec::new();
                self.user_trie.save(&mut payload)?;
                self.auto_phrase_dict.save(&mut payload)?;
                self.deletion_trie.save(&mut payload)?;
                zstd_compress_into(writer, &payload)
            }
            TableFormat::Text => {
                save_trie_to_text(&self.user_trie, writer)?;
                if !self.auto_phrase_dict.is_empty() {
                    writeln!(writer, "{}", USER_DICT_AUTO_MARK)?;
                    let rows: Vec<(String, u32)> = self
                        .auto_phrase_dict
                        .iter()
                        .map(|(e, hit)| (e.to_string(), hit))
                        .collect();
                    for (entry, hit) in rows.iter().rev() {
                        if let Some(sep) = entry.find(KEY_VALUE_SEPARATOR) {
                            writeln!(
                                writer,
                                "{} {} {}",
                                &entry[..sep],
                                maybe_escape_value(&entry[sep + 1..]),
                                hit
                            )?;
                        }
                    }
                }
                if !self.deletion_trie.is_empty() {
                    writeln!(writer, "{}", USER_DICT_DELETE_MARK)?;
                    save_trie_to_text(&self.deletion_trie, writer)?;
                }
                Ok(())
            }
        }
    }

    // ---- extra dictionaries ----------------------------------------

    pub fn load_extra(&mut self, reader: &mut impl Read, format: TableFormat) -> Result<usize> {
        let mut trie = DATrie::new();
        let mut index = 0;
        match format {
            TableFormat::Binary => {
                let magic = io::read_u32(reader)?;
                if magic != EXTRA_TABLE_BINARY_FORMAT_MAGIC {
                    return Err(Error::invalid_data("invalid extra table magic"));
                }
                let version = io::read_u32(reader)?;
                if version != EXTRA_TABLE_BINARY_FORMAT_VERSION {
                    return Err(Error::invalid_data("invalid extra table version"));
                }
                let payload = zstd_decompress(reader)?;
                trie = DATrie::load(&mut std::io::Cursor::new(payload))?;
                index = max_value(&trie);
            }
            TableFormat::Text => {
                let mut in_phrase_section = false;
                for line in BufReader::new(reader).lines() {
                    let line = line?;
                    let line = line.trim();
                    if is_section(line, "[词组]", "[Phrase]") {
                        in_phrase_section = true;
                        continue;
                    }
                    let (key, value);
                    if in_phrase_section {
                        value = maybe_unescape_value(line);
                        let Some(generated) = self.generate(&value) else {
                            continue;
                        };
                        key = generated;
                    } else if let Some((k, v, flag)) = self.parse_data_line(line, false) {
                        if flag != PhraseFlag::None {
                            continue;
                        }
                        key = k;
                        value = v;
                    } else {
                        continue;
                    }
                    if key.is_empty() || value.is_empty() {
                        continue;
                    }
                    insert_or_update_trie(&mut trie, &mut index, &entry_of(&key, &value), false);
                }
            }
        }
        self.extra_tries.push((trie, index));
        self.bump();
        Ok(self.extra_tries.len() - 1)
    }

    pub fn save_extra(
        &mut self,
        index: usize,
        writer: &mut impl Write,
        format: TableFormat,
    ) -> Result<()> {
        let Some((trie, _)) = self.extra_tries.get_mut(index) else {
            return Err(Error::invalid_argument("invalid extra dict index"));
        };
        match format {
            TableFormat::Binary => {
                io::write_u32(writer, EXTRA_TABLE_BINARY_FORMAT_MAGIC)?;
                io::write_u32(writer, EXTRA_TABLE_BINARY_FORMAT_VERSION)?;
                let mut payload = Vec::new();
                trie.save(&mut payload)?;
                zstd_compress_into(writer, &payload)
            }
            TableFormat::Text => save_trie_to_text(trie, writer),
        }
    }

    pub fn remove_all_extra(&mut self) {
        self.extra_tries.clear();
        self.bump();
    }

    // ---- insertion and lookup --------------------------------------

    fn validate_key_value(&self, key: &str, value: &str, flag: PhraseFlag) -> bool {
        if value.is_empty() || key.is_empty() {
            return false;
        }
        let key_length = key.chars().count();
        if self.code_length != 0 && flag != PhraseFlag::Pinyin && !self.is_valid_length(key_length)
        {
            return false;
        }
        if !self.input_code.is_empty() && flag != PhraseFlag::Pinyin && !self.is_all_input_code(key)
        {
            return false;
        }
        true
    }

    fn insert_raw(&mut self, key: &str, value: &str, flag: PhraseFlag) -> bool {
        let entry = match flag {
            PhraseFlag::Pinyin => {
                let Some(pinyin_key) = self.pinyin_key else {
                    return false;
                };
                let mut e = String::new();
                e.push(pinyin_key);
                e.push_str(key);
                e.push(KEY_VALUE_SEPARATOR);
                e.push_str(value);
                e
            }
            _ => entry_of(key, value),
        };
        let (trie, index) = match flag {
            PhraseFlag::None | PhraseFlag::Pinyin => {
                (&mut self.phrase_trie, &mut self.phrase_trie_index)
            }
            PhraseFlag::User => (&mut self.user_trie, &mut self.user_trie_index),
            _ => return false,
        };
        if flag == PhraseFlag::User {
            self.deletion_trie.erase(entry.as_bytes());
        }
        insert_or_update_trie(trie, index, &entry, flag == PhraseFlag::User)
    }

    /// Insert `value` deriving its code from the construct rules.
    pub fn insert_phrase(&mut self, value: &str, flag: PhraseFlag) -> bool {
        if flag != PhraseFlag::None && flag != PhraseFlag::User {
            return false;
        }
        let Some(key) = self.generate(value) else {
            return false;
        };
        self.insert(&key, value, flag, false)
    }

    pub fn insert(&mut self, key: &str, value: &str, flag: PhraseFlag, verify_with_rule: bool) -> bool {
        if !self.validate_key_value(key, value, flag) {
            return false;
        }

        let inserted = match flag {
            PhraseFlag::Pinyin | PhraseFlag::User | PhraseFlag::None => {
                if flag != PhraseFlag::Pinyin && verify_with_rule && self.has_rule() {
                    match self.generate(value) {
                        Some(check_key) if check_key == key => {}
                        _ => return false,
                    }
                }
                if !self.insert_raw(key, value, flag) {
                    return false;
                }
                if flag == PhraseFlag::None
                    && value.chars().count() == 1
                    && !value
                        .chars()
                        .next()
                        .map_or(false, |c| self.ignore_chars.contains(&c))
                {
                    update_reverse_lookup_entry(&mut self.single_char_trie, key, value, None);
                    if self.has_rule() && self.phrase_key.is_none() {
                        update_reverse_lookup_entry(
                            &mut self.single_char_const_trie,
                            key,
                            value,
                            Some(&mut self.single_char_lookup_trie),
                        );
                    }
                }
                true
            }
            PhraseFlag::Prompt => {
                if key.is_empty() {
                    return false;
                }
                self.prompt_trie.set(entry_of(key, value).as_bytes(), 0);
                true
            }
            PhraseFlag::ConstructPhrase => {
                if self.has_rule() && value.chars().count() == 1 {
                    update_reverse_lookup_entry(
                        &mut self.single_char_const_trie,
                        key,
                        value,
                        Some(&mut self.single_char_lookup_trie),
                    );
                }
                true
            }
            PhraseFlag::Auto => {
                let entry = entry_of(key, value);
                let hit = self.auto_phrase_dict.exact_search(&entry);
                let threshold = self.options.save_auto_phrase_after;
                if threshold >= 1 && threshold as u32 <= hit + 1 {
                    // promotion into the user dictionary
                    self.auto_phrase_dict.erase(&entry);
                    self.insert(key, value, PhraseFlag::User, false);
                } else {
                    self.auto_phrase_dict.insert(&entry, 0);
                }
                true
            }
            PhraseFlag::Invalid => false,
        };
        if inserted {
            self.bump();
        }
        inserted
    }

    /// Derive the code of `value` from the first applicable rule.
    pub fn generate(&self, value: &str) -> Option<String> {
        self.generate_with_hint(value, &[])
    }

    /// Like [`generate`](Self::generate) with per-character code hints
    /// overriding the reverse lookup.
    pub fn generate_with_hint(&self, value: &str, code_hints: &[String]) -> Option<String> {
        if !self.has_rule() || value.is_empty() {
            return None;
        }
        let chars: Vec<char> = value.chars().collect();
        let value_len = chars.len();

        for rule in &self.rules {
            let applicable = match rule.flag() {
                TableRuleFlag::LengthEqual => value_len == rule.phrase_length() as usize,
                TableRuleFlag::LengthLongerThan => value_len >= rule.phrase_length() as usize,
            };
            if !applicable {
                continue;
            }

            let mut hints: Vec<String> = code_hints.to_vec();
            hints.resize(value_len, String::new());
            if !self.validate_hints(&mut hints, rule) {
                continue;
            }

            let mut new_key = String::new();
            let mut success = true;
            let mut used: HashSet<(usize, i32)> = HashSet::new();
            for entry in rule.entries() {
                if entry.is_placeholder() {
                    continue;
                }
                if entry.character() as usize > value_len {
                    success = false;
                    break;
                }
                let index = match entry.flag() {
                    TableRuleEntryFlag::FromFront => entry.character() as usize - 1,
                    TableRuleEntryFlag::FromBack => value_len - entry.character() as usize,
                };
                let chr = chars[index];

                let code = if !hints[index].is_empty() {
                    hints[index].clone()
                } else {
                    self.reverse_lookup(&chr.to_string(), PhraseFlag::ConstructPhrase)
                        .unwrap_or_default()
                };
                if code.is_empty() {
                    success = false;
                    break;
                }

                let code_chars: Vec<char> = code.chars().collect();
                let mut code_index = entry.index();
                if code_chars.len() < code_index.unsigned_abs() as usize {
                    continue;
                }
                if code_index > 0 {
                    code_index -= 1;
                } else {
                    code_index += code_chars.len() as i32;
                }

                // same code byte referenced twice contributes once
                if !used.insert((index, code_index)) {
                    continue;
                }
                new_key.push(code_chars[code_index as usize]);
            }

            if success && !new_key.is_empty() {
                return Some(new_key);
            }
        }
        None
    }

    fn validate_hints(&self, hints: &mut [String], rule: &TableRule) -> bool {
        if hints.len() <= 1 {
            return false;
        }
        for entry in rule.entries() {
            if entry.is_placeholder() {
                continue;
            }
            if entry.character() as usize > hints.len() {
                return false;
            }
            let index = match entry.flag() {
                TableRuleEntryFlag::FromFront => entry.character() as usize - 1,
                TableRuleEntryFlag::FromBack => hints.len() - entry.character() as usize,
            };
            // hints are unusable for tables with a phrase key, or when
            // the entry needs a longer code than the hint has
            if self.phrase_key.is_some()
                || hints[index].chars().count() < entry.index().unsigned_abs() as usize
            {
                hints[index] = String::new();
            }
        }
        true
    }

    /// Code of `word` from the single-character reverse tries.
    pub fn reverse_lookup(&self, word: &str, flag: PhraseFlag) -> Option<String> {
        let trie = match flag {
            PhraseFlag::ConstructPhrase => &self.single_char_const_trie,
            PhraseFlag::None => &self.single_char_trie,
            _ => return None,
        };
        let mut prefix = String::from(word);
        prefix.push(KEY_VALUE_SEPARATOR);
        let mut key = None;
        trie.foreach_prefix(prefix.as_bytes(), |_, len, pos| {
            key = String::from_utf8(trie.suffix(len, pos)).ok();
            false
        });
        key
    }

    /// Replace each code char by its prompt text where defined.
    pub fn hint(&self, key: &str) -> String {
        if self.prompt_key.is_none() {
            return key.to_string();
        }
        let mut result = String::new();
        for c in key.chars() {
            let mut prefix = String::new();
            prefix.push(c);
            prefix.push(KEY_VALUE_SEPARATOR);
            let mut entry = None;
            self.prompt_trie.foreach_prefix(prefix.as_bytes(), |_, len, pos| {
                entry = String::from_utf8(self.prompt_trie.suffix(len, pos)).ok();
                false
            });
            match entry {
                Some(text) if !text.is_empty() => result.push_str(&text),
                _ => result.push(c),
            }
        }
        result
    }

    pub fn word_exists(&self, code: &str, word: &str) -> PhraseFlag {
        let entry = entry_of(code, word);
        if self.user_trie.has_exact_match(entry.as_bytes()) {
            return PhraseFlag::User;
        }
        if self.has_exact_match_in_phrase(&entry)
            && !self.deletion_trie.has_exact_match(entry.as_bytes())
        {
            return PhraseFlag::None;
        }
        if self.auto_phrase_dict.exact_search(&entry) > 0 {
            return PhraseFlag::Auto;
        }
        PhraseFlag::Invalid
    }

    fn has_exact_match_in_phrase(&self, entry: &str) -> bool {
        self.phrase_trie.has_exact_match(entry.as_bytes())
            || self
                .extra_tries
                .iter()
                .any(|(trie, _)| trie.has_exact_match(entry.as_bytes()))
    }

    /// Remove a user/auto word; base entries get masked through the
    /// deletion trie instead.
    pub fn remove_word(&mut self, code: &str, word: &str) {
        let entry = entry_of(code, word);
        self.auto_phrase_dict.erase(&entry);
        self.user_trie.erase(entry.as_bytes());
        if self.has_exact_match_in_phrase(&entry)
            && !self.deletion_trie.has_exact_match(entry.as_bytes())
        {
            self.deletion_trie.set(entry.as_bytes(), 0);
        }
        self.bump();
    }

    // ---- matching --------------------------------------------------

    fn match_trie(
        &self,
        trie: &DATrie<u32>,
        index_offset: u32,
        code: &str,
        mode: TableMatchMode,
        flag: PhraseFlag,
        callback: &mut TableMatchCallback,
    ) -> bool {
        let mut positions: Vec<u64> = vec![0];
        for c in code.chars() {
            let mut next_positions = Vec::new();
            let is_wildcard =
                flag != PhraseFlag::Pinyin && self.options.matching_key == Some(c);
            if is_wildcard {
                for &position in &positions {
                    for &input in &self.input_code {
                        let mut pos = position;
                        let mut buf = [0u8; 4];
                        let s = input.encode_utf8(&mut buf);
                        let result = trie.traverse(s.as_bytes(), &mut pos);
                        if !DATrie::<u32>::is_no_path(result) {
                            next_positions.push(pos);
                        }
                    }
                }
            } else {
                for &position in &positions {
                    let mut pos = position;
                    let mut buf = [0u8; 4];
                    let s = c.encode_utf8(&mut buf);
                    let result = trie.traverse(s.as_bytes(), &mut pos);
                    if !DATrie::<u32>::is_no_path(result) {
                        next_positions.push(pos);
                    }
                }
            }
            positions = next_positions;
        }

        let code_char_len = code.chars().count();
        for position in positions {
            let ok = trie.foreach_from(
                |value, len, pos| {
                    let entry = trie.suffix(code.len() + len, pos);
                    let Ok(text) = String::from_utf8(entry) else {
                        return true;
                    };
                    // wildcard steps may change the prefix byte length,
                    // so scan bytes instead of slicing at code.len()
                    let start = code.len().min(text.len());
                    let Some(sep) = text.as_bytes()[start..]
                        .iter()
                        .position(|&b| b == KEY_VALUE_SEPARATOR as u8)
                        .map(|p| p + start)
                    else {
                        return true;
                    };
                    let matched_code = &text[..sep];
                    let word = &text[sep + KEY_VALUE_SEPARATOR.len_utf8()..];
                    if mode == TableMatchMode::Prefix
                        || (mode == TableMatchMode::Exact
                            && matched_code.chars().count() == code_char_len)
                    {
                        let reported = if flag == PhraseFlag::Pinyin {
                            let first_len = matched_code
                                .chars()
                                .next()
                                .map(char::len_utf8)
                                .unwrap_or(0);
                            &matched_code[first_len..]
                        } else {
                            matched_code
                        };
                        return callback(reported, word, value + index_offset, flag);
                    }
                    true
                },
                position,
            );
            if !ok {
                return false;
            }
        }
        true
    }

    fn match_flagged(
        &self,
        code: &str,
        mode: TableMatchMode,
        flag: PhraseFlag,
        callback: &mut TableMatchCallback,
    ) -> bool {
        let trie = match flag {
            PhraseFlag::None | PhraseFlag::Pinyin => &self.phrase_trie,
            PhraseFlag::User => &self.user_trie,
            _ => return true,
        };
        if !self.match_trie(trie, 0, code, mode, flag, callback) {
            return false;
        }
        if flag == PhraseFlag::None {
            let mut accumulated = self.phrase_trie_index;
            for (trie, index) in &self.extra_tries {
                if !self.match_trie(trie, accumulated, code, mode, flag, callback) {
                    return false;
                }
                accumulated += index;
            }
        }
        true
    }

    fn match_words_internal(
        &self,
        code: &str,
        mode: TableMatchMode,
        only_checking: bool,
        callback: &mut TableMatchCallback,
    ) -> bool {
        // base dictionary behind the deletion mask
        let deletion_trie = &self.deletion_trie;
        let mut masked = |matched_code: &str, word: &str, index: u32, flag: PhraseFlag| {
            if !deletion_trie.is_empty()
                && deletion_trie.has_exact_match(entry_of(matched_code, word).as_bytes())
            {
                return true;
            }
            callback(matched_code, word, index, flag)
        };
        if !self.match_flagged(code, mode, PhraseFlag::None, &mut masked) {
            return false;
        }

        if let Some(pinyin_key) = self.pinyin_key {
            let mut pinyin_code = String::new();
            pinyin_code.push(pinyin_key);
            pinyin_code.push_str(code);
            // pinyin has no code-length cap, so prefix matching kicks
            // in once the code grows past the usual thresholds
            let code_length = code.chars().count() as i32;
            let pinyin_mode = if only_checking
                || (self.options.auto_select_length != 0
                    && code_length >= self.options.auto_select_length)
                || code_length > self.code_length as i32
                || (self.options.no_match_auto_select_length != 0
                    && code_length >= self.options.no_match_auto_select_length)
            {
                TableMatchMode::Prefix
            } else {
                TableMatchMode::Exact
            };
            if !self.match_flagged(&pinyin_code, pinyin_mode, PhraseFlag::Pinyin, callback) {
                return false;
            }
        }

        if !self.match_flagged(code, mode, PhraseFlag::User, callback) {
            return false;
        }

        let code_char_len = code.chars().count();
        self.auto_phrase_dict.search(code, |entry, _| {
            let Some(sep) = entry[code.len()..]
                .find(KEY_VALUE_SEPARATOR)
                .map(|p| p + code.len())
            else {
                return true;
            };
            let matched_code = &entry[..sep];
            if mode == TableMatchMode::Prefix
                || (mode == TableMatchMode::Exact
                    && matched_code.chars().count() == code_char_len)
            {
                return callback(
                    matched_code,
                    &entry[sep + KEY_VALUE_SEPARATOR.len_utf8()..],
                    0,
                    PhraseFlag::Auto,
                );
            }
            true
        })
    }

    pub fn match_words(
        &self,
        code: &str,
        mode: TableMatchMode,
        callback: &mut TableMatchCallback,
    ) -> bool {
        self.match_words_internal(code, mode, false, callback)
    }

    pub fn has_matching_words(&self, code: &str, next: &str) -> bool {
        let mut full = String::from(code);
        full.push_str(next);
        self.has_matching_words_for(&full)
    }

    pub fn has_matching_words_for(&self, code: &str) -> bool {
        let mut has_match = false;
        self.match_words_internal(code, TableMatchMode::Prefix, true, &mut |_, _, _, _| {
            has_match = true;
            false
        });
        has_match
    }

    pub fn has_one_matching_word(&self, code: &str) -> bool {
        // user and base dicts may carry the same entry
        let mut previous: Option<(String, String)> = None;
        let mut unique = true;
        self.match_words(code, TableMatchMode::Prefix, &mut |code, word, _, _| {
            match &previous {
                Some((prev_code, prev_word)) => {
                    if prev_code == code && prev_word == word {
                        true
                    } else {
                        unique = false;
                        false
                    }
                }
                None => {
                    previous = Some((code.to_string(), word.to_string()));
                    true
                }
            }
        });
        unique && previous.is_some()
    }
}

impl Dictionary for TableBasedDictionary {
    type Payload = TablePayload;
    type Helper = ();

    fn match_prefix(
        &self,
        graph: &SegmentGraph,
        ignore: &AHashSet<NodeId>,
        _helper: Option<&mut ()>,
        callback: &mut MatchCallback<'_, TablePayload>,
    ) {
        let has_wildcard = self
            .options
            .matching_key
            .map_or(false, |key| graph.data().contains(key));
        let mode = if self.options.exact_match || has_wildcard {
            TableMatchMode::Exact
        } else {
            TableMatchMode::Prefix
        };

        graph.bfs(0, |graph, offset| {
            let Some(node) = graph.node(offset) else {
                return true;
            };
            if node.prevs().is_empty() {
                return true;
            }
            if let Some(id) = graph.node_id(offset) {
                if ignore.contains(&id) {
                    return true;
                }
            }
            let prevs = node.prevs().to_vec();
            for prev in prevs {
                let path = vec![prev, offset];
                let code = graph.segment(prev, offset);
                let mut aborted = false;
                if code.len() == graph.data().len() {
                    self.match_words(code, mode, &mut |matched_code, word, index, flag| {
                        // keep short codes in stable dictionary order
                        if flag == PhraseFlag::User
                            && matched_code.len() <= self.options.no_sort_input_length as usize
                        {
                            return true;
                        }
                        // single-key pinyin lookups skip long spellings
                        if flag == PhraseFlag::Pinyin
                            && graph.data().len() == 1
                            && matched_code.len() != 1
                        {
                            return true;
                        }
                        let ok = callback(MatchedWord::new(
                            path.clone(),
                            word.to_string(),
                            0.0,
                            TablePayload {
                                code: matched_code.to_string(),
                                index,
                                flag,
                            },
                        ));
                        if !ok {
                            aborted = true;
                        }
                        ok
                    });
                } else if !has_wildcard {
                    // segments of an auto-rule split match single chars
                    let trie = &self.single_char_lookup_trie;
                    trie.foreach_prefix(code.as_bytes(), |_, len, pos| {
                        let entry = trie.suffix(code.len() + len, pos);
                        let Ok(text) = String::from_utf8(entry) else {
                            return true;
                        };
                        let Some(sep) = text.find(KEY_VALUE_SEPARATOR) else {
                            return true;
                        };
                        let ok = callback(MatchedWord::new(
                            path.clone(),
                            text[sep + KEY_VALUE_SEPARATOR.len_utf8()..].to_string(),
                            0.0,
                            TablePayload {
                                code: text[..sep].to_string(),
                                index: 0,
                                flag: PhraseFlag::ConstructPhrase,
                            },
                        ));
                        if !ok {
                            aborted = true;
                        }
                        ok
                    });
                }
                if aborted {
                    return false;
                }
            }
            true
        });
    }
}

fn strip_option<'s>(line: &'s str, zh: &str, en: &str) -> Option<&'s str> {
    line.strip_prefix(zh).or_else(|| line.strip_prefix(en))
}

fn is_section(line: &str, zh: &str, en: &str) -> bool {
    line == zh || line == en
}

fn char_from_u32(v: u32) -> Option<char> {
    if v == 0 {
        None
    } else {
        char::from_u32(v)
    }
}

fn char_to_u32(c: Option<char>) -> u32 {
    c.map(|c| c as u32).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const TEST_TABLE: &str = "\
KeyCode=abcdefghijklmnopqrstuvwxy
Length=4
Pinyin=@
[Rule]
e2=p11+p12+p21+p22
e3=p11+p21+p31+p32
a4=p11+p21+p31+n11
[Data]
xycq 测
jghh 好
kkkk 你
gggg 一
abcd 二
lcc 测试
";

    fn load_dict() -> TableBasedDictionary {
        let mut dict = TableBasedDictionary::new();
        dict.load(&mut TEST_TABLE.as_bytes(), TableFormat::Text)
            .unwrap();
        dict
    }

    #[test]
    fn text_header_is_parsed() {
        let dict = load_dict();
        assert_eq!(dict.max_length(), 4);
        assert!(dict.has_rule());
        assert!(dict.has_pinyin());
        assert!(dict.is_input_code('a'));
        assert!(!dict.is_input_code('z'));
        assert!(dict.is_all_input_code("xycq"));
    }

    #[test]
    fn generate_uses_first_matching_rule() {
        let dict = load_dict();
        // e2: first two codes of each character
        assert_eq!(dict.generate("测好"), Some("xyjg".to_string()));
        // e3: first code of three chars plus second code of the last
        assert_eq!(dict.generate("测好你"), Some("xjkk".to_string()));
        // a4: first code of chars 1-3 plus first code of the last
        assert_eq!(dict.generate("测好你一"), Some("xjkg".to_string()));
        assert_eq!(dict.generate("测好你一二"), Some("xjka".to_string()));
    }

    #[test]
    fn match_words_prefix_and_exact() {
        let dict = load_dict();
        let mut words = Vec::new();
        dict.match_words(
            "xy",
            TableMatchMode::Prefix,
            &mut |code, word, _, _| {
                words.push((code.to_string(), word.to_string()));
                true
            },
        );
        assert!(words.iter().any(|(c, w)| c == "xycq" && w == "测"));

        let mut exact = Vec::new();
        dict.match_words("xy", TableMatchMode::Exact, &mut |code, word, _, _| {
            exact.push((code.to_string(), word.to_string()));
            true
        });
        assert!(exact.is_empty());
    }

    #[test]
    fn word_exists_and_removal_mask() {
        let mut dict = load_dict();
        assert_eq!(dict.word_exists("xycq", "测"), PhraseFlag::None);
        dict.remove_word("xycq", "测");
        assert_eq!(dict.word_exists("xycq", "测"), PhraseFlag::Invalid);

        let mut words = Vec::new();
        dict.match_words("xycq", TableMatchMode::Prefix, &mut |_, word, _, _| {
            words.push(word.to_string());
            true
        });
        assert!(!words.contains(&"测".to_string()));

        // adding it back as a user word unmasks it
        assert!(dict.insert("xycq", "测", PhraseFlag::User, false));
        assert_eq!(dict.word_exists("xycq", "测"), PhraseFlag::User);
    }

    #[test]
    fn reverse_lookup_single_char() {
        let dict = load_dict();
        assert_eq!(
            dict.reverse_lookup("测", PhraseFlag::ConstructPhrase),
            Some("xycq".to_string())
        );
        assert_eq!(dict.reverse_lookup("无", PhraseFlag::ConstructPhrase), None);
    }

    #[test]
    fn auto_phrase_promotes_after_threshold() {
        let mut dict = load_dict();
        let mut options = TableOptions::default();
        options.save_auto_phrase_after = 2;
        dict.set_table_options(options);

        assert!(dict.insert("xyjg", "测好", PhraseFlag::Auto, false));
        assert_eq!(dict.word_exists("xyjg", "测好"), PhraseFlag::Auto);
        // second hit reaches the threshold and promotes
        assert!(dict.insert("xyjg", "测好", PhraseFlag::Auto, false));
        assert_eq!(dict.word_exists("xyjg", "测好"), PhraseFlag::User);
    }

    #[test]
    fn binary_roundtrip() {
        let mut dict = load_dict();
        let mut buf = Vec::new();
        dict.save(&mut buf, TableFormat::Binary).unwrap();

        let mut loaded = TableBasedDictionary::new();
        loaded
            .load(&mut std::io::Cursor::new(&buf), TableFormat::Binary)
            .unwrap();
        assert_eq!(loaded.max_length(), 4);
        assert!(loaded.has_rule());
        assert_eq!(loaded.word_exists("xycq", "测"), PhraseFlag::None);
        assert_eq!(
            loaded.reverse_lookup("测", PhraseFlag::ConstructPhrase),
            Some("xycq".to_string())
        );
    }

    #[test]
    fn user_roundtrip_with_auto_and_deletion() {
        let mut dict = load_dict();
        dict.insert("lccc", "测测", PhraseFlag::User, false);
        dict.insert("xyjg", "测好", PhraseFlag::Auto, false);
        dict.remove_word("xycq", "测");

        let mut buf = Vec::new();
        dict.save_user(&mut buf, TableFormat::Binary).unwrap();

        let mut other = load_dict();
        other
            .load_user(&mut std::io::Cursor::new(&buf), TableFormat::Binary)
            .unwrap();
        assert_eq!(other.word_exists("lccc", "测测"), PhraseFlag::User);
        assert_eq!(other.word_exists("xyjg", "测好"), PhraseFlag::Auto);
        assert_eq!(other.word_exists("xycq", "测"), PhraseFlag::Invalid);
    }

    #[test]
    fn bad_magic_is_invalid_data() {
        let mut dict = TableBasedDictionary::new();
        let buf = [0u8; 16];
        assert!(matches!(
            dict.load(&mut std::io::Cursor::new(&buf[..]), TableFormat::Binary),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            dict.load_user(&mut std::io::Cursor::new(&buf[..]), TableFormat::Binary),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn missing_data_section_is_invalid() {
        let mut dict = TableBasedDictionary::new();
        let text = "KeyCode=abc\nLength=4\n";
        assert!(matches!(
            dict.load(&mut text.as_bytes(), TableFormat::Text),
            Err(Error::InvalidData(_))
        ));
    }
}
