//! Construct-phrase rules.
//!
//! A rule derives a phrase's code from its characters' codes. Textual
//! form `(e|a)<len>=<entry>+<entry>+...` where each entry is
//! `(p|n)<char><index>`: `p`/`n` counts the character from the front or
//! back, `<index>` picks the code byte (digits from the front, letters
//! `z`, `y`, ... from the back).

use std::io::{Read, Write};

use libhan_core::{io, Error, Result};

const TAIL_OFFSET: u8 = 0x80;

fn to_index(index: u8) -> i32 {
    if index < TAIL_OFFSET {
        index as i32
    } else {
        -((index - TAIL_OFFSET + 1) as i32)
    }
}

fn from_index(index: i32) -> u8 {
    if index >= 0 {
        index as u8
    } else {
        (-index) as u8 + TAIL_OFFSET - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRuleEntryFlag {
    FromFront,
    FromBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRuleFlag {
    LengthLongerThan,
    LengthEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRuleEntry {
    flag: TableRuleEntryFlag,
    character: u8,
    encoding_index: u8,
}

impl TableRuleEntry {
    pub fn new(flag: TableRuleEntryFlag, character: u8, encoding_index: u8) -> Self {
        TableRuleEntry {
            flag,
            character,
            encoding_index,
        }
    }

    pub fn flag(&self) -> TableRuleEntryFlag {
        self.flag
    }

    /// 1-based character position counted per `flag`.
    pub fn character(&self) -> u8 {
        self.character
    }

    pub fn encoding_index(&self) -> u8 {
        self.encoding_index
    }

    /// Code byte position: positive counts from the front (1-based),
    /// negative from the back.
    pub fn index(&self) -> i32 {
        to_index(self.encoding_index)
    }

    /// Entries like `p00` pad a rule without contributing code.
    pub fn is_placeholder(&self) -> bool {
        self.character == 0 || self.index() == 0
    }

    fn load(reader: &mut impl Read) -> Result<Self> {
        let flag = match io::read_u32(reader)? {
            0 => TableRuleEntryFlag::FromFront,
            1 => TableRuleEntryFlag::FromBack,
            _ => return Err(Error::invalid_data("invalid rule entry flag")),
        };
        let character = io::read_u8(reader)?;
        let encoding_index = io::read_u8(reader)?;
        Ok(TableRuleEntry {
            flag,
            character,
            encoding_index,
        })
    }

    fn save(&self, writer: &mut impl Write) -> Result<()> {
        io::write_u32(
            writer,
            match self.flag {
                TableRuleEntryFlag::FromFront => 0,
                TableRuleEntryFlag::FromBack => 1,
            },
        )?;
        io::write_u8(writer, self.character)?;
        io::write_u8(writer, self.encoding_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRule {
    flag: TableRuleFlag,
    phrase_length: u8,
    entries: Vec<TableRuleEntry>,
}

impl TableRule {
    pub fn new(flag: TableRuleFlag, phrase_length: u8, entries: Vec<TableRuleEntry>) -> Self {
        TableRule {
            flag,
            phrase_length,
            entries,
        }
    }

    /// Parse the textual rule form against the table's code length.
    pub fn parse(rule_string: &str, max_length: u32) -> Result<Self> {
        let bytes = rule_string.as_bytes();
        let flag = match bytes.first() {
            Some(b'e') | Some(b'E') => TableRuleFlag::LengthEqual,
            Some(b'a') | Some(b'A') => TableRuleFlag::LengthLongerThan,
            _ => return Err(Error::invalid_data("invalid rule string")),
        };

        let equal_pos = rule_string[1..]
            .find('=')
            .map(|p| p + 1)
            .ok_or_else(|| Error::invalid_data("invalid rule string"))?;
        let before = &rule_string[..equal_pos];
        let after = &rule_string[equal_pos + 1..];

        let entry_strings: Vec<&str> = after.split('+').collect();
        if entry_strings.is_empty() || entry_strings.len() > max_length as usize {
            return Err(Error::invalid_data("invalid rule string"));
        }
        if before.len() != 2 || !before.as_bytes()[1].is_ascii_digit() {
            return Err(Error::invalid_data("invalid rule string"));
        }
        let phrase_length = before.as_bytes()[1] - b'0';
        if phrase_length == 0 || phrase_length as u32 > max_length {
            return Err(Error::invalid_data("invalid phrase length"));
        }

        let mut entries = Vec::new();
        for entry_string in entry_strings {
            let bytes = entry_string.as_bytes();
            let entry_flag = match bytes.first() {
                Some(b'p') | Some(b'P') => TableRuleEntryFlag::FromFront,
                Some(b'n') | Some(b'N') => TableRuleEntryFlag::FromBack,
                _ => return Err(Error::invalid_data("invalid rule entry flag")),
            };
            if bytes.len() != 3
                || !bytes[1].is_ascii_digit()
                || !(bytes[2].is_ascii_digit() || bytes[2].is_ascii_alphabetic())
            {
                return Err(Error::invalid_data("invalid rule entry"));
            }
            let character = bytes[1] - b'0';
            let index: i32 = if bytes[2].is_ascii_digit() {
                (bytes[2] - b'0') as i32
            } else {
                bytes[2].to_ascii_lowercase() as i32 - 'z' as i32 - 1
            };
            if character as u32 > max_length
                || index.unsigned_abs() > max_length
                || ((character == 0) != (index == 0))
            {
                return Err(Error::invalid_data("invalid rule entry"));
            }
            entries.push(TableRuleEntry::new(entry_flag, character, from_index(index)));
        }

        Ok(TableRule {
            flag,
            phrase_length,
            entries,
        })
    }

    pub fn flag(&self) -> TableRuleFlag {
        self.flag
    }

    pub fn phrase_length(&self) -> u8 {
        self.phrase_length
    }

    pub fn entries(&self) -> &[TableRuleEntry] {
        &self.entries
    }

    /// Number of code bytes the rule produces.
    pub fn code_length(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.is_placeholder())
            .count()
    }

    /// Short name like `e2` or `a4`.
    pub fn name(&self) -> String {
        format!(
            "{}{}",
            if self.flag == TableRuleFlag::LengthEqual {
                'e'
            } else {
                'a'
            },
            self.phrase_length
        )
    }

    pub fn to_rule_string(&self) -> String {
        let mut result = self.name();
        result.push('=');
        for (i, entry) in self.entries.iter().enumerate() {
            if i != 0 {
                result.push('+');
            }
            result.push(if entry.flag() == TableRuleEntryFlag::FromFront {
                'p'
            } else {
                'n'
            });
            result.push((b'0' + entry.character()) as char);
            let index = entry.index();
            if index >= 0 {
                result.push((b'0' + index as u8) as char);
            } else {
                result.push((('z' as i32) + index + 1) as u8 as char);
            }
        }
        result
    }

    pub(crate) fn load(reader: &mut impl Read) -> Result<Self> {
        let flag = match io::read_u32(reader)? {
            0 => TableRuleFlag::LengthLongerThan,
            1 => TableRuleFlag::LengthEqual,
            _ => return Err(Error::invalid_data("invalid rule flag")),
        };
        let phrase_length = io::read_u8(reader)?;
        let size = io::read_u32(reader)?;
        let mut entries = Vec::with_capacity(size as usize);
        for _ in 0..size {
            entries.push(TableRuleEntry::load(reader)?);
        }
        Ok(TableRule {
            flag,
            phrase_length,
            entries,
        })
    }

    pub(crate) fn save(&self, writer: &mut impl Write) -> Result<()> {
        io::write_u32(
            writer,
            match self.flag {
                TableRuleFlag::LengthLongerThan => 0,
                TableRuleFlag::LengthEqual => 1,
            },
        )?;
        io::write_u8(writer, self.phrase_length)?;
        io::write_u32(writer, self.entries.len() as u32)?;
        for entry in &self.entries {
            entry.save(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_two_char_rule() {
        // two-char phrase: first two codes of each char
        let rule = TableRule::parse("e2=p11+p12+p21+p22", 4).unwrap();
        assert_eq!(rule.flag(), TableRuleFlag::LengthEqual);
        assert_eq!(rule.phrase_length(), 2);
        assert_eq!(rule.entries().len(), 4);
        assert_eq!(rule.entries()[0].character(), 1);
        assert_eq!(rule.entries()[0].index(), 1);
        assert_eq!(rule.code_length(), 4);
        assert_eq!(rule.to_rule_string(), "e2=p11+p12+p21+p22");
    }

    #[test]
    fn parse_from_back_and_letter_index() {
        let rule = TableRule::parse("a4=p11+p21+p31+n1z", 4).unwrap();
        let last = rule.entries()[3];
        assert_eq!(last.flag(), TableRuleEntryFlag::FromBack);
        assert_eq!(last.character(), 1);
        assert_eq!(last.index(), -1);
        assert_eq!(rule.to_rule_string(), "a4=p11+p21+p31+n1z");
    }

    #[test]
    fn placeholder_entries() {
        let rule = TableRule::parse("e2=p00+p11", 4).unwrap();
        assert!(rule.entries()[0].is_placeholder());
        assert!(!rule.entries()[1].is_placeholder());
        assert_eq!(rule.code_length(), 1);
    }

    #[test]
    fn invalid_rules_are_rejected( ) {
        assert!(TableRule::parse("x2=p11", 4).is_err());
        assert!(TableRule::parse("e2", 4).is_err());
        assert!(TableRule::parse("e0=p11", 4).is_err());
        assert!(TableRule::parse("e2=q11", 4).is_err());
        assert!(TableRule::parse("e2=p01", 4).is_err());
    }

    #[test]
    fn binary_roundtrip() {
        let rule = TableRule::parse("e2=p11+p12+p21+p22", 4).unwrap();
        let mut buf = Vec::new();
        rule.save(&mut buf).unwrap();
        let loaded = TableRule::load(&mut std::io::Cursor::new(&buf)).unwrap();
        assert_eq!(rule, loaded);
    }
}
