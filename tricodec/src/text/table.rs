use std::{collections::BTreeMap, fmt::Write as _};

use crate::error::{Error, Result};

use super::tree::HuffmanTree;

/// Symbol to bit-string mapping, one entry per distinct symbol.
///
/// Persisted next to the bitstream as UTF-8 text, one `key:code` line per
/// symbol in ascending symbol order. Codes are written as `0`/`1` characters.
/// Keys are the symbol itself, except for:
///
/// | symbol        | key         |
/// |---------------|-------------|
/// | line feed     | `\n`        |
/// | tab           | `\t`        |
/// | carriage ret. | `\r`        |
/// | space         | `space`     |
/// | other control | `\u{XXXX}`  |
///
/// Every escape is longer than one character, so it can never be confused
/// with a literal symbol. A line is split at its last `:`, which keeps `:`
/// itself usable as a symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<char, Vec<bool>>,
}

impl CodeTable {
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        Self { codes: tree.codes() }
    }

    pub fn get(&self, symbol: char) -> Option<&[bool]> {
        self.codes.get(&symbol).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &[bool])> {
        self.codes.iter().map(|(&c, code)| (c, code.as_slice()))
    }

    /// Rebuild the decoding tree. No frequencies are needed.
    pub fn to_tree(&self) -> Result<HuffmanTree> {
        HuffmanTree::from_codes(self.iter())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (&symbol, code) in &self.codes {
            let _ = write!(out, "{}:", escape(symbol));
            out.extend(code.iter().map(|&bit| if bit { '1' } else { '0' }));
            out.push('\n');
        }

        out
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut codes = BTreeMap::new();

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            if line.is_empty() {
                continue;
            }

            let (key, code) = line.rsplit_once(':').ok_or_else(|| {
                Error::CorruptArtifact(format!("code table line {number} has no separator"))
            })?;

            let symbol = unescape(key).ok_or_else(|| {
                Error::CorruptArtifact(format!("code table line {number}: bad key {key:?}"))
            })?;

            let code = code
                .chars()
                .map(|c| match c {
                    '0' => Ok(false),
                    '1' => Ok(true),
                    other => Err(Error::CorruptArtifact(format!(
                        "code table line {number}: {other:?} is not a bit"
                    ))),
                })
                .collect::<Result<Vec<bool>>>()?;

            if codes.insert(symbol, code).is_some() {
                return Err(Error::CorruptArtifact(format!(
                    "code table line {number}: {symbol:?} listed twice"
                )));
            }
        }

        if codes.is_empty() {
            return Err(Error::CorruptArtifact("code table is empty".into()));
        }

        Ok(Self { codes })
    }
}

fn escape(symbol: char) -> String {
    match symbol {
        '\n' => "\\n".into(),
        '\t' => "\\t".into(),
        '\r' => "\\r".into(),
        ' ' => "space".into(),
        c if c.is_control() => format!("\\u{{{:04X}}}", c as u32),
        c => c.into(),
    }
}

fn unescape(key: &str) -> Option<char> {
    match key {
        "\\n" => return Some('\n'),
        "\\t" => return Some('\t'),
        "\\r" => return Some('\r'),
        "space" => return Some(' '),
        _ => (),
    }

    if let Some(hex) = key.strip_prefix("\\u{").and_then(|k| k.strip_suffix('}')) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
