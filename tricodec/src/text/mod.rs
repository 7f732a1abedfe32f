//! Huffman coding of UTF-8 text.
//!
//! Compressing `notes.txt` produces two files next to it:
//!
//! - `notes_compressed.bin`: the encoded bitstream, one ASCII `0` or `1` per
//!   bit. Storing bits as characters means the stream never needs padding.
//! - `notes_compressed.table`: the [`CodeTable`] needed to decode it.

mod table;
mod tree;

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    artifact::{self, compressed_path, decompressed_path},
    codec::Codec,
    error::{Error, Result},
};

pub use table::CodeTable;
pub use tree::{FrequencyTable, HuffmanTree, Node};

pub const BITSTREAM_EXTENSION: &str = "bin";
pub const TABLE_EXTENSION: &str = "table";
pub const RESTORED_EXTENSION: &str = "txt";

/// The concatenated codes of every input symbol, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedBitstream {
    bits: Vec<bool>,
}

impl EncodedBitstream {
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Parse `0`/`1` characters. Trailing ASCII whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let bits = text
            .trim_end_matches(|c: char| c.is_ascii_whitespace())
            .char_indices()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::CorruptBitstream(format!(
                    "{other:?} at position {position} is not a bit"
                ))),
            })
            .collect::<Result<_>>()?;

        Ok(Self { bits })
    }
}

impl fmt::Display for EncodedBitstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
        f.write_str(&text)
    }
}

/// Build the code table for `text` and encode it.
pub fn encode(text: &str) -> Result<(EncodedBitstream, CodeTable)> {
    if text.is_empty() {
        return Err(Error::EmptyInput);
    }

    let tree = HuffmanTree::build(&FrequencyTable::count(text))?;
    let table = CodeTable::from_tree(&tree);

    let mut bits = Vec::with_capacity(text.len());
    for symbol in text.chars() {
        // Every symbol of the text has a leaf in its own tree
        let code = table.get(symbol).ok_or_else(|| {
            Error::CorruptArtifact(format!("no code generated for {symbol:?}"))
        })?;
        bits.extend_from_slice(code);
    }

    Ok((EncodedBitstream { bits }, table))
}

/// Decode a bitstream using only its code table.
///
/// Walks the rebuilt tree one bit at a time, emitting a symbol and returning
/// to the root at each leaf. Fails with [`Error::CorruptBitstream`] if a bit
/// leads off the tree or the stream ends part way down a path.
pub fn decode(bitstream: &EncodedBitstream, table: &CodeTable) -> Result<String> {
    if bitstream.is_empty() {
        return Err(Error::EmptyInput);
    }

    let tree = table.to_tree()?;
    let mut text = String::new();

    let mut current = tree.root();
    let mut path_start = 0;
    for (position, &bit) in bitstream.bits().iter().enumerate() {
        current = tree.step(current, bit).ok_or_else(|| {
            Error::CorruptBitstream(format!("no code matches the bits at {path_start}..={position}"))
        })?;

        if let Node::Leaf(symbol) = tree.node(current) {
            text.push(symbol);
            current = tree.root();
            path_start = position + 1;
        }
    }

    if current != tree.root() {
        return Err(Error::CorruptBitstream(format!(
            "stream ends inside a code starting at bit {path_start}"
        )));
    }

    Ok(text)
}

/// Huffman codec for plain text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl TextCodec {
    /// Path of the code table that belongs to a bitstream artifact
    pub fn table_path(bitstream: &Path) -> PathBuf {
        bitstream.with_extension(TABLE_EXTENSION)
    }
}

impl Codec for TextCodec {
    fn compress(&self, input: &Path) -> Result<PathBuf> {
        let bytes = fs::read(input)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| Error::UnsupportedFormat(format!("{input:?} is not UTF-8 text: {e}")))?;

        let (bitstream, table) = encode(&text)?;

        let output = compressed_path(input, BITSTREAM_EXTENSION);
        let table_path = Self::table_path(&output);

        artifact::persist_all(&[
            (table_path.as_path(), table.to_text().as_bytes()),
            (output.as_path(), bitstream.to_string().as_bytes()),
        ])?;

        Ok(output)
    }

    fn decompress(&self, artifact: &Path) -> Result<PathBuf> {
        let table_path = Self::table_path(artifact);
        if !table_path.try_exists()? {
            return Err(Error::MissingCodeTable(table_path));
        }

        let table = CodeTable::parse(&read_utf8(&table_path, Error::CorruptArtifact)?)?;
        let bitstream = EncodedBitstream::parse(&read_utf8(artifact, Error::CorruptBitstream)?)?;

        let text = decode(&bitstream, &table)?;

        let output = decompressed_path(artifact, RESTORED_EXTENSION);
        artifact::persist(&output, text.as_bytes())?;

        Ok(output)
    }
}

fn read_utf8(path: &Path, corrupt: fn(String) -> Error) -> Result<String> {
    String::from_utf8(fs::read(path)?).map_err(|e| corrupt(format!("{path:?}: {e}")))
}
