use std::path::PathBuf;

use thiserror::Error;

/// Every way a compress or decompress call can fail.
///
/// An operation either returns the path of a complete artifact or one of
/// these; nothing partial is left behind on disk.
#[derive(Error, Debug)]
pub enum Error {
    /// There was no data to process
    #[error("input contains no data")]
    EmptyInput,

    /// The extension or container is not one this crate understands
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A text artifact was decompressed without its companion code table
    #[error("code table {0:?} is missing")]
    MissingCodeTable(PathBuf),

    /// The encoded bits do not decode with the code table
    #[error("corrupt bitstream: {0}")]
    CorruptBitstream(String),

    /// A compressed artifact is structurally invalid
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// The decoded element count disagrees with the declared geometry
    #[error("size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The quantization factor must be at least 1
    #[error("invalid quantization factor {0}")]
    InvalidFactor(u32),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
