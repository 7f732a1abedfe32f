//! Tricodec (**tri**ple **codec**) is a set of three small, independent file
//! codecs:
//!
//! - [`text`]: Huffman coding of UTF-8 text, lossless
//! - [`raster`]: run-length encoding of images, lossless
//! - [`audio`]: quantization of PCM wave files, lossy
//!
//! They are meant for experimenting with and learning about compression.
//! None of them tries to compete with real formats; the run-length codec is
//! deliberately naive and the audio codec throws information away.
//!
//! Each codec reads a source file and writes a self-describing artifact next
//! to it, and can turn that artifact back into a file of the original kind.
//!
//! # Example
//! ## Compressing and restoring a file
//! ```no_run
//! use std::path::Path;
//! use tricodec::{Codec, TextCodec};
//!
//! // Writes notes_compressed.bin and notes_compressed.table
//! let artifact = TextCodec.compress(Path::new("notes.txt"))
//!     .expect("Could not compress the file");
//!
//! // Writes notes_decompressed.txt
//! let restored = TextCodec.decompress(&artifact)
//!     .expect("Could not decompress the file");
//! ```
//!
//! ## Picking the codec from the file name
//! ```no_run
//! let artifact = tricodec::compress("beep.wav").expect("Could not compress");
//! let size = tricodec::file_size(&artifact).expect("Could not stat");
//! ```
//!
//! ## Working in memory
//! ```
//! let (bits, table) = tricodec::text::encode("aaab").unwrap();
//! assert_eq!(bits.to_string(), "1110");
//! assert_eq!(tricodec::text::decode(&bits, &table).unwrap(), "aaab");
//! ```

mod artifact;
mod binio;
mod codec;
mod error;

pub mod audio;
pub mod raster;
pub mod text;

// ----------------------- //
// INLINED USEFUL FEATURES //
// ----------------------- //
#[doc(inline)]
pub use codec::{compress, decompress, Codec, CodecKind};

#[doc(inline)]
pub use artifact::file_size;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use text::TextCodec;

#[doc(inline)]
pub use raster::ImageCodec;

#[doc(inline)]
pub use audio::AudioCodec;
