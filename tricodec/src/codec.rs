use std::path::{Path, PathBuf};

use crate::{
    artifact::{compressed_path, decompressed_path, extension},
    audio::{self, AudioCodec},
    error::{Error, Result},
    raster::{self, ImageCodec},
    text::{self, TextCodec},
};

/// A file-to-file codec.
///
/// Both directions read one file and write one new file next to it, returning
/// the path written. A failed call leaves no output behind.
pub trait Codec {
    fn compress(&self, input: &Path) -> Result<PathBuf>;

    fn decompress(&self, artifact: &Path) -> Result<PathBuf>;
}

/// The three kinds of data this crate can compress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Text,
    Image,
    Audio,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "bmp", "gif", "ico", "jpg", "jpeg", "pnm", "pbm", "pgm", "ppm", "qoi", "tga", "tif",
    "tiff", "webp",
];

impl CodecKind {
    /// Pick a codec from the extension of a source file
    pub fn for_input(path: &Path) -> Result<Self> {
        match extension(path).as_deref() {
            Some("txt") => Ok(Self::Text),
            Some("wav") => Ok(Self::Audio),
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Ok(Self::Image),
            _ => Err(Error::UnsupportedFormat(format!(
                "{path:?}: no codec for this file type"
            ))),
        }
    }

    /// Pick a codec from the extension of a compressed artifact
    pub fn for_artifact(path: &Path) -> Result<Self> {
        match extension(path).as_deref() {
            Some(text::BITSTREAM_EXTENSION) => Ok(Self::Text),
            Some(raster::ARTIFACT_EXTENSION) => Ok(Self::Image),
            Some(audio::ARTIFACT_EXTENSION) => Ok(Self::Audio),
            _ => Err(Error::UnsupportedFormat(format!(
                "{path:?} is not a compressed artifact"
            ))),
        }
    }

    /// Every file `compress` writes for `input`
    pub fn compressed_outputs(self, input: &Path) -> Vec<PathBuf> {
        match self {
            CodecKind::Text => {
                let bitstream = compressed_path(input, text::BITSTREAM_EXTENSION);
                vec![TextCodec::table_path(&bitstream), bitstream]
            }
            CodecKind::Image => vec![compressed_path(input, raster::ARTIFACT_EXTENSION)],
            CodecKind::Audio => vec![compressed_path(input, audio::ARTIFACT_EXTENSION)],
        }
    }

    /// The file `decompress` writes for `artifact`
    pub fn decompressed_output(self, artifact: &Path) -> PathBuf {
        let extension = match self {
            CodecKind::Text => text::RESTORED_EXTENSION,
            CodecKind::Image => raster::RESTORED_EXTENSION,
            CodecKind::Audio => audio::RESTORED_EXTENSION,
        };

        decompressed_path(artifact, extension)
    }

    /// The codec for this kind; audio uses `audio`'s settings
    pub fn codec(self, audio: AudioCodec) -> Box<dyn Codec> {
        match self {
            CodecKind::Text => Box::new(TextCodec),
            CodecKind::Image => Box::new(ImageCodec),
            CodecKind::Audio => Box::new(audio),
        }
    }
}

/// Compress a file with the codec its extension calls for.
pub fn compress<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    CodecKind::for_input(path)?
        .codec(AudioCodec::default())
        .compress(path)
}

/// Decompress an artifact produced by [`compress`].
pub fn decompress<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    CodecKind::for_artifact(path)?
        .codec(AudioCodec::default())
        .decompress(path)
}
