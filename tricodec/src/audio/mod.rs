//! Lossy PCM audio compression by quantization.
//!
//! Only `.wav` files holding 8, 16 or 32-bit integer PCM are accepted;
//! anything else fails with [`Error::UnsupportedFormat`]. Every sample is
//! rounded down to a multiple of the configured factor and stored in a
//! self-contained `.qpcm` artifact (see [`QuantizedAudio`]). Decompression
//! writes a standard PCM `.wav` file.

mod format;
mod pcm;
mod wav;

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use crate::{
    artifact::{self, compressed_path, decompressed_path},
    codec::Codec,
    error::{Error, Result},
};

pub use format::{AudioFrameParams, QuantizedAudio, COMP_NAME_NONE, COMP_TYPE_NONE};
pub use pcm::{decode_samples, encode_samples, quantize, quantize_sample, SampleWidth};
pub use wav::{WavFile, WavFormat};

pub const ARTIFACT_EXTENSION: &str = "qpcm";
pub const RESTORED_EXTENSION: &str = "wav";

/// Quantization factor used when none is given
pub const DEFAULT_FACTOR: u32 = 2;

impl QuantizedAudio {
    /// Quantize every sample of a wave file.
    pub fn from_wav(wav: &WavFile, factor: u32) -> Result<Self> {
        let format = wav.format;

        let mut samples = decode_samples(format.sample_width, &wav.frames);
        quantize(&mut samples, factor, format.sample_width);

        let frame_count = u32::try_from(wav.frame_count())
            .map_err(|_| Error::UnsupportedFormat("too many frames".into()))?;

        Ok(Self {
            params: AudioFrameParams {
                channels: format.channels,
                sample_width: format.sample_width,
                frame_rate: format.sample_rate,
                frame_count,
                comp_type: COMP_TYPE_NONE,
                comp_name: COMP_NAME_NONE,
            },
            samples,
        })
    }

    /// Pack the samples back into a playable wave file.
    pub fn to_wav(&self) -> Result<WavFile> {
        let params = &self.params;

        if params.channels == 0 || self.samples.len() % params.channels as usize != 0 {
            return Err(Error::CorruptArtifact(format!(
                "{} samples do not split into {} channels",
                self.samples.len(),
                params.channels
            )));
        }

        let frames = encode_samples(params.sample_width, &self.samples)?;

        Ok(WavFile {
            format: WavFormat {
                channels: params.channels,
                sample_rate: params.frame_rate,
                sample_width: params.sample_width,
            },
            frames,
        })
    }
}

/// Quantizing codec for PCM wave files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCodec {
    factor: u32,
}

impl Default for AudioCodec {
    fn default() -> Self {
        Self {
            factor: DEFAULT_FACTOR,
        }
    }
}

impl AudioCodec {
    /// Use a different quantization factor. A factor of 1 keeps samples
    /// unchanged, 0 is refused.
    pub fn with_factor(factor: u32) -> Result<Self> {
        if factor == 0 {
            return Err(Error::InvalidFactor(factor));
        }

        Ok(Self { factor })
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }
}

impl Codec for AudioCodec {
    fn compress(&self, input: &Path) -> Result<PathBuf> {
        if artifact::extension(input).as_deref() != Some(RESTORED_EXTENSION) {
            return Err(Error::UnsupportedFormat(format!(
                "{input:?}: only .wav audio can be compressed"
            )));
        }

        let wav = WavFile::from_bytes(&fs::read(input)?)?;
        let quantized = QuantizedAudio::from_wav(&wav, self.factor)?;

        let mut bytes = Vec::new();
        quantized.write_into(&mut bytes)?;

        let output = compressed_path(input, ARTIFACT_EXTENSION);
        artifact::persist(&output, &bytes)?;

        Ok(output)
    }

    fn decompress(&self, artifact: &Path) -> Result<PathBuf> {
        let bytes = fs::read(artifact)?;
        let quantized = QuantizedAudio::read_from(&mut Cursor::new(bytes))?;

        let mut wav_bytes = Vec::new();
        quantized.to_wav()?.write_into(&mut wav_bytes)?;

        let output = decompressed_path(artifact, RESTORED_EXTENSION);
        artifact::persist(&output, &wav_bytes)?;

        Ok(output)
    }
}
