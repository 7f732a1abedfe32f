use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::{
    binio::{RecordReader, RecordWriter},
    error::{Error, Result},
};

use super::pcm::SampleWidth;

/// Compression type tag of uncompressed PCM
pub const COMP_TYPE_NONE: [u8; 4] = *b"NONE";

/// Compression name tag of uncompressed PCM, the start of "not compressed"
pub const COMP_NAME_NONE: [u8; 4] = *b"not ";

/// Everything needed to turn samples back into playable audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFrameParams {
    pub channels: u16,
    pub sample_width: SampleWidth,
    pub frame_rate: u32,
    pub frame_count: u32,
    pub comp_type: [u8; 4],
    pub comp_name: [u8; 4],
}

/// Quantized samples plus their format, as stored in a `.qpcm` artifact.
///
/// All integers are big-endian:
///
/// ```text
/// channels        u16
/// sample width    u16    bytes per sample: 1, 2 or 4
/// frame rate      u32
/// frame count     u32
/// comp type       4 bytes
/// comp name       4 bytes
/// sample count    u32
/// samples         sample count × i32
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedAudio {
    pub params: AudioFrameParams,
    pub samples: Vec<i32>,
}

impl QuantizedAudio {
    pub fn write_into<O: Write + WriteBytesExt>(&self, output: &mut O) -> Result<usize> {
        let sample_count = u32::try_from(self.samples.len())
            .map_err(|_| Error::UnsupportedFormat("too many samples for one artifact".into()))?;

        let params = &self.params;
        let mut writer = RecordWriter::new(output);
        writer.write_u16(params.channels)?;
        writer.write_u16(params.sample_width.bytes() as u16)?;
        writer.write_u32(params.frame_rate)?;
        writer.write_u32(params.frame_count)?;
        writer.write_tag(&params.comp_type)?;
        writer.write_tag(&params.comp_name)?;

        writer.write_u32(sample_count)?;
        for &sample in &self.samples {
            writer.write_i32(sample)?;
        }

        Ok(writer.byte_size())
    }

    /// Parse an artifact. The declared sample count has to equal frame count
    /// times channels, and match the number of sample records exactly.
    pub fn read_from<I: Read + ReadBytesExt>(input: &mut I) -> Result<Self> {
        let mut reader = RecordReader::new(input);

        let channels = reader.read_u16("channels")?;
        if channels == 0 {
            return Err(Error::CorruptArtifact("zero channels".into()));
        }

        let width = reader.read_u16("sample width")?;
        let sample_width = SampleWidth::try_from(width)
            .map_err(|w| Error::CorruptArtifact(format!("invalid sample width {w}")))?;

        let params = AudioFrameParams {
            channels,
            sample_width,
            frame_rate: reader.read_u32("frame rate")?,
            frame_count: reader.read_u32("frame count")?,
            comp_type: reader.read_tag("comp type")?,
            comp_name: reader.read_tag("comp name")?,
        };

        let sample_count = reader.read_u32("sample count")?;
        if sample_count % channels as u32 != 0 {
            return Err(Error::CorruptArtifact(format!(
                "{sample_count} samples do not split into {channels} channels"
            )));
        }
        if params.frame_count as u64 * channels as u64 != sample_count as u64 {
            return Err(Error::CorruptArtifact(format!(
                "{} frames of {channels} channels declared, {sample_count} samples declared",
                params.frame_count
            )));
        }

        let mut samples = Vec::with_capacity((sample_count as usize).min(1 << 20));
        for i in 0..sample_count {
            match reader.read_i32("sample") {
                Ok(sample) => samples.push(sample),
                Err(Error::CorruptArtifact(_)) => {
                    return Err(Error::CorruptArtifact(format!(
                        "{sample_count} samples declared, {i} present"
                    )))
                }
                Err(e) => return Err(e),
            }
        }

        reader.expect_end().map_err(|e| match e {
            Error::CorruptArtifact(_) => Error::CorruptArtifact(format!(
                "{sample_count} samples declared, more present"
            )),
            e => e,
        })?;

        Ok(Self { params, samples })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample() -> QuantizedAudio {
        QuantizedAudio {
            params: AudioFrameParams {
                channels: 1,
                sample_width: SampleWidth::Two,
                frame_rate: 44100,
                frame_count: 2,
                comp_type: COMP_TYPE_NONE,
                comp_name: COMP_NAME_NONE,
            },
            samples: vec![-2, 256],
        }
    }

    #[test]
    fn byte_layout() {
        let mut buf = Vec::new();
        let written = sample().write_into(&mut buf).unwrap();

        let mut expected = vec![0, 1, 0, 2, 0, 0, 0xAC, 0x44, 0, 0, 0, 2];
        expected.extend_from_slice(b"NONEnot ");
        expected.extend_from_slice(&[0, 0, 0, 2, 0xFF, 0xFF, 0xFF, 0xFE, 0, 0, 1, 0]);

        assert_eq!(buf, expected);
        assert_eq!(written, 32);
        assert_eq!(QuantizedAudio::read_from(&mut Cursor::new(buf)).unwrap(), sample());
    }

    #[test]
    fn missing_samples_are_corrupt() {
        let mut buf = Vec::new();
        sample().write_into(&mut buf).unwrap();
        buf.truncate(buf.len() - 4);

        let err = QuantizedAudio::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(msg) if msg.contains("2 samples declared, 1 present")));
    }

    #[test]
    fn extra_samples_are_corrupt() {
        let mut buf = Vec::new();
        sample().write_into(&mut buf).unwrap();
        buf.extend_from_slice(&[0, 0, 0, 7]);

        assert!(matches!(
            QuantizedAudio::read_from(&mut Cursor::new(buf)),
            Err(Error::CorruptArtifact(_))
        ));
    }

    #[test]
    fn partial_frame_is_corrupt() {
        let mut audio = sample();
        audio.params.channels = 2;
        audio.params.frame_count = 1;
        audio.samples = vec![1, 2, 3];

        let mut buf = Vec::new();
        audio.write_into(&mut buf).unwrap();

        let err = QuantizedAudio::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(msg) if msg.contains("2 channels")));
    }

    #[test]
    fn frame_count_must_match_samples() {
        let mut audio = sample();
        audio.params.frame_count = 999;

        let mut buf = Vec::new();
        audio.write_into(&mut buf).unwrap();

        let err = QuantizedAudio::read_from(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::CorruptArtifact(msg) if msg.contains("999 frames")));
    }

    #[test]
    fn bad_sample_width_is_corrupt() {
        let mut buf = Vec::new();
        sample().write_into(&mut buf).unwrap();
        buf[3] = 3;

        assert!(matches!(
            QuantizedAudio::read_from(&mut Cursor::new(buf)),
            Err(Error::CorruptArtifact(_))
        ));
    }
}
