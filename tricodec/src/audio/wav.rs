//! Just enough RIFF/WAVE to read and write linear PCM.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};

use crate::error::{Error, Result};

use super::pcm::SampleWidth;

const FORMAT_PCM: u16 = 0x0001;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// The `fmt ` fields this crate cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub sample_width: SampleWidth,
}

impl WavFormat {
    /// Bytes per frame, one sample for every channel
    pub fn block_align(&self) -> usize {
        self.channels as usize * self.sample_width.bytes()
    }
}

/// A PCM wave file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFile {
    pub format: WavFormat,

    /// Raw little-endian frame data, always a whole number of frames
    pub frames: Vec<u8>,
}

impl WavFile {
    pub fn frame_count(&self) -> usize {
        self.frames.len() / self.format.block_align()
    }

    /// Parse a wave file. Anything other than 8, 16 or 32-bit integer PCM is
    /// refused with [`Error::UnsupportedFormat`].
    pub fn read_from<I: Read + Seek>(input: &mut I) -> Result<Self> {
        if read_id(input)? != *b"RIFF" {
            return Err(malformed("missing RIFF header"));
        }
        input.read_u32::<LE>().map_err(truncated)?;
        if read_id(input)? != *b"WAVE" {
            return Err(malformed("not a WAVE file"));
        }

        let mut format = None;
        let mut frames = None;
        while format.is_none() || frames.is_none() {
            let id = match read_id(input) {
                Ok(id) => id,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };
            let size = input.read_u32::<LE>().map_err(truncated)?;

            match &id {
                b"fmt " => format = Some(parse_format(&read_chunk(input, size)?)?),
                b"data" => frames = Some(read_chunk(input, size)?),
                _ => {
                    input.seek(SeekFrom::Current(size as i64))?;
                }
            }

            // Chunks are word aligned
            if size % 2 == 1 {
                input.seek(SeekFrom::Current(1))?;
            }
        }

        let format = format.ok_or_else(|| malformed("no fmt chunk"))?;
        let mut frames = frames.ok_or_else(|| malformed("no data chunk"))?;

        let whole = frames.len() / format.block_align() * format.block_align();
        frames.truncate(whole);

        Ok(Self { format, frames })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut Cursor::new(bytes))
    }

    /// Write a canonical 44-byte-header PCM wave file.
    pub fn write_into<O: Write + WriteBytesExt>(&self, output: &mut O) -> Result<usize> {
        let data_len = u32::try_from(self.frames.len())
            .ok()
            .filter(|len| *len <= u32::MAX - 37)
            .ok_or_else(|| Error::UnsupportedFormat("audio too long for a WAVE file".into()))?;
        let pad = data_len % 2;

        let block_align = u16::try_from(self.format.block_align())
            .map_err(|_| Error::UnsupportedFormat(format!(
                "{} channels do not fit a WAVE frame",
                self.format.channels
            )))?;
        let byte_rate = self
            .format
            .sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(|| Error::UnsupportedFormat(format!(
                "sample rate {} is too high for a WAVE header",
                self.format.sample_rate
            )))?;

        output.write_all(b"RIFF")?;
        output.write_u32::<LE>(36 + data_len + pad)?;
        output.write_all(b"WAVE")?;

        output.write_all(b"fmt ")?;
        output.write_u32::<LE>(16)?;
        output.write_u16::<LE>(FORMAT_PCM)?;
        output.write_u16::<LE>(self.format.channels)?;
        output.write_u32::<LE>(self.format.sample_rate)?;
        output.write_u32::<LE>(byte_rate)?;
        output.write_u16::<LE>(block_align)?;
        output.write_u16::<LE>(self.format.sample_width.bytes() as u16 * 8)?;

        output.write_all(b"data")?;
        output.write_u32::<LE>(data_len)?;
        output.write_all(&self.frames)?;
        if pad == 1 {
            output.write_u8(0)?;
        }

        Ok(44 + data_len as usize + pad as usize)
    }
}

fn parse_format(chunk: &[u8]) -> Result<WavFormat> {
    if chunk.len() < 16 {
        return Err(malformed("fmt chunk too short"));
    }

    let mut fields = Cursor::new(chunk);
    let mut tag = fields.read_u16::<LE>()?;
    let channels = fields.read_u16::<LE>()?;
    let sample_rate = fields.read_u32::<LE>()?;
    let _byte_rate = fields.read_u32::<LE>()?;
    let _block_align = fields.read_u16::<LE>()?;
    let bits = fields.read_u16::<LE>()?;

    // WAVE_FORMAT_EXTENSIBLE keeps the real format in its sub-format GUID
    if tag == FORMAT_EXTENSIBLE && chunk.len() >= 26 {
        fields.set_position(24);
        tag = fields.read_u16::<LE>()?;
    }

    if tag != FORMAT_PCM {
        return Err(Error::UnsupportedFormat(format!(
            "WAVE format tag {tag:#06x} is not integer PCM"
        )));
    }

    if channels == 0 {
        return Err(malformed("zero channels"));
    }

    let sample_width = (bits % 8 == 0)
        .then_some(bits / 8)
        .and_then(|w| SampleWidth::try_from(w).ok())
        .ok_or_else(|| Error::UnsupportedFormat(format!("{bits}-bit samples")))?;

    Ok(WavFormat {
        channels,
        sample_rate,
        sample_width,
    })
}

/// Read a chunk body without trusting its declared size for the allocation
fn read_chunk<I: Read>(input: &mut I, size: u32) -> Result<Vec<u8>> {
    let mut chunk = Vec::new();
    input.take(size as u64).read_to_end(&mut chunk)?;

    if chunk.len() != size as usize {
        return Err(malformed("unexpected end of file"));
    }

    Ok(chunk)
}

fn read_id<I: Read>(input: &mut I) -> io::Result<[u8; 4]> {
    let mut id = [0u8; 4];
    input.read_exact(&mut id)?;
    Ok(id)
}

fn malformed(reason: &str) -> Error {
    Error::UnsupportedFormat(format!("malformed WAVE file: {reason}"))
}

fn truncated(error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        malformed("unexpected end of file")
    } else {
        Error::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_16() -> WavFile {
        WavFile {
            format: WavFormat {
                channels: 2,
                sample_rate: 8000,
                sample_width: SampleWidth::Two,
            },
            frames: vec![1, 0, 2, 0, 3, 0, 4, 0],
        }
    }

    #[test]
    fn header_layout() {
        let mut buf = Vec::new();
        let written = stereo_16().write_into(&mut buf).unwrap();

        assert_eq!(written, 52);
        assert_eq!(buf.len(), 52);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 44);
        assert_eq!(&buf[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(buf[28..32].try_into().unwrap()), 32000);
        assert_eq!(u16::from_le_bytes(buf[32..34].try_into().unwrap()), 4);
        assert_eq!(&buf[36..40], b"data");

        let read = WavFile::from_bytes(&buf).unwrap();
        assert_eq!(read, stereo_16());
        assert_eq!(read.frame_count(), 2);
    }

    #[test]
    fn odd_data_is_padded() {
        let wav = WavFile {
            format: WavFormat {
                channels: 1,
                sample_rate: 11025,
                sample_width: SampleWidth::One,
            },
            frames: vec![128, 129, 130],
        };

        let mut buf = Vec::new();
        wav.write_into(&mut buf).unwrap();
        assert_eq!(buf.len(), 48);
        assert_eq!(WavFile::from_bytes(&buf).unwrap(), wav);
    }

    #[test]
    fn unknown_chunks_are_skipped() {
        let mut buf = Vec::new();
        stereo_16().write_into(&mut buf).unwrap();

        // Splice a LIST chunk with an odd size between fmt and data
        let mut spliced = buf[..36].to_vec();
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&3u32.to_le_bytes());
        spliced.extend_from_slice(&[b'a', b'b', b'c', 0]);
        spliced.extend_from_slice(&buf[36..]);

        assert_eq!(WavFile::from_bytes(&spliced).unwrap(), stereo_16());
    }

    #[test]
    fn partial_frame_is_dropped() {
        let mut buf = Vec::new();
        let mut wav = stereo_16();
        wav.frames.extend_from_slice(&[9, 9]);
        wav.write_into(&mut buf).unwrap();

        assert_eq!(WavFile::from_bytes(&buf).unwrap(), stereo_16());
    }

    #[test]
    fn float_and_24_bit_are_unsupported() {
        let mut buf = Vec::new();
        stereo_16().write_into(&mut buf).unwrap();

        let mut float = buf.clone();
        float[20] = 3;
        assert!(matches!(WavFile::from_bytes(&float), Err(Error::UnsupportedFormat(_))));

        let mut wide = buf;
        wide[34] = 24;
        assert!(matches!(WavFile::from_bytes(&wide), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn oversized_header_fields_are_refused() {
        let mut wide = stereo_16();
        wide.format.channels = 20000;
        wide.format.sample_width = SampleWidth::Four;
        assert!(matches!(
            wide.write_into(&mut Vec::new()),
            Err(Error::UnsupportedFormat(_))
        ));

        let mut fast = stereo_16();
        fast.format.sample_rate = u32::MAX;
        assert!(matches!(
            fast.write_into(&mut Vec::new()),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn read_errors_are_not_end_of_chunks() {
        struct Failing(Cursor<Vec<u8>>);

        impl Read for Failing {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.position() >= 12 {
                    return Err(io::Error::other("disk gone"));
                }
                let end = buf.len().min(12 - self.0.position() as usize);
                self.0.read(&mut buf[..end])
            }
        }

        impl Seek for Failing {
            fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
                self.0.seek(pos)
            }
        }

        let mut buf = Vec::new();
        stereo_16().write_into(&mut buf).unwrap();

        let err = WavFile::read_from(&mut Failing(Cursor::new(buf))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn garbage_is_unsupported() {
        assert!(matches!(
            WavFile::from_bytes(b"ID3\x04 definitely not a wave"),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
