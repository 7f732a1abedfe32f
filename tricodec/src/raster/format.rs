use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::{
    binio::{RecordReader, RecordWriter},
    error::{Error, Result},
};

use super::rle::{expand_runs, pixel_count, ColorMode, Pixel, PixelRun};

/// Geometry needed to turn a run sequence back into a 2-D image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,

    /// Format of color data in the image.
    pub mode: ColorMode,
}

impl ImageMetadata {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A run-length encoded image, as stored in an `.rle` artifact.
///
/// All integers are big-endian:
///
/// ```text
/// width       u32
/// height      u32
/// mode        u16 length + ASCII name ("L", "RGB" or "RGBA")
/// run count   u32
/// runs        run count × (one u8 per channel, count u32)
/// ```
///
/// The number of channel bytes in each run comes from the mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleImage {
    pub metadata: ImageMetadata,
    pub runs: Vec<PixelRun>,
}

impl RleImage {
    pub fn write_into<O: Write + WriteBytesExt>(&self, output: &mut O) -> Result<usize> {
        let run_count = u32::try_from(self.runs.len())
            .map_err(|_| Error::UnsupportedFormat("too many runs for one artifact".into()))?;

        let mut writer = RecordWriter::new(output);
        writer.write_u32(self.metadata.width)?;
        writer.write_u32(self.metadata.height)?;
        writer.write_blob(self.metadata.mode.name().as_bytes())?;
        writer.write_u32(run_count)?;

        let mut channels = Vec::with_capacity(4);
        for run in &self.runs {
            if run.value.mode() != self.metadata.mode {
                return Err(Error::UnsupportedFormat(format!(
                    "{} run in a {} image",
                    run.value.mode().name(),
                    self.metadata.mode.name()
                )));
            }

            channels.clear();
            run.value.extend_into(&mut channels);
            writer.write_tag(&channels)?;
            writer.write_u32(run.count)?;
        }

        Ok(writer.byte_size())
    }

    pub fn read_from<I: Read + ReadBytesExt>(input: &mut I) -> Result<Self> {
        let mut reader = RecordReader::new(input);

        let width = reader.read_u32("width")?;
        let height = reader.read_u32("height")?;

        let mode_name = reader.read_blob("color mode")?;
        let mode_name = std::str::from_utf8(&mode_name)
            .map_err(|_| Error::CorruptArtifact("color mode is not ASCII".into()))?;
        let mode = ColorMode::try_from(mode_name)?;

        let run_count = reader.read_u32("run count")?;

        // Not trusting the declared count for the allocation size
        let mut runs = Vec::with_capacity((run_count as usize).min(1 << 16));
        let mut channels = [0u8; 4];
        for _ in 0..run_count {
            for c in channels.iter_mut().take(mode.channels()) {
                *c = reader.read_u8("run value")?;
            }
            let value = Pixel::from_channels(mode, &channels[..mode.channels()])?;

            let count = reader.read_u32("run count")?;
            if count == 0 {
                return Err(Error::CorruptArtifact(format!(
                    "empty run at offset {}",
                    reader.byte_offset() - 4
                )));
            }

            runs.push(PixelRun { value, count });
        }

        reader.expect_end()?;

        Ok(Self {
            metadata: ImageMetadata { width, height, mode },
            runs,
        })
    }

    /// Expand into a raw bitmap, checking it against the stored geometry
    pub fn to_bitmap(&self) -> Result<Vec<u8>> {
        expand_runs(self.metadata.mode, &self.runs, self.metadata.pixel_count())
    }

    pub fn pixel_count(&self) -> u64 {
        pixel_count(&self.runs)
    }
}
