use crate::error::{Error, Result};

/// The channel layout of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// Grayscale, 8 bits
    L,

    /// RGB, 8 bits per channel
    Rgb,

    /// RGBA, 8 bits per channel
    Rgba,
}

impl ColorMode {
    /// Number of color channels.
    ///
    /// Ex. Rgba has `4` channels
    pub fn channels(self) -> usize {
        match self {
            ColorMode::L => 1,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }

    /// Name stored in artifacts
    pub fn name(self) -> &'static str {
        match self {
            ColorMode::L => "L",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
        }
    }
}

impl TryFrom<&str> for ColorMode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Ok(match value {
            "L" => Self::L,
            "RGB" => Self::Rgb,
            "RGBA" => Self::Rgba,
            v => return Err(Error::CorruptArtifact(format!("invalid color mode {v:?}"))),
        })
    }
}

/// A single pixel value. The variant is chosen once from the image's
/// [`ColorMode`], never from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {
    Gray(u8),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, u8),
}

impl Pixel {
    /// Build a pixel from exactly `mode.channels()` bytes
    pub fn from_channels(mode: ColorMode, c: &[u8]) -> Result<Self> {
        if c.len() != mode.channels() {
            return Err(Error::SizeMismatch {
                expected: mode.channels() as u64,
                actual: c.len() as u64,
            });
        }

        Ok(match mode {
            ColorMode::L => Pixel::Gray(c[0]),
            ColorMode::Rgb => Pixel::Rgb(c[0], c[1], c[2]),
            ColorMode::Rgba => Pixel::Rgba(c[0], c[1], c[2], c[3]),
        })
    }

    pub fn mode(&self) -> ColorMode {
        match self {
            Pixel::Gray(_) => ColorMode::L,
            Pixel::Rgb(..) => ColorMode::Rgb,
            Pixel::Rgba(..) => ColorMode::Rgba,
        }
    }

    /// Append this pixel's channels to a raw buffer
    pub fn extend_into(&self, buf: &mut Vec<u8>) {
        match *self {
            Pixel::Gray(l) => buf.push(l),
            Pixel::Rgb(r, g, b) => buf.extend_from_slice(&[r, g, b]),
            Pixel::Rgba(r, g, b, a) => buf.extend_from_slice(&[r, g, b, a]),
        }
    }
}

/// A pixel value repeated `count` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRun {
    pub value: Pixel,
    pub count: u32,
}

/// Collapse a scan-order bitmap into maximal runs.
///
/// The bitmap holds `mode.channels()` bytes per pixel. A run is closed only
/// when the pixel value changes (or its count would overflow), so no two
/// neighbouring runs carry the same value.
pub fn run_length_encode(mode: ColorMode, bitmap: &[u8]) -> Result<Vec<PixelRun>> {
    let channels = mode.channels();
    if bitmap.len() % channels != 0 {
        return Err(Error::SizeMismatch {
            expected: (bitmap.len() / channels * channels) as u64,
            actual: bitmap.len() as u64,
        });
    }

    let mut runs = Vec::new();
    let mut pixels = bitmap.chunks_exact(channels);

    let Some(first) = pixels.next() else {
        return Ok(runs);
    };

    let mut current = PixelRun {
        value: Pixel::from_channels(mode, first)?,
        count: 1,
    };

    for chunk in pixels {
        let pixel = Pixel::from_channels(mode, chunk)?;
        if pixel == current.value && current.count < u32::MAX {
            current.count += 1;
        } else {
            runs.push(current);
            current = PixelRun { value: pixel, count: 1 };
        }
    }
    runs.push(current);

    Ok(runs)
}

/// Merge neighbouring runs that share a value.
///
/// Runs produced by [`run_length_encode`] are already maximal, so for those
/// this returns its input unchanged.
pub fn merge_runs(runs: &[PixelRun]) -> Vec<PixelRun> {
    let mut merged: Vec<PixelRun> = Vec::with_capacity(runs.len());

    for run in runs {
        match merged.last_mut() {
            Some(last) if last.value == run.value && last.count.checked_add(run.count).is_some() => {
                last.count += run.count;
            }
            _ => merged.push(*run),
        }
    }

    merged
}

/// Total number of pixels the runs expand to
pub fn pixel_count(runs: &[PixelRun]) -> u64 {
    runs.iter().map(|r| r.count as u64).sum()
}

/// Expand runs back into a raw scan-order bitmap.
///
/// The expanded pixel count must be exactly `expected_pixels`, checked before
/// anything is allocated. The check only keeps geometry and runs consistent;
/// a consistent artifact may still declare a very large image.
pub fn expand_runs(mode: ColorMode, runs: &[PixelRun], expected_pixels: u64) -> Result<Vec<u8>> {
    let actual = pixel_count(runs);
    if actual != expected_pixels {
        return Err(Error::SizeMismatch {
            expected: expected_pixels,
            actual,
        });
    }

    let mut bitmap = Vec::with_capacity(actual as usize * mode.channels());
    for run in runs {
        if run.value.mode() != mode {
            return Err(Error::CorruptArtifact(format!(
                "{} pixel in a {} image",
                run.value.mode().name(),
                mode.name()
            )));
        }

        for _ in 0..run.count {
            run.value.extend_into(&mut bitmap);
        }
    }

    Ok(bitmap)
}
