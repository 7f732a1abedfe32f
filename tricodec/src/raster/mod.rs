//! Run-length encoding of raster images.
//!
//! Any image the `image` crate can open is reduced to 8 bits per channel in
//! one of three [`ColorMode`]s, flattened in scan order and stored as runs in
//! an `.rle` artifact (see [`RleImage`] for the layout). Decompression always
//! writes a PNG.

mod format;
mod rle;

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{ColorType, DynamicImage, GrayImage, ImageError, ImageFormat, RgbImage, RgbaImage};

use crate::{
    artifact::{self, compressed_path, decompressed_path},
    codec::Codec,
    error::{Error, Result},
};

pub use format::{ImageMetadata, RleImage};
pub use rle::{expand_runs, merge_runs, pixel_count, run_length_encode, ColorMode, Pixel, PixelRun};

pub const ARTIFACT_EXTENSION: &str = "rle";
pub const RESTORED_EXTENSION: &str = "png";

/// Pick the color mode an image will be stored in.
///
/// Alpha is kept whenever the source has it, luma-with-alpha is widened to
/// RGBA. Deeper sample types are reduced to 8 bits per channel.
pub fn color_mode_for(color: ColorType) -> ColorMode {
    match color {
        ColorType::L8 | ColorType::L16 => ColorMode::L,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
        _ => ColorMode::Rgba,
    }
}

impl RleImage {
    /// Run-length encode a decoded image.
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        let mode = color_mode_for(image.color());
        let metadata = ImageMetadata {
            width: image.width(),
            height: image.height(),
            mode,
        };

        let bitmap = match mode {
            ColorMode::L => image.into_luma8().into_raw(),
            ColorMode::Rgb => image.into_rgb8().into_raw(),
            ColorMode::Rgba => image.into_rgba8().into_raw(),
        };

        Ok(Self {
            metadata,
            runs: run_length_encode(mode, &bitmap)?,
        })
    }

    /// Rebuild the image, failing if the runs do not cover it exactly.
    pub fn to_image(&self) -> Result<DynamicImage> {
        let ImageMetadata { width, height, mode } = self.metadata;
        let bitmap = self.to_bitmap()?;

        let mismatch = || Error::SizeMismatch {
            expected: self.metadata.pixel_count(),
            actual: self.pixel_count(),
        };

        Ok(match mode {
            ColorMode::L => GrayImage::from_raw(width, height, bitmap)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch)?,
            ColorMode::Rgb => RgbImage::from_raw(width, height, bitmap)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch)?,
            ColorMode::Rgba => RgbaImage::from_raw(width, height, bitmap)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch)?,
        })
    }
}

/// Run-length codec for raster images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn compress(&self, input: &Path) -> Result<PathBuf> {
        let image = image::ImageReader::open(input)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| unsupported(input, e))?;

        let rle = RleImage::from_image(image)?;

        let mut bytes = Vec::new();
        rle.write_into(&mut bytes)?;

        let output = compressed_path(input, ARTIFACT_EXTENSION);
        artifact::persist(&output, &bytes)?;

        Ok(output)
    }

    fn decompress(&self, artifact: &Path) -> Result<PathBuf> {
        let bytes = fs::read(artifact)?;
        let rle = RleImage::read_from(&mut Cursor::new(bytes))?;
        let image = rle.to_image()?;

        let mut png = Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;

        let output = decompressed_path(artifact, RESTORED_EXTENSION);
        artifact::persist(&output, png.get_ref())?;

        Ok(output)
    }
}

fn unsupported(path: &Path, error: ImageError) -> Error {
    match error {
        ImageError::IoError(e) => Error::Io(e),
        e => Error::UnsupportedFormat(format!("{path:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use image::{LumaA, Rgb};

    use super::*;

    #[test]
    fn single_color_rgb_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([12, 34, 56])));
        let rle = RleImage::from_image(image.clone()).unwrap();

        assert_eq!(rle.metadata, ImageMetadata { width: 2, height: 2, mode: ColorMode::Rgb });
        assert_eq!(rle.runs, [PixelRun { value: Pixel::Rgb(12, 34, 56), count: 4 }]);
        assert_eq!(rle.to_image().unwrap(), image);
    }

    #[test]
    fn luma_alpha_is_widened() {
        let image = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(3, 1, LumaA([200, 10])));
        let rle = RleImage::from_image(image).unwrap();

        assert_eq!(rle.metadata.mode, ColorMode::Rgba);
        assert_eq!(rle.runs, [PixelRun { value: Pixel::Rgba(200, 200, 200, 10), count: 3 }]);
    }

    #[test]
    fn mode_selection() {
        assert_eq!(color_mode_for(ColorType::L16), ColorMode::L);
        assert_eq!(color_mode_for(ColorType::Rgb16), ColorMode::Rgb);
        assert_eq!(color_mode_for(ColorType::La8), ColorMode::Rgba);
        assert_eq!(color_mode_for(ColorType::Rgba32F), ColorMode::Rgba);
    }

    #[test]
    fn short_runs_fail_to_rebuild() {
        let rle = RleImage {
            metadata: ImageMetadata { width: 4, height: 4, mode: ColorMode::L },
            runs: vec![PixelRun { value: Pixel::Gray(3), count: 15 }],
        };

        assert!(matches!(
            rle.to_image(),
            Err(Error::SizeMismatch { expected: 16, actual: 15 })
        ));
    }
}
