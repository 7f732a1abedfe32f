use byteorder::{ByteOrder, LE};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Size of one PCM sample in bytes.
///
/// 1-byte samples are unsigned with a bias of 128, wider samples are signed
/// with no bias.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl SampleWidth {
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Smallest sample value after removing the bias
    pub fn min(self) -> i32 {
        match self {
            SampleWidth::One => -128,
            SampleWidth::Two => i16::MIN as i32,
            SampleWidth::Four => i32::MIN,
        }
    }

    /// Largest sample value after removing the bias
    pub fn max(self) -> i32 {
        match self {
            SampleWidth::One => 127,
            SampleWidth::Two => i16::MAX as i32,
            SampleWidth::Four => i32::MAX,
        }
    }
}

impl TryFrom<u16> for SampleWidth {
    type Error = u16;

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::One,
            2 => Self::Two,
            4 => Self::Four,
            v => return Err(v),
        })
    }
}

/// Unpack little-endian frame bytes into samples.
///
/// Bytes that do not make up a whole sample at the end are ignored.
pub fn decode_samples(width: SampleWidth, frames: &[u8]) -> Vec<i32> {
    frames
        .par_chunks_exact(width.bytes())
        .map(|c| match width {
            SampleWidth::One => c[0] as i32 - 128,
            SampleWidth::Two => LE::read_i16(c) as i32,
            SampleWidth::Four => LE::read_i32(c),
        })
        .collect()
}

/// Pack samples back into little-endian frame bytes.
///
/// Fails if a sample does not fit the width.
pub fn encode_samples(width: SampleWidth, samples: &[i32]) -> Result<Vec<u8>> {
    let (min, max) = (width.min(), width.max());
    if let Some(index) = samples.par_iter().position_first(|&s| s < min || s > max) {
        return Err(Error::CorruptArtifact(format!(
            "sample {index} ({}) does not fit in {} bytes",
            samples[index],
            width.bytes()
        )));
    }

    let mut frames = vec![0u8; samples.len() * width.bytes()];
    frames
        .par_chunks_exact_mut(width.bytes())
        .zip(samples.par_iter())
        .for_each(|(c, &s)| match width {
            SampleWidth::One => c[0] = (s + 128) as u8,
            SampleWidth::Two => LE::write_i16(c, s as i16),
            SampleWidth::Four => LE::write_i32(c, s),
        });

    Ok(frames)
}

/// Round a sample down onto the grid of multiples of `factor`.
///
/// Uses floor division. When the floored value would fall below what
/// `width` can hold, the next multiple up is used instead; it is still within
/// `factor` of the original sample.
pub fn quantize_sample(sample: i32, factor: u32, width: SampleWidth) -> i32 {
    let factor = factor as i64;
    let floored = (sample as i64).div_euclid(factor) * factor;

    let quantized = if floored < width.min() as i64 {
        floored + factor
    } else {
        floored
    };

    quantized as i32
}

/// Quantize every sample in place.
pub fn quantize(samples: &mut [i32], factor: u32, width: SampleWidth) {
    samples
        .par_iter_mut()
        .for_each(|s| *s = quantize_sample(*s, factor, width));
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn one_byte_samples_are_biased() {
        let samples = decode_samples(SampleWidth::One, &[0, 128, 255]);
        assert_eq!(samples, [-128, 0, 127]);
        assert_eq!(encode_samples(SampleWidth::One, &samples).unwrap(), [0, 128, 255]);
    }

    #[test]
    fn wider_samples_are_signed_little_endian() {
        let frames = [0x00, 0x80, 0xFF, 0x7F, 0xFE, 0xFF];
        let samples = decode_samples(SampleWidth::Two, &frames);
        assert_eq!(samples, [-32768, 32767, -2]);
        assert_eq!(encode_samples(SampleWidth::Two, &samples).unwrap(), frames);

        let frames = (-70_000i32).to_le_bytes();
        assert_eq!(decode_samples(SampleWidth::Four, &frames), [-70_000]);
    }

    #[test]
    fn partial_sample_is_dropped() {
        assert_eq!(decode_samples(SampleWidth::Two, &[1, 0, 7]), [1]);
    }

    #[test]
    fn out_of_range_sample_is_rejected() {
        assert!(matches!(
            encode_samples(SampleWidth::One, &[0, 128]),
            Err(Error::CorruptArtifact(_))
        ));
    }

    #[test]
    fn floor_division() {
        assert_eq!(quantize_sample(7, 2, SampleWidth::Two), 6);
        assert_eq!(quantize_sample(-7, 2, SampleWidth::Two), -8);
        assert_eq!(quantize_sample(-8, 4, SampleWidth::Two), -8);
        assert_eq!(quantize_sample(5, 1, SampleWidth::Two), 5);
    }

    #[test]
    fn stays_in_range_at_the_bottom() {
        assert_eq!(quantize_sample(-128, 3, SampleWidth::One), -126);
        assert_eq!(quantize_sample(i16::MIN as i32, 3, SampleWidth::Two), -32766);
        assert_eq!(quantize_sample(i32::MIN, 3, SampleWidth::Four), i32::MIN + 2);
        assert_eq!(quantize_sample(-5, 300, SampleWidth::One), 0);
    }

    #[test]
    fn quantized_samples_sit_on_the_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

        for (width, factor) in [
            (SampleWidth::One, 2),
            (SampleWidth::One, 7),
            (SampleWidth::Two, 4),
            (SampleWidth::Two, 1000),
            (SampleWidth::Four, 3),
        ] {
            let original: Vec<i32> = (0..2_000)
                .map(|_| rng.gen_range(width.min()..=width.max()))
                .collect();

            let mut quantized = original.clone();
            quantize(&mut quantized, factor, width);

            for (&s, &q) in original.iter().zip(&quantized) {
                assert_eq!(q.rem_euclid(factor as i32), 0, "{q} not a multiple of {factor}");
                assert!((s as i64 - q as i64).abs() < factor as i64, "{s} -> {q}");
                assert!(q >= width.min() && q <= width.max());
            }

            // Every quantized sample is representable again
            encode_samples(width, &quantized).unwrap();
        }
    }
}
