//! Brightness offset and the average brightness statistic.
//!
//! ```text
//! out = clamp(round(in + offset), 0, 255)
//! ```
//!
//! The stage also returns the sum of every clamped channel value, which the
//! pipeline turns into the average brightness that the contrast stage pivots on.

use crate::image::Rgb;
use crate::pipeline::PipelineConfig;
use crate::pipeline::cancel::{CancellationToken, Cancelled};

use super::{clamp_channel, parallel};

/// Offset one pixel.
#[inline]
pub fn adjust_pixel(rgb: Rgb, offset: f32) -> Rgb {
    let offset = f64::from(offset);
    rgb.map(|c| clamp_channel(f64::from(c) + offset))
}

/// Offset every pixel in place. Returns the channel sum of the result.
pub fn apply(
    pixels: &mut [Rgb],
    offset: f32,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<u64, Cancelled> {
    parallel::sum_chunks(pixels, config, cancel, |chunk| {
        let mut sum = 0u64;
        for px in chunk.iter_mut() {
            *px = adjust_pixel(*px, offset);
            sum += channel_sum(*px);
        }
        sum
    })
}

/// `floor(sum / (pixel_count * 3))`. An empty image averages to 0.
pub fn average_brightness(sum: u64, pixel_count: usize) -> u8 {
    let channels = pixel_count as u64 * 3;
    if channels == 0 {
        return 0;
    }
    // Every channel is at most 255, so the mean is too.
    (sum / channels).min(255) as u8
}

#[inline]
fn channel_sum(rgb: Rgb) -> u64 {
    rgb.iter().map(|&c| u64::from(c)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pixels: &mut [Rgb], offset: f32) -> u64 {
        apply(
            pixels,
            offset,
            &PipelineConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_mid_gray_plus_twenty() {
        let mut pixels = vec![[128, 128, 128]; 4];
        let sum = run(&mut pixels, 20.0);
        assert!(pixels.iter().all(|p| *p == [148, 148, 148]));
        assert_eq!(sum, 148 * 12);
        assert_eq!(average_brightness(sum, pixels.len()), 148);
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let original = vec![[0, 17, 255], [3, 128, 200]];
        let mut pixels = original.clone();
        run(&mut pixels, 0.0);
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_sum_uses_clamped_values() {
        let mut pixels = vec![[250, 10, 100]];
        let sum = run(&mut pixels, 20.0);
        assert_eq!(pixels[0], [255, 30, 120]);
        assert_eq!(sum, 255 + 30 + 120);
    }

    #[test]
    fn test_fractional_offset_rounds() {
        assert_eq!(adjust_pixel([10, 10, 10], 0.5), [11, 11, 11]);
        assert_eq!(adjust_pixel([10, 10, 10], -0.4), [10, 10, 10]);
    }

    #[test]
    fn test_extremes_clamp() {
        assert_eq!(adjust_pixel([0, 128, 255], 255.0), [255, 255, 255]);
        assert_eq!(adjust_pixel([0, 128, 255], -255.0), [0, 0, 0]);
    }

    #[test]
    fn test_average_floors() {
        // (1 + 2 + 2) / 3 = 1.67
        assert_eq!(average_brightness(5, 1), 1);
        assert_eq!(average_brightness(0, 0), 0);
    }
}
