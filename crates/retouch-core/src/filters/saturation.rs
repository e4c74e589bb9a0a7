//! Saturation around each pixel's own gray level.
//!
//! ```text
//! alpha = (255 + amount) / (255 - amount)
//! gray  = floor((r + g + b) / 3)
//! out   = clamp(round(alpha × (in − gray) + gray), 0, 255)
//! ```

use crate::image::Rgb;
use crate::pipeline::PipelineConfig;
use crate::pipeline::cancel::{CancellationToken, Cancelled};

use super::{amount_alpha, parallel, stretch};

/// Integer mean of the three channels, taken before adjustment.
#[inline]
pub fn gray_level(rgb: Rgb) -> u8 {
    ((u16::from(rgb[0]) + u16::from(rgb[1]) + u16::from(rgb[2])) / 3) as u8
}

#[inline]
pub fn adjust_pixel(rgb: Rgb, alpha: f64) -> Rgb {
    let pivot = f64::from(gray_level(rgb));
    rgb.map(|c| stretch(c, pivot, alpha))
}

pub fn apply(
    pixels: &mut [Rgb],
    amount: f32,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    let alpha = amount_alpha(amount);
    parallel::for_each_chunk(pixels, config, cancel, |chunk| {
        for px in chunk.iter_mut() {
            *px = adjust_pixel(*px, alpha);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pixels: &mut [Rgb], amount: f32) {
        apply(
            pixels,
            amount,
            &PipelineConfig::default(),
            &CancellationToken::new(),
        )
        .unwrap();
    }

    #[test]
    fn test_gray_level_floors() {
        assert_eq!(gray_level([255, 255, 255]), 255);
        assert_eq!(gray_level([10, 20, 31]), 20);
        assert_eq!(gray_level([0, 0, 2]), 0);
    }

    #[test]
    fn test_gray_pixels_are_unaffected() {
        let mut pixels = vec![[90, 90, 90], [0, 0, 0], [255, 255, 255]];
        run(&mut pixels, 200.0);
        assert_eq!(pixels, vec![[90, 90, 90], [0, 0, 0], [255, 255, 255]]);
    }

    #[test]
    fn test_full_desaturation_collapses_to_gray() {
        let mut pixels = vec![[200, 100, 30]];
        run(&mut pixels, -254.0);
        // gray = 110; alpha = 1/509 pulls every channel onto it.
        assert_eq!(pixels[0], [110, 110, 110]);
    }

    #[test]
    fn test_positive_amount_boosts_chroma() {
        // alpha = 305/205, gray = 110
        let mut pixels = vec![[200, 100, 30]];
        run(&mut pixels, 50.0);
        assert_eq!(pixels[0], [244, 95, 0]);
    }

    #[test]
    fn test_singular_amount_is_finite_and_clamped() {
        let mut pixels = vec![[200, 100, 30], [128, 129, 127]];
        run(&mut pixels, 255.0);
        assert_eq!(pixels[0], [255, 0, 0]);
        assert_eq!(pixels[1], [128, 255, 0]);
    }
}
