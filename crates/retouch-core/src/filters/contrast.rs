//! Contrast around the image's average brightness.
//!
//! ```text
//! alpha = (255 + amount) / (255 - amount)
//! out   = clamp(round(alpha × (in − avg) + avg), 0, 255)
//! ```
//!
//! Channels equal to `avg` are unchanged; the rest move away from it for a
//! positive amount and toward it for a negative one.

use crate::image::Rgb;
use crate::pipeline::PipelineConfig;
use crate::pipeline::cancel::{CancellationToken, Cancelled};

use super::{amount_alpha, parallel, stretch};

/// Contrast one pixel with a precomputed `alpha`.
#[inline]
pub fn adjust_pixel(rgb: Rgb, alpha: f64, average: u8) -> Rgb {
    let pivot = f64::from(average);
    rgb.map(|c| stretch(c, pivot, alpha))
}

pub fn apply(
    pixels: &mut [Rgb],
    amount: f32,
    average: u8,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    let alpha = amount_alpha(amount);
    parallel::for_each_chunk(pixels, config, cancel, |chunk| {
        for px in chunk.iter_mut() {
            *px = adjust_pixel(*px, alpha, average);
        }
    })
}
