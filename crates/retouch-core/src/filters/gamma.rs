//! Gamma curve on normalized channel values.
//!
//! ```text
//! out = clamp(round(255 × (in / 255) ^ gamma), 0, 255)
//! ```
//!
//! The curve only depends on the channel value, so it is baked into a
//! 256-entry table once per run and applied by lookup.

use crate::image::Rgb;
use crate::params::{GAMMA_MAX, GAMMA_MIN};
use crate::pipeline::PipelineConfig;
use crate::pipeline::cancel::{CancellationToken, Cancelled};

use super::{clamp_channel, parallel};

/// Lookup table mapping every input level to its gamma-adjusted level.
pub type GammaLut = [u8; 256];

/// Bake the curve for `gamma`, clamped to `[GAMMA_MIN, GAMMA_MAX]`.
pub fn bake_lut(gamma: f32) -> GammaLut {
    let exponent = if gamma.is_finite() {
        f64::from(gamma.clamp(GAMMA_MIN, GAMMA_MAX))
    } else {
        1.0
    };

    let mut lut = [0u8; 256];
    for (level, out) in lut.iter_mut().enumerate() {
        let normalized = level as f64 / 255.0;
        *out = clamp_channel(255.0 * normalized.powf(exponent));
    }
    lut
}

#[inline]
pub fn adjust_pixel(rgb: Rgb, lut: &GammaLut) -> Rgb {
    rgb.map(|c| lut[usize::from(c)])
}

pub fn apply(
    pixels: &mut [Rgb],
    gamma: f32,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    let lut = bake_lut(gamma);
    parallel::for_each_chunk(pixels, config, cancel, |chunk| {
        for px in chunk.iter_mut() {
            *px = adjust_pixel(*px, &lut);
        }
    })
}
