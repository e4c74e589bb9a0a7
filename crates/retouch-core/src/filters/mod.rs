//! The four color adjustment stages and their shared channel math.
//!
//! Every stage works in place on an owned `&mut [Rgb]` and computes in
//! `f64`, rounding half away from zero and clamping to `[0, 255]` before
//! narrowing back to `u8`.

pub mod brightness;
pub mod contrast;
pub mod gamma;
pub(crate) mod parallel;
pub mod saturation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::params::AMOUNT_LIMIT;

/// One of the ordered adjustment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Brightness,
    Contrast,
    Saturation,
    Gamma,
}

impl Stage {
    /// Execution order. Contrast depends on the statistic produced by
    /// Brightness, so this order is fixed.
    pub const ORDER: [Stage; 4] = [
        Stage::Brightness,
        Stage::Contrast,
        Stage::Saturation,
        Stage::Gamma,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Gamma => "gamma",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Round and clamp a computed channel value into `u8`.
#[inline]
pub fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Scale factor shared by contrast and saturation.
///
/// ```text
/// alpha = (255 + k) / (255 - k)
/// ```
///
/// `k` is clamped to `±AMOUNT_LIMIT` first, so the denominator never
/// reaches zero even when a caller bypasses parameter sanitizing.
pub fn amount_alpha(amount: f32) -> f64 {
    let k = if amount.is_finite() {
        f64::from(amount.clamp(-AMOUNT_LIMIT, AMOUNT_LIMIT))
    } else {
        0.0
    };
    (255.0 + k) / (255.0 - k)
}

/// Stretch `value` away from (alpha > 1) or toward (alpha < 1) `pivot`.
#[inline]
pub(crate) fn stretch(value: u8, pivot: f64, alpha: f64) -> u8 {
    clamp_channel(alpha * (f64::from(value) - pivot) + pivot)
}
