//! Adjustment parameter snapshot taken at the start of every pipeline run.
//!
//! The UI owns the live slider values; the pipeline only ever sees an
//! `AdjustmentParams` copy, so all four values form one joint request.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Largest brightness offset magnitude (one full 8-bit channel).
pub const BRIGHTNESS_LIMIT: f32 = 255.0;

/// Largest contrast/saturation magnitude.
///
/// Both stages use `alpha = (255 + k) / (255 - k)`, which diverges at
/// `k = 255`. Amounts are clamped one step short of it, giving a maximum
/// alpha of 509.
pub const AMOUNT_LIMIT: f32 = 254.0;

/// Smallest accepted gamma exponent.
pub const GAMMA_MIN: f32 = 0.05;

/// Largest accepted gamma exponent.
pub const GAMMA_MAX: f32 = 8.0;

/// The four user-facing adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentParams {
    /// Offset added to every channel. 0.0 = neutral.
    pub brightness: f32,
    /// Contrast amount around the average brightness. 0.0 = neutral.
    pub contrast: f32,
    /// Saturation amount around each pixel's gray level. 0.0 = neutral.
    pub saturation: f32,
    /// Gamma exponent applied to normalized channels. 1.0 = neutral.
    pub gamma: f32,
}

impl Default for AdjustmentParams {
    /// Produces an identity (no-op) adjustment.
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            gamma: 1.0,
        }
    }
}

impl AdjustmentParams {
    pub fn new(brightness: f32, contrast: f32, saturation: f32, gamma: f32) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            gamma,
        }
    }

    /// Parse a JSON snapshot. Missing fields take their neutral value.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// True when every value is at its neutral setting.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Clamp every value into the range the stages are defined on.
    ///
    /// Non-finite values fall back to neutral. The pipeline calls this on
    /// every snapshot, so the stages never see a singular amount.
    pub fn sanitized(&self) -> Self {
        Self {
            brightness: clamp_finite(self.brightness, -BRIGHTNESS_LIMIT, BRIGHTNESS_LIMIT, 0.0),
            contrast: clamp_finite(self.contrast, -AMOUNT_LIMIT, AMOUNT_LIMIT, 0.0),
            saturation: clamp_finite(self.saturation, -AMOUNT_LIMIT, AMOUNT_LIMIT, 0.0),
            gamma: clamp_finite(self.gamma, GAMMA_MIN, GAMMA_MAX, 1.0),
        }
    }

    /// Strict check: report the first out-of-range value instead of clamping.
    pub fn validate(&self) -> Result<(), CoreError> {
        let checks = [
            ("brightness", self.brightness, -BRIGHTNESS_LIMIT, BRIGHTNESS_LIMIT),
            ("contrast", self.contrast, -AMOUNT_LIMIT, AMOUNT_LIMIT),
            ("saturation", self.saturation, -AMOUNT_LIMIT, AMOUNT_LIMIT),
            ("gamma", self.gamma, GAMMA_MIN, GAMMA_MAX),
        ];
        for (name, value, min, max) in checks {
            if !value.is_finite() || value < min || value > max {
                return Err(CoreError::InvalidParam { name, value });
            }
        }
        Ok(())
    }

    /// Linear blend from `self` (t = 0) to `target` (t = 1).
    ///
    /// Used to replay a slider drag as a sequence of snapshots.
    pub fn lerp(&self, target: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            brightness: mix(self.brightness, target.brightness),
            contrast: mix(self.contrast, target.contrast),
            saturation: mix(self.saturation, target.saturation),
            gamma: mix(self.gamma, target.gamma),
        }
    }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
