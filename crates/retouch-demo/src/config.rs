//! Application configuration for the demo.

use std::path::PathBuf;

/// Default output file.
const DEFAULT_OUTPUT: &str = "retouched.jpg";
/// JPEG quality used when saving.
const DEFAULT_JPEG_QUALITY: u8 = 100;
/// Number of snapshots replayed between neutral and target parameters.
const DEFAULT_SWEEP_STEPS: u32 = 12;

/// Runtime configuration for the retouch demo, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Image to edit. `None` shows the built-in test pattern.
    pub input: Option<PathBuf>,
    /// Where the final image is saved.
    pub output: PathBuf,
    /// JSON file with the target adjustments. `None` uses a preset.
    pub params: Option<PathBuf>,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Number of intermediate requests simulating a slider drag.
    pub sweep_steps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: std::env::var_os("RETOUCH_INPUT").map(PathBuf::from),
            output: std::env::var_os("RETOUCH_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            params: std::env::var_os("RETOUCH_PARAMS").map(PathBuf::from),
            jpeg_quality: std::env::var("RETOUCH_JPEG_QUALITY")
                .ok()
                .and_then(|s| s.parse::<u8>().ok())
                .map(|q| q.clamp(1, 100))
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            sweep_steps: std::env::var("RETOUCH_SWEEP_STEPS")
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .map(|n| n.max(1))
                .unwrap_or(DEFAULT_SWEEP_STEPS),
        }
    }
}
