//! Ordered execution of the four adjustment stages.
//!
//! ```text
//!   copy source ──→ Brightness ──→ avg ──→ Contrast ──→ Saturation ──→ Gamma ──→ output
//!                        │          ▲
//!                        └── sum ───┘
//! ```
//!
//! The average brightness is a barrier: every chunk of the brightness stage
//! must finish and its partial sum be combined before contrast can start.

pub mod cancel;

use serde::{Deserialize, Serialize};

use crate::filters::{Stage, brightness, contrast, gamma, saturation};
use crate::image::PixelBuffer;
use crate::params::AdjustmentParams;

use cancel::{CancellationToken, Cancelled};

/// Identifier of one pipeline run. Increases with every request.
pub type RunId = u64;

/// Default pixels per cancellation checkpoint.
const DEFAULT_CHUNK_PIXELS: usize = 16 * 1024;
/// Default pixel count at which stages fan out across the rayon pool.
const DEFAULT_PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Work splitting for the stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pixels processed between two cancellation checks.
    pub chunk_pixels: usize,
    /// Images with at least this many pixels are processed in parallel.
    pub parallel_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_pixels: DEFAULT_CHUNK_PIXELS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Hook notified as a run progresses.
///
/// Called on the run's worker thread right after each stage completes.
pub trait StageObserver: Send + Sync {
    fn stage_completed(&self, run: RunId, stage: Stage);
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn stage_completed(&self, _run: RunId, _stage: Stage) {}
}

/// A fully adjusted image plus what was used to produce it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub image: PixelBuffer,
    /// Parameters after sanitizing, i.e. the values actually applied.
    pub params: AdjustmentParams,
    /// Average brightness measured after the brightness stage.
    pub average_brightness: u8,
}

/// Runs the stages in their fixed order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Adjust a copy of `source`. The source itself is never touched.
    pub fn recompute(
        &self,
        source: &PixelBuffer,
        params: &AdjustmentParams,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, Cancelled> {
        self.recompute_observed(source, params, cancel, 0, &NoopObserver)
    }

    /// [`Self::recompute`] with progress reported to `observer` under `run`.
    pub fn recompute_observed(
        &self,
        source: &PixelBuffer,
        params: &AdjustmentParams,
        cancel: &CancellationToken,
        run: RunId,
        observer: &dyn StageObserver,
    ) -> Result<PipelineOutput, Cancelled> {
        cancel.check()?;

        let applied = params.sanitized();
        if applied != *params {
            tracing::warn!(run, ?params, ?applied, "adjustment parameters clamped");
        }

        let mut image = source.clone();
        let average_brightness =
            self.apply_stages(&mut image, &applied, cancel, run, observer)?;

        // Last checkpoint: a run cancelled after its final stage still
        // must not hand out its buffer.
        cancel.check()?;

        Ok(PipelineOutput {
            image,
            params: applied,
            average_brightness,
        })
    }

    fn apply_stages(
        &self,
        image: &mut PixelBuffer,
        params: &AdjustmentParams,
        cancel: &CancellationToken,
        run: RunId,
        observer: &dyn StageObserver,
    ) -> Result<u8, Cancelled> {
        let config = &self.config;
        let pixel_count = image.len();
        let pixels = image.pixels_mut();

        let sum = brightness::apply(pixels, params.brightness, config, cancel)?;
        let average = brightness::average_brightness(sum, pixel_count);
        finish_stage(observer, run, Stage::Brightness, cancel)?;
        tracing::trace!(run, average, "average brightness");

        contrast::apply(pixels, params.contrast, average, config, cancel)?;
        finish_stage(observer, run, Stage::Contrast, cancel)?;

        saturation::apply(pixels, params.saturation, config, cancel)?;
        finish_stage(observer, run, Stage::Saturation, cancel)?;

        gamma::apply(pixels, params.gamma, config, cancel)?;
        finish_stage(observer, run, Stage::Gamma, cancel)?;

        Ok(average)
    }
}

/// Stage boundary: notify, then checkpoint.
fn finish_stage(
    observer: &dyn StageObserver,
    run: RunId,
    stage: Stage,
    cancel: &CancellationToken,
) -> Result<(), Cancelled> {
    observer.stage_completed(run, stage);
    cancel.check()
}
