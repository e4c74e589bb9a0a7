//! Chunked, cancellable traversal of a pixel slice.
//!
//! Every stage walks its buffer in chunks of `chunk_pixels`. Each chunk is a
//! cancellation checkpoint. Buffers at or above `parallel_threshold` pixels
//! are split across the rayon pool; smaller ones stay on the run's thread.

use rayon::prelude::*;

use crate::image::Rgb;
use crate::pipeline::PipelineConfig;
use crate::pipeline::cancel::{CancellationToken, Cancelled};

/// Apply `f` to every chunk, skipping the rest once cancelled.
pub(crate) fn for_each_chunk<F>(
    pixels: &mut [Rgb],
    config: &PipelineConfig,
    cancel: &CancellationToken,
    f: F,
) -> Result<(), Cancelled>
where
    F: Fn(&mut [Rgb]) + Sync,
{
    let chunk_size = config.chunk_pixels.max(1);

    if pixels.len() >= config.parallel_threshold {
        pixels.par_chunks_mut(chunk_size).for_each(|chunk| {
            if !cancel.is_cancelled() {
                f(chunk);
            }
        });
    } else {
        for chunk in pixels.chunks_mut(chunk_size) {
            cancel.check()?;
            f(chunk);
        }
    }

    cancel.check()
}

/// Like [`for_each_chunk`], but `f` returns a partial sum per chunk and the
/// partial sums are combined before returning.
pub(crate) fn sum_chunks<F>(
    pixels: &mut [Rgb],
    config: &PipelineConfig,
    cancel: &CancellationToken,
    f: F,
) -> Result<u64, Cancelled>
where
    F: Fn(&mut [Rgb]) -> u64 + Sync,
{
    let chunk_size = config.chunk_pixels.max(1);

    let total = if pixels.len() >= config.parallel_threshold {
        pixels
            .par_chunks_mut(chunk_size)
            .map(|chunk| if cancel.is_cancelled() { 0 } else { f(chunk) })
            .sum::<u64>()
    } else {
        let mut total = 0u64;
        for chunk in pixels.chunks_mut(chunk_size) {
            cancel.check()?;
            total += f(chunk);
        }
        total
    };

    cancel.check()?;
    Ok(total)
}
