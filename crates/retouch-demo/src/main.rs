//! Retouch Demo — headless photo adjustment.
//!
//! Loads a photo (or the built-in test pattern), replays a slider drag
//! towards the target adjustments as a burst of requests, shows whichever
//! results survive, and saves the final image as JPEG.

mod config;
mod image_loader;
mod viewer;

use std::path::Path;

use retouch_core::{AdjustmentParams, AdjustmentSession, CoreError, PipelineConfig, PixelBuffer};

use config::AppConfig;
use image_loader::ImageLoadError;
use viewer::Viewer;

/// Size of the placeholder image shown before a photo is picked.
const PATTERN_WIDTH: u32 = 200;
const PATTERN_HEIGHT: u32 = 100;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Image(#[from] ImageLoadError),
    #[error("failed to read {path}: {source}")]
    ReadParams {
        path: String,
        source: std::io::Error,
    },
    #[error("pipeline session closed before run {0} was shown")]
    SessionClosed(u64),
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(AppConfig::default()) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(config: AppConfig) -> Result<(), DemoError> {
    let source = match &config.input {
        Some(path) => image_loader::load_image(path)?,
        None => {
            tracing::info!("no input given, using the test pattern");
            PixelBuffer::test_pattern(PATTERN_WIDTH, PATTERN_HEIGHT)
        }
    };
    let target = match &config.params {
        Some(path) => load_params(path)?,
        None => AdjustmentParams::new(20.0, 40.0, 60.0, 1.2),
    };

    let (session, receiver) = AdjustmentSession::new(PipelineConfig::default());
    let mut viewer = Viewer::new(receiver, source.clone());
    session.set_source(source);

    // Every slider tick is a new joint request that supersedes the last.
    let neutral = AdjustmentParams::default();
    let mut last_run = None;
    for step in 1..=config.sweep_steps {
        let t = step as f32 / config.sweep_steps as f32;
        last_run = Some(session.recompute(neutral.lerp(&target, t))?);
        viewer.poll();
    }

    if let Some(run) = last_run
        && !viewer.wait_for(run)
    {
        return Err(DemoError::SessionClosed(run));
    }
    session.wait_idle();

    tracing::info!(
        requested = config.sweep_steps,
        delivered = session.coordinator().delivered_count(),
        "burst finished"
    );

    image_loader::save_image(viewer.shown(), &config.output, config.jpeg_quality)?;
    Ok(())
}

/// Read target adjustments from a JSON file.
///
/// Values outside the supported ranges are rejected here rather than
/// silently clamped by the pipeline.
fn load_params(path: &Path) -> Result<AdjustmentParams, DemoError> {
    let json = std::fs::read_to_string(path).map_err(|source| DemoError::ReadParams {
        path: path.display().to_string(),
        source,
    })?;
    let params = AdjustmentParams::from_json(&json)?;
    params.validate()?;
    Ok(params)
}
