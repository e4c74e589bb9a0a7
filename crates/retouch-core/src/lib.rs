//! Retouch Core — domain layer for photo color correction.
//!
//! This crate contains the pixel buffer, the four adjustment stages, the
//! ordered pipeline that chains them, and the coordinator that cancels
//! superseded runs. No decoding, encoding or display code lives here.

pub mod error;
pub mod filters;
pub mod image;
pub mod params;
pub mod pipeline;
pub mod session;

// Re-exports for convenience.
pub use error::CoreError;
pub use filters::Stage;
pub use image::{PixelBuffer, Rgb};
pub use params::AdjustmentParams;
pub use pipeline::cancel::{CancellationToken, Cancelled};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, RunId, StageObserver};
pub use session::{AdjustmentSession, Coordinator, Delivery, DeliveryReceiver, RunState};
