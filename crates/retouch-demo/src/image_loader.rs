//! Image loading and saving for the demo application.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use retouch_core::PixelBuffer;

/// Load an image from disk as 8-bit RGB.
///
/// Any format the `image` crate decodes is accepted. Alpha is dropped and
/// deeper bit depths are reduced to 8 bits per channel.
pub fn load_image(path: &Path) -> Result<PixelBuffer, ImageLoadError> {
    let img = image::open(path).map_err(ImageLoadError::Decode)?;
    let buffer = PixelBuffer::from(&img);
    tracing::info!(
        path = %path.display(),
        width = buffer.width(),
        height = buffer.height(),
        "image loaded"
    );
    Ok(buffer)
}

/// Encode `buffer` as JPEG at `quality` and write it to `path`.
pub fn save_image(buffer: &PixelBuffer, path: &Path, quality: u8) -> Result<(), ImageLoadError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    buffer
        .to_rgb_image()
        .write_with_encoder(encoder)
        .map_err(ImageLoadError::Encode)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), quality, "image saved");
    Ok(())
}

/// Errors that can occur while loading or saving images.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
