//! Pixel buffer representation for the adjustment pipeline.

use crate::error::CoreError;

/// One pixel: red, green and blue channel values, no alpha.
pub type Rgb = [u8; 3];

/// Row-major 8-bit RGB image.
///
/// The pixel vector always holds exactly `width * height` entries; the
/// constructors enforce it and no method changes the length afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    /// Wrap existing pixel data, checking it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Result<Self, CoreError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CoreError::BufferLength {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from interleaved `RGBRGB...` bytes.
    pub fn from_raw(width: u32, height: u32, bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() % 3 != 0 {
            return Err(CoreError::RawLength(bytes.len()));
        }
        let pixels: Vec<Rgb> = bytemuck::cast_slice::<u8, Rgb>(bytes).to_vec();
        Self::new(width, height, pixels)
    }

    /// A buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb; width as usize * height as usize],
        }
    }

    /// The placeholder gradient shown before the user picks a photo.
    ///
    /// ```text
    /// R = x % 100 + 40
    /// G = y % 100 + 80
    /// B = (x + y) % 100 + 120
    /// ```
    pub fn test_pattern(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push([
                    (x % 100 + 40) as u8,
                    (y % 100 + 80) as u8,
                    ((x + y) % 100 + 120) as u8,
                ]);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels (`width * height`).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Mutable access to the pixels. The slice cannot change length, so the
    /// dimension invariant survives any write through it.
    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Interleaved `RGBRGB...` view of the pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Hand the pixels to the `image` crate, e.g. for encoding.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_raw(self.width, self.height, self.as_bytes().to_vec())
            .unwrap_or_else(|| image::RgbImage::new(self.width, self.height))
    }
}

impl From<image::RgbImage> for PixelBuffer {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.pixels().map(|p| p.0).collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl From<&image::DynamicImage> for PixelBuffer {
    /// Drops alpha and converts any bit depth down to 8-bit RGB.
    fn from(img: &image::DynamicImage) -> Self {
        Self::from(img.to_rgb8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, vec![[0, 0, 0]; 3]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::BufferLength {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_from_raw_interleaved() {
        let buf = PixelBuffer::from_raw(2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(buf.pixels(), &[[1, 2, 3], [4, 5, 6]]);
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_from_raw_rejects_partial_pixel() {
        let err = PixelBuffer::from_raw(1, 1, &[1, 2]).unwrap_err();
        assert!(matches!(err, CoreError::RawLength(2)));
    }

    #[test]
    fn test_pattern_matches_formula() {
        let buf = PixelBuffer::test_pattern(200, 100);
        assert_eq!(buf.len(), 20_000);
        assert_eq!(buf.get(0, 0), Some([40, 80, 120]));
        assert_eq!(buf.get(150, 30), Some([90, 110, 200]));
        assert_eq!(buf.get(199, 99), Some([139, 179, 218]));
        assert_eq!(buf.get(200, 0), None);
    }

    #[test]
    fn test_rgb_image_conversion() {
        let buf = PixelBuffer::test_pattern(7, 3);
        let img = buf.to_rgb_image();
        assert_eq!(img.dimensions(), (7, 3));
        assert_eq!(img.get_pixel(4, 2).0, buf.get(4, 2).unwrap());
        assert_eq!(PixelBuffer::from(img), buf);
    }
}
