//! Configuration for raster rendering

use super::{ImageFormat, RenderError};

/// Largest accepted width or height in pixels
pub const MAX_DIMENSION: u32 = 16384;

/// Rasters a backend keeps before evicting the least recently used
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Options for one in-memory render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParameters {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    pub format: ImageFormat,

    /// JPEG quality, 1 to 100
    pub jpeg_quality: u8,

    /// Whether rasters may be served from and stored in the backend cache
    pub use_cache: bool,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            width: 1170,
            height: 2532,
            format: ImageFormat::Png,
            jpeg_quality: 90,
            use_cache: true,
        }
    }
}

impl RenderParameters {
    /// Create parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the output encoding
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the JPEG quality, clamped to 1..=100
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Always rasterize, bypassing the cache
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

pub(crate) fn check_size(width: u32, height: u32) -> Result<(), RenderError> {
    let valid = |side: u32| (1..=MAX_DIMENSION).contains(&side);
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(RenderError::InvalidSize {
            width,
            height,
            max: MAX_DIMENSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = RenderParameters::default();
        assert_eq!((params.width, params.height), (1170, 2532));
        assert_eq!(params.format, ImageFormat::Png);
        assert!(params.use_cache);
    }

    #[test]
    fn test_builder_pattern() {
        let params = RenderParameters::new()
            .with_size(100, 200)
            .with_format(ImageFormat::Jpeg)
            .with_jpeg_quality(0)
            .without_cache();

        assert_eq!((params.width, params.height), (100, 200));
        assert_eq!(params.format, ImageFormat::Jpeg);
        assert_eq!(params.jpeg_quality, 1);
        assert!(!params.use_cache);
    }

    #[test]
    fn test_size_limits() {
        assert!(check_size(1, MAX_DIMENSION).is_ok());
        assert!(check_size(0, 10).is_err());
        assert!(check_size(10, MAX_DIMENSION + 1).is_err());
    }
}
