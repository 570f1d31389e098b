//! Rendering backends
//!
//! A backend turns fully substituted SVG markup into a raster image, either as
//! an in-memory stream or written to disk. Rendering is asynchronous and
//! cancellable; every finished export is announced to subscribers.

mod cache;
mod config;
mod raster;

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

pub use config::{RenderParameters, DEFAULT_CACHE_CAPACITY, MAX_DIMENSION};
pub use raster::{parse_color, FlatRasterizer, RasterBackend, Rasterizer};

/// Encoded image bytes, positioned at the start
pub type RenderStream = Cursor<Vec<u8>>;

/// Output encodings supported by the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp];

    /// Conventional file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Bmp => "bmp",
        }
    }

    /// Guess the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub(crate) fn encoding(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg => write!(f, "jpeg"),
            ImageFormat::Bmp => write!(f, "bmp"),
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "bmp" => Ok(ImageFormat::Bmp),
            other => Err(format!("unsupported image format '{}'", other)),
        }
    }
}

/// Outcome of one export, broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCompletion {
    pub success: bool,
    /// Output path on success, error message otherwise
    pub result: String,
}

/// Errors raised by rendering backends
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render was cancelled")]
    Cancelled,

    #[error("invalid output size {width}x{height} (each side must be 1..={max})")]
    InvalidSize { width: u32, height: u32, max: u32 },

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("render task failed: {0}")]
    Task(String),
}

/// Turns substituted markup into raster images
#[async_trait]
pub trait RenderingBackend: Send + Sync {
    /// Render into an in-memory encoded image
    async fn render_to_stream(
        &self,
        markup: &str,
        params: &RenderParameters,
    ) -> Result<RenderStream, RenderError>;

    /// Render and write an image file
    ///
    /// Nothing is left at `path` if the export fails or is cancelled.
    async fn export_to_image(
        &self,
        markup: &str,
        path: &Path,
        format: ImageFormat,
        width: u32,
        height: u32,
        cancel: &CancellationToken,
    ) -> Result<(), RenderError>;

    /// Drop every cached raster
    fn clear_cache(&self);

    /// Receive a [`RenderCompletion`] for every export that finishes
    fn subscribe(&self) -> broadcast::Receiver<RenderCompletion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("PNG".parse::<ImageFormat>(), Ok(ImageFormat::Png));
        assert_eq!("jpg".parse::<ImageFormat>(), Ok(ImageFormat::Jpeg));
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ImageFormat::from_path(Path::new("out/shot.JPEG")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_path(Path::new("shot")), None);
    }

    #[test]
    fn test_invalid_size_message() {
        let err = RenderError::InvalidSize {
            width: 0,
            height: 10,
            max: MAX_DIMENSION,
        };
        assert_eq!(
            err.to_string(),
            "invalid output size 0x10 (each side must be 1..=16384)"
        );
    }
}
