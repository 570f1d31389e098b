//! Raster backend with caching, cancellation and completion events

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::palette::Palette;

use super::cache::RasterCache;
use super::config::{check_size, DEFAULT_CACHE_CAPACITY};
use super::{ImageFormat, RenderCompletion, RenderError, RenderParameters, RenderStream, RenderingBackend};

const EVENT_CAPACITY: usize = 64;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Paints SVG markup onto an RGBA canvas of the requested size
///
/// Implementations run on a blocking thread and must not block on async work.
pub trait Rasterizer: Send + Sync + 'static {
    fn rasterize(&self, markup: &str, width: u32, height: u32) -> Result<RgbaImage, RenderError>;
}

/// Preview rasterizer that fills the canvas with the markup's background
///
/// The background is the `fill` of the first `<rect>` in the markup, resolved
/// through the palette. Markup without one renders white.
#[derive(Debug, Clone, Default)]
pub struct FlatRasterizer {
    palette: Palette,
}

impl FlatRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_palette(palette: Palette) -> Self {
        Self { palette }
    }

    /// Background color the canvas will be filled with
    pub fn background(&self, markup: &str) -> Rgba<u8> {
        first_rect_fill(markup)
            .and_then(|fill| parse_color(&self.palette.resolve_color(fill)))
            .unwrap_or(WHITE)
    }
}

impl Rasterizer for FlatRasterizer {
    fn rasterize(&self, markup: &str, width: u32, height: u32) -> Result<RgbaImage, RenderError> {
        check_size(width, height)?;
        Ok(RgbaImage::from_pixel(width, height, self.background(markup)))
    }
}

fn first_rect_fill(markup: &str) -> Option<&str> {
    let start = markup.find("<rect")?;
    let end = markup[start..].find('>').map(|i| start + i)?;
    let tag = &markup[start..end];
    let attr_start = tag.find(" fill=\"")? + 7;
    let attr_end = tag[attr_start..].find('"')?;
    Some(tag[attr_start..attr_start + attr_end].trim())
}

/// Parse a hex color literal or a basic color keyword
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "white" => return Some(WHITE),
        "black" => return Some(Rgba([0, 0, 0, 255])),
        "none" | "transparent" => return Some(Rgba([0, 0, 0, 0])),
        _ => {}
    }

    let hex = value.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let mut rgba = [255u8; 4];
            for (i, slot) in rgba.iter_mut().enumerate().take(hex.len()) {
                *slot = channel(&hex[i..i + 1])? * 17;
            }
            Some(Rgba(rgba))
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some(Rgba([r, g, b, a]))
        }
        _ => None,
    }
}

/// Cache key for one raster: SHA-256 over the markup and output size
fn cache_key(markup: &str, width: u32, height: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(markup.as_bytes());
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hex::encode(hasher.finalize())
}

fn encode(image: &RgbaImage, format: ImageFormat, jpeg_quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut out = Cursor::new(Vec::new());
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, jpeg_quality))?;
        }
        ImageFormat::Png | ImageFormat::Bmp => image.write_to(&mut out, format.encoding())?,
    }
    Ok(out.into_inner())
}

/// Encode on a blocking thread; a cancel abandons the encoder's output
async fn encode_blocking(
    image: Arc<RgbaImage>,
    format: ImageFormat,
    quality: u8,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, RenderError> {
    let task = tokio::task::spawn_blocking(move || encode(&image, format, quality));
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RenderError::Cancelled),
        joined = task => joined.map_err(|e| RenderError::Task(e.to_string()))?,
    }
}

/// Write through a temporary file in the target directory, then rename into place
///
/// Nothing is persisted once `cancel` fires; the temporary file is removed on drop.
fn write_atomically(path: &Path, bytes: &[u8], cancel: &CancellationToken) -> Result<(), RenderError> {
    let io_err = |source: std::io::Error| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    if cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// [`RenderingBackend`] that rasterizes with `R` and encodes with the `image` crate
pub struct RasterBackend<R> {
    rasterizer: Arc<R>,
    cache: Mutex<RasterCache>,
    events: broadcast::Sender<RenderCompletion>,
    jpeg_quality: u8,
    cache_enabled: bool,
}

impl Default for RasterBackend<FlatRasterizer> {
    fn default() -> Self {
        Self::new(FlatRasterizer::default())
    }
}

impl<R: Rasterizer> RasterBackend<R> {
    pub fn new(rasterizer: R) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            rasterizer: Arc::new(rasterizer),
            cache: Mutex::new(RasterCache::new(DEFAULT_CACHE_CAPACITY)),
            events,
            jpeg_quality: RenderParameters::default().jpeg_quality,
            cache_enabled: true,
        }
    }

    /// JPEG quality used by [`RenderingBackend::export_to_image`]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Never cache rasters
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    /// Keep at most `capacity` rasters, evicting the least recently used
    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        self.lock_cache().set_capacity(capacity);
        self
    }

    pub fn cache_capacity(&self) -> usize {
        self.lock_cache().capacity()
    }

    /// Number of cached rasters
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, RasterCache> {
        // Entries are immutable rasters; a poisoned cache is still usable
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn raster(
        &self,
        markup: &str,
        width: u32,
        height: u32,
        use_cache: bool,
        cancel: &CancellationToken,
    ) -> Result<Arc<RgbaImage>, RenderError> {
        check_size(width, height)?;
        let key = cache_key(markup, width, height);

        if use_cache {
            let cached = self.lock_cache().get(&key);
            if let Some(image) = cached {
                debug!(key = %&key[..12], "raster cache hit");
                return Ok(image);
            }
        }
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let rasterizer = Arc::clone(&self.rasterizer);
        let owned = markup.to_owned();
        let task = tokio::task::spawn_blocking(move || rasterizer.rasterize(&owned, width, height));
        let image = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RenderError::Cancelled),
            joined = task => joined.map_err(|e| RenderError::Task(e.to_string()))??,
        };

        let image = Arc::new(image);
        if use_cache {
            let evicted = self.lock_cache().insert(key, Arc::clone(&image));
            if evicted > 0 {
                debug!(evicted, "raster cache full, evicted least recently used");
            }
        }
        Ok(image)
    }

    async fn export(
        &self,
        markup: &str,
        path: &Path,
        format: ImageFormat,
        width: u32,
        height: u32,
        cancel: &CancellationToken,
    ) -> Result<(), RenderError> {
        let image = self
            .raster(markup, width, height, self.cache_enabled, cancel)
            .await?;
        let bytes = encode_blocking(image, format, self.jpeg_quality, cancel).await?;

        // Not raced: the write itself checks the token before persisting
        let target: PathBuf = path.to_path_buf();
        let token = cancel.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &bytes, &token))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }

    fn notify(&self, completion: RenderCompletion) {
        // Sending only fails when nobody is subscribed
        let _ = self.events.send(completion);
    }
}

#[async_trait]
impl<R: Rasterizer> RenderingBackend for RasterBackend<R> {
    async fn render_to_stream(
        &self,
        markup: &str,
        params: &RenderParameters,
    ) -> Result<RenderStream, RenderError> {
        let use_cache = self.cache_enabled && params.use_cache;
        let never = CancellationToken::new();
        let image = self
            .raster(markup, params.width, params.height, use_cache, &never)
            .await?;
        let bytes = encode_blocking(image, params.format, params.jpeg_quality, &never).await?;
        debug!(format = %params.format, bytes = bytes.len(), "rendered to stream");
        Ok(Cursor::new(bytes))
    }

    async fn export_to_image(
        &self,
        markup: &str,
        path: &Path,
        format: ImageFormat,
        width: u32,
        height: u32,
        cancel: &CancellationToken,
    ) -> Result<(), RenderError> {
        let outcome = self.export(markup, path, format, width, height, cancel).await;
        match &outcome {
            Ok(()) => {
                info!(path = %path.display(), %format, width, height, "exported image");
                self.notify(RenderCompletion {
                    success: true,
                    result: path.display().to_string(),
                });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "export failed");
                self.notify(RenderCompletion {
                    success: false,
                    result: e.to_string(),
                });
            }
        }
        outcome
    }

    fn clear_cache(&self) {
        let mut cache = self.lock_cache();
        debug!(entries = cache.len(), "clearing raster cache");
        cache.clear();
    }

    fn subscribe(&self) -> broadcast::Receiver<RenderCompletion> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#fff"), Some(WHITE));
        assert_eq!(parse_color("#07C160"), Some(Rgba([7, 193, 96, 255])));
        assert_eq!(parse_color("#00000080"), Some(Rgba([0, 0, 0, 128])));
        assert_eq!(parse_color("#f008"), Some(Rgba([255, 0, 0, 136])));
        assert_eq!(parse_color("black"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#ggg"), None);
        assert_eq!(parse_color("url(#grad)"), None);
    }

    #[test]
    fn test_flat_background_uses_first_rect() {
        let flat = FlatRasterizer::new();
        let markup = r##"<svg><rect width="100%" height="100%" fill="#ededed"/><rect fill="#000"/></svg>"##;
        assert_eq!(flat.background(markup), Rgba([237, 237, 237, 255]));
        assert_eq!(flat.background("<svg><circle fill=\"#000\"/></svg>"), WHITE);
    }

    #[test]
    fn test_flat_background_resolves_palette_tokens() {
        let flat = FlatRasterizer::new();
        let markup = r#"<svg><rect fill="accent-1"/></svg>"#;
        assert_eq!(flat.background(markup), Rgba([7, 193, 96, 255]));
    }

    #[test]
    fn test_fill_opacity_is_not_fill() {
        let markup = r##"<svg><rect fill-opacity="0.5" fill="#000000"/></svg>"##;
        assert_eq!(first_rect_fill(markup), Some("#000000"));
    }

    #[test]
    fn test_rasterize_size() {
        let image = FlatRasterizer::new().rasterize("<svg/>", 3, 2).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert!(FlatRasterizer::new().rasterize("<svg/>", 0, 2).is_err());
    }

    #[test]
    fn test_cache_key_depends_on_size() {
        assert_ne!(cache_key("<svg/>", 1, 2), cache_key("<svg/>", 2, 1));
        assert_eq!(cache_key("<svg/>", 1, 2), cache_key("<svg/>", 1, 2));
        assert_eq!(cache_key("<svg/>", 1, 2).len(), 64);
    }

    #[test]
    fn test_cancelled_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.png");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = write_atomically(&path, b"bytes", &cancel).unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

        write_atomically(&path, b"bytes", &CancellationToken::new()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn test_encode_signatures() {
        let image = RgbaImage::from_pixel(4, 4, WHITE);
        let png = encode(&image, ImageFormat::Png, 90).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let jpeg = encode(&image, ImageFormat::Jpeg, 90).unwrap();
        assert_eq!(&jpeg[..2], b"\xff\xd8");
        let bmp = encode(&image, ImageFormat::Bmp, 90).unwrap();
        assert_eq!(&bmp[..2], b"BM");
    }
}
