//! Configuration file support
//!
//! ```toml
//! palette = "themes/dark.toml"
//!
//! [render]
//! format = "jpeg"
//! width = 1080
//! height = 2340
//! jpeg_quality = 85
//! cache = true
//! cache_capacity = 8
//!
//! [substitution]
//! unresolved = "fail"
//! ```
//!
//! Every key is optional. A relative palette path is resolved against the
//! directory of the configuration file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::palette::{Palette, PaletteError};
use crate::render::{ImageFormat, RenderParameters, DEFAULT_CACHE_CAPACITY};
use crate::substitution::{SubstitutionConfig, UnresolvedPolicy};

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Palette(#[from] PaletteError),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedshotConfig {
    /// Palette overlaid on the built-in one
    pub palette: Option<PathBuf>,
    pub render: RenderSection,
    pub substitution: SubstitutionSection,
}

/// `[render]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub format: ImageFormat,
    /// Output width; the template's device size when absent
    pub width: Option<u32>,
    /// Output height; the template's device size when absent
    pub height: Option<u32>,
    pub jpeg_quality: u8,
    pub cache: bool,
    /// Rasters kept in memory before the least recently used is evicted
    pub cache_capacity: usize,
}

impl Default for RenderSection {
    fn default() -> Self {
        let params = RenderParameters::default();
        Self {
            format: params.format,
            width: None,
            height: None,
            jpeg_quality: params.jpeg_quality,
            cache: params.use_cache,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// `[substitution]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubstitutionSection {
    pub unresolved: UnresolvedPolicy,
}

impl FeedshotConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let (Some(palette), Some(dir)) = (&config.palette, path.parent()) {
            if palette.is_relative() {
                config.palette = Some(dir.join(palette));
            }
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.render.format = format;
        self
    }

    /// Override the output size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.render.width = Some(width);
        self.render.height = Some(height);
        self
    }

    pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.substitution.unresolved = policy;
        self
    }

    pub fn with_palette_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.palette = Some(path.into());
        self
    }

    /// The built-in palette with the configured palette file laid over it
    pub fn load_palette(&self) -> Result<Palette, ConfigError> {
        let base = Palette::default();
        match &self.palette {
            Some(path) => Ok(base.merged_with(&Palette::from_file(path)?)),
            None => Ok(base),
        }
    }

    /// Substitution settings, loading the palette
    pub fn substitution_config(&self) -> Result<SubstitutionConfig, ConfigError> {
        Ok(SubstitutionConfig::new()
            .with_unresolved(self.substitution.unresolved)
            .with_palette(self.load_palette()?))
    }

    /// Render parameters, falling back to `device_size` for unset dimensions
    pub fn render_parameters(&self, device_size: (u32, u32)) -> RenderParameters {
        let mut params = RenderParameters::new()
            .with_size(
                self.render.width.unwrap_or(device_size.0),
                self.render.height.unwrap_or(device_size.1),
            )
            .with_format(self.render.format)
            .with_jpeg_quality(self.render.jpeg_quality);
        if !self.render.cache {
            params = params.without_cache();
        }
        params
    }
}
