//! Color palettes for symbolic color placeholders
//!
//! Color placeholders accept either a hex literal (`#07c160`) or a symbolic
//! token such as `accent-1` or `like`. Tokens are resolved through a palette so
//! the same template can be rendered in a light or dark theme.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing palettes
#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Failed to read palette file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse palette TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A palette mapping symbolic colors to concrete values
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Color mappings: token name -> hex color
    pub colors: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct TomlPalette {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    colors: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

/// Token prefixes that always resolve through the palette
const TOKEN_CATEGORIES: [&str; 4] = ["background", "text", "accent", "bubble"];

/// Default palette: light feed UI with a green accent
const DEFAULT_PALETTE: &str = r##"
[metadata]
name = "feed-light"

[colors]
# Page and card backgrounds
background-1 = "#ffffff"
background-2 = "#f7f7f7"
background-3 = "#ededed"
background-dark = "#191919"

# Text
text-1 = "#191919"
text-2 = "#576b95"
text-3 = "#b2b2b2"
text-light = "#ffffff"

# Accent (buttons, links, own chat bubbles)
accent-1 = "#07c160"
accent-2 = "#95ec69"
accent-light = "#e7f8ee"
accent-dark = "#06ad56"

# Chat bubbles
bubble-self = "#95ec69"
bubble-other = "#ffffff"

# Feed reactions
like = "#fa5151"
divider = "#e5e5e5"

# Status bar
status-bar = "#ededed"
status-bar-text = "#000000"
"##;

impl Palette {
    /// Load palette from TOML file
    pub fn from_file(path: &Path) -> Result<Self, PaletteError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load palette from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, PaletteError> {
        let parsed: TomlPalette = toml::from_str(content)?;

        Ok(Palette {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            colors: parsed.colors,
        })
    }

    /// Resolve a symbolic color token to a concrete value
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.colors.get(token).map(|s| s.as_str())
    }

    /// Resolve a symbolic color token with fallback to the default palette
    ///
    /// Fallback order:
    /// 1. This palette
    /// 2. Default palette
    /// 3. Category default (`background*` → white, `accent*` → green, ...)
    pub fn resolve_or_default(&self, token: &str) -> String {
        if let Some(color) = self.resolve(token) {
            return color.to_string();
        }

        let default = Self::default();
        if let Some(color) = default.resolve(token) {
            return color.to_string();
        }

        if token.starts_with("background") {
            return "#ffffff".to_string();
        }
        if token.starts_with("accent") {
            return "#07c160".to_string();
        }
        if token.starts_with("bubble") {
            return "#ffffff".to_string();
        }

        "#191919".to_string()
    }

    /// Concrete color for a Color placeholder value
    ///
    /// Hex literals are lowercased, palette tokens are resolved, and anything
    /// else (named SVG colors such as `red`) passes through unchanged.
    pub fn resolve_color(&self, value: &str) -> String {
        if is_hex_color(value) {
            return value.to_ascii_lowercase();
        }
        if self.resolve(value).is_some()
            || TOKEN_CATEGORIES.iter().any(|c| value.starts_with(c))
        {
            return self.resolve_or_default(value);
        }
        Self::default()
            .resolve(value)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string())
    }

    /// Overlay another palette's colors on top of this one
    pub fn merged_with(mut self, other: &Palette) -> Self {
        for (token, value) in &other.colors {
            self.colors.insert(token.clone(), value.clone());
        }
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        self
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_str(DEFAULT_PALETTE).expect("Default palette should be valid TOML")
    }
}

/// Whether `s` is a hex color literal (`#rgb`, `#rrggbb` or `#rrggbbaa`)
pub fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Whether `s` has the shape of a symbolic palette token
pub fn is_color_token(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
