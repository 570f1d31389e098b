//! The template aggregate

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ArgumentError;
use crate::substitution::{is_valid_name, scan_placeholders};
use crate::variable::PlaceholderDefinition;

use super::defaults;
use super::presentation::PresentationSettings;

/// Template category; decides which placeholders a template is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// A feed post with author, text, photos and likes
    Moment,
    /// A conversation screen
    Chat,
    /// A profile page
    Profile,
    Other,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Moment,
        TemplateKind::Chat,
        TemplateKind::Profile,
        TemplateKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Moment => "moment",
            TemplateKind::Chat => "chat",
            TemplateKind::Profile => "profile",
            TemplateKind::Other => "other",
        }
    }

    /// Placeholders every template of this kind is expected to declare
    pub fn default_placeholders(&self) -> Vec<PlaceholderDefinition> {
        defaults::placeholders_for(*self)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown template kind '{}'", s))
    }
}

/// An SVG template with its declared placeholders
///
/// The markup and placeholder list are only changed through the edit methods so
/// `updated_at` stays accurate. Editing the markup never rescans placeholders;
/// call [`Template::rescan_placeholders`] when the token set may have changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    id: Uuid,
    pub kind: TemplateKind,
    pub name: String,
    markup: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    placeholders: Vec<PlaceholderDefinition>,
    #[serde(default)]
    pub presentation: PresentationSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Create a template with a fresh id and no declared placeholders
    pub fn new(kind: TemplateKind, name: impl Into<String>, markup: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            markup: markup.into(),
            metadata: BTreeMap::new(),
            placeholders: Vec::new(),
            presentation: PresentationSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Declare placeholders, replacing any with the same name
    pub fn with_placeholders(
        mut self,
        defs: impl IntoIterator<Item = PlaceholderDefinition>,
    ) -> Result<Self, ArgumentError> {
        for def in defs {
            self.add_or_replace_placeholder(def)?;
        }
        Ok(self)
    }

    /// Declare a text placeholder for every token in the markup
    pub fn with_inferred_placeholders(mut self) -> Self {
        self.rescan_placeholders();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_presentation(mut self, presentation: PresentationSettings) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn placeholders(&self) -> &[PlaceholderDefinition] {
        &self.placeholders
    }

    /// Look up a declared placeholder by name
    pub fn placeholder(&self, name: &str) -> Option<&PlaceholderDefinition> {
        self.placeholders.iter().find(|p| p.name == name)
    }

    /// Replace the markup; declared placeholders are left untouched
    pub fn update_markup(&mut self, markup: impl Into<String>) {
        self.markup = markup.into();
        self.touch();
    }

    /// Declare a placeholder, overwriting an existing one with the same name in place
    ///
    /// Names must be usable as tokens; an invalid name leaves the template unchanged.
    pub fn add_or_replace_placeholder(
        &mut self,
        def: PlaceholderDefinition,
    ) -> Result<(), ArgumentError> {
        if !is_valid_name(&def.name) {
            return Err(ArgumentError::InvalidPlaceholderName { name: def.name });
        }
        match self.placeholders.iter_mut().find(|p| p.name == def.name) {
            Some(existing) => *existing = def,
            None => self.placeholders.push(def),
        }
        self.touch();
        Ok(())
    }

    /// Remove a placeholder; removing an unknown name does nothing
    pub fn remove_placeholder(&mut self, name: &str) -> Option<PlaceholderDefinition> {
        let index = self.placeholders.iter().position(|p| p.name == name)?;
        self.touch();
        Some(self.placeholders.remove(index))
    }

    /// Declare text placeholders for tokens that have no definition yet
    ///
    /// Existing definitions keep their constraints. Returns the names added.
    pub fn rescan_placeholders(&mut self) -> Vec<String> {
        let added: Vec<String> = scan_placeholders(&self.markup)
            .into_iter()
            .filter(|name| self.placeholder(name).is_none())
            .collect();
        if !added.is_empty() {
            debug!(template = %self.name, added = ?added, "declared scanned placeholders");
            self.placeholders
                .extend(added.iter().cloned().map(PlaceholderDefinition::text));
            self.touch();
        }
        added
    }

    /// Check that every declared name is valid and declared once
    ///
    /// Deserialized templates bypass the edit methods, so the manager runs this
    /// on everything it stores.
    pub fn check_placeholders(&self) -> Result<(), ArgumentError> {
        let mut seen = HashSet::new();
        for def in &self.placeholders {
            if !is_valid_name(&def.name) {
                return Err(ArgumentError::InvalidPlaceholderName {
                    name: def.name.clone(),
                });
            }
            if !seen.insert(def.name.as_str()) {
                return Err(ArgumentError::DuplicatePlaceholder {
                    name: def.name.clone(),
                    template: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Kind defaults this template does not declare
    pub fn missing_defaults(&self) -> Vec<PlaceholderDefinition> {
        self.kind
            .default_placeholders()
            .into_iter()
            .filter(|def| self.placeholder(&def.name).is_none())
            .collect()
    }

    /// Copy with a new id, name and timestamps
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    /// SVG canvas size from the `viewBox` or `width`/`height` attributes
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        parse_svg_dimensions(&self.markup)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Parse SVG dimensions from content
pub(crate) fn parse_svg_dimensions(svg: &str) -> Option<(f64, f64)> {
    if let Some(vb_start) = svg.find("viewBox=\"") {
        let vb_start = vb_start + 9;
        if let Some(vb_end) = svg[vb_start..].find('"') {
            let vb_str = &svg[vb_start..vb_start + vb_end];
            let parts: Vec<f64> = vb_str
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter_map(|s| s.parse().ok())
                .collect();
            if parts.len() >= 4 {
                return Some((parts[2], parts[3]));
            }
        }
    }

    let width = parse_svg_attribute(svg, "width");
    let height = parse_svg_attribute(svg, "height");

    match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        _ => None,
    }
}

/// Parse a numeric attribute of the root `<svg>` element
fn parse_svg_attribute(svg: &str, attr: &str) -> Option<f64> {
    let root_start = svg.find("<svg")?;
    let root_end = svg[root_start..].find('>').map(|i| root_start + i)?;
    let root = &svg[root_start..root_end];

    let pattern = format!(" {}=\"", attr);
    let start = root.find(&pattern)? + pattern.len();
    let end = root[start..].find('"')?;
    // Strip unit suffixes like px, pt
    let numeric: String = root[start..start + end]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().ok()
}
