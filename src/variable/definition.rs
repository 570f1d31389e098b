//! Placeholder definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// The declared type of a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderType {
    Text,
    Number,
    Boolean,
    DateTime,
    Color,
    ImagePath,
    RichText,
    JsonObject,
    Enum,
    List,
}

impl PlaceholderType {
    /// All placeholder types, in declaration order
    pub const ALL: [PlaceholderType; 10] = [
        PlaceholderType::Text,
        PlaceholderType::Number,
        PlaceholderType::Boolean,
        PlaceholderType::DateTime,
        PlaceholderType::Color,
        PlaceholderType::ImagePath,
        PlaceholderType::RichText,
        PlaceholderType::JsonObject,
        PlaceholderType::Enum,
        PlaceholderType::List,
    ];

    /// The tag used in persisted templates and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderType::Text => "text",
            PlaceholderType::Number => "number",
            PlaceholderType::Boolean => "boolean",
            PlaceholderType::DateTime => "date_time",
            PlaceholderType::Color => "color",
            PlaceholderType::ImagePath => "image_path",
            PlaceholderType::RichText => "rich_text",
            PlaceholderType::JsonObject => "json_object",
            PlaceholderType::Enum => "enum",
            PlaceholderType::List => "list",
        }
    }
}

impl fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceholderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        PlaceholderType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == normalized)
            .ok_or_else(|| format!("unknown placeholder type '{}'", s))
    }
}

/// Declares one substitutable slot in a template
///
/// Constraint fields only apply to the matching type: `options` to
/// [`PlaceholderType::Enum`], `min_value`/`max_value` to
/// [`PlaceholderType::Number`], `regex_pattern` to [`PlaceholderType::Text`] and
/// `format` to [`PlaceholderType::DateTime`]. On any other type they are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderDefinition {
    /// Token name used in markup (case-sensitive)
    pub name: String,

    #[serde(rename = "type")]
    pub ty: PlaceholderType,

    #[serde(default)]
    pub required: bool,

    /// Fallback used when no explicit value is bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_pattern: Option<String>,

    /// strftime pattern for date/time output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlaceholderDefinition {
    /// Create an optional definition with no default or constraints
    pub fn new(name: impl Into<String>, ty: PlaceholderType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            default_value: None,
            options: Vec::new(),
            min_value: None,
            max_value: None,
            regex_pattern: None,
            format: None,
            description: None,
        }
    }

    /// Shorthand for a text definition
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, PlaceholderType::Text)
    }

    /// Mark the placeholder as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.regex_pattern = Some(pattern.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Options that apply to this definition's type (empty unless Enum)
    pub fn effective_options(&self) -> &[String] {
        if self.ty == PlaceholderType::Enum {
            &self.options
        } else {
            &[]
        }
    }

    /// Numeric bounds that apply to this definition's type
    pub fn effective_bounds(&self) -> (Option<f64>, Option<f64>) {
        if self.ty == PlaceholderType::Number {
            (self.min_value, self.max_value)
        } else {
            (None, None)
        }
    }

    /// Regex constraint that applies to this definition's type
    pub fn effective_pattern(&self) -> Option<&str> {
        if self.ty == PlaceholderType::Text {
            self.regex_pattern.as_deref()
        } else {
            None
        }
    }

    /// Date format that applies to this definition's type
    pub fn effective_format(&self) -> Option<&str> {
        if self.ty == PlaceholderType::DateTime {
            self.format.as_deref()
        } else {
            None
        }
    }
}
