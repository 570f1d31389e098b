//! Placeholder bindings: a definition paired with the value for one render

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use regex::Regex;

use crate::error::{ArgumentError, Span, ValidationError};
use crate::palette::{is_color_token, is_hex_color};
use crate::template::Template;
use crate::variable::{PlaceholderDefinition, PlaceholderType, Value};

/// One reason a binding is not ready for substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Placeholder the issue belongs to
    pub placeholder: String,
    /// Human-readable message naming the placeholder
    pub message: String,
    /// Where the placeholder first occurs in the markup, when known
    pub span: Option<Span>,
}

impl ValidationIssue {
    fn new(placeholder: &str, message: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            message: message.into(),
            span: None,
        }
    }

    /// Attach the markup location of the offending token
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A definition paired with a concrete value
#[derive(Debug, Clone)]
pub struct PlaceholderBinding {
    definition: Arc<PlaceholderDefinition>,
    value: Option<Value>,
}

impl PlaceholderBinding {
    /// Bind `initial`, falling back to the definition's default when absent
    pub fn new(definition: Arc<PlaceholderDefinition>, initial: Option<Value>) -> Self {
        let value = initial.or_else(|| definition.default_value.clone());
        Self { definition, value }
    }

    /// Bind a value to a definition that may not have been found
    pub fn try_new(
        definition: Option<Arc<PlaceholderDefinition>>,
        initial: Option<Value>,
    ) -> Result<Self, ArgumentError> {
        let definition = definition.ok_or(ArgumentError::MissingDefinition)?;
        Ok(Self::new(definition, initial))
    }

    /// Bind a value to the template's placeholder called `name`
    pub fn for_template(
        template: &Template,
        name: &str,
        initial: Option<Value>,
    ) -> Result<Self, ArgumentError> {
        let definition = template
            .placeholder(name)
            .ok_or_else(|| ArgumentError::UnknownPlaceholder {
                name: name.to_string(),
                template: template.name.clone(),
            })?;
        Ok(Self::new(Arc::new(definition.clone()), initial))
    }

    pub fn definition(&self) -> &PlaceholderDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Effective value (explicit value or definition default)
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.definition.required
    }

    /// Check the effective value against the definition
    ///
    /// Returns the first problem found; absent optional values are valid.
    pub fn validate(&self) -> Result<(), ValidationIssue> {
        let def = &*self.definition;
        let name = def.name.as_str();

        let value = match &self.value {
            Some(value) => value,
            None if def.required => {
                return Err(ValidationIssue::new(
                    name,
                    format!("placeholder '{}' is required but has no value", name),
                ));
            }
            None => return Ok(()),
        };

        let mismatch = || {
            ValidationIssue::new(
                name,
                format!(
                    "placeholder '{}' expects {} but got {}",
                    name,
                    def.ty,
                    value.kind()
                ),
            )
        };

        match def.ty {
            PlaceholderType::Number => {
                if !value.is_numeric() {
                    return Err(mismatch());
                }
                check_number(def, value)
            }
            PlaceholderType::Boolean => match value {
                Value::Boolean(_) => Ok(()),
                _ => Err(mismatch()),
            },
            PlaceholderType::DateTime => match value {
                Value::DateTime(_) => check_date_format(def),
                _ => Err(mismatch()),
            },
            PlaceholderType::Text => match value {
                Value::Text(s) | Value::RichText(s) => check_pattern(def, s),
                _ => Err(mismatch()),
            },
            PlaceholderType::RichText => match value {
                Value::Text(_) | Value::RichText(_) => Ok(()),
                _ => Err(mismatch()),
            },
            PlaceholderType::Enum => match value {
                Value::Text(s) => check_option(def, s),
                _ => Err(mismatch()),
            },
            PlaceholderType::Color => match value {
                Value::Color(s) | Value::Text(s) => check_color(name, s),
                _ => Err(mismatch()),
            },
            PlaceholderType::ImagePath => match value {
                Value::ImagePath(s) | Value::Text(s) if !s.trim().is_empty() => Ok(()),
                Value::ImagePath(_) | Value::Text(_) => Err(ValidationIssue::new(
                    name,
                    format!("placeholder '{}' has an empty image path", name),
                )),
                _ => Err(mismatch()),
            },
            PlaceholderType::JsonObject => match value {
                Value::Json(serde_json::Value::Object(_)) => Ok(()),
                Value::Text(s) => match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(serde_json::Value::Object(_)) => Ok(()),
                    _ => Err(ValidationIssue::new(
                        name,
                        format!("placeholder '{}' expects a JSON object", name),
                    )),
                },
                _ => Err(mismatch()),
            },
            PlaceholderType::List => match value {
                Value::List(_) => Ok(()),
                _ => Err(mismatch()),
            },
        }
    }
}

fn check_number(def: &PlaceholderDefinition, value: &Value) -> Result<(), ValidationIssue> {
    let name = def.name.as_str();
    let n = value.as_f64().unwrap_or(f64::NAN);
    if !n.is_finite() {
        return Err(ValidationIssue::new(
            name,
            format!("placeholder '{}' must be a finite number", name),
        ));
    }
    let (min, max) = def.effective_bounds();
    if let Some(min) = min {
        if n < min {
            return Err(ValidationIssue::new(
                name,
                format!("placeholder '{}' must be at least {}, got {}", name, min, n),
            ));
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(ValidationIssue::new(
                name,
                format!("placeholder '{}' must be at most {}, got {}", name, max, n),
            ));
        }
    }
    Ok(())
}

fn check_pattern(def: &PlaceholderDefinition, text: &str) -> Result<(), ValidationIssue> {
    let name = def.name.as_str();
    let Some(pattern) = def.effective_pattern() else {
        return Ok(());
    };
    let re = Regex::new(pattern).map_err(|e| {
        ValidationIssue::new(
            name,
            format!("placeholder '{}' has an invalid pattern: {}", name, e),
        )
    })?;
    if re.is_match(text) {
        Ok(())
    } else {
        Err(ValidationIssue::new(
            name,
            format!(
                "placeholder '{}' value '{}' does not match pattern '{}'",
                name, text, pattern
            ),
        ))
    }
}

fn check_option(def: &PlaceholderDefinition, selected: &str) -> Result<(), ValidationIssue> {
    let options = def.effective_options();
    if options.is_empty() || options.iter().any(|o| o == selected) {
        return Ok(());
    }
    let name = def.name.as_str();
    Err(ValidationIssue::new(
        name,
        format!(
            "placeholder '{}' value '{}' is not one of: {}",
            name,
            selected,
            options.join(", ")
        ),
    ))
}

fn check_color(name: &str, color: &str) -> Result<(), ValidationIssue> {
    if is_hex_color(color) || is_color_token(color) {
        Ok(())
    } else {
        Err(ValidationIssue::new(
            name,
            format!("placeholder '{}' value '{}' is not a color", name, color),
        ))
    }
}

fn check_date_format(def: &PlaceholderDefinition) -> Result<(), ValidationIssue> {
    let Some(format) = def.effective_format() else {
        return Ok(());
    };
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        let name = def.name.as_str();
        return Err(ValidationIssue::new(
            name,
            format!("placeholder '{}' has an invalid date format '{}'", name, format),
        ));
    }
    Ok(())
}

/// The bindings for one render, keyed by placeholder name
///
/// Binding a name twice replaces the earlier binding in place, so the last
/// value supplied for a name wins.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<PlaceholderBinding>,
    index: HashMap<String, usize>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing any earlier binding with the same name
    pub fn bind(&mut self, binding: PlaceholderBinding) {
        match self.index.get(binding.name()) {
            Some(&i) => self.entries[i] = binding,
            None => {
                self.index.insert(binding.name().to_string(), self.entries.len());
                self.entries.push(binding);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PlaceholderBinding> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceholderBinding> {
        self.entries.iter()
    }

    /// Validate every binding, collecting all issues
    pub fn validate_all(&self) -> Result<(), ValidationError> {
        let issues: Vec<ValidationIssue> = self
            .entries
            .iter()
            .filter_map(|b| b.validate().err())
            .collect();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

impl FromIterator<PlaceholderBinding> for Bindings {
    fn from_iter<I: IntoIterator<Item = PlaceholderBinding>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for binding in iter {
            bindings.bind(binding);
        }
        bindings
    }
}
