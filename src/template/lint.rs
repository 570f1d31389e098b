//! Lint checks for template declarations
//!
//! Reports mismatches between the tokens a template's markup uses and the
//! placeholders it declares. Lint never blocks substitution; it only explains
//! why a render may leave tokens behind or fail validation.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::binding::PlaceholderBinding;
use crate::substitution::{is_valid_name, scan_placeholders};

use super::entity::Template;

/// A lint warning about a template declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateWarning {
    pub category: TemplateLintCategory,
    pub message: String,
}

impl fmt::Display for TemplateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Category of declaration defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateLintCategory {
    /// Token in the markup with no definition
    Undeclared,
    /// Definition whose token never appears
    Unused,
    /// Two definitions share a name
    Duplicate,
    /// Definition name that can never match a token
    InvalidName,
    /// Default value fails its own definition
    InvalidDefault,
    /// Placeholder the template kind expects is not declared
    MissingDefault,
}

impl fmt::Display for TemplateLintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateLintCategory::Undeclared => write!(f, "undeclared"),
            TemplateLintCategory::Unused => write!(f, "unused"),
            TemplateLintCategory::Duplicate => write!(f, "duplicate"),
            TemplateLintCategory::InvalidName => write!(f, "name"),
            TemplateLintCategory::InvalidDefault => write!(f, "default"),
            TemplateLintCategory::MissingDefault => write!(f, "missing-default"),
        }
    }
}

/// Run all lint checks on a template.
pub fn check(template: &Template) -> Vec<TemplateWarning> {
    let mut warnings = Vec::new();
    let used = scan_placeholders(template.markup());
    check_undeclared(template, &used, &mut warnings);
    check_declarations(template, &used, &mut warnings);
    check_defaults(template, &mut warnings);
    check_kind_defaults(template, &mut warnings);
    warnings
}

fn check_undeclared(template: &Template, used: &[String], warnings: &mut Vec<TemplateWarning>) {
    for name in used {
        if template.placeholder(name).is_none() {
            warnings.push(TemplateWarning {
                category: TemplateLintCategory::Undeclared,
                message: format!("token '{{{{{}}}}}' has no placeholder definition", name),
            });
        }
    }
}

fn check_declarations(template: &Template, used: &[String], warnings: &mut Vec<TemplateWarning>) {
    let mut seen = HashSet::new();
    for def in template.placeholders() {
        if !seen.insert(def.name.as_str()) {
            warnings.push(TemplateWarning {
                category: TemplateLintCategory::Duplicate,
                message: format!("placeholder '{}' is declared more than once", def.name),
            });
            continue;
        }
        if !is_valid_name(&def.name) {
            warnings.push(TemplateWarning {
                category: TemplateLintCategory::InvalidName,
                message: format!(
                    "placeholder '{}' can never appear as a token in markup",
                    def.name
                ),
            });
        } else if !used.contains(&def.name) {
            warnings.push(TemplateWarning {
                category: TemplateLintCategory::Unused,
                message: format!("placeholder '{}' is not used in the markup", def.name),
            });
        }
    }
}

fn check_defaults(template: &Template, warnings: &mut Vec<TemplateWarning>) {
    for def in template.placeholders() {
        if def.default_value.is_none() {
            continue;
        }
        let binding = PlaceholderBinding::new(Arc::new(def.clone()), None);
        if let Err(issue) = binding.validate() {
            warnings.push(TemplateWarning {
                category: TemplateLintCategory::InvalidDefault,
                message: format!("default value is invalid: {}", issue),
            });
        }
    }
}

fn check_kind_defaults(template: &Template, warnings: &mut Vec<TemplateWarning>) {
    for def in template.missing_defaults() {
        warnings.push(TemplateWarning {
            category: TemplateLintCategory::MissingDefault,
            message: format!(
                "{} templates usually declare '{}' ({})",
                template.kind, def.name, def.ty
            ),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateKind;
    use crate::variable::{PlaceholderDefinition, PlaceholderType, Value};

    fn categories(warnings: &[TemplateWarning]) -> Vec<TemplateLintCategory> {
        warnings.iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_clean_template_has_no_warnings() {
        let t = Template::new(TemplateKind::Other, "t", "<svg>{{a}}</svg>")
            .with_inferred_placeholders();
        assert!(check(&t).is_empty());
    }

    #[test]
    fn test_undeclared_and_unused() {
        let t = Template::new(TemplateKind::Other, "t", "<svg>{{a}}</svg>")
            .with_placeholders([PlaceholderDefinition::text("b")])
            .unwrap();
        let warnings = check(&t);
        assert_eq!(
            categories(&warnings),
            vec![TemplateLintCategory::Undeclared, TemplateLintCategory::Unused]
        );
        assert_eq!(
            warnings[0].to_string(),
            "undeclared: token '{{a}}' has no placeholder definition"
        );
    }

    #[test]
    fn test_invalid_name_from_imported_data() {
        let json = serde_json::json!({
            "id": "5f0c2e71-9b8a-4d36-8e2f-1c4b7a9d0e13",
            "kind": "other",
            "name": "bad",
            "markup": "<svg/>",
            "placeholders": [{"name": "1st", "type": "text"}],
            "created_at": "2024-05-01T00:00:00Z",
            "updated_at": "2024-05-01T00:00:00Z"
        });
        let t: Template = serde_json::from_value(json).unwrap();
        assert_eq!(categories(&check(&t)), vec![TemplateLintCategory::InvalidName]);
    }

    #[test]
    fn test_duplicate_from_imported_data() {
        let json = serde_json::json!({
            "id": "7d3c6c8e-1f43-4c7b-9a38-0a0f8c1a2b3c",
            "kind": "other",
            "name": "dup",
            "markup": "<svg>{{a}}</svg>",
            "placeholders": [
                {"name": "a", "type": "text"},
                {"name": "a", "type": "number"}
            ],
            "created_at": "2024-05-01T00:00:00Z",
            "updated_at": "2024-05-01T00:00:00Z"
        });
        let t: Template = serde_json::from_value(json).unwrap();
        assert_eq!(categories(&check(&t)), vec![TemplateLintCategory::Duplicate]);
    }

    #[test]
    fn test_invalid_default() {
        let t = Template::new(TemplateKind::Other, "t", "<svg>{{battery}}</svg>").with_placeholders([
            PlaceholderDefinition::new("battery", PlaceholderType::Number)
                .with_bounds(Some(0.0), Some(100.0))
                .with_default(Value::Integer(150)),
        ])
        .unwrap();
        let warnings = check(&t);
        assert_eq!(categories(&warnings), vec![TemplateLintCategory::InvalidDefault]);
        assert!(warnings[0].message.contains("at most 100"));
    }

    #[test]
    fn test_missing_kind_defaults() {
        let t = Template::new(TemplateKind::Chat, "t", "<svg/>");
        let warnings = check(&t);
        assert!(!warnings.is_empty());
        assert!(warnings
            .iter()
            .all(|w| w.category == TemplateLintCategory::MissingDefault));
        assert!(warnings[0].message.starts_with("chat templates usually declare"));
    }
}
