//! Error types for binding and substitution

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::binding::ValidationIssue;

/// Byte range in markup
pub type Span = std::ops::Range<usize>;

/// A required input to a binding operation is absent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("a placeholder binding needs a definition")]
    MissingDefinition,

    #[error("template '{template}' declares no placeholder named '{name}'")]
    UnknownPlaceholder { name: String, template: String },

    #[error("'{name}' is not a valid placeholder name")]
    InvalidPlaceholderName { name: String },

    #[error("template '{template}' declares placeholder '{name}' more than once")]
    DuplicatePlaceholder { name: String, template: String },
}

/// One or more bindings failed their checks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: {}", join_issues(.issues))]
pub struct ValidationError {
    /// Every issue found, in the order the placeholders appear
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// The messages alone, ready to show in a list
    pub fn messages(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.message.as_str()).collect()
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A placeholder token with no binding, with its first location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPlaceholder {
    pub name: String,
    pub span: Span,
}

/// Markup references placeholders that nothing binds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unresolved placeholders: {}", join_names(.placeholders))]
pub struct UnresolvedPlaceholderError {
    pub placeholders: Vec<UnresolvedPlaceholder>,
}

fn join_names(placeholders: &[UnresolvedPlaceholder]) -> String {
    placeholders
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced by the substitution engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedPlaceholderError),
}

impl SubstitutionError {
    /// Format the error against the markup it came from using ariadne
    pub fn format(&self, markup: &str, filename: &str) -> String {
        let labels: Vec<(Span, String)> = match self {
            SubstitutionError::Validation(err) => err
                .issues
                .iter()
                .filter_map(|i| i.span.clone().map(|s| (s, i.message.clone())))
                .collect(),
            SubstitutionError::Unresolved(err) => err
                .placeholders
                .iter()
                .map(|p| {
                    (
                        p.span.clone(),
                        format!("no value is bound to '{}'", p.name),
                    )
                })
                .collect(),
        };

        let offset = labels.first().map(|(s, _)| s.start).unwrap_or(0);
        let mut report =
            Report::build(ReportKind::Error, filename, offset)
                .with_config(Config::default().with_color(false))
                .with_message(self.to_string());
        for (span, message) in labels {
            report = report.with_label(
                Label::new((filename, span))
                    .with_message(message)
                    .with_color(Color::Red),
            );
        }

        let mut buf = Vec::new();
        if report
            .finish()
            .write((filename, Source::from(markup)), &mut buf)
            .is_err()
        {
            return self.to_string();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}
