//! Placeholder substitution

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::binding::{Bindings, PlaceholderBinding, ValidationIssue};
use crate::error::{
    Span, SubstitutionError, UnresolvedPlaceholder, UnresolvedPlaceholderError, ValidationError,
};
use crate::template::Template;
use crate::variable::{PlaceholderDefinition, Value};

use super::config::{SubstitutionConfig, UnresolvedPolicy};
use super::lexer::{segments, Segment};
use super::serialize::serialize_value;

/// Replace every placeholder token in `markup` with its bound value
///
/// Each distinct token is resolved once. Bindings whose token does not occur in
/// the markup are never looked at. The result is all-or-nothing: any invalid
/// binding fails the call with every issue collected, and under
/// [`UnresolvedPolicy::Fail`] so does any token without a binding.
pub fn substitute(
    markup: &str,
    bindings: &Bindings,
    config: &SubstitutionConfig,
) -> Result<String, SubstitutionError> {
    let mut output = String::with_capacity(markup.len());
    let mut resolved: HashMap<&str, Option<String>> = HashMap::new();
    let mut issues = Vec::new();
    let mut unresolved = Vec::new();

    for segment in segments(markup) {
        match segment {
            Segment::Literal { text, .. } => output.push_str(text),
            Segment::Placeholder { name, span } => {
                let text = match resolved.entry(name) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(resolve_token(
                        name,
                        span.clone(),
                        bindings,
                        config,
                        &mut issues,
                        &mut unresolved,
                    )),
                };
                match text {
                    Some(text) => output.push_str(text),
                    None => output.push_str(&markup[span]),
                }
            }
        }
    }

    if !issues.is_empty() {
        return Err(ValidationError { issues }.into());
    }
    if !unresolved.is_empty() {
        match config.unresolved {
            UnresolvedPolicy::Fail => {
                return Err(UnresolvedPlaceholderError {
                    placeholders: unresolved,
                }
                .into());
            }
            UnresolvedPolicy::Keep => debug!(
                count = unresolved.len(),
                "left unresolved placeholders in markup"
            ),
        }
    }

    Ok(output)
}

/// Serialized text for one distinct token, or `None` if it has to stay as is
fn resolve_token(
    name: &str,
    span: Span,
    bindings: &Bindings,
    config: &SubstitutionConfig,
    issues: &mut Vec<ValidationIssue>,
    unresolved: &mut Vec<UnresolvedPlaceholder>,
) -> Option<String> {
    let Some(binding) = bindings.get(name) else {
        unresolved.push(UnresolvedPlaceholder {
            name: name.to_string(),
            span,
        });
        return None;
    };

    if let Err(issue) = binding.validate() {
        issues.push(issue.with_span(span));
        return None;
    }

    let Some(value) = binding.value() else {
        return Some(String::new());
    };

    match serialize_value(value, binding.definition(), &config.palette) {
        Ok(text) => Some(text),
        Err(_) => {
            issues.push(
                ValidationIssue {
                    placeholder: name.to_string(),
                    message: format!("placeholder '{}' could not be formatted", name),
                    span: None,
                }
                .with_span(span),
            );
            None
        }
    }
}

/// Bind `values` to the template's placeholders and substitute its markup
///
/// When a name appears more than once in `values` the last value wins. Values
/// for names the template does not declare are ignored; declared placeholders
/// without a value fall back to their defaults.
pub fn apply_variables<I, S>(
    template: &Template,
    values: I,
    config: &SubstitutionConfig,
) -> Result<String, SubstitutionError>
where
    I: IntoIterator<Item = (S, Value)>,
    S: Into<String>,
{
    let mut supplied: HashMap<String, Value> = HashMap::new();
    for (name, value) in values {
        supplied.insert(name.into(), value);
    }

    // Only the first definition of a name is bound, matching `Template::placeholder`
    let mut declared = HashSet::new();
    let bindings: Bindings = template
        .placeholders()
        .iter()
        .filter(|def| declared.insert(def.name.as_str()))
        .map(|def| {
            let value = supplied.remove(&def.name);
            PlaceholderBinding::new(Arc::new(def.clone()), value)
        })
        .collect();

    for name in supplied.keys() {
        debug!(
            placeholder = %name,
            template = %template.name,
            "ignoring value for undeclared placeholder"
        );
    }

    let output = substitute(template.markup(), &bindings, config)?;
    debug!(template = %template.name, bytes = output.len(), "substituted template");
    Ok(output)
}

/// Distinct placeholder names in order of first occurrence
pub fn scan_placeholders(markup: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    segments(markup)
        .filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } if seen.insert(name) => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

/// Text definitions for every placeholder found in `markup`
pub fn infer_definitions(markup: &str) -> Vec<PlaceholderDefinition> {
    scan_placeholders(markup)
        .into_iter()
        .map(PlaceholderDefinition::text)
        .collect()
}
