//! Markup-safe text forms of placeholder values
//!
//! Every form is locale-independent so the same inputs always produce the same
//! bytes.

use std::fmt::{self, Write};

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::palette::Palette;
use crate::variable::{PlaceholderDefinition, PlaceholderType, Value};

/// Serialize a validated value for insertion into SVG markup
pub fn serialize_value(
    value: &Value,
    def: &PlaceholderDefinition,
    palette: &Palette,
) -> Result<String, fmt::Error> {
    match (def.ty, value) {
        (PlaceholderType::Color, Value::Text(s)) => Ok(palette.resolve_color(s)),
        (PlaceholderType::ImagePath, Value::Text(s)) => Ok(s.clone()),
        (PlaceholderType::RichText, Value::Text(s)) => Ok(escape_rich_text(s)),
        (PlaceholderType::DateTime, Value::DateTime(dt)) => {
            format_datetime(dt, def.effective_format())
        }
        _ => serialize_untyped(value, palette),
    }
}

fn serialize_untyped(value: &Value, palette: &Palette) -> Result<String, fmt::Error> {
    Ok(match value {
        Value::Text(s) => escape_xml(s),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::DateTime(dt) => format_datetime(dt, None)?,
        Value::Color(s) => palette.resolve_color(s),
        Value::ImagePath(s) => s.clone(),
        Value::RichText(s) => escape_rich_text(s),
        Value::Json(json) => escape_xml(&json.to_string()),
        Value::List(items) => items
            .iter()
            .map(|item| serialize_untyped(item, palette))
            .collect::<Result<Vec<_>, _>>()?
            .join(", "),
    })
}

/// RFC 3339 with second precision, or a strftime pattern
fn format_datetime(
    dt: &DateTime<FixedOffset>,
    format: Option<&str>,
) -> Result<String, fmt::Error> {
    match format {
        None => Ok(dt.to_rfc3339_opts(SecondsFormat::Secs, false)),
        Some(pattern) => {
            let mut out = String::new();
            write!(out, "{}", dt.format(pattern))?;
            Ok(escape_xml(&out))
        }
    }
}

/// Escape special XML characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Escape rich text, keeping line breaks as character references
fn escape_rich_text(s: &str) -> String {
    escape_xml(&s.replace("\r\n", "\n")).replace('\n', "&#10;")
}
