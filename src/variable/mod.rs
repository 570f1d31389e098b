//! Variable model for template placeholders
//!
//! A [`PlaceholderDefinition`] declares the shape of one substitutable slot in a
//! template. A [`Value`] is the concrete data bound to that slot for one render.
//! Definitions carry no validation logic of their own; checking a value against a
//! definition is the job of [`crate::binding::PlaceholderBinding`].

mod definition;
mod value;

pub use definition::{PlaceholderDefinition, PlaceholderType};
pub use value::{Decimal, ParseDecimalError, Value, ValueParseError};
