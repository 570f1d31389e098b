//! Substitution engine
//!
//! Turns a template's markup plus a set of bindings into fully substituted
//! markup ready for a rendering backend.
//!
//! # Token grammar
//!
//! ```text
//! {{ nickname }}     placeholder "nickname"
//! {{post.likes}}     placeholder "post.likes"
//! {{{nickname}}}     literal "{", placeholder "nickname", literal "}"
//! {{ 1st }}          literal text (names start with a letter or underscore)
//! ```
//!
//! A token without a binding is left verbatim by default
//! ([`UnresolvedPolicy::Keep`]); [`UnresolvedPolicy::Fail`] turns it into an
//! error instead.

mod config;
mod engine;
mod lexer;
mod serialize;

pub use config::{SubstitutionConfig, UnresolvedPolicy};
pub use engine::{apply_variables, infer_definitions, scan_placeholders, substitute};
pub use lexer::{is_valid_name, segments, Segment, Segments};
pub use serialize::{escape_xml, serialize_value};
