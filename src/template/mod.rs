//! Templates and the template manager
//!
//! A [`Template`] is SVG markup plus the placeholders it declares. Templates
//! are grouped by [`TemplateKind`]; each kind lists the placeholders its
//! templates are expected to carry, and [`defaults`] ships a built-in template
//! for every kind that has one.
//!
//! # Example
//!
//! ```
//! use feedshot::template::{TemplateKind, TemplateManager};
//! use feedshot::substitution::SubstitutionConfig;
//! use feedshot::variable::Value;
//!
//! let mut manager = TemplateManager::new();
//! let id = manager
//!     .create(TemplateKind::Other, "greeting", "<text>Hello {{name}}</text>")
//!     .unwrap();
//! let markup = manager
//!     .apply_variables(id, [("name", Value::from("Alice"))], &SubstitutionConfig::default())
//!     .unwrap();
//! assert_eq!(markup, "<text>Hello Alice</text>");
//! ```

pub mod defaults;
mod entity;
pub mod lint;
mod manager;
mod presentation;

pub use defaults::{default_markup, default_template, default_templates};
pub use entity::{Template, TemplateKind};
pub use lint::{TemplateLintCategory, TemplateWarning};
pub use manager::{TemplateError, TemplateManager};
pub use presentation::{DeviceFrame, PresentationSettings, StatusBar};
