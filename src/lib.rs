//! feedshot - mock social-feed screenshots from parameterized SVG templates
//!
//! This library provides typed placeholders, a substitution engine that merges
//! validated values into SVG markup, a template manager, and rendering backends
//! that rasterize the result.
//!
//! # Example
//!
//! ```rust
//! use feedshot::fill;
//!
//! let svg = fill("<text>Hello {{nickname}}</text>", [("nickname", "Alice")]).unwrap();
//! assert_eq!(svg, "<text>Hello Alice</text>");
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod palette;
pub mod render;
pub mod substitution;
pub mod template;
pub mod variable;

pub use binding::{Bindings, PlaceholderBinding, ValidationIssue};
pub use config::{ConfigError, FeedshotConfig};
pub use error::{
    ArgumentError, SubstitutionError, UnresolvedPlaceholder, UnresolvedPlaceholderError,
    ValidationError,
};
pub use palette::Palette;
pub use render::{
    FlatRasterizer, ImageFormat, RasterBackend, RenderCompletion, RenderError, RenderParameters,
    RenderingBackend,
};
pub use substitution::{apply_variables, substitute, SubstitutionConfig, UnresolvedPolicy};
pub use template::{Template, TemplateError, TemplateKind, TemplateManager};
pub use variable::{PlaceholderDefinition, PlaceholderType, Value};

/// Substitute text values into markup with the default configuration
///
/// Every token in `markup` is treated as an optional text placeholder. Tokens
/// without a value are left in place.
///
/// # Example
///
/// ```rust
/// use feedshot::fill;
///
/// let svg = fill("<text>{{a}} &amp; {{b}}</text>", [("a", "Tom & Jerry")]).unwrap();
/// assert_eq!(svg, "<text>Tom &amp; Jerry &amp; {{b}}</text>");
/// ```
pub fn fill<I, K, V>(markup: &str, values: I) -> Result<String, SubstitutionError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    fill_with_config(markup, values, &SubstitutionConfig::default())
}

/// Substitute text values into markup with custom configuration
///
/// # Example
///
/// ```rust
/// use feedshot::{fill_with_config, SubstitutionConfig, SubstitutionError};
///
/// let err = fill_with_config(
///     "<text>{{missing}}</text>",
///     Vec::<(String, String)>::new(),
///     &SubstitutionConfig::new().strict(),
/// )
/// .unwrap_err();
/// assert!(matches!(err, SubstitutionError::Unresolved(_)));
/// ```
pub fn fill_with_config<I, K, V>(
    markup: &str,
    values: I,
    config: &SubstitutionConfig,
) -> Result<String, SubstitutionError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let template = Template::new(TemplateKind::Other, "inline", markup).with_inferred_placeholders();
    let values = values
        .into_iter()
        .map(|(name, value)| (name.into(), Value::Text(value.into())));
    apply_variables(&template, values, config)
}
