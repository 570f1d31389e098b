//! Configuration for substitution

use serde::Deserialize;

use crate::palette::Palette;

/// What to do with a placeholder token that nothing binds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave the token in the output verbatim
    #[default]
    Keep,
    /// Fail the whole substitution
    Fail,
}

/// Configuration options for substitution
#[derive(Debug, Clone, Default)]
pub struct SubstitutionConfig {
    pub unresolved: UnresolvedPolicy,

    /// Palette used to resolve symbolic colors
    pub palette: Palette,
}

impl SubstitutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unresolved-token policy
    pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    /// Shorthand for [`UnresolvedPolicy::Fail`]
    pub fn strict(self) -> Self {
        self.with_unresolved(UnresolvedPolicy::Fail)
    }

    /// Set the palette for color resolution
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SubstitutionConfig::default();
        assert_eq!(config.unresolved, UnresolvedPolicy::Keep);
        assert_eq!(config.palette, Palette::default());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SubstitutionConfig::new().strict();
        assert_eq!(config.unresolved, UnresolvedPolicy::Fail);
    }
}
