//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  FacetConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     FacetConfig (final)
//! ```
//!
//! The CLI implements this for its flags so command-line options win over
//! files and environment.

use super::FacetConfig;

/// Applies overrides to an already loaded configuration.
///
/// Only explicitly set values should be applied, preserving existing values
/// for unspecified options.
pub trait ConfigResolver {
    fn apply(&self, config: &mut FacetConfig);
}

/// Resolver that changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut FacetConfig) {}
}
