//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use facet_model::DEFAULT_MAX_UNDO;
use serde::{Deserialize, Serialize};

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
///
/// # Example
///
/// ```
/// use facet_runtime::config::FacetConfig;
///
/// let config = FacetConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.propagation.max_passes, 64);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FacetConfig {
    /// Enable debug mode (verbose logging, diagnostics).
    pub debug: bool,

    /// Worker pool configuration.
    pub workers: WorkersConfig,

    /// Event propagation configuration.
    pub propagation: PropagationConfig,

    /// Undo history configuration.
    pub undo: UndoConfig,
}

impl FacetConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }

        self.workers.merge(&other.workers);
        self.propagation.merge(&other.propagation);
        self.undo.merge(&other.undo);
    }

    /// Rejects values the runtime cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for any zero count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("workers.max_concurrent", self.workers.max_concurrent),
            ("workers.threads", self.workers.threads),
            ("propagation.max_passes", self.propagation.max_passes),
            ("undo.max_entries", self.undo.max_entries),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::invalid_value(field, "must be at least 1"));
            }
        }
        Ok(())
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkersConfig {
    /// Maximum number of action bodies running at once.
    pub max_concurrent: usize,

    /// Threads of the async runtime driving the pool.
    pub threads: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            threads: 2,
        }
    }
}

impl WorkersConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.max_concurrent != default.max_concurrent {
            self.max_concurrent = other.max_concurrent;
        }
        if other.threads != default.threads {
            self.threads = other.threads;
        }
    }
}

/// Event propagation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PropagationConfig {
    /// Broadcasts processed in one wave before it is aborted.
    pub max_passes: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self { max_passes: 64 }
    }
}

impl PropagationConfig {
    fn merge(&mut self, other: &Self) {
        if other.max_passes != Self::default().max_passes {
            self.max_passes = other.max_passes;
        }
    }
}

/// Undo history configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UndoConfig {
    /// Entries kept before the oldest is dropped.
    pub max_entries: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_UNDO,
        }
    }
}

impl UndoConfig {
    fn merge(&mut self, other: &Self) {
        if other.max_entries != Self::default().max_entries {
            self.max_entries = other.max_entries;
        }
    }
}
