//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. Environment Variables (FACET_*)      │  Runtime override
//! ├──────────────────────────────────────────┤
//! │  2. Project Config (.facet/config.toml)  │  Project-specific
//! ├──────────────────────────────────────────┤
//! │  3. Global Config (~/.facet/config.toml) │  User defaults
//! ├──────────────────────────────────────────┤
//! │  4. Default Values (compile-time)        │  Fallback
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `FACET_DEBUG` | `debug` | bool |
//! | `FACET_MAX_CONCURRENT` | `workers.max_concurrent` | usize |
//! | `FACET_WORKER_THREADS` | `workers.threads` | usize |
//! | `FACET_MAX_PASSES` | `propagation.max_passes` | usize |
//! | `FACET_UNDO_LIMIT` | `undo.max_entries` | usize |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.facet/config.toml
//! debug = false
//!
//! [workers]
//! max_concurrent = 4
//! threads = 2
//!
//! [propagation]
//! max_passes = 64
//!
//! [undo]
//! max_entries = 100
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{FacetConfig, PropagationConfig, UndoConfig, WorkersConfig};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".facet")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".facet";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
