//! Engine configuration.
//!
//! Loaded from TOML; every key is optional:
//!
//! ```toml
//! max_stack_depth = 1000
//! legacy_implicit_globals = false
//! host_stack_bytes = 268435456
//! max_tasks = 100000
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_STACK_DEPTH: usize = 1000;
pub const DEFAULT_HOST_STACK_BYTES: usize = 256 * 1024 * 1024;
pub const DEFAULT_MAX_TASKS: usize = 100_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Call-stack bound, the global activation included.
    pub max_stack_depth: usize,
    /// Assigning an undeclared name creates a global `var` instead of failing.
    pub legacy_implicit_globals: bool,
    /// Host thread stack used by [`crate::runner::api::with_evaluation_stack`].
    pub host_stack_bytes: usize,
    /// Callbacks one drain of the task queue may run before it is abandoned.
    pub max_tasks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            legacy_implicit_globals: false,
            host_stack_bytes: DEFAULT_HOST_STACK_BYTES,
            max_tasks: DEFAULT_MAX_TASKS,
        }
    }
}

impl EngineConfig {
    /// The global activation always counts, so the bound is at least 1.
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth.max(1);
        self
    }

    pub fn with_legacy_implicit_globals(mut self, enabled: bool) -> Self {
        self.legacy_implicit_globals = enabled;
        self
    }

    pub fn with_host_stack_bytes(mut self, bytes: usize) -> Self {
        self.host_stack_bytes = bytes;
        self
    }

    pub fn with_max_tasks(mut self, tasks: usize) -> Self {
        self.max_tasks = tasks;
        self
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_stack_depth must be at least 1 (the global activation)".to_string(),
            ));
        }
        if self.max_tasks == 0 {
            return Err(ConfigError::Invalid("max_tasks must be at least 1".to_string()));
        }
        Ok(())
    }
}
