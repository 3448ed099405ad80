//! Runtime settings derived from the loaded configuration
//!
//! Built once at startup and handed to the services that need it.

use std::time::Duration;

use crate::analysis::ValidationOptions;
use crate::models::config::SimpleVbConfig;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub debounce: Duration,
    pub poll_interval: Duration,
    pub max_file_size_bytes: u64,
    pub extensions: Vec<String>,
    pub validation: ValidationOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(&SimpleVbConfig::default())
    }
}

impl From<&SimpleVbConfig> for RuntimeConfig {
    fn from(config: &SimpleVbConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.diagnostics.debounce_ms),
            // Polling faster than 50ms only burns CPU
            poll_interval: Duration::from_millis(config.diagnostics.poll_interval_ms.max(50)),
            max_file_size_bytes: config.workspace.max_file_size_bytes(),
            extensions: config.workspace.extensions.clone(),
            validation: ValidationOptions::from(&config.validation),
        }
    }
}

impl RuntimeConfig {
    /// Size limit in whole megabytes, for error messages
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / (1024 * 1024)
    }
}
