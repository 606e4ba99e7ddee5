//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and runtime creation
//! for commands that drive a tracking session.

use std::path::Path;

use fleettrack::config::ConfigFile;
use fleettrack::host::JsonDirStore;
use fleettrack::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::commands::common::{load_config, new_runtime};
use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (from `config_path` if given) and initialize logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(version = fleettrack::VERSION, command, "fleettrack CLI starting");
    }

    /// Document store rooted at the configured store directory.
    pub fn store(&self) -> JsonDirStore {
        JsonDirStore::new(self.config.store.directory.clone())
    }

    /// Multi-threaded runtime for async commands.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        new_runtime()
    }
}
