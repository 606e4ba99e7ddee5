//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use fleettrack::config::ConfigFileError;
use fleettrack::host::{PositionError, ReplayError, StoreError};
use fleettrack::tracking::TrackingError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Trip file could not be loaded
    Replay(ReplayError),
    /// Tracking could not be started
    Tracking(TrackingError),
    /// Document store error
    Store(StoreError),
    /// No record stored for the unit
    NotFound { unit: String, key: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Tracking(TrackingError::Position(PositionError::PermissionDenied)) => {
                eprintln!();
                eprintln!("Location access was refused by the host.");
            }
            CliError::Replay(ReplayError::Parse { .. }) => {
                eprintln!();
                eprintln!("Trip files hold one fix per line: lat,lng[,accuracy_m]");
                eprintln!("Blank lines and lines starting with '#' are ignored.");
            }
            CliError::NotFound { .. } => {
                eprintln!();
                eprintln!("Records are written by 'fleettrack track'.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Replay(e) => write!(f, "Failed to load trip: {}", e),
            CliError::Tracking(e) => write!(f, "Failed to start tracking: {}", e),
            CliError::Store(e) => write!(f, "Store error: {}", e),
            CliError::NotFound { unit, key } => {
                write!(f, "No record for unit '{}' (key {})", unit, key)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Replay(e) => Some(e),
            CliError::Tracking(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        CliError::Replay(e)
    }
}

impl From<TrackingError> for CliError {
    fn from(e: TrackingError) -> Self {
        CliError::Tracking(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_error_message() {
        let err = CliError::from(TrackingError::from(PositionError::Timeout));
        assert_eq!(
            err.to_string(),
            "Failed to start tracking: Timed out waiting for location"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = CliError::NotFound {
            unit: "42".to_string(),
            key: "INT-42".to_string(),
        };
        assert_eq!(err.to_string(), "No record for unit '42' (key INT-42)");
    }
}
