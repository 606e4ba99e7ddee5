//! Error types for tracking sessions.

use thiserror::Error;

use crate::host::PositionError;

/// Why a tracking session could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// This reporter already has a live session.
    #[error("Unit {unit_id} is already being tracked")]
    AlreadyTracking { unit_id: String },

    /// A required identity field was blank.
    #[error("Missing required unit field: {0}")]
    IncompleteUnit(&'static str),

    /// The unit id cannot be used in a record key.
    #[error("Unit id '{0}' cannot be used as a record key")]
    InvalidUnitId(String),

    /// The initial position request failed.
    #[error(transparent)]
    Position(#[from] PositionError),
}

impl TrackingError {
    /// Whether calling `start` again on the same host may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AlreadyTracking { .. } | Self::IncompleteUnit(_) | Self::InvalidUnitId(_) => {
                false
            }
            Self::Position(PositionError::Unsupported) => false,
            Self::Position(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_error_is_transparent() {
        let err = TrackingError::from(PositionError::PermissionDenied);
        assert_eq!(err.to_string(), "Location permission denied");
    }

    #[test]
    fn test_retryable() {
        assert!(TrackingError::from(PositionError::PermissionDenied).is_retryable());
        assert!(TrackingError::from(PositionError::Timeout).is_retryable());
        assert!(!TrackingError::from(PositionError::Unsupported).is_retryable());
        assert!(!TrackingError::IncompleteUnit("plate").is_retryable());
        assert!(!TrackingError::InvalidUnitId("4/2".into()).is_retryable());
    }
}
