//! Observable state of a reporter, for rendering in the driver UI.

use chrono::{DateTime, Utc};

/// Snapshot of what a reporter is doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingStatus {
    /// A session is live and reporting.
    pub is_tracking: bool,
    /// Result of the last permission check; `None` before the first `start`.
    pub has_permission: Option<bool>,
    /// Last user-facing error. A mid-session error leaves `is_tracking` set.
    pub error: Option<String>,
    /// Time of the last successful position write.
    pub last_update: Option<DateTime<Utc>>,
    /// Name of the site the last session arrived at.
    pub arrived_at_site: Option<String>,
}

impl TrackingStatus {
    pub fn has_arrived(&self) -> bool {
        self.arrived_at_site.is_some()
    }

    /// Tracking, but the last write failed.
    pub fn is_degraded(&self) -> bool {
        self.is_tracking && self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let status = TrackingStatus::default();
        assert!(!status.is_tracking);
        assert!(status.has_permission.is_none());
        assert!(!status.has_arrived());
        assert!(!status.is_degraded());
    }

    #[test]
    fn test_degraded() {
        let status = TrackingStatus {
            is_tracking: true,
            error: Some("Store write failed".to_string()),
            ..Default::default()
        };
        assert!(status.is_degraded());
    }
}
