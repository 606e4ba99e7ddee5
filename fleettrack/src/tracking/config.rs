//! Runtime knobs for the position reporter.

use std::time::Duration;

use crate::host::PositionOptions;

use super::record::document_key;

/// Default period of the fixed-interval poll.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Default timeout for the initial and polled position requests.
pub const DEFAULT_INITIAL_TIMEOUT_SECS: u64 = 10;

/// Default timeout passed to the position watch.
pub const DEFAULT_WATCH_TIMEOUT_SECS: u64 = 15;

/// Default geofence radius around each site.
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 100.0;

/// Default store collection for location records.
pub const DEFAULT_COLLECTION: &str = "locations";

/// Default prefix of location record keys.
pub const DEFAULT_KEY_PREFIX: &str = "INT";

/// Configuration for [`GeofencedReporter`](super::GeofencedReporter).
#[derive(Debug, Clone, PartialEq)]
pub struct ReporterConfig {
    /// How often the poll requests a fresh fix.
    pub poll_interval: Duration,

    /// Timeout for the initial request and each polled request.
    pub request_timeout: Duration,

    /// Timeout handed to the position watch.
    pub watch_timeout: Duration,

    /// Distance from a site at or under which the unit counts as arrived.
    pub geofence_radius_m: f64,

    /// Store collection holding location records.
    pub collection: String,

    /// Prefix of location record keys.
    pub key_prefix: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_INITIAL_TIMEOUT_SECS),
            watch_timeout: Duration::from_secs(DEFAULT_WATCH_TIMEOUT_SECS),
            geofence_radius_m: DEFAULT_GEOFENCE_RADIUS_M,
            collection: DEFAULT_COLLECTION.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl ReporterConfig {
    /// Options for the initial request and for each poll.
    pub fn request_options(&self) -> PositionOptions {
        PositionOptions::fresh(self.request_timeout)
    }

    pub fn watch_options(&self) -> PositionOptions {
        PositionOptions::fresh(self.watch_timeout)
    }

    /// Store key for a unit.
    pub fn document_key(&self, unit_id: &str) -> String {
        document_key(&self.key_prefix, unit_id)
    }
}
