//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Reporter timing, geofence and store addressing
    pub tracking: TrackingSettings,
    /// Local document store used by the CLI
    pub store: StoreSettings,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Configured sites. Empty means the builtin table.
    pub sites: Vec<SiteSettings>,
}

/// `[tracking]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    /// Seconds between polled position requests
    pub poll_interval_secs: u64,
    /// Timeout in seconds for the initial and polled requests
    pub initial_timeout_secs: u64,
    /// Timeout in seconds handed to the position watch
    pub watch_timeout_secs: u64,
    /// Geofence radius around each site, in meters
    pub geofence_radius_m: f64,
    /// Store collection for location records
    pub collection: String,
    /// Prefix of location record keys
    pub key_prefix: String,
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Root of the JSON directory store
    pub directory: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name inside `directory`
    pub file: String,
}

/// One `[site.<id>]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}
