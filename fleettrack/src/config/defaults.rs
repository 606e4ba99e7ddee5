//! Default values for all configuration settings and the
//! `ConfigFile::default()` implementation.

use super::settings::*;
use crate::tracking::{
    DEFAULT_COLLECTION, DEFAULT_GEOFENCE_RADIUS_M, DEFAULT_INITIAL_TIMEOUT_SECS,
    DEFAULT_KEY_PREFIX, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_WATCH_TIMEOUT_SECS,
};

/// Name of the config directory under the user's home.
pub const CONFIG_DIR_NAME: &str = ".fleettrack";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default store directory name inside the config directory.
pub const DEFAULT_STORE_DIR_NAME: &str = "store";

/// Section name prefix for site definitions: `[site.<id>]`.
pub const SITE_SECTION_PREFIX: &str = "site.";

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            initial_timeout_secs: DEFAULT_INITIAL_TIMEOUT_SECS,
            watch_timeout_secs: DEFAULT_WATCH_TIMEOUT_SECS,
            geofence_radius_m: DEFAULT_GEOFENCE_RADIUS_M,
            collection: DEFAULT_COLLECTION.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            tracking: TrackingSettings::default(),
            store: StoreSettings {
                directory: config_dir.join(DEFAULT_STORE_DIR_NAME),
            },
            logging: LoggingSettings {
                directory: crate::logging::default_log_dir(),
                file: crate::logging::default_log_file().to_string(),
            },
            sites: Vec::new(),
        }
    }
}
