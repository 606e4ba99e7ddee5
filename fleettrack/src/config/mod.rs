//! User configuration stored in `~/.fleettrack/config.ini`.
//!
//! # Example
//!
//! ```no_run
//! use fleettrack::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let sites = config.site_table();
//! let reporter_config = config.reporter_config();
//! # Ok::<(), fleettrack::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_STORE_DIR_NAME};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LoggingSettings, SiteSettings, StoreSettings, TrackingSettings};
