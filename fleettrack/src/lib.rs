//! fleettrack - geofenced position reporting for delivery vehicles
//!
//! While a driver has a trip open, the library keeps reporting the vehicle's
//! position to a document store, and ends the session on its own once the
//! vehicle pulls into a known depot.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use fleettrack::geo::SiteTable;
//! use fleettrack::host::{JsonDirStore, ReplaySource, DEFAULT_REPLAY_STEP};
//! use fleettrack::tracking::{GeofencedReporter, TrackedUnit};
//!
//! let source = Arc::new(ReplaySource::from_file(Path::new("trip.csv"), DEFAULT_REPLAY_STEP)?);
//! let store = Arc::new(JsonDirStore::new("store"));
//! let mut reporter = GeofencedReporter::new(source, store, SiteTable::builtin());
//!
//! reporter.start(TrackedUnit::new("42", "AB123CD", "Juan")).await?;
//! ```

pub mod config;
pub mod geo;
pub mod host;
pub mod logging;
pub mod tracking;

/// Version of the fleettrack library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
