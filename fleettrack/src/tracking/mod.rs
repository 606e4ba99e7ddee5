//! Geofenced position tracking.
//!
//! The [`GeofencedReporter`] ties the host capabilities together: it asks the
//! [`PositionSource`](crate::host::PositionSource) for fixes, writes one
//! [`LocationRecord`] per unit to the [`DocumentStore`](crate::host::DocumentStore),
//! and ends the session once the unit is within the geofence radius of a
//! [`Site`](crate::geo::Site).
//!
//! # Architecture
//!
//! ```text
//!   poll (interval) ──┐
//!                     ├── mpsc ──> emitter ──> geofence ──> store
//!   watch (host)    ──┘                           │
//!                                                 └── arrival: cancel session
//! ```

mod config;
mod error;
mod record;
mod reporter;
mod session;
mod status;
mod unit;

pub use config::{
    ReporterConfig, DEFAULT_COLLECTION, DEFAULT_GEOFENCE_RADIUS_M, DEFAULT_INITIAL_TIMEOUT_SECS,
    DEFAULT_KEY_PREFIX, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_WATCH_TIMEOUT_SECS,
};
pub use error::TrackingError;
pub use record::{document_key, inactive_patch, LocationRecord, CAPTURED_AT_FIELD};
pub use reporter::GeofencedReporter;
pub use status::TrackingStatus;
pub use unit::{Sector, TrackedUnit};
