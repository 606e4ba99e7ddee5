//! Host collaborators used by the position reporter.
//!
//! The reporter never talks to a device or a backend directly. Everything it
//! needs from its host sits behind a trait in this module:
//!
//! - [`PositionSource`] - one-shot fixes and a cancellable position watch
//! - [`WakeLock`] - optional screen wake lock, released through [`WakeLockGuard`]
//! - [`DocumentStore`] - collection/key document writes with server timestamps
//! - [`RouteFlags`] - per-route "GPS active" flags kept on the device
//!
//! In-process implementations ([`MemoryStore`], [`JsonDirStore`],
//! [`ReplaySource`], [`MemoryRouteFlags`], [`NoWakeLock`]) back the CLI and
//! the tests.

mod positioning;
mod replay;
mod route_flags;
pub mod store;
mod wake_lock;

pub use positioning::{
    request_position, PositionError, PositionObservation, PositionOptions, PositionSource,
    PositionWatch, WatchSender,
};
pub use replay::{ReplayError, ReplaySource, DEFAULT_REPLAY_STEP};
pub use route_flags::{MemoryRouteFlags, RouteFlags};
pub use store::{
    Document, DocumentStore, Fields, JsonDirStore, MemoryStore, StoreError, WriteLogEntry,
    WriteMode,
};
pub use wake_lock::{NoWakeLock, WakeLock, WakeLockError, WakeLockGuard, WakeLockSentinel};
