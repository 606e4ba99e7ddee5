//! Geofenced position reporter.
//!
//! A [`GeofencedReporter`] owns at most one tracking session. While a session
//! is live it reports the device position for one unit to the document store,
//! and it ends the session by itself the first time the device comes within
//! the geofence radius of a known site.
//!
//! # Lifecycle
//!
//! ```text
//! idle --start--> tracking --stop------> idle  (merge isActive=false)
//!                    |
//!                    +--arrival-------> arrived (no further writes)
//!                                          |
//!                                          +--start--> tracking
//!                                          +--stop---> idle (no write)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut reporter = GeofencedReporter::new(source, store, SiteTable::builtin());
//! reporter.start(TrackedUnit::new("42", "AB123CD", "Juan")).await?;
//! // ...
//! reporter.stop().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::geo::SiteTable;
use crate::host::{
    request_position, DocumentStore, MemoryRouteFlags, NoWakeLock, PositionError,
    PositionObservation, PositionSource, RouteFlags, StoreError, WakeLock, WriteMode,
};

use super::config::ReporterConfig;
use super::error::TrackingError;
use super::record::inactive_patch;
use super::session::{
    run_emitter, run_poll, run_watch, write_failed_message, Emission, SessionContext,
    OBSERVATION_CHANNEL_CAPACITY,
};
use super::status::TrackingStatus;
use super::unit::TrackedUnit;

/// Longest `stop` waits for the store to accept the inactive mark.
const STOP_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A started session: its shared context and the tasks driving it.
struct ActiveSession<S> {
    context: Arc<SessionContext<S>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<S> ActiveSession<S> {
    /// Cancel every task, release the wake lock, then wait for the tasks.
    ///
    /// Cancellation interrupts an in-flight store write, so the joins do not
    /// depend on the store answering.
    async fn shutdown(self) -> Arc<SessionContext<S>> {
        self.context.cancel.cancel();
        self.context.release_wake_lock();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Tracking task did not finish cleanly");
            }
        }
        self.context
    }
}

/// Reports a unit's position until it reaches a site or is stopped.
pub struct GeofencedReporter<P, S, W = NoWakeLock> {
    source: Arc<P>,
    store: Arc<S>,
    wake_lock: W,
    route_flags: Arc<dyn RouteFlags>,
    sites: Arc<SiteTable>,
    config: ReporterConfig,
    status: Arc<watch::Sender<TrackingStatus>>,
    session: Option<ActiveSession<S>>,
}

impl<P, S> GeofencedReporter<P, S, NoWakeLock>
where
    P: PositionSource,
    S: DocumentStore,
{
    /// Create an idle reporter with default configuration and no wake lock.
    pub fn new(source: Arc<P>, store: Arc<S>, sites: SiteTable) -> Self {
        let (status, _) = watch::channel(TrackingStatus::default());
        Self {
            source,
            store,
            wake_lock: NoWakeLock,
            route_flags: Arc::new(MemoryRouteFlags::new()),
            sites: Arc::new(sites),
            config: ReporterConfig::default(),
            status: Arc::new(status),
            session: None,
        }
    }
}

impl<P, S, W> GeofencedReporter<P, S, W>
where
    P: PositionSource,
    S: DocumentStore,
    W: WakeLock,
{
    /// Use `wake_lock` to keep the device awake while tracking.
    pub fn with_wake_lock<W2: WakeLock>(mut self, wake_lock: W2) -> GeofencedReporter<P, S, W2> {
        GeofencedReporter {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            wake_lock,
            route_flags: Arc::clone(&self.route_flags),
            sites: Arc::clone(&self.sites),
            config: std::mem::take(&mut self.config),
            status: Arc::clone(&self.status),
            session: self.session.take(),
        }
    }

    /// Use a shared route flag cache.
    pub fn with_route_flags(mut self, route_flags: Arc<dyn RouteFlags>) -> Self {
        self.route_flags = route_flags;
        self
    }

    pub fn with_config(mut self, config: ReporterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    /// Current status snapshot.
    pub fn status(&self) -> TrackingStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change.
    pub fn subscribe(&self) -> watch::Receiver<TrackingStatus> {
        self.status.subscribe()
    }

    /// Whether a session is live and has not arrived.
    pub fn is_tracking(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.context.has_arrived())
    }

    /// Start tracking `unit`.
    ///
    /// Succeeds once the first position has been obtained and emitted. If
    /// that first position is already inside a geofence the session ends
    /// immediately and no producers are armed.
    pub async fn start(&mut self, unit: TrackedUnit) -> Result<(), TrackingError> {
        self.reap_arrived().await;

        if let Some(session) = &self.session {
            return Err(TrackingError::AlreadyTracking {
                unit_id: session.context.unit.unit_id.clone(),
            });
        }

        let invalid = match unit.missing_field() {
            Some(field) => Some(TrackingError::IncompleteUnit(field)),
            None if !unit.has_addressable_id() => {
                Some(TrackingError::InvalidUnitId(unit.unit_id.clone()))
            }
            None => None,
        };
        if let Some(err) = invalid {
            self.status.send_modify(|status| {
                status.is_tracking = false;
                status.error = Some(err.to_string());
            });
            return Err(err);
        }

        let first = match self.first_position().await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(unit = %unit.unit_id, error = %e, "Could not start tracking");
                self.status.send_modify(|status| {
                    status.is_tracking = false;
                    status.has_permission = Some(false);
                    status.error = Some(e.to_string());
                });
                return Err(e.into());
            }
        };

        let key = self.config.document_key(&unit.unit_id);
        let context = Arc::new(SessionContext::new(
            unit,
            self.config.collection.clone(),
            key,
            self.config.geofence_radius_m,
            Arc::clone(&self.sites),
            Arc::clone(&self.store),
            Arc::clone(&self.route_flags),
            Arc::clone(&self.status),
        ));

        self.status.send_modify(|status| {
            *status = TrackingStatus {
                is_tracking: true,
                has_permission: Some(true),
                ..TrackingStatus::default()
            };
        });

        if self.wake_lock.is_supported() {
            match self.wake_lock.request().await {
                Ok(guard) => context.hold_wake_lock(guard),
                Err(e) => debug!(error = %e, "Wake lock not acquired"),
            }
        }

        if let Some(route) = context.unit.tracked_route() {
            self.route_flags.mark_gps_active(route);
        }

        info!(
            unit = %context.unit.unit_id,
            key = %context.key,
            sector = %context.unit.effective_sector(),
            "Tracking started"
        );

        if let Emission::Arrived(_) = context.emit(first).await {
            self.session = Some(ActiveSession {
                context,
                tasks: Vec::new(),
            });
            return Ok(());
        }

        let tasks = self.arm(&context);
        self.session = Some(ActiveSession { context, tasks });
        Ok(())
    }

    /// Stop tracking.
    ///
    /// No-op when idle. After a geofence arrival this only clears local state;
    /// otherwise it marks the unit's record inactive, giving the store at
    /// most ten seconds. The wake lock is released before any waiting, and
    /// no write is issued by the session once this returns.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let context = session.shutdown().await;

        if context.has_arrived() {
            debug!(unit = %context.unit.unit_id, "Session already ended at a site");
            self.status.send_modify(|status| status.is_tracking = false);
            return;
        }

        let write = self.store.upsert(
            &context.collection,
            &context.key,
            inactive_patch(),
            WriteMode::Merge,
        );
        let result = match tokio::time::timeout(STOP_WRITE_TIMEOUT, write).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(STOP_WRITE_TIMEOUT)),
        };

        match result {
            Ok(()) => {
                info!(unit = %context.unit.unit_id, "Tracking stopped");
                self.status.send_modify(|status| status.is_tracking = false);
            }
            Err(e) => {
                warn!(
                    unit = %context.unit.unit_id,
                    error = %e,
                    "Tracking stopped, but marking the unit inactive failed"
                );
                self.status.send_modify(|status| {
                    status.is_tracking = false;
                    status.error = Some(write_failed_message(&e));
                });
            }
        }
    }

    async fn first_position(&self) -> Result<PositionObservation, PositionError> {
        if !self.source.is_available() {
            return Err(PositionError::Unsupported);
        }
        request_position(self.source.as_ref(), self.config.request_options()).await
    }

    /// Spawn the emitter, the poll, and the watch if the host can open one.
    fn arm(&self, context: &Arc<SessionContext<S>>) -> Vec<JoinHandle<()>> {
        let (tx, rx) = mpsc::channel(OBSERVATION_CHANNEL_CAPACITY);
        let mut tasks = Vec::with_capacity(3);

        tasks.push(tokio::spawn(run_emitter(Arc::clone(context), rx)));
        tasks.push(tokio::spawn(run_poll(
            Arc::clone(&self.source),
            self.config.request_options(),
            self.config.poll_interval,
            tx.clone(),
            context.cancel.clone(),
        )));

        match self.source.watch_position(self.config.watch_options()) {
            Ok(watch) => {
                tasks.push(tokio::spawn(run_watch(watch, tx, context.cancel.clone())));
            }
            Err(e) => warn!(
                unit = %context.unit.unit_id,
                error = %e,
                "Position watch unavailable, relying on the poll alone"
            ),
        }

        tasks
    }

    /// Drop a session that ended at a site so a new one can start.
    async fn reap_arrived(&mut self) {
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.context.has_arrived())
        {
            if let Some(session) = self.session.take() {
                session.shutdown().await;
            }
        }
    }
}

impl<P, S, W> Drop for GeofencedReporter<P, S, W> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.context.cancel.cancel();
            session.context.release_wake_lock();
        }
    }
}
