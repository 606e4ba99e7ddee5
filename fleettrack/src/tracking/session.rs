//! One live tracking session: shared context plus the three tasks that
//! drive it.
//!
//! The poll and the watch only produce observations. They forward them over
//! an mpsc channel to a single emitter task, so the geofence check and the
//! store write run to completion for one observation before the next is
//! looked at.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::geo::{Site, SiteTable};
use crate::host::{
    request_position, DocumentStore, PositionObservation, PositionOptions, PositionSource,
    PositionWatch, RouteFlags, StoreError, WakeLockGuard, WriteMode,
};

use super::record::LocationRecord;
use super::status::TrackingStatus;
use super::unit::TrackedUnit;

/// Capacity of the observation channel between producers and the emitter.
pub(crate) const OBSERVATION_CHANNEL_CAPACITY: usize = 16;

/// Shortest poll period accepted by [`run_poll`].
const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// What the emitter did with one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Emission {
    /// The session had already arrived.
    Discarded,
    /// Reported as in transit.
    Reported,
    /// Reported as in transit, but the write failed.
    WriteFailed,
    /// Arrived at the named site; the session is over.
    Arrived(String),
}

/// State shared by every task of one session.
pub(crate) struct SessionContext<S> {
    pub(crate) unit: TrackedUnit,
    pub(crate) collection: String,
    pub(crate) key: String,
    geofence_radius_m: f64,
    sites: Arc<SiteTable>,
    store: Arc<S>,
    route_flags: Arc<dyn RouteFlags>,
    status: Arc<watch::Sender<TrackingStatus>>,
    /// One-shot arrival guard. Set before the arrival write is issued.
    arrived: AtomicBool,
    wake_lock: Mutex<Option<WakeLockGuard>>,
    pub(crate) cancel: CancellationToken,
}

impl<S> SessionContext<S> {
    pub(crate) fn has_arrived(&self) -> bool {
        self.arrived.load(Ordering::Acquire)
    }

    pub(crate) fn hold_wake_lock(&self, guard: WakeLockGuard) {
        *self.wake_lock.lock() = Some(guard);
    }

    /// Release the wake lock if it is still held. Safe to call repeatedly.
    pub(crate) fn release_wake_lock(&self) {
        if let Some(guard) = self.wake_lock.lock().take() {
            guard.release();
            debug!(unit = %self.unit.unit_id, "Wake lock released");
        }
    }
}

impl<S: DocumentStore> SessionContext<S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        unit: TrackedUnit,
        collection: String,
        key: String,
        geofence_radius_m: f64,
        sites: Arc<SiteTable>,
        store: Arc<S>,
        route_flags: Arc<dyn RouteFlags>,
        status: Arc<watch::Sender<TrackingStatus>>,
    ) -> Self {
        Self {
            unit,
            collection,
            key,
            geofence_radius_m,
            sites,
            store,
            route_flags,
            status,
            arrived: AtomicBool::new(false),
            wake_lock: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    /// Run the geofence check for one observation and write the result.
    pub(crate) async fn emit(&self, observation: PositionObservation) -> Emission {
        if self.has_arrived() {
            trace!(unit = %self.unit.unit_id, "Discarding observation after arrival");
            return Emission::Discarded;
        }

        let (lat, lng) = observation.position();
        match self.sites.nearest(lat, lng) {
            Some(nearest) if nearest.is_within(self.geofence_radius_m) => {
                debug!(
                    unit = %self.unit.unit_id,
                    site = %nearest.site.id,
                    distance_m = nearest.distance_m,
                    "Inside geofence"
                );
                self.arrive(nearest.site).await
            }
            nearest => {
                if let Some(nearest) = nearest {
                    debug!(
                        unit = %self.unit.unit_id,
                        lat,
                        lng,
                        site = %nearest.site.id,
                        distance_m = nearest.distance_m,
                        "Outside geofence"
                    );
                }
                self.report(&observation).await
            }
        }
    }

    async fn report(&self, observation: &PositionObservation) -> Emission {
        let record = LocationRecord::in_transit(&self.unit, observation);

        match self.write(&record).await {
            Ok(()) => {
                self.status.send_modify(|status| {
                    status.last_update = Some(record.client_captured_at);
                    status.error = None;
                });
                Emission::Reported
            }
            Err(e) => {
                warn!(unit = %self.unit.unit_id, error = %e, "Failed to write position");
                self.status.send_modify(|status| {
                    status.error = Some(write_failed_message(&e));
                });
                Emission::WriteFailed
            }
        }
    }

    async fn arrive(&self, site: &Site) -> Emission {
        if self
            .arrived
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Emission::Discarded;
        }

        let record = LocationRecord::at_site(&self.unit, site);
        let result = self.write(&record).await;

        match &result {
            Ok(()) => info!(
                unit = %self.unit.unit_id,
                site = %site.id,
                site_name = %site.name,
                "Arrived at site, tracking ended"
            ),
            Err(e) => warn!(
                unit = %self.unit.unit_id,
                site = %site.id,
                error = %e,
                "Failed to write arrival, tracking ended anyway"
            ),
        }

        if result.is_ok() {
            if let Some(route) = self.unit.tracked_route() {
                self.route_flags.clear_gps_active(route);
            }
        }

        self.cancel.cancel();
        self.release_wake_lock();

        self.status.send_modify(|status| {
            status.is_tracking = false;
            status.arrived_at_site = Some(site.name.clone());
            match &result {
                Ok(()) => {
                    status.last_update = Some(record.client_captured_at);
                    status.error = None;
                }
                Err(e) => status.error = Some(write_failed_message(e)),
            }
        });

        Emission::Arrived(site.name.clone())
    }

    async fn write(&self, record: &LocationRecord) -> Result<(), StoreError> {
        let document = record.to_document()?;
        self.store
            .upsert(&self.collection, &self.key, document, WriteMode::Overwrite)
            .await
    }
}

/// User-facing message for a failed store write.
pub(crate) fn write_failed_message(error: &StoreError) -> String {
    format!("Store write failed: {error}")
}

/// Drain observations until cancelled, the producers are gone, or the
/// session arrives.
pub(crate) async fn run_emitter<S: DocumentStore>(
    context: Arc<SessionContext<S>>,
    mut observations: mpsc::Receiver<PositionObservation>,
) {
    loop {
        tokio::select! {
            biased;

            _ = context.cancel.cancelled() => break,

            next = observations.recv() => match next {
                Some(observation) => {
                    // A stalled write must not hold up cancellation.
                    let emission = tokio::select! {
                        biased;
                        _ = context.cancel.cancelled() => break,
                        emission = context.emit(observation) => emission,
                    };
                    if let Emission::Arrived(_) = emission {
                        break;
                    }
                }
                None => {
                    debug!(unit = %context.unit.unit_id, "All position producers gone");
                    break;
                }
            },
        }
    }

    trace!(unit = %context.unit.unit_id, "Emitter stopped");
}

/// Request a fresh fix every `period` and forward it.
///
/// The first tick is skipped: the session's first observation comes from
/// `start` itself.
pub(crate) async fn run_poll<P: PositionSource>(
    source: Arc<P>,
    options: PositionOptions,
    period: Duration,
    observations: mpsc::Sender<PositionObservation>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period.max(MIN_POLL_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = interval.tick() => {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    result = request_position(source.as_ref(), options) => result,
                };

                match result {
                    Ok(observation) => {
                        if observations.send(observation).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Position poll failed"),
                }
            }
        }
    }

    trace!("Position poll stopped");
}

/// Forward the host's position watch until cancelled or the watch ends.
/// Clears the watch on exit.
pub(crate) async fn run_watch(
    mut watch: PositionWatch,
    observations: mpsc::Sender<PositionObservation>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            next = watch.next() => match next {
                Some(Ok(observation)) => {
                    if observations.send(observation).await.is_err() {
                        break;
                    }
                }
                Some(Err(e)) => warn!(error = %e, "Position watch error"),
                None => {
                    debug!("Position watch ended");
                    break;
                }
            },
        }
    }

    watch.clear();
    trace!("Position watch cleared");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryRouteFlags, MemoryStore};
    use crate::tracking::unit::Sector;
    use serde_json::json;

    const SITE: (f64, f64) = (-34.3601, -59.0099);

    fn context(unit: TrackedUnit) -> (Arc<SessionContext<MemoryStore>>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let (status, _) = watch::channel(TrackingStatus::default());
        let sites = SiteTable::new(vec![Site::new("depot", SITE.0, SITE.1, "Depot")]);
        let context = SessionContext::new(
            unit,
            "locations".to_string(),
            "INT-42".to_string(),
            100.0,
            Arc::new(sites),
            Arc::clone(&store),
            Arc::new(MemoryRouteFlags::new()),
            Arc::new(status),
        );
        (Arc::new(context), store)
    }

    fn unit() -> TrackedUnit {
        TrackedUnit::new("42", "AB123CD", "Juan")
    }

    #[tokio::test]
    async fn test_report_outside_geofence() {
        let (ctx, store) = context(unit());

        let emission = ctx.emit(PositionObservation::new(-34.0, -58.0)).await;

        assert_eq!(emission, Emission::Reported);
        let doc = store.document("locations", "INT-42").unwrap();
        assert_eq!(doc.get("isActive"), Some(&json!(true)));
        assert!(!ctx.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_arrival_is_one_shot() {
        let (ctx, store) = context(unit());

        let emission = ctx.emit(PositionObservation::new(-34.3602, -59.0100)).await;
        assert_eq!(emission, Emission::Arrived("Depot".to_string()));
        assert!(ctx.cancel.is_cancelled());

        let emission = ctx.emit(PositionObservation::new(-34.0, -58.0)).await;
        assert_eq!(emission, Emission::Discarded);
        assert_eq!(store.write_count(), 1);

        let doc = store.document("locations", "INT-42").unwrap();
        assert_eq!(doc.get("lat"), Some(&json!(SITE.0)));
        assert_eq!(doc.get("isAtSite"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_session() {
        let (ctx, store) = context(unit().with_sector(Sector::Bulk));
        store.set_offline(true);

        let emission = ctx.emit(PositionObservation::new(-34.0, -58.0)).await;

        assert_eq!(emission, Emission::WriteFailed);
        assert!(!ctx.cancel.is_cancelled());
        let status = ctx.status.borrow().clone();
        assert!(status
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Store write failed: ")));
    }

    #[tokio::test]
    async fn test_arrival_write_failure_still_ends_session() {
        let (ctx, store) = context(unit());
        store.set_offline(true);

        let emission = ctx.emit(PositionObservation::new(SITE.0, SITE.1)).await;

        assert_eq!(emission, Emission::Arrived("Depot".to_string()));
        assert!(ctx.has_arrived());
        assert!(ctx.cancel.is_cancelled());
        assert!(ctx.status.borrow().error.is_some());
    }

    #[tokio::test]
    async fn test_emitter_stops_when_producers_gone() {
        let (ctx, store) = context(unit());
        let (tx, rx) = mpsc::channel(4);

        tx.send(PositionObservation::new(-34.0, -58.0)).await.unwrap();
        drop(tx);
        run_emitter(Arc::clone(&ctx), rx).await;

        assert_eq!(store.write_count(), 1);
    }
}
