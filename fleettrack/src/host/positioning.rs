//! Device positioning: one-shot requests and a cancellable position watch.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// A single position fix reported by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionObservation {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Reported horizontal accuracy in meters, if the device provides one.
    pub accuracy_m: Option<f64>,
    /// When the fix was taken.
    pub captured_at: DateTime<Utc>,
}

impl PositionObservation {
    /// Create an observation captured now.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            accuracy_m: None,
            captured_at: Utc::now(),
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }

    /// Position as a (latitude, longitude) tuple.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Request policy passed to the host positioning API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for the most accurate fix the device can produce.
    pub high_accuracy: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Oldest cached fix the host may return. Zero means always fresh.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// High accuracy, no cached fixes, bounded by `timeout`.
    pub fn fresh(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Errors reported by the host positioning API.
///
/// The `Display` text is the message shown to the driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The user declined location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// The device could not determine its position.
    #[error("Location unavailable")]
    Unavailable,

    /// No fix arrived within the requested timeout.
    #[error("Timed out waiting for location")]
    Timeout,

    /// The host has no positioning capability at all.
    #[error("Geolocation is not available on this device")]
    Unsupported,
}

impl PositionError {
    /// Whether retrying on the same host can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

/// Host positioning capability.
pub trait PositionSource: Send + Sync + 'static {
    /// Probe whether positioning exists on this host at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Request a single position fix.
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<PositionObservation, PositionError>> + Send;

    /// Subscribe to position changes.
    ///
    /// The subscription lives as long as the returned [`PositionWatch`].
    fn watch_position(&self, options: PositionOptions) -> Result<PositionWatch, PositionError>;
}

/// Request a fix, enforcing `options.timeout` regardless of whether the
/// host honours it.
pub async fn request_position<P: PositionSource + ?Sized>(
    source: &P,
    options: PositionOptions,
) -> Result<PositionObservation, PositionError> {
    match tokio::time::timeout(options.timeout, source.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(PositionError::Timeout),
    }
}

/// Sending half handed to the host side of a watch.
pub type WatchSender = mpsc::Sender<Result<PositionObservation, PositionError>>;

/// A live position-change subscription.
///
/// Dropping the watch (or calling [`clear`](Self::clear)) cancels it: the
/// host side sees its [`WatchSender`] closed and must stop producing.
#[derive(Debug)]
pub struct PositionWatch {
    rx: mpsc::Receiver<Result<PositionObservation, PositionError>>,
}

impl PositionWatch {
    /// Create a watch and the sender the host uses to feed it.
    pub fn channel(capacity: usize) -> (WatchSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Wait for the next update. `None` once the host ends the watch.
    pub async fn next(&mut self) -> Option<Result<PositionObservation, PositionError>> {
        self.rx.recv().await
    }

    /// Cancel the subscription.
    pub fn clear(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverAnswers;

    impl PositionSource for NeverAnswers {
        async fn current_position(
            &self,
            _options: PositionOptions,
        ) -> Result<PositionObservation, PositionError> {
            std::future::pending().await
        }

        fn watch_position(&self, _options: PositionOptions) -> Result<PositionWatch, PositionError> {
            Err(PositionError::Unsupported)
        }
    }

    #[test]
    fn test_fresh_options() {
        let options = PositionOptions::fresh(Duration::from_secs(10));
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PositionError::PermissionDenied.to_string(),
            "Location permission denied"
        );
        assert_eq!(
            PositionError::Unsupported.to_string(),
            "Geolocation is not available on this device"
        );
        assert!(PositionError::Timeout.is_transient());
        assert!(!PositionError::PermissionDenied.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_position_enforces_timeout() {
        let result =
            request_position(&NeverAnswers, PositionOptions::fresh(Duration::from_secs(10))).await;
        assert_eq!(result, Err(PositionError::Timeout));
    }

    #[tokio::test]
    async fn test_dropping_watch_closes_sender() {
        let (tx, watch) = PositionWatch::channel(4);
        assert!(!tx.is_closed());
        watch.clear();
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_watch_delivers_in_order() {
        let (tx, mut watch) = PositionWatch::channel(4);
        tx.send(Ok(PositionObservation::new(1.0, 2.0))).await.unwrap();
        tx.send(Err(PositionError::Unavailable)).await.unwrap();
        drop(tx);

        let first = watch.next().await.unwrap().unwrap();
        assert_eq!(first.position(), (1.0, 2.0));
        assert_eq!(watch.next().await, Some(Err(PositionError::Unavailable)));
        assert_eq!(watch.next().await, None);
    }
}
