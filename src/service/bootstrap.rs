//! Initial map center from the device location service.
//!
//! [`GeoBootstrapper`] asks a [`LocationProvider`] once, with the configured
//! timeout and cache age. A position becomes the center and arms the
//! user-location marker; any failure silently substitutes the configured
//! fallback. There is no retry, and resolving the center does not query
//! events: the first viewport report does.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::OnceCell;

use crate::config::{ClientConfig, GeolocationConfig};
use crate::domain::{CenterSource, EventBus, GeoPoint, MapEvent};
use crate::error::LocationError;

/// Parameters of a single location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    /// Request a high-accuracy fix.
    pub high_accuracy: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Accept a cached position up to this old.
    pub max_age: Duration,
}

impl From<GeolocationConfig> for LocationOptions {
    fn from(config: GeolocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.timeout,
            max_age: config.max_age,
        }
    }
}

/// Device location service.
pub trait LocationProvider: Send + Sync + 'static {
    /// Returns the current device position.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] when permission is denied, no fix is
    /// available in time, or the service does not exist.
    fn current_position(
        &self,
        options: &LocationOptions,
    ) -> impl Future<Output = Result<GeoPoint, LocationError>> + Send;
}

/// A provider that always reports the same position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub GeoPoint);

impl LocationProvider for FixedLocation {
    async fn current_position(
        &self,
        _options: &LocationOptions,
    ) -> Result<GeoPoint, LocationError> {
        Ok(self.0)
    }
}

/// A provider for platforms without a location service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocationService;

impl LocationProvider for NoLocationService {
    async fn current_position(
        &self,
        _options: &LocationOptions,
    ) -> Result<GeoPoint, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Outcome of center resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialCenter {
    /// Center of the first viewport.
    pub center: GeoPoint,
    /// Whether the center came from the device.
    pub source: CenterSource,
}

impl InitialCenter {
    /// Returns the user-location marker position, present only for a device fix.
    #[must_use]
    pub const fn user_location(&self) -> Option<GeoPoint> {
        match self.source {
            CenterSource::Device => Some(self.center),
            CenterSource::Fallback => None,
        }
    }
}

/// Single-shot resolver of the initial map center.
#[derive(Debug)]
pub struct GeoBootstrapper<L> {
    provider: Arc<L>,
    config: Arc<ClientConfig>,
    bus: EventBus,
    resolved: OnceCell<InitialCenter>,
}

impl<L: LocationProvider> GeoBootstrapper<L> {
    /// Creates a bootstrapper; nothing is requested until
    /// [`Self::resolve_initial_center`].
    #[must_use]
    pub fn new(provider: Arc<L>, config: Arc<ClientConfig>, bus: EventBus) -> Self {
        Self {
            provider,
            config,
            bus,
            resolved: OnceCell::new(),
        }
    }

    /// Resolves the initial center, asking the device at most once.
    ///
    /// Later calls return the first outcome without a new request.
    pub async fn resolve_initial_center(&self) -> GeoPoint {
        self.resolved
            .get_or_init(|| self.request())
            .await
            .center
    }

    /// Returns the outcome, once resolved.
    #[must_use]
    pub fn initial(&self) -> Option<InitialCenter> {
        self.resolved.get().copied()
    }

    /// Returns the user-location marker position, if the device supplied one.
    #[must_use]
    pub fn user_location(&self) -> Option<GeoPoint> {
        self.initial().and_then(|i| i.user_location())
    }

    async fn request(&self) -> InitialCenter {
        let options = LocationOptions::from(self.config.geolocation);
        let attempt = tokio::time::timeout(
            options.timeout,
            self.provider.current_position(&options),
        )
        .await
        .unwrap_or(Err(LocationError::Timeout));

        let initial = match attempt {
            Ok(center) => {
                tracing::info!(%center, "initial center from device location");
                InitialCenter {
                    center,
                    source: CenterSource::Device,
                }
            }
            Err(err) => {
                let center = self.config.fallback_center;
                tracing::info!(
                    reason = %err,
                    %center,
                    "device location unavailable, using fallback"
                );
                InitialCenter {
                    center,
                    source: CenterSource::Fallback,
                }
            }
        };

        let _ = self.bus.publish(MapEvent::InitialCenterResolved {
            center: initial.center,
            source: initial.source,
            timestamp: Utc::now(),
        });
        initial
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl LocationProvider for CountingProvider {
        async fn current_position(
            &self,
            options: &LocationOptions,
        ) -> Result<GeoPoint, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(!options.high_accuracy);
            assert_eq!(options.timeout, Duration::from_millis(3_000));
            assert_eq!(options.max_age, Duration::from_millis(300_000));
            Ok(GeoPoint::new(35.0, 139.0))
        }
    }

    #[derive(Debug)]
    struct Denied;

    impl LocationProvider for Denied {
        async fn current_position(
            &self,
            _options: &LocationOptions,
        ) -> Result<GeoPoint, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    #[derive(Debug)]
    struct NeverAnswers;

    impl LocationProvider for NeverAnswers {
        async fn current_position(
            &self,
            _options: &LocationOptions,
        ) -> Result<GeoPoint, LocationError> {
            std::future::pending().await
        }
    }

    fn bootstrapper<L: LocationProvider>(provider: L) -> GeoBootstrapper<L> {
        GeoBootstrapper::new(
            Arc::new(provider),
            Arc::new(ClientConfig::default()),
            EventBus::new(8),
        )
    }

    #[tokio::test]
    async fn device_position_becomes_center_and_user_marker() {
        let boot = bootstrapper(CountingProvider::default());

        let center = boot.resolve_initial_center().await;

        assert_eq!(center, GeoPoint::new(35.0, 139.0));
        assert_eq!(boot.user_location(), Some(GeoPoint::new(35.0, 139.0)));
    }

    #[tokio::test]
    async fn denial_falls_back_to_tokyo_station() {
        let boot = bootstrapper(Denied);

        let center = boot.resolve_initial_center().await;

        assert_eq!(center, GeoPoint::new(35.6812, 139.7671));
        assert_eq!(boot.user_location(), None);
        assert_eq!(boot.initial().map(|i| i.source), Some(CenterSource::Fallback));
    }

    #[tokio::test]
    async fn missing_service_falls_back() {
        let boot = bootstrapper(NoLocationService);
        assert_eq!(
            boot.resolve_initial_center().await,
            GeoPoint::new(35.6812, 139.7671)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn silent_provider_times_out_after_three_seconds() {
        let boot = bootstrapper(NeverAnswers);
        let start = tokio::time::Instant::now();

        let center = boot.resolve_initial_center().await;

        assert_eq!(center, GeoPoint::new(35.6812, 139.7671));
        assert!(start.elapsed() >= Duration::from_millis(3_000));
    }

    #[tokio::test]
    async fn device_is_asked_only_once() {
        let provider = Arc::new(CountingProvider::default());
        let boot = GeoBootstrapper::new(
            Arc::clone(&provider),
            Arc::new(ClientConfig::default()),
            EventBus::new(8),
        );

        let _ = boot.resolve_initial_center().await;
        let _ = boot.resolve_initial_center().await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolution_is_announced_on_the_bus() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let boot = GeoBootstrapper::new(
            Arc::new(FixedLocation(GeoPoint::new(1.0, 2.0))),
            Arc::new(ClientConfig::default()),
            bus,
        );

        let _ = boot.resolve_initial_center().await;

        let Ok(MapEvent::InitialCenterResolved { center, source, .. }) = rx.recv().await else {
            panic!("expected InitialCenterResolved");
        };
        assert_eq!(center, GeoPoint::new(1.0, 2.0));
        assert_eq!(source, CenterSource::Device);
    }
}
