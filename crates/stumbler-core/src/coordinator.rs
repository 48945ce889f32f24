//! Scan coordination.
//!
//! [`ScanCoordinator`] owns one [`LocationScanner`] and one [`WifiScanner`],
//! starts and stops them together for an [`OperatingMode`], and relays
//! passive-mode GPS fixes from the location scanner into the Wi-Fi scanner's
//! burst limiter. It holds no filtering logic of its own.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use stumbler_types::{OperatingMode, ScannerStatus};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::events::{EventDispatcher, EventReceiver};
use crate::location::LocationScanner;
use crate::traits::{LocationHardware, Preferences, WifiHardware};
use crate::wifi::WifiScanner;

/// Point-in-time view of the coordinator and both scanners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    /// Whether scanning is started.
    pub started: bool,
    /// Mode of the current (or last) session.
    pub mode: OperatingMode,
    /// Wi-Fi scanner status.
    pub wifi: ScannerStatus,
    /// Fixes received (see [`LocationScanner::location_count`]).
    pub location_count: u64,
    /// Latitude of the last reported fix.
    pub latitude: Option<f64>,
    /// Longitude of the last reported fix.
    pub longitude: Option<f64>,
    /// Distinct access points seen.
    pub ap_count: usize,
    /// Access points kept from the most recent scan.
    pub visible_ap_count: usize,
    /// Whether geofencing is enforced.
    pub geofenced: bool,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    started: bool,
    mode: OperatingMode,
}

/// Entry point for starting and stopping scanning.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stumbler_core::{
///     MockLocationHardware, MockPreferences, MockWifiHardware, OperatingMode, ScanConfig,
///     ScanCoordinator,
/// };
///
/// #[tokio::main]
/// async fn main() -> stumbler_core::Result<()> {
///     let coordinator = ScanCoordinator::new(
///         ScanConfig::default(),
///         Arc::new(MockLocationHardware::new()),
///         Arc::new(MockWifiHardware::new()),
///         Arc::new(MockPreferences::new()),
///     )?;
///
///     coordinator.start(OperatingMode::Passive)?;
///     assert!(coordinator.is_started());
///     coordinator.stop();
///     Ok(())
/// }
/// ```
pub struct ScanCoordinator {
    config: ScanConfig,
    events: EventDispatcher,
    location: Arc<LocationScanner>,
    wifi: Arc<WifiScanner>,
    state: Mutex<CoordinatorState>,
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("state", &*self.state.lock())
            .field("location", &self.location)
            .field("wifi", &self.wifi)
            .finish()
    }
}

impl ScanCoordinator {
    /// Build both scanners from `config` and the host capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if `config` fails
    /// [`ScanConfig::validate`].
    pub fn new(
        config: ScanConfig,
        location_hardware: Arc<dyn LocationHardware>,
        wifi_hardware: Arc<dyn WifiHardware>,
        preferences: Arc<dyn Preferences>,
    ) -> Result<Self> {
        config.validate()?;
        let events = EventDispatcher::new(config.event_capacity);

        let wifi = Arc::new(WifiScanner::new(
            &config,
            wifi_hardware,
            Arc::clone(&preferences),
            events.clone(),
        ));

        let passive_wifi = Arc::clone(&wifi);
        let location = Arc::new(
            LocationScanner::new(&config, location_hardware, preferences, events.clone())
                .with_passive_fix_hook(Arc::new(move || passive_wifi.on_passive_fix())),
        );

        Ok(Self {
            config,
            events,
            location,
            wifi,
            state: Mutex::new(CoordinatorState::default()),
        })
    }

    /// Start both scanners in `mode`.
    ///
    /// Preferences are re-read first. A second call while started is a
    /// no-op, even with a different mode; stop first to switch modes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoRuntime`] when called outside a tokio
    /// runtime. Nothing is started in that case.
    pub fn start(&self, mode: OperatingMode) -> Result<()> {
        let mut state = self.state.lock();
        if state.started {
            return Ok(());
        }

        self.location.check_preferences();
        self.wifi.start(mode)?;
        self.location.start(mode);

        state.started = true;
        state.mode = mode;
        info!("Scanning started in {} mode", mode);
        Ok(())
    }

    /// Stop both scanners. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        self.location.stop();
        self.wifi.stop();
        if state.started {
            state.started = false;
            info!("Scanning stopped");
        }
    }

    /// Reload geofence settings from preferences.
    pub fn check_preferences(&self) {
        self.location.check_preferences();
    }

    /// Subscribe to scan events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// The event dispatcher shared by both scanners.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// The configuration the scanners were built from.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The location scanner, for delivering location callbacks.
    pub fn location(&self) -> &Arc<LocationScanner> {
        &self.location
    }

    /// The Wi-Fi scanner, for delivering Wi-Fi callbacks.
    pub fn wifi(&self) -> &Arc<WifiScanner> {
        &self.wifi
    }

    /// Whether scanning is started.
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Mode of the current (or last) session.
    pub fn mode(&self) -> OperatingMode {
        self.state.lock().mode
    }

    /// Fixes received, including geofenced ones.
    pub fn location_count(&self) -> u64 {
        self.location.location_count()
    }

    /// Latitude of the last reported fix.
    pub fn latitude(&self) -> Option<f64> {
        self.location.coordinates().map(|(lat, _)| lat)
    }

    /// Longitude of the last reported fix.
    pub fn longitude(&self) -> Option<f64> {
        self.location.coordinates().map(|(_, lon)| lon)
    }

    /// Distinct access points seen since construction.
    pub fn ap_count(&self) -> usize {
        self.wifi.ap_count()
    }

    /// Access points kept from the most recent scan.
    pub fn visible_ap_count(&self) -> usize {
        self.wifi.visible_ap_count()
    }

    /// Whether geofence regions are enforced.
    pub fn is_geofenced(&self) -> bool {
        self.location.is_geofenced()
    }

    /// Wi-Fi scanner status.
    pub fn wifi_status(&self) -> ScannerStatus {
        self.wifi.status()
    }

    /// Snapshot of everything above.
    pub fn status(&self) -> CoordinatorStatus {
        let (started, mode) = {
            let state = self.state.lock();
            (state.started, state.mode)
        };
        let coordinates = self.location.coordinates();
        CoordinatorStatus {
            started,
            mode,
            wifi: self.wifi.status(),
            location_count: self.location.location_count(),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            ap_count: self.wifi.ap_count(),
            visible_ap_count: self.wifi.visible_ap_count(),
            geofenced: self.location.is_geofenced(),
        }
    }
}

impl Drop for ScanCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocklist::BlockedRegion;
    use crate::error::Error;
    use crate::mock::{MockLocationHardware, MockPreferences, MockWifiHardware};
    use crate::traits::LocationListener;
    use stumbler_types::{Position, provider};

    struct Fixture {
        coordinator: ScanCoordinator,
        location_hw: Arc<MockLocationHardware>,
        wifi_hw: Arc<MockWifiHardware>,
        prefs: Arc<MockPreferences>,
    }

    fn fixture() -> Fixture {
        let location_hw = Arc::new(MockLocationHardware::new());
        let wifi_hw = Arc::new(MockWifiHardware::new());
        let prefs = Arc::new(MockPreferences::new());
        let coordinator = ScanCoordinator::new(
            ScanConfig::default(),
            location_hw.clone(),
            wifi_hw.clone(),
            prefs.clone(),
        )
        .unwrap();
        Fixture {
            coordinator,
            location_hw,
            wifi_hw,
            prefs,
        }
    }

    #[test]
    fn test_start_without_runtime_starts_nothing() {
        let f = fixture();
        assert!(matches!(
            f.coordinator.start(OperatingMode::Active),
            Err(Error::NoRuntime)
        ));
        assert!(!f.coordinator.is_started());
        assert!(f.location_hw.requests().is_empty());
        assert_eq!(f.wifi_hw.registrations(), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ScanConfig::default();
        config.event_capacity = 0;
        config.wifi_scan_interval_ms = 0;

        let result = ScanCoordinator::new(
            config,
            Arc::new(MockLocationHardware::new()),
            Arc::new(MockWifiHardware::new()),
            Arc::new(MockPreferences::new()),
        );

        match result {
            Err(Error::InvalidConfig(message)) => {
                assert!(message.contains("event_capacity"));
                assert!(message.contains("wifi_scan_interval_ms"));
            }
            other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_both_scanners() {
        let f = fixture();
        f.coordinator.start(OperatingMode::Active).unwrap();

        assert!(f.coordinator.is_started());
        assert_eq!(f.coordinator.mode(), OperatingMode::Active);
        assert_eq!(f.coordinator.wifi_status(), ScannerStatus::Active);
        assert_eq!(f.location_hw.requests().len(), 1);

        f.coordinator.stop();
        assert!(!f.coordinator.is_started());
        assert_eq!(f.coordinator.wifi_status(), ScannerStatus::Idle);
        assert_eq!(f.location_hw.remove_updates_calls(), 1);
        assert_eq!(f.wifi_hw.lock_acquisitions(), f.wifi_hw.lock_releases());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reads_preferences() {
        let f = fixture();
        f.prefs.set_geofence_enabled(true);
        f.prefs
            .set_regions(vec![BlockedRegion::circle(52.52, 13.40, 500.0)]);

        assert!(!f.coordinator.is_geofenced());
        f.coordinator.start(OperatingMode::Active).unwrap();
        assert!(f.coordinator.is_geofenced());
        f.coordinator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_snapshot() {
        let f = fixture();
        f.coordinator.start(OperatingMode::Active).unwrap();
        f.coordinator.location().on_location_changed(Some(
            Position::builder(provider::GPS, 52.52, 13.40)
                .accuracy(8.0)
                .timestamp(time::OffsetDateTime::now_utc())
                .build(),
        ));

        let status = f.coordinator.status();
        assert!(status.started);
        assert_eq!(status.location_count, 1);
        assert_eq!(status.latitude, Some(52.52));
        assert_eq!(f.coordinator.longitude(), Some(13.40));
        assert_eq!(status.wifi, ScannerStatus::Active);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["mode"], "active");
        assert_eq!(json["wifi"], "active");
        f.coordinator.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_scanning() {
        let f = fixture();
        f.coordinator.start(OperatingMode::Active).unwrap();
        let wifi_hw = f.wifi_hw.clone();
        drop(f);
        assert_eq!(wifi_hw.unregistrations(), 1);
        assert!(!wifi_hw.lock_held());
    }
}
