//! Location scanning.
//!
//! [`LocationScanner`] subscribes to position updates, drops fixes that are
//! not satellite-derived, applies the [`LocationBlocklist`] and publishes
//! fix-acquired / fix-lost / status events on the event bus.
//!
//! In passive mode every accepted fix also fires the passive-fix hook, which
//! the coordinator uses to grant the Wi-Fi scanner a new burst of scans.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use stumbler_types::{OperatingMode, Position, provider};

use crate::blocklist::LocationBlocklist;
use crate::config::ScanConfig;
use crate::events::{EventDispatcher, ScanEvent};
use crate::traits::{
    LocationHardware, LocationListener, LocationRequest, Preferences, ProviderStatus,
    SatelliteEvent,
};

/// Callback fired for each accepted fix in passive mode.
pub type PassiveFixHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Default)]
struct LocationState {
    started: bool,
    mode: OperatingMode,
    satellite_listener: bool,
}

/// Location scan component.
pub struct LocationScanner {
    hardware: Arc<dyn LocationHardware>,
    preferences: Arc<dyn Preferences>,
    events: EventDispatcher,
    request: LocationRequest,
    min_satellites_in_fix: u32,
    blocklist: RwLock<LocationBlocklist>,
    state: Mutex<LocationState>,
    /// Suppress fix-acquired events ("geofence here").
    suppress_reports: AtomicBool,
    location_count: AtomicU64,
    coordinates: RwLock<Option<(f64, f64)>>,
    passive_fix_hook: Option<PassiveFixHook>,
}

impl std::fmt::Debug for LocationScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationScanner")
            .field("state", &*self.state.lock())
            .field("location_count", &self.location_count())
            .field("coordinates", &self.coordinates())
            .finish()
    }
}

impl LocationScanner {
    /// Create a location scanner.
    pub fn new(
        config: &ScanConfig,
        hardware: Arc<dyn LocationHardware>,
        preferences: Arc<dyn Preferences>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            hardware,
            preferences,
            events,
            request: LocationRequest::gps(
                config.gps_min_update_interval(),
                config.gps_min_update_distance_m,
            ),
            min_satellites_in_fix: config.min_satellites_in_fix,
            blocklist: RwLock::new(LocationBlocklist::new(config.blocklist.location.clone())),
            state: Mutex::new(LocationState::default()),
            suppress_reports: AtomicBool::new(false),
            location_count: AtomicU64::new(0),
            coordinates: RwLock::new(None),
            passive_fix_hook: None,
        }
    }

    /// Set the hook fired for accepted fixes in passive mode.
    #[must_use]
    pub fn with_passive_fix_hook(mut self, hook: PassiveFixHook) -> Self {
        self.passive_fix_hook = Some(hook);
        self
    }

    /// Replace the location blocklist.
    pub fn set_blocklist(&self, blocklist: LocationBlocklist) {
        *self.blocklist.write() = blocklist;
    }

    /// Start receiving updates.
    ///
    /// Passive mode subscribes to the zero-interval passive feed. Active mode
    /// subscribes to GPS with the configured interval and distance, reports
    /// an initial fix-lost, and subscribes to satellite status.
    ///
    /// Calling `start` while started is a no-op. Subscription failures are
    /// logged and reported as fix-lost; the scanner stays started and relies
    /// on the platform to deliver updates once the provider recovers.
    pub fn start(&self, mode: OperatingMode) {
        let mut state = self.state.lock();
        if state.started {
            debug!("Location scanner already started");
            return;
        }
        state.started = true;
        state.mode = mode;

        info!("Starting location scanner in {} mode", mode);

        match mode {
            OperatingMode::Passive => {
                if let Err(e) = self.hardware.request_updates(&LocationRequest::passive()) {
                    warn!("Passive location subscription failed: {}", e);
                    self.report_location_lost();
                }
            }
            OperatingMode::Active => {
                if let Err(e) = self.hardware.request_updates(&self.request) {
                    warn!("GPS location subscription failed: {}", e);
                }
                self.report_location_lost();

                match self.hardware.add_satellite_listener() {
                    Ok(()) => state.satellite_listener = true,
                    Err(e) => warn!("Satellite status subscription failed: {}", e),
                }
            }
        }
    }

    /// Stop receiving updates.
    ///
    /// Unsubscribes everything and publishes a final fix-lost so consumers
    /// never keep a stale fix. Calling `stop` while stopped is a no-op.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if !state.started {
            return;
        }

        self.hardware.remove_updates();
        self.report_location_lost();

        if state.satellite_listener {
            self.hardware.remove_satellite_listener();
            state.satellite_listener = false;
        }

        state.started = false;
        info!("Location scanner stopped");
    }

    /// Reload geofence configuration from preferences.
    pub fn check_preferences(&self) {
        self.blocklist.write().refresh(self.preferences.as_ref());
        self.suppress_reports
            .store(self.preferences.geofence_here(), Ordering::Relaxed);
    }

    /// Whether geofencing is enabled.
    pub fn is_geofenced(&self) -> bool {
        self.blocklist.read().is_geofenced()
    }

    /// Number of fixes received, including geofenced ones.
    pub fn location_count(&self) -> u64 {
        self.location_count.load(Ordering::Relaxed)
    }

    /// Latitude and longitude of the last accepted fix.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        *self.coordinates.read()
    }

    /// Whether the scanner is started.
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    fn running_mode(&self) -> Option<OperatingMode> {
        let state = self.state.lock();
        state.started.then_some(state.mode)
    }

    fn report_location_lost(&self) {
        self.events.send(ScanEvent::fix_lost());
    }
}

impl LocationListener for LocationScanner {
    fn on_location_changed(&self, position: Option<Position>) {
        let Some(mode) = self.running_mode() else {
            debug!("Ignoring location update while stopped");
            return;
        };

        let Some(position) = position else {
            self.report_location_lost();
            return;
        };

        let tag = if mode.is_passive() { "[Passive]" } else { "[Active]" };

        if !position.is_gps() {
            debug!(
                "{} Discarding non-GPS fix from provider '{}'",
                tag, position.provider
            );
            return;
        }

        debug!(
            "{} Coord: {:.4},{:.4}, Acc: {:?}, Speed: {:?}, Alt: {:?}, Bearing: {:?}",
            tag,
            position.latitude,
            position.longitude,
            position.accuracy,
            position.speed,
            position.altitude,
            position.bearing
        );

        let blocked = self
            .blocklist
            .read()
            .check(&position, time::OffsetDateTime::now_utc());
        if let Some(reason) = blocked {
            warn!(
                "Blocked location ({:?}): {:.4},{:.4}",
                reason, position.latitude, position.longitude
            );
            if reason.is_geofence() {
                self.location_count.fetch_add(1, Ordering::Relaxed);
            }
            self.report_location_lost();
            return;
        }

        *self.coordinates.write() = Some((position.latitude, position.longitude));
        self.location_count.fetch_add(1, Ordering::Relaxed);

        if !self.suppress_reports.load(Ordering::Relaxed) {
            self.events.send(ScanEvent::fix_acquired(position));
        }

        if mode.is_passive()
            && let Some(hook) = &self.passive_fix_hook
        {
            hook();
        }
    }

    fn on_satellite_event(&self, event: SatelliteEvent) {
        if self.running_mode() != Some(OperatingMode::Active) {
            return;
        }

        match event {
            SatelliteEvent::Status(satellites) => {
                let visible = satellites.len() as u32;
                let used = satellites.iter().filter(|s| s.used_in_fix).count() as u32;

                self.events.send(ScanEvent::status_changed(used, visible));
                if used < self.min_satellites_in_fix {
                    self.report_location_lost();
                }
                debug!("Satellite status - satellites: {} fixes: {}", visible, used);
            }
            SatelliteEvent::Stopped => self.report_location_lost(),
            SatelliteEvent::Started | SatelliteEvent::FirstFix => {}
        }
    }

    fn on_provider_disabled(&self, name: &str) {
        if self.running_mode().is_some() && name == provider::GPS {
            self.report_location_lost();
        }
    }

    fn on_provider_status(&self, name: &str, status: ProviderStatus) {
        if self.running_mode().is_some()
            && status != ProviderStatus::Available
            && name == provider::GPS
        {
            self.report_location_lost();
        }
    }
}
