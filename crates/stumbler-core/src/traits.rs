//! Capability traits for the host platform.
//!
//! The scanners never talk to radios or settings directly. The host provides
//! implementations of [`LocationHardware`], [`WifiHardware`] and
//! [`Preferences`], and delivers hardware callbacks by calling the
//! [`LocationListener`] / [`WifiListener`] methods on the scanners. The
//! [`crate::mock`] module provides in-memory implementations for tests.

use std::time::Duration;

use stumbler_types::{Position, RawScanResult, SatelliteInfo, provider};

use crate::blocklist::BlockedRegion;
use crate::error::Result;

/// Parameters of a location update subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRequest {
    /// Provider to subscribe to (see [`stumbler_types::provider`]).
    pub provider: String,
    /// Minimum time between updates.
    pub min_interval: Duration,
    /// Minimum distance between updates in metres.
    pub min_distance_m: f32,
}

impl LocationRequest {
    /// Zero-interval, zero-distance subscription to the passive feed.
    pub fn passive() -> Self {
        Self {
            provider: provider::PASSIVE.to_string(),
            min_interval: Duration::ZERO,
            min_distance_m: 0.0,
        }
    }

    /// Subscription to the GPS provider.
    pub fn gps(min_interval: Duration, min_distance_m: f32) -> Self {
        Self {
            provider: provider::GPS.to_string(),
            min_interval,
            min_distance_m,
        }
    }
}

/// Location provider hardware.
///
/// Registration is fire-and-forget: updates are delivered later through the
/// [`LocationListener`] methods.
pub trait LocationHardware: Send + Sync {
    /// Subscribe to position updates.
    fn request_updates(&self, request: &LocationRequest) -> Result<()>;

    /// Remove all position update subscriptions.
    fn remove_updates(&self);

    /// Subscribe to satellite status reports.
    fn add_satellite_listener(&self) -> Result<()>;

    /// Remove the satellite status subscription.
    fn remove_satellite_listener(&self);
}

/// Wi-Fi radio hardware.
pub trait WifiHardware: Send + Sync {
    /// Whether the radio is switched on.
    fn is_enabled(&self) -> bool;

    /// Ask the radio to scan. The hardware ignores the request while a scan
    /// is already in progress.
    fn start_scan(&self) -> Result<()>;

    /// Results of the most recent completed scan.
    fn scan_results(&self) -> Result<Vec<RawScanResult>>;

    /// Keep the radio available for scanning.
    fn acquire_scan_lock(&self) -> Result<()>;

    /// Release a lock obtained with [`WifiHardware::acquire_scan_lock`].
    fn release_scan_lock(&self);

    /// Start delivering scan-completed notifications, and radio state
    /// notifications when `radio_state` is set.
    fn register_notifications(&self, radio_state: bool) -> Result<()>;

    /// Stop delivering notifications.
    fn unregister_notifications(&self);
}

/// User preferences consulted by the scanners.
pub trait Preferences: Send + Sync {
    /// Whether the configured geofence regions are enforced.
    fn geofence_enabled(&self) -> bool;

    /// Whether fix reporting is suppressed entirely ("geofence here").
    fn geofence_here(&self) -> bool {
        false
    }

    /// Whether Wi-Fi scanning runs even while the radio reports disabled.
    fn scan_always_enabled(&self) -> bool;

    /// Regions in which positions are blocked.
    fn geofence_regions(&self) -> Result<Vec<BlockedRegion>> {
        Ok(Vec::new())
    }
}

/// Availability reported by a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    /// The provider is delivering fixes.
    Available,
    /// The provider expects to recover shortly.
    TemporarilyUnavailable,
    /// The provider is not expected to recover soon.
    OutOfService,
}

/// Satellite subsystem notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SatelliteEvent {
    /// The receiver engine started.
    Started,
    /// The receiver engine stopped.
    Stopped,
    /// The receiver computed its first fix since starting.
    FirstFix,
    /// Satellites currently in view.
    Status(Vec<SatelliteInfo>),
}

/// Location callbacks delivered by the host.
pub trait LocationListener: Send + Sync {
    /// A new fix, or `None` when the platform delivered an empty callback.
    fn on_location_changed(&self, position: Option<Position>);

    /// Satellite subsystem notification.
    fn on_satellite_event(&self, event: SatelliteEvent);

    /// A provider was switched off.
    fn on_provider_disabled(&self, provider: &str);

    /// A provider was switched on.
    fn on_provider_enabled(&self, _provider: &str) {}

    /// A provider changed availability.
    fn on_provider_status(&self, provider: &str, status: ProviderStatus);
}

/// Wi-Fi callbacks delivered by the host.
pub trait WifiListener: Send + Sync {
    /// Scan results are available from [`WifiHardware::scan_results`].
    fn on_scan_results_available(&self);

    /// The radio was switched on or off.
    fn on_radio_state_changed(&self, enabled: bool);
}
