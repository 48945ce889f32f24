//! Mock hardware for testing.
//!
//! In-memory implementations of the capability traits that record every call
//! made by the scanners, so tests can run without radios or a GPS receiver.
//!
//! # Features
//!
//! - **Call recording**: subscriptions, scan requests and lock traffic are counted
//! - **Failure injection**: make subscriptions, locks or result reads fail
//! - **Scripted results**: set the scan results returned to the scanner

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;

use stumbler_types::RawScanResult;

use crate::blocklist::BlockedRegion;
use crate::error::{Error, Result};
use crate::traits::{LocationHardware, LocationRequest, Preferences, WifiHardware};

/// A mock location provider.
///
/// # Example
///
/// ```
/// use stumbler_core::{LocationHardware, LocationRequest, MockLocationHardware};
///
/// let hardware = MockLocationHardware::new();
/// hardware.request_updates(&LocationRequest::passive()).unwrap();
/// assert_eq!(hardware.requests().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockLocationHardware {
    requests: RwLock<Vec<LocationRequest>>,
    remove_updates_calls: AtomicU32,
    satellite_adds: AtomicU32,
    satellite_removes: AtomicU32,
    fail_requests: AtomicBool,
    fail_satellites: AtomicBool,
}

impl MockLocationHardware {
    /// Create a mock location provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subscription requested so far, in order.
    pub fn requests(&self) -> Vec<LocationRequest> {
        self.requests.read().clone()
    }

    /// Number of `remove_updates` calls.
    pub fn remove_updates_calls(&self) -> u32 {
        self.remove_updates_calls.load(Ordering::Relaxed)
    }

    /// Satellite listeners currently registered.
    pub fn satellite_listeners(&self) -> u32 {
        self.satellite_adds
            .load(Ordering::Relaxed)
            .saturating_sub(self.satellite_removes.load(Ordering::Relaxed))
    }

    /// Make `request_updates` fail.
    pub fn set_fail_requests(&self, fail: bool) {
        self.fail_requests.store(fail, Ordering::Relaxed);
    }

    /// Make `add_satellite_listener` fail.
    pub fn set_fail_satellites(&self, fail: bool) {
        self.fail_satellites.store(fail, Ordering::Relaxed);
    }
}

impl LocationHardware for MockLocationHardware {
    fn request_updates(&self, request: &LocationRequest) -> Result<()> {
        if self.fail_requests.load(Ordering::Relaxed) {
            return Err(Error::hardware("request_updates", "provider unavailable"));
        }
        self.requests.write().push(request.clone());
        Ok(())
    }

    fn remove_updates(&self) {
        self.remove_updates_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn add_satellite_listener(&self) -> Result<()> {
        if self.fail_satellites.load(Ordering::Relaxed) {
            return Err(Error::hardware("add_satellite_listener", "no GNSS receiver"));
        }
        self.satellite_adds.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove_satellite_listener(&self) {
        self.satellite_removes.fetch_add(1, Ordering::Relaxed);
    }
}

/// A mock Wi-Fi radio.
#[derive(Debug)]
pub struct MockWifiHardware {
    enabled: AtomicBool,
    results: RwLock<Vec<RawScanResult>>,
    scan_requests: AtomicU64,
    lock_acquisitions: AtomicU32,
    lock_releases: AtomicU32,
    registrations: AtomicU32,
    unregistrations: AtomicU32,
    radio_state_registered: AtomicBool,
    fail_lock: AtomicBool,
    fail_results: AtomicBool,
}

impl Default for MockWifiHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWifiHardware {
    /// Create a mock radio that is switched on and returns no results.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            results: RwLock::new(Vec::new()),
            scan_requests: AtomicU64::new(0),
            lock_acquisitions: AtomicU32::new(0),
            lock_releases: AtomicU32::new(0),
            registrations: AtomicU32::new(0),
            unregistrations: AtomicU32::new(0),
            radio_state_registered: AtomicBool::new(false),
            fail_lock: AtomicBool::new(false),
            fail_results: AtomicBool::new(false),
        }
    }

    /// Switch the radio on or off. Does not notify the scanner.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Set the results returned by the next `scan_results` calls.
    pub fn set_results(&self, results: Vec<RawScanResult>) {
        *self.results.write() = results;
    }

    /// Number of `start_scan` calls.
    pub fn scan_requests(&self) -> u64 {
        self.scan_requests.load(Ordering::Relaxed)
    }

    /// Number of successful lock acquisitions.
    pub fn lock_acquisitions(&self) -> u32 {
        self.lock_acquisitions.load(Ordering::Relaxed)
    }

    /// Number of lock releases.
    pub fn lock_releases(&self) -> u32 {
        self.lock_releases.load(Ordering::Relaxed)
    }

    /// Whether the scan lock is currently held.
    pub fn lock_held(&self) -> bool {
        self.lock_acquisitions() > self.lock_releases()
    }

    /// Number of `register_notifications` calls.
    pub fn registrations(&self) -> u32 {
        self.registrations.load(Ordering::Relaxed)
    }

    /// Number of `unregister_notifications` calls.
    pub fn unregistrations(&self) -> u32 {
        self.unregistrations.load(Ordering::Relaxed)
    }

    /// Whether the last registration asked for radio state notifications.
    pub fn radio_state_registered(&self) -> bool {
        self.radio_state_registered.load(Ordering::Relaxed)
    }

    /// Make `acquire_scan_lock` fail.
    pub fn set_fail_lock(&self, fail: bool) {
        self.fail_lock.store(fail, Ordering::Relaxed);
    }

    /// Make `scan_results` fail.
    pub fn set_fail_results(&self, fail: bool) {
        self.fail_results.store(fail, Ordering::Relaxed);
    }
}

impl WifiHardware for MockWifiHardware {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn start_scan(&self) -> Result<()> {
        self.scan_requests.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn scan_results(&self) -> Result<Vec<RawScanResult>> {
        if self.fail_results.load(Ordering::Relaxed) {
            return Err(Error::hardware("scan_results", "results unavailable"));
        }
        Ok(self.results.read().clone())
    }

    fn acquire_scan_lock(&self) -> Result<()> {
        if self.fail_lock.load(Ordering::Relaxed) {
            return Err(Error::RadioLock("permission denied".to_string()));
        }
        self.lock_acquisitions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release_scan_lock(&self) {
        self.lock_releases.fetch_add(1, Ordering::Relaxed);
    }

    fn register_notifications(&self, radio_state: bool) -> Result<()> {
        self.registrations.fetch_add(1, Ordering::Relaxed);
        self.radio_state_registered
            .store(radio_state, Ordering::Relaxed);
        Ok(())
    }

    fn unregister_notifications(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
        self.radio_state_registered.store(false, Ordering::Relaxed);
    }
}

/// Mock user preferences.
#[derive(Debug, Default)]
pub struct MockPreferences {
    geofence_enabled: AtomicBool,
    geofence_here: AtomicBool,
    scan_always: AtomicBool,
    regions: RwLock<Vec<BlockedRegion>>,
    fail_regions: AtomicBool,
}

impl MockPreferences {
    /// Create preferences with geofencing off and "always scan" off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable geofencing.
    pub fn set_geofence_enabled(&self, enabled: bool) {
        self.geofence_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Suppress all fix reports.
    pub fn set_geofence_here(&self, enabled: bool) {
        self.geofence_here.store(enabled, Ordering::Relaxed);
    }

    /// Set the "always scan" preference.
    pub fn set_scan_always(&self, enabled: bool) {
        self.scan_always.store(enabled, Ordering::Relaxed);
    }

    /// Replace the geofence regions.
    pub fn set_regions(&self, regions: Vec<BlockedRegion>) {
        *self.regions.write() = regions;
    }

    /// Make `geofence_regions` fail.
    pub fn set_fail_regions(&self, fail: bool) {
        self.fail_regions.store(fail, Ordering::Relaxed);
    }
}

impl Preferences for MockPreferences {
    fn geofence_enabled(&self) -> bool {
        self.geofence_enabled.load(Ordering::Relaxed)
    }

    fn geofence_here(&self) -> bool {
        self.geofence_here.load(Ordering::Relaxed)
    }

    fn scan_always_enabled(&self) -> bool {
        self.scan_always.load(Ordering::Relaxed)
    }

    fn geofence_regions(&self) -> Result<Vec<BlockedRegion>> {
        if self.fail_regions.load(Ordering::Relaxed) {
            return Err(Error::Preferences("region store unreadable".to_string()));
        }
        Ok(self.regions.read().clone())
    }
}
