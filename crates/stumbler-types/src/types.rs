//! Core types for stumbling observations.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bssid::Bssid;

/// How the scanners obtain their observations.
///
/// The mode is fixed for the life of a scanning session; switching mode
/// requires a stop followed by a start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OperatingMode {
    /// App-driven, high-frequency scanning.
    #[default]
    Active,
    /// Piggy-backs on fixes requested by other apps; Wi-Fi scans are limited
    /// to short bursts per received fix.
    Passive,
}

impl OperatingMode {
    /// Returns `true` for [`OperatingMode::Passive`].
    #[must_use]
    pub fn is_passive(&self) -> bool {
        matches!(self, OperatingMode::Passive)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Active => write!(f, "Active"),
            OperatingMode::Passive => write!(f, "Passive"),
        }
    }
}

/// Derived status of the wireless scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScannerStatus {
    /// Scanning has not been started.
    Idle,
    /// Started and the periodic scan is armed (or paused by a passive burst limit).
    Active,
    /// Started but the radio is off, so no periodic scan is armed.
    RadioDisabled,
}

impl fmt::Display for ScannerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerStatus::Idle => write!(f, "Idle"),
            ScannerStatus::Active => write!(f, "Active"),
            ScannerStatus::RadioDisabled => write!(f, "Radio disabled"),
        }
    }
}

/// Well-known location provider names.
pub mod provider {
    /// Satellite positioning.
    pub const GPS: &str = "gps";
    /// Cell/Wi-Fi network positioning.
    pub const NETWORK: &str = "network";
    /// Fused positioning from the platform.
    pub const FUSED: &str = "fused";
    /// Passive feed of fixes requested by other apps.
    pub const PASSIVE: &str = "passive";
}

/// A position fix delivered by a location provider.
///
/// Only `latitude`, `longitude`, `provider` and `timestamp` are always
/// present; the remaining fields depend on what the provider reports.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in metres above the WGS84 ellipsoid.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in metres.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub accuracy: Option<f32>,
    /// Ground speed in m/s.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub speed: Option<f32>,
    /// Bearing in degrees.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub bearing: Option<f32>,
    /// Name of the provider that produced the fix (e.g. `"gps"`).
    pub provider: String,
    /// When the fix was taken.
    pub timestamp: time::OffsetDateTime,
}

impl Position {
    /// Create a builder for a fix from the given provider.
    pub fn builder(provider: impl Into<String>, latitude: f64, longitude: f64) -> PositionBuilder {
        PositionBuilder {
            position: Position {
                latitude,
                longitude,
                altitude: None,
                accuracy: None,
                speed: None,
                bearing: None,
                provider: provider.into(),
                timestamp: time::OffsetDateTime::UNIX_EPOCH,
            },
        }
    }

    /// Whether the fix was derived from satellite positioning.
    ///
    /// Any provider whose name contains `gps` (case-insensitive) qualifies,
    /// which covers both the raw GPS provider and vendor variants.
    #[must_use]
    pub fn is_gps(&self) -> bool {
        self.provider.to_lowercase().contains("gps")
    }
}

/// Builder for [`Position`].
#[derive(Debug)]
#[must_use]
pub struct PositionBuilder {
    position: Position,
}

impl PositionBuilder {
    /// Set the altitude.
    pub fn altitude(mut self, altitude: f64) -> Self {
        self.position.altitude = Some(altitude);
        self
    }

    /// Set the accuracy radius.
    pub fn accuracy(mut self, accuracy: f32) -> Self {
        self.position.accuracy = Some(accuracy);
        self
    }

    /// Set the speed.
    pub fn speed(mut self, speed: f32) -> Self {
        self.position.speed = Some(speed);
        self
    }

    /// Set the bearing.
    pub fn bearing(mut self, bearing: f32) -> Self {
        self.position.bearing = Some(bearing);
        self
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, timestamp: time::OffsetDateTime) -> Self {
        self.position.timestamp = timestamp;
        self
    }

    /// Build the `Position`.
    #[must_use]
    pub fn build(self) -> Position {
        self.position
    }
}

/// One satellite from a satellite-status report.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatelliteInfo {
    /// Pseudo-random noise code identifying the satellite.
    pub prn: u16,
    /// Signal to noise ratio in dB-Hz.
    pub snr: f32,
    /// Whether the receiver used this satellite to compute the current fix.
    pub used_in_fix: bool,
}

/// A scan result as delivered by the radio, before canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawScanResult {
    /// Hardware address in whatever textual form the driver uses.
    pub bssid: String,
    /// Network name. May be empty for hidden networks.
    pub ssid: String,
    /// Received signal level in dBm.
    pub level: i32,
    /// Channel centre frequency in MHz.
    pub frequency: u32,
}

impl RawScanResult {
    /// Create a raw scan result.
    pub fn new(bssid: impl Into<String>, ssid: impl Into<String>, level: i32) -> Self {
        Self {
            bssid: bssid.into(),
            ssid: ssid.into(),
            level,
            frequency: 2412,
        }
    }

    /// Set the frequency.
    #[must_use]
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }
}

/// A canonicalized access point observation that passed all filters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessPointObservation {
    /// Canonical hardware address.
    pub bssid: Bssid,
    /// Network name.
    pub ssid: String,
    /// Received signal level in dBm.
    pub level: i32,
    /// Channel centre frequency in MHz.
    pub frequency: u32,
    /// When the observation was processed.
    pub timestamp: time::OffsetDateTime,
}

impl AccessPointObservation {
    /// Build an observation from a raw result whose BSSID was already canonicalized.
    pub fn from_raw(raw: RawScanResult, bssid: Bssid, timestamp: time::OffsetDateTime) -> Self {
        Self {
            bssid,
            ssid: raw.ssid,
            level: raw.level,
            frequency: raw.frequency,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operating_mode_default_is_active() {
        assert_eq!(OperatingMode::default(), OperatingMode::Active);
        assert!(OperatingMode::Passive.is_passive());
        assert!(!OperatingMode::Active.is_passive());
    }

    #[test]
    fn test_scanner_status_display() {
        assert_eq!(ScannerStatus::Idle.to_string(), "Idle");
        assert_eq!(ScannerStatus::RadioDisabled.to_string(), "Radio disabled");
    }

    #[test]
    fn test_position_is_gps() {
        let gps = Position::builder(provider::GPS, 1.0, 2.0).build();
        assert!(gps.is_gps());

        let vendor = Position::builder("Vendor-GPS-Chip", 1.0, 2.0).build();
        assert!(vendor.is_gps());

        let network = Position::builder(provider::NETWORK, 1.0, 2.0).build();
        assert!(!network.is_gps());

        let fused = Position::builder(provider::FUSED, 1.0, 2.0).build();
        assert!(!fused.is_gps());
    }

    #[test]
    fn test_position_builder() {
        let ts = time::OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let position = Position::builder("gps", 52.5, 13.4)
            .altitude(34.0)
            .accuracy(8.0)
            .speed(1.5)
            .bearing(90.0)
            .timestamp(ts)
            .build();

        assert_eq!(position.altitude, Some(34.0));
        assert_eq!(position.accuracy, Some(8.0));
        assert_eq!(position.speed, Some(1.5));
        assert_eq!(position.bearing, Some(90.0));
        assert_eq!(position.timestamp, ts);
    }

    #[test]
    fn test_observation_from_raw() {
        let raw = RawScanResult::new("aa-bb-cc-dd-ee-ff", "cafe", -60).with_frequency(5180);
        let bssid = Bssid::parse(&raw.bssid).unwrap();
        let obs = AccessPointObservation::from_raw(raw, bssid, time::OffsetDateTime::UNIX_EPOCH);

        assert_eq!(obs.bssid.to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(obs.ssid, "cafe");
        assert_eq!(obs.level, -60);
        assert_eq!(obs.frequency, 5180);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_position_serialization_skips_missing_fields() {
        let position = Position::builder("gps", 1.0, 2.0).build();
        let json = serde_json::to_value(&position).unwrap();
        assert!(json.get("altitude").is_none());
        assert_eq!(json["provider"], "gps");
    }
}
