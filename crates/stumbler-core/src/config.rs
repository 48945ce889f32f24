//! Scanner configuration.
//!
//! A [`ScanConfig`] is passed to the coordinator at construction; nothing in
//! the core reads global state. Configurations can be loaded from TOML:
//!
//! ```toml
//! wifi_scan_interval_ms = 1000
//! passive_max_scans_per_fix = 3
//!
//! [blocklist]
//! bssid_oui_prefixes = ["001a11"]
//! ssid_exact = ["xfinitywifi"]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest accepted `max_future_skew_ms`: one year.
pub const MAX_FUTURE_SKEW_MS: u64 = 365 * 86_400_000;

/// Configuration for the scanning core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Period of the Wi-Fi scan timer in milliseconds.
    pub wifi_scan_interval_ms: u64,
    /// Minimum interval between active-mode GPS updates in milliseconds.
    pub gps_min_update_interval_ms: u64,
    /// Minimum distance between active-mode GPS updates in metres.
    pub gps_min_update_distance_m: f32,
    /// Fewer satellites used in the fix than this is reported as a lost fix.
    pub min_satellites_in_fix: u32,
    /// Wi-Fi scans allowed per passive GPS fix before the timer pauses.
    pub passive_max_scans_per_fix: u32,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Verbose per-tick logging.
    pub debug: bool,
    /// Upload API key, carried for the upload collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Filter configuration.
    pub blocklist: BlocklistConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            wifi_scan_interval_ms: 1000,
            gps_min_update_interval_ms: 1000,
            gps_min_update_distance_m: 10.0,
            min_satellites_in_fix: 3,
            passive_max_scans_per_fix: 3,
            event_capacity: 100,
            debug: false,
            api_key: None,
            blocklist: BlocklistConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::ConfigRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// This checks:
    /// - Timer and GPS intervals are non-zero
    /// - The GPS distance is finite and non-negative
    /// - The event channel has capacity
    /// - Blocklist prefixes are hex and location limits are ordered
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.wifi_scan_interval_ms == 0 {
            errors.push("wifi_scan_interval_ms must be greater than 0".to_string());
        }
        if self.gps_min_update_interval_ms == 0 {
            errors.push("gps_min_update_interval_ms must be greater than 0".to_string());
        }
        if !self.gps_min_update_distance_m.is_finite() || self.gps_min_update_distance_m < 0.0 {
            errors.push("gps_min_update_distance_m must be a non-negative number".to_string());
        }
        if self.event_capacity == 0 {
            errors.push("event_capacity must be greater than 0".to_string());
        }
        errors.extend(self.blocklist.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(errors.join("; ")))
        }
    }

    /// Period of the Wi-Fi scan timer.
    pub fn wifi_scan_interval(&self) -> Duration {
        Duration::from_millis(self.wifi_scan_interval_ms)
    }

    /// Minimum interval between active-mode GPS updates.
    pub fn gps_min_update_interval(&self) -> Duration {
        Duration::from_millis(self.gps_min_update_interval_ms)
    }

    /// Set the Wi-Fi scan interval.
    #[must_use]
    pub fn with_wifi_scan_interval(mut self, interval: Duration) -> Self {
        self.wifi_scan_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the passive-mode burst limit.
    #[must_use]
    pub fn with_passive_max_scans(mut self, scans: u32) -> Self {
        self.passive_max_scans_per_fix = scans;
        self
    }

    /// Replace the blocklist configuration.
    #[must_use]
    pub fn with_blocklist(mut self, blocklist: BlocklistConfig) -> Self {
        self.blocklist = blocklist;
        self
    }
}

/// Filter configuration for locations and access points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocklistConfig {
    /// Lower-case hex OUI prefixes (no separators) of moving routers.
    pub bssid_oui_prefixes: Vec<String>,
    /// Also block locally administered addresses (soft APs).
    pub block_locally_administered: bool,
    /// SSIDs blocked on exact, case-insensitive match.
    pub ssid_exact: Vec<String>,
    /// SSID prefixes of mobile hotspots.
    pub ssid_prefixes: Vec<String>,
    /// SSID suffixes of mobile hotspots and opt-outs.
    pub ssid_suffixes: Vec<String>,
    /// Sanity limits for position fixes.
    pub location: LocationLimits,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            bssid_oui_prefixes: Vec::new(),
            block_locally_administered: false,
            ssid_exact: vec!["xfinitywifi".to_string()],
            ssid_prefixes: [
                "ASUS",
                "AndroidAP",
                "AndroidHotspot",
                "Android Hotspot",
                "barnacle",
                "FirefoxHotspot",
                "Galaxy Note",
                "Galaxy S",
                "Galaxy Tab",
                "HTC ",
                "iPhone",
                "LG-MS770",
                "LG-MS870",
                "LG VS910 4G",
                "LG VS920 4G",
                "MIFI",
                "MiFi",
                "Mobile Hotspot",
                "myLGNet",
                "myTouch 4G Hotspot",
                "NOKIA Lumia",
                "PhoneAP",
                "SCH-I",
                "Sprint MiFi",
                "Verizon ",
                "Verizon-",
                "VirginMobile MiFi",
                "VodafoneMobileWiFi-",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ssid_suffixes: ["MacBook", "MacBook Pro", "MiFi", "Mobile Hotspot", "_nomap"]
                .into_iter()
                .map(String::from)
                .collect(),
            location: LocationLimits::default(),
        }
    }
}

impl BlocklistConfig {
    /// A configuration that blocks nothing beyond malformed addresses.
    pub fn permissive() -> Self {
        Self {
            bssid_oui_prefixes: Vec::new(),
            block_locally_administered: false,
            ssid_exact: Vec::new(),
            ssid_prefixes: Vec::new(),
            ssid_suffixes: Vec::new(),
            location: LocationLimits::default(),
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (i, prefix) in self.bssid_oui_prefixes.iter().enumerate() {
            if prefix.is_empty() || prefix.len() > 12 || !prefix.chars().all(|c| c.is_ascii_hexdigit())
            {
                errors.push(format!(
                    "blocklist.bssid_oui_prefixes[{}] '{}' must be 1-12 hex digits",
                    i, prefix
                ));
            }
        }

        let limits = &self.location;
        if limits.min_altitude_m >= limits.max_altitude_m {
            errors.push("blocklist.location.min_altitude_m must be below max_altitude_m".to_string());
        }
        if limits.max_accuracy_m <= 0.0 {
            errors.push("blocklist.location.max_accuracy_m must be positive".to_string());
        }
        if limits.max_speed_mps <= 0.0 {
            errors.push("blocklist.location.max_speed_mps must be positive".to_string());
        }
        if limits.max_future_skew_ms > MAX_FUTURE_SKEW_MS {
            errors.push(format!(
                "blocklist.location.max_future_skew_ms must be at most {} (one year)",
                MAX_FUTURE_SKEW_MS
            ));
        }

        errors
    }
}

/// Plausibility limits applied to every position fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationLimits {
    /// Fixes with a worse (larger) accuracy radius are rejected.
    pub max_accuracy_m: f32,
    /// Lowest plausible altitude (Dead Sea shore).
    pub min_altitude_m: f64,
    /// Highest plausible altitude (Everest summit).
    pub max_altitude_m: f64,
    /// Highest plausible ground speed (Mach 2).
    pub max_speed_mps: f32,
    /// Fixes timestamped before this Unix time are rejected.
    pub min_timestamp: i64,
    /// Fixes timestamped further than this into the future are rejected.
    pub max_future_skew_ms: u64,
}

impl Default for LocationLimits {
    fn default() -> Self {
        Self {
            max_accuracy_m: 500.0,
            min_altitude_m: -418.0,
            max_altitude_m: 8848.0,
            max_speed_mps: 340.29 * 2.0,
            // 2000-01-01T00:00:01Z
            min_timestamp: 946_684_801,
            max_future_skew_ms: 86_400_000,
        }
    }
}

impl LocationLimits {
    /// Maximum tolerated clock skew into the future.
    pub fn max_future_skew(&self) -> Duration {
        Duration::from_millis(self.max_future_skew_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScanConfig::default();
        config.validate().unwrap();
        assert_eq!(config.wifi_scan_interval(), Duration::from_secs(1));
        assert_eq!(config.gps_min_update_interval(), Duration::from_secs(1));
        assert_eq!(config.min_satellites_in_fix, 3);
        assert_eq!(config.passive_max_scans_per_fix, 3);
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut config = ScanConfig::default();
        config.wifi_scan_interval_ms = 0;
        config.event_capacity = 0;
        config.blocklist.bssid_oui_prefixes = vec!["zz".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("wifi_scan_interval_ms"));
        assert!(err.contains("event_capacity"));
        assert!(err.contains("bssid_oui_prefixes[0]"));
    }

    #[test]
    fn test_validate_bounds_future_skew() {
        let mut config = ScanConfig::default();
        config.blocklist.location.max_future_skew_ms = u64::MAX;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_future_skew_ms"));

        config.blocklist.location.max_future_skew_ms = MAX_FUTURE_SKEW_MS;
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_toml_uses_defaults() {
        let config: ScanConfig = toml::from_str(
            r#"
            passive_max_scans_per_fix = 5
            api_key = "test-key"

            [blocklist]
            ssid_exact = ["guest"]
            "#,
        )
        .unwrap();

        assert_eq!(config.passive_max_scans_per_fix, 5);
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.wifi_scan_interval_ms, 1000);
        assert_eq!(config.blocklist.ssid_exact, vec!["guest"]);
        // Unspecified lists keep their defaults.
        assert!(config.blocklist.ssid_suffixes.contains(&"_nomap".to_string()));
        assert_eq!(config.blocklist.location.max_accuracy_m, 500.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wifi_scan_interval_ms = 2500").unwrap();

        let config = ScanConfig::load_validated(file.path()).unwrap();
        assert_eq!(config.wifi_scan_interval(), Duration::from_millis(2500));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wifi_scan_interval_ms = \"soon\"").unwrap();

        let err = ScanConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ScanConfig::load("/nonexistent/stumbler.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_builders() {
        let config = ScanConfig::default()
            .with_wifi_scan_interval(Duration::from_millis(250))
            .with_passive_max_scans(7)
            .with_blocklist(BlocklistConfig::permissive());

        assert_eq!(config.wifi_scan_interval_ms, 250);
        assert_eq!(config.passive_max_scans_per_fix, 7);
        assert!(config.blocklist.ssid_prefixes.is_empty());
    }
}
