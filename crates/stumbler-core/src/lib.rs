//! Scan coordination core for crowd-sourced Wi-Fi/GPS stumbling.
//!
//! This crate collects GPS fixes and nearby Wi-Fi access points for
//! crowd-sourced positioning, applying privacy blocklists and opt-out
//! geofences before anything is published.
//!
//! # Features
//!
//! - **Location scanning**: GPS-only fixes, satellite status, fix-lost signalling
//! - **Wi-Fi scanning**: periodic scans with BSSID canonicalization and deduplication
//! - **Blocklists**: BSSID, SSID and location filters, including geofence regions
//! - **Passive mode**: Wi-Fi scans limited to a short burst per received GPS fix
//! - **Event bus**: broadcast channel of [`ScanEvent`]s for downstream consumers
//! - **Testability**: hardware and preferences behind traits, with mocks in [`mock`]
//!
//! # Host integration
//!
//! The host implements [`LocationHardware`], [`WifiHardware`] and
//! [`Preferences`], builds a [`ScanCoordinator`], and forwards hardware
//! callbacks to [`ScanCoordinator::location`] ([`LocationListener`]) and
//! [`ScanCoordinator::wifi`] ([`WifiListener`]). Callbacks may arrive on any
//! thread.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use stumbler_core::{
//!     LocationListener, MockLocationHardware, MockPreferences, MockWifiHardware,
//!     OperatingMode, Position, ScanConfig, ScanCoordinator, ScanEvent, provider,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = ScanCoordinator::new(
//!         ScanConfig::default(),
//!         Arc::new(MockLocationHardware::new()),
//!         Arc::new(MockWifiHardware::new()),
//!         Arc::new(MockPreferences::new()),
//!     )?;
//!     let mut events = coordinator.subscribe();
//!
//!     coordinator.start(OperatingMode::Active)?;
//!
//!     let fix = Position::builder(provider::GPS, 52.52, 13.40)
//!         .accuracy(5.0)
//!         .timestamp(time::OffsetDateTime::now_utc())
//!         .build();
//!     coordinator.location().on_location_changed(Some(fix));
//!
//!     while let Ok(event) = events.try_recv() {
//!         if let ScanEvent::LocationUpdated { subject, .. } = event {
//!             println!("location: {:?}", subject);
//!         }
//!     }
//!
//!     coordinator.stop();
//!     Ok(())
//! }
//! ```

pub mod blocklist;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod location;
pub mod mock;
pub mod traits;
pub mod wifi;

// Core exports
pub use coordinator::{CoordinatorStatus, ScanCoordinator};
pub use error::{Error, Result};
pub use location::{LocationScanner, PassiveFixHook};
pub use wifi::WifiScanner;

pub use blocklist::{
    BlockReason, BlockedRegion, BssidBlocklist, LocationBlocklist, RegionShape, SsidBlocklist,
};
pub use config::{BlocklistConfig, LocationLimits, ScanConfig};
pub use events::{EventDispatcher, EventReceiver, EventSender, LocationSubject, ScanEvent};
pub use mock::{MockLocationHardware, MockPreferences, MockWifiHardware};
pub use traits::{
    LocationHardware, LocationListener, LocationRequest, Preferences, ProviderStatus,
    SatelliteEvent, WifiHardware, WifiListener,
};

// Re-export from stumbler-types
pub use stumbler_types::{
    AccessPointObservation, Bssid, OperatingMode, ParseError, Position, RawScanResult,
    SatelliteInfo, ScannerStatus, provider,
};
