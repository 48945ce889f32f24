//! Platform-agnostic types for crowd-sourced Wi-Fi/GPS stumbling.
//!
//! This crate provides the observation types shared by the scanning core
//! and by downstream consumers (upload queues, UIs, log views).
//!
//! # Features
//!
//! - Position fixes and satellite status entries
//! - Raw and canonicalized Wi-Fi access point observations
//! - Canonical BSSID parsing and formatting
//! - Operating mode and scanner status enums
//!
//! # Example
//!
//! ```
//! use stumbler_types::{Bssid, Position, provider};
//!
//! let fix = Position::builder(provider::GPS, 52.52, 13.40).accuracy(5.0).build();
//! assert!(fix.is_gps());
//!
//! let bssid: Bssid = "00-11-22-aa-bb-cc".parse().unwrap();
//! assert_eq!(bssid.to_string(), "00:11:22:AA:BB:CC");
//! ```

pub mod bssid;
pub mod error;
pub mod types;

pub use bssid::{Bssid, canonicalize_bssid};
pub use error::{ParseError, ParseResult};
pub use types::{
    AccessPointObservation, OperatingMode, Position, PositionBuilder, RawScanResult,
    SatelliteInfo, ScannerStatus, provider,
};
