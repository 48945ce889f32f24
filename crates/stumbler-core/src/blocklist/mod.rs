//! Observation filters.
//!
//! Three independent predicates decide which observations are surfaced:
//!
//! - [`LocationBlocklist`]: implausible fixes and fixes inside geofenced regions
//! - [`BssidBlocklist`]: malformed addresses and known moving-router prefixes
//! - [`SsidBlocklist`]: hotspot names and `_nomap` opt-outs
//!
//! Each filter is built from [`crate::config::BlocklistConfig`] and can be
//! replaced independently on the scanners.

pub mod bssid;
pub mod location;
pub mod ssid;

pub use bssid::BssidBlocklist;
pub use location::{BlockReason, BlockedRegion, LocationBlocklist, RegionShape};
pub use ssid::SsidBlocklist;
