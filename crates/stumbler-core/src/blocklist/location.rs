//! Location blocklist and geofencing.
//!
//! A fix is blocked when it is implausible (see [`LocationLimits`]) or when
//! it falls inside an active [`BlockedRegion`] while geofencing is enabled.
//! Regions and the enabled flag are loaded from [`Preferences`] by
//! [`LocationBlocklist::refresh`]; they are never reloaded implicitly.

use geo::{Distance, Haversine, Intersects, Point, Rect, coord};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use stumbler_types::Position;

use crate::config::LocationLimits;
use crate::traits::Preferences;

/// Shape of a geofenced region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RegionShape {
    /// Everything within `radius_m` metres of a centre point.
    Circle {
        /// Centre latitude in degrees.
        latitude: f64,
        /// Centre longitude in degrees.
        longitude: f64,
        /// Radius in metres.
        radius_m: f64,
    },
    /// A latitude/longitude bounding box, edges included.
    Rect {
        /// Southern edge.
        min_latitude: f64,
        /// Western edge.
        min_longitude: f64,
        /// Northern edge.
        max_latitude: f64,
        /// Eastern edge.
        max_longitude: f64,
    },
}

impl RegionShape {
    /// Whether the coordinate lies inside the shape.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        match *self {
            RegionShape::Circle {
                latitude: lat,
                longitude: lon,
                radius_m,
            } => {
                let distance =
                    Haversine::distance(Point::new(lon, lat), Point::new(longitude, latitude));
                distance <= radius_m
            }
            RegionShape::Rect {
                min_latitude,
                min_longitude,
                max_latitude,
                max_longitude,
            } => {
                let rect = Rect::new(
                    coord! { x: min_longitude, y: min_latitude },
                    coord! { x: max_longitude, y: max_latitude },
                );
                rect.intersects(&coord! { x: longitude, y: latitude })
            }
        }
    }
}

/// A region in which positions are not reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedRegion {
    /// The region's geometry.
    pub shape: RegionShape,
    /// Inactive regions are kept in configuration but not enforced.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl BlockedRegion {
    /// An active circular region.
    pub fn circle(latitude: f64, longitude: f64, radius_m: f64) -> Self {
        Self {
            shape: RegionShape::Circle {
                latitude,
                longitude,
                radius_m,
            },
            active: true,
        }
    }

    /// An active rectangular region.
    pub fn rect(min_latitude: f64, min_longitude: f64, max_latitude: f64, max_longitude: f64) -> Self {
        Self {
            shape: RegionShape::Rect {
                min_latitude,
                min_longitude,
                max_latitude,
                max_longitude,
            },
            active: true,
        }
    }

    /// Mark the region active or inactive.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Why a fix was blocked.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    /// Accuracy missing or worse than the limit.
    InsufficientAccuracy(Option<f32>),
    /// Coordinates out of range or exactly (0, 0).
    InvalidCoordinates,
    /// Altitude outside the plausible range.
    AltitudeOutOfRange(f64),
    /// Speed above the plausible maximum.
    SpeedOutOfRange(f32),
    /// Timestamp too old or too far in the future.
    TimestampOutOfRange,
    /// Inside an active geofenced region.
    Geofenced,
}

impl BlockReason {
    /// Geofenced fixes are genuine fixes that are merely not reported.
    pub fn is_geofence(&self) -> bool {
        matches!(self, BlockReason::Geofenced)
    }
}

/// Plausibility checks plus geofencing for position fixes.
#[derive(Debug, Clone, Default)]
pub struct LocationBlocklist {
    limits: LocationLimits,
    regions: Vec<BlockedRegion>,
    geofence_enabled: bool,
}

impl LocationBlocklist {
    /// Create a blocklist with the given limits and no regions.
    pub fn new(limits: LocationLimits) -> Self {
        Self {
            limits,
            regions: Vec::new(),
            geofence_enabled: false,
        }
    }

    /// Reload the geofence flag and regions from preferences.
    ///
    /// If the regions cannot be loaded the previous configuration is kept
    /// unchanged, including the enabled flag.
    pub fn refresh(&mut self, preferences: &dyn Preferences) {
        match preferences.geofence_regions() {
            Ok(regions) => {
                self.regions = regions;
                self.geofence_enabled = preferences.geofence_enabled();
                debug!(
                    "Geofence refreshed: enabled={}, {} region(s)",
                    self.geofence_enabled,
                    self.regions.len()
                );
            }
            Err(e) => {
                warn!("Failed to reload geofence regions, keeping previous: {}", e);
            }
        }
    }

    /// Replace the regions directly.
    pub fn set_regions(&mut self, regions: Vec<BlockedRegion>, enabled: bool) {
        self.regions = regions;
        self.geofence_enabled = enabled;
    }

    /// Whether geofencing is currently enabled.
    pub fn is_geofenced(&self) -> bool {
        self.geofence_enabled
    }

    /// Configured regions.
    pub fn regions(&self) -> &[BlockedRegion] {
        &self.regions
    }

    /// Whether the fix should be blocked, judged at the current time.
    pub fn contains(&self, position: &Position) -> bool {
        self.check(position, OffsetDateTime::now_utc()).is_some()
    }

    /// Check a fix against the limits and regions.
    ///
    /// Returns the first reason the fix is blocked, or `None` if it passes.
    pub fn check(&self, position: &Position, now: OffsetDateTime) -> Option<BlockReason> {
        let limits = &self.limits;

        match position.accuracy {
            Some(accuracy) if accuracy <= limits.max_accuracy_m => {}
            other => return Some(BlockReason::InsufficientAccuracy(other)),
        }

        let (lat, lon) = (position.latitude, position.longitude);
        if !lat.is_finite()
            || !lon.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lon)
            || (lat == 0.0 && lon == 0.0)
        {
            return Some(BlockReason::InvalidCoordinates);
        }

        if let Some(altitude) = position.altitude
            && !(limits.min_altitude_m..=limits.max_altitude_m).contains(&altitude)
        {
            return Some(BlockReason::AltitudeOutOfRange(altitude));
        }

        if let Some(speed) = position.speed
            && speed > limits.max_speed_mps
        {
            return Some(BlockReason::SpeedOutOfRange(speed));
        }

        // A skew past the calendar's range means no upper bound.
        let too_new = time::Duration::try_from(limits.max_future_skew())
            .ok()
            .and_then(|skew| now.checked_add(skew))
            .is_some_and(|latest| position.timestamp > latest);
        if position.timestamp.unix_timestamp() < limits.min_timestamp || too_new {
            return Some(BlockReason::TimestampOutOfRange);
        }

        if self.geofence_enabled
            && self
                .regions
                .iter()
                .any(|region| region.active && region.shape.contains(lat, lon))
        {
            return Some(BlockReason::Geofenced);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::time::Duration;

    struct Prefs {
        enabled: bool,
        regions: Option<Vec<BlockedRegion>>,
    }

    impl Preferences for Prefs {
        fn geofence_enabled(&self) -> bool {
            self.enabled
        }

        fn scan_always_enabled(&self) -> bool {
            false
        }

        fn geofence_regions(&self) -> Result<Vec<BlockedRegion>> {
            self.regions
                .clone()
                .ok_or_else(|| Error::Preferences("store locked".to_string()))
        }
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
    }

    fn fix(lat: f64, lon: f64) -> Position {
        Position::builder("gps", lat, lon)
            .accuracy(10.0)
            .timestamp(now())
            .build()
    }

    #[test]
    fn test_plausible_fix_passes() {
        let list = LocationBlocklist::default();
        assert_eq!(list.check(&fix(52.52, 13.40), now()), None);
    }

    #[test]
    fn test_accuracy_limits() {
        let list = LocationBlocklist::default();

        let mut no_accuracy = fix(52.52, 13.40);
        no_accuracy.accuracy = None;
        assert_eq!(
            list.check(&no_accuracy, now()),
            Some(BlockReason::InsufficientAccuracy(None))
        );

        let mut coarse = fix(52.52, 13.40);
        coarse.accuracy = Some(900.0);
        assert!(matches!(
            list.check(&coarse, now()),
            Some(BlockReason::InsufficientAccuracy(Some(_)))
        ));
    }

    #[test]
    fn test_null_island_and_out_of_range() {
        let list = LocationBlocklist::default();
        assert_eq!(
            list.check(&fix(0.0, 0.0), now()),
            Some(BlockReason::InvalidCoordinates)
        );
        assert_eq!(
            list.check(&fix(91.0, 10.0), now()),
            Some(BlockReason::InvalidCoordinates)
        );
        assert_eq!(
            list.check(&fix(10.0, f64::NAN), now()),
            Some(BlockReason::InvalidCoordinates)
        );
    }

    #[test]
    fn test_altitude_and_speed_limits() {
        let list = LocationBlocklist::default();

        let mut high = fix(27.98, 86.92);
        high.altitude = Some(9500.0);
        assert_eq!(
            list.check(&high, now()),
            Some(BlockReason::AltitudeOutOfRange(9500.0))
        );

        let mut fast = fix(52.52, 13.40);
        fast.speed = Some(1000.0);
        assert_eq!(
            list.check(&fast, now()),
            Some(BlockReason::SpeedOutOfRange(1000.0))
        );
    }

    #[test]
    fn test_timestamp_limits() {
        let list = LocationBlocklist::default();

        let mut ancient = fix(52.52, 13.40);
        ancient.timestamp = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(
            list.check(&ancient, now()),
            Some(BlockReason::TimestampOutOfRange)
        );

        let mut future = fix(52.52, 13.40);
        future.timestamp = now() + Duration::from_secs(2 * 86_400);
        assert_eq!(
            list.check(&future, now()),
            Some(BlockReason::TimestampOutOfRange)
        );

        let mut slightly_ahead = fix(52.52, 13.40);
        slightly_ahead.timestamp = now() + Duration::from_secs(60);
        assert_eq!(list.check(&slightly_ahead, now()), None);
    }

    #[test]
    fn test_huge_future_skew_means_no_upper_bound() {
        let list = LocationBlocklist::new(LocationLimits {
            max_future_skew_ms: u64::MAX,
            ..LocationLimits::default()
        });

        let mut future = fix(52.52, 13.40);
        future.timestamp = now() + Duration::from_secs(10 * 365 * 86_400);
        assert_eq!(list.check(&future, now()), None);
        assert_eq!(list.check(&fix(52.52, 13.40), OffsetDateTime::now_utc()), None);
    }

    #[test]
    fn test_circle_region() {
        let shape = BlockedRegion::circle(52.52, 13.40, 1000.0).shape;
        assert!(shape.contains(52.52, 13.40));
        assert!(shape.contains(52.525, 13.40)); // ~550 m north
        assert!(!shape.contains(52.54, 13.40)); // ~2.2 km north
    }

    #[test]
    fn test_rect_region_includes_edges() {
        let shape = BlockedRegion::rect(10.0, 20.0, 11.0, 21.0).shape;
        assert!(shape.contains(10.5, 20.5));
        assert!(shape.contains(10.0, 20.0));
        assert!(!shape.contains(11.5, 20.5));
    }

    #[test]
    fn test_geofence_requires_enabled_and_active() {
        let mut list = LocationBlocklist::default();
        let home = fix(52.52, 13.40);

        list.set_regions(vec![BlockedRegion::circle(52.52, 13.40, 500.0)], false);
        assert_eq!(list.check(&home, now()), None);

        list.set_regions(
            vec![BlockedRegion::circle(52.52, 13.40, 500.0).with_active(false)],
            true,
        );
        assert_eq!(list.check(&home, now()), None);

        list.set_regions(vec![BlockedRegion::circle(52.52, 13.40, 500.0)], true);
        assert_eq!(list.check(&home, now()), Some(BlockReason::Geofenced));
        assert!(BlockReason::Geofenced.is_geofence());
        assert!(!BlockReason::InvalidCoordinates.is_geofence());
    }

    #[test]
    fn test_refresh_loads_preferences() {
        let mut list = LocationBlocklist::default();
        list.refresh(&Prefs {
            enabled: true,
            regions: Some(vec![BlockedRegion::rect(0.5, 0.5, 1.0, 1.0)]),
        });

        assert!(list.is_geofenced());
        assert_eq!(list.regions().len(), 1);
    }

    #[test]
    fn test_refresh_failure_keeps_previous_state() {
        let mut list = LocationBlocklist::default();
        list.set_regions(vec![BlockedRegion::circle(1.0, 1.0, 10.0)], true);

        list.refresh(&Prefs {
            enabled: false,
            regions: None,
        });

        assert!(list.is_geofenced());
        assert_eq!(list.regions().len(), 1);
    }

    #[test]
    fn test_region_deserializes_from_toml() {
        let region: BlockedRegion = toml::from_str(
            r#"
            shape = { shape = "circle", latitude = 1.5, longitude = 2.5, radius_m = 100.0 }
            "#,
        )
        .unwrap();
        assert!(region.active);
        assert!(region.shape.contains(1.5, 2.5));
    }
}
