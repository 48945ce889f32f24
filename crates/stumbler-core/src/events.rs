//! Scan event bus.
//!
//! Scanners publish [`ScanEvent`]s on an in-process broadcast channel.
//! Downstream consumers (log views, upload queues, UIs) subscribe through
//! [`EventDispatcher::subscribe`]. No ordering is guaranteed between a
//! location event and a Wi-Fi event raised by near-simultaneous callbacks;
//! every event carries its own timestamp so consumers can re-order.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use stumbler_types::{AccessPointObservation, Position};

/// What a location update reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSubject {
    /// A usable GPS fix was received.
    FixAcquired,
    /// The fix was lost, blocked, or the provider went away.
    FixLost,
    /// Satellite counts changed.
    StatusChanged,
}

/// Events published by the scanners.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ScanEvent {
    /// Location scanner state changed.
    LocationUpdated {
        /// What happened.
        subject: LocationSubject,
        /// When the event was published.
        timestamp: OffsetDateTime,
        /// The fix, for [`LocationSubject::FixAcquired`].
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
        /// Satellites used in the fix, for [`LocationSubject::StatusChanged`].
        #[serde(skip_serializing_if = "Option::is_none")]
        fixes_used: Option<u32>,
        /// Satellites in view, for [`LocationSubject::StatusChanged`].
        #[serde(skip_serializing_if = "Option::is_none")]
        satellites_visible: Option<u32>,
    },
    /// A Wi-Fi scan produced at least one access point that passed the filters.
    WifiScanCompleted {
        /// Filtered, canonicalized observations.
        results: Vec<AccessPointObservation>,
        /// When the batch was processed.
        timestamp: OffsetDateTime,
    },
}

impl ScanEvent {
    /// A fix-acquired event carrying the position.
    pub fn fix_acquired(position: Position) -> Self {
        ScanEvent::LocationUpdated {
            subject: LocationSubject::FixAcquired,
            timestamp: OffsetDateTime::now_utc(),
            position: Some(position),
            fixes_used: None,
            satellites_visible: None,
        }
    }

    /// A fix-lost event.
    pub fn fix_lost() -> Self {
        ScanEvent::LocationUpdated {
            subject: LocationSubject::FixLost,
            timestamp: OffsetDateTime::now_utc(),
            position: None,
            fixes_used: None,
            satellites_visible: None,
        }
    }

    /// A satellite status event.
    pub fn status_changed(fixes_used: u32, satellites_visible: u32) -> Self {
        ScanEvent::LocationUpdated {
            subject: LocationSubject::StatusChanged,
            timestamp: OffsetDateTime::now_utc(),
            position: None,
            fixes_used: Some(fixes_used),
            satellites_visible: Some(satellites_visible),
        }
    }

    /// The location subject, if this is a location event.
    pub fn location_subject(&self) -> Option<LocationSubject> {
        match self {
            ScanEvent::LocationUpdated { subject, .. } => Some(*subject),
            _ => None,
        }
    }

    /// When the event was published.
    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            ScanEvent::LocationUpdated { timestamp, .. }
            | ScanEvent::WifiScanCompleted { timestamp, .. } => *timestamp,
        }
    }
}

/// Sender for scan events.
pub type EventSender = broadcast::Sender<ScanEvent>;

/// Receiver for scan events.
pub type EventReceiver = broadcast::Receiver<ScanEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher holding up to `capacity` unread
    /// events per receiver (at least one).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: ScanEvent) {
        // Nobody listening is fine; the event is dropped.
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_delivers_to_all_subscribers() {
        let dispatcher = EventDispatcher::default();
        let mut rx1 = dispatcher.subscribe();
        let mut rx2 = dispatcher.subscribe();
        assert_eq!(dispatcher.receiver_count(), 2);

        dispatcher.send(ScanEvent::fix_lost());

        assert_eq!(
            rx1.try_recv().unwrap().location_subject(),
            Some(LocationSubject::FixLost)
        );
        assert_eq!(
            rx2.try_recv().unwrap().location_subject(),
            Some(LocationSubject::FixLost)
        );
    }

    #[test]
    fn test_send_without_receivers_is_ignored() {
        let dispatcher = EventDispatcher::new(4);
        dispatcher.send(ScanEvent::fix_lost());
        assert_eq!(dispatcher.receiver_count(), 0);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let dispatcher = EventDispatcher::new(0);
        let mut rx = dispatcher.subscribe();
        dispatcher.send(ScanEvent::fix_lost());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_status_event_serialization() {
        let json = serde_json::to_value(ScanEvent::status_changed(3, 5)).unwrap();
        assert_eq!(json["type"], "location_updated");
        assert_eq!(json["subject"], "status_changed");
        assert_eq!(json["fixes_used"], 3);
        assert_eq!(json["satellites_visible"], 5);
        assert!(json.get("position").is_none());
    }

    #[test]
    fn test_wifi_event_has_no_location_subject() {
        let event = ScanEvent::WifiScanCompleted {
            results: Vec::new(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
        };
        assert_eq!(event.location_subject(), None);
        assert_eq!(event.timestamp(), OffsetDateTime::UNIX_EPOCH);
    }
}
