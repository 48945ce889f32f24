//! Wi-Fi scanning.
//!
//! [`WifiScanner`] drives a periodic scan timer, canonicalizes and filters
//! scan results, tracks every access point seen since it was created, and
//! publishes filtered batches on the event bus.
//!
//! # Timer
//!
//! While armed, the timer fires every `wifi_scan_interval` (first tick
//! immediately) and asks the radio to scan. The timer runs as a tokio task.
//!
//! Start, stop, arm, disarm and each tick are serialized by a reentrant
//! control lock, so a tick that passed its cancellation check finishes its
//! scan request before [`WifiScanner::stop`] returns, and no scan is issued
//! afterwards. The state mutex is never held across a hardware call, and the
//! control lock is reentrant, so the host may deliver notifications inline
//! from inside any [`WifiHardware`] method.
//!
//! # Passive bursts
//!
//! In passive mode each armed timer may issue `passive_max_scans_per_fix + 1`
//! scans. The next tick disarms it and the scanner waits, still reporting
//! [`ScannerStatus::Active`], until [`WifiScanner::on_passive_fix`] grants a
//! new burst.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashSet;
use parking_lot::{Mutex, ReentrantMutex};
use time::OffsetDateTime;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stumbler_types::{AccessPointObservation, Bssid, OperatingMode, RawScanResult, ScannerStatus};

use crate::blocklist::{BssidBlocklist, SsidBlocklist};
use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::events::{EventDispatcher, ScanEvent};
use crate::traits::{Preferences, WifiHardware, WifiListener};

/// Shortest timer period; `tokio::time::interval` rejects zero.
const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

/// An armed periodic scan.
struct ScanTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct WifiState {
    started: bool,
    mode: OperatingMode,
    runtime: Option<Handle>,
    timer: Option<ScanTimer>,
    lock_held: bool,
    /// The timer was disarmed by the passive burst limit, not by the radio.
    burst_exhausted: bool,
}

struct WifiInner {
    hardware: Arc<dyn WifiHardware>,
    preferences: Arc<dyn Preferences>,
    events: EventDispatcher,
    bssid_blocklist: BssidBlocklist,
    ssid_blocklist: SsidBlocklist,
    scan_interval: Duration,
    max_passive_scans: u32,
    debug: bool,
    control: ReentrantMutex<()>,
    state: Mutex<WifiState>,
    seen: DashSet<Bssid>,
    visible: AtomicUsize,
    scan_requests: AtomicU64,
}

/// Wireless scan component.
///
/// Cheap to share: wrap in an [`Arc`] and hand the same scanner to the
/// coordinator and to the platform's notification plumbing.
pub struct WifiScanner {
    inner: Arc<WifiInner>,
}

impl std::fmt::Debug for WifiScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiScanner")
            .field("status", &self.status())
            .field("ap_count", &self.ap_count())
            .field("visible_ap_count", &self.visible_ap_count())
            .finish()
    }
}

impl WifiScanner {
    /// Create a Wi-Fi scanner with blocklists built from `config`.
    pub fn new(
        config: &ScanConfig,
        hardware: Arc<dyn WifiHardware>,
        preferences: Arc<dyn Preferences>,
        events: EventDispatcher,
    ) -> Self {
        Self::with_blocklists(
            config,
            hardware,
            preferences,
            events,
            BssidBlocklist::from_config(&config.blocklist),
            SsidBlocklist::from_config(&config.blocklist),
        )
    }

    /// Create a Wi-Fi scanner with explicit blocklists.
    pub fn with_blocklists(
        config: &ScanConfig,
        hardware: Arc<dyn WifiHardware>,
        preferences: Arc<dyn Preferences>,
        events: EventDispatcher,
        bssid_blocklist: BssidBlocklist,
        ssid_blocklist: SsidBlocklist,
    ) -> Self {
        Self {
            inner: Arc::new(WifiInner {
                hardware,
                preferences,
                events,
                bssid_blocklist,
                ssid_blocklist,
                scan_interval: config.wifi_scan_interval().max(MIN_SCAN_INTERVAL),
                max_passive_scans: config.passive_max_scans_per_fix,
                debug: config.debug,
                control: ReentrantMutex::new(()),
                state: Mutex::new(WifiState::default()),
                seen: DashSet::new(),
                visible: AtomicUsize::new(0),
                scan_requests: AtomicU64::new(0),
            }),
        }
    }

    /// Start scanning.
    ///
    /// Registers for scan-completed notifications (and radio-state
    /// notifications unless "always scan" is set). The timer is armed
    /// immediately if "always scan" is set or the radio is on; otherwise the
    /// scanner waits for [`WifiListener::on_radio_state_changed`].
    ///
    /// Calling `start` while started is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a tokio runtime.
    pub fn start(&self, mode: OperatingMode) -> Result<()> {
        let inner = &self.inner;
        let _control = inner.control.lock();
        {
            let mut state = inner.state.lock();
            if state.started {
                debug!("Wi-Fi scanner already started");
                return Ok(());
            }

            let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
            state.started = true;
            state.mode = mode;
            state.runtime = Some(runtime);
        }

        let scan_always = inner.preferences.scan_always_enabled();
        info!(
            "Starting Wi-Fi scanner in {} mode (scan always: {})",
            mode, scan_always
        );

        if let Err(e) = inner.hardware.register_notifications(!scan_always) {
            warn!("Failed to register Wi-Fi notifications: {}", e);
        }

        if scan_always || inner.hardware.is_enabled() {
            inner.activate();
        }

        Ok(())
    }

    /// Stop scanning.
    ///
    /// Unregisters notifications, disarms the timer, releases the radio lock
    /// and resets the visible count. The set of access points seen so far is
    /// kept. Safe to call repeatedly and from any thread.
    pub fn stop(&self) {
        let inner = &self.inner;
        let _control = inner.control.lock();
        let was_started = std::mem::take(&mut inner.state.lock().started);
        if was_started {
            inner.hardware.unregister_notifications();
        }

        inner.deactivate();

        let mut state = inner.state.lock();
        state.burst_exhausted = false;
        state.runtime = None;
        if was_started {
            info!("Wi-Fi scanner stopped");
        }
    }

    /// A GPS fix arrived in passive mode.
    ///
    /// Re-arms the timer if the previous burst ran out. Does nothing in
    /// active mode, while stopped, while a burst is still running, or while
    /// the timer is off because the radio is disabled.
    pub fn on_passive_fix(&self) {
        let inner = &self.inner;
        let _control = inner.control.lock();
        {
            let state = inner.state.lock();
            if !state.started || !state.mode.is_passive() || !state.burst_exhausted {
                return;
            }
        }
        debug!("Passive fix received, re-arming Wi-Fi scan");
        inner.activate();
    }

    /// Current status.
    pub fn status(&self) -> ScannerStatus {
        let state = self.inner.state.lock();
        if !state.started {
            ScannerStatus::Idle
        } else if state.timer.is_none() && !state.burst_exhausted {
            ScannerStatus::RadioDisabled
        } else {
            ScannerStatus::Active
        }
    }

    /// Whether the periodic timer is currently armed.
    pub fn is_timer_armed(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    /// Number of distinct access points seen since the scanner was created.
    pub fn ap_count(&self) -> usize {
        self.inner.seen.len()
    }

    /// Number of access points kept from the most recent scan.
    pub fn visible_ap_count(&self) -> usize {
        self.inner.visible.load(Ordering::Relaxed)
    }

    /// Whether the access point has been seen.
    pub fn has_seen(&self, bssid: &Bssid) -> bool {
        self.inner.seen.contains(bssid)
    }

    /// Number of scan requests issued to the radio.
    pub fn scan_count(&self) -> u64 {
        self.inner.scan_requests.load(Ordering::Relaxed)
    }
}

impl WifiListener for WifiScanner {
    fn on_scan_results_available(&self) {
        let inner = &self.inner;
        if !inner.state.lock().started {
            debug!("Ignoring scan results while stopped");
            return;
        }

        let raw = match inner.hardware.scan_results() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read scan results: {}", e);
                return;
            }
        };

        let timestamp = OffsetDateTime::now_utc();
        let results: Vec<AccessPointObservation> = raw
            .into_iter()
            .filter_map(|result| inner.accept(result, timestamp))
            .collect();

        inner.visible.store(results.len(), Ordering::Relaxed);

        if results.is_empty() {
            return;
        }
        debug!("Publishing {} access point(s)", results.len());
        inner
            .events
            .send(ScanEvent::WifiScanCompleted { results, timestamp });
    }

    fn on_radio_state_changed(&self, enabled: bool) {
        let inner = &self.inner;
        let _control = inner.control.lock();
        if !inner.state.lock().started {
            return;
        }

        debug!("Wi-Fi radio state changed: enabled={}", enabled);
        if enabled {
            inner.activate();
        } else {
            inner.deactivate();
            inner.state.lock().burst_exhausted = false;
        }
    }
}

impl WifiInner {
    /// Canonicalize and filter one raw result, recording it as seen if kept.
    fn accept(&self, raw: RawScanResult, timestamp: OffsetDateTime) -> Option<AccessPointObservation> {
        let bssid = match Bssid::parse(&raw.bssid) {
            Ok(bssid) => bssid,
            Err(e) => {
                warn!("Blocked BSSID: {}", e);
                return None;
            }
        };

        if self.bssid_blocklist.contains(&bssid) {
            warn!("Blocked BSSID: {} (SSID \"{}\")", bssid, raw.ssid);
            return None;
        }
        if self.ssid_blocklist.contains(&raw.ssid) {
            warn!("Blocked SSID: \"{}\" ({})", raw.ssid, bssid);
            return None;
        }

        self.seen.insert(bssid);
        Some(AccessPointObservation::from_raw(raw, bssid, timestamp))
    }

    /// Arm the periodic timer. Caller holds the control lock.
    fn activate(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            if state.timer.is_some() {
                return;
            }
            let Some(runtime) = state.runtime.clone() else {
                return;
            };

            debug!("Activate periodic scan");
            state.burst_exhausted = false;

            let cancel = CancellationToken::new();
            let token = cancel.clone();
            let weak = Arc::downgrade(self);
            let period = self.scan_interval;
            let mode = state.mode;

            // The first tick waits on the control lock until this call returns.
            let task = runtime.spawn(async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut passive_scans = 0u32;

                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            if !Self::tick(&weak, &token, mode, &mut passive_scans) {
                                break;
                            }
                        }
                    }
                }
            });

            state.timer = Some(ScanTimer { cancel, task });
        }

        match self.hardware.acquire_scan_lock() {
            Ok(()) => self.state.lock().lock_held = true,
            Err(e) => warn!("Scanning without radio lock: {}", e),
        }
    }

    /// Disarm the timer and release the radio lock. Caller holds the control lock.
    fn deactivate(&self) {
        let (timer, release) = {
            let mut state = self.state.lock();
            (state.timer.take(), std::mem::take(&mut state.lock_held))
        };

        if let Some(timer) = timer {
            debug!("Deactivate periodic scan");
            timer.cancel.cancel();
            timer.task.abort();
            self.visible.store(0, Ordering::Relaxed);
        }

        if release {
            self.hardware.release_scan_lock();
        }
    }

    /// One timer tick. Returns `false` when the timer should exit.
    fn tick(
        weak: &Weak<Self>,
        token: &CancellationToken,
        mode: OperatingMode,
        passive_scans: &mut u32,
    ) -> bool {
        let Some(inner) = weak.upgrade() else {
            return false;
        };
        let _control = inner.control.lock();
        if token.is_cancelled() {
            return false;
        }

        if mode.is_passive() {
            let count = *passive_scans;
            *passive_scans += 1;
            if count > inner.max_passive_scans {
                *passive_scans = 0;
                info!("Passive scan burst used up, waiting for the next GPS fix");
                inner.state.lock().burst_exhausted = true;
                inner.deactivate();
                return false;
            }
        }

        if inner.debug {
            debug!("Wi-Fi scanning timer fired");
        }
        inner.scan_requests.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = inner.hardware.start_scan() {
            debug!("Scan request refused: {}", e);
        }
        true
    }
}
