//! Peer scanning control
//!
//! Starts and stops the platform scan and forwards its notifications as
//! communicator events. Found peers accumulate in the device registry for
//! the caller to pick from.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use serialink_core::{
    Event, EventDispatcher, PeerDevice, RadioAdapter, Result, ScanEvent, SerialinkError,
};

use crate::registry::DeviceRegistry;

// ----------------------------------------------------------------------------
// Discovery Controller
// ----------------------------------------------------------------------------

/// Controls peer scanning and surfaces found-peer / scan-finished events
pub struct DiscoveryController {
    radio: Arc<dyn RadioAdapter>,
    registry: Arc<DeviceRegistry>,
    dispatcher: EventDispatcher,
    scanning: Arc<AtomicBool>,
}

impl DiscoveryController {
    /// Create a controller over the given radio and registry
    pub fn new(
        radio: Arc<dyn RadioAdapter>,
        registry: Arc<DeviceRegistry>,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            radio,
            registry,
            dispatcher,
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Peers already bonded with this device
    ///
    /// Fails with `Unsupported` (also emitted as an event) when no radio
    /// adapter exists.
    pub fn paired_devices(&self) -> Result<Vec<PeerDevice>> {
        match self.registry.paired_devices() {
            Ok(devices) => Ok(devices),
            Err(err) => {
                self.dispatcher.publish(Event::RadioUnavailable);
                Err(err)
            }
        }
    }

    /// Whether a radio adapter is present and turned on
    pub fn radio_enabled(&self) -> bool {
        self.radio.is_present() && self.radio.is_enabled()
    }

    /// Start scanning for nearby peers
    ///
    /// Idempotent while a scan is active: the radio is not started a second
    /// time and the call reports success. Each found peer is surfaced once
    /// as a `PeerFound` event (repeated broadcasts included); completion
    /// surfaces exactly one `DiscoveryFinished`.
    pub async fn start_scan(&self) -> Result<()> {
        if !self.radio.is_present() {
            self.dispatcher.publish(Event::RadioUnavailable);
            return Err(SerialinkError::Unsupported);
        }
        if !self.radio.is_enabled() {
            self.dispatcher.publish(Event::RadioDisabled);
            return Err(SerialinkError::Disabled);
        }
        if self.scanning.swap(true, Ordering::SeqCst) {
            debug!("scan already active");
            return Ok(());
        }

        self.registry.clear_discovered();

        // Subscribe before starting the radio so early finds are not missed.
        let mut scan_events = self.radio.subscribe_scan_events();
        if let Err(err) = self.radio.start_scan().await {
            self.scanning.store(false, Ordering::SeqCst);
            return Err(err);
        }
        info!("peer scan started");

        let registry = Arc::clone(&self.registry);
        let dispatcher = self.dispatcher.clone();
        let scanning = Arc::clone(&self.scanning);
        tokio::spawn(async move {
            while let Some(event) = scan_events.recv().await {
                match event {
                    ScanEvent::PeerFound(peer) => {
                        debug!("peer found: {}", peer);
                        registry.record_discovered(peer.clone());
                        dispatcher.publish(Event::PeerFound(peer));
                    }
                    ScanEvent::Finished => {
                        dispatcher.publish(Event::DiscoveryFinished);
                        break;
                    }
                }
            }
            scanning.store(false, Ordering::SeqCst);
            info!("peer scan finished");
        });

        Ok(())
    }

    /// Cancel an active scan; a no-op when idle
    pub async fn stop_scan(&self) {
        if self.scanning.load(Ordering::SeqCst) {
            self.radio.cancel_scan().await;
        }
    }

    /// Whether a scan is currently active
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }
}
