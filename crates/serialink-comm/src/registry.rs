//! Paired and discovered device bookkeeping

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serialink_core::{PeerDevice, RadioAdapter, Result, SerialinkError};

// ----------------------------------------------------------------------------
// Device Registry
// ----------------------------------------------------------------------------

/// Tracks peers bonded with this device and peers found while scanning
pub struct DeviceRegistry {
    radio: Arc<dyn RadioAdapter>,
    discovered: Mutex<Vec<PeerDevice>>,
}

impl DeviceRegistry {
    /// Create a registry backed by the given radio
    pub fn new(radio: Arc<dyn RadioAdapter>) -> Self {
        Self {
            radio,
            discovered: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PeerDevice>> {
        self.discovered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Peers already bonded with this device
    pub fn paired_devices(&self) -> Result<Vec<PeerDevice>> {
        if !self.radio.is_present() {
            return Err(SerialinkError::Unsupported);
        }
        Ok(self.radio.bonded_peers())
    }

    /// Record a peer surfaced by the active scan
    ///
    /// Repeated broadcasts of the same peer are kept as they arrive; the
    /// list accumulates, it does not deduplicate.
    pub fn record_discovered(&self, peer: PeerDevice) {
        self.lock().push(peer);
    }

    /// Peers found since the current scan started
    pub fn discovered_devices(&self) -> Vec<PeerDevice> {
        self.lock().clone()
    }

    /// Forget accumulated finds; called when a new scan starts
    pub fn clear_discovered(&self) {
        self.lock().clear();
    }
}
