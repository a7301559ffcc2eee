//! Peer-discovery radio abstraction
//!
//! The communicator consumes a platform radio through this seam; it never
//! implements one. Implementations live with the platform glue (or in
//! test harnesses).

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::PeerDevice;

// ----------------------------------------------------------------------------
// Scan Notifications
// ----------------------------------------------------------------------------

/// Notification surfaced by the platform radio during an active scan
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A nearby stream-capable peer broadcast its presence
    PeerFound(PeerDevice),
    /// The scan ran to completion or was cancelled
    Finished,
}

// ----------------------------------------------------------------------------
// Radio Adapter
// ----------------------------------------------------------------------------

/// Platform peer-discovery radio
#[async_trait]
pub trait RadioAdapter: Send + Sync {
    /// Whether any radio adapter exists on this device
    fn is_present(&self) -> bool;

    /// Whether the adapter is turned on
    fn is_enabled(&self) -> bool;

    /// Peers already bonded with this device
    fn bonded_peers(&self) -> Vec<PeerDevice>;

    /// Start a scan for nearby peers
    async fn start_scan(&self) -> Result<()>;

    /// Cancel an active scan
    ///
    /// Implementations must surface [`ScanEvent::Finished`] to subscribers
    /// when a scan is cancelled, exactly as for natural completion.
    async fn cancel_scan(&self);

    /// Subscribe to found-peer and scan-finished notifications
    fn subscribe_scan_events(&self) -> mpsc::UnboundedReceiver<ScanEvent>;
}
