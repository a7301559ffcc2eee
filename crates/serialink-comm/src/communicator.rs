//! The communicator facade
//!
//! One explicit object wires discovery, the connection session, the record
//! log, and event dispatch together. The composition root constructs it
//! once and passes it by handle to consumers; there is no process-wide
//! instance.

use std::sync::Arc;

use tokio::task::JoinHandle;

use serialink_core::{
    CommunicatorConfig, ConnectionState, EventDispatcher, EventObserver, LinkEvent, PeerDevice,
    RadioAdapter, RecordLog, Result, StreamTransport,
};

use crate::discovery::DiscoveryController;
use crate::registry::DeviceRegistry;
use crate::session::ConnectionSession;

// ----------------------------------------------------------------------------
// Communicator
// ----------------------------------------------------------------------------

/// Peer discovery, one stream session, and the received-record log behind
/// a single handle
pub struct Communicator {
    dispatcher: EventDispatcher,
    log: Arc<RecordLog>,
    registry: Arc<DeviceRegistry>,
    discovery: DiscoveryController,
    session: ConnectionSession,
    link_pump: JoinHandle<()>,
}

impl Communicator {
    /// Wire a communicator against platform radio and transport
    /// implementations
    ///
    /// Must be called from within a Tokio runtime: the event delivery task
    /// and the link-notification pump are spawned here.
    pub fn new(
        radio: Arc<dyn RadioAdapter>,
        transport: Arc<dyn StreamTransport>,
        config: CommunicatorConfig,
    ) -> Self {
        let dispatcher = EventDispatcher::new();
        let log = Arc::new(RecordLog::with_capacity(config.log_capacity));
        let registry = Arc::new(DeviceRegistry::new(Arc::clone(&radio)));
        let discovery =
            DiscoveryController::new(radio, Arc::clone(&registry), dispatcher.clone());
        let session = ConnectionSession::new(
            Arc::clone(&transport),
            dispatcher.clone(),
            Arc::clone(&log),
            config,
        );

        // Link liveness arrives out-of-band from the platform; feed it to
        // the session on its own task.
        let mut link_events = transport.subscribe_link_events();
        let pump_session = session.clone();
        let link_pump = tokio::spawn(async move {
            while let Some(event) = link_events.recv().await {
                match event {
                    LinkEvent::Up => pump_session.notify_link_up(),
                    LinkEvent::Down => pump_session.notify_link_down(),
                }
            }
        });

        Self {
            dispatcher,
            log,
            registry,
            discovery,
            session,
            link_pump,
        }
    }

    /// Register the event observer, replacing any previous one
    pub fn set_observer(&self, observer: impl EventObserver + 'static) {
        self.dispatcher.set_observer(observer);
    }

    /// Deregister the current event observer
    pub fn clear_observer(&self) {
        self.dispatcher.clear_observer();
    }

    /// Peers already bonded with this device
    pub fn paired_devices(&self) -> Result<Vec<PeerDevice>> {
        self.discovery.paired_devices()
    }

    /// Peers found since the current scan started
    pub fn discovered_devices(&self) -> Vec<PeerDevice> {
        self.registry.discovered_devices()
    }

    /// Whether a radio adapter is present and turned on
    pub fn radio_enabled(&self) -> bool {
        self.discovery.radio_enabled()
    }

    /// Start scanning for nearby peers
    pub async fn start_scan(&self) -> Result<()> {
        self.discovery.start_scan().await?;
        self.session.mark_discovering();
        Ok(())
    }

    /// Cancel an active scan; a no-op when idle
    pub async fn stop_scan(&self) {
        self.discovery.stop_scan().await;
    }

    /// Whether a scan is currently active
    pub fn is_scanning(&self) -> bool {
        self.discovery.is_scanning()
    }

    /// Begin connecting to `peer`; progress arrives as events
    pub fn connect_to(&self, peer: PeerDevice) {
        self.session.connect_to(peer);
    }

    /// Send bytes to the connected peer; a no-op unless connected
    pub async fn write(&self, data: &[u8]) {
        self.session.write(data).await;
    }

    /// Tear down the session; safe from any state
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// Current session state
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// Whether a confirmed-live connection is established
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Shared handle to the received-record log, for export and clearing
    /// by the record consumer
    pub fn records(&self) -> Arc<RecordLog> {
        Arc::clone(&self.log)
    }
}

impl Drop for Communicator {
    fn drop(&mut self) {
        self.link_pump.abort();
    }
}
