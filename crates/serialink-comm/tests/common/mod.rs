//! In-memory radio and transport doubles for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use uuid::Uuid;

use serialink_comm::Communicator;
use serialink_core::{
    CommunicatorConfig, Event, LinkEvent, PeerAddr, PeerDevice, RadioAdapter, Result, ScanEvent,
    StreamPair, StreamTransport,
};

// ----------------------------------------------------------------------------
// Test Helpers
// ----------------------------------------------------------------------------

pub fn peer(name: &str, last: u8) -> PeerDevice {
    PeerDevice::new(PeerAddr::new([0, 0, 0, 0, 0, last]), name)
}

/// Observer closure plus the channel its events land on
pub fn event_channel() -> (impl FnMut(Event) + Send, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event| {
            let _ = tx.send(event);
        },
        rx,
    )
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Assert that no further event arrives within a short window
pub async fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<Event>) {
    if let Ok(Some(event)) = timeout(Duration::from_millis(150), rx.recv()).await {
        panic!("unexpected event: {:?}", event);
    }
}

// ----------------------------------------------------------------------------
// Memory Radio
// ----------------------------------------------------------------------------

/// Scriptable stand-in for the platform radio
pub struct MemoryRadio {
    present: bool,
    enabled: AtomicBool,
    bonded: Mutex<Vec<PeerDevice>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ScanEvent>>>,
    scan_starts: AtomicUsize,
    scan_cancels: AtomicUsize,
}

impl MemoryRadio {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            present: true,
            enabled: AtomicBool::new(true),
            bonded: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            scan_starts: AtomicUsize::new(0),
            scan_cancels: AtomicUsize::new(0),
        })
    }

    /// Radio with no adapter at all
    pub fn absent() -> Arc<Self> {
        Arc::new(Self {
            present: false,
            enabled: AtomicBool::new(false),
            bonded: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            scan_starts: AtomicUsize::new(0),
            scan_cancels: AtomicUsize::new(0),
        })
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn add_bonded(&self, peer: PeerDevice) {
        self.bonded.lock().unwrap().push(peer);
    }

    pub fn scan_starts(&self) -> usize {
        self.scan_starts.load(Ordering::SeqCst)
    }

    pub fn scan_cancels(&self) -> usize {
        self.scan_cancels.load(Ordering::SeqCst)
    }

    pub fn emit_peer_found(&self, peer: PeerDevice) {
        self.broadcast(ScanEvent::PeerFound(peer));
    }

    pub fn finish_scan(&self) {
        self.broadcast(ScanEvent::Finished);
    }

    fn broadcast(&self, event: ScanEvent) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl RadioAdapter for MemoryRadio {
    fn is_present(&self) -> bool {
        self.present
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn bonded_peers(&self) -> Vec<PeerDevice> {
        self.bonded.lock().unwrap().clone()
    }

    async fn start_scan(&self) -> Result<()> {
        self.scan_starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel_scan(&self) {
        self.scan_cancels.fetch_add(1, Ordering::SeqCst);
        self.broadcast(ScanEvent::Finished);
    }

    fn subscribe_scan_events(&self) -> mpsc::UnboundedReceiver<ScanEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}

// ----------------------------------------------------------------------------
// Memory Transport
// ----------------------------------------------------------------------------

/// Stream transport over in-memory duplex pipes
///
/// `open` hands the session one end and queues the far end for the test
/// to drive.
pub struct MemoryTransport {
    link_subscribers: Mutex<Vec<mpsc::UnboundedSender<LinkEvent>>>,
    opened_tx: mpsc::UnboundedSender<DuplexStream>,
    fail_opens: AtomicBool,
    open_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl MemoryTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<DuplexStream>) {
        let (opened_tx, opened_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                link_subscribers: Mutex::new(Vec::new()),
                opened_tx,
                fail_opens: AtomicBool::new(false),
                open_gates: Mutex::new(VecDeque::new()),
            }),
            opened_rx,
        )
    }

    /// Make every open fail until reset
    pub fn set_fail_opens(&self, fail: bool) {
        self.fail_opens.store(fail, Ordering::SeqCst);
    }

    /// Hold the next open until the returned sender fires
    pub fn gate_next_open(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.open_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn link_up(&self) {
        self.broadcast(LinkEvent::Up);
    }

    pub fn link_down(&self) {
        self.broadcast(LinkEvent::Down);
    }

    fn broadcast(&self, event: LinkEvent) {
        self.link_subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event).is_ok());
    }
}

#[async_trait]
impl StreamTransport for MemoryTransport {
    async fn open(&self, _peer: &PeerDevice, _service: Uuid) -> io::Result<StreamPair> {
        let gate = self.open_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_opens.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "open refused",
            ));
        }
        let (local, remote) = tokio::io::duplex(4096);
        let (input, output) = tokio::io::split(local);
        let _ = self.opened_tx.send(remote);
        Ok(StreamPair {
            input: Box::new(input),
            output: Box::new(output),
        })
    }

    fn subscribe_link_events(&self) -> mpsc::UnboundedReceiver<LinkEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.link_subscribers.lock().unwrap().push(tx);
        rx
    }
}

// ----------------------------------------------------------------------------
// Communicator Harness
// ----------------------------------------------------------------------------

/// A communicator wired against the in-memory doubles, observer attached
pub struct Harness {
    pub comm: Communicator,
    pub radio: Arc<MemoryRadio>,
    pub transport: Arc<MemoryTransport>,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub opened: mpsc::UnboundedReceiver<DuplexStream>,
}

pub fn harness() -> Harness {
    harness_with(MemoryRadio::new())
}

pub fn harness_with(radio: Arc<MemoryRadio>) -> Harness {
    let (transport, opened) = MemoryTransport::new();
    let comm = Communicator::new(
        Arc::clone(&radio) as Arc<dyn RadioAdapter>,
        Arc::clone(&transport) as Arc<dyn StreamTransport>,
        CommunicatorConfig::default(),
    );
    let (observer, events) = event_channel();
    comm.set_observer(observer);
    Harness {
        comm,
        radio,
        transport,
        events,
        opened,
    }
}

impl Harness {
    /// Drive a full connect: attempt, open, link-up, connected. Returns the
    /// far end of the stream for the test to read and write.
    pub async fn connect(&mut self) -> DuplexStream {
        self.comm.connect_to(peer("probe", 1));
        assert!(matches!(
            next_event(&mut self.events).await,
            Event::ConnectAttempt
        ));
        let remote = timeout(Duration::from_secs(2), self.opened.recv())
            .await
            .expect("timed out waiting for stream open")
            .expect("transport dropped");
        self.transport.link_up();
        assert!(matches!(
            next_event(&mut self.events).await,
            Event::Connected
        ));
        remote
    }
}
