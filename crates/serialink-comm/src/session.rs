//! Connection session lifecycle and the background read loop
//!
//! One session covers one attempted-through-closed connection to a single
//! peer. The stream open runs on its own task so callers never block; the
//! read loop starts only once the opened stream and the external link-up
//! confirmation are both present, in whichever order they arrive.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use serialink_core::{
    CommunicatorConfig, ConnectionState, Event, EventDispatcher, LineFramer, PeerDevice,
    RecordLog, StreamPair, StreamTransport,
};

type SharedWriter = Arc<tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

// ----------------------------------------------------------------------------
// Connection Session
// ----------------------------------------------------------------------------

/// Owns the active stream: connect attempts, the write path, the read
/// loop, and the lifecycle state machine
///
/// Cheap to clone; every handle drives the same session.
#[derive(Clone)]
pub struct ConnectionSession {
    transport: Arc<dyn StreamTransport>,
    config: CommunicatorConfig,
    shared: Arc<SessionShared>,
}

struct SessionShared {
    dispatcher: EventDispatcher,
    log: Arc<RecordLog>,
    inner: Mutex<SessionInner>,
}

struct SessionInner {
    state: ConnectionState,
    /// Bumped on every connect attempt and teardown; stale connect results
    /// and read loops check it before touching the session.
    epoch: u64,
    /// Link-up confirmation latch for the current attempt
    link_up: bool,
    /// Stream opened but not yet confirmed live
    parked: Option<StreamPair>,
    writer: Option<SharedWriter>,
    shutdown: Option<watch::Sender<bool>>,
    read_task: Option<JoinHandle<()>>,
}

impl ConnectionSession {
    /// Create an idle session over the given transport
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        dispatcher: EventDispatcher,
        log: Arc<RecordLog>,
        config: CommunicatorConfig,
    ) -> Self {
        Self {
            transport,
            config,
            shared: Arc::new(SessionShared {
                dispatcher,
                log,
                inner: Mutex::new(SessionInner {
                    state: ConnectionState::Idle,
                    epoch: 0,
                    link_up: false,
                    parked: None,
                    writer: None,
                    shutdown: None,
                    read_task: None,
                }),
            }),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    /// Whether a confirmed-live connection is established
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Note that a scan is running before any connect attempt
    pub(crate) fn mark_discovering(&self) {
        let mut inner = self.shared.lock();
        if inner.state == ConnectionState::Idle {
            inner.state = ConnectionState::Discovering;
        }
    }

    /// Begin connecting to `peer`
    ///
    /// Emits `ConnectAttempt` and opens the stream off the caller's
    /// context; the outcome arrives as `Connected` or `ConnectFailed`.
    /// Any live link is replaced without announcement, and a connect issued
    /// after `Failed` or `Closed` re-enters the attempt path. Must be
    /// called from within a Tokio runtime.
    pub fn connect_to(&self, peer: PeerDevice) {
        let epoch = {
            let mut inner = self.shared.lock();
            SessionShared::release_resources(&mut inner);
            inner.state = ConnectionState::ConnectAttempting;
            self.shared.dispatcher.publish(Event::ConnectAttempt);
            inner.epoch
        };
        info!("connecting to {}", peer);

        let transport = Arc::clone(&self.transport);
        let shared = Arc::clone(&self.shared);
        let service = self.config.service_id;
        let read_buffer_size = self.config.read_buffer_size;
        tokio::spawn(async move {
            match transport.open(&peer, service).await {
                Ok(pair) => {
                    SessionShared::stream_opened(&shared, pair, epoch, read_buffer_size)
                }
                Err(err) => shared.open_failed(epoch, err),
            }
        });
    }

    /// External confirmation that the link is live
    ///
    /// The read loop starts exactly once, when both the opened stream and
    /// this confirmation have arrived.
    pub fn notify_link_up(&self) {
        let mut inner = self.shared.lock();
        inner.link_up = true;
        if inner.state == ConnectionState::ConnectAttempting && inner.parked.is_some() {
            SessionShared::begin_reading(&self.shared, &mut inner, self.config.read_buffer_size);
        }
    }

    /// External notification that the link died
    ///
    /// While connected this tears the session down, emitting exactly one
    /// `LinkLost` followed by one `Closed`; otherwise it only clears the
    /// liveness latch.
    pub fn notify_link_down(&self) {
        self.shared.handle_link_loss(None);
    }

    /// Send bytes to the connected peer
    ///
    /// A no-op in any state other than `Connected`; never fails to the
    /// caller. A write error is treated as loss of the link.
    pub async fn write(&self, data: &[u8]) {
        let (writer, epoch) = {
            let inner = self.shared.lock();
            if inner.state != ConnectionState::Connected {
                return;
            }
            match inner.writer.as_ref() {
                Some(writer) => (Arc::clone(writer), inner.epoch),
                None => return,
            }
        };

        let result = {
            let mut writer = writer.lock().await;
            match writer.write_all(data).await {
                Ok(()) => writer.flush().await,
                Err(err) => Err(err),
            }
        };
        if let Err(err) = result {
            warn!("write failed: {}", err);
            self.shared.handle_link_loss(Some(epoch));
        }
    }

    /// Tear the session down
    ///
    /// Safe from any state and idempotent: cancels the read loop, closes
    /// both stream ends (each independently, close errors swallowed), and
    /// emits `Closed` once per transition into `Closed`.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }
}

// ----------------------------------------------------------------------------
// Shared State Transitions
// ----------------------------------------------------------------------------

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Release every live resource without emitting events; bumps the epoch
    /// so in-flight opens and the read loop become stale. Caller holds the
    /// lock.
    fn release_resources(inner: &mut SessionInner) {
        inner.epoch += 1;
        inner.link_up = false;
        inner.parked = None;
        if let Some(shutdown) = inner.shutdown.take() {
            let _ = shutdown.send(true);
        }
        // The read task observes the shutdown signal, drops the input end,
        // and exits; its handle is detached rather than awaited.
        let _ = inner.read_task.take();
        if let Some(writer) = inner.writer.take() {
            tokio::spawn(async move {
                if let Err(err) = writer.lock().await.shutdown().await {
                    debug!("output close failed: {}", err);
                }
            });
        }
    }

    /// A stream opened for attempt `epoch`
    fn stream_opened(shared: &Arc<Self>, pair: StreamPair, epoch: u64, read_buffer_size: usize) {
        let mut inner = shared.lock();
        if inner.epoch != epoch || inner.state != ConnectionState::ConnectAttempting {
            // The attempt was abandoned while the open was in flight; the
            // pair drops here, closing both ends.
            return;
        }
        inner.parked = Some(pair);
        if inner.link_up {
            Self::begin_reading(shared, &mut inner, read_buffer_size);
        } else {
            debug!("stream opened, awaiting link-up confirmation");
        }
    }

    /// The stream open for attempt `epoch` failed
    fn open_failed(&self, epoch: u64, err: io::Error) {
        let mut inner = self.lock();
        if inner.epoch != epoch || inner.state != ConnectionState::ConnectAttempting {
            return;
        }
        inner.state = ConnectionState::Failed;
        warn!("stream open failed: {}", err);
        self.dispatcher.publish(Event::ConnectFailed);
    }

    /// Move to `Connected` and start the read loop. Caller holds the lock
    /// and has verified both the parked stream and the link confirmation.
    fn begin_reading(shared: &Arc<Self>, inner: &mut SessionInner, read_buffer_size: usize) {
        let Some(StreamPair { input, output }) = inner.parked.take() else {
            return;
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        inner.writer = Some(Arc::new(tokio::sync::Mutex::new(output)));
        inner.shutdown = Some(shutdown_tx);
        inner.state = ConnectionState::Connected;
        // Published before the loop spawns, so Connected precedes any
        // DataReceived from this link.
        shared.dispatcher.publish(Event::Connected);
        info!("link confirmed, read loop starting");
        inner.read_task = Some(tokio::spawn(read_loop(
            Arc::clone(shared),
            input,
            shutdown_rx,
            inner.epoch,
            read_buffer_size,
        )));
    }

    /// Loss of a live link, reported externally (`epoch` = None) or by the
    /// read loop / write path for a specific attempt. Stale epochs are
    /// ignored so a cancelled read never triggers a second teardown.
    fn handle_link_loss(&self, epoch: Option<u64>) {
        let mut inner = self.lock();
        if let Some(epoch) = epoch {
            if inner.epoch != epoch {
                return;
            }
        }
        if inner.state != ConnectionState::Connected {
            // Never live for this attempt: only the latch is affected.
            inner.link_up = false;
            return;
        }
        Self::release_resources(&mut inner);
        inner.state = ConnectionState::Closed;
        self.dispatcher.publish(Event::LinkLost);
        self.dispatcher.publish(Event::Closed);
    }

    fn disconnect(&self) {
        let mut inner = self.lock();
        let previous = inner.state;
        Self::release_resources(&mut inner);
        inner.state = ConnectionState::Closed;
        if previous != ConnectionState::Closed {
            self.dispatcher.publish(Event::Closed);
        }
    }
}

// ----------------------------------------------------------------------------
// Read Loop
// ----------------------------------------------------------------------------

/// Background loop for one connected period: blocks in the stream read,
/// frames each chunk, appends completed records to the log, and emits one
/// `DataReceived` per decoded batch.
async fn read_loop(
    shared: Arc<SessionShared>,
    mut input: Box<dyn AsyncRead + Send + Unpin>,
    mut shutdown: watch::Receiver<bool>,
    epoch: u64,
    read_buffer_size: usize,
) {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; read_buffer_size];
    loop {
        tokio::select! {
            biased;
            // Cancellation closes the stream out from under the read; it is
            // not a transport error and performs no teardown of its own.
            _ = shutdown.changed() => {
                debug!("read loop cancelled");
                break;
            }
            read = input.read(&mut buf) => match read {
                Ok(0) => {
                    debug!("stream closed by peer");
                    shared.handle_link_loss(Some(epoch));
                    break;
                }
                Ok(n) => {
                    if *shutdown.borrow() {
                        break;
                    }
                    match framer.feed(&buf[..n]) {
                        Ok(records) => {
                            if records.is_empty() {
                                continue;
                            }
                            shared.log.extend(records);
                            shared
                                .dispatcher
                                .publish(Event::DataReceived(Arc::clone(&shared.log)));
                        }
                        Err(err) => {
                            warn!("discarding undecodable chunk: {}", err);
                            shared.dispatcher.publish(Event::DecodeFailed(err));
                        }
                    }
                }
                Err(err) => {
                    warn!("read failed: {}", err);
                    shared.handle_link_loss(Some(epoch));
                    break;
                }
            },
        }
    }
    // The input end and the framer's pending state drop with the loop.
}
