//! Event union and single-observer dispatch
//!
//! Components publish from whatever execution context they run on; one
//! dedicated delivery task drains the queue in publish order and invokes
//! the single registered observer, so the observer needs no locking of
//! its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::DecodeError;
use crate::records::RecordLog;
use crate::types::PeerDevice;

// ----------------------------------------------------------------------------
// Event Union
// ----------------------------------------------------------------------------

/// Lifecycle and data events produced by the communicator
#[derive(Debug, Clone)]
pub enum Event {
    /// One or more records were decoded from a single read; carries the
    /// shared record log
    DataReceived(Arc<RecordLog>),
    /// A peer surfaced during an active scan
    PeerFound(PeerDevice),
    /// The scan ran to completion or was cancelled
    DiscoveryFinished,
    /// The live link died underneath an established connection
    LinkLost,
    /// No radio adapter exists on this device
    RadioUnavailable,
    /// A radio adapter exists but is turned off
    RadioDisabled,
    /// Stream established and link confirmed live
    Connected,
    /// The stream open failed
    ConnectFailed,
    /// The session was torn down
    Closed,
    /// A stream open has started
    ConnectAttempt,
    /// A received chunk was not valid text; framing continues
    DecodeFailed(DecodeError),
}

// ----------------------------------------------------------------------------
// Observer
// ----------------------------------------------------------------------------

/// Consumer of communicator events
pub trait EventObserver: Send {
    fn on_event(&mut self, event: Event);
}

impl<F> EventObserver for F
where
    F: FnMut(Event) + Send,
{
    fn on_event(&mut self, event: Event) {
        self(event)
    }
}

// ----------------------------------------------------------------------------
// Dispatcher
// ----------------------------------------------------------------------------

struct ObserverSlot {
    registered: AtomicBool,
    observer: Mutex<Option<Box<dyn EventObserver>>>,
}

impl ObserverSlot {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn EventObserver>>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single-observer publish/subscribe bridge
///
/// Cheap to clone; every handle feeds the same delivery task.
#[derive(Clone)]
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<Event>,
    slot: Arc<ObserverSlot>,
}

impl EventDispatcher {
    /// Create a dispatcher and spawn its delivery task
    ///
    /// Must be called from within a Tokio runtime. The task ends once
    /// every dispatcher handle has been dropped.
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let slot = Arc::new(ObserverSlot {
            registered: AtomicBool::new(false),
            observer: Mutex::new(None),
        });

        let delivery = Arc::clone(&slot);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Some(observer) = delivery.lock().as_mut() {
                    observer.on_event(event);
                }
            }
            debug!("event delivery task stopped");
        });

        Self { tx, slot }
    }

    /// Register the observer, replacing any previous one
    ///
    /// The observer slot is held while an event is being delivered, so this
    /// must not be called from inside the observer callback itself.
    pub fn set_observer(&self, observer: impl EventObserver + 'static) {
        *self.slot.lock() = Some(Box::new(observer));
        self.slot.registered.store(true, Ordering::Release);
    }

    /// Deregister the current observer, if any
    pub fn clear_observer(&self) {
        self.slot.registered.store(false, Ordering::Release);
        *self.slot.lock() = None;
    }

    /// Publish an event for in-order delivery to the observer
    ///
    /// Callable from any execution context. When no observer is registered
    /// the event is discarded, not queued.
    pub fn publish(&self, event: Event) {
        if !self.slot.registered.load(Ordering::Acquire) {
            return;
        }
        let _ = self.tx.send(event);
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
