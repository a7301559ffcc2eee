//! Byte-stream transport abstraction
//!
//! Opening a stream and observing link liveness are separate concerns: the
//! open call yields the stream ends, while link up/down notifications
//! arrive out-of-band from the platform and are forwarded to the session.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::PeerDevice;

// ----------------------------------------------------------------------------
// Link Notifications
// ----------------------------------------------------------------------------

/// Out-of-band liveness notification for an established link, distinct
/// from the outcome of the open call itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Up,
    Down,
}

// ----------------------------------------------------------------------------
// Stream Pair
// ----------------------------------------------------------------------------

/// Input and output ends of one open byte stream
pub struct StreamPair {
    pub input: Box<dyn AsyncRead + Send + Unpin>,
    pub output: Box<dyn AsyncWrite + Send + Unpin>,
}

// ----------------------------------------------------------------------------
// Stream Transport
// ----------------------------------------------------------------------------

/// Reliable byte-stream transport to a peer
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a bidirectional byte stream to `peer` for the given service
    /// identifier
    async fn open(&self, peer: &PeerDevice, service: Uuid) -> io::Result<StreamPair>;

    /// Subscribe to link up/down notifications
    fn subscribe_link_events(&self) -> mpsc::UnboundedReceiver<LinkEvent>;
}
