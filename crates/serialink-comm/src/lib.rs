//! Stateful peer communicator for serialink
//!
//! This crate assembles the building blocks from `serialink-core` into the
//! communicator proper:
//!
//! - [`registry`] - paired and discovered device bookkeeping
//! - [`discovery`] - scan control and found-peer forwarding
//! - [`session`] - the connection state machine, write path, and
//!   background read loop
//! - [`communicator`] - the facade the composition root constructs once
//!   and hands to consumers
//!
//! The platform radio and stream transport are supplied by the embedding
//! application through the `RadioAdapter` and `StreamTransport` seams;
//! everything here must run inside a Tokio runtime.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod communicator;
pub mod discovery;
pub mod registry;
pub mod session;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use communicator::Communicator;
pub use discovery::DiscoveryController;
pub use registry::DeviceRegistry;
pub use session::ConnectionSession;

// Re-export the core contract types for convenience
pub use serialink_core::{
    CommunicatorConfig, ConnectionState, Event, EventObserver, LinkEvent, PeerAddr, PeerDevice,
    RadioAdapter, RecordLog, Result, ScanEvent, SerialinkError, StreamPair, StreamTransport,
};
