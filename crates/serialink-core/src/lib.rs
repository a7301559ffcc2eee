//! Core building blocks for the serialink communicator
//!
//! This crate provides the pieces the stateful communicator in
//! `serialink-comm` is assembled from:
//!
//! - [`framer`] - newline-delimited record framing over chunked bytes
//! - [`records`] - the thread-safe received-record log
//! - [`event`] - the event union and single-observer dispatcher
//! - [`radio`] / [`transport`] - the platform seams the communicator
//!   consumes but never implements
//! - [`config`] - communicator configuration
//! - [`types`] / [`error`] - shared domain and error types
//!
//! Nothing here performs platform I/O; radio and stream implementations
//! are supplied by the embedding application.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod error;
pub mod event;
pub mod framer;
pub mod radio;
pub mod records;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::CommunicatorConfig;
pub use error::{DecodeError, Result, SerialinkError};
pub use event::{Event, EventDispatcher, EventObserver};
pub use framer::{LineFramer, RecordBatch};
pub use radio::{RadioAdapter, ScanEvent};
pub use records::RecordLog;
pub use transport::{LinkEvent, StreamPair, StreamTransport};
pub use types::{ConnectionState, PeerAddr, PeerDevice, SERIAL_SERVICE_ID};
