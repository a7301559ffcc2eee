//! Error types for the serialink communicator

use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors surfaced by communicator operations
///
/// Connect failures, link loss, and write failures are reported through
/// emitted events rather than return values; this enum covers the
/// operations that fail synchronously.
#[derive(Debug, Error)]
pub enum SerialinkError {
    /// No radio adapter exists on this device
    #[error("no radio adapter available")]
    Unsupported,

    /// A radio adapter exists but is turned off
    #[error("radio adapter is disabled")]
    Disabled,

    /// The radio rejected a scan start
    #[error("failed to start scan: {reason}")]
    Scan { reason: String },

    /// A peer address string did not parse
    #[error("invalid peer address: {reason}")]
    InvalidAddress { reason: String },
}

/// Malformed text in a received chunk
///
/// The chunk that failed is discarded; the framer's pending partial record
/// is untouched and framing continues with the next chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed utf-8 in received chunk (valid up to byte {valid_up_to})")]
pub struct DecodeError {
    /// Number of leading bytes that decoded cleanly
    pub valid_up_to: usize,
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, SerialinkError>;
