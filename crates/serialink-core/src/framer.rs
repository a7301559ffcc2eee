//! Newline-delimited record framing
//!
//! Pure, stateful byte-to-line decoder. Bytes arrive in arbitrary chunks;
//! the framer carries one pending partial record between chunks so the
//! emitted records are identical however the stream was split.

use std::mem;

use smallvec::SmallVec;

use crate::error::DecodeError;

// ----------------------------------------------------------------------------
// Line Framer
// ----------------------------------------------------------------------------

/// Records completed by a single chunk
pub type RecordBatch = SmallVec<[String; 4]>;

/// Reassembles newline-delimited text records from chunked stream bytes
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Text accumulated since the last delimiter
    pending: String,
}

impl LineFramer {
    /// Create a framer with an empty pending buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk and return every record it completes
    ///
    /// Each `\n` emits the bytes accumulated since the previous delimiter,
    /// delimiter excluded, empty records included. Trailing text becomes
    /// the new pending buffer. The chunk must decode as UTF-8 on its own;
    /// a malformed chunk fails the call and leaves the pending buffer
    /// untouched, so framing resumes with the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<RecordBatch, DecodeError> {
        let text = std::str::from_utf8(chunk).map_err(|e| DecodeError {
            valid_up_to: e.valid_up_to(),
        })?;

        let mut completed = RecordBatch::new();
        let mut rest = text;
        while let Some(at) = rest.find('\n') {
            self.pending.push_str(&rest[..at]);
            completed.push(mem::take(&mut self.pending));
            rest = &rest[at + 1..];
        }
        self.pending.push_str(rest);
        Ok(completed)
    }

    /// Text accumulated since the last delimiter
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Discard the pending partial record
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
