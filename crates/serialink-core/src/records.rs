//! Ordered log of received records
//!
//! Appended by the read loop, read and cleared by the owning caller (e.g.
//! an exporter). One lock covers every operation so an export snapshot can
//! never observe a partial append.

use std::sync::{Mutex, MutexGuard, PoisonError};

// ----------------------------------------------------------------------------
// Record Log
// ----------------------------------------------------------------------------

/// Thread-safe append log of decoded records, insertion order = arrival order
#[derive(Debug, Default)]
pub struct RecordLog {
    records: Mutex<Vec<String>>,
}

impl RecordLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log pre-sized for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one record
    pub fn append(&self, record: String) {
        self.lock().push(record);
    }

    /// Append a batch of records decoded from a single read
    pub fn extend(&self, records: impl IntoIterator<Item = String>) {
        self.lock().extend(records);
    }

    /// Point-in-time copy of the log, not a live view
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
