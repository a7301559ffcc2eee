//! Communicator configuration

use uuid::Uuid;

use crate::types::SERIAL_SERVICE_ID;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the communicator
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommunicatorConfig {
    /// Service identifier used when opening a stream to a peer
    pub service_id: Uuid,
    /// Size of the read loop's receive buffer
    pub read_buffer_size: usize,
    /// Initial capacity of the received record log
    pub log_capacity: usize,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            service_id: SERIAL_SERVICE_ID,
            read_buffer_size: 1024,
            log_capacity: 200,
        }
    }
}

impl CommunicatorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service identifier
    pub fn with_service_id(mut self, service_id: Uuid) -> Self {
        self.service_id = service_id;
        self
    }

    /// Set the read buffer size
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the initial record log capacity
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }
}
