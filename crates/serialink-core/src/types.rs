//! Core types for the serialink communicator
//!
//! Newtype wrappers around the raw platform identifiers, plus the
//! connection lifecycle enum shared between the session and its callers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SerialinkError;

// ----------------------------------------------------------------------------
// Peer Address
// ----------------------------------------------------------------------------

/// Stable 6-byte hardware address identifying a peer device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerAddr([u8; 6]);

impl PeerAddr {
    /// Create a new address from 6 bytes
    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for PeerAddr {
    type Err = SerialinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| *c != ':').collect();
        let bytes = hex::decode(&compact).map_err(|_| SerialinkError::InvalidAddress {
            reason: format!("invalid hex in {s:?}"),
        })?;
        if bytes.len() != 6 {
            return Err(SerialinkError::InvalidAddress {
                reason: format!("expected 6 bytes, got {}", bytes.len()),
            });
        }
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&bytes);
        Ok(Self(addr))
    }
}

// ----------------------------------------------------------------------------
// Peer Device
// ----------------------------------------------------------------------------

/// A stream-capable peer surfaced by bonding or discovery
///
/// Immutable value; collections own their copies and there are no
/// back-references into the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDevice {
    /// Stable platform address
    pub addr: PeerAddr,
    /// Human-readable name broadcast by the peer
    pub name: String,
}

impl PeerDevice {
    /// Create a new peer device value
    pub fn new(addr: PeerAddr, name: impl Into<String>) -> Self {
        Self {
            addr,
            name: name.into(),
        }
    }
}

impl fmt::Display for PeerDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.addr)
    }
}

// ----------------------------------------------------------------------------
// Connection State
// ----------------------------------------------------------------------------

/// Lifecycle state of the connection session
///
/// Owned by the session; mutated only by session methods and the
/// externally-delivered link notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, nothing attempted yet
    Idle,
    /// A peer scan is running and no connect attempt has started
    Discovering,
    /// A stream open is in flight
    ConnectAttempting,
    /// Stream established and link confirmed live; read loop active
    Connected,
    /// The last stream open failed
    Failed,
    /// Torn down; a new connect attempt may reopen
    Closed,
}

// ----------------------------------------------------------------------------
// Service Identifier
// ----------------------------------------------------------------------------

/// Well-known Serial Port Profile service identifier used when opening a
/// stream to a peer
pub const SERIAL_SERVICE_ID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_addr_display() {
        let addr = PeerAddr::new([0xAB, 0xCD, 0xEF, 0x12, 0x34, 0x56]);
        assert_eq!(addr.to_string(), "AB:CD:EF:12:34:56");
    }

    #[test]
    fn test_peer_addr_parse() {
        let addr: PeerAddr = "AB:CD:EF:12:34:56".parse().unwrap();
        assert_eq!(addr.as_bytes(), &[0xAB, 0xCD, 0xEF, 0x12, 0x34, 0x56]);

        let bare: PeerAddr = "abcdef123456".parse().unwrap();
        assert_eq!(bare, addr);

        assert!("not-an-address".parse::<PeerAddr>().is_err());
        assert!("AB:CD:EF".parse::<PeerAddr>().is_err());
    }

    #[test]
    fn test_peer_device_display() {
        let device = PeerDevice::new(PeerAddr::new([1, 2, 3, 4, 5, 6]), "scope");
        assert_eq!(device.to_string(), "scope (01:02:03:04:05:06)");
    }
}
