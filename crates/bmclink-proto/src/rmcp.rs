//! RMCP header (big-endian section).
//!
//! The outermost four bytes of every datagram. The class byte selects the
//! subprotocol: ASF for the presence ping, IPMI for everything else.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::codec::decode_fixed;
use crate::errors::{ProtocolError, Result};

/// RMCP version 1.0 identifier byte.
pub const RMCP_VERSION_1: u8 = 0x06;

/// RMCP message class: ASF (ping/pong).
pub const RMCP_CLASS_ASF: u8 = 0x06;

/// RMCP message class: IPMI.
pub const RMCP_CLASS_IPMI: u8 = 0x07;

/// Fixed 4-byte RMCP header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct RmcpHeader {
    /// Always [`RMCP_VERSION_1`].
    pub version: u8,
    /// Reserved, zero.
    pub reserved: u8,
    /// RMCP sequence number; 0xff means no RMCP-level ack is requested.
    pub sequence: u8,
    /// Message class ([`RMCP_CLASS_ASF`] or [`RMCP_CLASS_IPMI`]).
    pub class: u8,
}

impl RmcpHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 4;

    /// Header for an ASF-class message.
    #[must_use]
    pub fn asf() -> Self {
        Self { version: RMCP_VERSION_1, reserved: 0, sequence: 0xff, class: RMCP_CLASS_ASF }
    }

    /// Header for an IPMI-class message.
    #[must_use]
    pub fn ipmi() -> Self {
        Self { version: RMCP_VERSION_1, reserved: 0, sequence: 0xff, class: RMCP_CLASS_IPMI }
    }

    /// Parse the header from the front of a datagram.
    pub fn read(buf: &[u8]) -> Result<Self> {
        decode_fixed(buf)
    }

    /// Error for a class this implementation does not speak.
    #[must_use]
    pub fn unsupported_class(&self) -> ProtocolError {
        ProtocolError::UnsupportedClass(self.class)
    }
}
