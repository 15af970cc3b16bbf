//! ASF presence ping (big-endian section).
//!
//! The only ASF exchange this implementation speaks is Ping/Pong, used
//! before session setup to confirm the remote end is an RMCP endpoint that
//! supports IPMI.

use bytes::{BufMut, BytesMut};
use zerocopy::byteorder::big_endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::codec::{decode_fixed, impl_fixed_encode};
use crate::completion::CompletionCode;
use crate::errors::{ProtocolError, Result};
use crate::rmcp::RmcpHeader;

/// IANA enterprise number carried by ASF messages.
pub const ASF_IANA: u32 = 0x0000_11be;

/// ASF message type: presence ping.
pub const ASF_TYPE_PING: u8 = 0x80;

/// ASF message type: presence pong.
pub const ASF_TYPE_PONG: u8 = 0x40;

/// Fixed 8-byte ASF header following the RMCP header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct AsfHeader {
    /// IANA enterprise number ([`ASF_IANA`]).
    pub iana: big_endian::U32,
    /// Message type ([`ASF_TYPE_PING`] or [`ASF_TYPE_PONG`]).
    pub message_type: u8,
    /// Message tag, echoed by the responder.
    pub message_tag: u8,
    /// Reserved, zero.
    pub reserved: u8,
    /// Length of the data block following the header.
    pub data_length: u8,
}

impl AsfHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 8;

    /// Error for a message type this implementation does not speak.
    #[must_use]
    pub fn unsupported_message_type(&self) -> ProtocolError {
        ProtocolError::UnsupportedMessageType(self.message_type)
    }
}

/// An ASF message: RMCP header, ASF header, data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsfMessage {
    /// Outer RMCP header (ASF class).
    pub rmcp: RmcpHeader,
    /// ASF header.
    pub asf: AsfHeader,
    /// Message data (empty for Ping, a [`Pong`] record for Pong).
    pub data: Vec<u8>,
}

impl AsfMessage {
    /// Minimum serialized size (headers only).
    pub const MIN_SIZE: usize = RmcpHeader::SIZE + AsfHeader::SIZE;

    /// A presence ping.
    #[must_use]
    pub fn ping() -> Self {
        Self {
            rmcp: RmcpHeader::asf(),
            asf: AsfHeader {
                iana: big_endian::U32::new(ASF_IANA),
                message_type: ASF_TYPE_PING,
                message_tag: 0,
                reserved: 0,
                data_length: 0,
            },
            data: Vec::new(),
        }
    }

    /// Parse an ASF message from a datagram.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::MIN_SIZE {
            return Err(CompletionCode::SHORT_PACKET.into());
        }

        let rmcp = RmcpHeader::read(buf)?;
        let asf: AsfHeader = decode_fixed(&buf[RmcpHeader::SIZE..])?;
        let data = buf[Self::MIN_SIZE..].to_vec();

        Ok(Self { rmcp, asf, data })
    }

    /// Serialize, filling `data_length` from the actual data block.
    pub fn encode(&self, dst: &mut BytesMut) {
        let mut asf = self.asf;
        asf.data_length = self.data.len() as u8;

        dst.put_slice(self.rmcp.as_bytes());
        dst.put_slice(asf.as_bytes());
        dst.put_slice(&self.data);
    }

    /// Decode the data block as a fixed-layout record.
    pub fn parse_data<T: FromBytes>(&self) -> Result<T> {
        decode_fixed(&self.data)
    }

    /// Error for a message type this implementation does not speak.
    #[must_use]
    pub fn unsupported_message_type(&self) -> ProtocolError {
        self.asf.unsupported_message_type()
    }
}

/// Pong data block: the responder's capability advertisement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct Pong {
    /// IANA enterprise number of the responder.
    pub iana: big_endian::U32,
    /// OEM-defined field.
    pub oem: big_endian::U32,
    /// Supported entities bitmask; bit 7 means IPMI.
    pub supported_entities: u8,
    /// Supported interactions bitmask.
    pub supported_interactions: u8,
    /// Reserved, zero.
    pub reserved: [u8; 6],
}

impl Pong {
    /// Bit set in `supported_entities` when the responder speaks IPMI.
    pub const ENTITY_IPMI: u8 = 0x80;

    /// True if the responder advertises IPMI support.
    #[must_use]
    pub fn supports_ipmi(&self) -> bool {
        self.supported_entities & Self::ENTITY_IPMI != 0
    }
}

impl_fixed_encode!(Pong);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_wire_form() {
        let mut buf = BytesMut::new();
        AsfMessage::ping().encode(&mut buf);

        assert_eq!(
            &[0x06, 0x00, 0xff, 0x06, 0x00, 0x00, 0x11, 0xbe, 0x80, 0x00, 0x00, 0x00],
            buf.as_ref(),
        );
    }

    #[test]
    fn reject_short_buffer() {
        let err = AsfMessage::decode(&[]).unwrap_err();
        assert_eq!(err, CompletionCode::SHORT_PACKET);

        let ok = AsfMessage::decode(&[0u8; AsfMessage::MIN_SIZE]);
        assert!(ok.is_ok());
    }

    #[test]
    fn pong_round_trip() {
        let pong = Pong {
            iana: big_endian::U32::new(ASF_IANA),
            oem: big_endian::U32::new(0),
            supported_entities: 0x81,
            supported_interactions: 0,
            reserved: [0; 6],
        };

        let mut message = AsfMessage::ping();
        message.asf.message_type = ASF_TYPE_PONG;
        message.data = pong.as_bytes().to_vec();

        let mut buf = BytesMut::new();
        message.encode(&mut buf);

        let decoded = AsfMessage::decode(&buf).unwrap();
        assert_eq!(ASF_TYPE_PONG, decoded.asf.message_type);
        assert_eq!(16, decoded.asf.data_length);

        let body: Pong = decoded.parse_data().unwrap();
        assert!(body.supports_ipmi());
        assert_eq!(ASF_IANA, body.iana.get());
    }

    #[test]
    fn pong_without_ipmi_bit() {
        let pong = Pong {
            iana: big_endian::U32::new(ASF_IANA),
            oem: big_endian::U32::new(0),
            supported_entities: 0x01,
            supported_interactions: 0,
            reserved: [0; 6],
        };
        assert!(!pong.supports_ipmi());
    }
}
