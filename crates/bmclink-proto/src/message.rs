//! IPMI v1.5 message framing (little-endian section).
//!
//! Layout on the wire:
//!
//! ```text
//! [RMCP header 4B]
//! [session header 9B]   auth_type, sequence (LE), session_id (LE)
//! [auth code 16B]       present only when auth_type != 0
//! [msg_len 1B]          addressed header + payload length
//! [addressed header 6B] rs_addr, netfn_rslun, checksum, rq_addr, rq_seq, command
//! [payload N B]
//! [payload checksum 1B]
//! ```
//!
//! Both checksums are verified on decode; a mismatch rejects the packet as
//! invalid. `msg_len` counts from `rs_addr` onward and excludes the trailing
//! checksum.

use bytes::{BufMut, BytesMut};
use zerocopy::byteorder::little_endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::checksum::{ChecksumSink, checksum};
use crate::codec::{Response, decode_fixed};
use crate::completion::CompletionCode;
use crate::errors::Result;
use crate::payloads::{Command, NetFn};
use crate::rmcp::{RMCP_CLASS_IPMI, RmcpHeader};

/// Receive buffer size, matching typical IPMI MTUs. A larger reply is
/// truncated at receive and fails checksum validation.
pub const IPMI_BUF_SIZE: usize = 1024;

/// Responder address: the BMC slave address.
pub const BMC_SLAVE_ADDR: u8 = 0x20;

/// Requester address: remote console software ID.
pub const REMOTE_SWID: u8 = 0x81;

/// Session authentication type: none.
pub const AUTH_TYPE_NONE: u8 = 0x00;
/// Session authentication type: MD2.
pub const AUTH_TYPE_MD2: u8 = 0x01;
/// Session authentication type: MD5.
pub const AUTH_TYPE_MD5: u8 = 0x02;
/// Session authentication type: straight password.
pub const AUTH_TYPE_PASSWORD: u8 = 0x04;
/// Session authentication type: OEM proprietary.
pub const AUTH_TYPE_OEM: u8 = 0x05;

/// Bit advertised for an auth type in the capability bitmask.
#[must_use]
pub fn auth_type_bit(auth_type: u8) -> u8 {
    1 << auth_type
}

/// IPMI session header: 9 bytes after the RMCP header.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct SessionHeader {
    /// Authentication type in force for this packet.
    pub auth_type: u8,
    /// Inbound session sequence number.
    pub sequence: little_endian::U32,
    /// Session ID granted by the BMC (zero during handshake).
    pub session_id: little_endian::U32,
}

impl SessionHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 9;
}

/// IPMI command header: `msg_len` plus the six addressed bytes it counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct CommandHeader {
    /// Length from `rs_addr` onward, exclusive of the trailing checksum.
    pub msg_len: u8,
    /// Responder slave address.
    pub rs_addr: u8,
    /// Network function in bits 7..2, responder LUN in bits 1..0.
    pub netfn_rslun: u8,
    /// Checksum over `rs_addr` and `netfn_rslun`.
    pub checksum: u8,
    /// Requester address.
    pub rq_addr: u8,
    /// Request sequence in bits 7..2, requester LUN in bits 1..0.
    pub rq_seq: u8,
    /// Command byte.
    pub command: u8,
}

impl CommandHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 7;

    /// Bytes counted by `msg_len` before the payload (`rs_addr`..`command`).
    pub const ADDRESSED_LEN: usize = Self::SIZE - 1;
}

/// A framed IPMI message. Lives only across one send/receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Outer RMCP header (IPMI class).
    pub rmcp: RmcpHeader,
    /// Session header.
    pub session: SessionHeader,
    /// Auth-code slot; meaningful only when `session.auth_type != 0`.
    pub auth_code: [u8; Message::AUTH_CODE_LEN],
    /// Command header. `msg_len` and `checksum` are filled on encode.
    pub header: CommandHeader,
    /// Command payload. For responses, byte 0 is the completion code.
    pub data: Vec<u8>,
    /// Identity of the requester, attached by the simulator from its
    /// session-ID map. Never present on the wire.
    pub requester: Option<String>,
}

impl Message {
    /// Size of the auth-code slot.
    pub const AUTH_CODE_LEN: usize = 16;

    /// Offset of the auth-code slot in an authenticated packet.
    pub const AUTH_CODE_OFFSET: usize = RmcpHeader::SIZE + SessionHeader::SIZE;

    /// Offset of `rs_addr` in an authenticated packet. The per-packet auth
    /// code covers everything from here through the trailing checksum; the
    /// `msg_len` length prefix is outside the authenticated region.
    pub const AUTH_BODY_OFFSET: usize =
        Self::AUTH_CODE_OFFSET + Self::AUTH_CODE_LEN + 1;

    /// Minimum framed size (no auth code, empty payload).
    pub const MIN_SIZE: usize =
        RmcpHeader::SIZE + SessionHeader::SIZE + CommandHeader::SIZE + 1;

    /// Frame a request for the wire.
    #[must_use]
    pub fn request(netfn: NetFn, command: Command, rq_seq: u8, data: Vec<u8>) -> Self {
        Self {
            rmcp: RmcpHeader::ipmi(),
            session: SessionHeader {
                auth_type: AUTH_TYPE_NONE,
                sequence: little_endian::U32::new(0),
                session_id: little_endian::U32::new(0),
            },
            auth_code: [0; Self::AUTH_CODE_LEN],
            header: CommandHeader {
                msg_len: 0,
                rs_addr: BMC_SLAVE_ADDR,
                netfn_rslun: netfn.0 << 2,
                checksum: 0,
                rq_addr: REMOTE_SWID,
                rq_seq,
                command: command.0,
            },
            data,
            requester: None,
        }
    }

    /// Network function portion of the `netfn_rslun` field.
    #[must_use]
    pub fn netfn(&self) -> NetFn {
        NetFn(self.header.netfn_rslun >> 2)
    }

    /// Command byte.
    #[must_use]
    pub fn command(&self) -> Command {
        Command(self.header.command)
    }

    /// Decode the payload as a typed response.
    ///
    /// # Errors
    ///
    /// A non-zero completion code is returned as the error (the payload body
    /// of a failed command is not decoded).
    pub fn parse_response<R: Response>(&self) -> Result<R> {
        let code = CompletionCode::decode(&self.data)?;
        if !code.is_success() {
            return Err(code.into());
        }
        R::decode(&self.data)
    }

    /// Serialize, filling `msg_len` and both checksums.
    ///
    /// The auth-code slot is written verbatim when `auth_type != 0`; for MD5
    /// sessions the transport overwrites it in place after hashing the
    /// encoded bytes.
    pub fn encode(&self, dst: &mut BytesMut) {
        let mut header = self.header;
        header.msg_len = (CommandHeader::ADDRESSED_LEN + self.data.len()) as u8;
        header.checksum = checksum(&[header.rs_addr, header.netfn_rslun]);

        dst.put_slice(self.rmcp.as_bytes());
        dst.put_slice(self.session.as_bytes());
        if self.session.auth_type != AUTH_TYPE_NONE {
            dst.put_slice(&self.auth_code);
        }
        dst.put_slice(header.as_bytes());
        dst.put_slice(&self.data);

        let mut sink = ChecksumSink::new();
        sink.push(header.rq_addr);
        sink.push(header.rq_seq);
        sink.push(header.command);
        sink.extend(&self.data);
        dst.put_u8(sink.finish());
    }

    /// Parse and validate a framed message.
    ///
    /// # Errors
    ///
    /// - `SHORT_PACKET` if the buffer ends before the framing claims
    /// - `INVALID_PACKET` if `msg_len` is inconsistent or either checksum
    ///   fails to verify
    /// - `UnsupportedClass` if the RMCP class is not IPMI
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let rmcp = RmcpHeader::read(buf)?;
        if rmcp.class != RMCP_CLASS_IPMI {
            return Err(rmcp.unsupported_class());
        }

        let mut offset = RmcpHeader::SIZE;
        let session: SessionHeader = decode_fixed(remainder(buf, offset))?;
        offset += SessionHeader::SIZE;

        let mut auth_code = [0u8; Self::AUTH_CODE_LEN];
        if session.auth_type != AUTH_TYPE_NONE {
            let slot = buf
                .get(offset..offset + Self::AUTH_CODE_LEN)
                .ok_or(CompletionCode::SHORT_PACKET)?;
            auth_code.copy_from_slice(slot);
            offset += Self::AUTH_CODE_LEN;
        }

        let header: CommandHeader = decode_fixed(remainder(buf, offset))?;
        offset += CommandHeader::SIZE;

        let msg_len = header.msg_len as usize;
        if msg_len < CommandHeader::ADDRESSED_LEN {
            return Err(CompletionCode::INVALID_PACKET.into());
        }
        let data_len = msg_len - CommandHeader::ADDRESSED_LEN;
        let data_end = offset + data_len;
        if buf.len() < data_end + 1 {
            return Err(CompletionCode::SHORT_PACKET.into());
        }
        let data = buf[offset..data_end].to_vec();

        let mut hdr = ChecksumSink::new();
        hdr.extend(&[header.rs_addr, header.netfn_rslun, header.checksum]);
        if !hdr.is_valid() {
            return Err(CompletionCode::INVALID_PACKET.into());
        }

        let mut body = ChecksumSink::new();
        body.extend(&[header.rq_addr, header.rq_seq, header.command]);
        body.extend(&data);
        body.push(buf[data_end]);
        if !body.is_valid() {
            return Err(CompletionCode::INVALID_PACKET.into());
        }

        Ok(Self { rmcp, session, auth_code, header, data, requester: None })
    }
}

fn remainder(buf: &[u8], offset: usize) -> &[u8] {
    buf.get(offset..).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProtocolError;

    fn sample(auth_type: u8) -> Message {
        let mut m = Message::request(NetFn::APP, Command::GET_DEVICE_ID, 0x04, vec![]);
        m.session.auth_type = auth_type;
        m.session.sequence = little_endian::U32::new(0x0102_0304);
        m.session.session_id = little_endian::U32::new(0xdead_beef);
        m
    }

    #[test]
    fn framed_length_without_auth() {
        let mut buf = BytesMut::new();
        sample(AUTH_TYPE_NONE).encode(&mut buf);
        assert_eq!(Message::MIN_SIZE, buf.len());
    }

    #[test]
    fn framed_length_with_auth() {
        let mut m = sample(AUTH_TYPE_MD5);
        m.data = vec![0x01, 0x02, 0x03];

        let mut buf = BytesMut::new();
        m.encode(&mut buf);
        assert_eq!(Message::MIN_SIZE + Message::AUTH_CODE_LEN + 3, buf.len());
    }

    #[test]
    fn golden_device_id_request() {
        let mut buf = BytesMut::new();
        sample(AUTH_TYPE_NONE).encode(&mut buf);

        // rmcp | session | msg_len + addressed header | payload checksum
        assert_eq!(
            "0600ff070004030201efbeadde062018c88104017a",
            hex::encode(&buf)
        );
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut m = sample(AUTH_TYPE_MD5);
        m.auth_code = [0xaa; 16];
        m.data = vec![0x00, 0x11, 0x22];

        let mut buf = BytesMut::new();
        m.encode(&mut buf);

        let decoded = Message::decode(&buf).unwrap();
        assert_eq!(m.session, decoded.session);
        assert_eq!(m.auth_code, decoded.auth_code);
        assert_eq!(m.data, decoded.data);
        assert_eq!(NetFn::APP, decoded.netfn());
        assert_eq!(Command::GET_DEVICE_ID, decoded.command());
        assert_eq!(0x04, decoded.header.rq_seq);
    }

    #[test]
    fn reject_non_ipmi_class() {
        let mut buf = BytesMut::new();
        sample(AUTH_TYPE_NONE).encode(&mut buf);
        buf[3] = 0x42;

        let err = Message::decode(&buf).unwrap_err();
        assert_eq!(ProtocolError::UnsupportedClass(0x42), err);
    }

    #[test]
    fn reject_corrupt_header_checksum() {
        let mut buf = BytesMut::new();
        sample(AUTH_TYPE_NONE).encode(&mut buf);
        // netfn_rslun sits two bytes past msg_len
        let netfn_at = RmcpHeader::SIZE + SessionHeader::SIZE + 2;
        buf[netfn_at] ^= 0x10;

        let err = Message::decode(&buf).unwrap_err();
        assert_eq!(err, CompletionCode::INVALID_PACKET);
    }

    #[test]
    fn reject_corrupt_payload() {
        let mut m = sample(AUTH_TYPE_NONE);
        m.data = vec![0x00, 0x55];

        let mut buf = BytesMut::new();
        m.encode(&mut buf);
        let payload_at = buf.len() - 2;
        buf[payload_at] ^= 0x01;

        let err = Message::decode(&buf).unwrap_err();
        assert_eq!(err, CompletionCode::INVALID_PACKET);
    }

    #[test]
    fn reject_truncated_packet() {
        let mut m = sample(AUTH_TYPE_NONE);
        m.data = vec![0x00; 8];

        let mut buf = BytesMut::new();
        m.encode(&mut buf);
        let err = Message::decode(&buf[..buf.len() - 4]).unwrap_err();
        assert_eq!(err, CompletionCode::SHORT_PACKET);
    }

    #[test]
    fn reject_undersized_msg_len() {
        let mut buf = BytesMut::new();
        sample(AUTH_TYPE_NONE).encode(&mut buf);
        buf[RmcpHeader::SIZE + SessionHeader::SIZE] = 0x00;

        let err = Message::decode(&buf).unwrap_err();
        assert_eq!(err, CompletionCode::INVALID_PACKET);
    }

    #[test]
    fn non_zero_completion_surfaces_as_error() {
        let mut m = sample(AUTH_TYPE_NONE);
        m.data = vec![CompletionCode::NODE_BUSY.0];

        let err = m.parse_response::<CompletionCode>().unwrap_err();
        assert_eq!(err, CompletionCode::NODE_BUSY);
    }
}
