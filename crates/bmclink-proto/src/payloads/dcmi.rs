//! DCMI group-extension records: management controller ID string.
//!
//! Every DCMI payload leads with the group extension byte 0xDC; replies echo
//! it back ahead of their own fields, so these records always go through the
//! hand-written codec.

use bytes::{BufMut, BytesMut};

use crate::codec::{Encode, Response};
use crate::completion::CompletionCode;
use crate::errors::Result;

/// DCMI group extension identifier, first byte of every DCMI payload.
pub const GROUP_EXTENSION_ID: u8 = 0xdc;

/// Maximum MC-ID string length in bytes.
pub const MAX_MC_ID_LEN: usize = 16;

/// Get Management Controller ID String request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetMcIdRequest {
    /// Group extension byte ([`GROUP_EXTENSION_ID`]).
    pub group_extension_id: u8,
    /// Offset into the stored string.
    pub offset: u8,
    /// Number of bytes to read.
    pub num_bytes: u8,
}

impl GetMcIdRequest {
    /// Read `num_bytes` of the MC-ID string starting at `offset`.
    #[must_use]
    pub fn new(offset: u8, num_bytes: u8) -> Self {
        Self { group_extension_id: GROUP_EXTENSION_ID, offset, num_bytes }
    }

    /// Parse a request.
    pub fn parse(data: &[u8]) -> Result<Self> {
        match data {
            [group_extension_id, offset, num_bytes, ..] => Ok(Self {
                group_extension_id: *group_extension_id,
                offset: *offset,
                num_bytes: *num_bytes,
            }),
            _ => Err(CompletionCode::SHORT_PACKET.into()),
        }
    }
}

impl Encode for GetMcIdRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.group_extension_id);
        dst.put_u8(self.offset);
        dst.put_u8(self.num_bytes);
    }
}

/// Get Management Controller ID String response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetMcIdResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Group extension byte, echoed.
    pub group_extension_id: u8,
    /// Total length of the stored string.
    pub num_bytes: u8,
    /// The requested string bytes (printable).
    pub data: String,
}

impl Encode for GetMcIdResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.completion_code.0);
        dst.put_u8(self.group_extension_id);
        dst.put_u8(self.num_bytes);
        dst.put_slice(self.data.as_bytes());
    }
}

impl Response for GetMcIdResponse {
    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(CompletionCode::SHORT_PACKET.into());
        }
        let num_bytes = data[2];
        let text = data
            .get(3..3 + num_bytes as usize)
            .ok_or(CompletionCode::SHORT_PACKET)?;
        Ok(Self {
            completion_code: CompletionCode(data[0]),
            group_extension_id: data[1],
            num_bytes,
            data: String::from_utf8_lossy(text).into_owned(),
        })
    }

    fn completion_code(&self) -> CompletionCode {
        self.completion_code
    }
}

/// Set Management Controller ID String request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMcIdRequest {
    /// Group extension byte ([`GROUP_EXTENSION_ID`]).
    pub group_extension_id: u8,
    /// Offset of this write.
    pub offset: u8,
    /// Length of the string being written.
    pub num_bytes: u8,
    /// String bytes; padded to 16 on the wire.
    pub data: String,
}

impl SetMcIdRequest {
    /// Write `id` as the MC-ID string.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            group_extension_id: GROUP_EXTENSION_ID,
            offset: 0,
            num_bytes: id.len().min(MAX_MC_ID_LEN) as u8,
            data: id.to_string(),
        }
    }

    /// Parse a request.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(CompletionCode::SHORT_PACKET.into());
        }
        let num_bytes = data[2];
        let text = data
            .get(3..3 + num_bytes as usize)
            .ok_or(CompletionCode::SHORT_PACKET)?;
        Ok(Self {
            group_extension_id: data[0],
            offset: data[1],
            num_bytes,
            data: String::from_utf8_lossy(text).into_owned(),
        })
    }
}

impl Encode for SetMcIdRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.group_extension_id);
        dst.put_u8(self.offset);
        dst.put_u8(MAX_MC_ID_LEN as u8);

        let bytes = self.data.as_bytes();
        let len = bytes.len().min(MAX_MC_ID_LEN);
        dst.put_slice(&bytes[..len]);
        dst.put_bytes(0, MAX_MC_ID_LEN - len);
    }
}

/// Set Management Controller ID String response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetMcIdResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Group extension byte, echoed.
    pub group_extension_id: u8,
    /// Last string offset written.
    pub last_offset_written: u8,
}

impl Encode for SetMcIdResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.completion_code.0);
        dst.put_u8(self.group_extension_id);
        dst.put_u8(self.last_offset_written);
    }
}

impl Response for SetMcIdResponse {
    fn decode(data: &[u8]) -> Result<Self> {
        match data {
            [completion_code, group_extension_id, last_offset_written, ..] => Ok(Self {
                completion_code: CompletionCode(*completion_code),
                group_extension_id: *group_extension_id,
                last_offset_written: *last_offset_written,
            }),
            _ => Err(CompletionCode::SHORT_PACKET.into()),
        }
    }

    fn completion_code(&self) -> CompletionCode {
        self.completion_code
    }
}
