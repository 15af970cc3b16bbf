//! Payload codec capabilities.
//!
//! Two payload modes coexist. Fixed-layout records are flat `#[repr(C)]`
//! structs of byte-sized and explicitly-endian fields; zerocopy derives give
//! them their wire form and the helpers here move them in and out of
//! buffers. Variable-length records (boot options, user names, DCMI strings)
//! hand-implement [`Encode`] and [`Response`] because they carry a trailing
//! byte block whose length is data-dependent.
//!
//! RMCP and ASF headers are big-endian; the IPMI session header, command
//! header, and payloads are little-endian. Field types from
//! `zerocopy::byteorder` keep the two lexically distinct.

use bytes::{BufMut, BytesMut};
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::completion::CompletionCode;
use crate::errors::Result;

/// Capability: serialize a request or response payload to wire bytes.
pub trait Encode {
    /// Append the wire form of `self` to `dst`.
    fn encode(&self, dst: &mut BytesMut);
}

/// Capability: a response payload.
///
/// Every response starts with a completion code; a record that is only a
/// completion code is itself a valid response.
pub trait Response: Sized {
    /// Decode from response data (completion code at byte 0).
    fn decode(data: &[u8]) -> Result<Self>;

    /// The completion code carried by this response.
    fn completion_code(&self) -> CompletionCode;
}

/// Empty payload (requests that consist of header bytes only).
impl Encode for () {
    fn encode(&self, _dst: &mut BytesMut) {}
}

impl Encode for CompletionCode {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.0);
    }
}

impl Response for CompletionCode {
    fn decode(data: &[u8]) -> Result<Self> {
        let code = data.first().ok_or(CompletionCode::SHORT_PACKET)?;
        Ok(Self(*code))
    }

    fn completion_code(&self) -> CompletionCode {
        *self
    }
}

/// Append a fixed-layout record to `dst`.
pub(crate) fn encode_fixed<T: IntoBytes + Immutable>(value: &T, dst: &mut BytesMut) {
    dst.put_slice(value.as_bytes());
}

/// Read a fixed-layout record from the front of `data`.
///
/// Trailing bytes are ignored; BMCs routinely append optional fields.
pub(crate) fn decode_fixed<T: FromBytes>(data: &[u8]) -> Result<T> {
    match T::read_from_prefix(data) {
        Ok((value, _rest)) => Ok(value),
        Err(_) => Err(CompletionCode::SHORT_PACKET.into()),
    }
}

/// NUL-pad a name into a fixed-size field, truncating at `N` bytes.
#[must_use]
pub fn nul_pad<const N: usize>(name: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let bytes = name.as_bytes();
    let len = bytes.len().min(N);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Strip trailing NUL padding from a fixed-size name field.
#[must_use]
pub fn nul_trim(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &field[..end]
}

/// Wire a fixed-layout record into [`Encode`].
macro_rules! impl_fixed_encode {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::codec::Encode for $ty {
            fn encode(&self, dst: &mut bytes::BytesMut) {
                $crate::codec::encode_fixed(self, dst);
            }
        }
    )*};
}

/// Wire a fixed-layout record (completion code first) into [`Response`].
macro_rules! impl_fixed_response {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::codec::Response for $ty {
            fn decode(data: &[u8]) -> $crate::errors::Result<Self> {
                $crate::codec::decode_fixed(data)
            }

            fn completion_code(&self) -> $crate::completion::CompletionCode {
                self.completion_code
            }
        }
    )*};
}

pub(crate) use {impl_fixed_encode, impl_fixed_response};
