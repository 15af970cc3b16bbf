//! User credential records: get/set user name.
//!
//! Names are NUL-padded to 16 bytes on the wire and NUL-trimmed on read.

use bytes::{BufMut, BytesMut};

use crate::codec::{Encode, Response, nul_pad, nul_trim};
use crate::completion::CompletionCode;
use crate::errors::Result;

/// Maximum user name length in bytes.
pub const MAX_USERNAME_LEN: usize = 16;

/// Get User Name request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUserNameRequest {
    /// User slot to read.
    pub user_id: u8,
}

impl GetUserNameRequest {
    /// Parse a request (strictly one byte).
    pub fn parse(data: &[u8]) -> Result<Self> {
        match data {
            [] => Err(CompletionCode::SHORT_PACKET.into()),
            [user_id] => Ok(Self { user_id: *user_id }),
            _ => Err(CompletionCode::LONG_PACKET.into()),
        }
    }
}

impl Encode for GetUserNameRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.user_id);
    }
}

/// Get User Name response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetUserNameResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// User name with the padding removed.
    pub username: String,
}

impl Encode for GetUserNameResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.completion_code.0);
        dst.put_slice(&nul_pad::<MAX_USERNAME_LEN>(&self.username));
    }
}

impl Response for GetUserNameResponse {
    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 1 + MAX_USERNAME_LEN {
            return Err(CompletionCode::SHORT_PACKET.into());
        }
        Ok(Self {
            completion_code: CompletionCode(data[0]),
            username: String::from_utf8_lossy(nul_trim(&data[1..=MAX_USERNAME_LEN])).into_owned(),
        })
    }

    fn completion_code(&self) -> CompletionCode {
        self.completion_code
    }
}

/// Set User Name request. The response is a bare completion code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetUserNameRequest {
    /// User slot to write.
    pub user_id: u8,
    /// Name to store; padded to 16 bytes on the wire.
    pub username: String,
}

impl SetUserNameRequest {
    /// Parse a request (user ID plus padded name).
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() > 1 + MAX_USERNAME_LEN {
            return Err(CompletionCode::LONG_PACKET.into());
        }
        let (user_id, name) = data.split_first().ok_or(CompletionCode::SHORT_PACKET)?;
        Ok(Self {
            user_id: *user_id,
            username: String::from_utf8_lossy(nul_trim(name)).into_owned(),
        })
    }
}

impl Encode for SetUserNameRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.user_id);
        dst.put_slice(&nul_pad::<MAX_USERNAME_LEN>(&self.username));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_request_round_trip() {
        let req = SetUserNameRequest { user_id: 2, username: "vmware".to_string() };

        let mut buf = BytesMut::new();
        req.encode(&mut buf);
        assert_eq!(1 + MAX_USERNAME_LEN, buf.len());
        assert_eq!(2, buf[0]);
        assert_eq!(b"vmware", &buf[1..7]);
        assert_eq!(0, buf[7]);

        assert_eq!(req, SetUserNameRequest::parse(&buf).unwrap());
    }

    #[test]
    fn get_response_trims_padding() {
        let mut data = vec![0x00, b'r', b'o', b'o', b't'];
        data.resize(17, 0);

        let res = GetUserNameResponse::decode(&data).unwrap();
        assert_eq!("root", res.username);
    }

    #[test]
    fn get_response_requires_full_field() {
        let err = GetUserNameResponse::decode(&[0x00, b'r']).unwrap_err();
        assert_eq!(err, CompletionCode::SHORT_PACKET);
    }

    #[test]
    fn get_request_is_strict() {
        assert!(GetUserNameRequest::parse(&[]).is_err());
        assert!(GetUserNameRequest::parse(&[1, 2]).is_err());
        assert_eq!(
            GetUserNameRequest { user_id: 3 },
            GetUserNameRequest::parse(&[3]).unwrap()
        );
    }

    #[test]
    fn oversized_set_request_rejected() {
        let err = SetUserNameRequest::parse(&[0u8; 18]).unwrap_err();
        assert_eq!(err, CompletionCode::LONG_PACKET);
    }
}
