//! App network-function records: device identification and the session
//! establishment sequence (auth capabilities, challenge, activate,
//! privilege, close).

use zerocopy::byteorder::little_endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::codec::{Encode, impl_fixed_encode, impl_fixed_response};
use crate::completion::CompletionCode;

/// Privilege level: callback.
pub const PRIV_LEVEL_CALLBACK: u8 = 0x01;
/// Privilege level: user.
pub const PRIV_LEVEL_USER: u8 = 0x02;
/// Privilege level: operator.
pub const PRIV_LEVEL_OPERATOR: u8 = 0x03;
/// Privilege level: administrator.
pub const PRIV_LEVEL_ADMIN: u8 = 0x04;

/// Channel number meaning "the LAN channel this request arrived on".
pub const LAN_CHANNEL_E: u8 = 0x0e;

/// Get Device ID request (no payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceIdRequest;

impl Encode for DeviceIdRequest {
    fn encode(&self, _dst: &mut bytes::BytesMut) {}
}

/// Get Device ID response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct DeviceIdResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Device ID.
    pub device_id: u8,
    /// Device revision.
    pub device_revision: u8,
    /// Firmware major revision.
    pub firmware_revision_1: u8,
    /// Firmware minor revision.
    pub firmware_revision_2: u8,
    /// IPMI version in BCD (0x51 for v1.5).
    pub ipmi_version: u8,
    /// Additional device support bitmask.
    pub additional_device_support: u8,
    /// Manufacturer OEM ID.
    pub manufacturer_id: little_endian::U16,
    /// Product ID.
    pub product_id: little_endian::U16,
}

/// Get Channel Authentication Capabilities request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct AuthCapabilitiesRequest {
    /// Channel to query ([`LAN_CHANNEL_E`] for the current LAN channel).
    pub channel_number: u8,
    /// Privilege level the caller intends to request.
    pub priv_level: u8,
}

/// Get Channel Authentication Capabilities response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct AuthCapabilitiesResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Channel the capabilities describe.
    pub channel_number: u8,
    /// Supported auth types; code `n` advertised at bit `n`.
    pub auth_type_support: u8,
    /// Channel status flags.
    pub status: u8,
    /// Reserved.
    pub reserved: u8,
    /// OEM ID.
    pub oem_id: little_endian::U16,
    /// OEM auxiliary data.
    pub oem_aux: u8,
}

/// Get Session Challenge request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct SessionChallengeRequest {
    /// Auth type the caller intends to use.
    pub auth_type: u8,
    /// User name, NUL-padded to 16 bytes.
    pub username: [u8; 16],
}

/// Get Session Challenge response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct SessionChallengeResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Temporary session ID for the activate exchange.
    pub temporary_session_id: little_endian::U32,
    /// Challenge string to echo in Activate Session.
    pub challenge: [u8; 16],
}

/// Activate Session request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct ActivateSessionRequest {
    /// Auth type for the session.
    pub auth_type: u8,
    /// Maximum privilege level requested.
    pub priv_level: u8,
    /// Challenge string from Get Session Challenge.
    pub auth_code: [u8; 16],
    /// Initial inbound sequence number (little-endian bytes).
    pub inbound_seq: [u8; 4],
}

/// Activate Session response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct ActivateSessionResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Auth type granted for the session.
    pub auth_type: u8,
    /// Session ID for all further requests.
    pub session_id: little_endian::U32,
    /// Initial inbound sequence number to use.
    pub inbound_seq: little_endian::U32,
    /// Maximum privilege level granted.
    pub max_priv: u8,
}

/// Set Session Privilege Level request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct SessionPrivilegeLevelRequest {
    /// Requested privilege level.
    pub priv_level: u8,
}

/// Set Session Privilege Level response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct SessionPrivilegeLevelResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Privilege level actually granted.
    pub new_privilege_level: u8,
}

/// Close Session request. The response is a bare completion code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct CloseSessionRequest {
    /// Session ID to close.
    pub session_id: little_endian::U32,
}

impl_fixed_encode!(
    DeviceIdResponse,
    AuthCapabilitiesRequest,
    AuthCapabilitiesResponse,
    SessionChallengeRequest,
    SessionChallengeResponse,
    ActivateSessionRequest,
    ActivateSessionResponse,
    SessionPrivilegeLevelRequest,
    SessionPrivilegeLevelResponse,
    CloseSessionRequest,
);

impl_fixed_response!(
    DeviceIdResponse,
    AuthCapabilitiesResponse,
    SessionChallengeResponse,
    ActivateSessionResponse,
    SessionPrivilegeLevelResponse,
);
