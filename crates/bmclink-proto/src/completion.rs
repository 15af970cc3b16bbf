//! IPMI completion codes.
//!
//! The completion code is the first byte of every IPMI response payload and
//! doubles as the library's primary error carrier: a non-zero code is
//! surfaced to the caller as-is, so remote conditions (busy, timeout,
//! insufficient privilege) and codec-level failures (short packet, bad
//! checksum) live in one taxonomy and can be matched against the constants
//! below.

use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// One-byte IPMI completion code.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Default, Error, FromBytes, IntoBytes, KnownLayout,
    Immutable, Unaligned,
)]
#[error("{} ({:#04x})", self.describe(), self.0)]
#[repr(transparent)]
pub struct CompletionCode(pub u8);

impl CompletionCode {
    /// Command completed normally.
    pub const COMPLETED: Self = Self(0x00);
    /// Node busy; the request may be retried.
    pub const NODE_BUSY: Self = Self(0xc0);
    /// Unrecognized or unsupported command.
    pub const INVALID_COMMAND: Self = Self(0xc1);
    /// Command invalid for the given LUN.
    pub const INVALID_LUN_COMMAND: Self = Self(0xc2);
    /// Timeout while processing the command; may be retried.
    pub const COMMAND_TIMEOUT: Self = Self(0xc3);
    /// Out of space.
    pub const OUT_OF_SPACE: Self = Self(0xc4);
    /// Reservation canceled or invalid reservation ID.
    pub const INVALID_RESERVATION: Self = Self(0xc5);
    /// Request data truncated.
    pub const DATA_TRUNCATED: Self = Self(0xc6);
    /// Request data length invalid.
    pub const SHORT_PACKET: Self = Self(0xc7);
    /// Request data field length limit exceeded.
    pub const LONG_PACKET: Self = Self(0xc8);
    /// Parameter out of range.
    pub const PARAM_RANGE: Self = Self(0xc9);
    /// Cannot return the number of requested data bytes.
    pub const CANNOT_RETURN_DATA: Self = Self(0xca);
    /// Requested sensor, data, or record not present.
    pub const NOT_PRESENT: Self = Self(0xcb);
    /// Invalid data field in request (includes checksum mismatches).
    pub const INVALID_PACKET: Self = Self(0xcc);
    /// Command illegal for the specified sensor or record type.
    pub const ILLEGAL_COMMAND: Self = Self(0xcd);
    /// Command response could not be provided.
    pub const NO_RESPONSE: Self = Self(0xce);
    /// Cannot execute duplicated request.
    pub const DUPLICATE_REQUEST: Self = Self(0xcf);
    /// SDR repository in update mode.
    pub const SDR_UPDATE_MODE: Self = Self(0xd0);
    /// Device in firmware update mode.
    pub const FIRMWARE_UPDATE_MODE: Self = Self(0xd1);
    /// BMC initialization in progress.
    pub const INIT_IN_PROGRESS: Self = Self(0xd2);
    /// Destination unavailable.
    pub const DESTINATION_UNAVAILABLE: Self = Self(0xd3);
    /// Insufficient privilege level.
    pub const INSUFFICIENT_PRIVILEGE: Self = Self(0xd4);
    /// Command or parameter not supported in the present state.
    pub const UNSUPPORTED_STATE: Self = Self(0xd5);
    /// Unspecified error.
    pub const UNSPECIFIED: Self = Self(0xff);

    /// Raw code byte.
    #[must_use]
    pub fn code(self) -> u8 {
        self.0
    }

    /// True for the normal-completion code.
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::COMPLETED
    }

    /// Returns true if the remote condition is transient and the request may
    /// succeed on retry. Everything else is fatal for the current request.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::NODE_BUSY | Self::COMMAND_TIMEOUT)
    }

    fn describe(self) -> &'static str {
        match self {
            Self::COMPLETED => "command completed normally",
            Self::NODE_BUSY => "node busy",
            Self::INVALID_COMMAND => "unrecognized or unsupported command",
            Self::INVALID_LUN_COMMAND => "command invalid for given LUN",
            Self::COMMAND_TIMEOUT => "timeout while processing command",
            Self::OUT_OF_SPACE => "out of space",
            Self::INVALID_RESERVATION => "reservation canceled or invalid reservation ID",
            Self::DATA_TRUNCATED => "request data truncated",
            Self::SHORT_PACKET => "request data length invalid",
            Self::LONG_PACKET => "request data field length limit exceeded",
            Self::PARAM_RANGE => "parameter out of range",
            Self::CANNOT_RETURN_DATA => "cannot return number of requested data bytes",
            Self::NOT_PRESENT => "requested sensor, data, or record not present",
            Self::INVALID_PACKET => "invalid data field in request",
            Self::ILLEGAL_COMMAND => "command illegal for specified sensor or record type",
            Self::NO_RESPONSE => "command response could not be provided",
            Self::DUPLICATE_REQUEST => "cannot execute duplicated request",
            Self::SDR_UPDATE_MODE => "SDR repository in update mode",
            Self::FIRMWARE_UPDATE_MODE => "device in firmware update mode",
            Self::INIT_IN_PROGRESS => "BMC initialization in progress",
            Self::DESTINATION_UNAVAILABLE => "destination unavailable",
            Self::INSUFFICIENT_PRIVILEGE => "insufficient privilege level",
            Self::UNSUPPORTED_STATE => "command or parameter not supported in present state",
            Self::UNSPECIFIED => "unspecified error",
            _ => "unknown completion code",
        }
    }
}

impl std::fmt::Debug for CompletionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompletionCode({:#04x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_an_error_value() {
        let err: Box<dyn std::error::Error> = Box::new(CompletionCode::INVALID_COMMAND);
        assert_eq!("unrecognized or unsupported command (0xc1)", err.to_string());
    }

    #[test]
    fn retryable_codes() {
        assert!(CompletionCode::NODE_BUSY.is_retryable());
        assert!(CompletionCode::COMMAND_TIMEOUT.is_retryable());
        assert!(!CompletionCode::INVALID_COMMAND.is_retryable());
        assert!(!CompletionCode::INSUFFICIENT_PRIVILEGE.is_retryable());
        assert!(!CompletionCode::COMPLETED.is_retryable());
    }

    #[test]
    fn unknown_code_still_displays() {
        assert_eq!("unknown completion code (0x42)", CompletionCode(0x42).to_string());
    }
}
