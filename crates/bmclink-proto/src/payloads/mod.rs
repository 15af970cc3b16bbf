//! Request/response records for the supported command set.
//!
//! Records are grouped by network function: App session management in
//! [`app`], chassis power and boot options in [`chassis`], user credentials
//! in [`user`], and the DCMI group extension in [`dcmi`].
//!
//! The command byte in the header already identifies the payload type, so
//! records carry no discriminator of their own. Fixed-layout records derive
//! their codec; variable-length records implement it by hand.

pub mod app;
pub mod chassis;
pub mod dcmi;
pub mod user;

use bytes::{Bytes, BytesMut};

use crate::codec::Encode;

/// 6-bit network function: the functional class of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetFn(pub u8);

impl NetFn {
    /// Chassis commands.
    pub const CHASSIS: Self = Self(0x00);
    /// Application commands (device identification, session management).
    pub const APP: Self = Self(0x06);
    /// DCMI group extension.
    pub const DCMI: Self = Self(0x2c);

    /// The paired response network function (odd counterpart).
    #[must_use]
    pub fn response(self) -> Self {
        Self(self.0 | 0x01)
    }
}

/// One-byte command identifier within a network function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command(pub u8);

impl Command {
    /// App: Get Device ID.
    pub const GET_DEVICE_ID: Self = Self(0x01);
    /// App: Get Channel Authentication Capabilities.
    pub const GET_AUTH_CAPABILITIES: Self = Self(0x38);
    /// App: Get Session Challenge.
    pub const GET_SESSION_CHALLENGE: Self = Self(0x39);
    /// App: Activate Session.
    pub const ACTIVATE_SESSION: Self = Self(0x3a);
    /// App: Set Session Privilege Level.
    pub const SET_SESSION_PRIVILEGE_LEVEL: Self = Self(0x3b);
    /// App: Close Session.
    pub const CLOSE_SESSION: Self = Self(0x3c);
    /// App: Set User Name.
    pub const SET_USER_NAME: Self = Self(0x45);
    /// App: Get User Name.
    pub const GET_USER_NAME: Self = Self(0x46);

    /// Chassis: Get Chassis Status.
    pub const CHASSIS_STATUS: Self = Self(0x01);
    /// Chassis: Chassis Control.
    pub const CHASSIS_CONTROL: Self = Self(0x02);
    /// Chassis: Chassis Identify.
    pub const CHASSIS_IDENTIFY: Self = Self(0x04);
    /// Chassis: Set System Boot Options.
    pub const SET_SYSTEM_BOOT_OPTIONS: Self = Self(0x08);
    /// Chassis: Get System Boot Options.
    pub const GET_SYSTEM_BOOT_OPTIONS: Self = Self(0x09);

    /// DCMI: Get Management Controller ID String.
    pub const GET_MC_ID_STRING: Self = Self(0x09);
    /// DCMI: Set Management Controller ID String.
    pub const SET_MC_ID_STRING: Self = Self(0x0a);
}

/// A command request: network function, command byte, encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Network function the command belongs to.
    pub netfn: NetFn,
    /// Command byte.
    pub command: Command,
    /// Encoded payload bytes.
    pub data: Bytes,
}

impl Request {
    /// Build a request, encoding the payload eagerly.
    pub fn new(netfn: NetFn, command: Command, payload: &impl Encode) -> Self {
        let mut buf = BytesMut::new();
        payload.encode(&mut buf);
        Self { netfn, command, data: buf.freeze() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_netfn_sets_low_bit() {
        assert_eq!(NetFn(0x01), NetFn::CHASSIS.response());
        assert_eq!(NetFn(0x07), NetFn::APP.response());
    }

    #[test]
    fn request_encodes_payload_eagerly() {
        let req = Request::new(
            NetFn::APP,
            Command::SET_SESSION_PRIVILEGE_LEVEL,
            &app::SessionPrivilegeLevelRequest { priv_level: app::PRIV_LEVEL_ADMIN },
        );
        assert_eq!(&[0x04], req.data.as_ref());
    }
}
