//! Chassis network-function records: status, power control, identify, and
//! system boot options.

use bytes::{BufMut, BytesMut};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::codec::{Encode, Response, impl_fixed_encode};
use crate::completion::CompletionCode;
use crate::errors::Result;

/// Power state: system power is on.
pub const SYSTEM_POWER: u8 = 0x01;
/// Power state: power overload.
pub const POWER_OVERLOAD: u8 = 0x02;
/// Power state: interlock active.
pub const POWER_INTERLOCK: u8 = 0x04;
/// Power state: main power fault.
pub const MAIN_POWER_FAULT: u8 = 0x08;
/// Power state: power control fault.
pub const POWER_CONTROL_FAULT: u8 = 0x10;

/// Power restore policy: stay off after AC returns.
pub const POWER_RESTORE_POLICY_ALWAYS_OFF: u8 = 0x00;
/// Power restore policy: restore previous state.
pub const POWER_RESTORE_POLICY_PREVIOUS: u8 = 0x01;
/// Power restore policy: power up after AC returns.
pub const POWER_RESTORE_POLICY_ALWAYS_ON: u8 = 0x02;
/// Power restore policy: unknown.
pub const POWER_RESTORE_POLICY_UNKNOWN: u8 = 0x03;

/// Last power event: AC failed.
pub const POWER_EVENT_AC_FAILED: u8 = 0x01;
/// Last power event: overload.
pub const POWER_EVENT_OVERLOAD: u8 = 0x02;
/// Last power event: interlock.
pub const POWER_EVENT_INTERLOCK: u8 = 0x04;
/// Last power event: fault.
pub const POWER_EVENT_FAULT: u8 = 0x08;
/// Last power event: power-on via command.
pub const POWER_EVENT_COMMAND: u8 = 0x10;

/// Chassis state: intrusion detected.
pub const CHASSIS_INTRUSION: u8 = 0x01;
/// Chassis state: front panel lockout.
pub const FRONT_PANEL_LOCKOUT: u8 = 0x02;
/// Chassis state: drive fault.
pub const DRIVE_FAULT: u8 = 0x04;
/// Chassis state: cooling fan fault.
pub const COOLING_FAN_FAULT: u8 = 0x08;

/// Front panel: sleep button disable allowed.
pub const SLEEP_BUTTON_DISABLE: u8 = 0x80;
/// Front panel: diagnostic button disable allowed.
pub const DIAG_BUTTON_DISABLE: u8 = 0x40;
/// Front panel: reset button disable allowed.
pub const RESET_BUTTON_DISABLE: u8 = 0x20;
/// Front panel: power button disable allowed.
pub const POWER_BUTTON_DISABLE: u8 = 0x10;
/// Front panel: sleep button disabled.
pub const SLEEP_BUTTON_DISABLED: u8 = 0x08;
/// Front panel: diagnostic button disabled.
pub const DIAG_BUTTON_DISABLED: u8 = 0x04;
/// Front panel: reset button disabled.
pub const RESET_BUTTON_DISABLED: u8 = 0x02;
/// Front panel: power button disabled.
pub const POWER_BUTTON_DISABLED: u8 = 0x01;

/// Chassis power control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChassisControl {
    /// Power down.
    PowerDown = 0x00,
    /// Power up.
    PowerUp = 0x01,
    /// Power cycle.
    PowerCycle = 0x02,
    /// Hard reset.
    HardReset = 0x03,
    /// Pulse diagnostic interrupt.
    PulseDiag = 0x04,
    /// Soft shutdown via ACPI.
    AcpiSoft = 0x05,
}

impl std::fmt::Display for ChassisControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PowerDown => "down",
            Self::PowerUp => "up",
            Self::PowerCycle => "cycle",
            Self::HardReset => "reset",
            Self::PulseDiag => "diag",
            Self::AcpiSoft => "acpi",
        };
        f.write_str(name)
    }
}

/// Chassis Control request. The response is a bare completion code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChassisControlRequest(pub ChassisControl);

impl Encode for ChassisControlRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.0 as u8);
    }
}

/// Chassis Identify request: blink the identify indicator. The response is a
/// bare completion code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, KnownLayout, Immutable,
    Unaligned,
)]
#[repr(C)]
pub struct ChassisIdentifyRequest {
    /// Identify interval in seconds (ignored when forced on).
    pub interval: u8,
    /// Non-zero keeps the indicator on until overridden.
    pub force_on: u8,
}

/// Get Chassis Status request (no payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChassisStatusRequest;

impl Encode for ChassisStatusRequest {
    fn encode(&self, _dst: &mut BytesMut) {}
}

/// Get Chassis Status response.
///
/// The front-panel byte is optional on the wire; absent means zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChassisStatusResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Current power state bits plus restore policy in bits 6..5.
    pub power_state: u8,
    /// Last power event bits.
    pub last_power_event: u8,
    /// Misc chassis state bits.
    pub state: u8,
    /// Front panel button capability/disable bits (optional).
    pub front_control_panel: u8,
}

impl ChassisStatusResponse {
    /// True when the system power bit is set.
    #[must_use]
    pub fn is_power_on(&self) -> bool {
        self.power_state & SYSTEM_POWER == SYSTEM_POWER
    }

    /// The configured power restore policy (bits 6..5 of the power state).
    #[must_use]
    pub fn power_restore_policy(&self) -> u8 {
        (self.power_state & 0x60) >> 5
    }
}

impl std::fmt::Display for ChassisStatusResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_power_on() { "on" } else { "off" })
    }
}

impl Encode for ChassisStatusResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.completion_code.0);
        dst.put_u8(self.power_state);
        dst.put_u8(self.last_power_event);
        dst.put_u8(self.state);
        dst.put_u8(self.front_control_panel);
    }
}

impl Response for ChassisStatusResponse {
    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(CompletionCode::SHORT_PACKET.into());
        }
        Ok(Self {
            completion_code: CompletionCode(data[0]),
            power_state: data[1],
            last_power_event: data[2],
            state: data[3],
            // optional on the wire
            front_control_panel: data.get(4).copied().unwrap_or(0),
        })
    }

    fn completion_code(&self) -> CompletionCode {
        self.completion_code
    }
}

/// One-shot boot device, in the IPMI boot-flags byte encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootDevice {
    /// No override.
    None = 0x00,
    /// Force PXE boot.
    Pxe = 0x04,
    /// Force boot from default hard drive.
    Disk = 0x08,
    /// Force boot from default hard drive, safe mode.
    Safe = 0x0c,
    /// Force boot from diagnostic partition.
    Diag = 0x10,
    /// Force boot from CD/DVD.
    Cdrom = 0x14,
    /// Force boot into BIOS setup.
    Bios = 0x18,
    /// Force boot from remotely connected floppy.
    RemoteFloppy = 0x1c,
    /// Force boot from remotely connected CD/DVD.
    RemoteCdrom = 0x20,
    /// Force boot from primary remote media.
    RemotePrimary = 0x24,
    /// Force boot from remotely connected hard drive.
    RemoteDisk = 0x2c,
    /// Force boot from floppy.
    Floppy = 0x3c,
}

impl BootDevice {
    /// The device encoded as boot-flags data byte 1: the 4-bit selector in
    /// bits 5..2.
    #[must_use]
    pub fn selector_bits(self) -> u8 {
        ((self as u8 >> 2) & 0x0f) << 2
    }

    /// Recover the device from boot-flags data byte 1.
    #[must_use]
    pub fn from_selector_bits(byte: u8) -> Option<Self> {
        match ((byte >> 2) & 0x0f) << 2 {
            0x00 => Some(Self::None),
            0x04 => Some(Self::Pxe),
            0x08 => Some(Self::Disk),
            0x0c => Some(Self::Safe),
            0x10 => Some(Self::Diag),
            0x14 => Some(Self::Cdrom),
            0x18 => Some(Self::Bios),
            0x1c => Some(Self::RemoteFloppy),
            0x20 => Some(Self::RemoteCdrom),
            0x24 => Some(Self::RemotePrimary),
            0x2c => Some(Self::RemoteDisk),
            0x3c => Some(Self::Floppy),
            _ => None,
        }
    }
}

impl std::fmt::Display for BootDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Pxe => "pxe",
            Self::Disk => "disk",
            Self::Safe => "safe",
            Self::Diag => "diag",
            Self::Cdrom => "cdrom",
            Self::Bios => "bios",
            Self::RemoteFloppy => "remote-floppy",
            Self::RemoteCdrom => "remote-cdrom",
            Self::RemotePrimary => "remote-primary",
            Self::RemoteDisk => "remote-disk",
            Self::Floppy => "floppy",
        };
        f.write_str(name)
    }
}

/// Boot option parameter: set-in-progress marker.
pub const BOOT_PARAM_SET_IN_PROGRESS: u8 = 0x00;
/// Boot option parameter: boot info acknowledge (2 bytes).
pub const BOOT_PARAM_INFO_ACK: u8 = 0x01;
/// Boot option parameter: boot flags (5 bytes).
pub const BOOT_PARAM_BOOT_FLAGS: u8 = 0x05;

/// Boot-flags byte 0: flags valid for the next boot.
pub const BOOT_FLAG_VALID: u8 = 0x80;
/// Boot-flags byte 0: boot into an EFI environment.
pub const BOOT_FLAG_EFI: u8 = 0x20;

/// Set System Boot Options request: parameter ID plus parameter data. The
/// response is a bare completion code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSystemBootOptionsRequest {
    /// Parameter selector.
    pub param: u8,
    /// Parameter data.
    pub data: Vec<u8>,
}

impl SetSystemBootOptionsRequest {
    /// Build a set request for one parameter.
    #[must_use]
    pub fn new(param: u8, data: &[u8]) -> Self {
        Self { param, data: data.to_vec() }
    }

    /// Parse a set request (parameter ID at byte 0).
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (param, rest) = data.split_first().ok_or(CompletionCode::SHORT_PACKET)?;
        Ok(Self { param: *param, data: rest.to_vec() })
    }
}

impl Encode for SetSystemBootOptionsRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.param);
        dst.put_slice(&self.data);
    }
}

/// Get System Boot Options request: parameter selector plus set/block
/// selectors (always zero here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemBootOptionsRequest {
    /// Parameter selector.
    pub param: u8,
}

impl Encode for SystemBootOptionsRequest {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.param & 0x7f);
        dst.put_u8(0x00);
        dst.put_u8(0x00);
    }
}

/// Get System Boot Options response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemBootOptionsResponse {
    /// Completion code.
    pub completion_code: CompletionCode,
    /// Parameter version.
    pub version: u8,
    /// Parameter selector (bit 7 set means the parameter is invalid).
    pub param: u8,
    /// Parameter data.
    pub data: Vec<u8>,
}

impl SystemBootOptionsResponse {
    /// The boot device selected in boot-flags parameter data.
    #[must_use]
    pub fn boot_device_selector(&self) -> Option<BootDevice> {
        self.data.get(1).copied().and_then(BootDevice::from_selector_bits)
    }
}

impl Encode for SystemBootOptionsResponse {
    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.completion_code.0);
        dst.put_u8(self.version);
        dst.put_u8(self.param);
        dst.put_slice(&self.data);
    }
}

impl Response for SystemBootOptionsResponse {
    fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 3 {
            return Err(CompletionCode::SHORT_PACKET.into());
        }
        Ok(Self {
            completion_code: CompletionCode(data[0]),
            version: data[1],
            param: data[2],
            data: data[3..].to_vec(),
        })
    }

    fn completion_code(&self) -> CompletionCode {
        self.completion_code
    }
}

impl_fixed_encode!(ChassisIdentifyRequest);
