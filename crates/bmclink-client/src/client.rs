//! Client façade: ergonomic, OEM-agnostic wrappers over a transport.

use bmclink_proto::payloads::app::{DeviceIdRequest, DeviceIdResponse};
use bmclink_proto::payloads::chassis::{
    BOOT_FLAG_EFI, BOOT_FLAG_VALID, BOOT_PARAM_BOOT_FLAGS, BOOT_PARAM_INFO_ACK,
    BOOT_PARAM_SET_IN_PROGRESS, BootDevice, ChassisControl, ChassisControlRequest,
    ChassisIdentifyRequest, ChassisStatusRequest, ChassisStatusResponse,
    SetSystemBootOptionsRequest, SystemBootOptionsRequest, SystemBootOptionsResponse,
};
use bmclink_proto::payloads::dcmi::{
    GetMcIdRequest, GetMcIdResponse, MAX_MC_ID_LEN, SetMcIdRequest, SetMcIdResponse,
};
use bmclink_proto::payloads::user::{GetUserNameRequest, GetUserNameResponse, SetUserNameRequest};
use bmclink_proto::{Command, CompletionCode, NetFn, Request, Response};

use crate::connection::Connection;
use crate::error::Result;
use crate::transport::{Transport, new_transport};

/// High-level IPMI client over a connection's transport.
///
/// One client serializes its own requests; concurrent sends on the same
/// client are not supported.
pub struct Client {
    connection: Connection,
    transport: Box<dyn Transport>,
}

impl Client {
    /// Build a client for the connection, selecting the transport from its
    /// interface and helper path.
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        let transport = new_transport(&connection);
        Self { connection, transport }
    }

    /// The connection this client was built from.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Open the transport (for LAN: dial and run the session handshake).
    pub async fn open(&mut self) -> Result<()> {
        self.transport.open().await
    }

    /// Close the transport, tearing down the session if one is active.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Execute one request and decode the typed response.
    ///
    /// # Errors
    ///
    /// A non-zero completion code is the error; retry on transient codes is
    /// the caller's decision.
    pub async fn send<R: Response>(&mut self, request: &Request) -> Result<R> {
        let data = self.transport.send(request).await?;
        Ok(R::decode(&data)?)
    }

    /// Query device identification.
    pub async fn device_id(&mut self) -> Result<DeviceIdResponse> {
        self.send(&Request::new(NetFn::APP, Command::GET_DEVICE_ID, &DeviceIdRequest)).await
    }

    /// Query chassis power and state.
    pub async fn chassis_status(&mut self) -> Result<ChassisStatusResponse> {
        self.send(&Request::new(NetFn::CHASSIS, Command::CHASSIS_STATUS, &ChassisStatusRequest))
            .await
    }

    /// Issue a chassis power control operation.
    pub async fn control(&mut self, control: ChassisControl) -> Result<()> {
        let _: CompletionCode = self
            .send(&Request::new(
                NetFn::CHASSIS,
                Command::CHASSIS_CONTROL,
                &ChassisControlRequest(control),
            ))
            .await?;
        Ok(())
    }

    /// Blink the chassis identify indicator for `interval` seconds, or
    /// indefinitely when `force_on` is set.
    pub async fn identify(&mut self, interval: u8, force_on: bool) -> Result<()> {
        let _: CompletionCode = self
            .send(&Request::new(
                NetFn::CHASSIS,
                Command::CHASSIS_IDENTIFY,
                &ChassisIdentifyRequest { interval, force_on: u8::from(force_on) },
            ))
            .await?;
        Ok(())
    }

    /// Select the device for the next boot.
    pub async fn set_boot_device(&mut self, device: BootDevice) -> Result<()> {
        self.set_boot_device_efi(device, false).await
    }

    /// Select the device for the next boot, optionally requesting an EFI
    /// environment.
    ///
    /// Follows the safe write sequence: mark set-in-progress, acknowledge
    /// outstanding boot info, write the flags, commit, and mark complete.
    /// The progress envelope is best-effort; a BMC that rejects the first
    /// set-in-progress write simply does not get the envelope. Only the
    /// boot-flags write decides the overall outcome.
    pub async fn set_boot_device_efi(&mut self, device: BootDevice, efi: bool) -> Result<()> {
        let use_progress =
            self.set_boot_param(BOOT_PARAM_SET_IN_PROGRESS, &[0x01]).await.is_ok();

        let mut flags = BOOT_FLAG_VALID;
        if efi {
            flags |= BOOT_FLAG_EFI;
        }

        let result = match self.set_boot_param(BOOT_PARAM_INFO_ACK, &[0x01, 0x01]).await {
            Ok(()) => {
                let written = self
                    .set_boot_param(
                        BOOT_PARAM_BOOT_FLAGS,
                        &[flags, device.selector_bits(), 0x00, 0x00, 0x00],
                    )
                    .await;
                if written.is_ok() && use_progress {
                    // commit-write; best effort
                    let _ = self.set_boot_param(BOOT_PARAM_SET_IN_PROGRESS, &[0x02]).await;
                }
                written
            }
            Err(err) => Err(err),
        };

        if use_progress {
            // set-complete; best effort
            let _ = self.set_boot_param(BOOT_PARAM_SET_IN_PROGRESS, &[0x00]).await;
        }

        result
    }

    /// Read one boot-option parameter.
    pub async fn boot_options(&mut self, param: u8) -> Result<SystemBootOptionsResponse> {
        self.send(&Request::new(
            NetFn::CHASSIS,
            Command::GET_SYSTEM_BOOT_OPTIONS,
            &SystemBootOptionsRequest { param },
        ))
        .await
    }

    async fn set_boot_param(&mut self, param: u8, data: &[u8]) -> Result<()> {
        let _: CompletionCode = self
            .send(&Request::new(
                NetFn::CHASSIS,
                Command::SET_SYSTEM_BOOT_OPTIONS,
                &SetSystemBootOptionsRequest::new(param, data),
            ))
            .await?;
        Ok(())
    }

    /// Read the name stored in a user slot, NUL-trimmed.
    pub async fn get_username(&mut self, user_id: u8) -> Result<String> {
        let response: GetUserNameResponse = self
            .send(&Request::new(
                NetFn::APP,
                Command::GET_USER_NAME,
                &GetUserNameRequest { user_id },
            ))
            .await?;
        Ok(response.username)
    }

    /// Store a name in a user slot, NUL-padded to 16 bytes.
    pub async fn set_username(&mut self, user_id: u8, username: &str) -> Result<()> {
        let _: CompletionCode = self
            .send(&Request::new(
                NetFn::APP,
                Command::SET_USER_NAME,
                &SetUserNameRequest { user_id, username: username.to_string() },
            ))
            .await?;
        Ok(())
    }

    /// Read the DCMI management controller ID string.
    pub async fn get_mc_id_string(&mut self) -> Result<String> {
        let response: GetMcIdResponse = self
            .send(&Request::new(
                NetFn::DCMI,
                Command::GET_MC_ID_STRING,
                &GetMcIdRequest::new(0, MAX_MC_ID_LEN as u8),
            ))
            .await?;
        Ok(response.data)
    }

    /// Write the DCMI management controller ID string.
    pub async fn set_mc_id_string(&mut self, id: &str) -> Result<()> {
        let _: SetMcIdResponse = self
            .send(&Request::new(NetFn::DCMI, Command::SET_MC_ID_STRING, &SetMcIdRequest::new(id)))
            .await?;
        Ok(())
    }
}
