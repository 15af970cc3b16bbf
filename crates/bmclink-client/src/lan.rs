//! Native IPMI v1.5 LAN transport.
//!
//! Owns all session state: negotiated auth type, privilege level, session
//! ID, both sequence counters, and the active flag. No other component
//! reads it.
//!
//! # Session lifecycle
//!
//! ```text
//! IDLE ──dial UDP──▶ DIALED
//! DIALED ──Ping/Pong──▶ PINGED
//! PINGED ──GetAuthCaps──▶ AUTH_NEGOTIATED   (picks MD5 > Password > None)
//! AUTH_NEGOTIATED ──GetSessionChallenge──▶ CHALLENGED
//! CHALLENGED ──ActivateSession──▶ ACTIVE
//! ACTIVE ──SetSessionPrivilegeLevel──▶ READY
//! READY ──send(req)*──▶ READY
//! READY ──CloseSession──▶ CLOSED
//! any ──socket close──▶ TERMINATED
//! ```
//!
//! The handshake commands themselves run outside the authenticated window;
//! everything after a successful activate carries the session ID and, for
//! MD5 sessions, a per-packet auth code.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use md5::{Digest, Md5};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use zeroize::Zeroizing;

use bmclink_proto::asf::{ASF_TYPE_PONG, AsfMessage, Pong};
use bmclink_proto::payloads::app::{
    ActivateSessionRequest, ActivateSessionResponse, AuthCapabilitiesRequest,
    AuthCapabilitiesResponse, CloseSessionRequest, LAN_CHANNEL_E, PRIV_LEVEL_ADMIN,
    SessionChallengeRequest, SessionChallengeResponse, SessionPrivilegeLevelRequest,
    SessionPrivilegeLevelResponse,
};
use bmclink_proto::{
    AUTH_TYPE_MD5, AUTH_TYPE_NONE, AUTH_TYPE_PASSWORD, Command, CompletionCode, IPMI_BUF_SIZE,
    Message, NetFn, Request, Response, auth_type_bit, nul_pad,
};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Default receive deadline. A timed-out receive surfaces as
/// `COMMAND_TIMEOUT`; retrying is the caller's decision.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// IPMI v1.5 session transport over a connected UDP socket.
pub(crate) struct LanTransport {
    connection: Connection,
    socket: Option<UdpSocket>,
    auth_type: u8,
    sequence: u32,
    session_id: u32,
    rq_seq: u8,
    priv_level: u8,
    lun: u8,
    active: bool,
    timeout: Duration,
    username: [u8; 16],
    password: Zeroizing<[u8; 16]>,
}

impl LanTransport {
    pub(crate) fn new(connection: &Connection) -> Self {
        Self {
            username: nul_pad(&connection.username),
            password: Zeroizing::new(nul_pad(&connection.password)),
            connection: connection.clone(),
            socket: None,
            auth_type: AUTH_TYPE_NONE,
            sequence: 0,
            session_id: 0,
            rq_seq: 0,
            priv_level: PRIV_LEVEL_ADMIN,
            lun: 0,
            active: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Next value of the 6-bit request sequence, placed in bits 7..2 of the
    /// `rq_seq` byte with the requester LUN in the low bits. Wraps mod 64;
    /// never reused within a session.
    fn next_rq_seq(&mut self) -> u8 {
        self.rq_seq = (self.rq_seq + 1) & 0x3f;
        (self.rq_seq << 2) | (self.lun & 0x03)
    }

    /// Next inbound session sequence: the value granted by Activate-Session,
    /// advanced once per send while non-zero.
    fn next_sequence(&mut self) -> u32 {
        if self.sequence != 0 {
            self.sequence = self.sequence.wrapping_add(1);
        }
        self.sequence
    }

    /// Frame a request, applying the per-packet auth code when the session
    /// is active. For MD5 the packet is assembled with the password in the
    /// slot, hashed over the addressed message, and the slot overwritten in
    /// place.
    fn build_packet(&mut self, request: &Request) -> BytesMut {
        let rq_seq = self.next_rq_seq();
        let sequence = self.next_sequence();
        let authenticated = self.active && self.auth_type != AUTH_TYPE_NONE;

        let mut message =
            Message::request(request.netfn, request.command, rq_seq, request.data.to_vec());
        message.header.netfn_rslun = (request.netfn.0 << 2) | (self.lun & 0x03);
        message.session.sequence = sequence.into();
        message.session.session_id = self.session_id.into();
        if authenticated {
            message.session.auth_type = self.auth_type;
            message.auth_code = *self.password;
        }

        let mut wire = BytesMut::new();
        message.encode(&mut wire);

        if authenticated && self.auth_type == AUTH_TYPE_MD5 {
            let digest = self.auth_md5(&wire[Message::AUTH_BODY_OFFSET..], sequence);
            wire[Message::AUTH_CODE_OFFSET..Message::AUTH_CODE_OFFSET + Message::AUTH_CODE_LEN]
                .copy_from_slice(&digest);
        }

        wire
    }

    /// Per-packet auth code per IPMI v1.5 section 22.17.1:
    /// `MD5(password ‖ session_id ‖ message ‖ sequence ‖ password)` with the
    /// integers little-endian and `message` running from `rs_addr` through
    /// the payload checksum.
    fn auth_md5(&self, message: &[u8], sequence: u32) -> [u8; 16] {
        let mut hasher = Md5::new();
        hasher.update(*self.password);
        hasher.update(self.session_id.to_le_bytes());
        hasher.update(message);
        hasher.update(sequence.to_le_bytes());
        hasher.update(*self.password);
        hasher.finalize().into()
    }

    async fn send_packet(&self, packet: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotOpen)?;
        socket.send(packet).await?;
        Ok(())
    }

    async fn recv_packet(&self) -> Result<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(Error::NotOpen)?;
        let mut buf = vec![0u8; IPMI_BUF_SIZE];
        let n = timeout(self.timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| Error::from(CompletionCode::COMMAND_TIMEOUT))??;
        buf.truncate(n);
        Ok(buf)
    }

    async fn transact(&mut self, request: &Request) -> Result<Message> {
        let packet = self.build_packet(request);
        self.send_packet(&packet).await?;
        let reply = self.recv_packet().await?;
        Ok(Message::decode(&reply)?)
    }

    async fn call<R: Response>(&mut self, request: &Request) -> Result<R> {
        let message = self.transact(request).await?;
        Ok(message.parse_response()?)
    }

    async fn open_session(&mut self) -> Result<()> {
        self.ping().await?;
        self.get_auth_capabilities().await?;
        let challenge = self.get_session_challenge().await?;
        self.activate_session(&challenge).await?;
        self.set_session_priv().await
    }

    async fn ping(&mut self) -> Result<()> {
        let mut packet = BytesMut::new();
        AsfMessage::ping().encode(&mut packet);
        self.send_packet(&packet).await?;

        let reply = self.recv_packet().await?;
        let message = AsfMessage::decode(&reply)?;
        if message.asf.message_type != ASF_TYPE_PONG {
            return Err(message.unsupported_message_type().into());
        }

        let pong: Pong = message.parse_data()?;
        if !pong.supports_ipmi() {
            return Err(Error::IpmiUnsupported);
        }
        Ok(())
    }

    async fn get_auth_capabilities(&mut self) -> Result<()> {
        let request = Request::new(
            NetFn::APP,
            Command::GET_AUTH_CAPABILITIES,
            &AuthCapabilitiesRequest {
                channel_number: LAN_CHANNEL_E,
                priv_level: self.priv_level,
            },
        );
        let response: AuthCapabilitiesResponse = self.call(&request).await?;

        for candidate in [AUTH_TYPE_MD5, AUTH_TYPE_PASSWORD, AUTH_TYPE_NONE] {
            if response.auth_type_support & auth_type_bit(candidate) != 0 {
                self.auth_type = candidate;
                tracing::debug!(auth_type = candidate, "negotiated authentication type");
                return Ok(());
            }
        }

        tracing::warn!(
            offered = response.auth_type_support,
            "BMC did not offer a supported auth type"
        );
        Err(CompletionCode::INSUFFICIENT_PRIVILEGE.into())
    }

    async fn get_session_challenge(&mut self) -> Result<SessionChallengeResponse> {
        let request = Request::new(
            NetFn::APP,
            Command::GET_SESSION_CHALLENGE,
            &SessionChallengeRequest { auth_type: self.auth_type, username: self.username },
        );
        let response: SessionChallengeResponse = self.call(&request).await?;

        self.session_id = response.temporary_session_id.get();
        Ok(response)
    }

    async fn activate_session(&mut self, challenge: &SessionChallengeResponse) -> Result<()> {
        let request = Request::new(
            NetFn::APP,
            Command::ACTIVATE_SESSION,
            &ActivateSessionRequest {
                auth_type: self.auth_type,
                priv_level: self.priv_level,
                auth_code: challenge.challenge,
                inbound_seq: rand::random(),
            },
        );

        // The activate request itself must carry the auth code.
        self.active = true;
        let response: ActivateSessionResponse = match self.call(&request).await {
            Ok(response) => response,
            Err(err) => {
                self.active = false;
                return Err(err);
            }
        };

        self.session_id = response.session_id.get();
        self.auth_type = response.auth_type;
        self.sequence = response.inbound_seq.get();
        tracing::debug!(session_id = self.session_id, "session activated");
        Ok(())
    }

    async fn set_session_priv(&mut self) -> Result<()> {
        let request = Request::new(
            NetFn::APP,
            Command::SET_SESSION_PRIVILEGE_LEVEL,
            &SessionPrivilegeLevelRequest { priv_level: self.priv_level },
        );
        let response: SessionPrivilegeLevelResponse = self.call(&request).await?;

        self.priv_level = response.new_privilege_level;
        Ok(())
    }

    async fn close_session(&mut self) -> Result<()> {
        let request = Request::new(
            NetFn::APP,
            Command::CLOSE_SESSION,
            &CloseSessionRequest { session_id: self.session_id.into() },
        );
        let _: CompletionCode = self.call(&request).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for LanTransport {
    async fn open(&mut self) -> Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket
            .connect((self.connection.hostname.as_str(), self.connection.port()))
            .await?;
        self.socket = Some(socket);
        self.open_session().await
    }

    async fn close(&mut self) -> Result<()> {
        if self.active {
            if let Err(err) = self.close_session().await {
                tracing::warn!(%err, "error closing session");
            }
            self.active = false;
        }
        self.socket = None;
        Ok(())
    }

    async fn send(&mut self, request: &Request) -> Result<Vec<u8>> {
        let message = self.transact(request).await?;
        let code = CompletionCode::decode(&message.data).map_err(Error::Protocol)?;
        if !code.is_success() {
            return Err(code.into());
        }
        Ok(message.data)
    }
}
