//! UDP-listening BMC simulator.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::BytesMut;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use bmclink_client::{Connection, Interface};
use bmclink_proto::asf::{ASF_IANA, ASF_TYPE_PING, ASF_TYPE_PONG, AsfMessage, Pong};
use bmclink_proto::payloads::app::{
    ActivateSessionResponse, AuthCapabilitiesResponse, DeviceIdResponse, PRIV_LEVEL_ADMIN,
    SessionChallengeResponse, SessionPrivilegeLevelResponse,
};
use bmclink_proto::payloads::chassis::{
    ChassisStatusResponse, SYSTEM_POWER, SystemBootOptionsResponse,
};
use bmclink_proto::{
    AUTH_TYPE_MD5, AUTH_TYPE_NONE, AUTH_TYPE_PASSWORD, Command, CompletionCode, Encode,
    IPMI_BUF_SIZE, Message, NetFn, RMCP_CLASS_ASF, RMCP_CLASS_IPMI, RmcpHeader, auth_type_bit,
    nul_trim,
};

/// A command handler: inspects the decoded request and produces any
/// encodable response (typically a catalogue record or a bare completion
/// code).
pub type Handler = Box<dyn FnMut(&Message) -> Box<dyn Encode + Send> + Send>;

struct SimulatorState {
    handlers: Mutex<HashMap<(NetFn, Command), Handler>>,
    /// Session ID -> user name, filled by the session-challenge handler so
    /// later requests can be attributed to their caller.
    identities: Mutex<HashMap<u32, String>>,
    /// Boot-option parameter store, round-tripped by the set/get handlers.
    boot_options: Mutex<HashMap<u8, Vec<u8>>>,
}

/// In-process BMC bound to a local UDP address.
///
/// The accept loop runs on its own task between [`Simulator::run`] and
/// [`Simulator::stop`]; handlers are invoked synchronously on that task.
pub struct Simulator {
    socket: Arc<UdpSocket>,
    addr: SocketAddr,
    state: Arc<SimulatorState>,
    serve_task: Option<JoinHandle<()>>,
}

impl Simulator {
    /// Bind the simulator to `addr` (use port 0 for an ephemeral port).
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let addr = socket.local_addr()?;

        Ok(Self {
            socket: Arc::new(socket),
            addr,
            state: Arc::new(SimulatorState {
                handlers: Mutex::new(HashMap::new()),
                identities: Mutex::new(HashMap::new()),
                boot_options: Mutex::new(HashMap::new()),
            }),
            serve_task: None,
        })
    }

    /// The concrete address the simulator bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// A connection descriptor pointing at this simulator over the native
    /// LAN transport. Credentials are left for the test to fill in.
    #[must_use]
    pub fn new_connection(&self) -> Connection {
        Connection {
            hostname: self.addr.ip().to_string(),
            port: Some(self.addr.port()),
            username: String::new(),
            password: String::new(),
            interface: Interface::Lan,
            path: None,
        }
    }

    /// Install or replace the handler for one (netfn, command) pair. Also
    /// overrides the built-in behavior, including for error injection.
    pub fn set_handler<F>(&self, netfn: NetFn, command: Command, handler: F)
    where
        F: FnMut(&Message) -> Box<dyn Encode + Send> + Send + 'static,
    {
        lock(&self.state.handlers).insert((netfn, command), Box::new(handler));
    }

    /// Start the accept loop.
    pub fn run(&mut self) {
        let socket = Arc::clone(&self.socket);
        let state = Arc::clone(&self.state);
        self.serve_task = Some(tokio::spawn(serve(socket, state)));
    }

    /// Stop the accept loop.
    pub fn stop(&mut self) {
        if let Some(task) = self.serve_task.take() {
            task.abort();
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn serve(socket: Arc<UdpSocket>, state: Arc<SimulatorState>) {
    let mut buf = vec![0u8; IPMI_BUF_SIZE];

    loop {
        let (n, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(_) => return,
        };

        let reply = match dispatch(&state, &buf[..n]) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(%err, "dropping malformed datagram");
                continue;
            }
        };

        if socket.send_to(&reply, peer).await.is_err() {
            return;
        }
    }
}

fn dispatch(state: &SimulatorState, packet: &[u8]) -> bmclink_proto::Result<Vec<u8>> {
    let rmcp = RmcpHeader::read(packet)?;
    match rmcp.class {
        RMCP_CLASS_ASF => asf_reply(packet),
        RMCP_CLASS_IPMI => ipmi_reply(state, packet),
        _ => Err(rmcp.unsupported_class()),
    }
}

fn asf_reply(packet: &[u8]) -> bmclink_proto::Result<Vec<u8>> {
    let mut message = AsfMessage::decode(packet)?;
    if message.asf.message_type != ASF_TYPE_PING {
        return Err(message.unsupported_message_type());
    }

    message.asf.message_type = ASF_TYPE_PONG;
    let pong = Pong {
        iana: ASF_IANA.into(),
        oem: 0.into(),
        supported_entities: Pong::ENTITY_IPMI | 0x01,
        supported_interactions: 0,
        reserved: [0; 6],
    };
    let mut data = BytesMut::new();
    pong.encode(&mut data);
    message.data = data.to_vec();

    let mut wire = BytesMut::new();
    message.encode(&mut wire);
    Ok(wire.to_vec())
}

fn ipmi_reply(state: &SimulatorState, packet: &[u8]) -> bmclink_proto::Result<Vec<u8>> {
    let mut message = Message::decode(packet)?;
    let session_id = message.session.session_id.get();
    message.requester = lock(&state.identities).get(&session_id).cloned();

    let key = (message.netfn(), message.command());

    // Take the handler out for the call so a handler may itself install or
    // replace handlers without deadlocking on the table.
    let handler = lock(&state.handlers).remove(&key);
    let response = match handler {
        Some(mut handler) => {
            let response = handler(&message);
            lock(&state.handlers).entry(key).or_insert(handler);
            response
        }
        None => builtin(state, &message),
    };

    let mut data = BytesMut::new();
    response.encode(&mut data);
    message.data = data.to_vec();

    let mut wire = BytesMut::new();
    message.encode(&mut wire);
    Ok(wire.to_vec())
}

/// Built-in minimal-BMC behavior for commands without an installed handler.
fn builtin(state: &SimulatorState, message: &Message) -> Box<dyn Encode + Send> {
    match (message.netfn(), message.command()) {
        (NetFn::APP, Command::GET_DEVICE_ID) => Box::new(DeviceIdResponse {
            completion_code: CompletionCode::COMPLETED,
            ipmi_version: 0x51,
            ..Default::default()
        }),

        (NetFn::APP, Command::GET_AUTH_CAPABILITIES) => Box::new(AuthCapabilitiesResponse {
            completion_code: CompletionCode::COMPLETED,
            channel_number: 0x01,
            auth_type_support: auth_type_bit(AUTH_TYPE_NONE)
                | auth_type_bit(AUTH_TYPE_MD5)
                | auth_type_bit(AUTH_TYPE_PASSWORD),
            ..Default::default()
        }),

        (NetFn::APP, Command::GET_SESSION_CHALLENGE) => session_challenge(state, message),

        (NetFn::APP, Command::ACTIVATE_SESSION) => Box::new(ActivateSessionResponse {
            completion_code: CompletionCode::COMPLETED,
            auth_type: message.session.auth_type,
            session_id: message.session.session_id,
            inbound_seq: message.session.sequence,
            max_priv: PRIV_LEVEL_ADMIN,
        }),

        (NetFn::APP, Command::SET_SESSION_PRIVILEGE_LEVEL) => match message.data.first() {
            Some(priv_level) => Box::new(SessionPrivilegeLevelResponse {
                completion_code: CompletionCode::COMPLETED,
                new_privilege_level: *priv_level,
            }),
            None => Box::new(CompletionCode::INVALID_PACKET),
        },

        (NetFn::APP, Command::CLOSE_SESSION) => Box::new(CompletionCode::COMPLETED),

        (NetFn::CHASSIS, Command::CHASSIS_STATUS) => Box::new(ChassisStatusResponse {
            completion_code: CompletionCode::COMPLETED,
            power_state: SYSTEM_POWER,
            ..Default::default()
        }),

        (NetFn::CHASSIS, Command::SET_SYSTEM_BOOT_OPTIONS) => match message.data.split_first() {
            Some((param, data)) => {
                lock(&state.boot_options).insert(*param, data.to_vec());
                Box::new(CompletionCode::COMPLETED)
            }
            None => Box::new(CompletionCode::INVALID_PACKET),
        },

        (NetFn::CHASSIS, Command::GET_SYSTEM_BOOT_OPTIONS) => match message.data.first() {
            Some(param) => {
                let param = param & 0x7f;
                let data = lock(&state.boot_options).get(&param).cloned().unwrap_or_default();
                Box::new(SystemBootOptionsResponse {
                    completion_code: CompletionCode::COMPLETED,
                    version: 0x01,
                    param,
                    data,
                })
            }
            None => Box::new(CompletionCode::INVALID_PACKET),
        },

        _ => Box::new(CompletionCode::INVALID_COMMAND),
    }
}

/// Derive a deterministic session ID from the requested user name: hash the
/// name bytes, then take the 32-bit Adler digest. The ID is echoed by every
/// later request in the session, which is what lets the simulator attribute
/// requests to users.
fn session_challenge(state: &SimulatorState, message: &Message) -> Box<dyn Encode + Send> {
    let Some(name_field) = message.data.get(1..17) else {
        return Box::new(CompletionCode::INVALID_PACKET);
    };
    let username = String::from_utf8_lossy(nul_trim(name_field)).into_owned();

    let mut hasher = adler2::Adler32::new();
    hasher.write_slice(username.as_bytes());
    let session_id = hasher.checksum();

    lock(&state.identities).insert(session_id, username);

    Box::new(SessionChallengeResponse {
        completion_code: CompletionCode::COMPLETED,
        temporary_session_id: session_id.into(),
        ..Default::default()
    })
}
