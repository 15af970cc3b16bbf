//! RMCP/IPMI v1.5 wire protocol.
//!
//! Everything that touches bytes lives here: the RMCP and ASF headers
//! (big-endian section), the IPMI session and command headers (little-endian
//! section), the two-checksum framing discipline, the completion-code error
//! taxonomy, and the request/response codecs for the supported command set.
//!
//! Transports and the client façade are in `bmclink-client`; the in-process
//! BMC used by the test suite is in `bmclink-harness`.

pub mod asf;
pub mod checksum;
pub mod codec;
pub mod completion;
pub mod errors;
pub mod message;
pub mod payloads;
pub mod rmcp;

pub use asf::{AsfHeader, AsfMessage, Pong};
pub use checksum::{ChecksumSink, checksum};
pub use codec::{Encode, Response, nul_pad, nul_trim};
pub use completion::CompletionCode;
pub use errors::{ProtocolError, Result};
pub use message::{
    AUTH_TYPE_MD2, AUTH_TYPE_MD5, AUTH_TYPE_NONE, AUTH_TYPE_OEM, AUTH_TYPE_PASSWORD,
    BMC_SLAVE_ADDR, CommandHeader, IPMI_BUF_SIZE, Message, REMOTE_SWID, SessionHeader,
    auth_type_bit,
};
pub use payloads::{Command, NetFn, Request};
pub use rmcp::{RMCP_CLASS_ASF, RMCP_CLASS_IPMI, RMCP_VERSION_1, RmcpHeader};
