//! Transport contract and selection.
//!
//! Both transports move the same catalogue records; only the carrier
//! differs. Selection happens in one place, from the connection's interface
//! and helper path.

use async_trait::async_trait;

use bmclink_proto::Request;

use crate::connection::{Connection, Interface};
use crate::error::Result;
use crate::lan::LanTransport;
use crate::tool::ToolTransport;

/// A carrier for catalogue requests.
#[async_trait]
pub trait Transport: Send {
    /// Establish whatever state the carrier needs (for LAN: dial the socket
    /// and run the session handshake).
    async fn open(&mut self) -> Result<()>;

    /// Tear down carrier state. Close-session failures are logged, not
    /// surfaced.
    async fn close(&mut self) -> Result<()>;

    /// Execute one request and return the response data with the completion
    /// code at byte 0.
    ///
    /// # Errors
    ///
    /// A non-zero completion code from the remote end is returned as the
    /// error; `Ok` data always begins with the success code. The call is
    /// single-shot: retry on transient codes is the caller's decision.
    async fn send(&mut self, request: &Request) -> Result<Vec<u8>>;
}

/// Choose a transport for the connection: the external helper for
/// `lanplus`, or for `lan` with an explicit helper path; the native LAN
/// transport otherwise.
pub(crate) fn new_transport(connection: &Connection) -> Box<dyn Transport> {
    match connection.interface {
        Interface::Lanplus => Box::new(ToolTransport::new(connection)),
        Interface::Lan if connection.path.is_some() => Box::new(ToolTransport::new(connection)),
        Interface::Lan => Box::new(LanTransport::new(connection)),
    }
}
