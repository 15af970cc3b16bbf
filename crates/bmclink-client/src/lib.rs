//! IPMI v1.5 client.
//!
//! A [`Client`] wraps one of two interchangeable transports behind the same
//! request/response catalogue: the native LAN transport (UDP + RMCP framing,
//! session handshake, per-packet MD5 authentication) or a subprocess
//! transport that shells out to an `ipmitool`-compatible helper with hex
//! byte arguments. The [`Connection`] descriptor selects between them.

pub mod client;
pub mod connection;
pub mod error;
pub mod lan;
pub mod tool;
pub mod transport;

pub use client::Client;
pub use connection::{Connection, DEFAULT_PORT, Interface};
pub use error::{Error, Result};
pub use transport::Transport;
