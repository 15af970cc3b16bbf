//! In-process BMC simulator.
//!
//! [`Simulator`] binds a UDP socket, answers ASF pings with a canned pong,
//! and dispatches IPMI commands through a handler table that tests can
//! override, including for error injection. Built-in handlers mimic a
//! minimal IPMI v1.5 BMC: enough to complete the session handshake, report
//! chassis power, and round-trip boot-option parameters.

pub mod simulator;

pub use simulator::{Handler, Simulator};
