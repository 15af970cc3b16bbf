//! Client error type.
//!
//! Three kinds of failure reach the caller: protocol errors (completion
//! codes, including the codec-level codes for short/long/invalid packets),
//! I/O errors from the socket or DNS, and subprocess failures from the
//! external-tool transport. Comparing an error against a completion-code
//! constant is the primary way to branch on remote conditions.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

use bmclink_proto::{CompletionCode, ProtocolError};

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client and its transports.
#[derive(Debug, Error)]
pub enum Error {
    /// Completion code or framing failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Socket, DNS, or subprocess-launch failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The external helper exited non-zero; its stderr is the message.
    #[error("helper exited with {status}: {stderr}")]
    Tool {
        /// Exit status of the helper process.
        status: ExitStatus,
        /// Captured standard error output.
        stderr: String,
    },

    /// The helper printed something that is not a hex byte.
    #[error("invalid hex byte in helper output: {0:?}")]
    InvalidHex(String),

    /// Interface string was neither `lan` nor `lanplus`.
    #[error("unsupported interface: {0:?}")]
    UnsupportedInterface(String),

    /// Pong did not advertise IPMI support.
    #[error("remote endpoint does not support IPMI")]
    IpmiUnsupported,

    /// Send attempted without an open session.
    #[error("transport is not open")]
    NotOpen,
}

impl Error {
    /// The completion code carried by this error, if any.
    #[must_use]
    pub fn completion_code(&self) -> Option<CompletionCode> {
        match self {
            Self::Protocol(err) => err.completion_code(),
            _ => None,
        }
    }

    /// True when the failure is transient and the request may succeed on
    /// retry. Retry policy itself is left to the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.completion_code().is_some_and(CompletionCode::is_retryable)
    }
}

impl From<CompletionCode> for Error {
    fn from(code: CompletionCode) -> Self {
        Self::Protocol(ProtocolError::Completion(code))
    }
}

impl PartialEq<CompletionCode> for Error {
    fn eq(&self, other: &CompletionCode) -> bool {
        self.completion_code() == Some(*other)
    }
}
