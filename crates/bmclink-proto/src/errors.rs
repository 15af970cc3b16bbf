//! Protocol error type.
//!
//! Most failures are completion codes (see [`CompletionCode`]); the variants
//! here cover only the framing-level conditions that have no code of their
//! own. Callers branch on remote conditions by comparing an error against a
//! completion-code constant, so `PartialEq<CompletionCode>` is provided.

use thiserror::Error;

use crate::completion::CompletionCode;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while framing, parsing, or interpreting packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A completion code other than normal completion. Also carries the
    /// codec-level codes (short/long packet, invalid packet).
    #[error(transparent)]
    Completion(#[from] CompletionCode),

    /// RMCP class byte is neither ASF nor IPMI.
    #[error("unsupported RMCP class: {0:#04x}")]
    UnsupportedClass(u8),

    /// ASF message type other than the expected ping/pong pair.
    #[error("unsupported ASF message type: {0:#04x}")]
    UnsupportedMessageType(u8),
}

impl ProtocolError {
    /// The completion code carried by this error, if any.
    #[must_use]
    pub fn completion_code(&self) -> Option<CompletionCode> {
        match self {
            Self::Completion(code) => Some(*code),
            _ => None,
        }
    }
}

impl PartialEq<CompletionCode> for ProtocolError {
    fn eq(&self, other: &CompletionCode) -> bool {
        self.completion_code() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_against_code_constants() {
        let err = ProtocolError::from(CompletionCode::SHORT_PACKET);
        assert_eq!(err, CompletionCode::SHORT_PACKET);
        assert_ne!(err, CompletionCode::LONG_PACKET);

        let err = ProtocolError::UnsupportedClass(0x42);
        assert_ne!(err, CompletionCode::SHORT_PACKET);
    }
}
