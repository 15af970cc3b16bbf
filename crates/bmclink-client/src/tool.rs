//! Subprocess transport: delegate requests to an `ipmitool`-compatible
//! helper.
//!
//! Each request body becomes a `raw` invocation with one hex byte per
//! argument; the helper's stdout is whitespace-separated hex bytes. The
//! helper owns session lifetime, so this transport keeps no state at all.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command as ProcessCommand;

use bmclink_proto::{CompletionCode, Request};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Helper binary used when the connection carries no explicit path.
pub const DEFAULT_TOOL: &str = "ipmitool";

/// Stateless transport that shells out for every request.
pub(crate) struct ToolTransport {
    connection: Connection,
}

impl ToolTransport {
    pub(crate) fn new(connection: &Connection) -> Self {
        Self { connection: connection.clone() }
    }

    /// Standard helper flags: host, credentials, interface, optional port.
    fn options(&self) -> Vec<String> {
        let mut options = vec![
            "-H".to_string(),
            self.connection.hostname.clone(),
            "-U".to_string(),
            self.connection.username.clone(),
            "-P".to_string(),
            self.connection.password.clone(),
            "-I".to_string(),
            self.connection.interface.to_string(),
        ];

        if let Some(port) = self.connection.port {
            options.push("-p".to_string());
            options.push(port.to_string());
        }

        options
    }

    async fn run(&self, args: &[String]) -> Result<String> {
        let path =
            self.connection.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));

        let output =
            ProcessCommand::new(&path).args(self.options()).args(args).output().await?;

        if !output.status.success() {
            return Err(Error::Tool {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Transport for ToolTransport {
    async fn open(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn send(&mut self, request: &Request) -> Result<Vec<u8>> {
        let mut args = vec!["raw".to_string()];
        args.extend(raw_encode(&request_to_bytes(request)));

        let stdout = self.run(&args).await?;
        let reply = raw_decode(stdout.trim())?;

        // The helper already checked the completion code; prepend the
        // implicit success byte the catalogue decoders expect.
        let mut data = Vec::with_capacity(1 + reply.len());
        data.push(CompletionCode::COMPLETED.0);
        data.extend(reply);
        Ok(data)
    }
}

/// Request body as raw bytes: netfn, command, payload.
pub(crate) fn request_to_bytes(request: &Request) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + request.data.len());
    bytes.push(request.netfn.0);
    bytes.push(request.command.0);
    bytes.extend_from_slice(&request.data);
    bytes
}

/// Hex-encode bytes as helper arguments, one byte per argument.
pub(crate) fn raw_encode(bytes: &[u8]) -> Vec<String> {
    bytes.iter().map(|b| format!("0x{}", hex::encode([*b]))).collect()
}

/// Parse whitespace-separated hex bytes from helper output.
pub(crate) fn raw_decode(text: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    for token in text.split_whitespace() {
        let token = token.trim_start_matches("0x");
        let decoded =
            hex::decode(token).map_err(|_| Error::InvalidHex(token.to_string()))?;
        bytes.extend(decoded);
    }
    Ok(bytes)
}
