//! Stdio transport: reads framed JSON-RPC from stdin, writes replies to stdout.

use std::io::{self, BufRead, Write};

use mcp_frame::{FrameError, FrameReader, FrameWriter, DEFAULT_MAX_FRAME_LEN};

use crate::protocol::ProtocolHandler;
use crate::types::{McpError, McpResult};

use super::framing;

/// How a session ended without an I/O failure.
#[derive(Debug)]
pub enum SessionEnd {
    /// The input closed between frames.
    EndOfStream,
    /// The peer sent a frame declaring zero length, which marks the end of
    /// its messages. Nothing is sent back.
    EmptyFrame,
    /// The peer sent something that is not a frame. Nothing is sent back;
    /// the session simply stops reading.
    MalformedFrame(FrameError),
}

/// Stdio transport for desktop MCP clients.
///
/// One frame is read, handled, and answered before the next is read, so
/// replies go out in request order.
pub struct StdioTransport {
    handler: ProtocolHandler,
    max_frame_len: usize,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self {
            handler,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn handler(&self) -> &ProtocolHandler {
        &self.handler
    }

    pub fn into_handler(self) -> ProtocolHandler {
        self.handler
    }

    /// Run the transport loop over the process's stdin and stdout.
    pub fn run(&mut self) -> McpResult<SessionEnd> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Serve frames from `input` until it is exhausted, writing replies to
    /// `output`. Only I/O failures are returned as errors.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, output: W) -> McpResult<SessionEnd> {
        let mut reader = FrameReader::with_max_frame_len(input, self.max_frame_len);
        let mut writer = FrameWriter::new(output);

        tracing::info!("Stdio transport started");

        loop {
            let frame = match reader.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("EOF on input, shutting down");
                    return Ok(SessionEnd::EndOfStream);
                }
                Err(FrameError::Io(e)) => return Err(McpError::Io(e)),
                Err(e) => {
                    tracing::warn!("Malformed frame, ending session: {e}");
                    return Ok(SessionEnd::MalformedFrame(e));
                }
            };

            if frame.is_empty() {
                tracing::info!("Zero-length frame, shutting down");
                return Ok(SessionEnd::EmptyFrame);
            }

            tracing::debug!("Received: {} bytes", frame.len());

            let Some(reply) = self.handler.handle_payload(frame.payload()) else {
                continue;
            };

            let payload = match framing::encode_reply(&reply) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("Failed to serialize reply to {}: {e}", reply.id());
                    continue;
                }
            };

            tracing::debug!("Sending: {} bytes", payload.len());
            writer.write_frame(&payload)?;
        }
    }
}
