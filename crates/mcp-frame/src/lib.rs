//! Content-Length framing for JSON-RPC message streams.
//!
//! A frame is a header block terminated by a blank line, followed by exactly
//! `Content-Length` raw payload bytes:
//!
//! ```text
//! Content-Length: 40\r\n
//! \r\n
//! {"jsonrpc":"2.0","method":"ping","id":1}
//! ```
//!
//! The codec knows nothing about the payload; it only moves bytes.

pub mod codec;
pub mod types;

pub use codec::{
    encode_frame, FrameReader, FrameWriter, CONTENT_LENGTH, DEFAULT_MAX_FRAME_LEN,
    MAX_HEADER_LINE_LEN,
};
pub use types::*;
