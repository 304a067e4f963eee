//! Frame and error types.

/// A single decoded message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Errors produced while reading a frame.
///
/// Everything except [`FrameError::Io`] describes malformed input from the
/// peer rather than a failing stream.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("Stream ended inside a frame header")]
    TruncatedHeader,

    #[error("Frame header has no Content-Length")]
    MissingContentLength,

    #[error("Frame header line exceeds {limit} bytes")]
    HeaderLineTooLong { limit: usize },

    #[error("Invalid Content-Length value: {0:?}")]
    InvalidContentLength(String),

    #[error("Frame of {length} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { length: usize, limit: usize },

    #[error("Stream ended after {received} of {expected} body bytes")]
    TruncatedBody { expected: usize, received: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True when the peer sent something that is not a valid frame.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, FrameError::Io(_))
    }
}

pub type FrameResult<T> = Result<T, FrameError>;
