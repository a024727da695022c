//! Client transport port - framed, bidirectional connection to one client.
//!
//! A client session only sees a `Sink` of outgoing frames and a `Stream` of
//! incoming frames. The WebSocket adapter maps axum's socket onto these;
//! tests drive sessions with in-memory channels.

use futures::{Sink, Stream};
use thiserror::Error;

/// One transport-level frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

impl Frame {
    /// Payload size in bytes, used for the inbound size limit.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(s) => s.len(),
            Frame::Binary(b) | Frame::Ping(b) | Frame::Pong(b) => b.len(),
            Frame::Close => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transport failures. All of them end the affected connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("frame of {size} bytes exceeds limit of {limit}")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("transport I/O error: {0}")]
    Io(String),
}

/// Outgoing half of a client transport.
pub trait FrameSink: Sink<Frame, Error = TransportError> + Send + Unpin + 'static {}

impl<T> FrameSink for T where T: Sink<Frame, Error = TransportError> + Send + Unpin + 'static {}

/// Incoming half of a client transport.
pub trait FrameStream: Stream<Item = Result<Frame, TransportError>> + Send + Unpin + 'static {}

impl<T> FrameStream for T where
    T: Stream<Item = Result<Frame, TransportError>> + Send + Unpin + 'static
{
}
