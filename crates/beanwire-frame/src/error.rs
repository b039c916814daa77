/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame body is not valid base64.
    #[error("invalid frame encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// The encoded frame exceeds the configured maximum size.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The peer closed the stream before sending anything.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer closed the stream before the frame terminator arrived.
    #[error("connection closed mid-frame ({received} bytes without terminator)")]
    IncompleteFrame { received: usize },

    /// The underlying connection failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] beanwire_transport::TransportError),
}

impl FrameError {
    /// True when the failure happened on the wire rather than in the frame contents.
    ///
    /// After a wire failure no reply can be delivered on the connection.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::InvalidEncoding(_))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
