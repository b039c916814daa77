use beanwire_transport::Connection;
use bytes::Bytes;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig, TERMINATOR};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Reads one complete frame from a [`Connection`].
///
/// The frame is assembled line by line until the buffer ends with `"\r\n"`.
/// A line that arrives without the terminator (a bare `\n` line, or a read cut short)
/// is kept as a continuation and reading goes on.
pub struct FrameReader<T> {
    inner: T,
    buf: Vec<u8>,
    config: FrameConfig,
}

impl<T: Connection> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the raw frame line, terminator included (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends before any byte,
    /// and `Err(FrameError::IncompleteFrame)` when it ends before the terminator.
    pub fn read_wire(&mut self) -> Result<Bytes> {
        self.buf.clear();
        let limit = self.config.max_frame_size.saturating_add(TERMINATOR.len());

        loop {
            let remaining = limit.saturating_sub(self.buf.len());
            if remaining == 0 {
                return Err(FrameError::FrameTooLarge {
                    size: self.buf.len(),
                    max: self.config.max_frame_size,
                });
            }

            let read = self.inner.read_line(&mut self.buf, remaining)?;
            if read == 0 {
                if self.buf.is_empty() {
                    return Err(FrameError::ConnectionClosed);
                }
                return Err(FrameError::IncompleteFrame {
                    received: self.buf.len(),
                });
            }

            if self.buf.ends_with(TERMINATOR) {
                trace!(size = self.buf.len(), "frame line complete");
                return Ok(Bytes::from(std::mem::take(&mut self.buf)));
            }

            trace!(size = self.buf.len(), "line without terminator, continuing");
        }
    }

    /// Read and decode the next frame (blocking).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let wire = self.read_wire()?;
        decode_frame(&wire)
    }

    /// Borrow the underlying connection.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying connection.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner connection.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
