use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::NetStream;

/// An accepted, line-oriented connection.
///
/// One request and one response travel over it, then it is closed.
pub trait Connection {
    /// Read one line (up to and including `\n`) into `buf`, reading at most `limit` bytes.
    ///
    /// Returns the number of bytes appended. `Ok(0)` means end of stream.
    /// A line may come back without `\n` when the limit is hit or the peer closes mid-line.
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize>;

    /// Write the whole buffer and flush.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Close the connection. Closing an already closed connection is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether `close` has already run.
    fn is_closed(&self) -> bool;

    /// Apply blocking read/write timeouts. Connections without timeout support ignore this.
    fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        let _ = (read, write);
        Ok(())
    }
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize> {
        (**self).read_line(buf, limit)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        (**self).set_timeouts(read, write)
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize> {
        (**self).read_line(buf, limit)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        (**self).set_timeouts(read, write)
    }
}

/// [`Connection`] over a [`NetStream`]: buffered line reads, blocking full writes.
pub struct LineConnection {
    reader: BufReader<NetStream>,
    writer: NetStream,
    peer: String,
    closed: bool,
}

impl LineConnection {
    /// Wrap a connected stream. The stream is cloned once so reads can be buffered.
    pub fn new(stream: NetStream) -> Result<Self> {
        let reader = stream.try_clone()?;
        let peer = stream.peer_label();
        Ok(Self {
            reader: BufReader::new(reader),
            writer: stream,
            peer,
            closed: false,
        })
    }

    /// Peer description, for logs.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl Connection for LineConnection {
    fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut bounded = self.reader.by_ref().take(limit as u64);
        bounded.read_until(b'\n', buf).map_err(TransportError::Io)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }

        let mut offset = 0usize;
        while offset < data.len() {
            match self.writer.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.writer.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!(peer = %self.peer, "closing connection");
        self.writer.shutdown()
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.set_write_timeout(write)
    }
}

impl std::fmt::Debug for LineConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConnection")
            .field("peer", &self.peer)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    use super::*;

    fn pair() -> (LineConnection, UnixStream) {
        let (left, right) = UnixStream::pair().unwrap();
        (LineConnection::new(NetStream::from(left)).unwrap(), right)
    }

    #[test]
    fn reads_lines_including_terminator() {
        let (mut conn, mut peer) = pair();
        peer.write_all(b"first\r\nsecond\r\n").unwrap();

        let mut buf = Vec::new();
        assert_eq!(conn.read_line(&mut buf, 1024).unwrap(), 7);
        assert_eq!(buf, b"first\r\n");

        buf.clear();
        conn.read_line(&mut buf, 1024).unwrap();
        assert_eq!(buf, b"second\r\n");
    }

    #[test]
    fn read_line_respects_limit() {
        let (mut conn, mut peer) = pair();
        peer.write_all(b"abcdefgh\r\n").unwrap();

        let mut buf = Vec::new();
        assert_eq!(conn.read_line(&mut buf, 4).unwrap(), 4);
        assert_eq!(buf, b"abcd");

        conn.read_line(&mut buf, 1024).unwrap();
        assert_eq!(buf, b"abcdefgh\r\n");
    }

    #[test]
    fn read_line_returns_zero_at_eof() {
        let (mut conn, peer) = pair();
        drop(peer);

        let mut buf = Vec::new();
        assert_eq!(conn.read_line(&mut buf, 1024).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn write_then_close_is_seen_by_peer() {
        let (mut conn, mut peer) = pair();
        conn.write(b"reply\r\n").unwrap();
        conn.close().unwrap();

        let mut received = Vec::new();
        peer.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"reply\r\n");
    }

    #[test]
    fn close_is_idempotent() {
        let (mut conn, _peer) = pair();
        assert!(!conn.is_closed());
        conn.close().unwrap();
        conn.close().unwrap();
        assert!(conn.is_closed());
    }

    #[test]
    fn io_after_close_is_rejected() {
        let (mut conn, _peer) = pair();
        conn.close().unwrap();

        let mut buf = Vec::new();
        assert!(matches!(
            conn.read_line(&mut buf, 16),
            Err(TransportError::Closed)
        ));
        assert!(matches!(conn.write(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn read_timeout_surfaces_as_timeout_error() {
        let (mut conn, _peer) = pair();
        conn.set_timeouts(Some(Duration::from_millis(20)), None)
            .unwrap();

        let mut buf = Vec::new();
        let err = conn.read_line(&mut buf, 16).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn works_through_mut_ref_and_box() {
        let (conn, mut peer) = pair();
        let mut boxed: Box<dyn Connection> = Box::new(conn);
        {
            let by_ref = &mut boxed;
            by_ref.write(b"via-ref\n").unwrap();
        }
        boxed.close().unwrap();

        let mut received = Vec::new();
        peer.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"via-ref\n");
    }
}
