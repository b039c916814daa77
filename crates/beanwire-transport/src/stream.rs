use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected byte stream: TCP, or a Unix stream on Unix platforms.
///
/// This is the raw I/O type underneath [`crate::LineConnection`].
pub struct NetStream {
    inner: NetStreamInner,
}

enum NetStreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for NetStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for NetStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            NetStreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl From<TcpStream> for NetStream {
    fn from(stream: TcpStream) -> Self {
        Self {
            inner: NetStreamInner::Tcp(stream),
        }
    }
}

#[cfg(unix)]
impl From<std::os::unix::net::UnixStream> for NetStream {
    fn from(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: NetStreamInner::Unix(stream),
        }
    }
}

impl NetStream {
    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            NetStreamInner::Tcp(stream) => Ok(Self::from(stream.try_clone()?)),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => Ok(Self::from(stream.try_clone()?)),
        }
    }

    /// Shut down both halves of the stream.
    ///
    /// Every clone of the stream observes the shutdown, so the peer sees end of stream
    /// even while a reader half is still alive.
    pub fn shutdown(&self) -> Result<()> {
        let res = match &self.inner {
            NetStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            NetStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        match res {
            Ok(()) => Ok(()),
            // Peer already went away; the stream is closed either way.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Human-readable peer description for logs.
    pub fn peer_label(&self) -> String {
        match &self.inner {
            NetStreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "tcp:unknown".to_string()),
            #[cfg(unix)]
            NetStreamInner::Unix(_) => "unix".to_string(),
        }
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            NetStreamInner::Tcp(_) => f.debug_struct("NetStream").field("type", &"tcp").finish(),
            #[cfg(unix)]
            NetStreamInner::Unix(_) => f.debug_struct("NetStream").field("type", &"unix").finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn unix_pair_reads_and_writes() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut left = NetStream::from(left);
        let mut right = NetStream::from(right);

        left.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        right.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn shutdown_is_visible_through_clone() {
        let (left, right) = UnixStream::pair().unwrap();
        let left = NetStream::from(left);
        let mut right = NetStream::from(right);

        let clone = left.try_clone().unwrap();
        left.shutdown().unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(right.read(&mut buf).unwrap(), 0);
        drop(clone);
    }

    #[test]
    fn debug_reports_stream_type() {
        let (left, _right) = UnixStream::pair().unwrap();
        let stream = NetStream::from(left);
        assert!(format!("{stream:?}").contains("unix"));
    }
}
