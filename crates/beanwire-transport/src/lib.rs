//! Line-oriented connection abstraction.
//!
//! The dispatcher never touches sockets directly. It talks to a [`Connection`]:
//! - read one line at a time (`read_line`, zero bytes means end of stream)
//! - write a complete buffer (`write`)
//! - close, idempotently (`close`)
//!
//! [`LineConnection`] implements it over a [`NetStream`] (TCP or Unix stream),
//! and [`TcpEndpoint`] provides bind/accept/connect for TCP.

pub mod connection;
pub mod error;
pub mod stream;
pub mod tcp;

pub use connection::{Connection, LineConnection};
pub use error::{Result, TransportError};
pub use stream::NetStream;
pub use tcp::TcpEndpoint;
