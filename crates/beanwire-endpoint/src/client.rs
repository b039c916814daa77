//! Caller side: send one method call and read its response.

use std::time::Duration;

use beanwire_frame::{FrameConfig, FrameError, FrameReader, FrameWriter};
use beanwire_proto::{decode_response, encode_request, MethodCall, ProtoError, Response};
use beanwire_transport::{Connection, TcpEndpoint, TransportError};
use tracing::debug;

/// Errors that can occur while making a call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("protocol error: {0}")]
    Proto(#[from] ProtoError),
}

/// Settings for [`call_tcp`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub frame: FrameConfig,
    /// Default: 10 s.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                read_timeout: Some(Duration::from_secs(30)),
                write_timeout: Some(Duration::from_secs(30)),
                ..FrameConfig::default()
            },
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Send `request` over `connection` and wait for the response.
///
/// The connection is left open; the endpoint closes its side after replying.
pub fn call<C: Connection>(
    mut connection: C,
    request: &MethodCall,
    config: &FrameConfig,
) -> Result<Response, ClientError> {
    connection.set_timeouts(config.read_timeout, config.write_timeout)?;
    let payload = encode_request(request)?;

    FrameWriter::with_config(&mut connection, config.clone()).send(&payload)?;
    debug!(
        class = request.class_name(),
        method = request.method_name(),
        "request sent"
    );

    let frame = FrameReader::with_config(&mut connection, config.clone()).read_frame()?;
    Ok(decode_response(&frame.payload)?)
}

/// Connect to `addr` over TCP, make one call and close the connection.
pub fn call_tcp(
    addr: &str,
    request: &MethodCall,
    config: &ClientConfig,
) -> Result<Response, ClientError> {
    let mut connection = TcpEndpoint::connect(addr, config.connect_timeout)?;
    let response = call(&mut connection, request, &config.frame);
    connection.close()?;
    response
}
