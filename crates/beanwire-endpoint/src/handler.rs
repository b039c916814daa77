//! Per-connection request dispatch.
//!
//! A [`ConnectionHandler`] serves exactly one request per accepted connection:
//!
//! ```text
//! Idle -> Reading -> Decoding -> Resolving -> Locked -> Invoking -> Responding -> Closed
//! ```
//!
//! Decode, resolve and invocation failures are answered with an error response. Failures
//! to read or write the connection cannot be answered; they run the shutdown hook, which
//! closes the connection and tells the worker to recycle itself.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use beanwire_frame::{
    decode_frame, FrameConfig, FrameError, FrameReader, FrameWriter, DEFAULT_MAX_FRAME_SIZE,
};
use beanwire_proto::{
    decode_request, encode_response, MethodCall, RemoteError, RemoteErrorKind, Response, Value,
};
use beanwire_transport::{Connection, TransportError};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::application::resolve;
use crate::container::with_instance;
use crate::context::ServerContext;
use crate::error::{DispatchError, InvocationError, Result};

/// Default read and write timeout for a handled connection.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a handler is in serving its current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Reading,
    Decoding,
    Resolving,
    Locked,
    Invoking,
    Responding,
    Closed,
}

impl DispatchState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Decoding => "decoding",
            Self::Resolving => "resolving",
            Self::Locked => "locked",
            Self::Invoking => "invoking",
            Self::Responding => "responding",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits applied to every handled connection.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Maximum encoded frame size, in either direction. Default: 16 MiB.
    pub max_frame_size: usize,
    /// Default: 30 s.
    pub read_timeout: Option<Duration>,
    /// Default: 30 s.
    pub write_timeout: Option<Duration>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: Some(DEFAULT_IO_TIMEOUT),
            write_timeout: Some(DEFAULT_IO_TIMEOUT),
        }
    }
}

impl HandlerConfig {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_size: self.max_frame_size,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

/// The server thread or process that owns a handler.
pub trait Worker: Send + Sync {
    /// Called when the connection failed and the worker should be recycled.
    fn shutdown(&self);
}

type BoxedConnection = Box<dyn Connection + Send>;

/// Serves one request per connection.
///
/// Reusable: after `handle` returns, the same handler can serve the next connection.
pub struct ConnectionHandler {
    context: Option<Arc<dyn ServerContext>>,
    config: HandlerConfig,
    state: DispatchState,
    connection: Option<BoxedConnection>,
    worker: Option<Arc<dyn Worker>>,
}

impl ConnectionHandler {
    pub fn new() -> Self {
        Self {
            context: None,
            config: HandlerConfig::default(),
            state: DispatchState::Idle,
            connection: None,
            worker: None,
        }
    }

    /// Attach the server context. Must run before the first `handle`.
    pub fn init(&mut self, context: Arc<dyn ServerContext>, config: HandlerConfig) {
        self.context = Some(context);
        self.config = config;
        self.state = DispatchState::Idle;
    }

    pub fn is_initialized(&self) -> bool {
        self.context.is_some()
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Serve one request on `connection` and close it.
    ///
    /// Returns the response that was written. `Err` means nothing could be written: the
    /// connection has been closed and `worker` told to shut down.
    pub fn handle<C>(&mut self, connection: C, worker: Arc<dyn Worker>) -> Result<Response>
    where
        C: Connection + Send + 'static,
    {
        if self.connection.is_some() {
            warn!("previous connection still held, running shutdown hook");
            self.shutdown();
        }
        self.connection = Some(Box::new(connection));
        self.worker = Some(worker);

        let Some(context) = self.context.clone() else {
            warn!("connection handler used before init");
            self.shutdown();
            return Err(DispatchError::NotInitialized);
        };

        let wire = match self.read_request() {
            Ok(wire) => wire,
            Err(err) => {
                warn!(error = %err, "reading request failed");
                self.shutdown();
                return Err(err);
            }
        };

        context.class_loader().register(true, true);
        let response = self.dispatch(context.as_ref(), &wire).into_encodable();

        match self.respond(response) {
            Ok(sent) => {
                self.finish();
                Ok(sent)
            }
            Err(err) => {
                warn!(error = %err, "writing response failed");
                self.shutdown();
                Err(err)
            }
        }
    }

    /// Shutdown hook: close the held connection, if any, and tell the worker to stop.
    pub fn shutdown(&mut self) {
        self.close_connection();
        if let Some(worker) = self.worker.take() {
            debug!("notifying worker of shutdown");
            worker.shutdown();
        }
        self.set_state(DispatchState::Closed);
    }

    fn read_request(&mut self) -> Result<Bytes> {
        self.set_state(DispatchState::Reading);
        let config = self.config.frame_config();
        let connection = self.connection_mut()?;
        connection.set_timeouts(config.read_timeout, config.write_timeout)?;

        let mut reader = FrameReader::with_config(&mut **connection, config);
        Ok(reader.read_wire()?)
    }

    fn dispatch(&mut self, context: &dyn ServerContext, wire: &[u8]) -> Response {
        match self.invoke(context, wire) {
            Ok(value) => Response::Return(value),
            Err(err) => {
                warn!(error = %err, "call failed, replying with error");
                let remote = err.to_remote().unwrap_or_else(|| {
                    RemoteError::new(RemoteErrorKind::Invocation, err.to_string())
                });
                Response::Error(remote)
            }
        }
    }

    fn invoke(&mut self, context: &dyn ServerContext, wire: &[u8]) -> Result<Value> {
        self.set_state(DispatchState::Decoding);
        let call = decode_call(wire)?;

        self.set_state(DispatchState::Resolving);
        let application = resolve(call.app_name(), context.applications())?;

        self.set_state(DispatchState::Locked);
        let container = context.container();
        let state = &mut self.state;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            with_instance(
                container.as_ref(),
                call.class_name(),
                call.session_id(),
                &application,
                |bean| {
                    *state = DispatchState::Invoking;
                    debug!(
                        class = call.class_name(),
                        method = call.method_name(),
                        "invoking"
                    );
                    bean.invoke(call.method_name(), call.parameters())
                },
            )
        }));

        let value = match outcome {
            Ok(result) => result?,
            Err(payload) => return Err(InvocationError::Panicked(panic_message(&*payload)).into()),
        };

        info!(
            app = application.name(),
            class = call.class_name(),
            method = call.method_name(),
            session = ?call.session_id(),
            "call completed"
        );
        Ok(value)
    }

    fn respond(&mut self, response: Response) -> Result<Response> {
        self.set_state(DispatchState::Responding);
        let config = self.config.frame_config();
        let connection = self.connection_mut()?;
        let mut writer = FrameWriter::with_config(&mut **connection, config);

        match writer.send(&encode_response(&response)) {
            Ok(()) => Ok(response),
            Err(FrameError::FrameTooLarge { size, max }) => {
                warn!(size, max, "response exceeds frame limit, replying with error");
                let fallback = Response::Error(RemoteError::new(
                    RemoteErrorKind::Invocation,
                    format!("response frame of {size} bytes exceeds limit of {max} bytes"),
                ));
                writer.send(&encode_response(&fallback))?;
                Ok(fallback)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn finish(&mut self) {
        self.close_connection();
        self.worker = None;
        self.set_state(DispatchState::Closed);
    }

    fn close_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(err) = connection.close() {
                debug!(error = %err, "closing connection failed");
            }
        }
    }

    fn connection_mut(&mut self) -> Result<&mut BoxedConnection> {
        self.connection
            .as_mut()
            .ok_or(DispatchError::Transport(TransportError::Closed))
    }

    fn set_state(&mut self, state: DispatchState) {
        debug!(from = %self.state, to = %state, "dispatch state");
        self.state = state;
    }
}

impl Default for ConnectionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectionHandler {
    fn drop(&mut self) {
        if self.connection.is_some() {
            self.shutdown();
        }
    }
}

impl fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("initialized", &self.is_initialized())
            .field("state", &self.state)
            .field("config", &self.config)
            .field("has_connection", &self.connection.is_some())
            .finish()
    }
}

fn decode_call(wire: &[u8]) -> Result<MethodCall> {
    let frame = decode_frame(wire).map_err(|err| DispatchError::MalformedRequest(err.to_string()))?;
    decode_request(&frame.payload).map_err(|err| DispatchError::MalformedRequest(err.to_string()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
