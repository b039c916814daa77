use beanwire_frame::FrameError;
use beanwire_proto::{RemoteError, RemoteErrorKind};
use beanwire_transport::TransportError;

/// Errors raised by the container or by the invoked method body.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The application has no bean type with this class name.
    #[error("unknown bean class '{class_name}' in application '{application}'")]
    UnknownClass {
        class_name: String,
        application: String,
    },

    /// The bean type has no method with this name.
    #[error("{class_name} has no method '{method_name}'")]
    UnknownMethod {
        class_name: String,
        method_name: String,
    },

    /// A required argument is absent.
    #[error("missing argument {0}")]
    MissingArgument(String),

    /// An argument has the wrong type.
    #[error("argument {name}: expected {expected}, found {found}")]
    InvalidArgument {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The method body raised an error. The message is passed through unchanged.
    #[error("{0}")]
    Failed(String),

    /// The method body panicked.
    #[error("method panicked: {0}")]
    Panicked(String),
}

impl InvocationError {
    /// Error raised from a method body.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors that can occur while dispatching a request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// `handle` was called before `init`.
    #[error("connection handler used before init")]
    NotInitialized,

    /// The frame did not decode to a method call.
    #[error("found invalid remote method call: {0}")]
    MalformedRequest(String),

    /// No application matches the requested name.
    #[error("no application named {0}")]
    ApplicationNotFound(String),

    /// Lookup or invocation failed.
    #[error("invocation failed: {0}")]
    Invocation(#[from] InvocationError),

    /// Connection-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl DispatchError {
    /// True for unrecoverable connection-level errors that cannot be answered.
    ///
    /// These close the connection without a reply and recycle the worker.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::NotInitialized | Self::Transport(_) => true,
            Self::Frame(err) => err.is_transport(),
            Self::MalformedRequest(_) | Self::ApplicationNotFound(_) | Self::Invocation(_) => false,
        }
    }

    /// The error as the caller sees it, or `None` for transport errors.
    pub fn to_remote(&self) -> Option<RemoteError> {
        match self {
            Self::MalformedRequest(_) => Some(RemoteError::new(
                RemoteErrorKind::MalformedRequest,
                self.to_string(),
            )),
            Self::ApplicationNotFound(_) => Some(RemoteError::new(
                RemoteErrorKind::ApplicationNotFound,
                self.to_string(),
            )),
            Self::Invocation(err) => {
                Some(RemoteError::new(RemoteErrorKind::Invocation, err.to_string()))
            }
            Self::Frame(err) if !err.is_transport() => Some(RemoteError::new(
                RemoteErrorKind::MalformedRequest,
                format!("found invalid remote method call: {err}"),
            )),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
