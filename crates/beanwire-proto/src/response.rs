use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Category of a failed call, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// The request frame did not decode to a method call.
    MalformedRequest,
    /// No application matches the requested name.
    ApplicationNotFound,
    /// The container or the invoked method raised an error.
    Invocation,
}

impl RemoteErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed_request",
            Self::ApplicationNotFound => "application_not_found",
            Self::Invocation => "invocation",
        }
    }
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised on the endpoint, carried back as the response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a call: exactly one of a returned value or a raised error.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Return(Value),
    Error(RemoteError),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn into_result(self) -> Result<Value, RemoteError> {
        match self {
            Self::Return(value) => Ok(value),
            Self::Error(err) => Err(err),
        }
    }

    /// Replace a return value that cannot be serialized (a NaN or infinite float
    /// anywhere inside it) with an invocation error.
    pub fn into_encodable(self) -> Self {
        match self {
            Self::Return(value) if !value.is_finite() => Self::Error(RemoteError::new(
                RemoteErrorKind::Invocation,
                NON_FINITE_RESULT,
            )),
            other => other,
        }
    }
}

/// Message of the error sent in place of a non-finite return value.
pub const NON_FINITE_RESULT: &str = "result could not be serialized: non-finite float";

impl From<Result<Value, RemoteError>> for Response {
    fn from(result: Result<Value, RemoteError>) -> Self {
        match result {
            Ok(value) => Self::Return(value),
            Err(err) => Self::Error(err),
        }
    }
}
