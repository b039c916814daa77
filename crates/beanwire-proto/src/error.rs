/// Errors raised while building or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The payload is not a well-formed message.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is a valid message, just not the kind that was expected.
    #[error("expected {expected} message, found {found}")]
    UnexpectedMessage {
        expected: &'static str,
        found: &'static str,
    },

    /// A required descriptor field is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A parameter holds a NaN or infinite float, which JSON cannot carry.
    #[error("parameter '{0}' holds a non-finite float")]
    NonFiniteParameter(String),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
