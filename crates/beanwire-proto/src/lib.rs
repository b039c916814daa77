//! Message types exchanged over a beanwire connection.
//!
//! - [`MethodCall`]: the request descriptor (application, class, method, parameters, session)
//! - [`Response`]: exactly one of a returned [`Value`] or a [`RemoteError`]
//! - [`codec`]: serialization of both into a tagged JSON object graph
//!
//! Framing (base64 + `"\r\n"`) lives in `beanwire-frame`; this crate only deals with
//! the serialized payload inside a frame.

pub mod codec;
pub mod error;
pub mod method_call;
pub mod response;
pub mod value;

pub use codec::{decode_request, decode_response, encode_request, encode_response};
pub use error::{ProtoError, Result};
pub use method_call::{MethodCall, Parameter, DEFAULT_ADDRESS, DEFAULT_PORT};
pub use response::{RemoteError, RemoteErrorKind, Response, NON_FINITE_RESULT};
pub use value::Value;
