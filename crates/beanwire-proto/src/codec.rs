//! Serialization of requests and responses.
//!
//! Each payload is one JSON object tagged by `"type"`:
//!
//! ```text
//! {"type":"remote_method_call","class_name":"CartBean","method_name":"getTotal",...}
//! {"type":"return","value":{"type":"int","value":42}}
//! {"type":"error","kind":"invocation","message":"cart is empty"}
//! ```
//!
//! Success and failure differ only by the tag inside the payload; the frame around
//! it is the same.

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::method_call::MethodCall;
use crate::response::{RemoteError, RemoteErrorKind, Response, NON_FINITE_RESULT};
use crate::value::Value;

const REMOTE_METHOD_CALL: &str = "remote_method_call";
const RETURN: &str = "return";
const ERROR: &str = "error";

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageRef<'a> {
    RemoteMethodCall(&'a MethodCall),
    Return { value: &'a Value },
    Error(&'a RemoteError),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Message {
    RemoteMethodCall(MethodCall),
    Return { value: Value },
    Error(RemoteError),
}

impl Message {
    fn kind(&self) -> &'static str {
        match self {
            Self::RemoteMethodCall(_) => REMOTE_METHOD_CALL,
            Self::Return { .. } => RETURN,
            Self::Error(_) => ERROR,
        }
    }
}

/// Serialize a method call.
pub fn encode_request(call: &MethodCall) -> Result<Vec<u8>> {
    if let Some(param) = call.parameters().iter().find(|p| !p.value.is_finite()) {
        return Err(ProtoError::NonFiniteParameter(param.key.clone()));
    }
    Ok(serde_json::to_vec(&MessageRef::RemoteMethodCall(call))?)
}

/// Deserialize a method call, rejecting any other message and invalid descriptors.
pub fn decode_request(payload: &[u8]) -> Result<MethodCall> {
    match serde_json::from_slice::<Message>(payload)? {
        Message::RemoteMethodCall(call) => {
            call.validate()?;
            Ok(call)
        }
        other => Err(ProtoError::UnexpectedMessage {
            expected: REMOTE_METHOD_CALL,
            found: other.kind(),
        }),
    }
}

/// Serialize a response. Never fails: a response that cannot be serialized is
/// replaced by an error response saying so.
///
/// JSON has no NaN or infinity, and `serde_json` would write them as `null`, so a
/// return value holding one is answered with an error instead.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let message = match response {
        Response::Return(value) if !value.is_finite() => {
            return encode_fallback(NON_FINITE_RESULT.to_string());
        }
        Response::Return(value) => MessageRef::Return { value },
        Response::Error(err) => MessageRef::Error(err),
    };
    serde_json::to_vec(&message)
        .unwrap_or_else(|err| encode_fallback(format!("result could not be serialized: {err}")))
}

fn encode_fallback(message: String) -> Vec<u8> {
    let fallback = RemoteError::new(RemoteErrorKind::Invocation, message);
    serde_json::to_vec(&MessageRef::Error(&fallback)).unwrap_or_else(|_| {
        br#"{"type":"error","kind":"invocation","message":"result could not be serialized"}"#
            .to_vec()
    })
}

/// Deserialize a response.
pub fn decode_response(payload: &[u8]) -> Result<Response> {
    match serde_json::from_slice::<Message>(payload)? {
        Message::Return { value } => Ok(Response::Return(value)),
        Message::Error(err) => Ok(Response::Error(err)),
        other => Err(ProtoError::UnexpectedMessage {
            expected: "response",
            found: other.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_call() -> MethodCall {
        MethodCall::new("CartBean", "getTotal")
            .unwrap()
            .with_app_name("shop")
            .with_session("S1")
    }

    #[test]
    fn request_roundtrip_preserves_every_field() {
        let mut call = cart_call()
            .with_parameter("currency", "EUR")
            .with_parameter(
                "filter",
                Value::object("Filter", [("min", Value::from(10)), ("tags", Value::List(vec![]))]),
            );
        call.set_address("192.168.1.10");
        call.set_port(4711);

        let decoded = decode_request(&encode_request(&call).unwrap()).unwrap();
        assert_eq!(decoded, call);
    }

    #[test]
    fn request_roundtrip_without_session_or_parameters() {
        let call = MethodCall::new("StatelessBean", "ping").unwrap();
        let decoded = decode_request(&encode_request(&call).unwrap()).unwrap();

        assert_eq!(decoded, call);
        assert_eq!(decoded.session_id(), None);
        assert_eq!(decoded.app_name(), None);
        assert!(decoded.parameters().is_empty());
    }

    #[test]
    fn request_carries_type_discriminant() {
        let json: serde_json::Value =
            serde_json::from_slice(&encode_request(&cart_call()).unwrap()).unwrap();
        assert_eq!(json["type"], REMOTE_METHOD_CALL);
        assert_eq!(json["class_name"], "CartBean");
    }

    #[test]
    fn encode_request_rejects_non_finite_parameters() {
        let call = cart_call().with_parameter("ratio", f64::NAN);
        assert!(matches!(
            encode_request(&call),
            Err(ProtoError::NonFiniteParameter(key)) if key == "ratio"
        ));
    }

    #[test]
    fn decode_request_rejects_garbage() {
        assert!(matches!(
            decode_request(b"definitely not json"),
            Err(ProtoError::Json(_))
        ));
        assert!(matches!(decode_request(b""), Err(ProtoError::Json(_))));
    }

    #[test]
    fn decode_request_rejects_other_messages() {
        let payload = encode_response(&Response::Return(Value::Int(42)));
        let err = decode_request(&payload).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::UnexpectedMessage {
                expected: REMOTE_METHOD_CALL,
                found: RETURN
            }
        ));
    }

    #[test]
    fn decode_request_enforces_descriptor_invariants() {
        let payload = br#"{"type":"remote_method_call","class_name":"","method_name":"x"}"#;
        assert!(matches!(
            decode_request(payload),
            Err(ProtoError::EmptyField("class name"))
        ));
    }

    #[test]
    fn response_roundtrip() {
        let ok = Response::Return(Value::Int(42));
        assert_eq!(decode_response(&encode_response(&ok)).unwrap(), ok);

        let failed = Response::Error(RemoteError::new(RemoteErrorKind::Invocation, "cart is empty"));
        assert_eq!(decode_response(&encode_response(&failed)).unwrap(), failed);
    }

    #[test]
    fn non_finite_result_becomes_error_response() {
        for value in [
            Value::Float(f64::NAN),
            Value::Float(f64::NEG_INFINITY),
            Value::List(vec![Value::Int(1), Value::Float(f64::INFINITY)]),
        ] {
            let decoded = decode_response(&encode_response(&Response::Return(value))).unwrap();
            match decoded {
                Response::Error(err) => {
                    assert_eq!(err.kind, RemoteErrorKind::Invocation);
                    assert_eq!(err.message, NON_FINITE_RESULT);
                }
                other => panic!("expected error response, got {other:?}"),
            }
        }
    }

    #[test]
    fn response_type_tells_success_from_failure() {
        let json: serde_json::Value = serde_json::from_slice(&encode_response(&Response::Error(
            RemoteError::new(RemoteErrorKind::ApplicationNotFound, "no application named x"),
        )))
        .unwrap();
        assert_eq!(json["type"], ERROR);
        assert_eq!(json["kind"], "application_not_found");
    }

    #[test]
    fn decode_response_rejects_requests() {
        let payload = encode_request(&cart_call()).unwrap();
        assert!(matches!(
            decode_response(&payload),
            Err(ProtoError::UnexpectedMessage { .. })
        ));
    }
}
