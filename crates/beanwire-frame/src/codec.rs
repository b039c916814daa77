use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Line terminator closing every frame.
pub const TERMINATOR: &[u8; 2] = b"\r\n";

/// Default maximum encoded frame size (terminator excluded): 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A decoded frame: the raw serialized message carried on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The message payload, base64-decoded.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (encoded body + terminator).
    pub fn wire_size(&self) -> usize {
        encoded_len(self.payload.len()).saturating_add(TERMINATOR.len())
    }
}

/// Length of the base64 body for a payload of `payload_len` bytes.
pub fn encoded_len(payload_len: usize) -> usize {
    base64::encoded_len(payload_len, true).unwrap_or(usize::MAX)
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────────────────────┬────────────┐
/// │ base64(payload)             │ "\r\n"     │
/// │ standard alphabet, padded   │ terminator │
/// └─────────────────────────────┴────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let size = encoded_len(payload.len());
    if size > u32::MAX as usize {
        return Err(FrameError::FrameTooLarge {
            size,
            max: u32::MAX as usize,
        });
    }
    dst.reserve(size + TERMINATOR.len());
    dst.put_slice(STANDARD.encode(payload).as_bytes());
    dst.put_slice(TERMINATOR);
    Ok(())
}

/// Decode one assembled frame line.
///
/// ASCII whitespace is dropped before decoding: the terminator itself and the line
/// breaks of continuation lines. Base64 never contains whitespace.
pub fn decode_frame(wire: &[u8]) -> Result<Frame> {
    let body: Vec<u8> = wire
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let payload = STANDARD.decode(body)?;
    Ok(Frame::new(payload))
}

/// Configuration for frame reading and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum encoded frame size in bytes, terminator excluded. Default: 16 MiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"hello, beanwire!";

        encode_frame(payload, &mut buf).unwrap();
        assert!(buf.ends_with(TERMINATOR));

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.payload.as_ref(), payload);
    }

    #[test]
    fn test_encode_is_plain_base64_line() {
        let mut buf = BytesMut::new();
        encode_frame(b"42", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"NDI=\r\n");
    }

    #[test]
    fn test_decode_without_terminator() {
        let frame = decode_frame(b"NDI=").unwrap();
        assert_eq!(frame.payload.as_ref(), b"42");
    }

    #[test]
    fn test_decode_joins_continuation_lines() {
        let frame = decode_frame(b"aGVs\nbG8=\r\n").unwrap();
        assert_eq!(frame.payload.as_ref(), b"hello");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let result = decode_frame(b"not base64 at all!\r\n");
        assert!(matches!(result, Err(FrameError::InvalidEncoding(_))));
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), TERMINATOR);

        let frame = decode_frame(&buf).unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), 8 + TERMINATOR.len());
    }

    #[test]
    fn test_invalid_encoding_is_not_transport() {
        let err = decode_frame(b"%%%").unwrap_err();
        assert!(!err.is_transport());
        assert!(FrameError::ConnectionClosed.is_transport());
    }
}
