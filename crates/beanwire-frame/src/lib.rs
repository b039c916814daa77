//! Line framing for beanwire messages.
//!
//! Every message travels as a single text line:
//! - the serialized payload, base64 encoded (standard alphabet, padded)
//! - followed by the `"\r\n"` terminator
//!
//! One frame per direction per connection. No partial frames are ever written.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE, TERMINATOR};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
