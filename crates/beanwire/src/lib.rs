//! Remote method invocation over framed TCP connections.
//!
//! A caller sends one serialized [`MethodCall`](proto::MethodCall) per connection; the
//! endpoint resolves the target application, invokes the method on a container-managed
//! bean and answers with one [`Response`](proto::Response).
//!
//! # Crate Structure
//!
//! - [`transport`]: Line-oriented connections over TCP and Unix streams
//! - [`frame`]: Base64 frames terminated by `"\r\n"`
//! - [`proto`]: Method call descriptors, responses and their serialization
//! - [`endpoint`]: Request dispatch, applications, beans and containers (behind `endpoint` feature)

/// Re-export transport types.
pub mod transport {
    pub use beanwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use beanwire_frame::*;
}

/// Re-export protocol types.
pub mod proto {
    pub use beanwire_proto::*;
}

/// Re-export endpoint types (requires `endpoint` feature).
#[cfg(feature = "endpoint")]
pub mod endpoint {
    pub use beanwire_endpoint::*;
}
