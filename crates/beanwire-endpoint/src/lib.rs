//! Remote method invocation endpoint.
//!
//! A [`ConnectionHandler`] takes one accepted connection, reads a single framed
//! [`MethodCall`](beanwire_proto::MethodCall), resolves the target [`Application`], runs the
//! method on a bean instance under the container-wide lock, and answers with one framed
//! [`Response`](beanwire_proto::Response) before closing the connection.
//!
//! The container, server context, class loader and worker are collaborators behind traits;
//! [`LocalContainer`] and [`StaticContext`] are the in-process implementations.

pub mod application;
pub mod bean;
pub mod client;
pub mod container;
pub mod context;
pub mod error;
pub mod handler;

pub use application::{resolve, Application, ApplicationRegistry};
pub use bean::{Args, Bean, BeanType, Instance, MethodTable};
pub use client::{call, call_tcp, ClientConfig, ClientError};
pub use container::{with_instance, Container, ContainerLock, LocalContainer};
pub use context::{ClassLoader, ServerContext, StaticClassLoader, StaticContext};
pub use error::{DispatchError, InvocationError, Result};
pub use handler::{ConnectionHandler, DispatchState, HandlerConfig, Worker};
