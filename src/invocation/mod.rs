//! Invocation module
//!
//! The request handler and the values it exchanges with its host:
//! - `Handler`: one outbound GET per invocation, wrapped into an envelope
//! - `ResponseEnvelope`: the `{statusCode, body}` result
//! - `InvocationError`: failures that propagate out of an invocation
//! - `PyRepr`: dynamic-language stringification of a parsed JSON value

mod envelope;
mod error;
mod handler;
mod render;

pub use envelope::ResponseEnvelope;
pub use error::InvocationError;
pub use handler::{Handler, TODOS_URL};
