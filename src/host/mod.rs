//! Invocation host module
//!
//! Local HTTP front end for the handler, in the style of a serverless
//! runtime emulator: `POST` an event, receive the response envelope.

pub mod invoke;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
