//! HTTP protocol layer module
//!
//! Response builders shared by the invocation host's routes.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response,
    build_envelope_response, build_health_response, build_invocation_error_response,
    set_server_header,
};
