// Invocation errors
// The handler never turns these into a response; the host decides how to report them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvocationError {
    /// The outbound GET failed (DNS, connect, TLS, or body transfer)
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream body is not valid JSON
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode response body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl InvocationError {
    /// Short error class name reported alongside the message
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "FetchError",
            Self::Decode { .. } => "DecodeError",
            Self::Encode(_) => "EncodeError",
        }
    }
}
