//! Request handler
//!
//! Fetches the todo collection and wraps its rendering in a greeting.
//! The upstream status is never inspected and no timeout, retry, or header
//! is applied to the GET; whatever the body parses to is rendered.

use serde_json::Value;

use super::render::{to_ascii_json_string, PyRepr};
use super::{InvocationError, ResponseEnvelope};

/// Fixed upstream resource
pub const TODOS_URL: &str = "https://jsonplaceholder.typicode.com/todos";

/// Text placed in front of the rendered todos.
///
/// The body reads `Hello world [...]`. Earlier deployments formatted it as
/// `Hello world $[...]` with a stray `$`; that character is not reproduced.
pub const GREETING: &str = "Hello world";

#[derive(Debug, Clone)]
pub struct Handler {
    client: reqwest::Client,
    url: String,
}

impl Handler {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run one invocation.
    ///
    /// `event` and `context` are accepted for the host calling convention
    /// and otherwise ignored.
    pub async fn handle(
        &self,
        _event: &Value,
        _context: &Value,
    ) -> Result<ResponseEnvelope, InvocationError> {
        let todos = self.fetch().await?;
        let greeting = format!("{GREETING} {}", PyRepr(&todos));
        let body = to_ascii_json_string(&greeting).map_err(InvocationError::Encode)?;
        Ok(ResponseEnvelope::ok(body))
    }

    async fn fetch(&self) -> Result<Value, InvocationError> {
        let fetch_error = |source: reqwest::Error| InvocationError::Fetch {
            url: self.url.clone(),
            source,
        };

        let bytes = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(fetch_error)?
            .bytes()
            .await
            .map_err(fetch_error)?;

        serde_json::from_slice(&bytes).map_err(|source| InvocationError::Decode {
            url: self.url.clone(),
            source,
        })
    }
}
