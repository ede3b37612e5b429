//! Invoke endpoint
//!
//! Turns one HTTP request body into an `(event, context)` pair, runs the
//! handler, and reports the outcome the way a function host would: the
//! envelope on success, an error payload when the invocation fails.

use chrono::Utc;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::Response;
use serde_json::{json, Value};
use std::time::Instant;

use crate::config::AppState;
use crate::http;
use crate::logger;

/// Outcome of an invoke request, plus the request id when one was assigned
pub struct InvokeOutcome {
    pub response: Response<Full<Bytes>>,
    pub request_id: Option<String>,
}

impl From<Response<Full<Bytes>>> for InvokeOutcome {
    fn from(response: Response<Full<Bytes>>) -> Self {
        Self {
            response,
            request_id: None,
        }
    }
}

/// Read the event from `body` and invoke the handler
pub async fn handle_invoke<B>(body: B, state: &AppState) -> InvokeOutcome
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<http_body_util::LengthLimitError>() => {
            logger::log_warning(&format!("Invocation payload exceeds {limit} bytes"));
            return http::build_413_response().into();
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read invocation payload: {e}"));
            return http::build_400_response("Failed to read request body").into();
        }
    };

    let event = match parse_event(&bytes) {
        Ok(event) => event,
        Err(e) => {
            logger::log_warning(&format!("Invalid invocation payload: {e}"));
            return http::build_400_response(&format!("Event is not valid JSON: {e}")).into();
        }
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    let context = build_context(&request_id, &state.config.function.name);

    let started = Instant::now();
    let response = match state.handler.handle(&event, &context).await {
        Ok(envelope) => {
            logger::log_invocation(&request_id, started.elapsed());
            http::build_envelope_response(&envelope)
        }
        Err(e) => {
            logger::log_invocation_error(&request_id, &e);
            http::build_invocation_error_response(&e)
        }
    };

    InvokeOutcome {
        response,
        request_id: Some(request_id),
    }
}

/// An empty (or whitespace-only) payload is the empty event `{}`
fn parse_event(bytes: &[u8]) -> serde_json::Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(bytes)
}

/// Context value handed to the handler alongside the event
fn build_context(request_id: &str, function_name: &str) -> Value {
    json!({
        "request_id": request_id,
        "function_name": function_name,
        "received_at": Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event() {
        assert_eq!(parse_event(b"").unwrap(), json!({}));
        assert_eq!(parse_event(b" \n").unwrap(), json!({}));
        assert_eq!(parse_event(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parse_event(b"null").unwrap(), Value::Null);
        assert!(parse_event(b"{oops").is_err());
    }

    #[test]
    fn test_build_context() {
        let context = build_context("abc-123", "todo-greeter");
        assert_eq!(context["request_id"], "abc-123");
        assert_eq!(context["function_name"], "todo-greeter");
        let received_at = context["received_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(received_at).is_ok());
    }
}
