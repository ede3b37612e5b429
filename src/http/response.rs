//! HTTP response building module
//!
//! Provides builders for the invocation host's responses, decoupled from
//! routing.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::invocation::{InvocationError, ResponseEnvelope};

/// Header marking a response as a failed invocation
pub const FUNCTION_ERROR_HEADER: &str = "x-function-error";

/// Build JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_500_response();
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response carrying a successful envelope
pub fn build_envelope_response(envelope: &ResponseEnvelope) -> Response<Full<Bytes>> {
    build_json_response(StatusCode::OK, envelope)
}

/// Build 500 response reporting an unhandled invocation error
pub fn build_invocation_error_response(err: &InvocationError) -> Response<Full<Bytes>> {
    let payload = json!({
        "errorMessage": err.to_string(),
        "errorType": err.error_type(),
    });
    let mut response = build_json_response(StatusCode::INTERNAL_SERVER_ERROR, &payload);
    response
        .headers_mut()
        .insert(FUNCTION_ERROR_HEADER, HeaderValue::from_static("Unhandled"));
    response
}

/// Build health check response
pub fn build_health_response(status: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(status.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from_static(status.as_bytes())))
        })
}

/// Build 400 Bad Request response
pub fn build_400_response(message: &str) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::BAD_REQUEST,
        &json!({ "errorMessage": message, "errorType": "InvalidRequestContent" }),
    )
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = build_plain_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    build_plain_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

fn build_plain_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Stamp the `Server` header; invalid names are skipped
pub fn set_server_header(response: &mut Response<Full<Bytes>>, server_name: &str) {
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            response.headers_mut().insert(SERVER, value);
        }
        Err(e) => crate::logger::log_warning(&format!("Invalid server name '{server_name}': {e}")),
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_envelope_response() {
        let response = build_envelope_response(&ResponseEnvelope::ok("\"Hello world []\"".into()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            body_text(response).await,
            r#"{"statusCode":200,"body":"\"Hello world []\""}"#
        );
    }

    #[tokio::test]
    async fn test_invocation_error_response() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = InvocationError::Decode {
            url: "http://upstream/todos".into(),
            source,
        };

        let response = build_invocation_error_response(&err);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[FUNCTION_ERROR_HEADER], "Unhandled");
        let payload: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(payload["errorType"], "DecodeError");
        assert!(payload["errorMessage"]
            .as_str()
            .unwrap()
            .contains("http://upstream/todos"));
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let response = build_405_response("POST");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[test]
    fn test_server_header() {
        let mut response = build_404_response();
        set_server_header(&mut response, "todo-greeter/0.1");
        assert_eq!(response.headers()[SERVER], "todo-greeter/0.1");

        let mut response = build_404_response();
        set_server_header(&mut response, "bad\nname");
        assert!(response.headers().get(SERVER).is_none());
    }
}
