//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health probes, invoke paths,
//! method and size checks, and the access log line for every request.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::invoke::{handle_invoke, InvokeOutcome};
use crate::config::{AppState, RoutesConfig};
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let mut entry = access_entry(&req, peer_addr);

    let outcome = route_request(req, &state).await;
    let mut response = outcome.response;
    http::set_server_header(&mut response, &state.config.http.server_name);

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response_size(&response);
        entry.request_id = outcome.request_id;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and configuration
async fn route_request<B>(req: Request<B>, state: &AppState) -> InvokeOutcome
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let routes = &state.config.routes;
    let path = req.uri().path();

    // 1. Health check endpoints
    if is_health_path(routes, path) {
        return match *req.method() {
            Method::GET | Method::HEAD => http::build_health_response("ok").into(),
            _ => http::build_405_response("GET, HEAD").into(),
        };
    }

    // 2. Invoke endpoints
    if routes.invoke_paths.iter().any(|p| p == path) {
        if req.method() != Method::POST {
            logger::log_warning(&format!("Method not allowed on {path}: {}", req.method()));
            return http::build_405_response("POST").into();
        }
        if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
            return resp.into();
        }
        return handle_invoke(req.into_body(), state).await;
    }

    // 3. Anything else
    http::build_404_response().into()
}

fn is_health_path(routes: &RoutesConfig, path: &str) -> bool {
    routes.health.enabled
        && (path == routes.health.liveness_path || path == routes.health.readiness_path)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', relying on body limit"
                ));
                None
            }
            _ => None,
        },
    )
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

fn http_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn response_size(response: &Response<Full<Bytes>>) -> usize {
    response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}
