// Test helpers: throwaway upstream servers on 127.0.0.1

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::Config;

/// Request as observed by a recording upstream
#[derive(Debug)]
pub struct SeenRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}

/// Serve `body` with `status` for every request; returns the todos URL
pub async fn spawn_upstream(status: u16, body: &'static str) -> String {
    let (url, _requests) = spawn_recording_upstream(status, body).await;
    url
}

/// Like [`spawn_upstream`], answering only after `delay`
pub async fn spawn_slow_upstream(delay: Duration, body: &'static str) -> String {
    let (url, _requests) = serve_upstream(200, body, delay).await;
    url
}

/// Like [`spawn_upstream`], also reporting each request it receives
pub async fn spawn_recording_upstream(
    status: u16,
    body: &'static str,
) -> (String, mpsc::UnboundedReceiver<SeenRequest>) {
    serve_upstream(status, body, Duration::ZERO).await
}

async fn serve_upstream(
    status: u16,
    body: &'static str,
    delay: Duration,
) -> (String, mpsc::UnboundedReceiver<SeenRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let _ = tx.send(SeenRequest {
                        method: req.method().clone(),
                        uri: req.uri().to_string(),
                        headers: req.headers().clone(),
                    });
                    async move {
                        tokio::time::sleep(delay).await;
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .header("Content-Type", "application/json")
                                .body(Full::new(Bytes::from_static(body.as_bytes())))
                                .unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    (format!("http://{addr}/todos"), rx)
}

/// URL of a port that was just released, so connecting to it fails
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/todos")
}

/// Default configuration pointed at `upstream_url`
pub fn test_config(upstream_url: &str) -> Config {
    let mut config = Config::load_from("does-not-exist/todo-greeter-test").unwrap();
    config.function.upstream_url = upstream_url.to_string();
    config
}
