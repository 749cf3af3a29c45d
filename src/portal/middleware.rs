//! Request logging middleware

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

/// Requests slower than this are logged at warn level
pub const SLOW_REQUEST: Duration = Duration::from_millis(100);

/// Log every request with its origin and peer, and flag slow ones.
pub async fn request_log_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |ConnectInfo(addr)| addr.to_string());

    info!(method = %method, path = %path, origin = %origin, peer = %peer, "Request");

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    if elapsed > SLOW_REQUEST {
        warn!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Slow request"
        );
    }

    response
}
