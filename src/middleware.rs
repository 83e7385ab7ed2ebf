use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::rate_limiter::RateLimiter;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tag each request with an `x-request-id`, keeping one the client sent.
/// The id is echoed on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = match request.headers().get(REQUEST_ID_HEADER) {
        Some(existing) => existing.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            request
                .headers_mut()
                .insert(REQUEST_ID_HEADER, generated.clone());
            generated
        }
    };

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(REQUEST_ID_HEADER, request_id);
    response
}

/// Logging middleware for request/response tracking
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = client_key(&request);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    info!(
        target: "product_catalog::middleware",
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        request_id = %request_id,
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        target: "product_catalog::middleware",
        method = %method,
        uri = %uri,
        status = %response.status(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

/// Admit or reject the request according to the injected limiter
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<dyn RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let key = client_key(&request);
    let (allowed, retry_after) = limiter.allow(&key);

    if !allowed {
        warn!(
            target: "product_catalog::middleware",
            method = %request.method(),
            path = %request.uri().path(),
            client_key = %key,
            "rate limit exceeded"
        );
        return ApiError::RateLimited { retry_after }.into_response();
    }

    next.run(request).await
}

/// Identity used to bucket rate-limit counts: forwarded headers first, then
/// the peer address.
///
/// `x-forwarded-for` and `x-real-ip` are taken at face value, so the service
/// must sit behind a trusted proxy that overwrites them. Exposed directly,
/// a client can pick a fresh key on every request.
pub fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return first_ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return ip_str.trim().to_string();
        }
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_key_with_forwarded_header() {
        let mut request = Request::new(Body::empty());
        request.headers_mut().insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        assert_eq!(client_key(&request), "192.168.1.1");
    }

    #[test]
    fn test_client_key_trusts_forwarded_over_peer() {
        let mut request = Request::new(Body::empty());
        request
            .headers_mut()
            .insert("x-forwarded-for", HeaderValue::from_static("198.51.100.9"));
        request
            .headers_mut()
            .insert("x-real-ip", HeaderValue::from_static("203.0.113.1"));
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 55000))));

        assert_eq!(client_key(&request), "198.51.100.9");
    }

    #[test]
    fn test_client_key_with_real_ip_header() {
        let mut request = Request::new(Body::empty());
        request
            .headers_mut()
            .insert("x-real-ip", HeaderValue::from_static("203.0.113.1"));

        assert_eq!(client_key(&request), "203.0.113.1");
    }

    #[test]
    fn test_client_key_from_connect_info() {
        let mut request = Request::new(Body::empty());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 55000))));

        assert_eq!(client_key(&request), "10.1.2.3");
    }

    #[test]
    fn test_client_key_fallback() {
        let request = Request::new(Body::empty());
        assert_eq!(client_key(&request), "unknown");
    }
}
