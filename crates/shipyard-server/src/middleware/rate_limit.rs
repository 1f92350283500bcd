//! Rate limiting middleware
//!
//! Runs before routing-level authentication, so every request counts against
//! the client's budget, including the unauthenticated health route.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shipyard_auth::RateLimitKey;

use crate::error::ServerError;
use crate::state::AppState;

/// Identify the client behind a request
///
/// The peer socket address is used unless `trust_forwarded` is set, in which
/// case the first `X-Forwarded-For` entry, then `X-Real-IP`, take precedence.
/// Requests with no identifiable client share the `"unknown"` key.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded: bool,
) -> RateLimitKey {
    if trust_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let real_ip = || {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        if let Some(ip) = forwarded.or_else(real_ip) {
            return RateLimitKey::ip(ip);
        }
    }

    match peer {
        Some(addr) => RateLimitKey::ip(addr.ip().to_string()),
        None => RateLimitKey::ip("unknown"),
    }
}

/// Rate limiting middleware - fixed window per client
pub async fn rate_limiting_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer, state.trust_forwarded_headers);

    if let Err(info) = state.limiter.check(&key).await {
        return ServerError::RateLimited {
            retry_after_secs: info.retry_after_secs(),
        }
        .into_response();
    }

    next.run(request).await
}
