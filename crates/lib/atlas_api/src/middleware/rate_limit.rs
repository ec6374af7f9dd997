//! Admission-control middleware.
//!
//! Runs before every handler: derives a client key, consumes budget, stamps
//! the rate headers on the response, and rejects with 429 once the budget is
//! gone — all before any business logic or password hashing can start.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::error::AppError;

const HEADER_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const HEADER_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const HEADER_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admit or reject the request against the per-client budget.
pub async fn admission_control(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = state.limiter.allow(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        let retry_after_secs = (decision.reset_at - state.clock.now())
            .num_seconds()
            .max(0) as u64;
        AppError::RateLimited { retry_after_secs }.into_response()
    };

    let headers = response.headers_mut();
    headers.insert(HEADER_LIMIT, HeaderValue::from(state.limiter.limit()));
    headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(HEADER_RESET, HeaderValue::from(decision.reset_at.timestamp()));

    response
}

/// First `X-Forwarded-For` entry, else `X-Real-IP`, else the peer address.
///
/// Behind a reverse proxy the forwarding headers must be set by the proxy
/// itself; this layer trusts them as received.
fn client_key(request: &Request) -> String {
    if let Some(xff) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        && let Some(first) = xff.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        && !real_ip.trim().is_empty()
    {
        return real_ip.trim().to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
