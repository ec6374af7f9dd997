//! # atlas_api
//!
//! HTTP boundary for the Atlas auth service: routing, request/response
//! mapping, and the admission-control and bearer-auth middleware. All
//! business rules live in `atlas_core`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use tower_http::cors::{Any, CorsLayer};

use atlas_core::auth::service::AuthService;
use atlas_core::clock::Clock;
use atlas_core::ratelimit::RateLimiter;

use crate::handlers::{auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Credential service.
    pub auth: Arc<AuthService>,
    /// Admission controller consulted once per inbound request.
    pub limiter: Arc<RateLimiter>,
    /// Clock shared with the core components.
    pub clock: Arc<dyn Clock>,
    /// Process start, for the health probe.
    pub started_at: DateTime<Utc>,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let probes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/live", get(health::live));

    // Public auth routes (no bearer token required)
    let public = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout));

    // Protected routes (require a valid access token)
    let protected = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(probes)
        .merge(public)
        .merge(protected)
        // Admission control fronts every route, probes included.
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::admission_control,
        ))
        .layer(cors)
        .with_state(state)
}
