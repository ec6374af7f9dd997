//! Authentication middleware — Bearer token extraction and verification.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use atlas_core::models::User;

use crate::AppState;
use crate::error::AppError;

/// Authenticated subject stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Extracts `Authorization: Bearer <token>`, resolves it to an active user
/// via the credential service, and injects [`AuthenticatedUser`] into the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authorization header is required".into()))?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("invalid authorization header format: expected Bearer scheme".into())
    })?;

    let user = state.auth.validate_access_token(token).await?;
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}
