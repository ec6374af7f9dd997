//! Authentication request handlers.

use axum::extract::{Extension, Json, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use atlas_core::auth::service::{LoginResponse, RefreshResponse};
use atlas_core::models::{Registration, User};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// `POST /api/v1/auth/register` — create a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Registration>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.auth.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "user registered successfully".into(),
            user,
        }),
    ))
}

/// `POST /api/v1/auth/login` — authenticate with email + password.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let resp = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /api/v1/auth/refresh` — exchange a refresh token for a new access
/// token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let resp = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(resp))
}

/// `GET /api/v1/auth/me` — identity of the bearer. The auth middleware has
/// already resolved the token to an active user.
pub async fn me(Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>) -> Json<User> {
    Json(user)
}

/// `POST /api/v1/auth/logout` — tokens are stateless, so logout is a
/// client-side discard; the endpoint exists for symmetry with login.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "logout successful".into(),
    })
}
