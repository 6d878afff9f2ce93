//! Authentication HTTP handlers.
//!
//! This module implements the auth-related API endpoints:
//! - POST /api/v1/auth/register - Create a new user
//! - POST /api/v1/auth/login - Exchange credentials for tokens
//! - POST /api/v1/auth/refresh - Rotate a refresh token
//! - POST /api/v1/auth/logout - Revoke a refresh token
//! - POST /api/v1/auth/password - Change password
//! - POST /api/v1/auth/2fa/* - TOTP enrollment lifecycle
//!
//! Register/login/refresh are public but rate limited per client IP;
//! the rest require a valid access token.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::user::{
        ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse,
        TotpCodeRequest, UserResponse,
    },
    services::auth_service,
    state::AppState,
};

/// Register a new user.
///
/// # Endpoint
///
/// `POST /api/v1/auth/register`
///
/// # Request Body
///
/// ```json
/// {
///   "email": "ada@example.com",
///   "password": "correct horse battery staple",
///   "display_name": "Ada"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created user (no secrets)
/// - **Error (400)**: Invalid email or password too short
/// - **Error (409)**: Email already registered
/// - **Error (429)**: Rate limit exceeded
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_service::register(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Exchange email/password (and TOTP code when enabled) for a token pair.
///
/// # Endpoint
///
/// `POST /api/v1/auth/login`
///
/// # Response
///
/// - **Success (200 OK)**: `{access_token, refresh_token, token_type, expires_in}`
/// - **Error (401)**: Bad credentials, missing/bad TOTP code
/// - **Error (423)**: Account locked after repeated failures
/// - **Error (429)**: Rate limit exceeded
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = auth_service::login(&state.pool, &state.config, request).await?;
    Ok(Json(tokens))
}

/// Rotate a refresh token into a new token pair.
///
/// The presented token is revoked; reusing it afterwards is a 401.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens =
        auth_service::refresh(&state.pool, &state.config, &request.refresh_token).await?;
    Ok(Json(tokens))
}

/// Revoke the presented refresh token.
///
/// # Response
///
/// Returns 204 No Content, also when the token was already gone.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<RefreshRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&state.pool, auth.user_id, &request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the password and revoke every outstanding session.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::change_password(&state.pool, auth.user_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Response body for `POST /api/v1/auth/2fa/setup`.
#[derive(Debug, Serialize)]
pub struct TotpSetupResponse {
    /// Hex-encoded TOTP secret, shown only here
    pub secret: String,
}

/// Begin TOTP enrollment; returns the secret to load into an authenticator.
pub async fn totp_setup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<TotpSetupResponse>, AppError> {
    let secret = auth_service::totp_setup(&state.pool, auth.user_id).await?;
    Ok(Json(TotpSetupResponse { secret }))
}

/// Complete TOTP enrollment with a code from the authenticator.
pub async fn totp_enable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<TotpCodeRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::totp_enable(&state.pool, auth.user_id, &request.code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Turn TOTP off again; requires a current valid code.
pub async fn totp_disable(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<TotpCodeRequest>,
) -> Result<StatusCode, AppError> {
    auth_service::totp_disable(&state.pool, auth.user_id, &request.code).await?;
    Ok(StatusCode::NO_CONTENT)
}
