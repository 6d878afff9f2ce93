//! Current-user profile handlers.
//!
//! - GET /api/v1/users/me - Fetch the authenticated user's profile
//! - PATCH /api/v1/users/me - Update the display name

use axum::{Extension, Json, extract::State};

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::user::{UpdateProfileRequest, User, UserResponse},
    state::AppState,
};

/// Fetch the authenticated user's profile.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = true")
        .bind(auth.user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Update the authenticated user's display name.
///
/// Sending `"display_name": null` clears it.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET display_name = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&request.display_name)
    .bind(auth.user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(user.into()))
}
