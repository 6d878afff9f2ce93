//! Family and membership HTTP handlers.
//!
//! - POST /api/v1/families - Create a family (caller becomes owner)
//! - GET /api/v1/families - List the caller's families
//! - GET /api/v1/families/:id/members - List members
//! - POST /api/v1/families/:id/members - Add a member by email (owner-only)
//! - DELETE /api/v1/families/:id/members/:user_id - Remove a member (owner-only)

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::family::{AddMemberRequest, CreateFamilyRequest, FamilyResponse, MemberResponse},
    services::family_service,
    state::AppState,
};

/// Create a new family.
///
/// The caller is inserted as its first member with the `owner` role,
/// in the same database transaction as the family itself.
pub async fn create_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateFamilyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let family = family_service::create_family(&state.pool, auth.user_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(FamilyResponse::from(family))))
}

/// List the families the caller belongs to.
pub async fn list_families(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<FamilyResponse>>, AppError> {
    let families = family_service::list_families(&state.pool, auth.user_id).await?;
    Ok(Json(families.into_iter().map(Into::into).collect()))
}

/// List a family's members.
///
/// Non-members get 404 so family ids cannot be probed.
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    let members = family_service::list_members(&state.pool, family_id, auth.user_id).await?;
    Ok(Json(members))
}

/// Add a member by email. Owner-only.
///
/// # Response
///
/// - **201 Created** with the new membership row
/// - **403** when the caller is a plain member
/// - **404** when the email has no active user
/// - **409** when the user already belongs to the family
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(family_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let member =
        family_service::add_member(&state.pool, family_id, auth.user_id, &request.email).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Remove a member. Owner-only; the owner itself cannot be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((family_id, member_user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    family_service::remove_member(&state.pool, family_id, auth.user_id, member_user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
