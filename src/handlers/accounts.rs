//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/accounts - Create new account (personal or family)
//! - GET /api/v1/accounts - List all accounts visible to the user
//! - GET /api/v1/accounts/:id - Get account by ID
//! - PATCH /api/v1/accounts/:id - Rename an account
//! - DELETE /api/v1/accounts/:id - Delete an empty account

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::account::{AccountResponse, CreateAccountRequest, UpdateAccountRequest},
    services::account_service,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Create a new account.
///
/// # Endpoint
///
/// `POST /api/v1/accounts`
///
/// # Request Body
///
/// ```json
/// {
///   "account_name": "Joint Checking",
///   "currency": "EUR",
///   "initial_balance_cents": 10000,
///   "family_id": "660e8400-e29b-41d4-a716-446655440001"
/// }
/// ```
///
/// Omit `family_id` for a personal account. Ownership always satisfies
/// the XOR rule: exactly one of the caller or the family owns the account.
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created account
/// - **Error (401)**: Missing or invalid access token
/// - **Error (404)**: `family_id` given but the caller is not a member
/// - **Error (422)**: Ownership shape violates the XOR rule
pub async fn create_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = account_service::create_account(&state.pool, auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// List all accounts visible to the authenticated user.
///
/// # Endpoint
///
/// `GET /api/v1/accounts`
///
/// Returns the user's personal accounts plus every account of the
/// families they belong to, in reverse chronological order.
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = account_service::list_accounts(&state.pool, auth.user_id).await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// Get a specific account by ID.
///
/// # Security Note
///
/// The query filters by visibility (direct ownership or family
/// membership), so accounts of other tenants behave exactly like
/// nonexistent ones (404). This prevents account enumeration.
pub async fn get_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountResponse>, AppError> {
    let account =
        account_service::get_visible_account(&state.pool, auth.user_id, account_id).await?;
    Ok(Json(account.into()))
}

/// Rename an account.
pub async fn update_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = account_service::rename_account(
        &state.pool,
        auth.user_id,
        account_id,
        &request.account_name,
    )
    .await?;
    Ok(Json(account.into()))
}

/// Delete an account.
///
/// # Response
///
/// - **204 No Content** on success
/// - **403** when the caller may see but not delete the account
/// - **409** when the balance is not zero
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    account_service::delete_account(&state.pool, auth.user_id, account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
