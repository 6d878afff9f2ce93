//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions/income - Add money to an account
//! - POST /api/v1/transactions/expense - Remove money from an account
//! - POST /api/v1/transactions/transfer - Move money between accounts
//! - GET /api/v1/transactions/:id - Get transaction details
//! - GET /api/v1/accounts/:id/transactions - List an account's transactions

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::transaction::{
        ExpenseRequest, IncomeRequest, ListTransactionsQuery, TransactionResponse, TransferRequest,
    },
    services::{account_service, transaction_service},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

/// Default and maximum page sizes for transaction listings.
const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

/// Record income on an account.
///
/// # Request Body
///
/// ```json
/// {
///   "account_id": "550e8400-...",
///   "amount_cents": 250000,
///   "category_id": "880e8400-...",
///   "description": "August salary",
///   "idempotency_key": "salary-2026-08"
/// }
/// ```
pub async fn create_income(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<IncomeRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    // Visibility check doubles as the existence check.
    let account =
        account_service::get_visible_account(&state.pool, auth.user_id, request.account_id).await?;
    require_category(&state, auth.user_id, request.category_id).await?;

    let transaction = transaction_service::record_income(
        &state.pool,
        account.id,
        request.amount_cents,
        request.category_id,
        request.description,
        request.idempotency_key,
    )
    .await?;

    Ok(Json(transaction.into()))
}

/// Record an expense on an account.
///
/// # Validation
///
/// - Account must have sufficient balance (422 otherwise)
/// - Account must be visible to the authenticated user
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ExpenseRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let account =
        account_service::get_visible_account(&state.pool, auth.user_id, request.account_id).await?;
    require_category(&state, auth.user_id, request.category_id).await?;

    let transaction = transaction_service::record_expense(
        &state.pool,
        account.id,
        request.amount_cents,
        request.category_id,
        request.description,
        request.idempotency_key,
    )
    .await?;

    Ok(Json(transaction.into()))
}

/// Transfer money between two visible accounts.
///
/// # Atomicity
///
/// Both accounts are updated in a single database transaction.
/// Either both succeed or both fail.
pub async fn create_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    // Both endpoints must be visible to the caller.
    account_service::get_visible_account(&state.pool, auth.user_id, request.from_account_id)
        .await?;
    account_service::get_visible_account(&state.pool, auth.user_id, request.to_account_id).await?;

    let transaction = transaction_service::record_transfer(
        &state.pool,
        request.from_account_id,
        request.to_account_id,
        request.amount_cents,
        request.description,
        request.idempotency_key,
    )
    .await?;

    Ok(Json(transaction.into()))
}

/// Get transaction by ID.
///
/// # Security
///
/// Returns 404 unless the transaction touches at least one account
/// visible to the authenticated user.
pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = transaction_service::get_transaction_by_id(&state.pool, transaction_id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    let mut visible = false;
    if let Some(from) = transaction.from_account_id {
        visible = account_service::get_visible_account(&state.pool, auth.user_id, from)
            .await
            .is_ok();
    }
    if !visible {
        if let Some(to) = transaction.to_account_id {
            visible = account_service::get_visible_account(&state.pool, auth.user_id, to)
                .await
                .is_ok();
        }
    }

    if !visible {
        return Err(AppError::TransactionNotFound);
    }

    Ok(Json(transaction.into()))
}

/// List an account's transactions, newest first.
///
/// # Query Parameters
///
/// - `limit`: page size (default 50, max 200)
/// - `category_id`: restrict to one category
pub async fn list_account_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let account =
        account_service::get_visible_account(&state.pool, auth.user_id, account_id).await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let transactions = transaction_service::list_account_transactions(
        &state.pool,
        account.id,
        query.category_id,
        limit,
    )
    .await?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

/// Reject category ids that don't belong to the caller.
async fn require_category(
    state: &AppState,
    user_id: Uuid,
    category_id: Option<Uuid>,
) -> Result<(), AppError> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    let owns: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND user_id = $2)",
    )
    .bind(category_id)
    .bind(user_id)
    .fetch_one(&state.pool)
    .await?;

    if owns {
        Ok(())
    } else {
        Err(AppError::CategoryNotFound)
    }
}
