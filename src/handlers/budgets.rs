//! Budget HTTP handlers.
//!
//! - POST /api/v1/budgets - Create a budget for a category and month
//! - GET /api/v1/budgets?month=YYYY-MM - List budgets with computed spend
//! - PATCH /api/v1/budgets/:id - Change the limit
//! - DELETE /api/v1/budgets/:id - Delete a budget

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::budget::{
        BudgetResponse, CreateBudgetRequest, ListBudgetsQuery, UpdateBudgetRequest, parse_month,
    },
    services::budget_service,
    state::AppState,
};

/// Create a budget.
///
/// # Request Body
///
/// ```json
/// {
///   "category_id": "880e8400-...",
///   "month": "2026-08",
///   "limit_cents": 40000
/// }
/// ```
pub async fn create_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let month = parse_month(&request.month)?;
    let budget = budget_service::create_budget(
        &state.pool,
        auth.user_id,
        request.category_id,
        month,
        request.limit_cents,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// List the caller's budgets for a month, each with `spent_cents`
/// computed from that month's expense transactions.
///
/// `month` defaults to the current calendar month.
pub async fn list_budgets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListBudgetsQuery>,
) -> Result<Json<Vec<BudgetResponse>>, AppError> {
    let month = match query.month {
        Some(ref m) => parse_month(m)?,
        None => current_month(),
    };

    let budgets = budget_service::list_budgets(&state.pool, auth.user_id, month).await?;
    Ok(Json(budgets))
}

/// Change a budget's limit.
pub async fn update_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(budget_id): Path<Uuid>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<Json<BudgetResponse>, AppError> {
    let budget =
        budget_service::update_budget(&state.pool, auth.user_id, budget_id, request.limit_cents)
            .await?;
    Ok(Json(budget))
}

/// Delete a budget.
pub async fn delete_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(budget_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    budget_service::delete_budget(&state.pool, auth.user_id, budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// First day of the current month (UTC).
fn current_month() -> NaiveDate {
    let today = Utc::now().date_naive();
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1).expect("first of month is always valid")
}
