//! Category HTTP handlers.
//!
//! - POST /api/v1/categories - Create a category
//! - GET /api/v1/categories - List the caller's categories
//! - DELETE /api/v1/categories/:id - Delete a category

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    db::is_unique_violation,
    error::AppError,
    middleware::auth::AuthContext,
    models::category::{Category, CategoryResponse, CreateCategoryRequest, KIND_EXPENSE, KIND_INCOME},
    state::AppState,
};

/// Create a category.
///
/// # Response
///
/// - **201 Created** with the category
/// - **400** on an unknown kind or empty name
/// - **409** when the caller already has a category with this name
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("category name must not be empty".to_string()));
    }
    if request.kind != KIND_INCOME && request.kind != KIND_EXPENSE {
        return Err(AppError::InvalidRequest(format!(
            "kind must be '{KIND_INCOME}' or '{KIND_EXPENSE}'"
        )));
    }

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (user_id, name, kind) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(auth.user_id)
    .bind(request.name.trim())
    .bind(&request.kind)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("a category with this name already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// List the caller's categories, income first, then alphabetically.
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE user_id = $1 ORDER BY kind, name",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Delete a category.
///
/// Refused with 409 while any budget still references it. Transactions
/// keep their category label (the FK is `ON DELETE SET NULL`).
///
/// Ownership is checked before anything else: another user's category id
/// answers 404, never a hint that the id exists.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owned: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND user_id = $2)",
    )
    .bind(category_id)
    .bind(auth.user_id)
    .fetch_one(&state.pool)
    .await?;

    let in_use: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM budgets WHERE category_id = $1)")
            .bind(category_id)
            .fetch_one(&state.pool)
            .await?;

    check_deletable(owned, in_use)?;

    let deleted = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
        .bind(category_id)
        .bind(auth.user_id)
        .execute(&state.pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::CategoryNotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

fn check_deletable(owned: bool, in_use: bool) -> Result<(), AppError> {
    if !owned {
        return Err(AppError::CategoryNotFound);
    }
    if in_use {
        return Err(AppError::Conflict(
            "category is referenced by budgets; delete those first".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_category_ids_read_as_missing_even_when_budgeted() {
        // Someone else's category must not leak whether budgets reference it.
        assert!(matches!(
            check_deletable(false, true),
            Err(AppError::CategoryNotFound)
        ));
        assert!(matches!(
            check_deletable(false, false),
            Err(AppError::CategoryNotFound)
        ));
    }

    #[test]
    fn budgeted_categories_refuse_deletion() {
        assert!(matches!(
            check_deletable(true, true),
            Err(AppError::Conflict(_))
        ));
        assert!(check_deletable(true, false).is_ok());
    }
}
