//! Budget service - monthly spending caps and computed spend.
//!
//! Budgets are per (user, category, month). Spend is computed on read
//! from the month's expense transactions in the user's personal
//! accounts; nothing is denormalized, so budgets can never drift out of
//! sync with the ledger.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::{DbPool, is_unique_violation},
    error::AppError,
    models::budget::{Budget, BudgetResponse, next_month},
};

/// Create a budget for a category and month.
///
/// The category must belong to the caller; 409 when a budget for the
/// same (category, month) already exists.
pub async fn create_budget(
    pool: &DbPool,
    user_id: Uuid,
    category_id: Uuid,
    month: NaiveDate,
    limit_cents: i64,
) -> Result<BudgetResponse, AppError> {
    if limit_cents <= 0 {
        return Err(AppError::InvalidRequest("limit_cents must be positive".to_string()));
    }

    let owns_category: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND user_id = $2)")
            .bind(category_id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    if !owns_category {
        return Err(AppError::CategoryNotFound);
    }

    let budget = sqlx::query_as::<_, Budget>(
        r#"
        INSERT INTO budgets (user_id, category_id, month, limit_cents)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(category_id)
    .bind(month)
    .bind(limit_cents)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("a budget for this category and month already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    let spent = spent_cents(pool, user_id, category_id, month).await?;
    Ok(BudgetResponse::from_budget(budget, spent))
}

/// List the user's budgets for one month, each with computed spend.
pub async fn list_budgets(
    pool: &DbPool,
    user_id: Uuid,
    month: NaiveDate,
) -> Result<Vec<BudgetResponse>, AppError> {
    let budgets = sqlx::query_as::<_, Budget>(
        "SELECT * FROM budgets WHERE user_id = $1 AND month = $2 ORDER BY created_at",
    )
    .bind(user_id)
    .bind(month)
    .fetch_all(pool)
    .await?;

    let mut responses = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let spent = spent_cents(pool, user_id, budget.category_id, budget.month).await?;
        responses.push(BudgetResponse::from_budget(budget, spent));
    }

    Ok(responses)
}

/// Change a budget's limit.
pub async fn update_budget(
    pool: &DbPool,
    user_id: Uuid,
    budget_id: Uuid,
    limit_cents: i64,
) -> Result<BudgetResponse, AppError> {
    if limit_cents <= 0 {
        return Err(AppError::InvalidRequest("limit_cents must be positive".to_string()));
    }

    let budget = sqlx::query_as::<_, Budget>(
        r#"
        UPDATE budgets SET limit_cents = $1, updated_at = NOW()
        WHERE id = $2 AND user_id = $3
        RETURNING *
        "#,
    )
    .bind(limit_cents)
    .bind(budget_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::BudgetNotFound)?;

    let spent = spent_cents(pool, user_id, budget.category_id, budget.month).await?;
    Ok(BudgetResponse::from_budget(budget, spent))
}

/// Delete a budget.
pub async fn delete_budget(pool: &DbPool, user_id: Uuid, budget_id: Uuid) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
        .bind(budget_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::BudgetNotFound);
    }
    Ok(())
}

/// Sum of the month's completed expense transactions in this category,
/// across the user's personal accounts.
async fn spent_cents(
    pool: &DbPool,
    user_id: Uuid,
    category_id: Uuid,
    month: NaiveDate,
) -> Result<i64, AppError> {
    let spent: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT SUM(t.amount_cents)::bigint
        FROM transactions t
        JOIN accounts a ON a.id = t.from_account_id
        WHERE a.owner_user_id = $1
          AND t.category_id = $2
          AND t.transaction_type = 'expense'
          AND t.status = 'completed'
          AND t.created_at >= $3
          AND t.created_at < $4
        "#,
    )
    .bind(user_id)
    .bind(category_id)
    .bind(month)
    .bind(next_month(month))
    .fetch_one(pool)
    .await?;

    Ok(spent.unwrap_or(0))
}
