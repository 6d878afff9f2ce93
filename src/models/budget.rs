//! Monthly per-category budget models.
//!
//! A budget caps spending for one category in one calendar month.
//! `month` is stored as a DATE pinned to the first of the month;
//! the API speaks "YYYY-MM".

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Represents a budget record from the database.
///
/// Unique per (user_id, category_id, month).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,

    /// First day of the budgeted month
    pub month: NaiveDate,

    /// Spending cap in cents
    pub limit_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parse an API month string ("YYYY-MM") into the first day of that month.
///
/// # Errors
///
/// Returns `AppError::InvalidRequest` for anything that is not a real
/// calendar month.
pub fn parse_month(month: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidRequest(format!("invalid month '{month}', expected YYYY-MM")))
}

/// The first day of the month after `month`.
///
/// Used as the exclusive upper bound when summing a month's expenses.
pub fn next_month(month: NaiveDate) -> NaiveDate {
    let (year, next) = if month.month() == 12 {
        (month.year() + 1, 1)
    } else {
        (month.year(), month.month() + 1)
    };
    // Day 1 of a valid year/month pair always exists.
    NaiveDate::from_ymd_opt(year, next, 1).expect("first of month is always valid")
}

/// Request body for `POST /api/v1/budgets`.
///
/// # JSON Example
///
/// ```json
/// {
///   "category_id": "880e8400-e29b-41d4-a716-446655440003",
///   "month": "2026-08",
///   "limit_cents": 40000
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub category_id: Uuid,

    /// Month in "YYYY-MM" form
    pub month: String,

    pub limit_cents: i64,
}

/// Request body for `PATCH /api/v1/budgets/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub limit_cents: i64,
}

/// Query parameters for `GET /api/v1/budgets`.
#[derive(Debug, Deserialize)]
pub struct ListBudgetsQuery {
    /// Month in "YYYY-MM" form; defaults to the current month
    pub month: Option<String>,
}

/// Response body for budget endpoints, including computed spend.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "990e8400-e29b-41d4-a716-446655440004",
///   "category_id": "880e8400-e29b-41d4-a716-446655440003",
///   "month": "2026-08",
///   "limit_cents": 40000,
///   "spent_cents": 12350
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub id: Uuid,
    pub category_id: Uuid,

    /// Month in "YYYY-MM" form
    pub month: String,

    pub limit_cents: i64,

    /// Sum of this month's expense transactions in the category,
    /// across the user's personal accounts
    pub spent_cents: i64,
}

impl BudgetResponse {
    pub fn from_budget(budget: Budget, spent_cents: i64) -> Self {
        Self {
            id: budget.id,
            category_id: budget.category_id,
            month: budget.month.format("%Y-%m").to_string(),
            limit_cents: budget.limit_cents,
            spent_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_month() {
        let date = parse_month("2026-08").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
    }

    #[test]
    fn rejects_garbage_months() {
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("not-a-month").is_err());
        assert!(parse_month("2026").is_err());
        assert!(parse_month("").is_err());
    }

    #[test]
    fn next_month_rolls_over_december() {
        let dec = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        assert_eq!(next_month(dec), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn next_month_within_year() {
        let aug = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert_eq!(next_month(aug), NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn month_round_trips_through_response_format() {
        let date = parse_month("2026-02").unwrap();
        assert_eq!(date.format("%Y-%m").to_string(), "2026-02");
    }
}
