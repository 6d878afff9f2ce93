//! Per-user transaction categories.
//!
//! Categories label transactions for reporting and are the anchor for
//! budgets. Every user gets a default set seeded at registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category kinds. Budgets only make sense for expense categories.
pub const KIND_INCOME: &str = "income";
pub const KIND_EXPENSE: &str = "expense";

/// Default categories seeded for every new user, inside the
/// registration database transaction.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Salary", KIND_INCOME),
    ("Groceries", KIND_EXPENSE),
    ("Housing", KIND_EXPENSE),
    ("Transport", KIND_EXPENSE),
    ("Entertainment", KIND_EXPENSE),
    ("Other", KIND_EXPENSE),
];

/// Represents a category record from the database.
///
/// Unique per (user_id, name).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Category {
    pub id: Uuid,

    /// Owning user; categories are never shared
    #[serde(skip_serializing)]
    pub user_id: Uuid,

    pub name: String,

    /// Either "income" or "expense"
    pub kind: String,

    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,

    /// Either "income" or "expense"
    pub kind: String,
}

/// Response body for category endpoints.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            kind: category.kind,
            created_at: category.created_at,
        }
    }
}
