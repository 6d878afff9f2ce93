//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing a financial account
//! - `AccountOwner`: the XOR ownership rule and its validation
//! - `CreateAccountRequest` / `UpdateAccountRequest`: request bodies
//! - `AccountResponse`: response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Each account:
/// - Is owned by exactly one of a user or a family (XOR rule, see [`AccountOwner`])
/// - Has a balance stored in cents (to avoid floating-point errors)
///
/// # Balance Storage
///
/// Balances are stored as `i64` cents to avoid floating-point precision issues.
///
/// For example:
/// - $10.50 is stored as 1050 cents
/// - $100.00 is stored as 10000 cents
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: Uuid,

    /// Owning user, mutually exclusive with `family_id`
    pub owner_user_id: Option<Uuid>,

    /// Owning family, mutually exclusive with `owner_user_id`
    pub family_id: Option<Uuid>,

    /// Human-readable name for this account
    pub account_name: String,

    /// Current balance in cents (not dollars)
    ///
    /// Must be >= 0 (enforced by database CHECK constraint).
    pub balance_cents: i64,

    /// Currency code (ISO 4217, 3 letters)
    ///
    /// Examples: "USD", "EUR", "GBP"
    pub currency: String,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of last balance update
    pub updated_at: DateTime<Utc>,
}

/// The two legal ownership shapes for an account.
///
/// The business rule is XOR: an account belongs to exactly one of a
/// user or a family, never both, never neither. The database columns
/// are both nullable; this type is the application-level enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOwner {
    User(Uuid),
    Family(Uuid),
}

impl AccountOwner {
    /// Validate a pair of nullable owner columns against the XOR rule.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidOwnership` when both or neither side is set.
    pub fn from_columns(
        owner_user_id: Option<Uuid>,
        family_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        match (owner_user_id, family_id) {
            (Some(user_id), None) => Ok(AccountOwner::User(user_id)),
            (None, Some(family_id)) => Ok(AccountOwner::Family(family_id)),
            (Some(_), Some(_)) => Err(AppError::InvalidOwnership(
                "account cannot belong to both a user and a family".to_string(),
            )),
            (None, None) => Err(AppError::InvalidOwnership(
                "account must belong to a user or a family".to_string(),
            )),
        }
    }

    /// The value for the `owner_user_id` column.
    pub fn user_column(&self) -> Option<Uuid> {
        match self {
            AccountOwner::User(id) => Some(*id),
            AccountOwner::Family(_) => None,
        }
    }

    /// The value for the `family_id` column.
    pub fn family_column(&self) -> Option<Uuid> {
        match self {
            AccountOwner::User(_) => None,
            AccountOwner::Family(id) => Some(*id),
        }
    }
}

/// Request body for creating a new account.
///
/// # JSON Example
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
/// # Ownership
///
/// Omitting `family_id` creates a personal account owned by the caller.
/// Supplying it creates a family account; the caller must be a member.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Name for the new account
    pub account_name: String,

    /// Currency code (defaults to "USD" if not provided)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Initial balance in cents (defaults to 0 if not provided)
    #[serde(default)]
    pub initial_balance_cents: i64,

    /// Owning family; absent means the account is personal
    pub family_id: Option<Uuid>,
}

/// Default currency value when not specified in request.
fn default_currency() -> String {
    "USD".to_string()
}

/// Request body for `PATCH /api/v1/accounts/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub account_name: String,
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "account_name": "Joint Checking",
///   "balance_cents": 100000,
///   "currency": "EUR",
///   "owner_user_id": null,
///   "family_id": "660e8400-e29b-41d4-a716-446655440001",
///   "created_at": "2026-08-20T10:00:00Z",
///   "updated_at": "2026-08-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_name: String,
    pub balance_cents: i64,
    pub currency: String,
    pub owner_user_id: Option<Uuid>,
    pub family_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_name: account.account_name,
            balance_cents: account.balance_cents,
            currency: account.currency,
            owner_user_id: account.owner_user_id,
            family_id: account.family_id,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_ownership_is_valid() {
        let user = Uuid::new_v4();
        let owner = AccountOwner::from_columns(Some(user), None).unwrap();
        assert_eq!(owner, AccountOwner::User(user));
        assert_eq!(owner.user_column(), Some(user));
        assert_eq!(owner.family_column(), None);
    }

    #[test]
    fn family_ownership_is_valid() {
        let family = Uuid::new_v4();
        let owner = AccountOwner::from_columns(None, Some(family)).unwrap();
        assert_eq!(owner, AccountOwner::Family(family));
        assert_eq!(owner.family_column(), Some(family));
    }

    #[test]
    fn both_owners_violate_xor() {
        let err = AccountOwner::from_columns(Some(Uuid::new_v4()), Some(Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOwnership(_)));
    }

    #[test]
    fn no_owner_violates_xor() {
        let err = AccountOwner::from_columns(None, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidOwnership(_)));
    }
}
