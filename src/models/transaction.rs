//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `Transaction`: Database entity representing a transaction
//! - Request types for income, expense, and transfer operations
//! - `TransactionResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a transaction record from the database.
///
/// # Database Table
///
/// Maps to the `transactions` table. Each transaction:
/// - Has a unique ID and optional idempotency key
/// - References one or two accounts (depending on type)
/// - Optionally references a category (for budgets and reporting)
/// - Stores amount in cents (never floats!)
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaction {
    /// Unique identifier for this transaction
    pub id: Uuid,

    /// Optional idempotency key for preventing duplicates
    ///
    /// If a client sends the same idempotency_key twice, the second request
    /// returns the original transaction instead of creating a duplicate.
    pub idempotency_key: Option<String>,

    /// Type of transaction (income, expense, or transfer)
    pub transaction_type: String,

    /// Source account (for expense and transfer)
    ///
    /// NULL for income transactions
    pub from_account_id: Option<Uuid>,

    /// Destination account (for income and transfer)
    ///
    /// NULL for expense transactions
    pub to_account_id: Option<Uuid>,

    /// Amount in cents
    ///
    /// Must be positive (enforced by CHECK constraint)
    pub amount_cents: i64,

    /// Currency code (ISO 4217)
    pub currency: String,

    /// Category for budget tracking (expense/income only)
    pub category_id: Option<Uuid>,

    /// Human-readable description
    pub description: Option<String>,

    /// Transaction status
    ///
    /// - "completed": Successfully applied
    /// - "failed": Rejected (e.g., insufficient funds)
    pub status: String,

    /// When transaction was created
    pub created_at: DateTime<Utc>,
}

/// Request to record income (add money to an account).
///
/// # JSON Example
///
/// ```json
/// {
///   "account_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount_cents": 250000,
///   "category_id": "880e8400-e29b-41d4-a716-446655440003",
///   "description": "August salary",
///   "idempotency_key": "salary-2026-08"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct IncomeRequest {
    /// Account to credit
    pub account_id: Uuid,

    /// Amount to add in cents
    pub amount_cents: i64,

    /// Optional category
    pub category_id: Option<Uuid>,

    /// Optional description
    pub description: Option<String>,

    /// Optional idempotency key to prevent duplicates
    pub idempotency_key: Option<String>,
}

/// Request to record an expense (remove money from an account).
///
/// # Validation
///
/// - Account must have sufficient balance
/// - Amount must be positive
/// - Account must be visible to the authenticated user
#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    /// Account to debit
    pub account_id: Uuid,

    /// Amount to remove in cents
    pub amount_cents: i64,

    /// Optional category
    pub category_id: Option<Uuid>,

    /// Optional description
    pub description: Option<String>,

    /// Optional idempotency key to prevent duplicates
    pub idempotency_key: Option<String>,
}

/// Request to transfer money between two accounts.
///
/// # Atomicity Guarantee
///
/// BOTH accounts are updated in the same database transaction.
/// If the debit fails, the credit doesn't happen and vice versa.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Account to transfer from (will decrease)
    pub from_account_id: Uuid,

    /// Account to transfer to (will increase)
    pub to_account_id: Uuid,

    /// Amount to transfer in cents
    pub amount_cents: i64,

    /// Optional description
    pub description: Option<String>,

    /// Optional idempotency key to prevent duplicates
    pub idempotency_key: Option<String>,
}

/// Query parameters for `GET /api/v1/accounts/{id}/transactions`.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum rows to return (default 50, capped at 200)
    pub limit: Option<i64>,

    /// Restrict to a single category
    pub category_id: Option<Uuid>,
}

/// Response returned for transaction operations.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub transaction_type: String,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub amount_cents: i64,
    pub currency: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Convert database Transaction to API TransactionResponse.
///
/// This removes internal fields like the idempotency key that clients
/// don't need to see.
impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            transaction_type: transaction.transaction_type,
            from_account_id: transaction.from_account_id,
            to_account_id: transaction.to_account_id,
            amount_cents: transaction.amount_cents,
            currency: transaction.currency,
            category_id: transaction.category_id,
            description: transaction.description,
            status: transaction.status,
            created_at: transaction.created_at,
        }
    }
}
