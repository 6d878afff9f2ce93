//! Transaction service - Core business logic for balance mutations.
//!
//! This service handles:
//! - Atomic balance updates
//! - Idempotency checking
//! - Balance validation
//! - Database transaction management
//!
//! # Atomicity Guarantees
//!
//! All balance updates happen within PostgreSQL transactions.
//! The database ensures all-or-nothing execution.
//!
//! # Idempotency
//!
//! A known `idempotency_key` short-circuits before any balance change.
//! Two concurrent requests can both miss that check; the unique index on
//! the key then fails the loser's insert, which rolls back and returns
//! the winner's row instead.

use uuid::Uuid;

use crate::{
    db::{DbPool, is_unique_violation},
    error::AppError,
    models::transaction::Transaction,
};

/// Row-to-be for the `transactions` table.
///
/// The currency always comes from the (source) account so a ledger entry
/// can never disagree with the account it moved money on.
struct NewTransaction {
    transaction_type: &'static str,
    from_account_id: Option<Uuid>,
    to_account_id: Option<Uuid>,
    amount_cents: i64,
    currency: String,
    category_id: Option<Uuid>,
    description: Option<String>,
    idempotency_key: Option<String>,
}

impl NewTransaction {
    fn income(
        account_id: Uuid,
        amount_cents: i64,
        currency: String,
        category_id: Option<Uuid>,
        description: Option<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            transaction_type: "income",
            from_account_id: None,
            to_account_id: Some(account_id),
            amount_cents,
            currency,
            category_id,
            description,
            idempotency_key,
        }
    }

    fn expense(
        account_id: Uuid,
        amount_cents: i64,
        currency: String,
        category_id: Option<Uuid>,
        description: Option<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            transaction_type: "expense",
            from_account_id: Some(account_id),
            to_account_id: None,
            amount_cents,
            currency,
            category_id,
            description,
            idempotency_key,
        }
    }

    fn transfer(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_cents: i64,
        currency: String,
        description: Option<String>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            transaction_type: "transfer",
            from_account_id: Some(from_account_id),
            to_account_id: Some(to_account_id),
            amount_cents,
            currency,
            category_id: None,
            description,
            idempotency_key,
        }
    }
}

/// Record income (add money to an account).
///
/// # Process
///
/// 1. Check for duplicate idempotency key
/// 2. Start database transaction
/// 3. Update the account balance
/// 4. Record the transaction with its optional category
/// 5. Commit (or rollback on error)
///
/// # Errors
///
/// - `AccountNotFound`: Account doesn't exist
/// - `InvalidRequest`: Amount is zero or negative
/// - `Database`: Database error occurred
pub async fn record_income(
    pool: &DbPool,
    account_id: Uuid,
    amount_cents: i64,
    category_id: Option<Uuid>,
    description: Option<String>,
    idempotency_key: Option<String>,
) -> Result<Transaction, AppError> {
    validate_amount(amount_cents)?;

    if let Some(existing) = find_by_idempotency_key(pool, idempotency_key.as_deref()).await? {
        return Ok(existing);
    }

    let mut tx = pool.begin().await?;

    let Some(currency) = sqlx::query_scalar::<_, String>(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents + $1,
            updated_at = NOW()
        WHERE id = $2
        RETURNING currency
        "#,
    )
    .bind(amount_cents)
    .bind(account_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        tx.rollback().await?;
        return Err(AppError::AccountNotFound);
    };

    let row = NewTransaction::income(
        account_id,
        amount_cents,
        currency,
        category_id,
        description,
        idempotency_key,
    );
    commit_transaction(pool, tx, row).await
}

/// Record an expense (remove money from an account).
///
/// Locks the account row (`FOR UPDATE`), checks the balance, and rejects
/// with `InsufficientBalance` when the expense would overdraw it.
pub async fn record_expense(
    pool: &DbPool,
    account_id: Uuid,
    amount_cents: i64,
    category_id: Option<Uuid>,
    description: Option<String>,
    idempotency_key: Option<String>,
) -> Result<Transaction, AppError> {
    validate_amount(amount_cents)?;

    if let Some(existing) = find_by_idempotency_key(pool, idempotency_key.as_deref()).await? {
        return Ok(existing);
    }

    let mut tx = pool.begin().await?;

    // Lock account and check balance
    let Some((balance_cents, currency)) = sqlx::query_as::<_, (i64, String)>(
        "SELECT balance_cents, currency FROM accounts WHERE id = $1 FOR UPDATE",
    )
    .bind(account_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        tx.rollback().await?;
        return Err(AppError::AccountNotFound);
    };

    if balance_cents < amount_cents {
        tx.rollback().await?;
        return Err(AppError::InsufficientBalance);
    }

    sqlx::query(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents - $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(amount_cents)
    .bind(account_id)
    .execute(&mut *tx)
    .await?;

    let row = NewTransaction::expense(
        account_id,
        amount_cents,
        currency,
        category_id,
        description,
        idempotency_key,
    );
    commit_transaction(pool, tx, row).await
}

/// Transfer money between two accounts.
///
/// Both balance updates and the transaction record commit atomically.
/// `FOR UPDATE` on the source row prevents concurrent overdraws.
pub async fn record_transfer(
    pool: &DbPool,
    from_account_id: Uuid,
    to_account_id: Uuid,
    amount_cents: i64,
    description: Option<String>,
    idempotency_key: Option<String>,
) -> Result<Transaction, AppError> {
    validate_amount(amount_cents)?;

    if from_account_id == to_account_id {
        return Err(AppError::InvalidRequest(
            "Cannot transfer to same account".to_string(),
        ));
    }

    if let Some(existing) = find_by_idempotency_key(pool, idempotency_key.as_deref()).await? {
        return Ok(existing);
    }

    let mut tx = pool.begin().await?;

    // Lock source account and check balance
    let Some((from_balance, currency)) = sqlx::query_as::<_, (i64, String)>(
        "SELECT balance_cents, currency FROM accounts WHERE id = $1 FOR UPDATE",
    )
    .bind(from_account_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        tx.rollback().await?;
        return Err(AppError::AccountNotFound);
    };

    if from_balance < amount_cents {
        tx.rollback().await?;
        return Err(AppError::InsufficientBalance);
    }

    // Lock destination account
    let to_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1 FOR UPDATE)")
            .bind(to_account_id)
            .fetch_one(&mut *tx)
            .await?;

    if !to_exists {
        tx.rollback().await?;
        return Err(AppError::AccountNotFound);
    }

    sqlx::query(
        "UPDATE accounts SET balance_cents = balance_cents - $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(amount_cents)
    .bind(from_account_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE accounts SET balance_cents = balance_cents + $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(amount_cents)
    .bind(to_account_id)
    .execute(&mut *tx)
    .await?;

    let row = NewTransaction::transfer(
        from_account_id,
        to_account_id,
        amount_cents,
        currency,
        description,
        idempotency_key,
    );
    commit_transaction(pool, tx, row).await
}

/// Get transaction by ID.
pub async fn get_transaction_by_id(
    pool: &DbPool,
    transaction_id: Uuid,
) -> Result<Option<Transaction>, AppError> {
    let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(transaction_id)
        .fetch_optional(pool)
        .await?;

    Ok(transaction)
}

/// List transactions touching an account, newest first.
pub async fn list_account_transactions(
    pool: &DbPool,
    account_id: Uuid,
    category_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<Transaction>, AppError> {
    let transactions = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT * FROM transactions
        WHERE (from_account_id = $1 OR to_account_id = $1)
          AND ($2::uuid IS NULL OR category_id = $2)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(account_id)
    .bind(category_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

fn validate_amount(amount_cents: i64) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Insert the ledger row and commit, resolving idempotency-key races.
///
/// When the insert hits the unique index on `idempotency_key`, a
/// concurrent request with the same key committed first. The balance
/// changes roll back and the winner's row is returned as if this were
/// a plain replay.
async fn commit_transaction(
    pool: &DbPool,
    mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
    row: NewTransaction,
) -> Result<Transaction, AppError> {
    let inserted = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            transaction_type,
            from_account_id,
            to_account_id,
            amount_cents,
            currency,
            category_id,
            description,
            idempotency_key,
            status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed')
        RETURNING *
        "#,
    )
    .bind(row.transaction_type)
    .bind(row.from_account_id)
    .bind(row.to_account_id)
    .bind(row.amount_cents)
    .bind(&row.currency)
    .bind(row.category_id)
    .bind(&row.description)
    .bind(&row.idempotency_key)
    .fetch_one(&mut *tx)
    .await;

    let transaction = match inserted {
        Ok(transaction) => transaction,
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await?;
            return find_by_idempotency_key(pool, row.idempotency_key.as_deref())
                .await?
                .ok_or_else(|| {
                    AppError::Conflict("duplicate idempotency key".to_string())
                });
        }
        Err(e) => return Err(e.into()),
    };

    tx.commit().await?;

    Ok(transaction)
}

/// Replaying an idempotency key returns the original transaction.
async fn find_by_idempotency_key(
    pool: &DbPool,
    key: Option<&str>,
) -> Result<Option<Transaction>, AppError> {
    let Some(key) = key else {
        return Ok(None);
    };

    let existing =
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_amounts_are_rejected() {
        assert!(matches!(
            validate_amount(0),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_amount(-500),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(validate_amount(1).is_ok());
    }

    #[test]
    fn ledger_rows_carry_the_account_currency() {
        let account = Uuid::new_v4();

        let income = NewTransaction::income(account, 100, "EUR".to_string(), None, None, None);
        assert_eq!(income.currency, "EUR");
        assert_eq!(income.to_account_id, Some(account));
        assert_eq!(income.from_account_id, None);

        let expense = NewTransaction::expense(account, 100, "EUR".to_string(), None, None, None);
        assert_eq!(expense.currency, "EUR");
        assert_eq!(expense.from_account_id, Some(account));
        assert_eq!(expense.to_account_id, None);
    }

    #[test]
    fn transfers_are_stamped_with_the_source_currency() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();

        let transfer =
            NewTransaction::transfer(from, to, 100, "GBP".to_string(), None, None);
        assert_eq!(transfer.currency, "GBP");
        assert_eq!(transfer.from_account_id, Some(from));
        assert_eq!(transfer.to_account_id, Some(to));
        assert_eq!(transfer.category_id, None);
    }
}
