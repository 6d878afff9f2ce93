//! Account service - ownership rules and account lifecycle.
//!
//! The central invariant here is XOR ownership: every account belongs to
//! exactly one of a user or a family. The database columns are both
//! nullable; [`AccountOwner`] is the application-level gate every write
//! path goes through.

use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::account::{Account, AccountOwner, CreateAccountRequest},
    models::family::ROLE_OWNER,
};

/// Create a new account for the authenticated user.
///
/// # Ownership
///
/// - No `family_id` in the request: personal account, owned by the caller.
/// - `family_id` present: family account; the caller must be a member of
///   that family (404 otherwise, so foreign family ids are not probeable).
///
/// Both shapes pass through [`AccountOwner::from_columns`], keeping the
/// XOR rule in one place.
pub async fn create_account(
    pool: &DbPool,
    user_id: Uuid,
    request: CreateAccountRequest,
) -> Result<Account, AppError> {
    if request.account_name.trim().is_empty() {
        return Err(AppError::InvalidRequest("account_name must not be empty".to_string()));
    }
    if request.initial_balance_cents < 0 {
        return Err(AppError::InvalidRequest(
            "initial_balance_cents must not be negative".to_string(),
        ));
    }

    let owner = match request.family_id {
        Some(family_id) => {
            require_membership(pool, family_id, user_id).await?;
            AccountOwner::from_columns(None, Some(family_id))?
        }
        None => AccountOwner::from_columns(Some(user_id), None)?,
    };

    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (owner_user_id, family_id, account_name, currency, balance_cents)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(owner.user_column())
    .bind(owner.family_column())
    .bind(request.account_name.trim())
    .bind(&request.currency)
    .bind(request.initial_balance_cents)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// List every account visible to the user: their personal accounts plus
/// all accounts of families they belong to, newest first.
pub async fn list_accounts(pool: &DbPool, user_id: Uuid) -> Result<Vec<Account>, AppError> {
    let accounts = sqlx::query_as::<_, Account>(
        r#"
        SELECT a.* FROM accounts a
        LEFT JOIN family_members fm ON fm.family_id = a.family_id AND fm.user_id = $1
        WHERE a.owner_user_id = $1 OR fm.user_id IS NOT NULL
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(accounts)
}

/// Fetch one account, requiring visibility.
///
/// Unknown ids and other tenants' accounts are indistinguishable (404),
/// which prevents account enumeration.
pub async fn get_visible_account(
    pool: &DbPool,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<Account, AppError> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT a.* FROM accounts a
        LEFT JOIN family_members fm ON fm.family_id = a.family_id AND fm.user_id = $2
        WHERE a.id = $1 AND (a.owner_user_id = $2 OR fm.user_id IS NOT NULL)
        "#,
    )
    .bind(account_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::AccountNotFound)
}

/// Rename an account. Same visibility rule as reads.
pub async fn rename_account(
    pool: &DbPool,
    user_id: Uuid,
    account_id: Uuid,
    new_name: &str,
) -> Result<Account, AppError> {
    if new_name.trim().is_empty() {
        return Err(AppError::InvalidRequest("account_name must not be empty".to_string()));
    }

    // Visibility check first; the UPDATE itself is by primary key.
    let account = get_visible_account(pool, user_id, account_id).await?;

    let account = sqlx::query_as::<_, Account>(
        "UPDATE accounts SET account_name = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(new_name.trim())
    .bind(account.id)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// Delete an account.
///
/// # Rules
///
/// - Personal accounts: only the owning user.
/// - Family accounts: only a member with the `owner` role.
/// - The balance must be zero; money cannot silently disappear.
pub async fn delete_account(
    pool: &DbPool,
    user_id: Uuid,
    account_id: Uuid,
) -> Result<(), AppError> {
    let account = get_visible_account(pool, user_id, account_id).await?;

    match AccountOwner::from_columns(account.owner_user_id, account.family_id)? {
        AccountOwner::User(owner) => {
            if owner != user_id {
                return Err(AppError::Forbidden);
            }
        }
        AccountOwner::Family(family_id) => {
            let role: Option<String> = sqlx::query_scalar(
                "SELECT role FROM family_members WHERE family_id = $1 AND user_id = $2",
            )
            .bind(family_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
            if role.as_deref() != Some(ROLE_OWNER) {
                return Err(AppError::Forbidden);
            }
        }
    }

    if account.balance_cents != 0 {
        return Err(AppError::Conflict(
            "account balance must be zero before deletion".to_string(),
        ));
    }

    sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(account.id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Require that `user_id` is a member of `family_id`.
async fn require_membership(
    pool: &DbPool,
    family_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let is_member: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM family_members WHERE family_id = $1 AND user_id = $2)",
    )
    .bind(family_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if is_member {
        Ok(())
    } else {
        Err(AppError::FamilyNotFound)
    }
}
