//! Authentication service - registration, login, token lifecycle, 2FA.
//!
//! This service owns the security-sensitive flows:
//! - Registration (user insert + default categories in one database transaction)
//! - Login with account lockout (5 failures -> 15-minute lock, configurable)
//! - Refresh-token rotation (single-use, hashed at rest)
//! - Password change (revokes every outstanding refresh token)
//! - TOTP enrollment and teardown
//!
//! # Lockout Semantics
//!
//! Only password failures count toward lockout. The counter resets on
//! successful login; while `locked_until` is in the future the user is
//! rejected with 423 even if the password is correct.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    config::Config,
    db::{DbPool, is_unique_violation},
    error::AppError,
    models::category::DEFAULT_CATEGORIES,
    models::refresh_token::RefreshToken,
    models::user::{
        ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse, User,
    },
    services::{password, token_service, totp},
};

/// Register a new user.
///
/// # Process
///
/// 1. Validate and hash the password (argon2id)
/// 2. Start a database transaction
/// 3. Insert the user (409 on duplicate email)
/// 4. Seed the default category set for the new user
/// 5. Commit - the user either exists fully set up or not at all
pub async fn register(pool: &DbPool, request: RegisterRequest) -> Result<User, AppError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidRequest("invalid email address".to_string()));
    }

    let password_hash = password::hash_password(&request.password)?;

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, display_name)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&request.display_name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::EmailTaken
        } else {
            AppError::Database(e)
        }
    })?;

    // Seed default categories inside the same transaction, so a failed
    // registration never leaves a half-initialized user behind.
    for (name, kind) in DEFAULT_CATEGORIES {
        sqlx::query("INSERT INTO categories (user_id, name, kind) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(name)
            .bind(kind)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Authenticate a user and issue an access/refresh token pair.
///
/// # Process
///
/// 1. Fetch the active user by email (unknown email behaves like wrong password)
/// 2. Reject while locked (423)
/// 3. Verify the password; on failure count the attempt and possibly lock
/// 4. If 2FA is enabled, require and verify a TOTP code
/// 5. Reset the failure counter and issue tokens
pub async fn login(
    pool: &DbPool,
    config: &Config,
    request: LoginRequest,
) -> Result<TokenResponse, AppError> {
    let email = request.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE email = $1 AND is_active = true",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::InvalidCredentials)?;

    // Lockout check comes before password verification so a locked
    // account leaks nothing about the password.
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::AccountLocked);
        }
    }

    if !password::verify_password(&request.password, &user.password_hash)? {
        record_failed_attempt(pool, config, user.id).await?;
        return Err(AppError::InvalidCredentials);
    }

    if user.totp_enabled {
        let code = request
            .totp_code
            .as_deref()
            .ok_or(AppError::TwoFactorRequired)?;
        verify_totp(&user, code)?;
    }

    // Clear lockout bookkeeping from any previous failures.
    if user.failed_login_attempts > 0 || user.locked_until.is_some() {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(user.id)
        .execute(pool)
        .await?;
    }

    issue_token_pair(pool, config, &user).await
}

/// Rotate a refresh token: revoke the presented one, issue a new pair.
///
/// # Security
///
/// Tokens are single-use. A token that is unknown, revoked, or expired
/// is uniformly rejected with 401; the revocation and replacement happen
/// in one database transaction so a crash cannot leave two live tokens.
pub async fn refresh(
    pool: &DbPool,
    config: &Config,
    raw_token: &str,
) -> Result<TokenResponse, AppError> {
    let token_hash = token_service::hash_refresh_token(raw_token);

    let mut tx = pool.begin().await?;

    // Lock the row so concurrent refreshes of the same token race safely:
    // one wins, the other sees revoked = true.
    let token = sqlx::query_as::<_, RefreshToken>(
        r#"
        SELECT * FROM refresh_tokens
        WHERE token_hash = $1 AND revoked = false AND expires_at > NOW()
        FOR UPDATE
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::InvalidToken)?;

    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND is_active = true",
    )
    .bind(token.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::InvalidToken)?;

    sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE id = $1")
        .bind(token.id)
        .execute(&mut *tx)
        .await?;

    let (raw, hash) = token_service::generate_refresh_token();
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user.id)
    .bind(&hash)
    .bind(Utc::now() + Duration::days(config.refresh_token_days))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let access_token = token_service::issue_access_token(config, &user)?;
    Ok(TokenResponse {
        access_token,
        refresh_token: raw,
        token_type: "Bearer",
        expires_in: config.access_token_minutes * 60,
    })
}

/// Revoke the presented refresh token (logout).
///
/// Idempotent: revoking an unknown or already-revoked token succeeds,
/// so clients can always clear their session.
pub async fn logout(pool: &DbPool, user_id: Uuid, raw_token: &str) -> Result<(), AppError> {
    let token_hash = token_service::hash_refresh_token(raw_token);
    sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE token_hash = $1 AND user_id = $2")
        .bind(&token_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Change the user's password and revoke all refresh tokens.
pub async fn change_password(
    pool: &DbPool,
    user_id: Uuid,
    request: ChangePasswordRequest,
) -> Result<(), AppError> {
    let user = fetch_user(pool, user_id).await?;

    if !password::verify_password(&request.current_password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = password::hash_password(&request.new_password)?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&new_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    // Every existing session dies with the old password.
    sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, "password changed, sessions revoked");
    Ok(())
}

/// Begin TOTP enrollment: generate and store a secret, not yet enabled.
///
/// Returns the hex secret for the client to load into an authenticator.
/// Calling setup again before enabling replaces the pending secret.
pub async fn totp_setup(pool: &DbPool, user_id: Uuid) -> Result<String, AppError> {
    let user = fetch_user(pool, user_id).await?;
    if user.totp_enabled {
        return Err(AppError::Conflict("two-factor auth is already enabled".to_string()));
    }

    let secret = totp::generate_secret();
    sqlx::query("UPDATE users SET totp_secret = $1, updated_at = NOW() WHERE id = $2")
        .bind(&secret)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(secret)
}

/// Complete TOTP enrollment by proving possession of the secret.
pub async fn totp_enable(pool: &DbPool, user_id: Uuid, code: &str) -> Result<(), AppError> {
    let user = fetch_user(pool, user_id).await?;
    if user.totp_enabled {
        return Err(AppError::Conflict("two-factor auth is already enabled".to_string()));
    }
    if user.totp_secret.is_none() {
        return Err(AppError::InvalidRequest(
            "two-factor setup has not been started".to_string(),
        ));
    }

    verify_totp(&user, code)?;

    sqlx::query("UPDATE users SET totp_enabled = true, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    tracing::info!(user_id = %user_id, "two-factor auth enabled");
    Ok(())
}

/// Disable TOTP. Requires a current valid code.
pub async fn totp_disable(pool: &DbPool, user_id: Uuid, code: &str) -> Result<(), AppError> {
    let user = fetch_user(pool, user_id).await?;
    if !user.totp_enabled {
        return Err(AppError::InvalidRequest(
            "two-factor auth is not enabled".to_string(),
        ));
    }

    verify_totp(&user, code)?;

    sqlx::query(
        "UPDATE users SET totp_enabled = false, totp_secret = NULL, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    tracing::info!(user_id = %user_id, "two-factor auth disabled");
    Ok(())
}

/// Store a refresh token and sign an access token for `user`.
async fn issue_token_pair(
    pool: &DbPool,
    config: &Config,
    user: &User,
) -> Result<TokenResponse, AppError> {
    let (raw, hash) = token_service::generate_refresh_token();

    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user.id)
    .bind(&hash)
    .bind(Utc::now() + Duration::days(config.refresh_token_days))
    .execute(pool)
    .await?;

    let access_token = token_service::issue_access_token(config, user)?;
    Ok(TokenResponse {
        access_token,
        refresh_token: raw,
        token_type: "Bearer",
        expires_in: config.access_token_minutes * 60,
    })
}

/// Count one failed password attempt; lock the account when the
/// configured threshold is reached.
async fn record_failed_attempt(
    pool: &DbPool,
    config: &Config,
    user_id: Uuid,
) -> Result<(), AppError> {
    let locked: Option<bool> = sqlx::query_scalar(
        r#"
        UPDATE users
        SET failed_login_attempts = failed_login_attempts + 1,
            locked_until = CASE
                WHEN failed_login_attempts + 1 >= $2
                THEN NOW() + ($3::bigint * INTERVAL '1 minute')
                ELSE locked_until
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING locked_until IS NOT NULL AND locked_until > NOW()
        "#,
    )
    .bind(user_id)
    .bind(config.max_login_attempts)
    .bind(config.lockout_minutes)
    .fetch_optional(pool)
    .await?;

    if locked == Some(true) {
        tracing::warn!(user_id = %user_id, "account locked after repeated failed logins");
    }
    Ok(())
}

/// Check a TOTP code against the user's stored secret.
fn verify_totp(user: &User, code: &str) -> Result<(), AppError> {
    let secret_hex = user.totp_secret.as_deref().ok_or(AppError::TwoFactorInvalid)?;
    let secret = hex::decode(secret_hex)
        .map_err(|_| AppError::Internal("stored TOTP secret is not valid hex".to_string()))?;

    let now = Utc::now().timestamp() as u64;
    if totp::verify_code(&secret, code, now) {
        Ok(())
    } else {
        Err(AppError::TwoFactorInvalid)
    }
}

async fn fetch_user(pool: &DbPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = true")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with(totp_enabled: bool, secret: Option<String>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            display_name: None,
            totp_secret: secret,
            totp_enabled,
            failed_login_attempts: 0,
            locked_until: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn totp_verification_accepts_current_code() {
        let secret_hex = totp::generate_secret();
        let secret = hex::decode(&secret_hex).unwrap();
        let code = totp::generate_code(&secret, Utc::now().timestamp() as u64);

        let user = user_with(true, Some(secret_hex));
        assert!(verify_totp(&user, &code).is_ok());
    }

    #[test]
    fn totp_verification_rejects_malformed_code() {
        let user = user_with(true, Some(totp::generate_secret()));
        assert!(matches!(
            verify_totp(&user, "12345"),
            Err(AppError::TwoFactorInvalid)
        ));
    }

    #[test]
    fn totp_verification_without_secret_fails_closed() {
        let user = user_with(true, None);
        assert!(verify_totp(&user, "123456").is_err());
    }
}
