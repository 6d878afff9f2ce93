//! User data models and authentication request/response types.
//!
//! This module defines:
//! - `User`: Database entity representing a user
//! - Request types for registration, login, and profile/credential updates
//! - `UserResponse`: Response body returned to clients (no secrets)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. Besides identity, the row carries the
/// lockout counters and the optional TOTP secret, so everything the
/// login path needs comes from a single fetch.
///
/// # Secrets
///
/// `password_hash` is an argon2id PHC string, `totp_secret` is hex-encoded.
/// Neither ever leaves the server; `UserResponse` strips them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for this user
    pub id: Uuid,

    /// Login email, unique across all users
    pub email: String,

    /// Argon2id hash of the password (PHC string format)
    pub password_hash: String,

    /// Optional display name shown in the UI
    pub display_name: Option<String>,

    /// Hex-encoded TOTP secret, present once 2FA setup has started
    pub totp_secret: Option<String>,

    /// Whether the user has completed 2FA enrollment
    pub totp_enabled: bool,

    /// Consecutive failed login attempts since the last success
    pub failed_login_attempts: i32,

    /// If set and in the future, logins are rejected until this instant
    pub locked_until: Option<DateTime<Utc>>,

    /// Whether this user may authenticate at all
    ///
    /// Deactivated users keep their records but every token check fails.
    pub is_active: bool,

    /// Timestamp when the user registered
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last profile or credential change
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/auth/register`.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "ada@example.com",
///   "password": "correct horse battery staple",
///   "display_name": "Ada"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,

    /// Plaintext password; hashed with argon2id before it touches the database
    pub password: String,

    pub display_name: Option<String>,
}

/// Request body for `POST /api/v1/auth/login`.
///
/// `totp_code` is required only when the user has 2FA enabled.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub totp_code: Option<String>,
}

/// Request body for `POST /api/v1/auth/refresh` and `POST /api/v1/auth/logout`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /api/v1/auth/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for `POST /api/v1/auth/2fa/enable` and `/2fa/disable`.
#[derive(Debug, Deserialize)]
pub struct TotpCodeRequest {
    pub code: String,
}

/// Request body for `PATCH /api/v1/users/me`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
}

/// Token pair returned by login and refresh.
///
/// # JSON Example
///
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiJ9...",
///   "refresh_token": "9f2c...64 hex chars...",
///   "token_type": "Bearer",
///   "expires_in": 900
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,

    /// Access-token lifetime in seconds
    pub expires_in: i64,
}

/// Response body for user endpoints. Never contains secrets.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Convert database User to API UserResponse.
///
/// This transformation removes `password_hash`, `totp_secret`, and the
/// lockout bookkeeping fields.
impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            totp_enabled: user.totp_enabled,
            created_at: user.created_at,
        }
    }
}
