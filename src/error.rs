//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Bad credentials, expired/invalid tokens, lockout, 2FA
/// - **Authorization Errors**: Valid user acting outside their tenant
/// - **Resource Errors**: Requested resources not found (or owned by someone else)
/// - **Business Logic Errors**: Operations that violate business rules
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email/password combination did not match a user.
    ///
    /// Returns HTTP 401 Unauthorized. Deliberately identical for
    /// unknown email and wrong password so emails cannot be probed.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Access or refresh token is missing, malformed, expired, or revoked.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// User has 2FA enabled but the login request carried no TOTP code.
    ///
    /// Returns HTTP 401 Unauthorized with a distinct code so clients
    /// can prompt for the second factor.
    #[error("Two-factor code required")]
    TwoFactorRequired,

    /// The supplied TOTP code did not verify.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid two-factor code")]
    TwoFactorInvalid,

    /// Account is temporarily locked after too many failed logins.
    ///
    /// Returns HTTP 423 Locked.
    #[error("Account locked due to repeated failed logins")]
    AccountLocked,

    /// Per-IP rate limit on authentication endpoints exceeded.
    ///
    /// Returns HTTP 429 Too Many Requests.
    #[error("Too many requests")]
    TooManyRequests,

    /// Registration attempted with an email that already has a user.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Email already registered")]
    EmailTaken,

    /// Authenticated user is not allowed to perform this operation
    /// (e.g., non-owner managing family members).
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Forbidden")]
    Forbidden,

    /// Requested user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Requested account does not exist or isn't visible to the authenticated user.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Account not found")]
    AccountNotFound,

    /// Requested transaction does not exist or isn't visible to the authenticated user.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// Requested family does not exist or the user isn't a member.
    #[error("Family not found")]
    FamilyNotFound,

    /// Requested category does not exist or belongs to another user.
    #[error("Category not found")]
    CategoryNotFound,

    /// Requested budget does not exist or belongs to another user.
    #[error("Budget not found")]
    BudgetNotFound,

    /// Account has insufficient balance for the requested operation.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Account ownership violates the XOR rule (exactly one of user/family),
    /// or an ownership change the caller may not make.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Invalid account ownership: {0}")]
    InvalidOwnership(String),

    /// Operation conflicts with existing state (e.g., duplicate budget month,
    /// deleting a category still referenced by budgets).
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Internal failure that must not leak details to clients
    /// (password hashing, token signing).
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error code used in the JSON envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::TwoFactorRequired => "two_factor_required",
            AppError::TwoFactorInvalid => "invalid_two_factor_code",
            AppError::AccountLocked => "account_locked",
            AppError::TooManyRequests => "too_many_requests",
            AppError::EmailTaken => "email_taken",
            AppError::Forbidden => "forbidden",
            AppError::UserNotFound => "user_not_found",
            AppError::AccountNotFound => "account_not_found",
            AppError::TransactionNotFound => "transaction_not_found",
            AppError::FamilyNotFound => "family_not_found",
            AppError::CategoryNotFound => "category_not_found",
            AppError::BudgetNotFound => "budget_not_found",
            AppError::InsufficientBalance => "insufficient_balance",
            AppError::InvalidOwnership(_) => "invalid_ownership",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// HTTP status code this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::TwoFactorRequired
            | AppError::TwoFactorInvalid => StatusCode::UNAUTHORIZED,
            AppError::AccountLocked => StatusCode::LOCKED,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::EmailTaken | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::AccountNotFound
            | AppError::TransactionNotFound
            | AppError::FamilyNotFound
            | AppError::CategoryNotFound
            | AppError::BudgetNotFound => StatusCode::NOT_FOUND,
            AppError::InsufficientBalance | AppError::InvalidOwnership(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database and internal errors are logged server-side and replaced
/// with a generic message so internals never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(err) => {
                tracing::error!("database error: {err}");
                "An internal error occurred".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                "An internal error occurred".to_string()
            }
            AppError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccountLocked.status(), StatusCode::LOCKED);
        assert_eq!(
            AppError::TooManyRequests.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AppError::EmailTaken.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::AccountNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InsufficientBalance.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::InvalidOwnership("both set".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::InvalidRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_errors_share_a_generic_code() {
        assert_eq!(AppError::Internal("argon2 failure".into()).code(), "internal_error");
        assert_eq!(AppError::Database(sqlx::Error::PoolClosed).code(), "internal_error");
    }

    #[test]
    fn two_factor_codes_are_distinct() {
        assert_eq!(AppError::TwoFactorRequired.code(), "two_factor_required");
        assert_eq!(AppError::TwoFactorInvalid.code(), "invalid_two_factor_code");
    }
}
