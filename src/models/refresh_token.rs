//! Refresh-token persistence model.
//!
//! Refresh tokens are opaque 32-byte random values handed to clients in
//! hex. The database stores only their SHA-256 hash, so a leaked table
//! cannot be replayed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a refresh-token record from the database.
///
/// Tokens are single-use: `POST /auth/refresh` revokes the presented
/// token and issues a replacement (rotation).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    /// Unique identifier for this token record
    pub id: Uuid,

    /// User this token authenticates
    pub user_id: Uuid,

    /// SHA-256 hash (hex) of the opaque token value
    pub token_hash: String,

    /// Hard expiry; expired tokens are rejected even if not revoked
    pub expires_at: DateTime<Utc>,

    /// Set on rotation, logout, or password change
    pub revoked: bool,

    /// Timestamp when this token was issued
    pub created_at: DateTime<Utc>,
}
