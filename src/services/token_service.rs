//! Access- and refresh-token issuance.
//!
//! Access tokens are short-lived HS256 JWTs carrying the user id and
//! email. Refresh tokens are opaque 32-byte random values; only their
//! SHA-256 hash is persisted, mirroring how the rest of the codebase
//! stores secrets.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{config::Config, error::AppError, models::user::User};

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id (UUID as string, per JWT convention)
    pub sub: String,

    /// User email at issuance time
    pub email: String,

    /// Issued-at (unix seconds)
    pub iat: i64,

    /// Expiry (unix seconds); 15 minutes after `iat` by default
    pub exp: i64,
}

/// Sign a new access token for `user`.
pub fn issue_access_token(config: &Config, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::minutes(config.access_token_minutes)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// Verify an access token's signature and expiry, returning its claims.
///
/// Any decode failure (bad signature, malformed, expired) maps to
/// `AppError::InvalidToken`; clients only ever learn "invalid or expired".
pub fn decode_access_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

/// Generate a fresh opaque refresh token.
///
/// Returns `(raw, hash)`: the raw 64-hex-char value goes to the client,
/// the SHA-256 hash (hex) goes to the database.
pub fn generate_refresh_token() -> (String, String) {
    let bytes: [u8; 32] = rand::random();
    let raw = hex::encode(bytes);
    let hash = hash_refresh_token(&raw);
    (raw, hash)
}

/// Hash a raw refresh token the way it is stored in `refresh_tokens.token_hash`.
pub fn hash_refresh_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> Config {
        envy::from_iter(vec![
            (
                "DATABASE_URL".to_string(),
                "postgres://localhost/moneywise".to_string(),
            ),
            ("JWT_SECRET".to_string(), "unit-test-secret".to_string()),
        ])
        .unwrap()
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
            display_name: None,
            totp_secret: None,
            totp_enabled: false,
            failed_login_attempts: 0,
            locked_until: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips() {
        let config = test_config();
        let user = test_user();

        let token = issue_access_token(&config, &user).unwrap();
        let claims = decode_access_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        // 15-minute default lifetime
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_access_token(&config, &test_user()).unwrap();

        let mut other = test_config();
        other.jwt_secret = "a different secret".to_string();
        assert!(matches!(
            decode_access_token(&other, &token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = test_config();
        assert!(matches!(
            decode_access_token(&config, "not.a.jwt"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_tokens_are_unique_and_hash_consistently() {
        let (raw_a, hash_a) = generate_refresh_token();
        let (raw_b, hash_b) = generate_refresh_token();

        assert_eq!(raw_a.len(), 64);
        assert_ne!(raw_a, raw_b);
        assert_ne!(hash_a, hash_b);
        assert_eq!(hash_refresh_token(&raw_a), hash_a);
        assert_eq!(hash_refresh_token(&raw_b), hash_b);
    }
}
