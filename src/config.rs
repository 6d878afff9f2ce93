//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3001
/// - `JWT_SECRET` (required): HS256 signing key for access tokens
/// - `ACCESS_TOKEN_MINUTES` (optional): access-token lifetime, defaults to 15
/// - `REFRESH_TOKEN_DAYS` (optional): refresh-token lifetime, defaults to 7
/// - `MAX_LOGIN_ATTEMPTS` (optional): consecutive failures before lockout, defaults to 5
/// - `LOCKOUT_MINUTES` (optional): lockout duration in minutes, defaults to 15
/// - `LOGIN_RATE_CAPACITY` (optional): per-IP burst allowance on auth routes, defaults to 5
/// - `LOGIN_RATE_REFILL_PER_SEC` (optional): bucket refill rate, defaults to 0.2
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub jwt_secret: String,

    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,

    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,

    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: i32,

    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: i64,

    #[serde(default = "default_login_rate_capacity")]
    pub login_rate_capacity: f64,

    #[serde(default = "default_login_rate_refill_per_sec")]
    pub login_rate_refill_per_sec: f64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3001
}

fn default_access_token_minutes() -> i64 {
    15
}

fn default_refresh_token_days() -> i64 {
    7
}

fn default_max_login_attempts() -> i32 {
    5
}

fn default_lockout_minutes() -> i64 {
    15
}

fn default_login_rate_capacity() -> f64 {
    5.0
}

fn default_login_rate_refill_per_sec() -> f64 {
    0.2
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Parse environment variables into Config struct
        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> Vec<(String, String)> {
        vec![
            (
                "DATABASE_URL".to_string(),
                "postgres://localhost/moneywise".to_string(),
            ),
            ("JWT_SECRET".to_string(), "test-secret".to_string()),
        ]
    }

    #[test]
    fn policy_defaults_match_documented_values() {
        let config: Config = envy::from_iter(base_env()).unwrap();

        assert_eq!(config.server_port, 3001);
        assert_eq!(config.access_token_minutes, 15);
        assert_eq!(config.refresh_token_days, 7);
        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.lockout_minutes, 15);
    }

    #[test]
    fn environment_overrides_are_honored() {
        let mut env = base_env();
        env.push(("SERVER_PORT".to_string(), "8080".to_string()));
        env.push(("MAX_LOGIN_ATTEMPTS".to_string(), "3".to_string()));
        let config: Config = envy::from_iter(env).unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.max_login_attempts, 3);
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let env = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/moneywise".to_string(),
        )];
        assert!(envy::from_iter::<_, Config>(env).is_err());
    }
}
