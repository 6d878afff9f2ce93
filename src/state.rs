//! Shared application state handed to every handler via Axum's `State` extractor.

use std::sync::Arc;

use crate::{config::Config, db::DbPool, middleware::rate_limit::RateLimiter};

/// Everything a request handler needs: database pool, configuration,
/// and the in-process rate limiter guarding the auth endpoints.
///
/// Cloning is cheap: the pool is internally reference-counted and the
/// rest sits behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let login_limiter = Arc::new(RateLimiter::new(
            config.login_rate_capacity,
            config.login_rate_refill_per_sec,
        ));
        Self {
            pool,
            config: Arc::new(config),
            login_limiter,
        }
    }
}
