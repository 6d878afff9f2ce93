//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Throttle abusive clients
//! - Modify request/response
//! - Short-circuit requests (reject unauthorized)

/// JWT bearer-token authentication middleware
pub mod auth;

/// Per-IP token-bucket rate limiting for the auth endpoints
pub mod rate_limit;
