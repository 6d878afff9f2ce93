//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (database queries, validation)
//! 3. Returns HTTP response (JSON, status code)

/// Registration, login, token lifecycle, and 2FA endpoints
pub mod auth;
/// Financial account endpoints
pub mod accounts;
/// Budget endpoints
pub mod budgets;
/// Category endpoints
pub mod categories;
/// Family and membership endpoints
pub mod families;
/// Health check endpoint
pub mod health;
/// Transaction endpoints
pub mod transactions;
/// Current-user profile endpoints
pub mod users;
