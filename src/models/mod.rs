//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types for the API surface.

/// User accounts and authentication types
pub mod user;
/// Refresh-token persistence model
pub mod refresh_token;
/// Families (shared tenants) and memberships
pub mod family;
/// Financial account model (XOR ownership)
pub mod account;
/// Transaction model and income/expense/transfer requests
pub mod transaction;
/// Per-user transaction categories
pub mod category;
/// Monthly per-category budgets
pub mod budget;
