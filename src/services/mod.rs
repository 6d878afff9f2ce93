//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and complex operations.

pub mod account_service;
pub mod auth_service;
pub mod budget_service;
pub mod family_service;
pub mod password;
pub mod token_service;
pub mod totp;
pub mod transaction_service;
