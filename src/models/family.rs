//! Family (shared tenant) data models.
//!
//! A family groups users so they can share ownership of accounts.
//! Membership carries a role: the creating user is the `owner`, everyone
//! else a `member`. Only owners manage membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Membership roles inside a family.
pub const ROLE_OWNER: &str = "owner";
pub const ROLE_MEMBER: &str = "member";

/// Represents a family record from the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Family {
    /// Unique identifier for this family
    pub id: Uuid,

    /// Display name, e.g. "The Lovelaces"
    pub name: String,

    /// User who created the family (also its first owner-member)
    pub created_by: Uuid,

    /// Timestamp when the family was created
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/families`.
#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub name: String,
}

/// Request body for `POST /api/v1/families/{id}/members`.
///
/// Members are added by email so owners never need to know internal ids.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
}

/// Response body for family endpoints.
#[derive(Debug, Serialize)]
pub struct FamilyResponse {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Family> for FamilyResponse {
    fn from(family: Family) -> Self {
        Self {
            id: family.id,
            name: family.name,
            created_by: family.created_by,
            created_at: family.created_at,
        }
    }
}

/// One row of `GET /api/v1/families/{id}/members`.
///
/// Joined with `users` so clients get emails, not bare ids.
#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}
