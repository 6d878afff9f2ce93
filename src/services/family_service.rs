//! Family service - shared-tenant creation and membership management.
//!
//! The creating user becomes the family's first member with the `owner`
//! role; only owners may add or remove members. Family creation inserts
//! the family and the owner membership in one database transaction.

use uuid::Uuid;

use crate::{
    db::{DbPool, is_unique_violation},
    error::AppError,
    models::family::{Family, MemberResponse, ROLE_MEMBER, ROLE_OWNER},
};

/// Create a family with the caller as owner-member.
pub async fn create_family(pool: &DbPool, user_id: Uuid, name: &str) -> Result<Family, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidRequest("family name must not be empty".to_string()));
    }

    let mut tx = pool.begin().await?;

    let family = sqlx::query_as::<_, Family>(
        "INSERT INTO families (name, created_by) VALUES ($1, $2) RETURNING *",
    )
    .bind(name.trim())
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO family_members (family_id, user_id, role) VALUES ($1, $2, $3)")
        .bind(family.id)
        .bind(user_id)
        .bind(ROLE_OWNER)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(family_id = %family.id, user_id = %user_id, "family created");
    Ok(family)
}

/// List the families the user belongs to, newest first.
pub async fn list_families(pool: &DbPool, user_id: Uuid) -> Result<Vec<Family>, AppError> {
    let families = sqlx::query_as::<_, Family>(
        r#"
        SELECT f.* FROM families f
        JOIN family_members fm ON fm.family_id = f.id
        WHERE fm.user_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(families)
}

/// List the members of a family the caller belongs to.
pub async fn list_members(
    pool: &DbPool,
    family_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<MemberResponse>, AppError> {
    require_role(pool, family_id, user_id, None).await?;

    let members = sqlx::query_as::<_, MemberResponse>(
        r#"
        SELECT fm.user_id, u.email, u.display_name, fm.role, fm.created_at AS joined_at
        FROM family_members fm
        JOIN users u ON u.id = fm.user_id
        WHERE fm.family_id = $1
        ORDER BY fm.created_at
        "#,
    )
    .bind(family_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Add a member by email. Owner-only.
pub async fn add_member(
    pool: &DbPool,
    family_id: Uuid,
    acting_user_id: Uuid,
    member_email: &str,
) -> Result<MemberResponse, AppError> {
    require_role(pool, family_id, acting_user_id, Some(ROLE_OWNER)).await?;

    let email = member_email.trim().to_lowercase();
    let new_user: Option<(Uuid, String, Option<String>)> = sqlx::query_as(
        "SELECT id, email, display_name FROM users WHERE email = $1 AND is_active = true",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let (new_user_id, email, display_name) = new_user.ok_or(AppError::UserNotFound)?;

    let joined_at = sqlx::query_scalar(
        "INSERT INTO family_members (family_id, user_id, role) VALUES ($1, $2, $3) RETURNING created_at",
    )
    .bind(family_id)
    .bind(new_user_id)
    .bind(ROLE_MEMBER)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("user is already a member of this family".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(MemberResponse {
        user_id: new_user_id,
        email,
        display_name,
        role: ROLE_MEMBER.to_string(),
        joined_at,
    })
}

/// Remove a member. Owner-only; owners cannot be removed.
pub async fn remove_member(
    pool: &DbPool,
    family_id: Uuid,
    acting_user_id: Uuid,
    member_user_id: Uuid,
) -> Result<(), AppError> {
    require_role(pool, family_id, acting_user_id, Some(ROLE_OWNER)).await?;

    let role: Option<String> = sqlx::query_scalar(
        "SELECT role FROM family_members WHERE family_id = $1 AND user_id = $2",
    )
    .bind(family_id)
    .bind(member_user_id)
    .fetch_optional(pool)
    .await?;

    match role.as_deref() {
        None => Err(AppError::UserNotFound),
        Some(ROLE_OWNER) => Err(AppError::InvalidRequest(
            "the family owner cannot be removed".to_string(),
        )),
        Some(_) => {
            sqlx::query("DELETE FROM family_members WHERE family_id = $1 AND user_id = $2")
                .bind(family_id)
                .bind(member_user_id)
                .execute(pool)
                .await?;
            Ok(())
        }
    }
}

/// Require that the caller is a member of `family_id`, optionally with a
/// specific role. Non-members get 404; members with the wrong role get 403.
async fn require_role(
    pool: &DbPool,
    family_id: Uuid,
    user_id: Uuid,
    required_role: Option<&str>,
) -> Result<(), AppError> {
    let role: Option<String> = sqlx::query_scalar(
        "SELECT role FROM family_members WHERE family_id = $1 AND user_id = $2",
    )
    .bind(family_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match (role, required_role) {
        (None, _) => Err(AppError::FamilyNotFound),
        (Some(_), None) => Ok(()),
        (Some(actual), Some(required)) if actual == required => Ok(()),
        (Some(_), Some(_)) => Err(AppError::Forbidden),
    }
}
