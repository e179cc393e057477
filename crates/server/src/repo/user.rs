use chrono::{DateTime, Utc};
use shared_types::{AppError, User, UserPreferences, UserProfile};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;
use crate::text::like_pattern;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, permissions, court_id, \
     profile, preferences, last_login, login_attempts, lock_until, is_active, \
     email_verified, created_at, updated_at";

/// Fields for a new account; the password is already hashed.
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub court_id: Option<Uuid>,
}

pub async fn create(pool: &Pool<Postgres>, new: NewUser<'_>) -> Result<User, AppError> {
    let sql = format!(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, court_id, profile, preferences)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(new.name.trim())
        .bind(new.email.trim().to_lowercase())
        .bind(new.password_hash)
        .bind(new.role)
        .bind(new.court_id)
        .bind(sqlx::types::Json(UserProfile::default()))
        .bind(sqlx::types::Json(UserPreferences::default()))
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Paginated listing, newest first.
pub async fn list(
    pool: &Pool<Postgres>,
    role: Option<&str>,
    q: Option<&str>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<User>, i64), AppError> {
    let pattern = q.map(like_pattern);
    let filter = r#"
        WHERE ($1::TEXT IS NULL OR role = $1)
          AND ($2::TEXT IS NULL OR name ILIKE $2 OR email ILIKE $2)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {filter}"))
        .bind(role)
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users {filter} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, User>(&sql)
        .bind(role)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn record_failed_login(
    pool: &Pool<Postgres>,
    id: Uuid,
    attempts: i32,
    lock_until: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET login_attempts = $2, lock_until = $3, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(attempts)
        .bind(lock_until)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Clear lockout state and stamp the login time.
pub async fn record_successful_login(pool: &Pool<Postgres>, id: Uuid) -> Result<User, AppError> {
    let sql = format!(
        r#"
        UPDATE users SET login_attempts = 0, lock_until = NULL, last_login = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update_profile(
    pool: &Pool<Postgres>,
    id: Uuid,
    name: Option<&str>,
    profile: Option<&UserProfile>,
    preferences: Option<&UserPreferences>,
) -> Result<User, AppError> {
    let sql = format!(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            profile = COALESCE($3, profile),
            preferences = COALESCE($4, preferences),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(name.map(str::trim))
        .bind(profile.map(sqlx::types::Json))
        .bind(preferences.map(sqlx::types::Json))
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn set_password(pool: &Pool<Postgres>, id: Uuid, password_hash: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Admin changes. Passing `Some(None)` for the court clears it.
pub async fn admin_update(
    pool: &Pool<Postgres>,
    id: Uuid,
    role: Option<&str>,
    permissions: Option<&[String]>,
    court_id: Option<Uuid>,
    is_active: Option<bool>,
) -> Result<Option<User>, AppError> {
    let sql = format!(
        r#"
        UPDATE users SET
            role = COALESCE($2, role),
            permissions = COALESCE($3, permissions),
            court_id = COALESCE($4, court_id),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(role)
        .bind(permissions)
        .bind(court_id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

// ── Revoked tokens ──────────────────────────────────────────────────

pub async fn revoke_token(
    pool: &Pool<Postgres>,
    token_hash: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (token_hash, user_id, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (token_hash) DO NOTHING
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

pub async fn is_token_revoked(pool: &Pool<Postgres>, token_hash: &str) -> Result<bool, AppError> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_hash = $1)")
        .bind(token_hash)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Drop revocations whose tokens have expired anyway.
pub async fn purge_expired_revocations(pool: &Pool<Postgres>) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}
