use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AdminUpdateUserRequest, AppError, PaginatedResponse,
    Permission, UserListParams, UserResponse, UserRole, USER_ROLES,
};

use crate::auth::AuthRequired;
use crate::error_convert::{ensure_choice, parse_id};
use crate::repo;

/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListParams),
    responses(
        (status = 200, description = "Paginated accounts", body = PaginatedResponse<UserResponse>),
        (status = 403, description = "Admins only", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<UserListParams>,
) -> Result<Json<PaginatedResponse<UserResponse>>, AppError> {
    user.require_role(&[UserRole::Admin])?;
    if let Some(role) = params.role.as_deref() {
        ensure_choice("role", role, USER_ROLES)?;
    }

    let (page, limit) = normalize_pagination(params.page, params.limit, 10);
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (rows, total) = repo::user::list(
        &pool,
        params.role.as_deref(),
        search,
        page_offset(page, limit),
        limit,
    )
    .await?;

    let items = rows.into_iter().map(UserResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 403, description = "Not the caller and not an admin", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id)?;
    if id != user.id && !user.is_admin() {
        return Err(AppError::forbidden("ليس لديك صلاحية لعرض هذا المستخدم"));
    }
    let found = repo::user::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("المستخدم غير موجود"))?;
    Ok(Json(UserResponse::from(found)))
}

/// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User UUID")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 403, description = "Admins only", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Unknown role or permission", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    user.authorize(&[Permission::ManageUsers])?;
    user.require_role(&[UserRole::Admin])?;
    let id = parse_id(&id)?;

    if let Some(role) = body.role.as_deref() {
        ensure_choice("role", role, USER_ROLES)?;
    }
    if let Some(perms) = &body.permissions {
        let known: Vec<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        for p in perms {
            ensure_choice("permissions", p, &known)?;
        }
    }
    if let Some(court_id) = body.court_id {
        if !repo::court::exists(&pool, court_id).await? {
            return Err(AppError::not_found("المحكمة غير موجودة"));
        }
    }

    let updated = repo::user::admin_update(
        &pool,
        id,
        body.role.as_deref(),
        body.permissions.as_deref(),
        body.court_id,
        body.is_active,
    )
    .await?
    .ok_or_else(|| AppError::not_found("المستخدم غير موجود"))?;

    tracing::info!(admin_id = %user.id, user_id = %updated.id, "account updated by admin");
    Ok(Json(UserResponse::from(updated)))
}
