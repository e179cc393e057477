use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, AppError, CourtDetailResponse, CourtListParams,
    CourtResponse, CreateCourtRequest, PaginatedResponse, Permission, UpdateCourtRequest,
    UserRole, COURT_STATUSES, COURT_TYPES, JURISDICTIONS,
};

use crate::auth::AuthRequired;
use crate::error_convert::{ensure_choice, parse_id, ValidateRequest};
use crate::repo;
use crate::repo::court::CourtFilter;

/// GET /api/courts
#[utoipa::path(
    get,
    path = "/api/courts",
    params(CourtListParams),
    responses(
        (status = 200, description = "Paginated courts", body = PaginatedResponse<CourtResponse>)
    ),
    security(("bearer" = [])),
    tag = "courts"
)]
pub async fn list_courts(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(_user): AuthRequired,
    Query(params): Query<CourtListParams>,
) -> Result<Json<PaginatedResponse<CourtResponse>>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit, 20);
    let filter = CourtFilter {
        court_type: params.court_type.as_deref(),
        jurisdiction: params.jurisdiction.as_deref(),
        city: params.city.as_deref(),
        status: params.status.as_deref().unwrap_or("active"),
        q: params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    };
    let (rows, total) = repo::court::list(&pool, filter, page_offset(page, limit), limit).await?;
    let items = rows.into_iter().map(CourtResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// GET /api/courts/{id}
#[utoipa::path(
    get,
    path = "/api/courts/{id}",
    params(("id" = String, Path, description = "Court UUID")),
    responses(
        (status = 200, description = "Court with sub-courts and statistics", body = CourtDetailResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "courts"
)]
pub async fn get_court(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(_user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<CourtDetailResponse>, AppError> {
    let id = parse_id(&id)?;
    let court = repo::court::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("المحكمة غير موجودة"))?;
    let sub_courts = repo::court::sub_courts(&pool, id).await?;
    let statistics = repo::court::statistics(&pool, id).await?;

    Ok(Json(CourtDetailResponse {
        court: CourtResponse::from(court),
        sub_courts: sub_courts.into_iter().map(CourtResponse::from).collect(),
        statistics,
    }))
}

/// POST /api/courts
#[utoipa::path(
    post,
    path = "/api/courts",
    request_body = CreateCourtRequest,
    responses(
        (status = 201, description = "Court created", body = CourtResponse),
        (status = 403, description = "Admins only", body = AppError),
        (status = 404, description = "Parent court not found", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "courts"
)]
pub async fn create_court(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Json(body): Json<CreateCourtRequest>,
) -> Result<(StatusCode, Json<CourtResponse>), AppError> {
    user.require_role(&[UserRole::Admin])?;
    body.validate_request()?;
    ensure_choice("type", &body.court_type, COURT_TYPES)?;
    ensure_choice("jurisdiction", &body.jurisdiction, JURISDICTIONS)?;
    if let Some(status) = body.status.as_deref() {
        ensure_choice("status", status, COURT_STATUSES)?;
    }
    if let Some(parent) = body.parent_court_id {
        if !repo::court::exists(&pool, parent).await? {
            return Err(AppError::not_found("المحكمة الأم غير موجودة"));
        }
    }

    let court = repo::court::create(&pool, body).await?;
    tracing::info!(court_id = %court.id, admin_id = %user.id, "court created");
    Ok((StatusCode::CREATED, Json(CourtResponse::from(court))))
}

/// PUT /api/courts/{id}
#[utoipa::path(
    put,
    path = "/api/courts/{id}",
    params(("id" = String, Path, description = "Court UUID")),
    request_body = UpdateCourtRequest,
    responses(
        (status = 200, description = "Court updated", body = CourtResponse),
        (status = 403, description = "Admins only", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "courts"
)]
pub async fn update_court(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateCourtRequest>,
) -> Result<Json<CourtResponse>, AppError> {
    user.authorize(&[Permission::ManageCourts])?;
    user.require_role(&[UserRole::Admin])?;
    let id = parse_id(&id)?;

    if let Some(t) = body.court_type.as_deref() {
        ensure_choice("type", t, COURT_TYPES)?;
    }
    if let Some(j) = body.jurisdiction.as_deref() {
        ensure_choice("jurisdiction", j, JURISDICTIONS)?;
    }
    if let Some(s) = body.status.as_deref() {
        ensure_choice("status", s, COURT_STATUSES)?;
    }
    if body.level.is_some_and(|l| !(1..=4).contains(&l)) {
        return Err(AppError::bad_request("مستوى المحكمة يجب أن يكون بين 1 و 4"));
    }
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::bad_request("اسم المحكمة مطلوب"));
    }

    let court = repo::court::update(&pool, id, body)
        .await?
        .ok_or_else(|| AppError::not_found("المحكمة غير موجودة"))?;
    Ok(Json(CourtResponse::from(court)))
}
