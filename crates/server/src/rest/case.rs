use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    normalize_pagination, page_offset, status_change_description, AddSessionRequest, AppError,
    Case, CaseDetailResponse, CaseEventResponse, CaseListParams, CaseResponse, CaseSession,
    CaseStatistics, CreateCaseRequest, MessageResponse, PaginatedResponse, Permission,
    UpdateCaseRequest, UpdateCaseStatusRequest, UserRole, CASE_PRIORITIES, CASE_STATUSES,
    CASE_TYPES, CONFIDENTIALITY_LEVELS, LOCKED_CASE_STATUSES, SESSION_STATUSES, SESSION_TYPES,
};

use crate::auth::{AuthRequired, CurrentUser};
use crate::error_convert::{ensure_choice, parse_id, ValidateRequest};
use crate::repo;
use crate::repo::case::CaseFilter;
use crate::scope::{can_view_case, Scope};

async fn load_case(pool: &Pool<Postgres>, id: Uuid) -> Result<Case, AppError> {
    repo::case::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("القضية غير موجودة"))
}

/// Load a case the caller is allowed to modify.
async fn load_editable(pool: &Pool<Postgres>, id: Uuid, user: &CurrentUser) -> Result<Case, AppError> {
    let case = load_case(pool, id).await?;
    if !case.can_be_edited_by(user.id, user.is_admin()) {
        return Err(AppError::forbidden("غير مصرح لك بتعديل هذه القضية"));
    }
    Ok(case)
}

/// GET /api/cases
#[utoipa::path(
    get,
    path = "/api/cases",
    params(CaseListParams),
    responses(
        (status = 200, description = "Paginated cases visible to the caller", body = PaginatedResponse<CaseResponse>),
        (status = 403, description = "Missing view_case", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn list_cases(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<CaseListParams>,
) -> Result<Json<PaginatedResponse<CaseResponse>>, AppError> {
    user.authorize(&[Permission::ViewCase])?;
    if let Some(s) = params.status.as_deref() {
        ensure_choice("status", s, CASE_STATUSES)?;
    }
    if let Some(t) = params.case_type.as_deref() {
        ensure_choice("type", t, CASE_TYPES)?;
    }
    if let Some(p) = params.priority.as_deref() {
        ensure_choice("priority", p, CASE_PRIORITIES)?;
    }

    let (page, limit) = normalize_pagination(params.page, params.limit, 10);
    let filter = CaseFilter {
        status: params.status.as_deref(),
        case_type: params.case_type.as_deref(),
        court: params.court,
        judge: params.judge,
        priority: params.priority.as_deref(),
        q: params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        date_from: params.date_from,
        date_to: params.date_to,
    };
    let order = (
        repo::case::sort_column(params.sort_by.as_deref()),
        repo::case::sort_direction(params.sort_order.as_deref()),
    );

    let (rows, total) = repo::case::list(
        &pool,
        Scope::for_cases(&user),
        &filter,
        order,
        page_offset(page, limit),
        limit,
    )
    .await?;

    let items = rows.into_iter().map(CaseResponse::from).collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// POST /api/cases
#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = CaseResponse),
        (status = 403, description = "Missing create_case or another court", body = AppError),
        (status = 404, description = "Court not found", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn create_case(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Json(body): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), AppError> {
    user.authorize(&[Permission::CreateCase])?;
    body.validate_request()?;
    ensure_choice("type", &body.case_type, CASE_TYPES)?;
    if let Some(p) = body.priority.as_deref() {
        ensure_choice("priority", p, CASE_PRIORITIES)?;
    }
    if let Some(c) = body.confidentiality_level.as_deref() {
        ensure_choice("confidentiality_level", c, CONFIDENTIALITY_LEVELS)?;
    }

    if !repo::court::exists(&pool, body.court_id).await? {
        return Err(AppError::not_found("المحكمة غير موجودة"));
    }
    if !user.is_admin() && user.court_id.is_some_and(|c| c != body.court_id) {
        return Err(AppError::forbidden("غير مصرح لك بإنشاء قضايا في هذه المحكمة"));
    }

    let clerk_id = if user.role == UserRole::Clerk {
        Some(user.id)
    } else {
        body.clerk_id
    };
    let case = repo::case::create(&pool, &body, clerk_id, user.id).await?;
    repo::case::insert_event(&pool, case.id, "case_created", "تم إنشاء القضية", Some(user.id))
        .await?;

    tracing::info!(case_id = %case.id, case_number = %case.case_number, "case created");
    Ok((StatusCode::CREATED, Json(CaseResponse::from(case))))
}

/// GET /api/cases/{id}
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case with timeline", body = CaseDetailResponse),
        (status = 403, description = "Not visible to the caller", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn get_case(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<CaseDetailResponse>, AppError> {
    user.authorize(&[Permission::ViewCase])?;
    let id = parse_id(&id)?;
    let case = load_case(&pool, id).await?;
    if !can_view_case(&user, &case) {
        return Err(AppError::forbidden("غير مصرح لك بعرض هذه القضية"));
    }

    let timeline = repo::case::list_events(&pool, id).await?;
    Ok(Json(CaseDetailResponse {
        case: CaseResponse::from(case),
        timeline: timeline.into_iter().map(CaseEventResponse::from).collect(),
    }))
}

/// PUT /api/cases/{id}
#[utoipa::path(
    put,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    request_body = UpdateCaseRequest,
    responses(
        (status = 200, description = "Case updated", body = CaseResponse),
        (status = 403, description = "Not the assigned judge or clerk", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn update_case(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateCaseRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    user.authorize(&[Permission::EditCase])?;
    body.validate_request()?;
    if let Some(t) = body.case_type.as_deref() {
        ensure_choice("type", t, CASE_TYPES)?;
    }
    if let Some(p) = body.priority.as_deref() {
        ensure_choice("priority", p, CASE_PRIORITIES)?;
    }
    if let Some(s) = body.status.as_deref() {
        ensure_choice("status", s, CASE_STATUSES)?;
    }
    if let Some(c) = body.confidentiality_level.as_deref() {
        ensure_choice("confidentiality_level", c, CONFIDENTIALITY_LEVELS)?;
    }

    let id = parse_id(&id)?;
    let before = load_editable(&pool, id, &user).await?;
    let updated = repo::case::update(&pool, id, &body, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("القضية غير موجودة"))?;

    if let Some(status) = body.status.as_deref().filter(|s| *s != before.status) {
        repo::case::insert_event(
            &pool,
            id,
            "status_change",
            &status_change_description(&before.status, status),
            Some(user.id),
        )
        .await?;
    }
    repo::case::insert_event(&pool, id, "case_updated", "تم تحديث بيانات القضية", Some(user.id))
        .await?;

    Ok(Json(CaseResponse::from(updated)))
}

/// DELETE /api/cases/{id}
#[utoipa::path(
    delete,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case deleted", body = MessageResponse),
        (status = 400, description = "Final or archived case", body = AppError),
        (status = 403, description = "Admins only", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn delete_case(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.require_role(&[UserRole::Admin])?;
    let id = parse_id(&id)?;
    let case = load_case(&pool, id).await?;
    if LOCKED_CASE_STATUSES.contains(&case.status.as_str()) {
        return Err(AppError::bad_request("لا يمكن حذف قضية نهائية أو مؤرشفة"));
    }

    repo::case::delete(&pool, id).await?;
    tracing::info!(case_id = %id, admin_id = %user.id, "case deleted");
    Ok(Json(MessageResponse::new("تم حذف القضية بنجاح")))
}

/// POST /api/cases/{id}/sessions
#[utoipa::path(
    post,
    path = "/api/cases/{id}/sessions",
    params(("id" = String, Path, description = "Case UUID")),
    request_body = AddSessionRequest,
    responses(
        (status = 201, description = "Session appended", body = CaseResponse),
        (status = 403, description = "Not the assigned judge or clerk", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn add_session(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<AddSessionRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), AppError> {
    user.authorize(&[Permission::EditCase])?;
    ensure_choice("type", &body.session_type, SESSION_TYPES)?;
    let status = body.status.unwrap_or_else(|| "scheduled".to_string());
    ensure_choice("status", &status, SESSION_STATUSES)?;

    let id = parse_id(&id)?;
    let case = load_editable(&pool, id, &user).await?;

    let mut sessions = case.sessions;
    let session_number = sessions.len() as i32 + 1;
    sessions.push(CaseSession {
        session_number,
        date: body.date,
        time: body.time,
        session_type: body.session_type,
        attendees: body.attendees,
        summary: body.summary,
        decisions: body.decisions,
        next_session_date: body.next_session_date,
        status,
    });

    let updated = repo::case::set_sessions(&pool, id, &sessions, body.date, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("القضية غير موجودة"))?;
    repo::case::insert_event(
        &pool,
        id,
        "session_added",
        &format!("تمت إضافة الجلسة رقم {session_number}"),
        Some(user.id),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CaseResponse::from(updated))))
}

/// PUT /api/cases/{id}/status
#[utoipa::path(
    put,
    path = "/api/cases/{id}/status",
    params(("id" = String, Path, description = "Case UUID")),
    request_body = UpdateCaseStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = CaseResponse),
        (status = 403, description = "Not the assigned judge or clerk", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 422, description = "Unknown status", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn update_case_status(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateCaseStatusRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    user.authorize(&[Permission::EditCase])?;
    ensure_choice("status", &body.status, CASE_STATUSES)?;
    let id = parse_id(&id)?;
    let case = load_editable(&pool, id, &user).await?;

    let updated = repo::case::update_status(&pool, id, &body.status, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("القضية غير موجودة"))?;

    let mut description = status_change_description(&case.status, &body.status);
    if let Some(note) = body.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        description.push_str(" - ");
        description.push_str(note);
    }
    repo::case::insert_event(&pool, id, "status_change", &description, Some(user.id)).await?;
    tracing::info!(case_id = %id, from = %case.status, to = %body.status, "case status changed");

    Ok(Json(CaseResponse::from(updated)))
}

/// GET /api/cases/statistics
#[utoipa::path(
    get,
    path = "/api/cases/statistics",
    responses(
        (status = 200, description = "Scoped case counts", body = CaseStatistics),
        (status = 403, description = "Missing view_case", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "cases"
)]
pub async fn case_statistics(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<CaseStatistics>, AppError> {
    user.authorize(&[Permission::ViewCase])?;
    let stats = repo::case::statistics(&pool, Scope::for_cases(&user)).await?;
    Ok(Json(stats))
}
