use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    normalize_pagination, page_offset, validated_query, AddAppealRequest, Appeal, AppError,
    CreateJudgmentRequest, Judgment, JudgmentContent, JudgmentListParams, JudgmentResponse,
    JudgmentStatisticsReport, MessageResponse, PaginatedResponse, PanelMember, Permission,
    PublishJudgmentRequest, ReviewEntry, TextSearchParams, UpdateJudgmentRequest, UserRole,
    EXECUTION_STATUSES, IMPORTANCE_LEVELS, JUDGMENT_DECISIONS, JUDGMENT_STATUSES, JUDGMENT_TYPES,
    PANEL_ROLES,
};

use crate::auth::AuthRequired;
use crate::config::feature_flags;
use crate::error_convert::{ensure_choice, parse_id, ValidateRequest};
use crate::repo;
use crate::repo::judgment::JudgmentFilter;
use crate::scope::Scope;
use crate::search::{find, sync_judgment, sync_removal, SearchIndex, SearchKind, MAX_INDEX_HITS};

/// Upper bound on index hits considered for one full-text query.

const DEFAULT_PUBLICATION_MEDIUM: &str = "website";

fn ensure_content_complete(content: &JudgmentContent) -> Result<(), AppError> {
    let missing = content.missing_sections();
    if missing.is_empty() {
        return Ok(());
    }
    let field_errors: HashMap<String, String> = missing
        .into_iter()
        .map(|name| (format!("content.{name}"), "هذا القسم مطلوب".to_string()))
        .collect();
    Err(AppError::validation("محتوى الحكم غير مكتمل", field_errors))
}

fn ensure_panel(panel: &[PanelMember]) -> Result<(), AppError> {
    for member in panel {
        ensure_choice("panel.role", &member.role, PANEL_ROLES)?;
    }
    Ok(())
}

async fn load_judgment(pool: &Pool<Postgres>, id: Uuid) -> Result<Judgment, AppError> {
    repo::judgment::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("الحكم غير موجود"))
}

/// GET /api/judgments
#[utoipa::path(
    get,
    path = "/api/judgments",
    params(JudgmentListParams),
    responses(
        (status = 200, description = "Paginated judgments without narrative sections", body = PaginatedResponse<JudgmentResponse>),
        (status = 403, description = "Missing view_judgment", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn list_judgments(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<JudgmentListParams>,
) -> Result<Json<PaginatedResponse<JudgmentResponse>>, AppError> {
    user.authorize(&[Permission::ViewJudgment])?;
    if let Some(t) = params.judgment_type.as_deref() {
        ensure_choice("type", t, JUDGMENT_TYPES)?;
    }
    if let Some(d) = params.decision.as_deref() {
        ensure_choice("decision", d, JUDGMENT_DECISIONS)?;
    }
    if let Some(s) = params.status.as_deref() {
        ensure_choice("status", s, JUDGMENT_STATUSES)?;
    }

    let (page, limit) = normalize_pagination(params.page, params.limit, 10);
    let filter = JudgmentFilter {
        judgment_type: params.judgment_type.as_deref(),
        decision: params.decision.as_deref(),
        court: params.court,
        judge: params.judge,
        status: params.status.as_deref(),
        q: params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        ..JudgmentFilter::default()
    };
    let (rows, total) = repo::judgment::list(
        &pool,
        Scope::for_judgments(&user),
        &filter,
        page_offset(page, limit),
        limit,
    )
    .await?;

    let items = rows
        .into_iter()
        .map(|j| JudgmentResponse::from(j).without_content())
        .collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// GET /api/judgments/{id}
#[utoipa::path(
    get,
    path = "/api/judgments/{id}",
    params(("id" = String, Path, description = "Judgment UUID")),
    responses(
        (status = 200, description = "Full judgment", body = JudgmentResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn get_judgment(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<JudgmentResponse>, AppError> {
    user.authorize(&[Permission::ViewJudgment])?;
    let id = parse_id(&id)?;
    let judgment = load_judgment(&pool, id).await?;
    Ok(Json(JudgmentResponse::from(judgment)))
}

/// POST /api/judgments
#[utoipa::path(
    post,
    path = "/api/judgments",
    request_body = CreateJudgmentRequest,
    responses(
        (status = 201, description = "Judgment created", body = JudgmentResponse),
        (status = 403, description = "Missing create_judgment", body = AppError),
        (status = 404, description = "Case or court not found", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn create_judgment(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Json(body): Json<CreateJudgmentRequest>,
) -> Result<(StatusCode, Json<JudgmentResponse>), AppError> {
    user.authorize(&[Permission::CreateJudgment])?;
    body.validate_request()?;
    ensure_choice("type", &body.judgment_type, JUDGMENT_TYPES)?;
    ensure_choice("decision", &body.decision, JUDGMENT_DECISIONS)?;
    if let Some(s) = body.status.as_deref() {
        ensure_choice("status", s, JUDGMENT_STATUSES)?;
    }
    ensure_choice("classification.importance", &body.classification.importance, IMPORTANCE_LEVELS)?;
    ensure_panel(&body.panel)?;
    ensure_content_complete(&body.content)?;

    if !repo::case::exists(&pool, body.case_id).await? {
        return Err(AppError::not_found("القضية غير موجودة"));
    }
    let settings = repo::court::settings(&pool, body.court_id)
        .await?
        .ok_or_else(|| AppError::not_found("المحكمة غير موجودة"))?;

    let judgment =
        repo::judgment::create(&pool, &body, &settings.judgment_number_format, user.id).await?;
    sync_judgment(&search, &judgment).await;

    tracing::info!(
        judgment_id = %judgment.id,
        judgment_number = %judgment.judgment_number,
        "judgment created"
    );
    Ok((StatusCode::CREATED, Json(JudgmentResponse::from(judgment))))
}

/// PUT /api/judgments/{id}
#[utoipa::path(
    put,
    path = "/api/judgments/{id}",
    params(("id" = String, Path, description = "Judgment UUID")),
    request_body = UpdateJudgmentRequest,
    responses(
        (status = 200, description = "Judgment updated", body = JudgmentResponse),
        (status = 403, description = "Not editable by the caller", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn update_judgment(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<UpdateJudgmentRequest>,
) -> Result<Json<JudgmentResponse>, AppError> {
    user.authorize(&[Permission::EditJudgment])?;
    body.validate_request()?;
    if let Some(t) = body.judgment_type.as_deref() {
        ensure_choice("type", t, JUDGMENT_TYPES)?;
    }
    if let Some(d) = body.decision.as_deref() {
        ensure_choice("decision", d, JUDGMENT_DECISIONS)?;
    }
    if let Some(s) = body.status.as_deref() {
        ensure_choice("status", s, JUDGMENT_STATUSES)?;
    }
    if let Some(e) = &body.execution {
        ensure_choice("execution.status", &e.status, EXECUTION_STATUSES)?;
    }
    if let Some(c) = &body.classification {
        ensure_choice("classification.importance", &c.importance, IMPORTANCE_LEVELS)?;
    }
    if let Some(panel) = &body.panel {
        ensure_panel(panel)?;
    }
    if let Some(content) = &body.content {
        ensure_content_complete(content)?;
    }

    let id = parse_id(&id)?;
    let judgment = load_judgment(&pool, id).await?;
    if !judgment.can_be_edited_by(user.id, user.is_admin()) {
        return Err(AppError::forbidden("غير مصرح لك بتعديل هذا الحكم"));
    }

    let stats = body.content.as_ref().map(JudgmentContent::statistics);
    let review = ReviewEntry {
        reviewer_id: user.id,
        reviewed_at: Utc::now(),
        action: "updated".to_string(),
        comments: body.review_comments.clone(),
    };
    let updated = repo::judgment::update(&pool, id, &body, stats, &review, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("الحكم غير موجود"))?;
    sync_judgment(&search, &updated).await;

    Ok(Json(JudgmentResponse::from(updated)))
}

/// DELETE /api/judgments/{id}
#[utoipa::path(
    delete,
    path = "/api/judgments/{id}",
    params(("id" = String, Path, description = "Judgment UUID")),
    responses(
        (status = 200, description = "Draft judgment deleted", body = MessageResponse),
        (status = 400, description = "Only drafts can be deleted", body = AppError),
        (status = 403, description = "Admins only", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn delete_judgment(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    user.authorize(&[Permission::DeleteJudgment])?;
    user.require_role(&[UserRole::Admin])?;
    let id = parse_id(&id)?;
    let judgment = load_judgment(&pool, id).await?;
    if judgment.status != "draft" {
        return Err(AppError::bad_request("لا يمكن حذف حكم غير مسودة"));
    }

    repo::judgment::delete(&pool, id).await?;
    sync_removal(&search, id).await;
    tracing::info!(judgment_id = %id, admin_id = %user.id, "judgment deleted");
    Ok(Json(MessageResponse::new("تم حذف الحكم بنجاح")))
}

/// POST /api/judgments/{id}/publish
#[utoipa::path(
    post,
    path = "/api/judgments/{id}/publish",
    params(("id" = String, Path, description = "Judgment UUID")),
    request_body = PublishJudgmentRequest,
    responses(
        (status = 200, description = "Judgment published", body = JudgmentResponse),
        (status = 403, description = "Missing edit_judgment", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn publish_judgment(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<PublishJudgmentRequest>,
) -> Result<Json<JudgmentResponse>, AppError> {
    user.authorize(&[Permission::EditJudgment])?;
    let id = parse_id(&id)?;
    load_judgment(&pool, id).await?;

    let medium = body
        .medium
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_PUBLICATION_MEDIUM.to_string()]);
    let published = repo::judgment::publish(&pool, id, &medium, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("الحكم غير موجود"))?;
    sync_judgment(&search, &published).await;

    tracing::info!(judgment_id = %id, "judgment published");
    Ok(Json(JudgmentResponse::from(published)))
}

/// POST /api/judgments/{id}/appeals
#[utoipa::path(
    post,
    path = "/api/judgments/{id}/appeals",
    params(("id" = String, Path, description = "Judgment UUID")),
    request_body = AddAppealRequest,
    responses(
        (status = 201, description = "Appeal recorded", body = JudgmentResponse),
        (status = 403, description = "Missing edit_judgment", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn add_appeal(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<AddAppealRequest>,
) -> Result<(StatusCode, Json<JudgmentResponse>), AppError> {
    user.authorize(&[Permission::EditJudgment])?;
    if body.appellant.trim().is_empty() || body.grounds.trim().is_empty() {
        return Err(AppError::bad_request("المستأنف وأسباب الاستئناف مطلوبة"));
    }
    let id = parse_id(&id)?;
    let judgment = load_judgment(&pool, id).await?;

    let appeal = Appeal {
        appeal_number: format!("{}-A{}", judgment.judgment_number, judgment.appeals.len() + 1),
        filed_date: body.filed_date.unwrap_or_else(Utc::now),
        appellant: body.appellant.trim().to_string(),
        grounds: body.grounds.trim().to_string(),
        status: "pending".to_string(),
        decision_date: None,
        notes: body.notes,
    };
    let updated = repo::judgment::add_appeal(&pool, id, &appeal, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("الحكم غير موجود"))?;

    tracing::info!(judgment_id = %id, appeal_number = %appeal.appeal_number, "appeal filed");
    Ok((StatusCode::CREATED, Json(JudgmentResponse::from(updated))))
}

/// GET /api/judgments/search
#[utoipa::path(
    get,
    path = "/api/judgments/search",
    params(TextSearchParams),
    responses(
        (status = 200, description = "Ranked full-text matches", body = PaginatedResponse<JudgmentResponse>),
        (status = 400, description = "Query shorter than two characters", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn search_judgments(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<TextSearchParams>,
) -> Result<Json<PaginatedResponse<JudgmentResponse>>, AppError> {
    user.authorize(&[Permission::ViewJudgment])?;
    let q = validated_query(params.q.as_deref())
        .ok_or_else(|| AppError::bad_request("يجب أن يكون نص البحث حرفين على الأقل"))?;
    let (page, limit) = normalize_pagination(params.page, params.limit, 10);
    let scope = Scope::for_judgments(&user);

    if !feature_flags().search_index {
        let filter = JudgmentFilter {
            q: Some(&q),
            ..JudgmentFilter::default()
        };
        let (rows, total) =
            repo::judgment::list(&pool, scope, &filter, page_offset(page, limit), limit).await?;
        let items = rows
            .into_iter()
            .map(|j| JudgmentResponse::from(j).without_content())
            .collect();
        return Ok(Json(PaginatedResponse::new(items, page, limit, total)));
    }

    let ids = find(&search, SearchKind::Judgment, &q, MAX_INDEX_HITS).await;
    let visible = repo::judgment::find_many_scoped(&pool, scope, &ids).await?;
    let total = visible.len() as i64;
    let items = visible
        .into_iter()
        .skip(usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(0))
        .map(|j| JudgmentResponse::from(j).without_content())
        .collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// GET /api/judgments/statistics
#[utoipa::path(
    get,
    path = "/api/judgments/statistics",
    responses(
        (status = 200, description = "Scoped judgment counts", body = JudgmentStatisticsReport),
        (status = 403, description = "Missing view_judgment", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "judgments"
)]
pub async fn judgment_statistics(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<JudgmentStatisticsReport>, AppError> {
    user.authorize(&[Permission::ViewJudgment])?;
    let report = repo::judgment::statistics(&pool, Scope::for_judgments(&user)).await?;
    Ok(Json(report))
}
