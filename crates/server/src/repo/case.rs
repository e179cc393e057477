use chrono::{DateTime, Utc};
use shared_types::{
    format_number, AppError, CaseSession, Case, CaseEvent, CaseStatistics, CountEntry,
    CreateCaseRequest, UpdateCaseRequest,
};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;
use crate::scope::{case_scope_sql, Scope};
use crate::text::like_pattern;

const CASE_NUMBER_FORMAT: &str = "YYYY/####";

/// Joined select list; every query returning `Case` rows uses it.
const CASE_SELECT: &str = r#"
    SELECT c.id, c.case_number, c.title, c.description, c.case_type, c.category,
           c.subcategory, c.priority, c.status, c.court_id, c.judge_id, c.clerk_id,
           c.parties, c.sessions, c.amounts, c.filed_at, c.first_hearing,
           c.last_session, c.decision_date, c.final_date, c.archive_date,
           c.legal_basis, c.keywords, c.tags, c.is_public, c.confidentiality_level,
           c.related_cases, c.language, c.version, c.last_modified_by,
           c.archival_info, c.created_at, c.updated_at,
           ct.name AS court_name, jd.name AS judge_name, ck.name AS clerk_name
    FROM cases c
    JOIN courts ct ON ct.id = c.court_id
    LEFT JOIN users jd ON jd.id = c.judge_id
    LEFT JOIN users ck ON ck.id = c.clerk_id
"#;

/// Next `YYYY/NNNN` number for a court from its case counter.
async fn generate_case_number(
    conn: &mut PgConnection,
    court_id: Uuid,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let seq = super::next_sequence(conn, court_id, "case").await?;
    Ok(format_number(CASE_NUMBER_FORMAT, now, seq))
}

/// Insert a new case with an auto-generated case number.
pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateCaseRequest,
    clerk_id: Option<Uuid>,
    created_by: Uuid,
) -> Result<Case, AppError> {
    let now = Utc::now();
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let case_number = generate_case_number(&mut tx, req.court_id, now).await?;
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO cases
            (id, case_number, title, description, case_type, category, subcategory,
             priority, court_id, judge_id, clerk_id, parties, amounts, filed_at,
             legal_basis, keywords, tags, is_public, confidentiality_level,
             related_cases, last_modified_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21)
        "#,
    )
    .bind(id)
    .bind(&case_number)
    .bind(req.title.trim())
    .bind(req.description.trim())
    .bind(&req.case_type)
    .bind(&req.category)
    .bind(req.subcategory.as_deref())
    .bind(req.priority.as_deref().unwrap_or("normal"))
    .bind(req.court_id)
    .bind(req.judge_id)
    .bind(clerk_id)
    .bind(sqlx::types::Json(&req.parties))
    .bind(sqlx::types::Json(&req.amounts))
    .bind(req.filed_at.unwrap_or(now))
    .bind(sqlx::types::Json(&req.legal_basis))
    .bind(&req.keywords)
    .bind(&req.tags)
    .bind(req.is_public)
    .bind(req.confidentiality_level.as_deref().unwrap_or("restricted"))
    .bind(sqlx::types::Json(&req.related_cases))
    .bind(created_by)
    .execute(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("تعذر قراءة القضية بعد إنشائها"))
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Case>, AppError> {
    let sql = format!("{CASE_SELECT} WHERE c.id = $1");
    sqlx::query_as::<_, Case>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn exists(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cases WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Optional list filters. `q` matches title, number, description and
/// party names.
#[derive(Debug, Default)]
pub struct CaseFilter<'a> {
    pub status: Option<&'a str>,
    pub case_type: Option<&'a str>,
    pub court: Option<Uuid>,
    pub judge: Option<Uuid>,
    pub priority: Option<&'a str>,
    pub q: Option<&'a str>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Map a `sort_by` key to its column. Unknown keys sort by filing date.
pub fn sort_column(sort_by: Option<&str>) -> &'static str {
    match sort_by.unwrap_or("filed") {
        "created" => "c.created_at",
        "updated" => "c.updated_at",
        "title" => "c.title",
        "case_number" => "c.case_number",
        "priority" => "c.priority",
        "status" => "c.status",
        _ => "c.filed_at",
    }
}

pub fn sort_direction(sort_order: Option<&str>) -> &'static str {
    match sort_order {
        Some(o) if o.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    }
}

fn filter_clause() -> String {
    format!(
        r#"
        WHERE {scope}
          AND ($3::TEXT IS NULL OR c.status = $3)
          AND ($4::TEXT IS NULL OR c.case_type = $4)
          AND ($5::UUID IS NULL OR c.court_id = $5)
          AND ($6::UUID IS NULL OR c.judge_id = $6)
          AND ($7::TEXT IS NULL OR c.priority = $7)
          AND ($8::TEXT IS NULL
               OR c.title ILIKE $8 OR c.case_number ILIKE $8 OR c.description ILIKE $8
               OR EXISTS (
                   SELECT 1 FROM jsonb_array_elements(
                       COALESCE(c.parties->'plaintiffs', '[]'::jsonb)
                       || COALESCE(c.parties->'defendants', '[]'::jsonb)) p
                   WHERE p->>'name' ILIKE $8))
          AND ($9::TIMESTAMPTZ IS NULL OR c.filed_at >= $9)
          AND ($10::TIMESTAMPTZ IS NULL OR c.filed_at <= $10)
        "#,
        scope = case_scope_sql("c", 1, 2)
    )
}

/// Scoped, filtered and paginated listing.
pub async fn list(
    pool: &Pool<Postgres>,
    scope: Scope,
    filter: &CaseFilter<'_>,
    order_by: (&str, &str),
    offset: i64,
    limit: i64,
) -> Result<(Vec<Case>, i64), AppError> {
    let pattern = filter.q.map(like_pattern);
    let clause = filter_clause();

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM cases c {clause}"))
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(filter.status)
        .bind(filter.case_type)
        .bind(filter.court)
        .bind(filter.judge)
        .bind(filter.priority)
        .bind(pattern.as_deref())
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let (column, direction) = order_by;
    let sql = format!(
        "{CASE_SELECT} {clause} ORDER BY {column} {direction}, c.id LIMIT $11 OFFSET $12"
    );
    let rows = sqlx::query_as::<_, Case>(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(filter.status)
        .bind(filter.case_type)
        .bind(filter.court)
        .bind(filter.judge)
        .bind(filter.priority)
        .bind(pattern.as_deref())
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Partial update. Bumps the version and records the editor.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateCaseRequest,
    modified_by: Uuid,
) -> Result<Option<Case>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE cases SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            case_type = COALESCE($4, case_type),
            category = COALESCE($5, category),
            subcategory = COALESCE($6, subcategory),
            priority = COALESCE($7, priority),
            status = COALESCE($8, status),
            judge_id = COALESCE($9, judge_id),
            clerk_id = COALESCE($10, clerk_id),
            parties = COALESCE($11, parties),
            amounts = COALESCE($12, amounts),
            legal_basis = COALESCE($13, legal_basis),
            keywords = COALESCE($14, keywords),
            tags = COALESCE($15, tags),
            is_public = COALESCE($16, is_public),
            confidentiality_level = COALESCE($17, confidentiality_level),
            related_cases = COALESCE($18, related_cases),
            archival_info = COALESCE($19, archival_info),
            decision_date = CASE WHEN $8 = 'decided' THEN COALESCE(decision_date, NOW()) ELSE decision_date END,
            final_date = CASE WHEN $8 = 'final' THEN COALESCE(final_date, NOW()) ELSE final_date END,
            archive_date = CASE WHEN $8 = 'archived' THEN COALESCE(archive_date, NOW()) ELSE archive_date END,
            version = version + 1,
            last_modified_by = $20,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(req.title.as_deref())
    .bind(req.description.as_deref())
    .bind(req.case_type.as_deref())
    .bind(req.category.as_deref())
    .bind(req.subcategory.as_deref())
    .bind(req.priority.as_deref())
    .bind(req.status.as_deref())
    .bind(req.judge_id)
    .bind(req.clerk_id)
    .bind(req.parties.as_ref().map(sqlx::types::Json))
    .bind(req.amounts.as_ref().map(sqlx::types::Json))
    .bind(req.legal_basis.as_ref().map(sqlx::types::Json))
    .bind(req.keywords.as_deref())
    .bind(req.tags.as_deref())
    .bind(req.is_public)
    .bind(req.confidentiality_level.as_deref())
    .bind(req.related_cases.as_ref().map(sqlx::types::Json))
    .bind(req.archival_info.as_ref().map(sqlx::types::Json))
    .bind(modified_by)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Change status only, stamping the decision, final or archive date.
pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
    modified_by: Uuid,
) -> Result<Option<Case>, AppError> {
    let req = UpdateCaseRequest {
        status: Some(status.to_string()),
        ..UpdateCaseRequest::default()
    };
    update(pool, id, &req, modified_by).await
}

/// Replace the session list and refresh the hearing dates.
pub async fn set_sessions(
    pool: &Pool<Postgres>,
    id: Uuid,
    sessions: &[CaseSession],
    session_date: DateTime<Utc>,
    modified_by: Uuid,
) -> Result<Option<Case>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE cases SET
            sessions = $2,
            last_session = $3,
            first_hearing = COALESCE(first_hearing, $3),
            version = version + 1,
            last_modified_by = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(sqlx::types::Json(sessions))
    .bind(session_date)
    .bind(modified_by)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Delete a case. Returns true if a row was deleted.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM cases WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

// ── Timeline ────────────────────────────────────────────────────────

pub async fn insert_event(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    event: &str,
    description: &str,
    user_id: Option<Uuid>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO case_events (id, case_id, event, description, user_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(case_id)
    .bind(event)
    .bind(description)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Timeline in chronological order.
pub async fn list_events(pool: &Pool<Postgres>, case_id: Uuid) -> Result<Vec<CaseEvent>, AppError> {
    sqlx::query_as::<_, CaseEvent>(
        r#"
        SELECT e.id, e.case_id, e.event, e.description, e.user_id,
               u.name AS user_name, e.occurred_at
        FROM case_events e
        LEFT JOIN users u ON u.id = e.user_id
        WHERE e.case_id = $1
        ORDER BY e.occurred_at ASC, e.id
        "#,
    )
    .bind(case_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ── Aggregates ──────────────────────────────────────────────────────

/// Grouped counts over scoped cases. `column` must be a trusted
/// column name.
pub(crate) async fn count_by(
    pool: &Pool<Postgres>,
    scope: Scope,
    column: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<CountEntry>, AppError> {
    let sql = format!(
        r#"
        SELECT c.{column} AS key, COUNT(*) AS count
        FROM cases c
        WHERE {scope} AND ($3::TIMESTAMPTZ IS NULL OR c.filed_at >= $3)
        GROUP BY c.{column}
        ORDER BY count DESC, key
        "#,
        scope = case_scope_sql("c", 1, 2)
    );
    sqlx::query_as::<_, CountEntry>(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(since)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Scoped case count, optionally only those filed since a moment.
pub(crate) async fn count(
    pool: &Pool<Postgres>,
    scope: Scope,
    since: Option<DateTime<Utc>>,
) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM cases c WHERE {} AND ($3::TIMESTAMPTZ IS NULL OR c.created_at >= $3)",
        case_scope_sql("c", 1, 2)
    );
    sqlx::query_scalar(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(since)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn statistics(pool: &Pool<Postgres>, scope: Scope) -> Result<CaseStatistics, AppError> {
    let by_status = count_by(pool, scope, "status", None).await?;
    let by_type = count_by(pool, scope, "case_type", None).await?;
    let by_priority = count_by(pool, scope, "priority", None).await?;
    let total = by_status.iter().map(|e| e.count).sum();
    let active = by_status
        .iter()
        .filter(|e| shared_types::is_active_case_status(&e.key))
        .map(|e| e.count)
        .sum();
    Ok(CaseStatistics {
        total,
        active,
        by_status,
        by_type,
        by_priority,
    })
}
