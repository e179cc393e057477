use chrono::{DateTime, Utc};
use shared_types::{
    format_number, Appeal, AppError, CountEntry, CreateJudgmentRequest, ExecutionInfo,
    Judgment, JudgmentContent, JudgmentStatistics, JudgmentStatisticsReport, ReviewEntry,
    UpdateJudgmentRequest,
};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;
use crate::scope::{judgment_scope_sql, Scope};
use crate::text::like_pattern;

const JUDGMENT_SELECT: &str = r#"
    SELECT j.id, j.judgment_number, j.case_id, j.court_id, j.judge_id, j.panel,
           j.judgment_type, j.decision, j.summary, j.content, j.legal_basis,
           j.session_date, j.issued_date, j.notification_date, j.effective_date,
           j.appeal_deadline, j.parties, j.appeals, j.execution, j.is_published,
           j.published_date, j.publication_medium, j.anonymized, j.classification,
           j.attachments, j.signatures, j.status, j.language, j.version, j.created_by,
           j.last_modified_by, j.review_history, j.word_count, j.page_count,
           j.reading_time, j.created_at, j.updated_at,
           cs.case_number AS case_number, ct.name AS court_name, u.name AS judge_name
    FROM judgments j
    JOIN cases cs ON cs.id = j.case_id
    JOIN courts ct ON ct.id = j.court_id
    JOIN users u ON u.id = j.judge_id
"#;

/// Next number for a court using its configured judgment format.
async fn generate_judgment_number(
    conn: &mut PgConnection,
    court_id: Uuid,
    format: &str,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let seq = super::next_sequence(conn, court_id, "judgment").await?;
    Ok(format_number(format, now, seq))
}

/// Insert a judgment authored by `judge_id`. Statistics and the appeal
/// deadline are derived here.
pub async fn create(
    pool: &Pool<Postgres>,
    req: &CreateJudgmentRequest,
    number_format: &str,
    judge_id: Uuid,
) -> Result<Judgment, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let number =
        generate_judgment_number(&mut tx, req.court_id, number_format, Utc::now()).await?;
    let stats = req.content.statistics();
    let deadline = req
        .appeal_deadline
        .unwrap_or_else(|| shared_types::default_appeal_deadline(&req.judgment_type, req.issued_date));
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO judgments
            (id, judgment_number, case_id, court_id, judge_id, panel, judgment_type,
             decision, summary, content, legal_basis, session_date, issued_date,
             notification_date, effective_date, appeal_deadline, parties, execution,
             classification, status, language, created_by, word_count, page_count,
             reading_time)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $5, $22, $23, $24)
        "#,
    )
    .bind(id)
    .bind(&number)
    .bind(req.case_id)
    .bind(req.court_id)
    .bind(judge_id)
    .bind(sqlx::types::Json(&req.panel))
    .bind(&req.judgment_type)
    .bind(&req.decision)
    .bind(req.summary.trim())
    .bind(sqlx::types::Json(&req.content))
    .bind(sqlx::types::Json(&req.legal_basis))
    .bind(req.session_date)
    .bind(req.issued_date)
    .bind(req.notification_date)
    .bind(req.effective_date)
    .bind(deadline)
    .bind(sqlx::types::Json(&req.parties))
    .bind(sqlx::types::Json(ExecutionInfo::default()))
    .bind(sqlx::types::Json(&req.classification))
    .bind(req.status.as_deref().unwrap_or("draft"))
    .bind(req.language.as_deref().unwrap_or("ar"))
    .bind(stats.word_count)
    .bind(stats.page_count)
    .bind(stats.reading_time)
    .execute(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("تعذر قراءة الحكم بعد إنشائه"))
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Judgment>, AppError> {
    let sql = format!("{JUDGMENT_SELECT} WHERE j.id = $1");
    sqlx::query_as::<_, Judgment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Rows for the given ids that the scope allows, in the order given.
pub async fn find_many_scoped(
    pool: &Pool<Postgres>,
    scope: Scope,
    ids: &[Uuid],
) -> Result<Vec<Judgment>, AppError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        "{JUDGMENT_SELECT} WHERE {} AND j.id = ANY($3)",
        judgment_scope_sql("j", 1, 2)
    );
    let mut rows = sqlx::query_as::<_, Judgment>(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    rows.sort_by_key(|j| ids.iter().position(|id| *id == j.id));
    Ok(rows)
}

#[derive(Debug, Default)]
pub struct JudgmentFilter<'a> {
    pub judgment_type: Option<&'a str>,
    pub decision: Option<&'a str>,
    pub court: Option<Uuid>,
    pub judge: Option<Uuid>,
    pub status: Option<&'a str>,
    pub q: Option<&'a str>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

fn filter_clause() -> String {
    format!(
        r#"
        WHERE {scope}
          AND ($3::TEXT IS NULL OR j.judgment_type = $3)
          AND ($4::TEXT IS NULL OR j.decision = $4)
          AND ($5::UUID IS NULL OR j.court_id = $5)
          AND ($6::UUID IS NULL OR j.judge_id = $6)
          AND ($7::TEXT IS NULL OR j.status = $7)
          AND ($8::TEXT IS NULL OR j.judgment_number ILIKE $8 OR j.summary ILIKE $8)
          AND ($9::TIMESTAMPTZ IS NULL OR j.issued_date >= $9)
          AND ($10::TIMESTAMPTZ IS NULL OR j.issued_date <= $10)
        "#,
        scope = judgment_scope_sql("j", 1, 2)
    )
}

/// Scoped listing, newest issued first.
pub async fn list(
    pool: &Pool<Postgres>,
    scope: Scope,
    filter: &JudgmentFilter<'_>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Judgment>, i64), AppError> {
    let pattern = filter.q.map(like_pattern);
    let clause = filter_clause();

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM judgments j {clause}"))
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(filter.judgment_type)
        .bind(filter.decision)
        .bind(filter.court)
        .bind(filter.judge)
        .bind(filter.status)
        .bind(pattern.as_deref())
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let sql = format!(
        "{JUDGMENT_SELECT} {clause} ORDER BY j.issued_date DESC, j.id LIMIT $11 OFFSET $12"
    );
    let rows = sqlx::query_as::<_, Judgment>(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(filter.judgment_type)
        .bind(filter.decision)
        .bind(filter.court)
        .bind(filter.judge)
        .bind(filter.status)
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

/// Published judgments in a public status, matched against `q`.
pub async fn list_public(
    pool: &Pool<Postgres>,
    q: &str,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Judgment>, i64), AppError> {
    let pattern = like_pattern(q);
    let clause = r#"
        WHERE j.is_published
          AND j.status = ANY($1)
          AND (j.judgment_number ILIKE $2 OR j.summary ILIKE $2
               OR j.content->>'verdict' ILIKE $2 OR j.content->>'reasoning' ILIKE $2
               OR j.classification->>'subject' ILIKE $2)
    "#;
    let statuses: Vec<String> = shared_types::PUBLIC_JUDGMENT_STATUSES
        .iter()
        .map(|s| s.to_string())
        .collect();

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM judgments j {clause}"))
        .bind(&statuses)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let sql = format!(
        "{JUDGMENT_SELECT} {clause} ORDER BY j.issued_date DESC, j.id LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, Judgment>(&sql)
        .bind(&statuses)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Every judgment, for building the search index.
pub async fn list_all(pool: &Pool<Postgres>) -> Result<Vec<Judgment>, AppError> {
    let sql = format!("{JUDGMENT_SELECT} ORDER BY j.created_at");
    sqlx::query_as::<_, Judgment>(&sql)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Partial update with a review history entry.
pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateJudgmentRequest,
    stats: Option<JudgmentStatistics>,
    review: &ReviewEntry,
    modified_by: Uuid,
) -> Result<Option<Judgment>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE judgments SET
            judgment_type = COALESCE($2, judgment_type),
            decision = COALESCE($3, decision),
            summary = COALESCE($4, summary),
            content = COALESCE($5, content),
            panel = COALESCE($6, panel),
            legal_basis = COALESCE($7, legal_basis),
            notification_date = COALESCE($8, notification_date),
            effective_date = COALESCE($9, effective_date),
            parties = COALESCE($10, parties),
            execution = COALESCE($11, execution),
            classification = COALESCE($12, classification),
            status = COALESCE($13, status),
            word_count = COALESCE($14, word_count),
            page_count = COALESCE($15, page_count),
            reading_time = COALESCE($16, reading_time),
            review_history = review_history || jsonb_build_array($17::jsonb),
            version = version + 1,
            last_modified_by = $18,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(req.judgment_type.as_deref())
    .bind(req.decision.as_deref())
    .bind(req.summary.as_deref())
    .bind(req.content.as_ref().map(sqlx::types::Json::<&JudgmentContent>))
    .bind(req.panel.as_ref().map(sqlx::types::Json))
    .bind(req.legal_basis.as_ref().map(sqlx::types::Json))
    .bind(req.notification_date)
    .bind(req.effective_date)
    .bind(req.parties.as_ref().map(sqlx::types::Json))
    .bind(req.execution.as_ref().map(sqlx::types::Json))
    .bind(req.classification.as_ref().map(sqlx::types::Json))
    .bind(req.status.as_deref())
    .bind(stats.map(|s| s.word_count))
    .bind(stats.map(|s| s.page_count))
    .bind(stats.map(|s| s.reading_time))
    .bind(sqlx::types::Json(review))
    .bind(modified_by)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn publish(
    pool: &Pool<Postgres>,
    id: Uuid,
    medium: &[String],
    modified_by: Uuid,
) -> Result<Option<Judgment>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE judgments SET
            is_published = TRUE,
            published_date = NOW(),
            publication_medium = $2,
            status = 'issued',
            last_modified_by = $3,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(medium)
    .bind(modified_by)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn add_appeal(
    pool: &Pool<Postgres>,
    id: Uuid,
    appeal: &Appeal,
    modified_by: Uuid,
) -> Result<Option<Judgment>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE judgments SET
            appeals = appeals || jsonb_build_array($2::jsonb),
            status = 'appealed',
            last_modified_by = $3,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(sqlx::types::Json(appeal))
    .bind(modified_by)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

pub async fn delete(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM judgments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

// ── Aggregates ──────────────────────────────────────────────────────

pub(crate) async fn count_by(
    pool: &Pool<Postgres>,
    scope: Scope,
    column: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<CountEntry>, AppError> {
    let sql = format!(
        r#"
        SELECT j.{column} AS key, COUNT(*) AS count
        FROM judgments j
        WHERE {scope} AND ($3::TIMESTAMPTZ IS NULL OR j.issued_date >= $3)
        GROUP BY j.{column}
        ORDER BY count DESC, key
        "#,
        scope = judgment_scope_sql("j", 1, 2)
    );
    sqlx::query_as::<_, CountEntry>(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(since)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub(crate) async fn count(
    pool: &Pool<Postgres>,
    scope: Scope,
    since: Option<DateTime<Utc>>,
) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM judgments j WHERE {} AND ($3::TIMESTAMPTZ IS NULL OR j.created_at >= $3)",
        judgment_scope_sql("j", 1, 2)
    );
    sqlx::query_scalar(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .bind(since)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Issued-per-month counts for the last twelve months, keyed `YYYY-MM`.
pub(crate) async fn count_by_month(pool: &Pool<Postgres>, scope: Scope) -> Result<Vec<CountEntry>, AppError> {
    let sql = format!(
        r#"
        SELECT to_char(date_trunc('month', j.issued_date), 'YYYY-MM') AS key, COUNT(*) AS count
        FROM judgments j
        WHERE {} AND j.issued_date >= date_trunc('month', NOW()) - INTERVAL '11 months'
        GROUP BY key
        ORDER BY key
        "#,
        judgment_scope_sql("j", 1, 2)
    );
    sqlx::query_as::<_, CountEntry>(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn statistics(pool: &Pool<Postgres>, scope: Scope) -> Result<JudgmentStatisticsReport, AppError> {
    let by_decision = count_by(pool, scope, "decision", None).await?;
    let by_type = count_by(pool, scope, "judgment_type", None).await?;
    let by_status = count_by(pool, scope, "status", None).await?;
    let total = by_status.iter().map(|e| e.count).sum();
    let sql = format!(
        "SELECT COUNT(*) FROM judgments j WHERE {} AND j.is_published",
        judgment_scope_sql("j", 1, 2)
    );
    let published: i64 = sqlx::query_scalar(&sql)
        .bind(scope.kind_str())
        .bind(scope.id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(JudgmentStatisticsReport {
        total,
        published,
        by_decision,
        by_type,
        by_status,
    })
}
