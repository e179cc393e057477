use chrono::{DateTime, Utc};
use shared_types::{AppError, Document, DocumentContent, DocumentVersion, StoredFile};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error_convert::SqlxErrorExt;
use crate::scope::document_access_sql;
use crate::text::like_pattern;

const DOCUMENT_SELECT: &str = r#"
    SELECT d.id, d.title, d.description, d.document_type, d.category, d.subcategory,
           d.case_id, d.judgment_id, d.court_id, d.file, d.content,
           d.confidentiality_level, d.permissions, d.view_history, d.processing_status,
           d.versions, d.signatures, d.tags, d.notes, d.related_documents,
           d.uploaded_at, d.last_viewed, d.last_modified, d.expiry_date,
           d.archive_date, d.status, d.uploaded_by, d.created_at, d.updated_at,
           u.name AS uploader_name, cs.case_number AS case_number
    FROM documents d
    JOIN users u ON u.id = d.uploaded_by
    LEFT JOIN cases cs ON cs.id = d.case_id
"#;

/// Text content is extracted synchronously, so a document with text is done.
fn processing_status(content: &DocumentContent) -> &'static str {
    if content.text.is_some() {
        "processed"
    } else {
        "uploaded"
    }
}

pub struct NewDocument<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub document_type: &'a str,
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub case_id: Option<Uuid>,
    pub judgment_id: Option<Uuid>,
    pub court_id: Option<Uuid>,
    pub file: &'a StoredFile,
    pub content: &'a DocumentContent,
    pub confidentiality_level: &'a str,
    pub tags: &'a [String],
    pub versions: &'a [DocumentVersion],
    pub uploaded_by: Uuid,
}

pub async fn create(pool: &Pool<Postgres>, new: NewDocument<'_>) -> Result<Document, AppError> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO documents
            (id, title, description, document_type, category, subcategory, case_id,
             judgment_id, court_id, file, content, confidentiality_level, tags,
             versions, uploaded_by, processing_status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(id)
    .bind(new.title.trim())
    .bind(new.description)
    .bind(new.document_type)
    .bind(new.category)
    .bind(new.subcategory)
    .bind(new.case_id)
    .bind(new.judgment_id)
    .bind(new.court_id)
    .bind(sqlx::types::Json(new.file))
    .bind(sqlx::types::Json(new.content))
    .bind(new.confidentiality_level)
    .bind(new.tags)
    .bind(sqlx::types::Json(new.versions))
    .bind(new.uploaded_by)
    .bind(processing_status(new.content))
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("تعذر قراءة المستند بعد حفظه"))
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Document>, AppError> {
    let sql = format!("{DOCUMENT_SELECT} WHERE d.id = $1");
    sqlx::query_as::<_, Document>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

#[derive(Debug, Default)]
pub struct DocumentFilter<'a> {
    pub document_type: Option<&'a str>,
    pub case_id: Option<Uuid>,
    pub q: Option<&'a str>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

fn filter_clause() -> String {
    format!(
        r#"
        WHERE d.status = 'active'
          AND {access}
          AND ($4::TEXT IS NULL OR d.document_type = $4)
          AND ($5::UUID IS NULL OR d.case_id = $5)
          AND ($6::TEXT IS NULL OR d.title ILIKE $6 OR d.description ILIKE $6
               OR EXISTS (SELECT 1 FROM unnest(d.tags) t WHERE t ILIKE $6))
          AND ($7::TIMESTAMPTZ IS NULL OR d.uploaded_at >= $7)
          AND ($8::TIMESTAMPTZ IS NULL OR d.uploaded_at <= $8)
        "#,
        access = document_access_sql("d", 1, 2, 3)
    )
}

/// Active documents the user may see, newest upload first.
pub async fn list(
    pool: &Pool<Postgres>,
    user: &CurrentUser,
    filter: &DocumentFilter<'_>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Document>, i64), AppError> {
    let pattern = filter.q.map(like_pattern);
    let clause = filter_clause();

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM documents d {clause}"))
        .bind(user.is_admin())
        .bind(user.id)
        .bind(user.court_id)
        .bind(filter.document_type)
        .bind(filter.case_id)
        .bind(pattern.as_deref())
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let sql = format!(
        "{DOCUMENT_SELECT} {clause} ORDER BY d.uploaded_at DESC, d.id LIMIT $9 OFFSET $10"
    );
    let rows = sqlx::query_as::<_, Document>(&sql)
        .bind(user.is_admin())
        .bind(user.id)
        .bind(user.court_id)
        .bind(filter.document_type)
        .bind(filter.case_id)
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

/// Active rows for the given ids that the user may see, in the order given.
pub async fn find_many_visible(
    pool: &Pool<Postgres>,
    user: &CurrentUser,
    ids: &[Uuid],
) -> Result<Vec<Document>, AppError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let sql = format!(
        "{DOCUMENT_SELECT} WHERE d.status = 'active' AND {} AND d.id = ANY($4)",
        document_access_sql("d", 1, 2, 3)
    );
    let mut rows = sqlx::query_as::<_, Document>(&sql)
        .bind(user.is_admin())
        .bind(user.id)
        .bind(user.court_id)
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    rows.sort_by_key(|d| ids.iter().position(|id| *id == d.id));
    Ok(rows)
}

/// Every active document, for building the search index.
pub async fn list_active(pool: &Pool<Postgres>) -> Result<Vec<Document>, AppError> {
    let sql = format!("{DOCUMENT_SELECT} WHERE d.status = 'active' ORDER BY d.uploaded_at");
    sqlx::query_as::<_, Document>(&sql)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Append a view entry and stamp `last_viewed`.
pub async fn log_view(pool: &Pool<Postgres>, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE documents SET
            view_history = view_history || jsonb_build_array(
                jsonb_build_object('user_id', $2::TEXT, 'viewed_at', NOW())),
            last_viewed = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Point the document at a new file and replace its version list.
pub async fn replace_file(
    pool: &Pool<Postgres>,
    id: Uuid,
    file: &StoredFile,
    content: &DocumentContent,
    versions: &[DocumentVersion],
) -> Result<Option<Document>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE documents SET
            file = $2,
            content = $3,
            versions = $4,
            processing_status = $5,
            last_modified = NOW(),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(sqlx::types::Json(file))
    .bind(sqlx::types::Json(content))
    .bind(sqlx::types::Json(versions))
    .bind(processing_status(content))
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Set `user_id`'s explicit access, replacing an earlier entry.
pub async fn set_grant(
    pool: &Pool<Postgres>,
    id: Uuid,
    user_id: Uuid,
    access: &str,
) -> Result<Option<Document>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE documents SET
            permissions = (
                SELECT COALESCE(jsonb_agg(p), '[]'::jsonb)
                FROM jsonb_array_elements(permissions) p
                WHERE p->>'user_id' <> $2::TEXT
            ) || jsonb_build_array(jsonb_build_object('user_id', $2::TEXT, 'access', $3::TEXT)),
            updated_at = NOW()
        WHERE id = $1 AND status <> 'deleted'
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(access)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Drop `user_id`'s explicit access entry if there is one.
pub async fn revoke_grant(
    pool: &Pool<Postgres>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Document>, AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE documents SET
            permissions = (
                SELECT COALESCE(jsonb_agg(p), '[]'::jsonb)
                FROM jsonb_array_elements(permissions) p
                WHERE p->>'user_id' <> $2::TEXT
            ),
            updated_at = NOW()
        WHERE id = $1 AND status <> 'deleted'
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Soft delete.
pub async fn mark_deleted(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE documents SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status <> 'deleted'",
    )
    .bind(id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn count(
    pool: &Pool<Postgres>,
    user: &CurrentUser,
    since: Option<DateTime<Utc>>,
) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM documents d WHERE d.status = 'active' AND {} \
         AND ($4::TIMESTAMPTZ IS NULL OR d.uploaded_at >= $4)",
        document_access_sql("d", 1, 2, 3)
    );
    sqlx::query_scalar(&sql)
        .bind(user.is_admin())
        .bind(user.id)
        .bind(user.court_id)
        .bind(since)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
