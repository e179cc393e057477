use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    is_allowed_mime, normalize_pagination, page_offset, parse_tags, AppError, Document,
    DocumentContent, DocumentListParams, DocumentResponse, DocumentUploadFields, DocumentVersion,
    GrantAccessRequest, MessageResponse, PaginatedResponse, StoredFile, ACCESS_LEVELS,
    DOCUMENT_CONFIDENTIALITY_LEVELS, DOCUMENT_TYPES,
};

use crate::auth::{AuthRequired, CurrentUser};
use crate::config;
use crate::error_convert::{ensure_choice, parse_id};
use crate::repo;
use crate::repo::document::{DocumentFilter, NewDocument};
use crate::scope::can_view_case;
use crate::search::{sync_document, sync_removal, SearchIndex};
use crate::storage::{checksum, file_extension, storage_key, LocalDiskStore, ObjectStore};
use crate::text::{detect_language, extract_keywords};

const MAX_KEYWORDS: usize = 10;

/// The `file` part of an upload.
struct UploadedFile {
    original_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::bad_request(format!("تعذر قراءة الملف المرفوع: {}", e.body_text()))
}

/// Drain a multipart body into the file part and the text fields.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(Option<UploadedFile>, DocumentUploadFields), AppError> {
    let mut file = None;
    let mut fields = DocumentUploadFields::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let original_name = field.file_name().unwrap_or("upload").to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            file = Some(UploadedFile {
                original_name,
                mime_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "title" => fields.title = value,
            "type" | "document_type" => fields.document_type = value,
            "category" => fields.category = value,
            "subcategory" => fields.subcategory = value,
            "description" => fields.description = value,
            "case_id" => fields.case_id = value,
            "judgment_id" => fields.judgment_id = value,
            "confidentiality_level" => fields.confidentiality_level = value,
            "tags" => fields.tags = value,
            "changes" => fields.changes = value,
            _ => {}
        }
    }
    Ok((file, fields))
}

fn check_file(file: &UploadedFile) -> Result<(), AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::bad_request("الملف فارغ"));
    }
    if file.bytes.len() > config::max_upload_bytes() {
        return Err(AppError::bad_request("حجم الملف يتجاوز الحد المسموح (10 ميجابايت)"));
    }
    if !is_allowed_mime(&file.mime_type) {
        return Err(AppError::bad_request("نوع الملف غير مدعوم"));
    }
    Ok(())
}

/// Write the bytes to disk and describe them. Plain text also yields
/// content text and keywords.
async fn store_file(
    storage: &LocalDiskStore,
    file: &UploadedFile,
) -> Result<(StoredFile, DocumentContent), AppError> {
    let extension = file_extension(&file.original_name);
    let key = storage_key(&extension);
    storage.put(&key, &file.bytes).await?;

    let stored = StoredFile {
        path: storage.root().join(&key).to_string_lossy().into_owned(),
        filename: key,
        original_name: file.original_name.clone(),
        size: file.bytes.len() as i64,
        mime_type: file.mime_type.clone(),
        extension,
        checksum: checksum(&file.bytes),
        pages: None,
    };

    let content = if file.mime_type == "text/plain" {
        let text = String::from_utf8_lossy(&file.bytes).into_owned();
        DocumentContent {
            keywords: extract_keywords(&text, MAX_KEYWORDS),
            language: detect_language(&text).to_string(),
            text: Some(text),
            summary: None,
        }
    } else {
        DocumentContent::default()
    };
    Ok((stored, content))
}

fn optional_id(raw: Option<&str>) -> Result<Option<Uuid>, AppError> {
    raw.map(parse_id).transpose()
}

/// Direct grants first, then visibility of the attached case.
async fn ensure_access(
    pool: &Pool<Postgres>,
    user: &CurrentUser,
    doc: &Document,
) -> Result<(), AppError> {
    if doc.grants_access(user.id, user.is_admin()) {
        return Ok(());
    }
    if let Some(case_id) = doc.case_id {
        if let Some(case) = repo::case::find_by_id(pool, case_id).await? {
            if can_view_case(user, &case) {
                return Ok(());
            }
        }
    }
    Err(AppError::forbidden("غير مصرح لك بالوصول إلى هذا المستند"))
}

async fn load_document(pool: &Pool<Postgres>, id: Uuid) -> Result<Document, AppError> {
    repo::document::find_by_id(pool, id)
        .await?
        .filter(|d| d.status != "deleted")
        .ok_or_else(|| AppError::not_found("المستند غير موجود"))
}

/// GET /api/documents
#[utoipa::path(
    get,
    path = "/api/documents",
    params(DocumentListParams),
    responses(
        (status = 200, description = "Paginated active documents the caller may access", body = PaginatedResponse<DocumentResponse>)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn list_documents(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<DocumentListParams>,
) -> Result<Json<PaginatedResponse<DocumentResponse>>, AppError> {
    if let Some(t) = params.document_type.as_deref() {
        ensure_choice("type", t, DOCUMENT_TYPES)?;
    }
    let (page, limit) = normalize_pagination(params.page, params.limit, 10);
    let filter = DocumentFilter {
        document_type: params.document_type.as_deref(),
        case_id: params.case_id,
        q: params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        ..DocumentFilter::default()
    };
    let (rows, total) =
        repo::document::list(&pool, &user, &filter, page_offset(page, limit), limit).await?;

    let items = rows
        .into_iter()
        .map(|d| DocumentResponse::from(d).without_text())
        .collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}

/// POST /api/documents
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body(content_type = "multipart/form-data", description = "`file` plus title, type, category, description, case_id, judgment_id, confidentiality_level and comma separated tags"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing file, too large or unsupported type", body = AppError),
        (status = 404, description = "Case or judgment not found", body = AppError),
        (status = 422, description = "Unknown type or confidentiality level", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn upload_document(
    State(pool): State<Pool<Postgres>>,
    State(storage): State<Arc<LocalDiskStore>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let (file, fields) = read_upload(multipart).await?;
    let file = file.ok_or_else(|| AppError::bad_request("لم يتم رفع أي ملف"))?;
    check_file(&file)?;

    let (Some(title), Some(document_type), Some(category)) = (
        fields.title.as_deref(),
        fields.document_type.as_deref(),
        fields.category.as_deref(),
    ) else {
        return Err(AppError::bad_request("العنوان والنوع والتصنيف مطلوبة"));
    };
    if title.chars().count() > 200 {
        return Err(AppError::bad_request("عنوان المستند لا يتجاوز 200 حرف"));
    }
    if fields.description.as_deref().is_some_and(|d| d.chars().count() > 500) {
        return Err(AppError::bad_request("وصف المستند لا يتجاوز 500 حرف"));
    }
    ensure_choice("type", document_type, DOCUMENT_TYPES)?;
    let confidentiality = fields.confidentiality_level.as_deref().unwrap_or("internal");
    ensure_choice("confidentiality_level", confidentiality, DOCUMENT_CONFIDENTIALITY_LEVELS)?;

    let case_id = optional_id(fields.case_id.as_deref())?;
    if let Some(case_id) = case_id {
        if !repo::case::exists(&pool, case_id).await? {
            return Err(AppError::not_found("القضية غير موجودة"));
        }
    }
    let judgment_id = optional_id(fields.judgment_id.as_deref())?;
    if let Some(judgment_id) = judgment_id {
        if repo::judgment::find_by_id(&pool, judgment_id).await?.is_none() {
            return Err(AppError::not_found("الحكم غير موجود"));
        }
    }

    let (stored, content) = store_file(&storage, &file).await?;
    let versions = vec![DocumentVersion {
        version: 1,
        filename: stored.filename.clone(),
        path: stored.path.clone(),
        uploaded_by: user.id,
        uploaded_at: Utc::now(),
        changes: None,
        is_active: true,
    }];
    let tags = fields.tags.as_deref().map(parse_tags).unwrap_or_default();

    let created = repo::document::create(
        &pool,
        NewDocument {
            title,
            description: fields.description.as_deref(),
            document_type,
            category,
            subcategory: fields.subcategory.as_deref(),
            case_id,
            judgment_id,
            court_id: user.court_id,
            file: &stored,
            content: &content,
            confidentiality_level: confidentiality,
            tags: &tags,
            versions: &versions,
            uploaded_by: user.id,
        },
    )
    .await;

    let document = match created {
        Ok(d) => d,
        Err(e) => {
            // The row never landed; do not leave the file behind.
            let _ = storage.delete(&stored.filename).await;
            return Err(e);
        }
    };
    sync_document(&search, &document).await;

    tracing::info!(
        document_id = %document.id,
        size = document.file.size,
        mime = %document.file.mime_type,
        "document uploaded"
    );
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// GET /api/documents/{id}
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "Document metadata", body = DocumentResponse),
        (status = 403, description = "No access", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn get_document(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, AppError> {
    let id = parse_id(&id)?;
    let document = load_document(&pool, id).await?;
    ensure_access(&pool, &user, &document).await?;

    repo::document::log_view(&pool, id, user.id).await?;
    let document = load_document(&pool, id).await?;
    Ok(Json(DocumentResponse::from(document)))
}

/// GET /api/documents/{id}/download
#[utoipa::path(
    get,
    path = "/api/documents/{id}/download",
    params(("id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "File bytes with the original content type", content_type = "application/octet-stream"),
        (status = 403, description = "No access", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 410, description = "Expired or archived", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn download_document(
    State(pool): State<Pool<Postgres>>,
    State(storage): State<Arc<LocalDiskStore>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let document = load_document(&pool, id).await?;
    ensure_access(&pool, &user, &document).await?;
    if !document.can_download(Utc::now()) {
        return Err(AppError::gone("المستند غير متاح للتنزيل"));
    }

    let bytes = storage.get(&document.file.filename).await?;
    repo::document::log_view(&pool, id, user.id).await?;

    let disposition = format!("attachment; filename=\"{}\"", document.file.filename);
    Ok((
        [
            (header::CONTENT_TYPE, document.file.mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/documents/{id}/versions
#[utoipa::path(
    post,
    path = "/api/documents/{id}/versions",
    params(("id" = String, Path, description = "Document UUID")),
    request_body(content_type = "multipart/form-data", description = "`file` plus an optional `changes` note"),
    responses(
        (status = 201, description = "New version stored", body = DocumentResponse),
        (status = 400, description = "Missing file, too large or unsupported type", body = AppError),
        (status = 403, description = "No edit access", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn upload_version(
    State(pool): State<Pool<Postgres>>,
    State(storage): State<Arc<LocalDiskStore>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let id = parse_id(&id)?;
    let document = load_document(&pool, id).await?;
    if !document.can_edit(user.id, user.is_admin()) {
        return Err(AppError::forbidden("غير مصرح لك بتعديل هذا المستند"));
    }

    let (file, fields) = read_upload(multipart).await?;
    let file = file.ok_or_else(|| AppError::bad_request("لم يتم رفع أي ملف"))?;
    check_file(&file)?;

    let (stored, content) = store_file(&storage, &file).await?;
    let mut versions = document.versions;
    for v in versions.iter_mut() {
        v.is_active = false;
    }
    versions.push(DocumentVersion {
        version: versions.len() as i32 + 1,
        filename: stored.filename.clone(),
        path: stored.path.clone(),
        uploaded_by: user.id,
        uploaded_at: Utc::now(),
        changes: fields.changes,
        is_active: true,
    });

    let updated = repo::document::replace_file(&pool, id, &stored, &content, &versions)
        .await?
        .ok_or_else(|| AppError::not_found("المستند غير موجود"))?;
    sync_document(&search, &updated).await;

    tracing::info!(document_id = %id, version = versions.len(), "document version uploaded");
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(updated))))
}

/// Only the uploader or an admin manages explicit grants.
fn ensure_owner(user: &CurrentUser, document: &Document) -> Result<(), AppError> {
    if user.is_admin() || document.uploaded_by == user.id {
        Ok(())
    } else {
        Err(AppError::forbidden("غير مصرح لك بإدارة صلاحيات هذا المستند"))
    }
}

/// POST /api/documents/{id}/permissions
#[utoipa::path(
    post,
    path = "/api/documents/{id}/permissions",
    params(("id" = String, Path, description = "Document UUID")),
    request_body = GrantAccessRequest,
    responses(
        (status = 200, description = "Grant stored", body = DocumentResponse),
        (status = 403, description = "Not the uploader or an admin", body = AppError),
        (status = 404, description = "Document or user not found", body = AppError),
        (status = 422, description = "Unknown access level", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn grant_access(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<GrantAccessRequest>,
) -> Result<Json<DocumentResponse>, AppError> {
    let id = parse_id(&id)?;
    ensure_choice("access", &body.access, ACCESS_LEVELS)?;
    let document = load_document(&pool, id).await?;
    ensure_owner(&user, &document)?;
    if repo::user::find_by_id(&pool, body.user_id).await?.is_none() {
        return Err(AppError::not_found("المستخدم غير موجود"));
    }

    let updated = repo::document::set_grant(&pool, id, body.user_id, &body.access)
        .await?
        .ok_or_else(|| AppError::not_found("المستند غير موجود"))?;
    tracing::info!(document_id = %id, grantee = %body.user_id, access = %body.access, "document access granted");
    Ok(Json(DocumentResponse::from(updated).without_text()))
}

/// DELETE /api/documents/{id}/permissions/{user_id}
#[utoipa::path(
    delete,
    path = "/api/documents/{id}/permissions/{user_id}",
    params(
        ("id" = String, Path, description = "Document UUID"),
        ("user_id" = String, Path, description = "Grantee UUID")
    ),
    responses(
        (status = 200, description = "Grant removed", body = DocumentResponse),
        (status = 403, description = "Not the uploader or an admin", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn revoke_access(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path((id, grantee)): Path<(String, String)>,
) -> Result<Json<DocumentResponse>, AppError> {
    let id = parse_id(&id)?;
    let grantee = parse_id(&grantee)?;
    let document = load_document(&pool, id).await?;
    ensure_owner(&user, &document)?;

    let updated = repo::document::revoke_grant(&pool, id, grantee)
        .await?
        .ok_or_else(|| AppError::not_found("المستند غير موجود"))?;
    tracing::info!(document_id = %id, %grantee, "document access revoked");
    Ok(Json(DocumentResponse::from(updated).without_text()))
}

/// DELETE /api/documents/{id}
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    params(("id" = String, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "Document marked deleted", body = MessageResponse),
        (status = 403, description = "No delete access", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn delete_document(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    let document = load_document(&pool, id).await?;
    if !document.can_delete(user.id, user.is_admin()) {
        return Err(AppError::forbidden("غير مصرح لك بحذف هذا المستند"));
    }

    repo::document::mark_deleted(&pool, id).await?;
    sync_removal(&search, id).await;
    tracing::info!(document_id = %id, user_id = %user.id, "document deleted");
    Ok(Json(MessageResponse::new("تم حذف المستند بنجاح")))
}
