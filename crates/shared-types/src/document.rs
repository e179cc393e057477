use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::RefSummary;

// ── Validation constants ────────────────────────────────────────────

pub const DOCUMENT_TYPES: &[&str] = &[
    "petition",
    "response",
    "evidence",
    "contract",
    "certificate",
    "expert_report",
    "witness_testimony",
    "correspondence",
    "court_order",
    "judgment",
    "appeal",
    "execution_order",
    "other",
];

pub const DOCUMENT_CONFIDENTIALITY_LEVELS: &[&str] =
    &["public", "internal", "confidential", "restricted"];

pub const DOCUMENT_STATUSES: &[&str] = &["active", "archived", "deleted", "expired"];
pub const PROCESSING_STATUSES: &[&str] = &["uploaded", "processing", "processed", "failed"];
pub const ACCESS_LEVELS: &[&str] = &["view", "edit", "delete"];
pub const CONTENT_LANGUAGES: &[&str] = &["ar", "en", "mixed"];

/// Accepted upload MIME types.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
    "text/plain",
];

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// Human readable size: B, KB, MB or GB with one decimal.
pub fn file_size_display(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes <= 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

// ── Embedded data ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub mime_type: String,
    pub extension: String,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_content_language")]
    pub language: String,
}

impl Default for DocumentContent {
    fn default() -> Self {
        Self {
            text: None,
            summary: None,
            keywords: vec![],
            language: default_content_language(),
        }
    }
}

fn default_content_language() -> String {
    "ar".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccessGrant {
    pub user_id: Uuid,
    pub access: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ViewEntry {
    pub user_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentVersion {
    pub version: i32,
    pub filename: String,
    pub path: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentSignature {
    pub user_id: Uuid,
    pub signed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentNote {
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// ── DB row struct ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub document_type: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub case_id: Option<Uuid>,
    pub judgment_id: Option<Uuid>,
    pub court_id: Option<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub file: StoredFile,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub content: DocumentContent,
    pub confidentiality_level: String,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub permissions: Vec<AccessGrant>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub view_history: Vec<ViewEntry>,
    pub processing_status: String,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub versions: Vec<DocumentVersion>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub signatures: Vec<DocumentSignature>,
    pub tags: Vec<String>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub notes: Vec<DocumentNote>,
    pub related_documents: Vec<Uuid>,
    pub uploaded_at: DateTime<Utc>,
    pub last_viewed: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub archive_date: Option<DateTime<Utc>>,
    pub status: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub uploader_name: Option<String>,
    pub case_number: Option<String>,
}

impl Document {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|d| d < now)
    }

    pub fn can_download(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && !self.is_expired(now)
    }

    /// Access level granted to `user_id` by an explicit entry.
    pub fn granted(&self, user_id: Uuid) -> Option<&str> {
        self.permissions
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.access.as_str())
    }

    /// New versions: admin, uploader, or an `edit`/`delete` grant.
    pub fn can_edit(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin
            || self.uploaded_by == user_id
            || matches!(self.granted(user_id), Some("edit" | "delete"))
    }

    /// Soft delete: admin, uploader, or a `delete` grant.
    pub fn can_delete(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.uploaded_by == user_id || self.granted(user_id) == Some("delete")
    }

    /// Direct grants: admin, uploader, explicit permission entry or a
    /// public document. Case-derived access is resolved by the caller.
    pub fn grants_access(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin
            || self.uploaded_by == user_id
            || self.confidentiality_level == "public"
            || self.permissions.iter().any(|p| p.user_id == user_id)
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub document_type: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<RefSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_id: Option<String>,
    pub file: StoredFile,
    pub content: DocumentContent,
    pub confidentiality_level: String,
    pub processing_status: String,
    pub versions: Vec<DocumentVersion>,
    pub tags: Vec<String>,
    pub uploaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    pub status: String,
    pub uploaded_by: RefSummary,
    pub permissions: Vec<AccessGrant>,
    pub view_count: usize,
    pub file_size_display: String,
    pub is_expired: bool,
    pub can_download: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Document> for DocumentResponse {
    fn from(d: Document) -> Self {
        let now = Utc::now();
        let is_expired = d.is_expired(now);
        let can_download = d.can_download(now);
        Self {
            id: d.id.to_string(),
            title: d.title,
            description: d.description,
            document_type: d.document_type,
            category: d.category,
            subcategory: d.subcategory,
            case: d.case_id.map(|id| RefSummary {
                id: id.to_string(),
                name: d.case_number.unwrap_or_default(),
            }),
            judgment_id: d.judgment_id.map(|id| id.to_string()),
            court_id: d.court_id.map(|id| id.to_string()),
            file_size_display: file_size_display(d.file.size),
            file: d.file,
            content: d.content,
            confidentiality_level: d.confidentiality_level,
            processing_status: d.processing_status,
            versions: d.versions,
            tags: d.tags,
            uploaded_at: d.uploaded_at.to_rfc3339(),
            last_viewed: d.last_viewed.map(|t| t.to_rfc3339()),
            expiry_date: d.expiry_date.map(|t| t.to_rfc3339()),
            status: d.status,
            uploaded_by: RefSummary {
                id: d.uploaded_by.to_string(),
                name: d.uploader_name.unwrap_or_default(),
            },
            permissions: d.permissions,
            view_count: d.view_history.len(),
            is_expired,
            can_download,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

impl DocumentResponse {
    /// List view: the extracted text stays out.
    pub fn without_text(mut self) -> Self {
        self.content.text = None;
        self
    }
}

/// Body of `POST /api/documents/{id}/permissions`. Replaces any earlier
/// grant for the same user.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GrantAccessRequest {
    pub user_id: Uuid,
    /// One of `view`, `edit`, `delete`.
    pub access: String,
}

/// Text fields of a multipart upload, collected before the row is built.
#[derive(Debug, Clone, Default)]
pub struct DocumentUploadFields {
    pub title: Option<String>,
    pub document_type: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub case_id: Option<String>,
    pub judgment_id: Option<String>,
    pub confidentiality_level: Option<String>,
    pub tags: Option<String>,
    pub changes: Option<String>,
}

/// Split a comma separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Query parameters for the document list.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DocumentListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub case_id: Option<Uuid>,
    pub search: Option<String>,
}
