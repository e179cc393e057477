use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::case::CaseResponse;
use crate::document::DocumentResponse;
use crate::judgment::JudgmentResponse;

pub const SEARCH_TYPES: &[&str] = &["all", "cases", "judgments", "documents"];
pub const MIN_QUERY_CHARS: usize = 2;
/// Per-entity cap when every entity type is searched at once.
pub const ALL_TYPES_LIMIT: i64 = 5;

/// Query parameters for the unified search.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub search_type: Option<String>,
    pub court: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// Query parameters for the public judgment search and full-text search.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct TextSearchParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Trimmed query text, or `None` when shorter than the minimum.
pub fn validated_query(q: Option<&str>) -> Option<String> {
    let q = q?.trim();
    (q.chars().count() >= MIN_QUERY_CHARS).then(|| q.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchResponse {
    pub cases: Vec<CaseResponse>,
    pub judgments: Vec<JudgmentResponse>,
    pub documents: Vec<DocumentResponse>,
    pub total: usize,
}

impl SearchResponse {
    pub fn new(
        cases: Vec<CaseResponse>,
        judgments: Vec<JudgmentResponse>,
        documents: Vec<DocumentResponse>,
    ) -> Self {
        let total = cases.len() + judgments.len() + documents.len();
        Self {
            cases,
            judgments,
            documents,
            total,
        }
    }
}
