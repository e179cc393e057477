use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, page_offset, validated_query, AppError, CaseResponse,
    DocumentResponse, JudgmentResponse, PaginatedResponse, SearchParams, SearchResponse,
    TextSearchParams, ALL_TYPES_LIMIT, SEARCH_TYPES,
};

use crate::auth::{AuthRequired, CurrentUser};
use crate::config::feature_flags;
use crate::error_convert::ensure_choice;
use crate::repo;
use crate::repo::case::{sort_column, sort_direction, CaseFilter};
use crate::repo::document::DocumentFilter;
use crate::repo::judgment::JudgmentFilter;
use crate::scope::Scope;
use crate::search::{find, SearchIndex, SearchKind, MAX_INDEX_HITS};
use crate::text::highlight_matches;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

fn query_or_400(q: Option<&str>) -> Result<String, AppError> {
    validated_query(q).ok_or_else(|| AppError::bad_request("يجب أن يكون نص البحث حرفين على الأقل"))
}

/// Per-entity cap: the requested limit, or the small cap when all types
/// are searched together.
fn per_type_limit(search_type: &str, limit: Option<i64>) -> i64 {
    if search_type == "all" {
        ALL_TYPES_LIMIT
    } else {
        limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

/// Documents ranked by the full-text index, restricted to what the user may
/// see and to the upload window of `filter`.
async fn indexed_documents(
    pool: &Pool<Postgres>,
    search: &Arc<SearchIndex>,
    user: &CurrentUser,
    filter: &DocumentFilter<'_>,
    limit: i64,
) -> Result<Vec<shared_types::Document>, AppError> {
    let q = filter.q.unwrap_or_default();
    let ids = find(search, SearchKind::Document, q, MAX_INDEX_HITS).await;
    let visible = repo::document::find_many_visible(pool, user, &ids).await?;
    Ok(visible
        .into_iter()
        .filter(|d| filter.date_from.map_or(true, |from| d.uploaded_at >= from))
        .filter(|d| filter.date_to.map_or(true, |to| d.uploaded_at <= to))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect())
}

/// GET /api/search
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matches per entity type within the caller's scope", body = SearchResponse),
        (status = 400, description = "Query shorter than two characters", body = AppError),
        (status = 422, description = "Unknown search type", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "search"
)]
pub async fn search(
    State(pool): State<Pool<Postgres>>,
    State(search): State<Arc<SearchIndex>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let q = query_or_400(params.q.as_deref())?;
    let search_type = params.search_type.as_deref().unwrap_or("all");
    ensure_choice("type", search_type, SEARCH_TYPES)?;
    let limit = per_type_limit(search_type, params.limit);
    let wants = |t: &str| search_type == "all" || search_type == t;

    let mut cases = Vec::new();
    if wants("cases") {
        let filter = CaseFilter {
            court: params.court,
            q: Some(&q),
            date_from: params.date_from,
            date_to: params.date_to,
            ..CaseFilter::default()
        };
        let order = (sort_column(None), sort_direction(None));
        let (rows, _) =
            repo::case::list(&pool, Scope::for_cases(&user), &filter, order, 0, limit).await?;
        cases = rows.into_iter().map(CaseResponse::from).collect();
    }

    let mut judgments = Vec::new();
    if wants("judgments") {
        let filter = JudgmentFilter {
            court: params.court,
            q: Some(&q),
            date_from: params.date_from,
            date_to: params.date_to,
            ..JudgmentFilter::default()
        };
        let (rows, _) =
            repo::judgment::list(&pool, Scope::for_judgments(&user), &filter, 0, limit).await?;
        judgments = rows
            .into_iter()
            .map(|j| JudgmentResponse::from(j).without_content())
            .collect();
    }

    let mut documents = Vec::new();
    if wants("documents") {
        let filter = DocumentFilter {
            q: Some(&q),
            date_from: params.date_from,
            date_to: params.date_to,
            ..DocumentFilter::default()
        };
        let rows = if feature_flags().search_index {
            indexed_documents(&pool, &search, &user, &filter, limit).await?
        } else {
            repo::document::list(&pool, &user, &filter, 0, limit).await?.0
        };
        documents = rows
            .into_iter()
            .map(|d| DocumentResponse::from(d).without_text())
            .collect();
    }

    tracing::debug!(
        user_id = %user.id,
        search_type,
        cases = cases.len(),
        judgments = judgments.len(),
        documents = documents.len(),
        "search"
    );
    Ok(Json(SearchResponse::new(cases, judgments, documents)))
}

/// GET /api/search/public
#[utoipa::path(
    get,
    path = "/api/search/public",
    params(TextSearchParams),
    responses(
        (status = 200, description = "Published judgments with matches marked in the summary", body = PaginatedResponse<JudgmentResponse>),
        (status = 400, description = "Query shorter than two characters", body = AppError)
    ),
    tag = "search"
)]
pub async fn public_search(
    State(pool): State<Pool<Postgres>>,
    Query(params): Query<TextSearchParams>,
) -> Result<Json<PaginatedResponse<JudgmentResponse>>, AppError> {
    let q = query_or_400(params.q.as_deref())?;
    let (page, limit) = normalize_pagination(params.page, params.limit, DEFAULT_LIMIT);
    let (rows, total) =
        repo::judgment::list_public(&pool, &q, page_offset(page, limit), limit).await?;

    let terms: Vec<&str> = q.split_whitespace().collect();
    let items = rows
        .into_iter()
        .map(|j| {
            let mut resp = JudgmentResponse::from(j).without_content().public_view();
            resp.summary = highlight_matches(&resp.summary, &terms);
            resp
        })
        .collect();
    Ok(Json(PaginatedResponse::new(items, page, limit, total)))
}
