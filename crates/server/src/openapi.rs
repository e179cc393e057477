use axum::{extract::DefaultBodyLimit, middleware, Router};
use shared_types::{
    // Errors & common
    AppError, AppErrorKind, CountEntry, MessageResponse, PaginationMeta, RefSummary,
    // Users & auth
    AdminUpdateUserRequest, AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse,
    Permission, RegisterRequest, UpdateProfileRequest, UserPreferences, UserProfile,
    UserResponse, UserRole,
    // Courts
    CourtContact, CourtDetailResponse, CourtResponse, CourtSettings, CourtStatistics,
    CreateCourtRequest, DayHours, UpdateCourtRequest, WorkingHours,
    // Cases
    AddSessionRequest, ArchivalInfo, CaseAmounts, CaseDetailResponse, CaseEventResponse,
    CaseLegalBasis, CaseParties, CaseResponse, CaseSession, CaseStatistics, ContactInfo,
    CreateCaseRequest, Expert, Party, PartyLawyer, RelatedCase, UpdateCaseRequest,
    UpdateCaseStatusRequest, Witness,
    // Judgments
    AddAppealRequest, Appeal, Classification, CreateJudgmentRequest, ExecutionInfo,
    JudgmentContent, JudgmentCosts, JudgmentLegalBasis, JudgmentParties, JudgmentParty,
    JudgmentResponse, JudgmentSignature, JudgmentStatistics, JudgmentStatisticsReport,
    PanelMember, PublishJudgmentRequest, ReviewEntry, UpdateJudgmentRequest,
    // Documents
    AccessGrant, DocumentContent, DocumentNote, DocumentResponse, DocumentSignature,
    DocumentVersion, GrantAccessRequest, StoredFile, ViewEntry,
    // Analytics & search
    DashboardResponse, SearchResponse, SummaryCounts,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use crate::config::{feature_flags, rate_limit_config};
use crate::db::AppState;
use crate::health;
use crate::rate_limit::RateLimitState;
use crate::rest;
use crate::telemetry::OtelTraceLayer;

/// Registers the `bearer` JWT scheme referenced by the secured paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        // Auth
        rest::auth::register,
        rest::auth::login,
        rest::auth::me,
        rest::auth::logout,
        rest::auth::update_profile,
        rest::auth::change_password,
        // Users
        rest::user::list_users,
        rest::user::get_user,
        rest::user::update_user,
        // Courts
        rest::court::list_courts,
        rest::court::get_court,
        rest::court::create_court,
        rest::court::update_court,
        // Cases
        rest::case::list_cases,
        rest::case::create_case,
        rest::case::get_case,
        rest::case::update_case,
        rest::case::delete_case,
        rest::case::add_session,
        rest::case::update_case_status,
        rest::case::case_statistics,
        // Judgments
        rest::judgment::list_judgments,
        rest::judgment::get_judgment,
        rest::judgment::create_judgment,
        rest::judgment::update_judgment,
        rest::judgment::delete_judgment,
        rest::judgment::publish_judgment,
        rest::judgment::add_appeal,
        rest::judgment::search_judgments,
        rest::judgment::judgment_statistics,
        // Documents
        rest::document::list_documents,
        rest::document::upload_document,
        rest::document::get_document,
        rest::document::download_document,
        rest::document::upload_version,
        rest::document::grant_access,
        rest::document::revoke_access,
        rest::document::delete_document,
        // Analytics & search
        rest::analytics::dashboard,
        rest::search::search,
        rest::search::public_search,
    ),
    components(schemas(
        AppError, AppErrorKind, CountEntry, MessageResponse, PaginationMeta, RefSummary,
        AdminUpdateUserRequest, AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse,
        Permission, RegisterRequest, UpdateProfileRequest, UserPreferences, UserProfile,
        UserResponse, UserRole,
        CourtContact, CourtDetailResponse, CourtResponse, CourtSettings, CourtStatistics,
        CreateCourtRequest, DayHours, UpdateCourtRequest, WorkingHours,
        AddSessionRequest, ArchivalInfo, CaseAmounts, CaseDetailResponse, CaseEventResponse,
        CaseLegalBasis, CaseParties, CaseResponse, CaseSession, CaseStatistics, ContactInfo,
        CreateCaseRequest, Expert, Party, PartyLawyer, RelatedCase, UpdateCaseRequest,
        UpdateCaseStatusRequest, Witness,
        AddAppealRequest, Appeal, Classification, CreateJudgmentRequest, ExecutionInfo,
        JudgmentContent, JudgmentCosts, JudgmentLegalBasis, JudgmentParties, JudgmentParty,
        JudgmentResponse, JudgmentSignature, JudgmentStatistics, JudgmentStatisticsReport,
        PanelMember, PublishJudgmentRequest, ReviewEntry, UpdateJudgmentRequest,
        AccessGrant, DocumentContent, DocumentNote, DocumentResponse, DocumentSignature,
        DocumentVersion, GrantAccessRequest, StoredFile, ViewEntry,
        DashboardResponse, SearchResponse, SummaryCounts,
        health::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and the caller's own account"),
        (name = "users", description = "User administration"),
        (name = "courts", description = "Court registry"),
        (name = "cases", description = "Case files, sessions and timeline"),
        (name = "judgments", description = "Judgments, publication and appeals"),
        (name = "documents", description = "Document upload, versions and download"),
        (name = "analytics", description = "Dashboard aggregates"),
        (name = "search", description = "Cross-entity and public search"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Court Case Management API",
        description = "نظام إدارة القضايا والأحكام",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// The REST API bound to `state`, plus the docs UI at `/docs`.
///
/// Layer order, outermost first: rate limit, auth, OTel span. The span
/// layer sits inside auth so it sees the resolved user.
pub fn api_router(state: AppState) -> Router {
    let limiter = feature_flags()
        .rate_limit
        .then(|| RateLimitState::from_config(rate_limit_config()));
    api_router_with_limiter(state, limiter)
}

/// Same stack with an explicit limiter, or none.
pub fn api_router_with_limiter(state: AppState, limiter: Option<RateLimitState>) -> Router {
    let flags = feature_flags();

    let mut api = rest::api_router();
    if flags.telemetry {
        api = api.layer(OtelTraceLayer);
    }
    api = api.layer(middleware::from_fn_with_state(
        state.clone(),
        crate::auth::middleware::auth_middleware,
    ));
    if let Some(limiter) = limiter {
        api = api.layer(middleware::from_fn_with_state(
            limiter,
            crate::rate_limit::rate_limit_middleware,
        ));
    }

    // Multipart framing on top of the largest accepted file.
    let body_limit = crate::config::max_upload_bytes() + 1024 * 1024;

    api.fallback(rest::route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
