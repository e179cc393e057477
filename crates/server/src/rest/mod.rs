pub mod analytics;
pub mod auth;
pub mod case;
pub mod court;
pub mod document;
pub mod judgment;
pub mod search;
pub mod user;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_types::AppError;

use crate::db::AppState;

/// Build the combined REST API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(crate::health::health_check))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/auth/change-password", put(auth::change_password))
        // Users
        .route("/api/users", get(user::list_users))
        .route("/api/users/{id}", get(user::get_user).put(user::update_user))
        // Courts
        .route("/api/courts", get(court::list_courts).post(court::create_court))
        .route("/api/courts/{id}", get(court::get_court).put(court::update_court))
        // Cases
        .route("/api/cases/statistics", get(case::case_statistics))
        .route("/api/cases", get(case::list_cases).post(case::create_case))
        .route(
            "/api/cases/{id}",
            get(case::get_case).put(case::update_case).delete(case::delete_case),
        )
        .route("/api/cases/{id}/sessions", post(case::add_session))
        .route("/api/cases/{id}/status", put(case::update_case_status))
        // Judgments
        .route("/api/judgments/search", get(judgment::search_judgments))
        .route("/api/judgments/statistics", get(judgment::judgment_statistics))
        .route(
            "/api/judgments",
            get(judgment::list_judgments).post(judgment::create_judgment),
        )
        .route(
            "/api/judgments/{id}",
            get(judgment::get_judgment)
                .put(judgment::update_judgment)
                .delete(judgment::delete_judgment),
        )
        .route("/api/judgments/{id}/publish", post(judgment::publish_judgment))
        .route("/api/judgments/{id}/appeals", post(judgment::add_appeal))
        // Documents
        .route(
            "/api/documents",
            get(document::list_documents).post(document::upload_document),
        )
        .route(
            "/api/documents/{id}",
            get(document::get_document).delete(document::delete_document),
        )
        .route("/api/documents/{id}/download", get(document::download_document))
        .route("/api/documents/{id}/versions", post(document::upload_version))
        .route("/api/documents/{id}/permissions", post(document::grant_access))
        .route(
            "/api/documents/{id}/permissions/{user_id}",
            delete(document::revoke_access),
        )
        // Analytics & search
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .route("/api/search", get(search::search))
        .route("/api/search/public", get(search::public_search))
}

/// Fallback for unknown paths.
pub async fn route_not_found() -> AppError {
    AppError::not_found("المسار المطلوب غير موجود")
}
