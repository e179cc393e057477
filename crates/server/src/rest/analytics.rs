use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, DashboardParams, DashboardResponse, Permission};

use crate::auth::AuthRequired;
use crate::repo;

/// GET /api/analytics/dashboard
#[utoipa::path(
    get,
    path = "/api/analytics/dashboard",
    params(DashboardParams),
    responses(
        (status = 200, description = "Scoped totals, recent counts and breakdowns", body = DashboardResponse),
        (status = 403, description = "Missing view_analytics", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "analytics"
)]
pub async fn dashboard(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, AppError> {
    user.authorize(&[Permission::ViewAnalytics])?;
    let report = repo::analytics::dashboard(&pool, &user, params.days()).await?;
    Ok(Json(report))
}
