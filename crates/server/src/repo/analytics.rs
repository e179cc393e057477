use chrono::{Duration, Utc};
use shared_types::{AppError, DashboardResponse, SummaryCounts};
use sqlx::{Pool, Postgres};

use super::{case, document, judgment};
use crate::auth::CurrentUser;
use crate::scope::Scope;

/// Dashboard aggregates. Cases and judgments follow their list scopes and
/// documents follow the document access rule.
pub async fn dashboard(
    pool: &Pool<Postgres>,
    user: &CurrentUser,
    days: i64,
) -> Result<DashboardResponse, AppError> {
    let since = Some(Utc::now() - Duration::days(days));
    let case_scope = Scope::for_cases(user);
    let judgment_scope = Scope::for_judgments(user);

    let summary = SummaryCounts {
        total_cases: case::count(pool, case_scope, None).await?,
        recent_cases: case::count(pool, case_scope, since).await?,
        total_judgments: judgment::count(pool, judgment_scope, None).await?,
        recent_judgments: judgment::count(pool, judgment_scope, since).await?,
        total_documents: document::count(pool, user, None).await?,
        recent_documents: document::count(pool, user, since).await?,
    };

    Ok(DashboardResponse {
        date_range: days,
        summary,
        cases_by_status: case::count_by(pool, case_scope, "status", None).await?,
        cases_by_type: case::count_by(pool, case_scope, "case_type", None).await?,
        judgments_by_decision: judgment::count_by(pool, judgment_scope, "decision", None).await?,
        judgments_by_month: judgment::count_by_month(pool, judgment_scope).await?,
    })
}
