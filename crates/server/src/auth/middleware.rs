use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use shared_types::AppError;
use sqlx::{Pool, Postgres};

use super::extractors::{AuthRejection, CurrentUser};
use super::jwt::{hash_token, validate_token};
use crate::repo;

/// Pull the raw token out of an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Permissive auth middleware.
///
/// Resolves the bearer token to an active user and inserts a
/// `CurrentUser` into the request extensions. When that fails it inserts
/// an `AuthRejection` carrying the reason instead.
///
/// Does NOT reject requests; `AuthRequired` turns the rejection into a 401.
pub async fn auth_middleware(
    State(pool): State<Pool<Postgres>>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_user(&pool, req.headers()).await {
        Ok(Some(user)) => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            req.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(rejection) => {
            req.extensions_mut().insert(AuthRejection(rejection));
        }
    }
    next.run(req).await
}

async fn resolve_user(
    pool: &Pool<Postgres>,
    headers: &axum::http::HeaderMap,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let claims = validate_token(&token)?;

    if repo::user::is_token_revoked(pool, &hash_token(&token)).await? {
        return Err(AppError::unauthorized("تم تسجيل الخروج من هذه الجلسة"));
    }

    let user = repo::user::find_by_id(pool, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("المستخدم غير موجود"))?;

    if !user.is_active {
        return Err(AppError::unauthorized("الحساب غير مفعل"));
    }

    Ok(Some(CurrentUser::from(&user)))
}
