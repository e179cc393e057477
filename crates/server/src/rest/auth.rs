use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, AuthResponse, ChangePasswordRequest, LoginRequest, MeResponse, MessageResponse,
    RegisterRequest, UpdateProfileRequest, UserResponse, UserRole, DATE_FORMATS, LANGUAGES,
    THEMES, USER_ROLES,
};

use crate::auth::jwt::{create_token, hash_token, validate_token};
use crate::auth::lockout::register_failure;
use crate::auth::middleware::bearer_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthRequired, MaybeAuth};
use crate::error_convert::{ensure_choice, ValidateRequest};
use crate::repo;
use crate::repo::user::NewUser;

const BAD_CREDENTIALS: &str = "بيانات الدخول غير صحيحة";

/// Roles anyone may pick when signing up; the rest need an admin.
const SELF_SERVICE_ROLES: &[UserRole] = &[UserRole::User, UserRole::Lawyer];

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Email already registered", body = AppError),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all, fields(email = %body.email))]
pub async fn register(
    State(pool): State<Pool<Postgres>>,
    MaybeAuth(caller): MaybeAuth,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    body.validate_request()?;

    let role = match body.role.as_deref() {
        Some(r) => {
            ensure_choice("role", r, USER_ROLES)?;
            UserRole::from_str_or_default(r)
        }
        None => UserRole::User,
    };
    let by_admin = caller.as_ref().is_some_and(|c| c.is_admin());
    if !SELF_SERVICE_ROLES.contains(&role) && !by_admin {
        return Err(AppError::forbidden("لا يمكن التسجيل بهذا الدور"));
    }

    if repo::user::find_by_email(&pool, &body.email).await?.is_some() {
        return Err(AppError::bad_request("المستخدم موجود بالفعل"));
    }
    if let Some(court_id) = body.court_id {
        if !repo::court::exists(&pool, court_id).await? {
            return Err(AppError::not_found("المحكمة غير موجودة"));
        }
    }

    let password_hash = hash_password(&body.password)?;
    let user = repo::user::create(
        &pool,
        NewUser {
            name: body.name.trim(),
            email: &body.email,
            password_hash: &password_hash,
            role: role.as_str(),
            court_id: body.court_id,
        },
    )
    .await?;

    let (token, _) = create_token(user.id, &user.email, &user.role)?;
    let permissions = user.effective_permissions();
    tracing::info!(user_id = %user.id, role = %user.role, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from(user),
            permissions,
        }),
    ))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Bad credentials, inactive or locked account", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip_all, fields(email = %body.email))]
pub async fn login(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::bad_request("البريد الإلكتروني وكلمة المرور مطلوبان"));
    }

    let user = repo::user::find_by_email(&pool, &body.email)
        .await?
        .ok_or_else(|| AppError::unauthorized(BAD_CREDENTIALS))?;

    if !user.is_active {
        return Err(AppError::unauthorized("الحساب غير مفعل"));
    }

    let now = Utc::now();
    if user.is_locked(now) {
        tracing::warn!(user_id = %user.id, "login attempt on locked account");
        return Err(AppError::unauthorized(
            "الحساب مقفل مؤقتاً بسبب محاولات دخول فاشلة متعددة، حاول لاحقاً",
        ));
    }

    if !verify_password(&body.password, &user.password_hash) {
        let failure = register_failure(user.login_attempts, user.lock_until, now);
        repo::user::record_failed_login(&pool, user.id, failure.attempts, failure.lock_until)
            .await?;
        tracing::warn!(user_id = %user.id, attempts = failure.attempts, "failed login");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    }

    let user = repo::user::record_successful_login(&pool, user.id).await?;
    let (token, _) = create_token(user.id, &user.email, &user.role)?;
    let permissions = user.effective_permissions();
    tracing::info!(user_id = %user.id, "login succeeded");

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
        permissions,
    }))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account", body = MeResponse),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(current): AuthRequired,
) -> Result<Json<MeResponse>, AppError> {
    let user = repo::user::find_by_id(&pool, current.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("المستخدم غير موجود"))?;
    let permissions = user.effective_permissions();
    Ok(Json(MeResponse {
        user: UserResponse::from(user),
        permissions,
    }))
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session token revoked", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(current): AuthRequired,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::unauthorized("غير مصرح، لا يوجد رمز دخول"))?;
    let claims = validate_token(&token)?;
    repo::user::revoke_token(&pool, &hash_token(&token), current.id, claims.expires_at()).await?;
    tracing::info!(user_id = %current.id, "session revoked");
    Ok(Json(MessageResponse::new("تم تسجيل الخروج بنجاح")))
}

/// PUT /api/auth/profile
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 422, description = "Validation failed", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn update_profile(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(current): AuthRequired,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    body.validate_request()?;
    if let Some(prefs) = &body.preferences {
        ensure_choice("language", &prefs.language, LANGUAGES)?;
        ensure_choice("date_format", &prefs.date_format, DATE_FORMATS)?;
        ensure_choice("theme", &prefs.theme, THEMES)?;
    }

    let user = repo::user::update_profile(
        &pool,
        current.id,
        body.name.as_deref().map(str::trim),
        body.profile.as_ref(),
        body.preferences.as_ref(),
    )
    .await?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/auth/change-password
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is wrong", body = AppError),
        (status = 422, description = "New password too short", body = AppError)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(current): AuthRequired,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    body.validate_request()?;
    let user = repo::user::find_by_id(&pool, current.id)
        .await?
        .ok_or_else(|| AppError::not_found("المستخدم غير موجود"))?;
    if !verify_password(&body.current_password, &user.password_hash) {
        return Err(AppError::bad_request("كلمة المرور الحالية غير صحيحة"));
    }
    let password_hash = hash_password(&body.new_password)?;
    repo::user::set_password(&pool, user.id, &password_hash).await?;
    tracing::info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse::new("تم تغيير كلمة المرور بنجاح")))
}
