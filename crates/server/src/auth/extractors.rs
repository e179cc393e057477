use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::{AppError, Permission, User, UserRole};
use uuid::Uuid;

/// The authenticated account, resolved by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub court_id: Option<Uuid>,
    pub permissions: Vec<Permission>,
}

impl From<&User> for CurrentUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role(),
            court_id: u.court_id,
            permissions: u.effective_permissions(),
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Admins and judges always pass; anyone else needs at least one of
    /// the listed permissions.
    pub fn authorize(&self, any_of: &[Permission]) -> Result<(), AppError> {
        if matches!(self.role, UserRole::Admin | UserRole::Judge)
            || any_of.iter().any(|p| self.has_permission(*p))
        {
            Ok(())
        } else {
            Err(AppError::forbidden("ليس لديك صلاحية للقيام بهذا الإجراء"))
        }
    }

    pub fn require_role(&self, roles: &[UserRole]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "الدور {} غير مصرح له بالوصول إلى هذا المورد",
                self.role.as_str()
            )))
        }
    }
}

/// Why the middleware could not resolve a user for this request.
#[derive(Debug, Clone)]
pub struct AuthRejection(pub AppError);

/// Extractor that requires authentication. Returns 401 with the reason
/// the middleware recorded.
pub struct AuthRequired(pub CurrentUser);

impl<S: Send + Sync> FromRequestParts<S> for AuthRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(AuthRequired(user.clone()));
        }
        Err(parts
            .extensions
            .get::<AuthRejection>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| AppError::unauthorized("غير مصرح، لا يوجد رمز دخول")))
    }
}

/// Extractor that optionally extracts the current user. Never fails.
pub struct MaybeAuth(pub Option<CurrentUser>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuth(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
