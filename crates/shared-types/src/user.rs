use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

// ── Roles & permissions ─────────────────────────────────────────────

/// Account role. Unknown values fall back to `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Judge,
    Clerk,
    Lawyer,
    #[default]
    User,
}

pub const USER_ROLES: &[&str] = &["admin", "judge", "clerk", "lawyer", "user"];

impl UserRole {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "judge" => UserRole::Judge,
            "clerk" => UserRole::Clerk,
            "lawyer" => UserRole::Lawyer,
            _ => UserRole::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Judge => "judge",
            UserRole::Clerk => "clerk",
            UserRole::Lawyer => "lawyer",
            UserRole::User => "user",
        }
    }

    /// Permissions granted by the role alone.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            UserRole::Admin => Permission::ALL,
            UserRole::Judge => &[
                CreateCase,
                EditCase,
                ViewCase,
                CreateJudgment,
                EditJudgment,
                ViewJudgment,
                ViewAnalytics,
                ExportData,
            ],
            UserRole::Clerk => &[CreateCase, EditCase, ViewCase, ViewJudgment, ExportData],
            UserRole::Lawyer | UserRole::User => &[ViewCase, ViewJudgment],
        }
    }
}

/// Fine-grained capability checked by protected routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateCase,
    EditCase,
    DeleteCase,
    ViewCase,
    CreateJudgment,
    EditJudgment,
    DeleteJudgment,
    ViewJudgment,
    ManageUsers,
    ViewAnalytics,
    ManageCourts,
    ExportData,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::CreateCase,
        Permission::EditCase,
        Permission::DeleteCase,
        Permission::ViewCase,
        Permission::CreateJudgment,
        Permission::EditJudgment,
        Permission::DeleteJudgment,
        Permission::ViewJudgment,
        Permission::ManageUsers,
        Permission::ViewAnalytics,
        Permission::ManageCourts,
        Permission::ExportData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateCase => "create_case",
            Permission::EditCase => "edit_case",
            Permission::DeleteCase => "delete_case",
            Permission::ViewCase => "view_case",
            Permission::CreateJudgment => "create_judgment",
            Permission::EditJudgment => "edit_judgment",
            Permission::DeleteJudgment => "delete_judgment",
            Permission::ViewJudgment => "view_judgment",
            Permission::ManageUsers => "manage_users",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageCourts => "manage_courts",
            Permission::ExportData => "export_data",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == s)
    }
}

/// Role permissions plus any extra grants, deduplicated, role grants first.
pub fn effective_permissions(role: UserRole, extra: &[String]) -> Vec<Permission> {
    let mut perms: Vec<Permission> = role.permissions().to_vec();
    for name in extra {
        if let Some(p) = Permission::parse(name) {
            if !perms.contains(&p) {
                perms.push(p);
            }
        }
    }
    perms
}

// ── Embedded profile data ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default)]
    pub specialization: Vec<String>,
}

pub const LANGUAGES: &[&str] = &["ar", "en"];
pub const DATE_FORMATS: &[&str] = &["hijri", "gregorian"];
pub const THEMES: &[&str] = &["light", "dark", "auto"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserPreferences {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_true")]
    pub notify_email: bool,
    #[serde(default = "default_true")]
    pub notify_in_app: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            language: default_language(),
            date_format: default_date_format(),
            notify_email: true,
            notify_in_app: true,
            theme: default_theme(),
        }
    }
}

fn default_language() -> String {
    "ar".to_string()
}

fn default_date_format() -> String {
    "hijri".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_true() -> bool {
    true
}

// ── DB row struct ───────────────────────────────────────────────────

/// A user account row, including credential and lockout columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub court_id: Option<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub profile: UserProfile,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub preferences: UserPreferences,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        UserRole::from_str_or_default(&self.role)
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.map(|until| until > now).unwrap_or(false)
    }

    pub fn effective_permissions(&self) -> Vec<Permission> {
        effective_permissions(self.role(), &self.permissions)
    }
}

// ── API response types ──────────────────────────────────────────────

/// Public view of a user. Never carries credential columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_id: Option<String>,
    pub profile: UserProfile,
    pub preferences: UserPreferences,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.name,
            email: u.email,
            role: u.role,
            permissions: u.permissions,
            court_id: u.court_id.map(|c| c.to_string()),
            profile: u.profile,
            preferences: u.preferences,
            last_login: u.last_login.map(|d| d.to_rfc3339()),
            is_active: u.is_active,
            email_verified: u.email_verified,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
    pub permissions: Vec<Permission>,
}

/// Returned by `GET /api/auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MeResponse {
    pub user: UserResponse,
    pub permissions: Vec<Permission>,
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct RegisterRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 100, message = "الاسم مطلوب ولا يتجاوز 100 حرف"))
    )]
    pub name: String,
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "البريد الإلكتروني غير صالح"))
    )]
    pub email: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 6, message = "كلمة المرور يجب أن تكون 6 أحرف على الأقل"))
    )]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub court_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateProfileRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 100, message = "الاسم مطلوب ولا يتجاوز 100 حرف"))
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 6, message = "كلمة المرور يجب أن تكون 6 أحرف على الأقل"))
    )]
    pub new_password: String,
}

/// Admin-only account changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AdminUpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Query parameters for the user list.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct UserListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<String>,
    pub search: Option<String>,
}
