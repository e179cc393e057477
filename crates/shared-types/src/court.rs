use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

// ── Validation constants ────────────────────────────────────────────

pub const COURT_TYPES: &[&str] = &[
    "supreme_court", "appeal_court", "general_court", "criminal_court",
    "commercial_court", "labor_court", "administrative_court", "family_court",
    "execution_court", "specialized_court",
];

pub const JURISDICTIONS: &[&str] = &[
    "civil", "criminal", "commercial", "administrative", "labor", "family",
    "execution", "mixed",
];

pub const COURT_STATUSES: &[&str] = &["active", "inactive", "suspended"];

pub const DEFAULT_CASE_NUMBER_FORMAT: &str = "YYYY/MM/####";
pub const DEFAULT_JUDGMENT_NUMBER_FORMAT: &str = "YYYY/####";

/// Expand a number format: `YYYY` becomes the year, `MM` the two-digit
/// month, and a run of `#` the sequence zero-padded to the run's width.
pub fn format_number(format: &str, now: DateTime<Utc>, seq: i64) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i..].starts_with(&['Y', 'Y', 'Y', 'Y']) {
            out.push_str(&format!("{:04}", now.year()));
            i += 4;
        } else if chars[i..].starts_with(&['M', 'M']) {
            out.push_str(&format!("{:02}", now.month()));
            i += 2;
        } else if chars[i] == '#' {
            let width = chars[i..].iter().take_while(|c| **c == '#').count();
            out.push_str(&format!("{:0width$}", seq, width = width));
            i += width;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

// ── Embedded data ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourtContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DayHours {
    pub start: String,
    pub end: String,
    pub is_working_day: bool,
}

impl DayHours {
    fn working() -> Self {
        Self {
            start: "08:00".to_string(),
            end: "15:00".to_string(),
            is_working_day: true,
        }
    }

    fn closed() -> Self {
        Self {
            start: "08:00".to_string(),
            end: "15:00".to_string(),
            is_working_day: false,
        }
    }
}

/// Weekly schedule; Sunday through Thursday are working days by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkingHours {
    pub sunday: DayHours,
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            sunday: DayHours::working(),
            monday: DayHours::working(),
            tuesday: DayHours::working(),
            wednesday: DayHours::working(),
            thursday: DayHours::working(),
            friday: DayHours::closed(),
            saturday: DayHours::closed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourtSettings {
    #[serde(default = "default_case_format")]
    pub case_number_format: String,
    #[serde(default = "default_judgment_format")]
    pub judgment_number_format: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for CourtSettings {
    fn default() -> Self {
        Self {
            case_number_format: default_case_format(),
            judgment_number_format: default_judgment_format(),
            default_language: default_language(),
            timezone: default_timezone(),
        }
    }
}

fn default_case_format() -> String {
    DEFAULT_CASE_NUMBER_FORMAT.to_string()
}

fn default_judgment_format() -> String {
    DEFAULT_JUDGMENT_NUMBER_FORMAT.to_string()
}

fn default_language() -> String {
    "ar".to_string()
}

fn default_timezone() -> String {
    "Asia/Riyadh".to_string()
}

// ── DB row struct ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Court {
    pub id: Uuid,
    pub name: String,
    pub name_en: Option<String>,
    pub court_type: String,
    pub level: i32,
    pub jurisdiction: String,
    pub city: String,
    pub region: String,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub contact: CourtContact,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub working_hours: WorkingHours,
    pub established_date: Option<DateTime<Utc>>,
    pub status: String,
    pub parent_court_id: Option<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub settings: CourtSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Court {
    pub fn full_name(&self) -> String {
        format!("{} - {}", self.name, self.city)
    }
}

/// Aggregates computed on read for a single court.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CourtStatistics {
    pub total_cases: i64,
    pub active_cases: i64,
    pub closed_cases: i64,
    pub total_judgments: i64,
    /// Mean days from filing to decision over decided cases.
    pub average_processing_time: Option<f64>,
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourtResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    pub full_name: String,
    pub court_type: String,
    pub level: i32,
    pub jurisdiction: String,
    pub city: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub contact: CourtContact,
    pub working_hours: WorkingHours,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_date: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_court_id: Option<String>,
    pub settings: CourtSettings,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Court> for CourtResponse {
    fn from(c: Court) -> Self {
        let full_name = c.full_name();
        Self {
            id: c.id.to_string(),
            name: c.name,
            name_en: c.name_en,
            full_name,
            court_type: c.court_type,
            level: c.level,
            jurisdiction: c.jurisdiction,
            city: c.city,
            region: c.region,
            district: c.district,
            address: c.address,
            latitude: c.latitude,
            longitude: c.longitude,
            contact: c.contact,
            working_hours: c.working_hours,
            established_date: c.established_date.map(|d| d.to_rfc3339()),
            status: c.status,
            parent_court_id: c.parent_court_id.map(|p| p.to_string()),
            settings: c.settings,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Court detail with sub-courts and live statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourtDetailResponse {
    #[serde(flatten)]
    pub court: CourtResponse,
    pub sub_courts: Vec<CourtResponse>,
    pub statistics: CourtStatistics,
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateCourtRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "اسم المحكمة مطلوب"))
    )]
    pub name: String,
    #[serde(default)]
    pub name_en: Option<String>,
    pub court_type: String,
    #[cfg_attr(
        feature = "validation",
        validate(range(min = 1, max = 4, message = "مستوى المحكمة يجب أن يكون بين 1 و 4"))
    )]
    pub level: i32,
    pub jurisdiction: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "المدينة مطلوبة"))
    )]
    pub city: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "المنطقة مطلوبة"))
    )]
    pub region: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub contact: CourtContact,
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub established_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub parent_court_id: Option<Uuid>,
    #[serde(default)]
    pub settings: Option<CourtSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCourtRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<CourtContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<CourtSettings>,
}

/// Query parameters for the court list.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CourtListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub court_type: Option<String>,
    pub jurisdiction: Option<String>,
    pub city: Option<String>,
    /// Defaults to `active`.
    pub status: Option<String>,
    pub search: Option<String>,
}
