use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::RefSummary;

#[cfg(feature = "validation")]
use validator::Validate;

// ── Validation constants ────────────────────────────────────────────

pub const CASE_TYPES: &[&str] = &[
    "civil", "criminal", "commercial", "labor", "administrative", "family",
    "real_estate", "intellectual_property", "bankruptcy", "tax",
    "constitutional", "other",
];

pub const CASE_PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];

pub const CASE_STATUSES: &[&str] = &[
    "registered", "under_review", "scheduled", "in_session", "postponed",
    "under_deliberation", "decided", "appealed", "final", "archived", "cancelled",
];

/// Statuses after which a case no longer counts as active.
pub const CLOSED_CASE_STATUSES: &[&str] = &["decided", "final", "archived", "cancelled"];

/// Statuses that block deletion.
pub const LOCKED_CASE_STATUSES: &[&str] = &["final", "archived"];

pub const CONFIDENTIALITY_LEVELS: &[&str] = &["public", "restricted", "confidential", "top_secret"];

pub const PARTY_TYPES: &[&str] = &["individual", "organization", "government"];

pub const WITNESS_TYPES: &[&str] = &["witness", "expert", "translator"];

pub const SESSION_TYPES: &[&str] = &["hearing", "deliberation", "verdict", "preliminary"];

pub const SESSION_STATUSES: &[&str] = &["scheduled", "completed", "postponed", "cancelled"];

pub const CASE_RELATIONSHIPS: &[&str] = &["appeal", "related", "precedent", "consolidated"];

/// Accepted `sort_by` keys for case listings.
pub const CASE_SORT_FIELDS: &[&str] = &[
    "filed", "created", "updated", "title", "case_number", "priority", "status",
];

pub fn is_active_case_status(status: &str) -> bool {
    !CLOSED_CASE_STATUSES.contains(&status)
}

// ── Embedded data ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PartyLawyer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A plaintiff or defendant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Party {
    #[serde(rename = "type", default = "default_party_type")]
    pub party_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_registry: Option<String>,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lawyer: Option<PartyLawyer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_party_type() -> String {
    "individual".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Witness {
    pub name: String,
    #[serde(rename = "type", default = "default_witness_type")]
    pub witness_type: String,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testimony: Option<String>,
}

fn default_witness_type() -> String {
    "witness".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Expert {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseParties {
    #[serde(default)]
    pub plaintiffs: Vec<Party>,
    #[serde(default)]
    pub defendants: Vec<Party>,
    #[serde(default)]
    pub witnesses: Vec<Witness>,
    #[serde(default)]
    pub experts: Vec<Expert>,
}

impl CaseParties {
    /// Plaintiff and defendant names, used for search indexing.
    pub fn names(&self) -> Vec<&str> {
        self.plaintiffs
            .iter()
            .chain(self.defendants.iter())
            .map(|p| p.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseSession {
    pub session_number: i32,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub session_type: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_session_date: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseAmounts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awarded_amount: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lawyer_fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_fees: Option<f64>,
}

impl Default for CaseAmounts {
    fn default() -> Self {
        Self {
            claimed_amount: None,
            awarded_amount: None,
            currency: default_currency(),
            court_fees: None,
            lawyer_fees: None,
            other_fees: None,
        }
    }
}

fn default_currency() -> String {
    "SAR".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseLegalBasis {
    #[serde(default)]
    pub laws: Vec<String>,
    #[serde(default)]
    pub articles: Vec<String>,
    #[serde(default)]
    pub precedents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RelatedCase {
    pub case_id: Uuid,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ArchivalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ── DB row structs ──────────────────────────────────────────────────

/// A case row joined with the names of its court, judge and clerk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Case {
    pub id: Uuid,
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub case_type: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub priority: String,
    pub status: String,
    pub court_id: Uuid,
    pub judge_id: Option<Uuid>,
    pub clerk_id: Option<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub parties: CaseParties,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub sessions: Vec<CaseSession>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub amounts: CaseAmounts,
    pub filed_at: DateTime<Utc>,
    pub first_hearing: Option<DateTime<Utc>>,
    pub last_session: Option<DateTime<Utc>>,
    pub decision_date: Option<DateTime<Utc>>,
    pub final_date: Option<DateTime<Utc>>,
    pub archive_date: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub legal_basis: CaseLegalBasis,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub confidentiality_level: String,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub related_cases: Vec<RelatedCase>,
    pub language: String,
    pub version: i32,
    pub last_modified_by: Option<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub archival_info: ArchivalInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub court_name: Option<String>,
    pub judge_name: Option<String>,
    pub clerk_name: Option<String>,
}

impl Case {
    /// Whole days from filing to the final date, else the decision date,
    /// else `now`, rounded up.
    pub fn duration_days(&self, now: DateTime<Utc>) -> i64 {
        let end = self.final_date.or(self.decision_date).unwrap_or(now);
        let secs = (end - self.filed_at).num_seconds().max(0);
        (secs + 86_399) / 86_400
    }

    pub fn is_active(&self) -> bool {
        is_active_case_status(&self.status)
    }

    /// Only admins and the assigned judge or clerk may edit a case.
    pub fn can_be_edited_by(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.judge_id == Some(user_id) || self.clerk_id == Some(user_id)
    }
}

/// One entry on a case's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CaseEvent {
    pub id: Uuid,
    pub case_id: Uuid,
    pub event: String,
    pub description: String,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseEventResponse {
    pub id: String,
    pub event: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<RefSummary>,
    pub occurred_at: String,
}

impl From<CaseEvent> for CaseEventResponse {
    fn from(e: CaseEvent) -> Self {
        Self {
            id: e.id.to_string(),
            event: e.event,
            description: e.description,
            user: RefSummary::from_parts(e.user_id, e.user_name),
            occurred_at: e.occurred_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseResponse {
    pub id: String,
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub case_type: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub priority: String,
    pub status: String,
    pub court: RefSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge: Option<RefSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clerk: Option<RefSummary>,
    pub parties: CaseParties,
    pub sessions: Vec<CaseSession>,
    pub amounts: CaseAmounts,
    pub filed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_hearing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_date: Option<String>,
    pub legal_basis: CaseLegalBasis,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub confidentiality_level: String,
    pub related_cases: Vec<RelatedCase>,
    pub language: String,
    pub version: i32,
    pub archival_info: ArchivalInfo,
    pub duration_days: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Case> for CaseResponse {
    fn from(c: Case) -> Self {
        let duration_days = c.duration_days(Utc::now());
        let is_active = c.is_active();
        Self {
            id: c.id.to_string(),
            case_number: c.case_number,
            title: c.title,
            description: c.description,
            case_type: c.case_type,
            category: c.category,
            subcategory: c.subcategory,
            priority: c.priority,
            status: c.status,
            court: RefSummary {
                id: c.court_id.to_string(),
                name: c.court_name.unwrap_or_default(),
            },
            judge: RefSummary::from_parts(c.judge_id, c.judge_name),
            clerk: RefSummary::from_parts(c.clerk_id, c.clerk_name),
            parties: c.parties,
            sessions: c.sessions,
            amounts: c.amounts,
            filed_at: c.filed_at.to_rfc3339(),
            first_hearing: c.first_hearing.map(|d| d.to_rfc3339()),
            last_session: c.last_session.map(|d| d.to_rfc3339()),
            decision_date: c.decision_date.map(|d| d.to_rfc3339()),
            final_date: c.final_date.map(|d| d.to_rfc3339()),
            archive_date: c.archive_date.map(|d| d.to_rfc3339()),
            legal_basis: c.legal_basis,
            keywords: c.keywords,
            tags: c.tags,
            is_public: c.is_public,
            confidentiality_level: c.confidentiality_level,
            related_cases: c.related_cases,
            language: c.language,
            version: c.version,
            archival_info: c.archival_info,
            duration_days,
            is_active,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Case detail with its timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseDetailResponse {
    #[serde(flatten)]
    pub case: CaseResponse,
    pub timeline: Vec<CaseEventResponse>,
}

/// Scoped aggregate counts for cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseStatistics {
    pub total: i64,
    pub active: i64,
    pub by_status: Vec<crate::common::CountEntry>,
    pub by_type: Vec<crate::common::CountEntry>,
    pub by_priority: Vec<crate::common::CountEntry>,
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateCaseRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "عنوان القضية مطلوب ولا يتجاوز 200 حرف"))
    )]
    pub title: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 2000, message = "وصف القضية مطلوب ولا يتجاوز 2000 حرف"))
    )]
    pub description: String,
    pub case_type: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "تصنيف القضية مطلوب"))
    )]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub court_id: Uuid,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub judge_id: Option<Uuid>,
    #[serde(default)]
    pub clerk_id: Option<Uuid>,
    #[serde(default)]
    pub parties: CaseParties,
    #[serde(default)]
    pub amounts: CaseAmounts,
    #[serde(default)]
    pub filed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub legal_basis: CaseLegalBasis,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub confidentiality_level: Option<String>,
    #[serde(default)]
    pub related_cases: Vec<RelatedCase>,
}

/// Partial update; only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateCaseRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "عنوان القضية مطلوب ولا يتجاوز 200 حرف"))
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 2000, message = "وصف القضية مطلوب ولا يتجاوز 2000 حرف"))
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clerk_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parties: Option<CaseParties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amounts: Option<CaseAmounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<CaseLegalBasis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidentiality_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_cases: Option<Vec<RelatedCase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archival_info: Option<ArchivalInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddSessionRequest {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub time: Option<String>,
    pub session_type: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub next_session_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCaseStatusRequest {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Query parameters for the case list.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CaseListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub case_type: Option<String>,
    pub court: Option<Uuid>,
    pub judge: Option<Uuid>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Timeline text recorded on a status change.
pub fn status_change_description(from: &str, to: &str) -> String {
    format!("تم تغيير حالة القضية من {} إلى {}", from, to)
}
