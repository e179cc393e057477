use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::RefSummary;

#[cfg(feature = "validation")]
use validator::Validate;

// ── Validation constants ────────────────────────────────────────────

pub const JUDGMENT_TYPES: &[&str] = &[
    "final", "preliminary", "interlocutory", "default", "summary", "appeal", "cassation",
];

pub const JUDGMENT_DECISIONS: &[&str] = &[
    "accept", "reject", "partial_accept", "dismiss", "no_jurisdiction",
    "settlement", "withdrawal", "postpone", "refer",
];

pub const JUDGMENT_STATUSES: &[&str] = &[
    "draft", "under_review", "signed", "issued", "notified", "effective",
    "appealed", "executed", "archived",
];

/// Statuses visible through the public search.
pub const PUBLIC_JUDGMENT_STATUSES: &[&str] = &["issued", "effective", "executed"];

/// Statuses in which the authoring judge or panel may still edit.
pub const EDITABLE_JUDGMENT_STATUSES: &[&str] = &["draft", "under_review"];

pub const PANEL_ROLES: &[&str] = &["presiding", "member"];
pub const APPEAL_STATUSES: &[&str] = &["pending", "accepted", "rejected", "withdrawn"];
pub const EXECUTION_STATUSES: &[&str] = &["pending", "in_progress", "completed", "suspended"];
pub const IMPORTANCE_LEVELS: &[&str] = &["low", "medium", "high", "landmark"];

pub const WORDS_PER_MINUTE: usize = 200;
pub const WORDS_PER_PAGE: usize = 250;

/// Days allowed for an appeal after issuance.
pub fn appeal_window_days(judgment_type: &str) -> i64 {
    if judgment_type == "summary" {
        15
    } else {
        30
    }
}

pub fn default_appeal_deadline(judgment_type: &str, issued: DateTime<Utc>) -> DateTime<Utc> {
    issued + Duration::days(appeal_window_days(judgment_type))
}

// ── Embedded data ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PanelMember {
    pub judge_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentCosts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borne_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentContent {
    pub introduction: String,
    pub facts: String,
    pub legal_analysis: String,
    pub reasoning: String,
    pub verdict: String,
    #[serde(default)]
    pub orders: Vec<String>,
    #[serde(default)]
    pub costs: JudgmentCosts,
}

impl JudgmentContent {
    /// The five narrative sections in reading order.
    pub fn sections(&self) -> [&str; 5] {
        [
            &self.introduction,
            &self.facts,
            &self.legal_analysis,
            &self.reasoning,
            &self.verdict,
        ]
    }

    pub fn missing_sections(&self) -> Vec<&'static str> {
        let names = ["introduction", "facts", "legal_analysis", "reasoning", "verdict"];
        names
            .iter()
            .zip(self.sections())
            .filter(|(_, text)| text.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn statistics(&self) -> JudgmentStatistics {
        let words: usize = self
            .sections()
            .iter()
            .map(|s| s.split_whitespace().count())
            .sum();
        JudgmentStatistics {
            word_count: words as i32,
            page_count: words.div_ceil(WORDS_PER_PAGE) as i32,
            reading_time: words.div_ceil(WORDS_PER_MINUTE) as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentStatistics {
    pub word_count: i32,
    pub page_count: i32,
    /// Minutes.
    pub reading_time: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentLegalBasis {
    #[serde(default)]
    pub laws: Vec<String>,
    #[serde(default)]
    pub precedents: Vec<String>,
    #[serde(default)]
    pub doctrines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentParty {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub awards: Vec<String>,
    #[serde(default)]
    pub obligations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentParties {
    #[serde(default)]
    pub in_favor: Vec<JudgmentParty>,
    #[serde(default)]
    pub against: Vec<JudgmentParty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Appeal {
    pub appeal_number: String,
    pub filed_date: DateTime<Utc>,
    pub appellant: String,
    pub grounds: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExecutionInfo {
    #[serde(default = "default_execution_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for ExecutionInfo {
    fn default() -> Self {
        Self {
            status: default_execution_status(),
            start_date: None,
            completion_date: None,
            notes: None,
        }
    }
}

fn default_execution_status() -> String {
    "pending".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Classification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub legal_principles: Vec<String>,
    #[serde(default = "default_importance")]
    pub importance: String,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            subject: None,
            keywords: vec![],
            legal_principles: vec![],
            importance: default_importance(),
        }
    }
}

fn default_importance() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentSignature {
    pub judge_id: Uuid,
    pub signed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewEntry {
    pub reviewer_id: Uuid,
    pub reviewed_at: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

// ── DB row struct ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Judgment {
    pub id: Uuid,
    pub judgment_number: String,
    pub case_id: Uuid,
    pub court_id: Uuid,
    pub judge_id: Uuid,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub panel: Vec<PanelMember>,
    pub judgment_type: String,
    pub decision: String,
    pub summary: String,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub content: JudgmentContent,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub legal_basis: JudgmentLegalBasis,
    pub session_date: Option<DateTime<Utc>>,
    pub issued_date: DateTime<Utc>,
    pub notification_date: Option<DateTime<Utc>>,
    pub effective_date: Option<DateTime<Utc>>,
    pub appeal_deadline: DateTime<Utc>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub parties: JudgmentParties,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub appeals: Vec<Appeal>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub execution: ExecutionInfo,
    pub is_published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub publication_medium: Vec<String>,
    pub anonymized: bool,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub classification: Classification,
    pub attachments: Vec<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub signatures: Vec<JudgmentSignature>,
    pub status: String,
    pub language: String,
    pub version: i32,
    pub created_by: Uuid,
    pub last_modified_by: Option<Uuid>,
    #[cfg_attr(feature = "server", sqlx(json))]
    pub review_history: Vec<ReviewEntry>,
    pub word_count: i32,
    pub page_count: i32,
    pub reading_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub case_number: Option<String>,
    pub court_name: Option<String>,
    pub judge_name: Option<String>,
}

impl Judgment {
    pub fn is_appealable(&self, now: DateTime<Utc>) -> bool {
        now <= self.appeal_deadline
    }

    pub fn is_executable(&self, now: DateTime<Utc>) -> bool {
        self.status == "effective" && !self.is_appealable(now)
    }

    pub fn days_since_issued(&self, now: DateTime<Utc>) -> i64 {
        (now - self.issued_date).num_days()
    }

    /// Admins always; otherwise the author or a panel member while the
    /// judgment is still a draft or under review.
    pub fn can_be_edited_by(&self, user_id: Uuid, is_admin: bool) -> bool {
        if is_admin {
            return true;
        }
        if !EDITABLE_JUDGMENT_STATUSES.contains(&self.status.as_str()) {
            return false;
        }
        self.judge_id == user_id || self.panel.iter().any(|m| m.judge_id == user_id)
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentResponse {
    pub id: String,
    pub judgment_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<RefSummary>,
    pub court: RefSummary,
    pub judge: RefSummary,
    pub panel: Vec<PanelMember>,
    pub judgment_type: String,
    pub decision: String,
    pub summary: String,
    /// Omitted from list views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<JudgmentContent>,
    pub legal_basis: JudgmentLegalBasis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_date: Option<String>,
    pub issued_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    pub appeal_deadline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parties: Option<JudgmentParties>,
    pub appeals: Vec<Appeal>,
    pub execution: ExecutionInfo,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    pub publication_medium: Vec<String>,
    pub anonymized: bool,
    pub classification: Classification,
    pub signatures: Vec<JudgmentSignature>,
    pub status: String,
    pub language: String,
    pub version: i32,
    pub statistics: JudgmentStatistics,
    pub is_appealable: bool,
    pub is_executable: bool,
    pub days_since_issued: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Judgment> for JudgmentResponse {
    fn from(j: Judgment) -> Self {
        let now = Utc::now();
        let is_appealable = j.is_appealable(now);
        let is_executable = j.is_executable(now);
        let days_since_issued = j.days_since_issued(now);
        Self {
            id: j.id.to_string(),
            judgment_number: j.judgment_number,
            case: Some(RefSummary {
                id: j.case_id.to_string(),
                name: j.case_number.unwrap_or_default(),
            }),
            court: RefSummary {
                id: j.court_id.to_string(),
                name: j.court_name.unwrap_or_default(),
            },
            judge: RefSummary {
                id: j.judge_id.to_string(),
                name: j.judge_name.unwrap_or_default(),
            },
            panel: j.panel,
            judgment_type: j.judgment_type,
            decision: j.decision,
            summary: j.summary,
            content: Some(j.content),
            legal_basis: j.legal_basis,
            session_date: j.session_date.map(|d| d.to_rfc3339()),
            issued_date: j.issued_date.to_rfc3339(),
            notification_date: j.notification_date.map(|d| d.to_rfc3339()),
            effective_date: j.effective_date.map(|d| d.to_rfc3339()),
            appeal_deadline: j.appeal_deadline.to_rfc3339(),
            parties: Some(j.parties),
            appeals: j.appeals,
            execution: j.execution,
            is_published: j.is_published,
            published_date: j.published_date.map(|d| d.to_rfc3339()),
            publication_medium: j.publication_medium,
            anonymized: j.anonymized,
            classification: j.classification,
            signatures: j.signatures,
            status: j.status,
            language: j.language,
            version: j.version,
            statistics: JudgmentStatistics {
                word_count: j.word_count,
                page_count: j.page_count,
                reading_time: j.reading_time,
            },
            is_appealable,
            is_executable,
            days_since_issued,
            created_at: j.created_at.to_rfc3339(),
            updated_at: j.updated_at.to_rfc3339(),
        }
    }
}

impl JudgmentResponse {
    /// List view: drop the long narrative sections.
    pub fn without_content(mut self) -> Self {
        self.content = None;
        self
    }

    /// Public view: strip parties and the case reference.
    pub fn public_view(mut self) -> Self {
        self.parties = None;
        self.case = None;
        self
    }
}

/// Scoped aggregate counts for judgments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JudgmentStatisticsReport {
    pub total: i64,
    pub published: i64,
    pub by_decision: Vec<crate::common::CountEntry>,
    pub by_type: Vec<crate::common::CountEntry>,
    pub by_status: Vec<crate::common::CountEntry>,
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateJudgmentRequest {
    pub case_id: Uuid,
    pub court_id: Uuid,
    pub judgment_type: String,
    pub decision: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 500, message = "ملخص الحكم مطلوب ولا يتجاوز 500 حرف"))
    )]
    pub summary: String,
    pub content: JudgmentContent,
    #[serde(default)]
    pub panel: Vec<PanelMember>,
    #[serde(default)]
    pub legal_basis: JudgmentLegalBasis,
    #[serde(default)]
    pub session_date: Option<DateTime<Utc>>,
    pub issued_date: DateTime<Utc>,
    #[serde(default)]
    pub notification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub effective_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub appeal_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parties: JudgmentParties,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateJudgmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 500, message = "ملخص الحكم مطلوب ولا يتجاوز 500 حرف"))
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<JudgmentContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<Vec<PanelMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<JudgmentLegalBasis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parties: Option<JudgmentParties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublishJudgmentRequest {
    #[serde(default)]
    pub medium: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddAppealRequest {
    pub appellant: String,
    pub grounds: String,
    #[serde(default)]
    pub filed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for the judgment list.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct JudgmentListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub judgment_type: Option<String>,
    pub decision: Option<String>,
    pub court: Option<Uuid>,
    pub judge: Option<Uuid>,
    pub status: Option<String>,
    pub search: Option<String>,
}
