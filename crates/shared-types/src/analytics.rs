use serde::{Deserialize, Serialize};

use crate::common::CountEntry;

pub const DEFAULT_DATE_RANGE_DAYS: i64 = 30;
pub const MAX_DATE_RANGE_DAYS: i64 = 3650;

/// Query parameters for the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct DashboardParams {
    /// Look-back window in days for the "recent" counters.
    pub date_range: Option<i64>,
}

impl DashboardParams {
    /// Window in days, clamped to `1..=MAX_DATE_RANGE_DAYS`.
    pub fn days(&self) -> i64 {
        self.date_range
            .filter(|d| *d > 0)
            .map_or(DEFAULT_DATE_RANGE_DAYS, |d| d.min(MAX_DATE_RANGE_DAYS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SummaryCounts {
    pub total_cases: i64,
    pub recent_cases: i64,
    pub total_judgments: i64,
    pub recent_judgments: i64,
    pub total_documents: i64,
    pub recent_documents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardResponse {
    pub date_range: i64,
    pub summary: SummaryCounts,
    pub cases_by_status: Vec<CountEntry>,
    pub cases_by_type: Vec<CountEntry>,
    pub judgments_by_decision: Vec<CountEntry>,
    /// `YYYY-MM` keys for the last twelve months.
    pub judgments_by_month: Vec<CountEntry>,
}
