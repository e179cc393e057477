//! Role-based row visibility.
//!
//! List queries bind a scope kind and an id and filter with a fixed SQL
//! fragment, so every listing of the same entity applies the same rule.

use shared_types::{Case, UserRole};
use uuid::Uuid;

use crate::auth::CurrentUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    All,
    Judge,
    Clerk,
    Court,
    /// Non-admin with no court: public rows only.
    Public,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::All => "all",
            ScopeKind::Judge => "judge",
            ScopeKind::Clerk => "clerk",
            ScopeKind::Court => "court",
            ScopeKind::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub id: Option<Uuid>,
}

impl Scope {
    pub fn all() -> Self {
        Self {
            kind: ScopeKind::All,
            id: None,
        }
    }

    fn court_or_public(user: &CurrentUser) -> Self {
        match user.court_id {
            Some(court) => Self {
                kind: ScopeKind::Court,
                id: Some(court),
            },
            None => Self {
                kind: ScopeKind::Public,
                id: None,
            },
        }
    }

    /// Judges see cases assigned to them, clerks the cases they keep,
    /// everyone else their court.
    pub fn for_cases(user: &CurrentUser) -> Self {
        match user.role {
            UserRole::Admin => Self::all(),
            UserRole::Judge => Self {
                kind: ScopeKind::Judge,
                id: Some(user.id),
            },
            UserRole::Clerk => Self {
                kind: ScopeKind::Clerk,
                id: Some(user.id),
            },
            _ => Self::court_or_public(user),
        }
    }

    /// Judges see their own judgments, everyone else their court.
    pub fn for_judgments(user: &CurrentUser) -> Self {
        match user.role {
            UserRole::Admin => Self::all(),
            UserRole::Judge => Self {
                kind: ScopeKind::Judge,
                id: Some(user.id),
            },
            _ => Self::court_or_public(user),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Case filter over table alias `a`, with the scope kind bound at `$k`
/// and the scope id at `$i`.
pub fn case_scope_sql(a: &str, k: usize, i: usize) -> String {
    format!(
        "(${k} = 'all' \
          OR (${k} = 'judge' AND {a}.judge_id = ${i}) \
          OR (${k} = 'clerk' AND {a}.clerk_id = ${i}) \
          OR (${k} = 'court' AND {a}.court_id = ${i}) \
          OR (${k} = 'public' AND {a}.confidentiality_level = 'public'))"
    )
}

/// Judgment filter; the public scope falls back to published judgments.
pub fn judgment_scope_sql(a: &str, k: usize, i: usize) -> String {
    format!(
        "(${k} = 'all' \
          OR (${k} = 'judge' AND {a}.judge_id = ${i}) \
          OR (${k} = 'court' AND {a}.court_id = ${i}) \
          OR (${k} = 'public' AND {a}.is_published))"
    )
}

/// Document filter for the requesting user bound at `$u`, their court at
/// `$c` and an admin flag at `$adm`. Mirrors `can_view_document`.
pub fn document_access_sql(a: &str, adm: usize, u: usize, c: usize) -> String {
    format!(
        "(${adm} \
          OR {a}.uploaded_by = ${u} \
          OR {a}.confidentiality_level = 'public' \
          OR {a}.permissions @> jsonb_build_array(jsonb_build_object('user_id', ${u}::TEXT)) \
          OR EXISTS (SELECT 1 FROM cases dc WHERE dc.id = {a}.case_id \
                     AND (dc.judge_id = ${u} OR dc.clerk_id = ${u} \
                          OR dc.court_id = ${c} OR dc.confidentiality_level = 'public')))"
    )
}

/// Detail access: admin, the assigned judge or clerk, a member of the
/// same court, or anyone for a public case.
pub fn can_view_case(user: &CurrentUser, case: &Case) -> bool {
    user.is_admin()
        || case.judge_id == Some(user.id)
        || case.clerk_id == Some(user.id)
        || user.court_id == Some(case.court_id)
        || case.confidentiality_level == "public"
}
