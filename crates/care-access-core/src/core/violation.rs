// crates/care-access-core/src/core/violation.rs
// ============================================================================
// Module: Security Violations
// Description: The single error type raised across the filtering boundary.
// Purpose: Reject tampered or inconsistent contexts without leaking detail.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`SecurityViolation`] is fatal to the request and is never retried or
//! downgraded to an empty result. Its `Display` output is always
//! generic so it can be shown to end users; the diagnostic detail is only
//! available through [`SecurityViolation::kind`] and
//! [`SecurityViolation::detail`] for audit sinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Violation Kind
// ============================================================================

/// Classification of an integrity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Super admin context claims a scope other than `all`.
    SuperAdminScopeMismatch,
    /// `all` claimed without `read:all` or super admin.
    AllScopeNotGranted,
    /// `organization` claimed without `read:organization` or `read:all`.
    OrganizationScopeNotGranted,
    /// `all` context carries practice or provider sets.
    UnrestrictedScopeHasAccessSets,
    /// `none` context carries practice or provider sets.
    NoneScopeHasAccessSets,
    /// Provider set present on a scope other than `own`.
    ProviderSetOutsideOwnScope,
    /// Context user does not match the identity it is checked against.
    IdentityMismatch,
    /// Carried grant snapshot differs from the identity's actual grants.
    GrantSnapshotMismatch,
    /// Carried access sets differ from the sets derivable from the identity.
    AccessSetMismatch,
    /// Context grants were captured for a different resource.
    ResourceMismatch,
}

impl ViolationKind {
    /// Returns a stable label for audit output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdminScopeMismatch => "super_admin_scope_mismatch",
            Self::AllScopeNotGranted => "all_scope_not_granted",
            Self::OrganizationScopeNotGranted => "organization_scope_not_granted",
            Self::UnrestrictedScopeHasAccessSets => "unrestricted_scope_has_access_sets",
            Self::NoneScopeHasAccessSets => "none_scope_has_access_sets",
            Self::ProviderSetOutsideOwnScope => "provider_set_outside_own_scope",
            Self::IdentityMismatch => "identity_mismatch",
            Self::GrantSnapshotMismatch => "grant_snapshot_mismatch",
            Self::AccessSetMismatch => "access_set_mismatch",
            Self::ResourceMismatch => "resource_mismatch",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Security Violation
// ============================================================================

/// Context integrity failure. Displays only a generic forbidden message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access forbidden")]
pub struct SecurityViolation {
    /// Violation classification.
    kind: ViolationKind,
    /// Diagnostic detail for the security log.
    detail: String,
}

impl SecurityViolation {
    /// Creates a violation with diagnostic detail.
    #[must_use]
    pub fn new(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Returns the violation classification.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Returns the diagnostic detail. Never surface this to end users.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}
