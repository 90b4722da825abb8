// crates/care-access-core/src/core/context.rs
// ============================================================================
// Module: Security Context
// Description: Immutable per-request access context and its untrusted wire form.
// Purpose: Carry the resolved scope and access sets consumed by row filtering.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SecurityContext`] is built once per request and never mutated. Its
//! fields are private: only the context builder and the integrity validator
//! can produce one. Contexts serialize for cache or queue hops, but they
//! deserialize into [`UnverifiedSecurityContext`], which cannot be used for
//! filtering until it has been verified against the caller's identity.
//!
//! ## Invariants
//! - The meaning of an empty access set depends on `permission_scope`:
//!   under `all` it means unrestricted, under every other scope it means no
//!   data. Consumers branch on scope first and never on set size alone.
//! - `organization_ids` is for audit labeling only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OrganizationId;
use crate::core::identifiers::PracticeId;
use crate::core::identifiers::ProviderId;
use crate::core::identifiers::UserId;
use crate::core::identity::GrantSnapshot;

// ============================================================================
// SECTION: Access Scope
// ============================================================================

/// Effective data scope resolved for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessScope {
    /// Unrestricted access.
    All,
    /// Practices of the caller's organizations.
    Organization,
    /// Rows owned by the caller's provider record.
    Own,
    /// No access.
    None,
}

impl AccessScope {
    /// Returns a stable label for audit output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Organization => "organization",
            Self::Own => "own",
            Self::None => "none",
        }
    }

    /// Returns true for scopes that may see rows with no owning provider.
    #[must_use]
    pub const fn sees_system_rows(self) -> bool {
        matches!(self, Self::All | Self::Organization)
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Security Context
// ============================================================================

/// Immutable, validated access context for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityContext {
    /// Caller identifier.
    user_id: UserId,
    /// Resolved scope.
    permission_scope: AccessScope,
    /// Practices the caller may see (empty: see type-level invariants).
    accessible_practice_ids: BTreeSet<PracticeId>,
    /// Providers the caller may see (only populated for `own`).
    accessible_provider_ids: BTreeSet<ProviderId>,
    /// Organizations used to derive the practice set, for audit only.
    organization_ids: Vec<OrganizationId>,
    /// Read grants captured at build time.
    grants: GrantSnapshot,
}

impl SecurityContext {
    /// Assembles a context. Callers must run the integrity validator before
    /// handing the result out.
    pub(crate) fn from_parts(parts: UnverifiedSecurityContext) -> Self {
        let UnverifiedSecurityContext {
            user_id,
            permission_scope,
            accessible_practice_ids,
            accessible_provider_ids,
            organization_ids,
            grants,
        } = parts;
        Self {
            user_id,
            permission_scope,
            accessible_practice_ids,
            accessible_provider_ids,
            organization_ids,
            grants,
        }
    }

    /// Returns the caller identifier.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the resolved scope.
    #[must_use]
    pub const fn permission_scope(&self) -> AccessScope {
        self.permission_scope
    }

    /// Returns the accessible practice set.
    #[must_use]
    pub const fn accessible_practice_ids(&self) -> &BTreeSet<PracticeId> {
        &self.accessible_practice_ids
    }

    /// Returns the accessible provider set.
    #[must_use]
    pub const fn accessible_provider_ids(&self) -> &BTreeSet<ProviderId> {
        &self.accessible_provider_ids
    }

    /// Returns the organization identifiers for audit labeling.
    #[must_use]
    pub fn organization_ids(&self) -> &[OrganizationId] {
        &self.organization_ids
    }

    /// Returns the read grants captured at build time.
    #[must_use]
    pub const fn grants(&self) -> &GrantSnapshot {
        &self.grants
    }

    /// Converts the context into its wire form for a boundary hop.
    #[must_use]
    pub fn into_unverified(self) -> UnverifiedSecurityContext {
        UnverifiedSecurityContext {
            user_id: self.user_id,
            permission_scope: self.permission_scope,
            accessible_practice_ids: self.accessible_practice_ids,
            accessible_provider_ids: self.accessible_provider_ids,
            organization_ids: self.organization_ids,
            grants: self.grants,
        }
    }
}

// ============================================================================
// SECTION: Unverified Context
// ============================================================================

/// Context received from outside the process that built it.
///
/// # Invariants
/// - Values are untrusted until verified by
///   [`crate::runtime::ScopeIntegrityValidator::verify_external`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnverifiedSecurityContext {
    /// Claimed caller identifier.
    pub user_id: UserId,
    /// Claimed scope.
    pub permission_scope: AccessScope,
    /// Claimed practice set.
    #[serde(default)]
    pub accessible_practice_ids: BTreeSet<PracticeId>,
    /// Claimed provider set.
    #[serde(default)]
    pub accessible_provider_ids: BTreeSet<ProviderId>,
    /// Claimed organization labels.
    #[serde(default)]
    pub organization_ids: Vec<OrganizationId>,
    /// Claimed read grants.
    #[serde(default)]
    pub grants: GrantSnapshot,
}
