// crates/care-access-core/src/runtime/access.rs
// ============================================================================
// Module: Access Set Collector
// Description: Builds the practice and provider sets bounding a caller's view.
// Purpose: Turn organization memberships and provider links into access sets.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Access sets are only meaningful together with the scope they were
//! collected for. Under `all` and `none` both sets are empty with opposite
//! meanings; under `organization` and `own` an empty set means no data.
//! A user scoped to `own` without a provider record gets an empty provider
//! set and is never promoted to broader access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::AccessScope;
use crate::core::OrganizationId;
use crate::core::PracticeId;
use crate::core::ProviderId;
use crate::core::UserIdentity;

// ============================================================================
// SECTION: Access Set Collector
// ============================================================================

/// Stateless collector for practice, provider, and organization sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessSetCollector;

impl AccessSetCollector {
    /// Union of practice ids across accessible organizations, for scopes that
    /// are bounded by practice. Empty for `all` and `none`.
    #[must_use]
    pub fn collect_practices(
        &self,
        identity: &UserIdentity,
        scope: AccessScope,
    ) -> BTreeSet<PracticeId> {
        match scope {
            AccessScope::Organization | AccessScope::Own => identity
                .accessible_organizations
                .iter()
                .flat_map(|organization| organization.practice_ids.iter().copied())
                .collect(),
            AccessScope::All | AccessScope::None => BTreeSet::new(),
        }
    }

    /// `{provider_id}` for `own` scope when the identity has one; empty otherwise.
    #[must_use]
    pub fn collect_providers(
        &self,
        identity: &UserIdentity,
        scope: AccessScope,
    ) -> BTreeSet<ProviderId> {
        match (scope, identity.provider_id) {
            (AccessScope::Own, Some(provider_id)) => BTreeSet::from([provider_id]),
            _ => BTreeSet::new(),
        }
    }

    /// Organization ids in membership order, deduplicated.
    #[must_use]
    pub fn collect_organizations(&self, identity: &UserIdentity) -> Vec<OrganizationId> {
        let mut seen = BTreeSet::new();
        identity
            .accessible_organizations
            .iter()
            .filter(|organization| seen.insert(&organization.id))
            .map(|organization| organization.id.clone())
            .collect()
    }
}
