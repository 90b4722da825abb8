// crates/care-access-core/src/runtime/scope.rs
// ============================================================================
// Module: Scope Resolver
// Description: Derives the effective access scope from a caller's grants.
// Purpose: Collapse many permission grants into one coarse scope.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Resolution is a pure function of the grant set, evaluated in strict
//! priority order so the broadest applicable grant wins:
//! super admin, `read:all`, `read:organization`, `read:own`, then `none`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AccessScope;
use crate::core::GrantScope;
use crate::core::GrantSnapshot;
use crate::core::ResourceName;
use crate::core::UserIdentity;

// ============================================================================
// SECTION: Scope Resolver
// ============================================================================

/// Resolves the effective scope for one protected resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeResolver {
    /// Resource whose read grants are considered.
    resource: ResourceName,
}

impl ScopeResolver {
    /// Creates a resolver for `resource`.
    #[must_use]
    pub const fn new(resource: ResourceName) -> Self {
        Self {
            resource,
        }
    }

    /// Returns the resource this resolver evaluates.
    #[must_use]
    pub const fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Resolves the effective scope for an identity.
    #[must_use]
    pub fn resolve(&self, identity: &UserIdentity) -> AccessScope {
        Self::resolve_grants(&GrantSnapshot::from_identity(identity, &self.resource))
    }

    /// Resolves the effective scope from an already distilled grant snapshot.
    #[must_use]
    pub fn resolve_grants(grants: &GrantSnapshot) -> AccessScope {
        if grants.super_admin || grants.has_read(GrantScope::All) {
            AccessScope::All
        } else if grants.has_read(GrantScope::Organization) {
            AccessScope::Organization
        } else if grants.has_read(GrantScope::Own) {
            AccessScope::Own
        } else {
            AccessScope::None
        }
    }
}
