// crates/care-access-core/src/core/identity.rs
// ============================================================================
// Module: User Identity
// Description: Fully resolved caller identity supplied by the RBAC subsystem.
// Purpose: Read-only input to scope resolution and access-set collection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`UserIdentity`] is the snapshot handed over by the authentication layer.
//! Organization hierarchy expansion has already happened upstream: every
//! [`Organization::practice_ids`] list includes the practices of descendant
//! organizations. Nothing here performs lookups.
//!
//! [`GrantSnapshot`] distills the identity's read grants for one resource into
//! the minimal facts the integrity validator needs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::OrganizationId;
use crate::core::identifiers::PracticeId;
use crate::core::identifiers::ProviderId;
use crate::core::identifiers::UserId;
use crate::core::permission::GrantScope;
use crate::core::permission::Permission;
use crate::core::permission::ResourceName;

// ============================================================================
// SECTION: Organization
// ============================================================================

/// Organization membership with its hierarchy-complete practice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Organization identifier.
    pub id: OrganizationId,
    /// Practices of this organization and all of its descendants.
    #[serde(default)]
    pub practice_ids: Vec<PracticeId>,
}

// ============================================================================
// SECTION: User Identity
// ============================================================================

/// Caller identity as loaded by the RBAC subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// User identifier.
    pub user_id: UserId,
    /// Platform-wide administrator flag.
    #[serde(default)]
    pub is_super_admin: bool,
    /// Provider record linked to this user, when the user is a clinician.
    #[serde(default)]
    pub provider_id: Option<ProviderId>,
    /// Permissions granted through the user's roles.
    #[serde(default)]
    pub granted_permissions: BTreeSet<Permission>,
    /// Organizations the user can access, already hierarchy-expanded.
    #[serde(default)]
    pub accessible_organizations: Vec<Organization>,
}

impl UserIdentity {
    /// Creates an identity with no flags, grants, or memberships.
    #[must_use]
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            is_super_admin: false,
            provider_id: None,
            granted_permissions: BTreeSet::new(),
            accessible_organizations: Vec::new(),
        }
    }

    /// Returns true when the identity holds `resource:read:<scope>`.
    #[must_use]
    pub fn has_read(&self, resource: &ResourceName, scope: GrantScope) -> bool {
        self.granted_permissions
            .iter()
            .any(|permission| permission.is_read_on(resource) && permission.scope() == scope)
    }
}

// ============================================================================
// SECTION: Grant Snapshot
// ============================================================================

/// Read grants for a single resource, captured when a context is built.
///
/// # Invariants
/// - `read_scopes` only contains scopes of `read` grants on `resource`.
/// - A snapshot is only meaningful to a validator for the same `resource`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSnapshot {
    /// Resource the grants were distilled for.
    pub resource: ResourceName,
    /// Platform-wide administrator flag.
    pub super_admin: bool,
    /// Scopes of the read grants held on the resource.
    pub read_scopes: BTreeSet<GrantScope>,
}

impl GrantSnapshot {
    /// Distills the read grants an identity holds on `resource`.
    #[must_use]
    pub fn from_identity(identity: &UserIdentity, resource: &ResourceName) -> Self {
        let read_scopes = identity
            .granted_permissions
            .iter()
            .filter(|permission| permission.is_read_on(resource))
            .map(Permission::scope)
            .collect();
        Self {
            resource: resource.clone(),
            super_admin: identity.is_super_admin,
            read_scopes,
        }
    }

    /// Returns true when a read grant with `scope` is present.
    #[must_use]
    pub fn has_read(&self, scope: GrantScope) -> bool {
        self.read_scopes.contains(&scope)
    }
}
