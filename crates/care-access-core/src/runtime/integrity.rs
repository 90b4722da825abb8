// crates/care-access-core/src/runtime/integrity.rs
// ============================================================================
// Module: Scope Integrity Validator
// Description: Cross-checks a context's claimed scope against actual grants.
// Purpose: Reject spoofed or inconsistently built security contexts.
// Dependencies: crate::core, crate::runtime::access
// ============================================================================

//! ## Overview
//! The validator is the anti-spoofing guard in front of the row filter. It
//! re-derives what the grants permit and rejects any context claiming more:
//! - a super admin context must claim `all`;
//! - `all` requires `read:all` or super admin;
//! - `organization` requires `read:organization` or `read:all`.
//!
//! Before any of these, the grants a context carries must have been captured
//! for the validator's resource; a context built for one resource is never
//! accepted for another.
//!
//! Structural invariants are checked alongside: `all` and `none` contexts
//! carry no access sets, and only `own` carries a provider set.
//!
//! Contexts crossing a process boundary go through
//! [`ScopeIntegrityValidator::verify_external`], which additionally requires
//! the carried grants and access sets to match the authoritative identity.
//!
//! Security posture: every failure is a hard [`SecurityViolation`]; nothing
//! here degrades to an empty result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::AccessScope;
use crate::core::GrantScope;
use crate::core::GrantSnapshot;
use crate::core::PracticeId;
use crate::core::ProviderId;
use crate::core::ResourceName;
use crate::core::SecurityContext;
use crate::core::SecurityViolation;
use crate::core::UnverifiedSecurityContext;
use crate::core::UserId;
use crate::core::UserIdentity;
use crate::core::ViolationKind;
use crate::runtime::access::AccessSetCollector;

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Borrowed view of the fields a context claims.
struct Claims<'a> {
    /// Claimed scope.
    scope: AccessScope,
    /// Claimed practice set.
    practices: &'a BTreeSet<PracticeId>,
    /// Claimed provider set.
    providers: &'a BTreeSet<ProviderId>,
}

impl<'a> Claims<'a> {
    /// Claims of a constructed context.
    const fn of_context(context: &'a SecurityContext) -> Self {
        Self {
            scope: context.permission_scope(),
            practices: context.accessible_practice_ids(),
            providers: context.accessible_provider_ids(),
        }
    }

    /// Claims of an unverified wire context.
    const fn of_unverified(context: &'a UnverifiedSecurityContext) -> Self {
        Self {
            scope: context.permission_scope,
            practices: &context.accessible_practice_ids,
            providers: &context.accessible_provider_ids,
        }
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Guard that rejects contexts whose claims exceed the caller's grants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeIntegrityValidator {
    /// Resource whose read grants are authoritative.
    resource: ResourceName,
}

impl ScopeIntegrityValidator {
    /// Creates a validator for `resource`.
    #[must_use]
    pub const fn new(resource: ResourceName) -> Self {
        Self {
            resource,
        }
    }

    /// Returns the resource this validator checks grants for.
    #[must_use]
    pub const fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Validates a context against the identity it was built for.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when the context belongs to another user,
    /// its grant snapshot is stale, or its scope exceeds the identity's grants.
    pub fn validate(
        &self,
        context: &SecurityContext,
        identity: &UserIdentity,
    ) -> Result<(), SecurityViolation> {
        check_user(context.user_id(), identity)?;
        check_resource(context.grants(), &self.resource)?;
        let grants = GrantSnapshot::from_identity(identity, &self.resource);
        check_claims(&Claims::of_context(context), &grants)?;
        check_snapshot(context.grants(), &grants)
    }

    /// Validates a context against the grant snapshot it carries.
    ///
    /// This is the check the row filter runs on every call: it never looks up
    /// permissions, it only confirms the context is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when the carried grants belong to another
    /// resource, the claimed scope exceeds them, or the access sets contradict
    /// the scope.
    pub fn validate_snapshot(&self, context: &SecurityContext) -> Result<(), SecurityViolation> {
        check_resource(context.grants(), &self.resource)?;
        check_claims(&Claims::of_context(context), context.grants())
    }

    /// Verifies a context received from outside this process.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when any claim differs from what the
    /// authoritative identity supports.
    pub fn verify_external(
        &self,
        claimed: UnverifiedSecurityContext,
        identity: &UserIdentity,
    ) -> Result<SecurityContext, SecurityViolation> {
        check_user(&claimed.user_id, identity)?;
        check_resource(&claimed.grants, &self.resource)?;
        let grants = GrantSnapshot::from_identity(identity, &self.resource);
        let claims = Claims::of_unverified(&claimed);
        check_claims(&claims, &grants)?;
        check_snapshot(&claimed.grants, &grants)?;
        check_access_sets(&claims, identity)?;
        Ok(SecurityContext::from_parts(claimed))
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Requires the context to belong to the identity.
fn check_user(user_id: &UserId, identity: &UserIdentity) -> Result<(), SecurityViolation> {
    if user_id == &identity.user_id {
        return Ok(());
    }
    Err(SecurityViolation::new(
        ViolationKind::IdentityMismatch,
        format!("context user {user_id} checked against identity {}", identity.user_id),
    ))
}

/// Requires the carried grants to have been captured for `resource`.
fn check_resource(carried: &GrantSnapshot, resource: &ResourceName) -> Result<(), SecurityViolation> {
    if &carried.resource == resource {
        return Ok(());
    }
    Err(SecurityViolation::new(
        ViolationKind::ResourceMismatch,
        format!("context grants for resource {} checked for resource {resource}", carried.resource),
    ))
}

/// Requires the carried grant snapshot to equal the identity's grants.
fn check_snapshot(carried: &GrantSnapshot, actual: &GrantSnapshot) -> Result<(), SecurityViolation> {
    if carried == actual {
        return Ok(());
    }
    Err(SecurityViolation::new(
        ViolationKind::GrantSnapshotMismatch,
        format!(
            "carried grants (super_admin={}, read=[{}]) differ from identity grants \
             (super_admin={}, read=[{}])",
            carried.super_admin,
            scope_labels(carried),
            actual.super_admin,
            scope_labels(actual)
        ),
    ))
}

/// Joins the read scopes of a snapshot into a comma-separated label.
fn scope_labels(grants: &GrantSnapshot) -> String {
    grants.read_scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(",")
}

/// Checks the claimed scope and access-set shape against grants.
fn check_claims(claims: &Claims<'_>, grants: &GrantSnapshot) -> Result<(), SecurityViolation> {
    check_scope(claims.scope, grants)?;
    check_shape(claims)
}

/// Rejects a claimed scope broader than the grants allow.
fn check_scope(scope: AccessScope, grants: &GrantSnapshot) -> Result<(), SecurityViolation> {
    if grants.super_admin && scope != AccessScope::All {
        return Err(SecurityViolation::new(
            ViolationKind::SuperAdminScopeMismatch,
            format!("super admin context claims scope {scope}"),
        ));
    }
    match scope {
        AccessScope::All if !grants.super_admin && !grants.has_read(GrantScope::All) => {
            Err(SecurityViolation::new(
                ViolationKind::AllScopeNotGranted,
                "scope all claimed without read:all or super admin",
            ))
        }
        AccessScope::Organization
            if !grants.has_read(GrantScope::Organization) && !grants.has_read(GrantScope::All) =>
        {
            Err(SecurityViolation::new(
                ViolationKind::OrganizationScopeNotGranted,
                "scope organization claimed without read:organization or read:all",
            ))
        }
        // TODO: decide whether `own` claims must be cross-checked against
        // read:own; tightening this rejects own-scope users whose permission
        // records are incomplete.
        AccessScope::All | AccessScope::Organization | AccessScope::Own | AccessScope::None => {
            Ok(())
        }
    }
}

/// Rejects access sets that contradict the claimed scope.
fn check_shape(claims: &Claims<'_>) -> Result<(), SecurityViolation> {
    let has_sets = !claims.practices.is_empty() || !claims.providers.is_empty();
    match claims.scope {
        AccessScope::All if has_sets => Err(SecurityViolation::new(
            ViolationKind::UnrestrictedScopeHasAccessSets,
            format!(
                "scope all carries {} practices and {} providers",
                claims.practices.len(),
                claims.providers.len()
            ),
        )),
        AccessScope::None if has_sets => Err(SecurityViolation::new(
            ViolationKind::NoneScopeHasAccessSets,
            format!(
                "scope none carries {} practices and {} providers",
                claims.practices.len(),
                claims.providers.len()
            ),
        )),
        AccessScope::Organization if !claims.providers.is_empty() => Err(SecurityViolation::new(
            ViolationKind::ProviderSetOutsideOwnScope,
            format!("scope organization carries {} providers", claims.providers.len()),
        )),
        AccessScope::All | AccessScope::None | AccessScope::Organization | AccessScope::Own => {
            Ok(())
        }
    }
}

/// Requires claimed access sets to equal the sets derivable from the identity.
fn check_access_sets(claims: &Claims<'_>, identity: &UserIdentity) -> Result<(), SecurityViolation> {
    let collector = AccessSetCollector;
    let practices = collector.collect_practices(identity, claims.scope);
    let providers = collector.collect_providers(identity, claims.scope);
    if &practices == claims.practices && &providers == claims.providers {
        return Ok(());
    }
    Err(SecurityViolation::new(
        ViolationKind::AccessSetMismatch,
        format!(
            "claimed {} practices and {} providers; identity supports {} and {}",
            claims.practices.len(),
            claims.providers.len(),
            practices.len(),
            providers.len()
        ),
    ))
}
