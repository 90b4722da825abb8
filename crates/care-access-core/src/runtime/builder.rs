// crates/care-access-core/src/runtime/builder.rs
// ============================================================================
// Module: Security Context Builder
// Description: Composes scope resolution and access-set collection.
// Purpose: Produce one immutable, validated context per request.
// Dependencies: crate::core, crate::runtime
// ============================================================================

//! ## Overview
//! The builder is the only component that reads [`UserIdentity`] directly.
//! It is pure computation over in-memory data and cheap enough to run once
//! per request without caching. Every context it returns has already passed
//! the integrity validator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::GrantSnapshot;
use crate::core::ResourceName;
use crate::core::SecurityContext;
use crate::core::SecurityViolation;
use crate::core::UnverifiedSecurityContext;
use crate::core::UserIdentity;
use crate::runtime::access::AccessSetCollector;
use crate::runtime::integrity::ScopeIntegrityValidator;
use crate::runtime::scope::ScopeResolver;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds security contexts for one protected resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContextBuilder {
    /// Scope resolution.
    resolver: ScopeResolver,
    /// Access-set collection.
    collector: AccessSetCollector,
    /// Integrity check run on every built context.
    validator: ScopeIntegrityValidator,
}

impl SecurityContextBuilder {
    /// Creates a builder for `resource`.
    #[must_use]
    pub fn new(resource: ResourceName) -> Self {
        Self {
            resolver: ScopeResolver::new(resource.clone()),
            collector: AccessSetCollector,
            validator: ScopeIntegrityValidator::new(resource),
        }
    }

    /// Returns the resource contexts are built for.
    #[must_use]
    pub const fn resource(&self) -> &ResourceName {
        self.resolver.resource()
    }

    /// Returns the validator paired with this builder.
    #[must_use]
    pub const fn validator(&self) -> &ScopeIntegrityValidator {
        &self.validator
    }

    /// Builds the security context for an identity.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] if the assembled context fails integrity
    /// validation, which indicates a defect in resolution or collection.
    pub fn build(&self, identity: &UserIdentity) -> Result<SecurityContext, SecurityViolation> {
        let scope = self.resolver.resolve(identity);
        let context = SecurityContext::from_parts(UnverifiedSecurityContext {
            user_id: identity.user_id.clone(),
            permission_scope: scope,
            accessible_practice_ids: self.collector.collect_practices(identity, scope),
            accessible_provider_ids: self.collector.collect_providers(identity, scope),
            organization_ids: self.collector.collect_organizations(identity),
            grants: GrantSnapshot::from_identity(identity, self.resolver.resource()),
        });
        self.validator.validate(&context, identity)?;
        Ok(context)
    }
}
