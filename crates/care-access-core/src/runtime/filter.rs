// crates/care-access-core/src/runtime/filter.rs
// ============================================================================
// Module: Row Filter Engine
// Description: Restricts result rows to a caller's verified access sets.
// Purpose: Enforce practice and provider boundaries on every query result.
// Dependencies: crate::{core, interfaces, runtime::integrity}, serde_json
// ============================================================================

//! ## Overview
//! The row filter is the last gate between the query layer and the caller.
//! Each call runs in a fixed order:
//! 1. validate the context against the grants it carries;
//! 2. scope `all` returns the input unchanged;
//! 3. an empty practice set under any other scope returns no rows;
//! 4. otherwise keep rows whose practice is accessible and, when a provider
//!    set is present, whose provider is accessible.
//!
//! Rows without a provider are system-level rows. They survive the provider
//! check only for scopes that see system rows (`organization`, `all`); an
//! `own` caller never sees them. An `own` caller without a provider record
//! gets no rows at all.
//!
//! Input order is preserved and rows are never modified. Exactly one audit
//! event is recorded per call unless the policy suppresses passthrough events.
//!
//! Security posture: inputs are untrusted; every ambiguity resolves to
//! excluding the row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::core::AccessScope;
use crate::core::AuditPolicy;
use crate::core::FilterAuditEvent;
use crate::core::FilterOutcome;
use crate::core::JsonRowKeys;
use crate::core::ResourceName;
use crate::core::SecurityContext;
use crate::core::SecurityViolation;
use crate::interfaces::FilterAuditSink;
use crate::interfaces::ScopedRow;
use crate::runtime::integrity::ScopeIntegrityValidator;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Per-call filter plan derived from a validated context.
enum Plan<'a> {
    /// Return every row.
    Passthrough,
    /// Return no rows.
    FailClosed,
    /// Apply the membership predicate.
    Restrict(&'a SecurityContext),
}

impl<'a> Plan<'a> {
    /// Chooses the branch for a validated context.
    fn for_context(context: &'a SecurityContext) -> Self {
        match context.permission_scope() {
            AccessScope::All => Self::Passthrough,
            AccessScope::Own if context.accessible_provider_ids().is_empty() => Self::FailClosed,
            _ if context.accessible_practice_ids().is_empty() => Self::FailClosed,
            AccessScope::Organization | AccessScope::Own | AccessScope::None => {
                Self::Restrict(context)
            }
        }
    }

    /// Returns the audit outcome label for this plan.
    const fn outcome(&self) -> FilterOutcome {
        match self {
            Self::Passthrough => FilterOutcome::Passthrough,
            Self::FailClosed => FilterOutcome::FailClosed,
            Self::Restrict(_) => FilterOutcome::Filtered,
        }
    }

    /// Returns true if the row survives this plan.
    fn admits<R: ScopedRow + ?Sized>(&self, row: &R) -> bool {
        match self {
            Self::Passthrough => true,
            Self::FailClosed => false,
            Self::Restrict(context) => row_visible(row, context),
        }
    }
}

/// Membership predicate for restricted scopes.
fn row_visible<R: ScopedRow + ?Sized>(row: &R, context: &SecurityContext) -> bool {
    let Some(practice_id) = row.practice_id() else {
        return false;
    };
    if !context.accessible_practice_ids().contains(&practice_id) {
        return false;
    }
    let providers = context.accessible_provider_ids();
    if providers.is_empty() {
        return true;
    }
    match row.provider_id() {
        Some(provider_id) => providers.contains(&provider_id),
        None => context.permission_scope().sees_system_rows(),
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Permission-scoped row filter with integrated integrity check and audit.
pub struct RowFilterEngine {
    /// Integrity check run before every filter call.
    validator: ScopeIntegrityValidator,
    /// Audit destination.
    audit: Arc<dyn FilterAuditSink>,
    /// Audit emission policy.
    policy: AuditPolicy,
}

impl RowFilterEngine {
    /// Creates a filter engine for `resource` reporting to `audit`.
    #[must_use]
    pub fn new(resource: ResourceName, audit: Arc<dyn FilterAuditSink>) -> Self {
        Self {
            validator: ScopeIntegrityValidator::new(resource),
            audit,
            policy: AuditPolicy::default(),
        }
    }

    /// Replaces the audit emission policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: AuditPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the integrity validator used by this engine.
    #[must_use]
    pub const fn validator(&self) -> &ScopeIntegrityValidator {
        &self.validator
    }

    /// Returns the audit emission policy.
    #[must_use]
    pub const fn policy(&self) -> AuditPolicy {
        self.policy
    }

    /// Filters owned rows, returning clones of the visible ones in input order.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when the context fails integrity
    /// validation. No rows are returned in that case.
    pub fn filter<R: ScopedRow + Clone>(
        &self,
        rows: &[R],
        context: &SecurityContext,
    ) -> Result<Vec<R>, SecurityViolation> {
        self.run(rows, context, |plan| {
            rows.iter().filter(|row| plan.admits(*row)).cloned().collect()
        })
    }

    /// Filters rows by reference, avoiding clones of the retained rows.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when the context fails integrity
    /// validation.
    pub fn filter_refs<'a, R: ScopedRow>(
        &self,
        rows: &'a [R],
        context: &SecurityContext,
    ) -> Result<Vec<&'a R>, SecurityViolation> {
        self.run(rows, context, |plan| rows.iter().filter(|row| plan.admits(*row)).collect())
    }

    /// Filters untyped JSON rows, reading partition keys via `keys`.
    ///
    /// Non-object rows and rows whose keys are missing or non-integer are
    /// excluded unless the scope is `all`.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityViolation`] when the context fails integrity
    /// validation.
    pub fn filter_json(
        &self,
        rows: &[Value],
        keys: &JsonRowKeys,
        context: &SecurityContext,
    ) -> Result<Vec<Value>, SecurityViolation> {
        self.run(rows, context, |plan| {
            rows.iter().filter(|row| plan.admits(&keys.view(row))).cloned().collect()
        })
    }

    /// Validates, plans, applies, and audits a single filter call.
    fn run<T, O>(
        &self,
        rows: &[T],
        context: &SecurityContext,
        apply: impl FnOnce(&Plan<'_>) -> Vec<O>,
    ) -> Result<Vec<O>, SecurityViolation> {
        if let Err(violation) = self.validator.validate_snapshot(context) {
            self.audit.record(&FilterAuditEvent::violation(context, rows.len(), &violation));
            return Err(violation);
        }
        let plan = Plan::for_context(context);
        let retained = apply(&plan);
        let outcome = plan.outcome();
        if outcome != FilterOutcome::Passthrough || self.policy.emit_passthrough {
            self.audit.record(&FilterAuditEvent::completed(
                context,
                outcome,
                rows.len(),
                retained.len(),
            ));
        }
        Ok(retained)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
