// crates/care-access-core/src/core/audit.rs
// ============================================================================
// Module: Filter Audit Events
// Description: Structured security-audit payloads emitted per filter call.
// Purpose: Summarize scope and row counts without carrying row data.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every row filter invocation produces at most one [`FilterAuditEvent`].
//! Events carry counts and labels only; row contents never leave the filter.
//! Severity scales with impact: a caught integrity violation is `critical`,
//! an unexpectedly emptied result for a partially scoped user is `high`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::context::AccessScope;
use crate::core::context::SecurityContext;
use crate::core::identifiers::OrganizationId;
use crate::core::identifiers::UserId;
use crate::core::violation::SecurityViolation;
use crate::core::violation::ViolationKind;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Event identifier for filter audit records.
pub const FILTER_AUDIT_EVENT: &str = "care_access_filter";

/// Which filter branch produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    /// Scope `all`: rows returned unchanged.
    Passthrough,
    /// Rows were restricted by practice/provider membership.
    Filtered,
    /// Empty access set under a restricted scope: no rows returned.
    FailClosed,
    /// Context rejected by the integrity validator.
    Violation,
}

/// Audit severity, ordered from least to most impactful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Routine access.
    Low,
    /// Expected denial (no grants at all).
    Medium,
    /// Non-empty input fully blocked for a partially scoped user.
    High,
    /// Integrity violation.
    Critical,
}

impl AuditSeverity {
    /// Classifies an event.
    #[must_use]
    pub const fn classify(outcome: FilterOutcome, scope: AccessScope, all_data_blocked: bool) -> Self {
        match outcome {
            FilterOutcome::Violation => Self::Critical,
            FilterOutcome::Passthrough => Self::Low,
            FilterOutcome::Filtered | FilterOutcome::FailClosed => match scope {
                AccessScope::None => Self::Medium,
                AccessScope::Organization | AccessScope::Own if all_data_blocked => Self::High,
                AccessScope::All | AccessScope::Organization | AccessScope::Own => Self::Low,
            },
        }
    }
}

// ============================================================================
// SECTION: Audit Policy
// ============================================================================

/// Controls which filter events are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditPolicy {
    /// Emit events for scope `all` passthrough calls.
    pub emit_passthrough: bool,
}

impl Default for AuditPolicy {
    fn default() -> Self {
        Self {
            emit_passthrough: true,
        }
    }
}

// ============================================================================
// SECTION: Event
// ============================================================================

/// Filter audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Caller identifier.
    pub user_id: UserId,
    /// Scope claimed by the context.
    pub scope: AccessScope,
    /// Organizations behind the practice set.
    pub organization_ids: Vec<OrganizationId>,
    /// Size of the accessible practice set.
    pub accessible_practice_count: usize,
    /// Size of the accessible provider set.
    pub accessible_provider_count: usize,
    /// Rows handed to the filter.
    pub rows_in: usize,
    /// Rows returned by the filter.
    pub rows_out: usize,
    /// Non-empty input produced empty output.
    pub all_data_blocked: bool,
    /// Filter branch taken.
    pub outcome: FilterOutcome,
    /// Impact classification.
    pub severity: AuditSeverity,
    /// Violation classification, when the context was rejected.
    pub violation_kind: Option<ViolationKind>,
    /// Violation diagnostic detail, when the context was rejected.
    pub detail: Option<String>,
}

impl FilterAuditEvent {
    /// Builds an event for a completed filter call.
    #[must_use]
    pub fn completed(
        context: &SecurityContext,
        outcome: FilterOutcome,
        rows_in: usize,
        rows_out: usize,
    ) -> Self {
        let all_data_blocked = rows_in > 0 && rows_out == 0;
        let scope = context.permission_scope();
        Self {
            event: FILTER_AUDIT_EVENT,
            timestamp_ms: now_ms(),
            user_id: context.user_id().clone(),
            scope,
            organization_ids: context.organization_ids().to_vec(),
            accessible_practice_count: context.accessible_practice_ids().len(),
            accessible_provider_count: context.accessible_provider_ids().len(),
            rows_in,
            rows_out,
            all_data_blocked,
            outcome,
            severity: AuditSeverity::classify(outcome, scope, all_data_blocked),
            violation_kind: None,
            detail: None,
        }
    }

    /// Builds an event for a context rejected by the integrity validator.
    #[must_use]
    pub fn violation(context: &SecurityContext, rows_in: usize, violation: &SecurityViolation) -> Self {
        Self {
            event: FILTER_AUDIT_EVENT,
            timestamp_ms: now_ms(),
            user_id: context.user_id().clone(),
            scope: context.permission_scope(),
            organization_ids: context.organization_ids().to_vec(),
            accessible_practice_count: context.accessible_practice_ids().len(),
            accessible_provider_count: context.accessible_provider_ids().len(),
            rows_in,
            rows_out: 0,
            all_data_blocked: false,
            outcome: FilterOutcome::Violation,
            severity: AuditSeverity::Critical,
            violation_kind: Some(violation.kind()),
            detail: Some(violation.detail().to_string()),
        }
    }

    /// Builds an event for a context rejected before it reached the filter,
    /// such as a claimed context that failed external verification.
    #[must_use]
    pub fn rejected(
        user_id: UserId,
        scope: AccessScope,
        rows_in: usize,
        violation: &SecurityViolation,
    ) -> Self {
        Self {
            event: FILTER_AUDIT_EVENT,
            timestamp_ms: now_ms(),
            user_id,
            scope,
            organization_ids: Vec::new(),
            accessible_practice_count: 0,
            accessible_provider_count: 0,
            rows_in,
            rows_out: 0,
            all_data_blocked: false,
            outcome: FilterOutcome::Violation,
            severity: AuditSeverity::Critical,
            violation_kind: Some(violation.kind()),
            detail: Some(violation.detail().to_string()),
        }
    }
}

/// Returns the current wall-clock time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}
