// crates/care-access-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared identity, row, and audit helpers for core tests.
// Purpose: Keep integration tests focused on behavior rather than setup.
// Dependencies: care-access-core
// ============================================================================

//! ## Overview
//! Provides identity builders, row constructors, and a recording audit sink
//! shared by the core integration tests.

#![allow(dead_code, reason = "Each test binary uses a subset of helpers.")]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use care_access_core::AnalyticsRow;
use care_access_core::FilterAuditEvent;
use care_access_core::FilterAuditSink;
use care_access_core::GrantScope;
use care_access_core::Organization;
use care_access_core::OrganizationId;
use care_access_core::Permission;
use care_access_core::PracticeId;
use care_access_core::ProviderId;
use care_access_core::ResourceName;
use care_access_core::RowFilterEngine;
use care_access_core::UserIdentity;

// ============================================================================
// SECTION: Identity Helpers
// ============================================================================

/// Identity with the given analytics read grants and no organizations.
pub fn identity_with(user_id: &str, scopes: &[GrantScope]) -> UserIdentity {
    let mut identity = UserIdentity::new(user_id);
    identity.granted_permissions =
        scopes.iter().map(|scope| Permission::read(ResourceName::analytics(), *scope)).collect();
    identity
}

/// Super admin identity with no explicit grants.
pub fn super_admin(user_id: &str) -> UserIdentity {
    let mut identity = UserIdentity::new(user_id);
    identity.is_super_admin = true;
    identity
}

/// Organization with the given practices.
pub fn organization(id: &str, practices: &[i64]) -> Organization {
    Organization {
        id: OrganizationId::new(id),
        practice_ids: practices.iter().copied().map(PracticeId::new).collect(),
    }
}

// ============================================================================
// SECTION: Row Helpers
// ============================================================================

/// Row with only partition keys set.
pub fn row(practice: Option<i64>, provider: Option<i64>) -> AnalyticsRow {
    AnalyticsRow {
        practice_id: practice.map(PracticeId::new),
        provider_id: provider.map(ProviderId::new),
        fields: serde_json::Map::new(),
    }
}

/// Row tagged with a label column so reordering is observable.
pub fn labeled_row(practice: Option<i64>, provider: Option<i64>, label: &str) -> AnalyticsRow {
    let mut row = row(practice, provider);
    row.fields.insert("label".to_string(), serde_json::Value::String(label.to_string()));
    row
}

// ============================================================================
// SECTION: Audit Helpers
// ============================================================================

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FilterAuditEvent>>,
}

impl RecordingSink {
    /// Returns a snapshot of recorded events.
    pub fn events(&self) -> Vec<FilterAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl FilterAuditSink for RecordingSink {
    fn record(&self, event: &FilterAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Filter engine for the analytics resource wired to a recording sink.
pub fn recording_engine() -> (RowFilterEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (RowFilterEngine::new(ResourceName::analytics(), sink.clone()), sink)
}
