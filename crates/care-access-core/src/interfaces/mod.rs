// crates/care-access-core/src/interfaces/mod.rs
// ============================================================================
// Module: Care Access Interfaces
// Description: Contract surfaces for result rows and audit delivery.
// Purpose: Keep the filter agnostic of row shape and audit transport.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The row filter integrates with the query layer through [`ScopedRow`] and
//! with the observability subsystem through [`FilterAuditSink`]. Neither
//! interface performs I/O on the filtering path itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::audit::FilterAuditEvent;
use crate::core::identifiers::PracticeId;
use crate::core::identifiers::ProviderId;

// ============================================================================
// SECTION: Scoped Rows
// ============================================================================

/// Result row exposing the partition keys used for access control.
///
/// # Invariants
/// - Implementations are pure reads; absent or malformed keys return `None`.
pub trait ScopedRow {
    /// Owning practice, when present.
    fn practice_id(&self) -> Option<PracticeId>;

    /// Owning provider; `None` marks a system-level row.
    fn provider_id(&self) -> Option<ProviderId>;
}

impl<R: ScopedRow + ?Sized> ScopedRow for &R {
    fn practice_id(&self) -> Option<PracticeId> {
        (**self).practice_id()
    }

    fn provider_id(&self) -> Option<ProviderId> {
        (**self).provider_id()
    }
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Destination for filter audit events.
///
/// # Invariants
/// - `record` must not fail or panic. Audit delivery is best-effort and
///   never affects the filter decision.
/// - `record` runs inline on the filtering thread. Sinks that write to a
///   file or stream block for the duration of that write; callers on a
///   latency-sensitive path put them behind a bounded channel sink and
///   drain it on a dedicated forwarder.
pub trait FilterAuditSink: Send + Sync {
    /// Records a filter audit event.
    fn record(&self, event: &FilterAuditEvent);
}

/// Audit sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilterAuditSink;

impl FilterAuditSink for NoopFilterAuditSink {
    fn record(&self, _event: &FilterAuditEvent) {}
}
