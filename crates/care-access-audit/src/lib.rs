// crates/care-access-audit/src/lib.rs
// ============================================================================
// Module: Care Access Audit Library
// Description: Concrete destinations for filter audit events.
// Purpose: Route filter events to stderr, files, memory, or a channel.
// Dependencies: care-access-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! The row filter records audit events synchronously through
//! [`care_access_core::FilterAuditSink`]. Sinks here either write JSON lines
//! directly or hand events to a bounded channel so a background forwarder
//! performs the I/O off the request path.
//!
//! Security posture: events carry counts and labels only. Violation detail
//! is present on violation events and must be routed to the security log,
//! never to end users.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod channel;
pub mod sink;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use care_access_core::NoopFilterAuditSink;
pub use channel::ChannelFilterAuditSink;
pub use channel::spawn_audit_forwarder;
pub use sink::FileFilterAuditSink;
pub use sink::MemoryFilterAuditSink;
pub use sink::StderrFilterAuditSink;
