// crates/care-access-core/src/core/mod.rs
// ============================================================================
// Module: Care Access Core Types
// Description: Identifiers, grants, identities, contexts, and audit payloads.
// Purpose: Provide stable, serializable types for permission-scoped filtering.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types are the canonical vocabulary shared by the runtime components,
//! audit sinks, cache service, and CLI. They hold no behavior beyond parsing
//! and simple accessors.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod context;
pub mod identifiers;
pub mod identity;
pub mod permission;
pub mod rows;
pub mod violation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditPolicy;
pub use audit::AuditSeverity;
pub use audit::FILTER_AUDIT_EVENT;
pub use audit::FilterAuditEvent;
pub use audit::FilterOutcome;
pub use context::AccessScope;
pub use context::SecurityContext;
pub use context::UnverifiedSecurityContext;
pub use identifiers::OrganizationId;
pub use identifiers::PracticeId;
pub use identifiers::ProviderId;
pub use identifiers::UserId;
pub use identity::GrantSnapshot;
pub use identity::Organization;
pub use identity::UserIdentity;
pub use permission::DEFAULT_RESOURCE;
pub use permission::GrantScope;
pub use permission::Permission;
pub use permission::PermissionParseError;
pub use permission::READ_ACTION;
pub use permission::ResourceName;
pub use rows::AnalyticsRow;
pub use rows::JsonRowKeys;
pub use rows::JsonRowView;
pub use violation::SecurityViolation;
pub use violation::ViolationKind;
