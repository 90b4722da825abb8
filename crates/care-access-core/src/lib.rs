// crates/care-access-core/src/lib.rs
// ============================================================================
// Module: Care Access Core Library
// Description: Public API surface for permission-scoped row filtering.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Care Access core decides which analytics rows a caller may see. It
//! resolves a coarse access scope from permission grants, collects the
//! practice and provider sets that bound it, validates the resulting context
//! against spoofing, and filters result rows fail-closed. It performs no
//! database or network I/O and integrates through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::FilterAuditSink;
pub use interfaces::NoopFilterAuditSink;
pub use interfaces::ScopedRow;
pub use runtime::AccessSetCollector;
pub use runtime::RowFilterEngine;
pub use runtime::ScopeIntegrityValidator;
pub use runtime::ScopeResolver;
pub use runtime::SecurityContextBuilder;
