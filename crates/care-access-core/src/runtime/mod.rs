// crates/care-access-core/src/runtime/mod.rs
// ============================================================================
// Module: Care Access Runtime
// Description: Scope resolution, context building, validation, and filtering.
// Purpose: Turn a resolved identity into a validated context and filter rows.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime components are synchronous and perform no I/O. The builder
//! composes the resolver and collector, the validator guards every context,
//! and the filter engine applies the context to result rows. All entry
//! points run the same integrity checks.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod access;
pub mod builder;
pub mod filter;
pub mod integrity;
pub mod scope;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access::AccessSetCollector;
pub use builder::SecurityContextBuilder;
pub use filter::RowFilterEngine;
pub use integrity::ScopeIntegrityValidator;
pub use scope::ScopeResolver;
