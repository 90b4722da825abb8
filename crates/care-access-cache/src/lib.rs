// crates/care-access-cache/src/lib.rs
// ============================================================================
// Module: Care Access Cache Library
// Description: Injected result cache and the scoped service built on it.
// Purpose: Share unfiltered query results while filtering per caller.
// Dependencies: crate::{cache, service}
// ============================================================================

//! ## Overview
//! Query results are cached unfiltered and keyed by query, never by caller.
//! [`ScopedResultService`] always applies the caller's security context on
//! the way out, so a cache hit can never widen what a caller sees. The cache
//! is an explicit collaborator behind the [`ResultCache`] trait; nothing in
//! this crate is a process-wide singleton.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cache;
pub mod service;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CacheError;
pub use cache::CacheKey;
pub use cache::InMemoryResultCache;
pub use cache::ResultCache;
pub use service::FetchOutcome;
pub use service::ScopedResultService;
pub use service::ServiceError;
