// crates/care-access-config/src/lib.rs
// ============================================================================
// Module: Care Access Config Library
// Description: Public API surface for care-access configuration.
// Purpose: Expose the config model, loader, and validation errors.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! Configuration selects the protected resource, the JSON row field names,
//! the audit destination, and result cache limits. Loading is strict and
//! fails closed on any invalid field.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AccessConfig;
pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::CacheConfig;
pub use config::CareAccessConfig;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
