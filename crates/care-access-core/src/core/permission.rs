// crates/care-access-core/src/core/permission.rs
// ============================================================================
// Module: Permission Grammar
// Description: Parsed `resource:action:scope` permission grants.
// Purpose: Give permission strings a closed, validated representation.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Permissions are atomic grants written as `resource:action:scope`, for
//! example `analytics:read:organization`. Parsing is strict: unknown scopes,
//! empty segments, extra segments, and non-ASCII names are rejected so a
//! malformed grant can never be interpreted as a broader one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Action name for read grants.
pub const READ_ACTION: &str = "read";
/// Resource protected by default.
pub const DEFAULT_RESOURCE: &str = "analytics";
/// Maximum length of a single permission segment in bytes.
pub const MAX_SEGMENT_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing permission strings or resource names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionParseError {
    /// Wrong number of `:`-separated segments.
    #[error("permission must have exactly three segments: {0}")]
    SegmentCount(String),
    /// A resource or action segment is empty, too long, or has bad characters.
    #[error("invalid permission segment: {0}")]
    InvalidSegment(String),
    /// Scope segment is not `own`, `organization`, or `all`.
    #[error("unknown permission scope: {0}")]
    UnknownScope(String),
}

// ============================================================================
// SECTION: Grant Scope
// ============================================================================

/// Breadth granted by a single permission.
///
/// # Invariants
/// - Ordering is by breadth: `Own < Organization < All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantScope {
    /// The caller's own records only.
    Own,
    /// The caller's organizations and their descendants.
    Organization,
    /// Unrestricted.
    All,
}

impl GrantScope {
    /// Returns the stable label used in permission strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::Organization => "organization",
            Self::All => "all",
        }
    }
}

impl fmt::Display for GrantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantScope {
    type Err = PermissionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "own" => Ok(Self::Own),
            "organization" => Ok(Self::Organization),
            "all" => Ok(Self::All),
            other => Err(PermissionParseError::UnknownScope(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Resource Name
// ============================================================================

/// Validated resource name (`[a-z0-9_-]{1,64}`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    /// Parses and validates a resource name.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionParseError::InvalidSegment`] when the name is empty,
    /// too long, or contains characters outside `[a-z0-9_-]`.
    pub fn parse(value: &str) -> Result<Self, PermissionParseError> {
        validate_segment(value)?;
        Ok(Self(value.to_string()))
    }

    /// Returns the default `analytics` resource.
    #[must_use]
    pub fn analytics() -> Self {
        Self(DEFAULT_RESOURCE.to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceName {
    fn default() -> Self {
        Self::analytics()
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for ResourceName {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_segment(&value)?;
        Ok(Self(value))
    }
}

impl From<ResourceName> for String {
    fn from(value: ResourceName) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Permission
// ============================================================================

/// Atomic permission grant `(resource, action, scope)`.
///
/// # Invariants
/// - `resource` and `action` are non-empty `[a-z0-9_-]` segments.
/// - Serializes as the canonical `resource:action:scope` string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    /// Protected resource.
    resource: ResourceName,
    /// Action on the resource.
    action: String,
    /// Breadth of the grant.
    scope: GrantScope,
}

impl Permission {
    /// Builds a permission from already-validated parts.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionParseError::InvalidSegment`] when `action` is invalid.
    pub fn new(
        resource: ResourceName,
        action: &str,
        scope: GrantScope,
    ) -> Result<Self, PermissionParseError> {
        validate_segment(action)?;
        Ok(Self {
            resource,
            action: action.to_string(),
            scope,
        })
    }

    /// Builds a read permission on `resource`.
    #[must_use]
    pub fn read(resource: ResourceName, scope: GrantScope) -> Self {
        Self {
            resource,
            action: READ_ACTION.to_string(),
            scope,
        }
    }

    /// Returns the protected resource.
    #[must_use]
    pub const fn resource(&self) -> &ResourceName {
        &self.resource
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the grant scope.
    #[must_use]
    pub const fn scope(&self) -> GrantScope {
        self.scope
    }

    /// Returns true when this is a read grant on `resource`.
    #[must_use]
    pub fn is_read_on(&self, resource: &ResourceName) -> bool {
        self.action == READ_ACTION && &self.resource == resource
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource, self.action, self.scope)
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = value.split(':').collect();
        let [resource, action, scope] = segments.as_slice() else {
            return Err(PermissionParseError::SegmentCount(value.to_string()));
        };
        let resource = ResourceName::parse(resource)?;
        validate_segment(action)?;
        let scope = scope.parse::<GrantScope>()?;
        Ok(Self {
            resource,
            action: (*action).to_string(),
            scope,
        })
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a resource or action segment.
fn validate_segment(value: &str) -> Result<(), PermissionParseError> {
    let valid = !value.is_empty()
        && value.len() <= MAX_SEGMENT_LENGTH
        && value.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid { Ok(()) } else { Err(PermissionParseError::InvalidSegment(value.to_string())) }
}
