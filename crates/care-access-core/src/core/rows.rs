// crates/care-access-core/src/core/rows.rs
// ============================================================================
// Module: Row Adapters
// Description: Scoped-row views over typed records and raw JSON rows.
// Purpose: Expose practice/provider keys of arbitrary result rows.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The filter only needs two keys from each row. [`AnalyticsRow`] is a typed
//! record that keeps every other column in `fields`; [`JsonRowView`] reads the
//! keys out of an untyped JSON object using configurable field names.
//! A key that is missing, `null`, or not an integer reads as absent, which the
//! filter treats as "matches nothing".

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::PracticeId;
use crate::core::identifiers::ProviderId;
use crate::interfaces::ScopedRow;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default JSON field holding the practice key.
pub const DEFAULT_PRACTICE_KEY: &str = "practice_id";
/// Default JSON field holding the provider key.
pub const DEFAULT_PROVIDER_KEY: &str = "provider_id";

// ============================================================================
// SECTION: Typed Row
// ============================================================================

/// Analytics result row with its partition keys lifted out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRow {
    /// Owning practice.
    #[serde(default)]
    pub practice_id: Option<PracticeId>,
    /// Owning provider; `None` marks a system-level row.
    #[serde(default)]
    pub provider_id: Option<ProviderId>,
    /// Remaining columns, passed through untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ScopedRow for AnalyticsRow {
    fn practice_id(&self) -> Option<PracticeId> {
        self.practice_id
    }

    fn provider_id(&self) -> Option<ProviderId> {
        self.provider_id
    }
}

// ============================================================================
// SECTION: JSON Rows
// ============================================================================

/// Field names used to read partition keys from JSON rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRowKeys {
    /// Field holding the practice key.
    pub practice_key: String,
    /// Field holding the provider key.
    pub provider_key: String,
}

impl Default for JsonRowKeys {
    fn default() -> Self {
        Self {
            practice_key: DEFAULT_PRACTICE_KEY.to_string(),
            provider_key: DEFAULT_PROVIDER_KEY.to_string(),
        }
    }
}

impl JsonRowKeys {
    /// Creates a borrowed view over a JSON row.
    #[must_use]
    pub const fn view<'a>(&'a self, value: &'a Value) -> JsonRowView<'a> {
        JsonRowView {
            keys: self,
            value,
        }
    }
}

/// Borrowed JSON row paired with the key names to read.
#[derive(Debug, Clone, Copy)]
pub struct JsonRowView<'a> {
    /// Key names.
    keys: &'a JsonRowKeys,
    /// Underlying row.
    value: &'a Value,
}

impl<'a> JsonRowView<'a> {
    /// Returns the underlying JSON row.
    #[must_use]
    pub const fn value(&self) -> &'a Value {
        self.value
    }
}

impl ScopedRow for JsonRowView<'_> {
    fn practice_id(&self) -> Option<PracticeId> {
        integer_field(self.value, &self.keys.practice_key).map(PracticeId::new)
    }

    fn provider_id(&self) -> Option<ProviderId> {
        integer_field(self.value, &self.keys.provider_key).map(ProviderId::new)
    }
}

/// Reads an integer field from a JSON object.
fn integer_field(value: &Value, key: &str) -> Option<i64> {
    value.as_object()?.get(key)?.as_i64()
}
