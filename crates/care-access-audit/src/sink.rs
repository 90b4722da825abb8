// crates/care-access-audit/src/sink.rs
// ============================================================================
// Module: Filter Audit Sinks
// Description: JSON-line and in-memory destinations for filter events.
// Purpose: Provide direct audit sinks for logs, files, and tests.
// Dependencies: care-access-core, serde_json
// ============================================================================

//! ## Overview
//! Each sink serializes one [`FilterAuditEvent`] per line. Write failures are
//! swallowed: audit delivery never changes a filter decision. The stderr and
//! file sinks perform blocking writes; on latency-sensitive paths wrap them
//! behind [`crate::ChannelFilterAuditSink`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use care_access_core::FilterAuditEvent;
use care_access_core::FilterAuditSink;

// ============================================================================
// SECTION: Stderr Sink
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
///
/// Writes block; intended as a forwarder target behind
/// [`crate::ChannelFilterAuditSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrFilterAuditSink;

impl FilterAuditSink for StderrFilterAuditSink {
    fn record(&self, event: &FilterAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

// ============================================================================
// SECTION: File Sink
// ============================================================================

/// Audit sink that appends JSON lines to a file.
///
/// Writes block; intended as a forwarder target behind
/// [`crate::ChannelFilterAuditSink`].
pub struct FileFilterAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileFilterAuditSink {
    /// Opens the audit log file in append mode, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl FilterAuditSink for FileFilterAuditSink {
    fn record(&self, event: &FilterAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

// ============================================================================
// SECTION: Memory Sink
// ============================================================================

/// Audit sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryFilterAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<FilterAuditEvent>>,
}

impl MemoryFilterAuditSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<FilterAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or_default()
    }

    /// Returns true when no events were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FilterAuditSink for MemoryFilterAuditSink {
    fn record(&self, event: &FilterAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
