// crates/care-access-audit/src/channel.rs
// ============================================================================
// Module: Channel Audit Sink
// Description: Bounded, non-blocking hand-off of filter events.
// Purpose: Keep audit I/O off the filtering path.
// Dependencies: care-access-core, tokio
// ============================================================================

//! ## Overview
//! [`ChannelFilterAuditSink`] enqueues events into a bounded
//! `tokio::sync::mpsc` channel with `try_send`, so recording never waits.
//! When the channel is full or closed the event is dropped and counted.
//! [`spawn_audit_forwarder`] drains the channel into a downstream sink on a
//! blocking worker thread.
//!
//! Invariants:
//! - `record` never blocks and never panics.
//! - Every event is either forwarded or counted in [`ChannelFilterAuditSink::dropped`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use care_access_core::FilterAuditEvent;
use care_access_core::FilterAuditSink;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// Channel-backed audit sink.
#[derive(Debug)]
pub struct ChannelFilterAuditSink {
    /// Sender used to enqueue events.
    sender: Sender<FilterAuditEvent>,
    /// Events dropped because the channel was full or closed.
    dropped: AtomicU64,
}

impl ChannelFilterAuditSink {
    /// Wraps an existing sender.
    #[must_use]
    pub const fn new(sender: Sender<FilterAuditEvent>) -> Self {
        Self {
            sender,
            dropped: AtomicU64::new(0),
        }
    }

    /// Creates a sink and its receiver with the given capacity.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<FilterAuditEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }

    /// Returns the number of events dropped so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FilterAuditSink for ChannelFilterAuditSink {
    fn record(&self, event: &FilterAuditEvent) {
        if self.sender.try_send(event.clone()).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// ============================================================================
// SECTION: Forwarder
// ============================================================================

/// Drains `receiver` into `sink` until every sender is dropped.
///
/// Runs on the blocking pool so file and stderr writes do not stall async
/// workers. The task resolves to the number of events forwarded.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn spawn_audit_forwarder(
    mut receiver: Receiver<FilterAuditEvent>,
    sink: Arc<dyn FilterAuditSink>,
) -> JoinHandle<u64> {
    tokio::task::spawn_blocking(move || {
        let mut forwarded = 0_u64;
        while let Some(event) = receiver.blocking_recv() {
            sink.record(&event);
            forwarded += 1;
        }
        forwarded
    })
}
