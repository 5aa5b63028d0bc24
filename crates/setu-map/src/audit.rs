//! Audit sinks receiving one analytics event per resolution.
//!
//! Persistence is outside this crate. Sinks must not block the resolver: an
//! event that cannot be delivered immediately is dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use setu_model::AuditEvent;
use tracing::{info, warn};

/// Fire-and-forget receiver of audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Emits each event as a structured `tracing` event on target `setu::audit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        info!(
            target: "setu::audit",
            timestamp = %event.timestamp.to_rfc3339(),
            source_system = %event.source.system,
            source_code = %event.source.code,
            target_system = %event.target_system,
            status = %event.result_status,
            top_confidence = event.top_confidence,
            "resolution"
        );
    }
}

/// Hands events to a bounded channel for an external consumer.
#[derive(Debug)]
pub struct ChannelAuditSink {
    sender: SyncSender<AuditEvent>,
    dropped: AtomicU64,
}

impl ChannelAuditSink {
    /// Create a sink and the receiving end of its channel.
    ///
    /// The channel buffers at least one event; a zero capacity would make
    /// every non-blocking send fail.
    pub fn bounded(capacity: usize) -> (Self, Receiver<AuditEvent>) {
        let (sender, receiver) = sync_channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// Events dropped because the channel was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Err(err) = self.sender.try_send(event.clone()) {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            let reason = match err {
                TrySendError::Full(_) => "full",
                TrySendError::Disconnected(_) => "disconnected",
            };
            warn!(reason, dropped = total, "audit event dropped");
        }
    }
}
