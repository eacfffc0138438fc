//! Per-processor execution counters.
//!
//! Every processor node in a pipeline owns four monotonic counters. The
//! engine only increments and snapshots them; publication (HTTP exposition,
//! scraping) is the host's concern.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counter storage for one processor node.
#[derive(Debug, Default)]
pub(crate) struct StepCounters {
    received: AtomicU64,
    sent: AtomicU64,
    discarded: AtomicU64,
    errors: AtomicU64,
}

impl StepCounters {
    pub(crate) fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        component_type: &str,
        component_id: &str,
    ) -> ProcessorMetrics {
        ProcessorMetrics {
            component_kind: "processor",
            component_type: component_type.to_string(),
            component_id: component_id.to_string(),
            received: self.received.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A labeled snapshot of one processor node's counters.
///
/// `component_id` is the compound id of the node, e.g.
/// `logs-sample.processors[0].set` or
/// `logs-sample.processors[0].lowercase.on_failure[0].set`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorMetrics {
    pub component_kind: &'static str,
    pub component_type: String,
    pub component_id: String,
    /// Events received by the node.
    pub received: u64,
    /// Events successfully passed on (including ignored failures and
    /// condition skips).
    pub sent: u64,
    /// Events explicitly dropped by the processor.
    pub discarded: u64,
    /// Unrecovered errors.
    pub errors: u64,
}
