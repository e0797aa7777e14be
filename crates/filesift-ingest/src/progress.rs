//! Progress reporting for ingest runs.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Receives progress from a running ingest job.
///
/// Purely informational: nothing is returned and nothing can fail. A job
/// starts indeterminate and switches to determinate once it knows how much
/// work there is; after that `units_done` counts towards `total`.
pub trait IngestProgress: Send + Sync {
    /// The job now knows it has `total` units of work.
    fn switch_to_determinate(&self, total: u64);

    /// The amount of remaining work is unknown.
    fn switch_to_indeterminate(&self);

    /// `units_done` units of work are complete.
    fn progress(&self, units_done: u64);

    /// Describe what the job is doing right now.
    fn progress_message(&self, message: &str);

    fn progress_with_message(&self, message: &str, units_done: u64);
}

/// A single progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Determinate { total: u64 },
    Indeterminate,
    Progress {
        units_done: Option<u64>,
        message: Option<String>,
    },
}

/// Publishes progress over a broadcast channel.
///
/// Reports sent while nobody is subscribed are dropped; slow receivers see
/// `RecvError::Lagged` rather than blocking the job.
#[derive(Debug, Clone)]
pub struct BroadcastProgress {
    tx: broadcast::Sender<ProgressEvent>,
}

impl BroadcastProgress {
    /// Create a channel holding up to `capacity` unread reports per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to progress reports.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for BroadcastProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl IngestProgress for BroadcastProgress {
    fn switch_to_determinate(&self, total: u64) {
        self.send(ProgressEvent::Determinate { total });
    }

    fn switch_to_indeterminate(&self) {
        self.send(ProgressEvent::Indeterminate);
    }

    fn progress(&self, units_done: u64) {
        self.send(ProgressEvent::Progress {
            units_done: Some(units_done),
            message: None,
        });
    }

    fn progress_message(&self, message: &str) {
        self.send(ProgressEvent::Progress {
            units_done: None,
            message: Some(message.to_string()),
        });
    }

    fn progress_with_message(&self, message: &str, units_done: u64) {
        self.send(ProgressEvent::Progress {
            units_done: Some(units_done),
            message: Some(message.to_string()),
        });
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl IngestProgress for NoProgress {
    fn switch_to_determinate(&self, _total: u64) {}

    fn switch_to_indeterminate(&self) {}

    fn progress(&self, _units_done: u64) {}

    fn progress_message(&self, _message: &str) {}

    fn progress_with_message(&self, _message: &str, _units_done: u64) {}
}
