use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// How an utterance ultimately resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    Ignored,
    Rejected,
}

/// One diagnostics record per processed utterance. Observability only,
/// never required for correctness.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionRecord {
    pub timestamp: DateTime<Utc>,
    pub raw: String,
    pub normalized: String,
    /// Short human-readable summary of what came out ("buy #43 @50")
    pub output: String,
    pub method: String,
    pub status: ResolutionStatus,
}

/// Bounded in-memory log of resolutions for offline analysis.
pub struct ResolutionLog {
    entries: Mutex<VecDeque<ResolutionRecord>>,
    capacity: usize,
}

impl ResolutionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn push(&self, record: ResolutionRecord) {
        let mut entries = self.entries.lock().await;
        // Keep the last N entries so long sessions don't grow unbounded
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    pub async fn recent(&self) -> Vec<ResolutionRecord> {
        let entries = self.entries.lock().await;
        entries.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
    }
}

impl Default for ResolutionLog {
    fn default() -> Self {
        Self::new(500)
    }
}
