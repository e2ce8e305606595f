//! In-memory activity-log sink

use async_trait::async_trait;
use corruflow_core::AuditEntry;
use corruflow_ports::{AuditSink, AuditSinkError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Append-only in-memory audit sink
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, in append order
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditSinkError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }
}
