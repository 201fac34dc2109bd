// # Memory Sink
//
// In-memory implementation of HostsSink.
//
// Every write is recorded in order, so tests can count writes and inspect
// exactly what would have reached the resolver.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::HostsSink;

/// Recording sink
///
/// Clones share the same write log.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    writes: Arc<RwLock<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All tables written so far, oldest first
    pub async fn writes(&self) -> Vec<String> {
        self.writes.read().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.writes.read().await.len()
    }

    /// The most recently written table
    pub async fn current(&self) -> Option<String> {
        self.writes.read().await.last().cloned()
    }
}

#[async_trait]
impl HostsSink for MemorySink {
    async fn write_table(&self, content: &str) -> Result<(), Error> {
        self.writes.write().await.push(content.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
