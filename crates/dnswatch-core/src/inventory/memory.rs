// # Memory Inventory
//
// In-process implementation of Inventory.
//
// ## Purpose
//
// Holds a replaceable list of instances behind a lock. Useful for tests,
// for embedding dnswatch in a process that already knows its peers, and for
// simulating inventory changes between poll cycles.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::{InstanceFilter, InstanceRecord, Inventory};

/// In-memory inventory implementation
///
/// Clones share the same instance list, so a test can keep a handle and
/// change the inventory while a `Watcher` owns another clone.
///
/// # Example
///
/// ```rust,no_run
/// use dnswatch_core::{InstanceFilter, InstanceRecord, Inventory, MemoryInventory};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let inventory = MemoryInventory::default();
///     inventory
///         .replace(vec![InstanceRecord::new("i-1").with_tag("substrate:zone", "corp")])
///         .await;
///
///     let filter = InstanceFilter::running("substrate:zone", "corp");
///     assert_eq!(inventory.list_instances(&filter).await?.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    inner: Arc<RwLock<Vec<InstanceRecord>>>,
}

impl MemoryInventory {
    /// Create an inventory holding `instances`
    pub fn new(instances: Vec<InstanceRecord>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(instances)),
        }
    }

    /// Replace the whole instance list
    pub async fn replace(&self, instances: Vec<InstanceRecord>) {
        *self.inner.write().await = instances;
    }

    /// Add one instance
    pub async fn insert(&self, instance: InstanceRecord) {
        self.inner.write().await.push(instance);
    }

    /// Remove an instance by id, returning whether it was present
    pub async fn remove(&self, id: &str) -> bool {
        let mut guard = self.inner.write().await;
        let before = guard.len();
        guard.retain(|instance| instance.id != id);
        guard.len() != before
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<InstanceRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .iter()
            .filter(|instance| filter.matches(instance))
            .cloned()
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
