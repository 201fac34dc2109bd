//! Inventory snapshots
//!
//! A [`Snapshot`] is the full host table derived from one inventory query.
//! Instances are sorted by id before naming, so the serialized table is
//! deterministic for a given inventory state regardless of the order the
//! provider answers in.

use crate::error::Result;
use crate::naming::{HostEntry, NamingRules};
use crate::traits::{InstanceFilter, InstanceRecord, Inventory};
use tracing::{debug, warn};

/// The complete host table from one poll cycle
#[derive(Debug, Clone)]
pub struct Snapshot {
    entries: Vec<HostEntry>,
    serialized: String,
}

impl Snapshot {
    /// Build a snapshot from entries that are already in their final order
    pub fn from_entries(entries: Vec<HostEntry>) -> Self {
        let serialized = entries.iter().map(|entry| format!("{}\n", entry)).collect();
        Self {
            entries,
            serialized,
        }
    }

    /// Derive a snapshot from raw instances
    pub fn from_instances(rules: &NamingRules, mut instances: Vec<InstanceRecord>) -> Self {
        instances.sort_by(|a, b| a.id.cmp(&b.id));

        for instance in &instances {
            if let Err(e) = rules.validate(instance) {
                warn!("Skipping instance: {}", e);
            }
        }

        let entries = instances
            .iter()
            .flat_map(|instance| rules.entries(instance))
            .collect();

        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[HostEntry] {
        &self.entries
    }

    /// Exact file content: one `address<TAB>hostname` line per entry
    pub fn serialized(&self) -> &str {
        &self.serialized
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshots compare by serialized content only
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized
    }
}

impl Eq for Snapshot {}

/// Queries the inventory and derives snapshots
pub struct SnapshotBuilder {
    inventory: Box<dyn Inventory>,
    rules: NamingRules,
    filter: InstanceFilter,
}

impl SnapshotBuilder {
    pub fn new(inventory: Box<dyn Inventory>, rules: NamingRules, filter: InstanceFilter) -> Self {
        Self {
            inventory,
            rules,
            filter,
        }
    }

    pub fn filter(&self) -> &InstanceFilter {
        &self.filter
    }

    /// Query the inventory and build a snapshot
    ///
    /// Query failures propagate to the caller unchanged.
    pub async fn build(&self) -> Result<Snapshot> {
        let instances = self.inventory.list_instances(&self.filter).await?;

        debug!(
            provider = self.inventory.provider_name(),
            scope = %self.filter.tag_value,
            "Listed {} instance(s)",
            instances.len()
        );

        Ok(Snapshot::from_instances(&self.rules, instances))
    }
}
