// # Inventory Trait
//
// Defines the interface for querying the cloud inventory.
//
// ## Implementations
//
// - In-process: `MemoryInventory` (tests, embedding)
// - JSON document on disk: `FileInventory`
// - JSON endpoint over HTTP(S): `dnswatch-inventory-http` crate
//
// ## Usage
//
// ```rust,ignore
// use dnswatch_core::{InstanceFilter, Inventory};
//
// #[tokio::main]
// async fn main() -> dnswatch_core::Result<()> {
//     let inventory = /* Inventory implementation */;
//
//     let filter = InstanceFilter::running("substrate:zone", "corp");
//     for instance in inventory.list_instances(&filter).await? {
//         println!("{} {:?}", instance.id, instance.private_address);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Lifecycle state of an instance, as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    #[default]
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
}

impl InstanceState {
    /// Wire name of the state (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One instance as seen in a single inventory query
///
/// Records are owned by the provider; the core only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Opaque unique identifier (e.g. "i-0ef8d0a59f62d5fb1")
    pub id: String,

    /// Private network address, absent when none is assigned
    #[serde(default)]
    pub private_address: Option<IpAddr>,

    /// Lifecycle state
    #[serde(default)]
    pub state: InstanceState,

    /// Tag key → value
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl InstanceRecord {
    /// Create a running instance with no address and no tags
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            private_address: None,
            state: InstanceState::Running,
            tags: HashMap::new(),
        }
    }

    /// Set the private address
    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.private_address = Some(address);
        self
    }

    /// Set the lifecycle state
    pub fn with_state(mut self, state: InstanceState) -> Self {
        self.state = state;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Look up a tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Selects the subset of inventory relevant to this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFilter {
    /// Required lifecycle state
    pub state: InstanceState,
    /// Tag key that carries the scope (e.g. "substrate:zone")
    pub tag_key: String,
    /// Required value of `tag_key`
    pub tag_value: String,
}

impl InstanceFilter {
    /// Filter for running instances whose `tag_key` equals `tag_value`
    pub fn running(tag_key: impl Into<String>, tag_value: impl Into<String>) -> Self {
        Self {
            state: InstanceState::Running,
            tag_key: tag_key.into(),
            tag_value: tag_value.into(),
        }
    }

    /// Check a record against this filter
    pub fn matches(&self, instance: &InstanceRecord) -> bool {
        instance.state == self.state && instance.tag(&self.tag_key) == Some(self.tag_value.as_str())
    }
}

/// JSON document shared by the file and HTTP inventories
///
/// ```json
/// {
///   "instances": [
///     {
///       "id": "i-1",
///       "private_address": "10.0.0.5",
///       "state": "running",
///       "tags": { "substrate:zone": "corp", "substrate:role": "director-0" }
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

impl InventoryDocument {
    /// Parse a document from JSON text
    pub fn parse(body: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(body)?)
    }

    /// Keep only the instances matching `filter`
    pub fn into_matching(self, filter: &InstanceFilter) -> Vec<InstanceRecord> {
        self.instances
            .into_iter()
            .filter(|instance| filter.matches(instance))
            .collect()
    }
}

/// Trait for inventory provider implementations
///
/// # Contract
///
/// - Return only instances matching the filter (state and scope tag)
/// - Return every tag of each matching instance
/// - No ordering guarantee is required; the snapshot builder sorts
/// - Propagate failures as errors; the `Watcher` owns backoff and retry
/// - Read-only: never mutate provider-side state
///
/// Providers must not spawn background tasks or cache results across
/// queries. Each call is a single, complete query.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// List instances matching `filter`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<InstanceRecord>)`: Matching instances, in any order
    /// - `Err(Error)`: The provider could not be reached or answered badly
    async fn list_instances(
        &self,
        filter: &InstanceFilter,
    ) -> Result<Vec<InstanceRecord>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing inventories from configuration
pub trait InventoryFactory: Send + Sync {
    /// Create an Inventory instance from configuration
    ///
    /// Failure here is a startup (configuration) error.
    fn create(
        &self,
        config: &crate::config::InventoryConfig,
    ) -> Result<Box<dyn Inventory>, crate::Error>;
}
