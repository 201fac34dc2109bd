// # dnswatch-core
//
// Core library for deriving a local hosts table from cloud inventory.
//
// ## Architecture Overview
//
// - **Inventory**: Trait for listing running instances and their tags
// - **NamingRules**: Pure mapping from one instance to its DNS names
// - **SnapshotBuilder**: Inventory query → sorted, serialized host table
// - **Publisher**: Writes a snapshot through a HostsSink only when it changed
// - **Watcher**: Poll loop that owns the baseline, the cadence and failure backoff
// - **InventoryRegistry**: Plugin-based registry for inventory providers
//
// ## Data Flow
//
// Inventory → SnapshotBuilder → Publisher → HostsSink (filesystem)
//
// The Watcher drives cadence and recovery. It holds no naming logic itself.

pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod naming;
pub mod publisher;
pub mod registry;
pub mod schedule;
pub mod sink;
pub mod snapshot;
pub mod traits;

// Re-export core types for convenience
pub use config::{InventoryConfig, NamingConfig, OutputConfig, ScheduleConfig, WatchConfig};
pub use engine::{CycleOutcome, WatchEvent, Watcher};
pub use error::{Error, Result};
pub use inventory::{FileInventory, MemoryInventory};
pub use naming::{HostEntry, NamingRules};
pub use publisher::{PublishOutcome, Publisher};
pub use registry::InventoryRegistry;
pub use schedule::{Schedule, TokioSleeper};
pub use sink::{DryRunSink, FileSink, MemorySink};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use traits::{HostsSink, InstanceFilter, InstanceRecord, InstanceState, Inventory, Sleeper};
