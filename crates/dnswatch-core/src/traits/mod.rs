//! Core traits for dnswatch
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Inventory`]: Query running instances from the cloud inventory
//! - [`HostsSink`]: Destination for the serialized hosts table
//! - [`Sleeper`]: Clock used by the poll loop

pub mod hosts_sink;
pub mod inventory;
pub mod sleeper;

pub use hosts_sink::HostsSink;
pub use inventory::{
    InstanceFilter, InstanceRecord, InstanceState, Inventory, InventoryDocument, InventoryFactory,
};
pub use sleeper::Sleeper;
