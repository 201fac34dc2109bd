// # Inventory Implementations
//
// This module provides implementations of the Inventory trait that need
// nothing beyond the core crate. Network-backed inventories live in their
// own crates.

pub mod file;
pub mod memory;

pub use file::{FileInventory, FileInventoryFactory};
pub use memory::MemoryInventory;
