//! Plugin-based inventory registry
//!
//! The registry allows inventory providers to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnswatch_core::registry::InventoryRegistry;
//! use dnswatch_core::config::InventoryConfig;
//!
//! let registry = InventoryRegistry::with_builtins();
//! dnswatch_inventory_http::register(&registry);
//!
//! let config = InventoryConfig::Http { ... };
//! let inventory = registry.create_inventory(&config)?;
//! ```

use crate::config::InventoryConfig;
use crate::error::{Error, Result};
use crate::inventory::FileInventoryFactory;
use crate::traits::{Inventory, InventoryFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry mapping inventory type names to factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct InventoryRegistry {
    inventories: RwLock<HashMap<String, Box<dyn InventoryFactory>>>,
}

impl InventoryRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the inventories built into this crate ("file")
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_inventory("file", Box::new(FileInventoryFactory));
        registry
    }

    /// Register an inventory factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use dnswatch_core::registry::InventoryRegistry;
    /// # use dnswatch_core::traits::{Inventory, InventoryFactory};
    /// # struct MyFactory;
    /// # impl InventoryFactory for MyFactory {
    /// #     fn create(&self, config: &dnswatch_core::config::InventoryConfig) -> dnswatch_core::Result<Box<dyn Inventory>> { unimplemented!() }
    /// # }
    /// let registry = InventoryRegistry::new();
    /// registry.register_inventory("mine", Box::new(MyFactory));
    /// ```
    pub fn register_inventory(&self, name: impl Into<String>, factory: Box<dyn InventoryFactory>) {
        let mut inventories = self
            .inventories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        inventories.insert(name.into(), factory);
    }

    /// Create an inventory from configuration
    ///
    /// The configuration is validated first. Any failure here is a startup
    /// error.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Inventory>)`: Created inventory
    /// - `Err(Error)`: Invalid config, unknown type, or factory failure
    pub fn create_inventory(&self, config: &InventoryConfig) -> Result<Box<dyn Inventory>> {
        config.validate()?;

        let inventory_type = config.type_name();
        let inventories = self
            .inventories
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = inventories.get(inventory_type).ok_or_else(|| {
            Error::config(format!("Unknown inventory type: {}", inventory_type))
        })?;

        factory.create(config)
    }

    /// List all registered inventory types
    pub fn list_inventories(&self) -> Vec<String> {
        let inventories = self
            .inventories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = inventories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if an inventory type is registered
    pub fn has_inventory(&self, name: &str) -> bool {
        self.inventories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
