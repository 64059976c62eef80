//! Plugin-based record store registry
//!
//! Record stores register a factory under a type name, and the driver builds
//! whichever one its configuration names without a hardcoded match.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use porkdns_core::registry::StoreRegistry;
//! use porkdns_core::config::StoreConfig;
//!
//! let registry = StoreRegistry::new();
//! porkdns_provider_porkbun::register(&registry);
//!
//! let config = StoreConfig::Porkbun { ... };
//! let store = registry.create_store(&config)?;
//! ```
//!
//! ## Registration
//!
//! Store crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &StoreRegistry) {
//!     registry.register_store("porkbun", Box::new(PorkbunFactory));
//! }
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::MemoryRecordStoreFactory;
use crate::traits::{RecordStore, RecordStoreFactory};

/// Registry mapping store type names to factories
///
/// ## Thread Safety
///
/// Interior mutability through an RwLock; registration and lookup can
/// happen from any thread.
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Box<dyn RecordStoreFactory>>>,
}

impl StoreRegistry {
    /// Create a registry with the built-in "memory" store registered
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_store("memory", Box::new(MemoryRecordStoreFactory));
        registry
    }

    /// Create a registry with nothing registered
    pub fn empty() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Register a record store factory under `name`
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn RecordStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), factory);
    }

    /// Create a record store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordStore>)`: the created store
    /// - `Err(Error::Config)`: the type is not registered
    /// - `Err(Error)`: the factory rejected the configuration
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        let store_type = config.type_name();
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?;

        factory.create(config)
    }

    /// List all registered store types, sorted
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}
