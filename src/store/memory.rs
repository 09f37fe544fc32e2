//! In-memory backend for the registry.

use std::sync::{Mutex, PoisonError};

use super::{RegistryStore, StoreError};
use crate::ip::Registry;

/// Registry held in process memory; lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Registry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing registry
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            state: Mutex::new(registry),
        }
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Registry, StoreError> {
        Ok(self.state.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, registry: &Registry) -> Result<(), StoreError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = registry.clone();
        Ok(())
    }
}
