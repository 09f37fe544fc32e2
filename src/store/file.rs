//! JSON file backend for the registry.

use log::{debug, info, warn};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{RegistryStore, StoreError};
use crate::ip::Registry;

/// Registry persisted as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the document is written to before being renamed into place
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> Result<Registry, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Registry file {:?} does not exist, creating an empty registry", self.path);
                let registry = Registry::new();
                self.save(&registry)?;
                return Ok(registry);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut registry: Registry = serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })?;
        for note in registry.repair() {
            warn!("Repaired registry {:?}: {}", self.path, note);
        }
        registry
            .check_invariants()
            .map_err(|reason| StoreError::CorruptState { reason })?;

        debug!("Loaded registry from {:?} ({} bytes)", self.path, bytes.len());
        Ok(registry)
    }

    fn save(&self, registry: &Registry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_vec_pretty(registry).map_err(StoreError::Encode)?;
        let temp = self.temp_path();
        fs::write(&temp, &body).map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Saved registry to {:?} ({} bytes)", self.path, body.len());
        Ok(())
    }
}
