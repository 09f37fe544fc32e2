//! # Registry Store
//!
//! Durable storage for the subnet registry. Every service operation loads the
//! whole registry, works on it in memory and, for mutations, saves it back.
//!
//! ## Backends
//!
//! - [`JsonFileStore`]: a single pretty-printed JSON document on disk
//! - [`MemoryStore`]: process-local state for tests and embedding
//!
//! ## Document Layout
//!
//! ```json
//! {
//!   "subnets": {
//!     "10.0.0.0/24": {
//!       "allocated": {
//!         "web01": { "ip": "10.0.0.1", "mac": "02:42:0a:00:00:01" }
//!       },
//!       "pool": ["10.0.0.2", "10.0.0.3"]
//!     }
//!   }
//! }
//! ```
//!
//! Decoding is strict: unknown or missing fields and malformed addresses are
//! rejected. Pools that are unsorted, hold duplicates or still list allocated
//! addresses are repaired on load (older writers left them that way); a
//! document with an address held twice or a MAC that does not match its IP
//! is reported as [`StoreError::CorruptState`].

use std::path::PathBuf;

use crate::ip::Registry;

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Errors that can occur while loading or saving the registry
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access registry file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode registry file '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode registry: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Registry state is corrupt: {reason}")]
    CorruptState { reason: String },
}

/// Backing storage for the registry
pub trait RegistryStore: Send + Sync {
    /// Load the current registry, creating an empty one if none exists yet
    fn load(&self) -> Result<Registry, StoreError>;

    /// Durably replace the stored registry
    fn save(&self, registry: &Registry) -> Result<(), StoreError>;
}
