//! IP address allocation and management module.
//!
//! This module holds the allocation rules of the service: address parsing
//! and MAC derivation, the per-subnet free pool, and the registry operations
//! that move addresses between the pool and named allocations.

pub mod address;
pub mod pool;
pub mod registry;

// Re-export commonly used types
pub use address::{derive_mac, parse_ipv4, AddressError, MacAddress};
pub use pool::{Allocation, Subnet};
pub use registry::{IpamError, Registry, SubnetDetails, UsedAddress};
