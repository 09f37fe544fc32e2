//! Subnet registry.
//!
//! The registry is the root of all persisted state: a map from subnet name to
//! its pool and allocation table. The operations here are the allocation
//! rules of the service; they work purely on the in-memory registry and leave
//! loading and saving to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use super::address::{compare, parse_ipv4, AddressError, MacAddress};
use super::pool::{Allocation, Subnet};
use crate::store::StoreError;

/// Errors reported by registry operations
#[derive(Debug, thiserror::Error)]
pub enum IpamError {
    #[error("Subnet not found: {subnet}")]
    SubnetNotFound { subnet: String },

    #[error("Subnet already exists: {subnet}")]
    SubnetAlreadyExists { subnet: String },

    #[error("Invalid IP address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Start IP {start} is greater than end IP {end}")]
    InvalidRange { start: Ipv4Addr, end: Ipv4Addr },

    #[error("IP pool exhausted in subnet {subnet}")]
    PoolExhausted { subnet: String },

    #[error("No IP allocated to '{name}' in subnet {subnet}")]
    AllocationNotFound { subnet: String, name: String },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// One row of the "used" listing of a subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsedAddress {
    pub name: String,
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
}

/// Snapshot of a subnet's allocations and free pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetDetails {
    pub subnet: String,
    pub used: Vec<UsedAddress>,
    pub free: Vec<Ipv4Addr>,
}

/// All subnets, keyed by their (opaque) name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registry {
    subnets: BTreeMap<String, Subnet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a subnet by name
    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets.get(name)
    }

    fn subnet_mut(&mut self, name: &str) -> Result<&mut Subnet, IpamError> {
        self.subnets.get_mut(name).ok_or_else(|| IpamError::SubnetNotFound {
            subnet: name.to_string(),
        })
    }

    /// Register a new, empty subnet
    pub fn create_subnet(&mut self, name: &str) -> Result<(), IpamError> {
        if self.subnets.contains_key(name) {
            return Err(IpamError::SubnetAlreadyExists {
                subnet: name.to_string(),
            });
        }
        self.subnets.insert(name.to_string(), Subnet::new());
        Ok(())
    }

    /// Add the inclusive range `start_ip..=end_ip` to a subnet's pool.
    ///
    /// Addresses already known to the subnet are left alone, so adding the
    /// same range twice is a no-op the second time. The work is proportional
    /// to the size of the range and there is no upper bound on it.
    ///
    /// Returns the number of addresses that were new to the pool.
    pub fn add_range(&mut self, subnet: &str, start_ip: &str, end_ip: &str) -> Result<usize, IpamError> {
        let data = self.subnet_mut(subnet)?;

        let start = parse_ipv4(start_ip)?;
        let end = parse_ipv4(end_ip)?;
        if compare(start, end).is_gt() {
            return Err(IpamError::InvalidRange { start, end });
        }

        let added = data.add_range(start, end);
        log::debug!("Added {} new addresses ({} - {}) to subnet {}", added, start, end, subnet);
        Ok(added)
    }

    /// Hand out the next free address of a subnet to `name`.
    ///
    /// A name that already holds an address in the subnet gets the same
    /// allocation back without touching the pool.
    pub fn next_address(&mut self, subnet: &str, name: &str) -> Result<Allocation, IpamError> {
        self.subnet_mut(subnet)?
            .allocate(name)
            .ok_or_else(|| IpamError::PoolExhausted {
                subnet: subnet.to_string(),
            })
    }

    /// Release the address held by `name` back into the subnet's pool
    pub fn release(&mut self, subnet: &str, name: &str) -> Result<Ipv4Addr, IpamError> {
        self.subnet_mut(subnet)?
            .release(name)
            .map(|allocation| allocation.ip)
            .ok_or_else(|| IpamError::AllocationNotFound {
                subnet: subnet.to_string(),
                name: name.to_string(),
            })
    }

    /// Names of all subnets, in ascending order
    pub fn list_subnets(&self) -> Vec<String> {
        self.subnets.keys().cloned().collect()
    }

    /// Allocations and free pool of one subnet
    pub fn subnet_details(&self, subnet: &str) -> Result<SubnetDetails, IpamError> {
        let data = self.subnet(subnet).ok_or_else(|| IpamError::SubnetNotFound {
            subnet: subnet.to_string(),
        })?;

        let used = data
            .allocated()
            .iter()
            .map(|(name, allocation)| UsedAddress {
                name: name.clone(),
                ip: allocation.ip,
                mac: allocation.mac,
            })
            .collect();

        Ok(SubnetDetails {
            subnet: subnet.to_string(),
            used,
            free: data.pool().to_vec(),
        })
    }

    /// Normalize every subnet's pool, see [`Subnet::repair`].
    ///
    /// Returns one line per subnet that had to be changed.
    pub fn repair(&mut self) -> Vec<String> {
        let mut notes = Vec::new();
        for (name, subnet) in &mut self.subnets {
            match subnet.repair() {
                (0, false) => {}
                (removed, reordered) => notes.push(format!(
                    "subnet {}: dropped {} stale pool entries{}",
                    name,
                    removed,
                    if reordered { ", re-sorted pool" } else { "" }
                )),
            }
        }
        notes
    }

    /// Check every subnet for pool ordering, uniqueness and disjointness
    pub fn check_invariants(&self) -> Result<(), String> {
        for (name, subnet) in &self.subnets {
            subnet
                .check_invariants()
                .map_err(|reason| format!("subnet {}: {}", name, reason))?;
        }
        Ok(())
    }
}
