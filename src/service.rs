//! IPAM service.
//!
//! Wraps a [`RegistryStore`] and runs every operation as one
//! load → mutate → save cycle. A single lock serialises the cycles, so two
//! concurrent requests can never both take the same free address or
//! overwrite each other's update. Nothing is cached between operations; the
//! store is the only source of truth.

use log::{error, info, warn};
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ip::{Allocation, IpamError, Registry, SubnetDetails};
use crate::store::RegistryStore;

/// Entry point for all registry operations
pub struct IpamService {
    store: Box<dyn RegistryStore>,
    lock: Mutex<()>,
}

impl IpamService {
    pub fn new(store: impl RegistryStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<Registry, IpamError> {
        self.store.load().map_err(|e| {
            error!("Failed to load registry: {}", e);
            IpamError::from(e)
        })
    }

    fn save(&self, registry: &Registry) -> Result<(), IpamError> {
        self.store.save(registry).map_err(|e| {
            error!("Failed to save registry: {}", e);
            IpamError::from(e)
        })
    }

    /// Run a mutation under the lock and persist the result.
    ///
    /// Nothing is saved when the mutation fails, and a failed save is returned
    /// to the caller instead of the mutation's result.
    fn mutate<T>(
        &self,
        operation: &str,
        apply: impl FnOnce(&mut Registry) -> Result<T, IpamError>,
    ) -> Result<T, IpamError> {
        let _guard = self.guard();
        let mut registry = self.load()?;
        let result = apply(&mut registry).inspect_err(|e| warn!("{} rejected: {}", operation, e))?;
        self.save(&registry)?;
        Ok(result)
    }

    fn read<T>(&self, apply: impl FnOnce(&Registry) -> Result<T, IpamError>) -> Result<T, IpamError> {
        let _guard = self.guard();
        let registry = self.load()?;
        apply(&registry)
    }

    /// Create a new empty subnet
    pub fn create_subnet(&self, subnet: &str) -> Result<(), IpamError> {
        self.mutate("create-subnet", |registry| registry.create_subnet(subnet))?;
        info!("Created subnet {}", subnet);
        Ok(())
    }

    /// Add an inclusive address range to a subnet's pool; returns how many addresses were new
    pub fn add_range(&self, subnet: &str, start_ip: &str, end_ip: &str) -> Result<usize, IpamError> {
        let added = self.mutate("add-range", |registry| registry.add_range(subnet, start_ip, end_ip))?;
        info!("Added IP range {} - {} to subnet {} ({} new addresses)", start_ip, end_ip, subnet, added);
        Ok(added)
    }

    /// Hand out the next free address of a subnet to `name`.
    ///
    /// Repeating the call for a name that already holds an address returns
    /// that address and does not write to the store.
    pub fn next_address(&self, subnet: &str, name: &str) -> Result<Allocation, IpamError> {
        let _guard = self.guard();
        let mut registry = self.load()?;

        if let Some(existing) = registry.subnet(subnet).and_then(|s| s.allocation(name)) {
            info!("{} already holds {} in subnet {}", name, existing.ip, subnet);
            return Ok(*existing);
        }

        let allocation = registry
            .next_address(subnet, name)
            .inspect_err(|e| warn!("next-ip rejected: {}", e))?;
        self.save(&registry)?;

        info!("Allocated {} ({}) to {} in subnet {}", allocation.ip, allocation.mac, name, subnet);
        Ok(allocation)
    }

    /// Release the address held by `name` back into the subnet's pool
    pub fn release(&self, subnet: &str, name: &str) -> Result<Ipv4Addr, IpamError> {
        let ip = self.mutate("release", |registry| registry.release(subnet, name))?;
        info!("Released {} held by {} in subnet {}", ip, name, subnet);
        Ok(ip)
    }

    /// Names of all subnets
    pub fn list_subnets(&self) -> Result<Vec<String>, IpamError> {
        self.read(|registry| Ok(registry.list_subnets()))
    }

    /// Allocations and free pool of one subnet
    pub fn subnet_details(&self, subnet: &str) -> Result<SubnetDetails, IpamError> {
        self.read(|registry| registry.subnet_details(subnet))
    }
}
