//! Per-subnet address pool.
//!
//! A subnet keeps its free addresses in a pool sorted by numeric value and
//! maps consumer names to the addresses handed out to them. An address is
//! always in exactly one of the two containers once it has been added.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

use super::address::{address_range, compare, derive_mac, MacAddress};

/// An address handed out to a named consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Allocation {
    pub ip: Ipv4Addr,
    pub mac: MacAddress,
}

impl Allocation {
    /// Build the allocation for an address, deriving its MAC
    pub fn for_address(ip: Ipv4Addr) -> Self {
        Allocation { ip, mac: derive_mac(ip) }
    }
}

/// Free pool and allocation table for one subnet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subnet {
    allocated: BTreeMap<String, Allocation>,
    pool: Vec<Ipv4Addr>,
}

impl Subnet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free addresses in ascending numeric order
    pub fn pool(&self) -> &[Ipv4Addr] {
        &self.pool
    }

    /// Live allocations keyed by consumer name
    pub fn allocated(&self) -> &BTreeMap<String, Allocation> {
        &self.allocated
    }

    /// Look up the live allocation for a consumer
    pub fn allocation(&self, name: &str) -> Option<&Allocation> {
        self.allocated.get(name)
    }

    /// Add every address from `start` to `end` inclusive to the pool.
    ///
    /// Addresses already free or currently allocated are skipped. Returns the
    /// number of addresses that were actually added.
    pub fn add_range(&mut self, start: Ipv4Addr, end: Ipv4Addr) -> usize {
        let known: HashSet<Ipv4Addr> = self
            .pool
            .iter()
            .copied()
            .chain(self.allocated.values().map(|a| a.ip))
            .collect();
        let fresh: Vec<Ipv4Addr> = address_range(start, end).filter(|ip| !known.contains(ip)).collect();
        let added = fresh.len();

        self.pool.extend(fresh);
        self.normalize_pool();

        added
    }

    fn normalize_pool(&mut self) {
        self.pool.sort_unstable_by(|a, b| compare(*a, *b));
        self.pool.dedup();
    }

    /// Bring a pool written by an older or careless writer back into shape.
    ///
    /// Sorts and deduplicates the pool and drops free entries that are also
    /// allocated. Returns the number of pool entries removed and whether the
    /// order had to change, as `(removed, reordered)`. Double allocations and
    /// wrong MACs are not touched; [`Subnet::check_invariants`] reports them.
    pub fn repair(&mut self) -> (usize, bool) {
        let reordered = self
            .pool
            .windows(2)
            .any(|pair| compare(pair[0], pair[1]).is_gt());
        let before = self.pool.len();

        let in_use: HashSet<Ipv4Addr> = self.allocated.values().map(|a| a.ip).collect();
        self.pool.retain(|ip| !in_use.contains(ip));
        self.normalize_pool();

        (before - self.pool.len(), reordered)
    }

    /// Hand out an address to `name`.
    ///
    /// A consumer that already holds an address gets the same allocation back
    /// and the pool is untouched. Otherwise the smallest free address is taken.
    /// Returns `None` when the consumer has nothing and the pool is empty.
    pub fn allocate(&mut self, name: &str) -> Option<Allocation> {
        if let Some(existing) = self.allocated.get(name) {
            return Some(*existing);
        }
        if self.pool.is_empty() {
            return None;
        }

        let allocation = Allocation::for_address(self.pool.remove(0));
        self.allocated.insert(name.to_string(), allocation);
        Some(allocation)
    }

    /// Return the address held by `name` to the pool
    pub fn release(&mut self, name: &str) -> Option<Allocation> {
        let allocation = self.allocated.remove(name)?;
        if let Err(slot) = self.pool.binary_search_by(|probe| compare(*probe, allocation.ip)) {
            self.pool.insert(slot, allocation.ip);
        }
        Some(allocation)
    }

    /// Verify pool ordering, uniqueness, disjointness and MAC derivation
    pub fn check_invariants(&self) -> Result<(), String> {
        for pair in self.pool.windows(2) {
            if compare(pair[0], pair[1]).is_ge() {
                return Err(format!(
                    "pool is not strictly ascending at {} -> {}",
                    pair[0], pair[1]
                ));
            }
        }

        let mut holders: HashSet<Ipv4Addr> = HashSet::new();
        for (name, allocation) in &self.allocated {
            if allocation.mac != derive_mac(allocation.ip) {
                return Err(format!(
                    "allocation '{}' has MAC {} which does not match IP {}",
                    name, allocation.mac, allocation.ip
                ));
            }
            if !holders.insert(allocation.ip) {
                return Err(format!("IP {} is allocated more than once", allocation.ip));
            }
            if self.pool.binary_search_by(|probe| compare(*probe, allocation.ip)).is_ok() {
                return Err(format!(
                    "IP {} is allocated to '{}' but is also in the free pool",
                    allocation.ip, name
                ));
            }
        }

        Ok(())
    }
}
