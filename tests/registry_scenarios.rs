#[cfg(test)]
mod registry_scenarios {
    use std::collections::HashSet;
    use std::net::Ipv4Addr;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::TempDir;

    use ipam::ip::{derive_mac, parse_ipv4, IpamError, Registry};
    use ipam::service::IpamService;
    use ipam::store::{JsonFileStore, RegistryStore};

    fn ips(addresses: &[Ipv4Addr]) -> Vec<String> {
        addresses.iter().map(|a| a.to_string()).collect()
    }

    /// Pool strictly ascending and disjoint from every allocation
    fn assert_invariants(registry: &Registry) {
        for name in registry.list_subnets() {
            let subnet = registry.subnet(&name).unwrap();
            let pool = subnet.pool();
            for pair in pool.windows(2) {
                assert!(u32::from(pair[0]) < u32::from(pair[1]), "pool of {} not strictly ascending", name);
            }
            let free: HashSet<Ipv4Addr> = pool.iter().copied().collect();
            for (holder, allocation) in subnet.allocated() {
                assert!(!free.contains(&allocation.ip), "{} of {} is also free", allocation.ip, holder);
                assert_eq!(allocation.mac, derive_mac(allocation.ip));
            }
            assert!(subnet.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_lab_scenario() {
        let mut registry = Registry::new();
        registry.create_subnet("lab").unwrap();
        registry.add_range("lab", "10.0.0.1", "10.0.0.3").unwrap();
        assert_eq!(ips(registry.subnet("lab").unwrap().pool()), vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        let host1 = registry.next_address("lab", "host1").unwrap();
        assert_eq!(host1.ip.to_string(), "10.0.0.1");
        assert_eq!(host1.mac.to_string(), "02:42:0a:00:00:01");

        let host2 = registry.next_address("lab", "host2").unwrap();
        assert_eq!(host2.ip.to_string(), "10.0.0.2");
        assert_eq!(host2.mac.to_string(), "02:42:0a:00:00:02");

        assert_eq!(registry.release("lab", "host1").unwrap().to_string(), "10.0.0.1");
        assert_eq!(ips(registry.subnet("lab").unwrap().pool()), vec!["10.0.0.1", "10.0.0.3"]);

        let host3 = registry.next_address("lab", "host3").unwrap();
        assert_eq!(host3.ip.to_string(), "10.0.0.1");
        assert_invariants(&registry);
    }

    #[test]
    fn test_failure_scenarios() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.add_range("ghost", "10.0.0.1", "10.0.0.2"),
            Err(IpamError::SubnetNotFound { .. })
        ));

        registry.create_subnet("lab").unwrap();
        assert!(matches!(
            registry.add_range("lab", "10.0.0.5", "10.0.0.1"),
            Err(IpamError::InvalidRange { .. })
        ));
        assert!(matches!(
            registry.next_address("lab", "host1"),
            Err(IpamError::PoolExhausted { .. })
        ));
        assert!(matches!(
            registry.release("lab", "host1"),
            Err(IpamError::AllocationNotFound { .. })
        ));
    }

    #[test]
    fn test_add_range_is_idempotent() {
        let mut once = Registry::new();
        once.create_subnet("lab").unwrap();
        once.add_range("lab", "192.168.0.250", "192.168.1.5").unwrap();

        let mut twice = once.clone();
        assert_eq!(twice.add_range("lab", "192.168.0.250", "192.168.1.5").unwrap(), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_next_address_is_idempotent() {
        let mut registry = Registry::new();
        registry.create_subnet("lab").unwrap();
        registry.add_range("lab", "10.0.0.1", "10.0.0.4").unwrap();

        let first = registry.next_address("lab", "db").unwrap();
        let pool_after_first = registry.subnet("lab").unwrap().pool().to_vec();
        let second = registry.next_address("lab", "db").unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.subnet("lab").unwrap().pool(), pool_after_first.as_slice());
    }

    #[test]
    fn test_release_restores_pool() {
        let mut registry = Registry::new();
        registry.create_subnet("lab").unwrap();
        registry.add_range("lab", "10.0.0.1", "10.0.0.10").unwrap();
        registry.next_address("lab", "a").unwrap();
        registry.next_address("lab", "b").unwrap();

        let before = registry.subnet("lab").unwrap().pool().to_vec();
        registry.next_address("lab", "c").unwrap();
        registry.release("lab", "c").unwrap();

        assert_eq!(registry.subnet("lab").unwrap().pool(), before.as_slice());
        assert!(registry.subnet("lab").unwrap().allocation("c").is_none());
    }

    #[test]
    fn test_deterministic_mac() {
        let address = parse_ipv4("10.0.0.5").unwrap();
        assert_eq!(derive_mac(address).to_string(), "02:42:0a:00:00:05");
        assert_eq!(derive_mac(address), derive_mac(address));
    }

    #[test]
    fn test_large_range_is_enumerated_fully() {
        let mut registry = Registry::new();
        registry.create_subnet("10.0.0.0/16").unwrap();
        let added = registry.add_range("10.0.0.0/16", "10.0.0.0", "10.0.255.255").unwrap();

        assert_eq!(added, 65_536);
        let pool = registry.subnet("10.0.0.0/16").unwrap().pool();
        assert_eq!(pool.first().unwrap().to_string(), "10.0.0.0");
        assert_eq!(pool.last().unwrap().to_string(), "10.0.255.255");
    }

    #[test]
    fn test_random_operation_sequences_preserve_invariants() {
        let mut rng = StdRng::seed_from_u64(0x1bad_b002);
        let subnets = ["lab", "dmz"];
        let names: Vec<String> = (0..12).map(|i| format!("host{}", i)).collect();

        let mut registry = Registry::new();
        for subnet in subnets {
            registry.create_subnet(subnet).unwrap();
        }

        for _ in 0..2_000 {
            let subnet = subnets[rng.gen_range(0..subnets.len())];
            match rng.gen_range(0..3) {
                0 => {
                    let start: u32 = rng.gen_range(0..40);
                    let end = start + rng.gen_range(0..6);
                    let start = Ipv4Addr::new(10, 0, 0, start as u8).to_string();
                    let end = Ipv4Addr::new(10, 0, 0, end as u8).to_string();
                    registry.add_range(subnet, &start, &end).unwrap();
                }
                1 => {
                    let name = &names[rng.gen_range(0..names.len())];
                    let held = registry.subnet(subnet).unwrap().allocation(name).copied();
                    let pool_len = registry.subnet(subnet).unwrap().pool().len();
                    match registry.next_address(subnet, name) {
                        Ok(allocation) => {
                            if let Some(held) = held {
                                assert_eq!(allocation, held);
                                assert_eq!(registry.subnet(subnet).unwrap().pool().len(), pool_len);
                            }
                        }
                        Err(IpamError::PoolExhausted { .. }) => assert_eq!(pool_len, 0),
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                _ => {
                    let name = &names[rng.gen_range(0..names.len())];
                    match registry.release(subnet, name) {
                        Ok(ip) => assert!(registry.subnet(subnet).unwrap().pool().contains(&ip)),
                        Err(IpamError::AllocationNotFound { .. }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            }
            assert_invariants(&registry);
        }
    }

    #[test]
    fn test_file_store_round_trip_through_service() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ipam.json");

        {
            let service = IpamService::new(JsonFileStore::new(&path));
            service.create_subnet("10.20.0.0/24").unwrap();
            service.add_range("10.20.0.0/24", "10.20.0.1", "10.20.0.5").unwrap();
            service.next_address("10.20.0.0/24", "router").unwrap();
            service.next_address("10.20.0.0/24", "switch").unwrap();
            service.release("10.20.0.0/24", "router").unwrap();
        }

        // a fresh service sees exactly what the previous one committed
        let service = IpamService::new(JsonFileStore::new(&path));
        let details = service.subnet_details("10.20.0.0/24").unwrap();
        assert_eq!(details.used.len(), 1);
        assert_eq!(details.used[0].name, "switch");
        assert_eq!(details.used[0].ip.to_string(), "10.20.0.2");
        assert_eq!(
            ips(&details.free),
            vec!["10.20.0.1", "10.20.0.3", "10.20.0.4", "10.20.0.5"]
        );

        let store = JsonFileStore::new(&path);
        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), loaded);

        let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            document["subnets"]["10.20.0.0/24"]["allocated"]["switch"],
            serde_json::json!({"ip": "10.20.0.2", "mac": "02:42:0a:14:00:02"})
        );
    }
}
