//! # IPAM - Minimal IPv4 address management service
//!
//! This library tracks, per named subnet, a pool of free IPv4 addresses and
//! the addresses handed out to named consumers, persisted to a single JSON
//! document.
//!
//! ## Overview
//!
//! Subnets are opaque labels (often, but not necessarily, a CIDR string).
//! Address ranges are merged into a subnet's free pool, the smallest free
//! address is handed out on request, and released addresses go back into
//! the pool in order. Every address of a subnet is either free or allocated,
//! never both.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `ip`: address parsing, MAC derivation, subnet pools and the registry operations
//! - `store`: loading and saving the registry (JSON file or in-memory)
//! - `service`: the serialised load → mutate → save cycle around a store
//! - `http`: the axum-based HTTP API
//! - `config`: YAML service configuration and CLI overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ipam::service::IpamService;
//! use ipam::store::JsonFileStore;
//!
//! let service = IpamService::new(JsonFileStore::new("ipam.json"));
//! service.create_subnet("10.0.0.0/24")?;
//! service.add_range("10.0.0.0/24", "10.0.0.10", "10.0.0.20")?;
//!
//! let allocation = service.next_address("10.0.0.0/24", "web01")?;
//! println!("{} {}", allocation.ip, allocation.mac);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! server:
//!   bind: "0.0.0.0:5000"
//! storage:
//!   path: "/data/ipam.json"
//! log_level: info
//! ```
//!
//! ## Error Handling
//!
//! Registry operations return typed [`ip::IpamError`] values; the HTTP layer
//! maps them to status codes. The binary reports failures through
//! `color_eyre`.

pub mod config;
pub mod http;
pub mod ip;
pub mod service;
pub mod store;
