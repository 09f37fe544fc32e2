//! IPv4 address and MAC address helpers.
//!
//! This file contains the parsing, ordering and formatting rules for the
//! IPv4 addresses kept in subnet pools, and the deterministic MAC address
//! derivation used when an address is handed out.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Fixed leading bytes of every derived MAC address (locally administered, unicast)
pub const MAC_PREFIX: [u8; 2] = [0x02, 0x42];

/// Errors that can occur while parsing addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("'{input}' does not appear to be an IPv4 address")]
    InvalidIpv4 { input: String },

    #[error("'{input}' does not appear to be a MAC address")]
    InvalidMac { input: String },
}

/// Parse a dotted-quad string into an IPv4 address.
///
/// Exactly four decimal octets in `[0, 255]` are accepted. Leading zeros,
/// surrounding whitespace and any other content are rejected.
///
/// # Examples
/// ```
/// use ipam::ip::address::parse_ipv4;
///
/// assert_eq!(parse_ipv4("10.0.0.5").unwrap().octets(), [10, 0, 0, 5]);
/// assert!(parse_ipv4("10.0.0").is_err());
/// assert!(parse_ipv4("10.0.0.256").is_err());
/// ```
pub fn parse_ipv4(input: &str) -> Result<Ipv4Addr, AddressError> {
    input.parse::<Ipv4Addr>().map_err(|_| AddressError::InvalidIpv4 {
        input: input.to_string(),
    })
}

/// Numeric ordering over the 32-bit value of two addresses
pub fn compare(a: Ipv4Addr, b: Ipv4Addr) -> Ordering {
    u32::from(a).cmp(&u32::from(b))
}

/// Canonical dotted-quad rendering
pub fn format(address: Ipv4Addr) -> String {
    address.to_string()
}

/// Every address from `start` to `end` inclusive, in ascending order.
///
/// Yields nothing when `start > end`.
pub fn address_range(start: Ipv4Addr, end: Ipv4Addr) -> impl Iterator<Item = Ipv4Addr> {
    (u32::from(start)..=u32::from(end)).map(Ipv4Addr::from)
}

/// Derive the MAC address for an IPv4 address: `02:42` followed by the four octets.
///
/// # Examples
/// ```
/// use ipam::ip::address::{derive_mac, parse_ipv4};
///
/// let mac = derive_mac(parse_ipv4("10.0.0.5").unwrap());
/// assert_eq!(mac.to_string(), "02:42:0a:00:00:05");
/// ```
pub fn derive_mac(address: Ipv4Addr) -> MacAddress {
    let [a, b, c, d] = address.octets();
    MacAddress([MAC_PREFIX[0], MAC_PREFIX[1], a, b, c, d])
}

/// A 6-byte hardware address rendered as lowercase, colon-separated hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::InvalidMac {
            input: s.to_string(),
        };

        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(MacAddress(bytes))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
