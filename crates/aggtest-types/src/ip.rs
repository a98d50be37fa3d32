//! Interface address with prefix length.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An interface address in CIDR notation (e.g., 192.0.2.1/30 or 2001:db8::1/126).
///
/// Unlike a route prefix, the host bits are kept: the address identifies the
/// interface and the length identifies its subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    address: IpAddr,
    prefix_len: u8,
}

impl IpPrefix {
    /// Creates a new interface address.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length is invalid for the address type
    /// (>32 for IPv4, >128 for IPv6).
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self, ParseError> {
        let max_len = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_len > max_len {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum {} for address type",
                prefix_len, max_len
            )));
        }

        Ok(IpPrefix {
            address,
            prefix_len,
        })
    }

    /// Creates an IPv4 interface address; lengths above 32 are clamped.
    pub const fn v4(address: Ipv4Addr, prefix_len: u8) -> Self {
        IpPrefix {
            address: IpAddr::V4(address),
            prefix_len: if prefix_len > 32 { 32 } else { prefix_len },
        }
    }

    /// Creates an IPv6 interface address; lengths above 128 are clamped.
    pub const fn v6(address: Ipv6Addr, prefix_len: u8) -> Self {
        IpPrefix {
            address: IpAddr::V6(address),
            prefix_len: if prefix_len > 128 { 128 } else { prefix_len },
        }
    }

    /// Returns the interface address.
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns the prefix length in bits.
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if this is an IPv4 address.
    pub const fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }

    /// Returns true if this is an IPv6 address.
    pub const fn is_ipv6(&self) -> bool {
        self.address.is_ipv6()
    }

    /// Returns true if `other` falls in the same subnet as this address.
    pub fn contains(&self, other: IpAddr) -> bool {
        match (self.address, other) {
            (IpAddr::V4(a), IpAddr::V4(b)) => {
                let mask = v4_mask(self.prefix_len);
                u32::from(a) & mask == u32::from(b) & mask
            }
            (IpAddr::V6(a), IpAddr::V6(b)) => {
                let mask = v6_mask(self.prefix_len);
                u128::from(a) & mask == u128::from(b) & mask
            }
            _ => false,
        }
    }
}

fn v4_mask(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(len))
    }
}

fn v6_mask(len: u8) -> u128 {
    if len == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(len))
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: IpAddr = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidIpAddress(addr_str.to_string()))?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        IpPrefix::new(address, prefix_len)
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> String {
        prefix.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_host_bits() {
        let prefix: IpPrefix = "192.0.2.1/30".parse().unwrap();
        assert!(prefix.is_ipv4());
        assert_eq!(prefix.address().to_string(), "192.0.2.1");
        assert_eq!(prefix.prefix_len(), 30);
    }

    #[test]
    fn test_contains_same_subnet() {
        let dut: IpPrefix = "192.0.2.5/30".parse().unwrap();
        assert!(dut.contains("192.0.2.6".parse().unwrap()));
        assert!(!dut.contains("192.0.2.2".parse().unwrap()));
        assert!(!dut.contains("2001:db8::6".parse().unwrap()));

        let dut6: IpPrefix = "2001:db8::5/126".parse().unwrap();
        assert!(dut6.contains("2001:db8::6".parse().unwrap()));
        assert!(!dut6.contains("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_invalid_prefix_length() {
        assert!("10.0.0.0/33".parse::<IpPrefix>().is_err());
        assert!("2001:db8::/129".parse::<IpPrefix>().is_err());
        assert!("10.0.0.1".parse::<IpPrefix>().is_err());
        assert!("not-an-ip/24".parse::<IpPrefix>().is_err());
    }

    #[test]
    fn test_display() {
        let prefix: IpPrefix = "2001:db8::1/126".parse().unwrap();
        assert_eq!(prefix.to_string(), "2001:db8::1/126");
    }

    #[test]
    fn test_const_constructors() {
        let v4 = IpPrefix::v4(Ipv4Addr::new(192, 0, 2, 5), 30);
        assert_eq!(v4, "192.0.2.5/30".parse::<IpPrefix>().unwrap());

        let v6 = IpPrefix::v6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 5), 200);
        assert_eq!(v6.prefix_len(), 128);
    }
}
