//! MAC address type with safe parsing, formatting and arithmetic.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value representable in 48 bits.
const MAC_MAX: u64 = 0xffff_ffff_ffff;

/// A 48-bit Ethernet MAC address.
///
/// # Examples
///
/// ```
/// use aggtest_types::MacAddress;
///
/// let mac: MacAddress = "02:12:01:00:00:01".parse().unwrap();
/// assert_eq!(mac.to_string(), "02:12:01:00:00:01");
///
/// let next = mac.increment(1).unwrap();
/// assert_eq!(next.to_string(), "02:12:01:00:00:02");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns the address as a big-endian integer in the low 48 bits.
    pub fn to_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf[2..].copy_from_slice(&self.0);
        u64::from_be_bytes(buf)
    }

    /// Builds an address from the low 48 bits of `value`.
    ///
    /// Returns `None` if any of the upper 16 bits are set.
    pub fn from_u64(value: u64) -> Option<Self> {
        if value > MAC_MAX {
            return None;
        }
        let buf = value.to_be_bytes();
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&buf[2..]);
        Some(MacAddress(bytes))
    }

    /// Returns this address plus `offset`, treating the address as a 48-bit
    /// unsigned integer.
    ///
    /// Fails with [`ParseError::MacOverflow`] instead of wrapping when the
    /// result does not fit in 48 bits.
    pub fn increment(&self, offset: u64) -> Result<Self, ParseError> {
        self.to_u64()
            .checked_add(offset)
            .and_then(Self::from_u64)
            .ok_or_else(|| ParseError::MacOverflow {
                base: self.to_string(),
                offset,
            })
    }

    /// Returns true if this is a multicast address.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Support both colon and hyphen separators
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_colon_format() {
        let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_parse_hyphen_format() {
        let mac: MacAddress = "00-11-22-33-44-55".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_display() {
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_increment_zero_is_identity() {
        let mac: MacAddress = "02:12:01:00:00:01".parse().unwrap();
        assert_eq!(mac.increment(0).unwrap(), mac);
    }

    #[test]
    fn test_increment_carries_across_octets() {
        let mac: MacAddress = "02:12:01:00:00:ff".parse().unwrap();
        assert_eq!(mac.increment(1).unwrap().to_string(), "02:12:01:00:01:00");

        let mac: MacAddress = "02:12:01:ff:ff:ff".parse().unwrap();
        assert_eq!(mac.increment(3).unwrap().to_string(), "02:12:02:00:00:02");
    }

    #[test]
    fn test_increment_overflow_fails() {
        let top: MacAddress = "ff:ff:ff:ff:ff:ff".parse().unwrap();
        assert_eq!(
            top.increment(1),
            Err(ParseError::MacOverflow {
                base: "ff:ff:ff:ff:ff:ff".to_string(),
                offset: 1,
            })
        );

        let near: MacAddress = "ff:ff:ff:ff:ff:fe".parse().unwrap();
        assert!(near.increment(1).is_ok());
        assert!(near.increment(2).is_err());
        assert!(MacAddress::new([0; 6]).increment(u64::MAX).is_err());
    }

    #[test]
    fn test_u64_conversion() {
        let mac: MacAddress = "00:00:00:00:01:02".parse().unwrap();
        assert_eq!(mac.to_u64(), 0x0102);
        assert_eq!(MacAddress::from_u64(0x0102), Some(mac));
        assert_eq!(MacAddress::from_u64(1 << 48), None);
    }

    #[test]
    fn test_multicast_bit() {
        let mac: MacAddress = "02:11:01:00:00:01".parse().unwrap();
        assert!(!mac.is_multicast());
        assert!("01:00:5e:00:00:01".parse::<MacAddress>().unwrap().is_multicast());
    }

    #[test]
    fn test_invalid_format() {
        assert!("invalid".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("gg:11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("001:11:22:33:44:5".parse::<MacAddress>().is_err());
    }
}
