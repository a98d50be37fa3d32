//! Addressing of the four logical test endpoints.
//!
//! The source link uses 192.0.2.0/30 and 2001:db8::/126, the aggregate link
//! 192.0.2.4/30 and 2001:db8::4/126. Device ends take the first host
//! address, traffic-generator ends the second.

use std::net::{Ipv4Addr, Ipv6Addr};

use aggtest_types::{Attributes, IpPrefix, MacAddress};

pub const IPV4_PREFIX_LEN: u8 = 30;
pub const IPV6_PREFIX_LEN: u8 = 126;

const fn v4(last: u8) -> IpPrefix {
    IpPrefix::v4(Ipv4Addr::new(192, 0, 2, last), IPV4_PREFIX_LEN)
}

const fn v6(last: u16) -> IpPrefix {
    IpPrefix::v6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, last), IPV6_PREFIX_LEN)
}

/// Device end of the source link.
pub fn dut_src() -> Attributes {
    Attributes::device("DUT to ATE source", v4(1), v6(1))
}

/// Traffic-generator end of the source link.
pub fn ate_src() -> Attributes {
    Attributes::partner(
        "atesrc",
        MacAddress::new([0x02, 0x11, 0x01, 0x00, 0x00, 0x01]),
        v4(2),
        v6(2),
    )
}

/// Device end of the aggregate link.
pub fn dut_dst() -> Attributes {
    Attributes::device("DUT to ATE destination", v4(5), v6(5))
}

/// Traffic-generator end of the aggregate link. Its MAC is the base from
/// which the LAG member MACs are derived.
pub fn ate_dst() -> Attributes {
    Attributes::partner(
        "atedst",
        MacAddress::new([0x02, 0x12, 0x01, 0x00, 0x00, 0x01]),
        v4(6),
        v6(6),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_pair_up() {
        assert!(dut_src().is_peer_of(&ate_src()));
        assert!(dut_dst().is_peer_of(&ate_dst()));
        assert!(!dut_src().is_peer_of(&ate_dst()));
        assert_eq!(dut_src().ipv4.to_string(), "192.0.2.1/30");
        assert_eq!(dut_dst().ipv6.to_string(), "2001:db8::5/126");
    }
}
