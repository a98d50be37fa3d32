//! Addressing of one logical test endpoint.

use crate::{IpPrefix, MacAddress};
use serde::{Deserialize, Serialize};

/// Description and addressing of a test endpoint.
///
/// One instance exists per logical endpoint (DUT source, partner source,
/// DUT aggregate, partner aggregate) and it never changes during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Endpoint name on the traffic generator side.
    #[serde(default)]
    pub name: String,
    /// Interface description on the device side.
    #[serde(default)]
    pub desc: String,
    /// Link-layer address; only traffic-generator endpoints carry one.
    #[serde(default)]
    pub mac: Option<MacAddress>,
    pub ipv4: IpPrefix,
    pub ipv6: IpPrefix,
}

impl Attributes {
    /// Creates device-side attributes (description, no MAC).
    pub fn device(desc: impl Into<String>, ipv4: IpPrefix, ipv6: IpPrefix) -> Self {
        Self {
            name: String::new(),
            desc: desc.into(),
            mac: None,
            ipv4,
            ipv6,
        }
    }

    /// Creates traffic-generator attributes (name and MAC).
    pub fn partner(name: impl Into<String>, mac: MacAddress, ipv4: IpPrefix, ipv6: IpPrefix) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            mac: Some(mac),
            ipv4,
            ipv6,
        }
    }

    /// Returns true if both addresses of `peer` sit in this endpoint's subnets.
    pub fn is_peer_of(&self, peer: &Attributes) -> bool {
        self.ipv4.contains(peer.ipv4.address()) && self.ipv6.contains(peer.ipv6.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_check() {
        let dut = Attributes::device(
            "dutsrc",
            "192.0.2.1/30".parse().unwrap(),
            "2001:db8::1/126".parse().unwrap(),
        );
        let ate = Attributes::partner(
            "atesrc",
            "02:11:01:00:00:01".parse().unwrap(),
            "192.0.2.2/30".parse().unwrap(),
            "2001:db8::2/126".parse().unwrap(),
        );
        let far = Attributes::partner(
            "atedst",
            "02:12:01:00:00:01".parse().unwrap(),
            "192.0.2.6/30".parse().unwrap(),
            "2001:db8::6/126".parse().unwrap(),
        );

        assert!(dut.is_peer_of(&ate));
        assert!(!dut.is_peer_of(&far));
    }
}
