//! Device configuration and state object model.
//!
//! A small OpenConfig-shaped model covering what link aggregation tests
//! touch: interfaces with their aggregation, Ethernet and IP subinterface
//! containers, LACP interfaces and network-instance membership. Every leaf
//! is optional so a partially populated object only writes the leaves it
//! sets; state-only leaves (`admin-status`, `oper-status`, counters) are
//! filled in by the device when state is read back.
//!
//! The serialized field names match the tree segments produced by
//! [`crate::paths`], so a value read at any path deserializes into the
//! matching struct.

use std::collections::BTreeMap;

use aggtest_types::{AdminStatus, InterfaceType, LagType, OperStatus, PortSpeed};
use serde::{Deserialize, Serialize};

/// Device root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Root {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Interfaces>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lacp: Option<Lacp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_instances: Option<NetworkInstances>,
}

impl Root {
    /// Returns the named interface, creating it if absent.
    pub fn get_or_create_interface(&mut self, name: &str) -> &mut Interface {
        self.interfaces
            .get_or_insert_with(Interfaces::default)
            .interface
            .entry(name.to_string())
            .or_insert_with(|| Interface::named(name))
    }

    /// Returns the named LACP interface, creating it if absent.
    pub fn get_or_create_lacp_interface(&mut self, name: &str) -> &mut LacpInterface {
        self.lacp
            .get_or_insert_with(Lacp::default)
            .interfaces
            .get_or_insert_with(LacpInterfaces::default)
            .interface
            .entry(name.to_string())
            .or_insert_with(|| LacpInterface {
                name: Some(name.to_string()),
            })
    }

    /// Returns the named network instance, creating it if absent.
    pub fn get_or_create_network_instance(&mut self, name: &str) -> &mut NetworkInstance {
        self.network_instances
            .get_or_insert_with(NetworkInstances::default)
            .network_instance
            .entry(name.to_string())
            .or_insert_with(|| NetworkInstance {
                name: Some(name.to_string()),
                interfaces: None,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interfaces {
    #[serde(default)]
    pub interface: BTreeMap<String, Interface>,
}

/// An interface, physical or aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Interface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub if_type: Option<InterfaceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Aggregation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<Ethernet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subinterfaces: Option<Subinterfaces>,

    // State-only leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<AdminStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oper_status: Option<OperStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<InterfaceCounters>,
}

impl Interface {
    /// Creates an interface carrying only its name.
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Returns the aggregation container, creating it if absent.
    pub fn get_or_create_aggregation(&mut self) -> &mut Aggregation {
        self.aggregation.get_or_insert_with(Aggregation::default)
    }

    /// Returns the Ethernet container, creating it if absent.
    pub fn get_or_create_ethernet(&mut self) -> &mut Ethernet {
        self.ethernet.get_or_insert_with(Ethernet::default)
    }

    /// Returns the subinterface at `index`, creating it if absent.
    pub fn get_or_create_subinterface(&mut self, index: u32) -> &mut Subinterface {
        self.subinterfaces
            .get_or_insert_with(Subinterfaces::default)
            .subinterface
            .entry(index)
            .or_insert_with(|| Subinterface {
                index: Some(index),
                ..Default::default()
            })
    }

    /// Returns the aggregate this interface is bound to, if any.
    pub fn aggregate_id(&self) -> Option<&str> {
        self.ethernet.as_ref()?.aggregate_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Aggregation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag_type: Option<LagType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_links: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ethernet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_speed: Option<PortSpeed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subinterfaces {
    #[serde(default)]
    pub subinterface: BTreeMap<u32, Subinterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subinterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpFamily>,
}

impl Subinterface {
    /// Returns the IPv4 container, creating it if absent.
    pub fn get_or_create_ipv4(&mut self) -> &mut IpFamily {
        self.ipv4.get_or_insert_with(IpFamily::default)
    }

    /// Returns the IPv6 container, creating it if absent.
    pub fn get_or_create_ipv6(&mut self) -> &mut IpFamily {
        self.ipv6.get_or_insert_with(IpFamily::default)
    }
}

/// IPv4 or IPv6 container of a subinterface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpFamily {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Addresses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<IpCounters>,
}

impl IpFamily {
    /// Returns the address entry for `ip`, creating it if absent.
    pub fn get_or_create_address(&mut self, ip: &str) -> &mut Address {
        self.addresses
            .get_or_insert_with(Addresses::default)
            .address
            .entry(ip.to_string())
            .or_insert_with(|| Address {
                ip: Some(ip.to_string()),
                prefix_length: None,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Addresses {
    #[serde(default)]
    pub address: BTreeMap<String, Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

/// Interface-level packet counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceCounters {
    pub in_unicast_pkts: Option<u64>,
    pub out_unicast_pkts: Option<u64>,
    pub in_multicast_pkts: Option<u64>,
    pub out_multicast_pkts: Option<u64>,
    pub in_pkts: Option<u64>,
    pub out_pkts: Option<u64>,
    pub in_discards: Option<u64>,
    pub out_discards: Option<u64>,
    pub in_errors: Option<u64>,
    pub out_errors: Option<u64>,
}

/// Per address-family subinterface counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IpCounters {
    pub in_pkts: Option<u64>,
    pub out_pkts: Option<u64>,
    pub in_discarded_pkts: Option<u64>,
    pub out_discarded_pkts: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lacp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<LacpInterfaces>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LacpInterfaces {
    #[serde(default)]
    pub interface: BTreeMap<String, LacpInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LacpInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkInstances {
    #[serde(default)]
    pub network_instance: BTreeMap<String, NetworkInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<NetworkInstanceInterfaces>,
}

impl NetworkInstance {
    /// Binds `interface.subinterface` to this network instance.
    pub fn add_interface(&mut self, interface: &str, subinterface: u32) -> &mut NetworkInstanceInterface {
        let id = format!("{}.{}", interface, subinterface);
        self.interfaces
            .get_or_insert_with(NetworkInstanceInterfaces::default)
            .interface
            .entry(id.clone())
            .or_insert_with(|| NetworkInstanceInterface {
                id: Some(id),
                interface: Some(interface.to_string()),
                subinterface: Some(subinterface),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInstanceInterfaces {
    #[serde(default)]
    pub interface: BTreeMap<String, NetworkInstanceInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInstanceInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subinterface: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_interface_serializes_only_set_leaves() {
        let mut intf = Interface::named("Ethernet2");
        intf.if_type = Some(InterfaceType::EthernetCsmacd);
        intf.get_or_create_ethernet().aggregate_id = Some("Agg1".to_string());

        assert_eq!(
            serde_json::to_value(&intf).unwrap(),
            json!({
                "name": "Ethernet2",
                "type": "ethernetCsmacd",
                "ethernet": { "aggregate-id": "Agg1" }
            })
        );
    }

    #[test]
    fn test_subinterface_addresses_keyed_by_ip() {
        let mut intf = Interface::named("Agg1");
        let sub = intf.get_or_create_subinterface(0);
        sub.get_or_create_ipv4().get_or_create_address("192.0.2.5").prefix_length = Some(30);

        let value = serde_json::to_value(&intf).unwrap();
        assert_eq!(
            value["subinterfaces"]["subinterface"]["0"]["ipv4"]["addresses"]["address"]["192.0.2.5"]
                ["prefix-length"],
            json!(30)
        );

        let back: Interface = serde_json::from_value(value).unwrap();
        assert_eq!(back, intf);
    }

    #[test]
    fn test_root_builders() {
        let mut root = Root::default();
        root.get_or_create_lacp_interface("Agg1");
        root.get_or_create_interface("Agg1").get_or_create_aggregation().lag_type =
            Some(LagType::Lacp);
        root.get_or_create_network_instance("DEFAULT")
            .add_interface("Agg1", 0);

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(value["lacp"]["interfaces"]["interface"]["Agg1"]["name"], json!("Agg1"));
        assert_eq!(
            value["interfaces"]["interface"]["Agg1"]["aggregation"]["lag-type"],
            json!("LACP")
        );
        assert_eq!(
            value["network-instances"]["network-instance"]["DEFAULT"]["interfaces"]["interface"]
                ["Agg1.0"]["subinterface"],
            json!(0)
        );
    }
}
