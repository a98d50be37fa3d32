//! Traffic-generator topology and metrics model.
//!
//! [`OtgConfig`] describes the emulated topology pushed to a traffic
//! generator: ports, emulated devices with their Ethernet and IP stacks,
//! LAGs and layer-1 overrides. The metrics types mirror what the generator
//! reports back under the paths in [`crate::paths::otg`].

use std::collections::HashSet;
use std::net::IpAddr;

use aggtest_types::{MacAddress, OperStatus};
use serde::{Deserialize, Serialize};

/// Complete traffic-generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OtgConfig {
    #[serde(default)]
    pub ports: Vec<OtgPort>,
    #[serde(default)]
    pub devices: Vec<OtgDevice>,
    #[serde(default)]
    pub lags: Vec<OtgLag>,
    #[serde(default)]
    pub layer1: Vec<Layer1>,
}

impl OtgConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty() && self.devices.is_empty() && self.lags.is_empty() && self.layer1.is_empty()
    }

    /// Adds a test port.
    pub fn add_port(&mut self, name: impl Into<String>) -> &mut OtgPort {
        self.ports.push(OtgPort {
            name: name.into(),
            location: None,
        });
        let last = self.ports.len() - 1;
        &mut self.ports[last]
    }

    /// Adds an emulated device.
    pub fn add_device(&mut self, name: impl Into<String>) -> &mut OtgDevice {
        self.devices.push(OtgDevice {
            name: name.into(),
            ethernets: Vec::new(),
        });
        let last = self.devices.len() - 1;
        &mut self.devices[last]
    }

    /// Adds a LAG.
    pub fn add_lag(&mut self, name: impl Into<String>, protocol: LagProtocol) -> &mut OtgLag {
        self.lags.push(OtgLag {
            name: name.into(),
            protocol,
            ports: Vec::new(),
        });
        let last = self.lags.len() - 1;
        &mut self.lags[last]
    }

    /// Adds a layer-1 override.
    pub fn add_layer1(&mut self, layer1: Layer1) {
        self.layer1.push(layer1);
    }

    /// Returns the LAG with the given name.
    pub fn lag(&self, name: &str) -> Option<&OtgLag> {
        self.lags.iter().find(|l| l.name == name)
    }

    /// Checks internal consistency: unique names, resolvable port and LAG
    /// references, unique MAC addresses. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let mut port_names = HashSet::new();
        for port in &self.ports {
            if !port_names.insert(port.name.as_str()) {
                return Err(format!("duplicate port {}", port.name));
            }
        }

        let mut lag_names = HashSet::new();
        let mut lag_members = HashSet::new();
        let mut macs = HashSet::new();
        for lag in &self.lags {
            if !lag_names.insert(lag.name.as_str()) {
                return Err(format!("duplicate lag {}", lag.name));
            }
            for member in &lag.ports {
                if !port_names.contains(member.port_name.as_str()) {
                    return Err(format!(
                        "lag {} references unknown port {}",
                        lag.name, member.port_name
                    ));
                }
                if !lag_members.insert(member.port_name.as_str()) {
                    return Err(format!("port {} is in more than one lag", member.port_name));
                }
                if !macs.insert(member.ethernet.mac) {
                    return Err(format!("duplicate mac {}", member.ethernet.mac));
                }
            }
        }

        let mut device_names = HashSet::new();
        for device in &self.devices {
            if !device_names.insert(device.name.as_str()) {
                return Err(format!("duplicate device {}", device.name));
            }
            for eth in &device.ethernets {
                match &eth.connection {
                    Connection::PortName(p) if !port_names.contains(p.as_str()) => {
                        return Err(format!("ethernet {} references unknown port {}", eth.name, p));
                    }
                    Connection::PortName(p) if lag_members.contains(p.as_str()) => {
                        return Err(format!("ethernet {} uses lag member port {}", eth.name, p));
                    }
                    Connection::LagName(l) if !lag_names.contains(l.as_str()) => {
                        return Err(format!("ethernet {} references unknown lag {}", eth.name, l));
                    }
                    _ => {}
                }
                if !macs.insert(eth.mac) {
                    return Err(format!("duplicate mac {}", eth.mac));
                }
            }
        }

        for l1 in &self.layer1 {
            if let Some(p) = l1.port_names.iter().find(|p| !port_names.contains(p.as_str())) {
                return Err(format!("layer1 {} references unknown port {}", l1.name, p));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtgPort {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// An emulated device behind one port or LAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtgDevice {
    pub name: String,
    #[serde(default)]
    pub ethernets: Vec<DeviceEthernet>,
}

impl OtgDevice {
    /// Adds an Ethernet interface to the device.
    pub fn add_ethernet(
        &mut self,
        name: impl Into<String>,
        mac: MacAddress,
        connection: Connection,
    ) -> &mut DeviceEthernet {
        self.ethernets.push(DeviceEthernet {
            name: name.into(),
            mac,
            connection,
            ipv4_addresses: Vec::new(),
            ipv6_addresses: Vec::new(),
        });
        let last = self.ethernets.len() - 1;
        &mut self.ethernets[last]
    }
}

/// Where an emulated Ethernet interface attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", content = "name", rename_all = "snake_case")]
pub enum Connection {
    PortName(String),
    LagName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEthernet {
    pub name: String,
    pub mac: MacAddress,
    pub connection: Connection,
    #[serde(default)]
    pub ipv4_addresses: Vec<DeviceIp>,
    #[serde(default)]
    pub ipv6_addresses: Vec<DeviceIp>,
}

impl DeviceEthernet {
    /// Adds an IPv4 address.
    pub fn add_ipv4(&mut self, ip: DeviceIp) -> &mut Self {
        self.ipv4_addresses.push(ip);
        self
    }

    /// Adds an IPv6 address.
    pub fn add_ipv6(&mut self, ip: DeviceIp) -> &mut Self {
        self.ipv6_addresses.push(ip);
        self
    }
}

/// An emulated IP address with its gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIp {
    pub name: String,
    pub address: IpAddr,
    pub gateway: IpAddr,
    pub prefix: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtgLag {
    pub name: String,
    pub protocol: LagProtocol,
    #[serde(default)]
    pub ports: Vec<LagPort>,
}

impl OtgLag {
    /// Adds a member port.
    pub fn add_port(&mut self, port: LagPort) {
        self.ports.push(port);
    }
}

/// LAG membership protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum LagProtocol {
    Static {
        lag_id: u32,
    },
    Lacp {
        actor_system_id: MacAddress,
        actor_system_priority: u16,
        actor_key: u16,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagPort {
    pub port_name: String,
    pub ethernet: LagEthernet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lacp: Option<LagPortLacp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagEthernet {
    pub name: String,
    pub mac: MacAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagPortLacp {
    pub actor_port_number: u16,
    pub actor_port_priority: u16,
    pub actor_activity: String,
}

/// Layer-1 settings applied to a set of ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer1 {
    pub name: String,
    pub port_names: Vec<String>,
    pub speed: String,
    pub auto_negotiate: bool,
    pub ieee_media_defaults: bool,
    pub auto_negotiation: AutoNegotiation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoNegotiation {
    pub rs_fec: bool,
}

/// Link state of a traffic-generator port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkState {
    Up,
    Down,
}

/// Port metrics reported under `/ports/port[name=...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortMetrics {
    pub name: Option<String>,
    pub link: Option<LinkState>,
    pub frames_tx: Option<u64>,
    pub frames_rx: Option<u64>,
}

/// LAG metrics reported under `/lags/lag[name=...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LagMetrics {
    pub name: Option<String>,
    pub oper_status: Option<OperStatus>,
    pub member_ports_up: Option<u32>,
    pub frames_tx: Option<u64>,
    pub frames_rx: Option<u64>,
}

/// LACP member metrics reported under `/lacp/lag-members/lag-member[name=...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LacpMemberMetrics {
    pub name: Option<String>,
    pub lag_name: Option<String>,
    pub lacp_packets_rx: Option<u64>,
    pub lacp_packets_tx: Option<u64>,
    pub synchronization: Option<String>,
    pub collecting: Option<bool>,
    pub distributing: Option<bool>,
}
