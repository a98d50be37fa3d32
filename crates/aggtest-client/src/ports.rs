//! Testbed port descriptors and device vendors.

use std::fmt;

use aggtest_types::{Pmd, PortSpeed};
use serde::{Deserialize, Serialize};

/// A physical port reserved for the test.
///
/// `id` is the testbed identifier ("port1") shared by both ends of a link;
/// `name` is what the owning device calls the port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pmd: Pmd,
    #[serde(default)]
    pub speed: PortSpeed,
}

impl Port {
    /// Creates a port with default medium and speed.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pmd: Pmd::default(),
            speed: PortSpeed::default(),
        }
    }

    /// Sets the physical medium.
    pub fn with_pmd(mut self, pmd: Pmd) -> Self {
        self.pmd = pmd;
        self
    }

    /// Sets the port speed.
    pub fn with_speed(mut self, speed: PortSpeed) -> Self {
        self.speed = speed;
        self
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}

/// Network operating system vendor of a device under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Arista,
    Cisco,
    Juniper,
    Nokia,
    #[default]
    Other,
}

impl Vendor {
    /// Returns the name of the aggregate interface with the given index.
    pub fn aggregate_name(&self, index: u32) -> String {
        match self {
            Vendor::Arista => format!("Port-Channel{}", index),
            Vendor::Cisco => format!("Bundle-Ether{}", index),
            Vendor::Juniper => format!("ae{}", index),
            Vendor::Nokia => format!("lag{}", index),
            Vendor::Other => format!("Agg{}", index),
        }
    }

    /// Returns the lowest aggregate index the vendor accepts.
    pub const fn first_aggregate_index(&self) -> u32 {
        match self {
            Vendor::Juniper => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Vendor::Arista => "arista",
            Vendor::Cisco => "cisco",
            Vendor::Juniper => "juniper",
            Vendor::Nokia => "nokia",
            Vendor::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_names() {
        assert_eq!(Vendor::Arista.aggregate_name(1), "Port-Channel1");
        assert_eq!(Vendor::Juniper.aggregate_name(0), "ae0");
        assert_eq!(Vendor::Other.aggregate_name(3), "Agg3");
        assert_eq!(Vendor::Juniper.first_aggregate_index(), 0);
        assert_eq!(Vendor::Nokia.first_aggregate_index(), 1);
    }

    #[test]
    fn test_port_display() {
        let port = Port::new("port1", "Ethernet1").with_pmd(Pmd::Pmd100GBaseFr);
        assert_eq!(port.to_string(), "port1:Ethernet1");
        assert!(port.pmd.requires_fec_override());
    }
}
