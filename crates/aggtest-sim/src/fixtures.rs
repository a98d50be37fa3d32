//! Test fixtures for common testbed shapes
//!
//! Port names follow each vendor's convention so that tests exercise the
//! same naming the workflow sees on hardware.

use aggtest_client::{Port, Vendor};

use crate::{SimTestbed, SimTestbedBuilder};

/// Returns the device-side name of the `index`th (1-based) front panel port.
pub fn dut_port_name(vendor: Vendor, index: usize) -> String {
    match vendor {
        Vendor::Arista => format!("Ethernet{}/1", index),
        Vendor::Cisco => format!("HundredGigE0/0/0/{}", index - 1),
        Vendor::Juniper => format!("et-0/0/{}", index - 1),
        Vendor::Nokia => format!("ethernet-1/{}", index),
        Vendor::Other => format!("Ethernet{}", index),
    }
}

/// Returns the generator-side location of the `index`th (1-based) port.
pub fn ate_port_name(index: usize) -> String {
    format!("1/{}", index)
}

/// Returns the device and generator ports of a `count`-link testbed.
pub fn linked_ports(vendor: Vendor, count: usize) -> (Vec<Port>, Vec<Port>) {
    (1..=count)
        .map(|i| {
            let id = format!("port{}", i);
            (
                Port::new(id.clone(), dut_port_name(vendor, i)),
                Port::new(id, ate_port_name(i)),
            )
        })
        .unzip()
}

/// Builder for a `count`-link testbed, ready for further customization.
pub fn testbed_builder(vendor: Vendor, count: usize) -> SimTestbedBuilder {
    let (dut_ports, ate_ports) = linked_ports(vendor, count);
    let builder = SimTestbed::builder().vendor(vendor);
    let builder = dut_ports.into_iter().fold(builder, |b, p| b.dut_port(p));
    ate_ports.into_iter().fold(builder, |b, p| b.ate_port(p))
}

/// A `count`-link testbed.
pub fn testbed(vendor: Vendor, count: usize) -> SimTestbed {
    testbed_builder(vendor, count).build()
}

/// The smallest testbed the aggregate tests accept: one source link and
/// three aggregate members.
pub fn four_port_testbed(vendor: Vendor) -> SimTestbed {
    testbed(vendor, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggtest_client::Telemetry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vendor_port_names() {
        assert_eq!(dut_port_name(Vendor::Arista, 1), "Ethernet1/1");
        assert_eq!(dut_port_name(Vendor::Juniper, 1), "et-0/0/0");
        assert_eq!(dut_port_name(Vendor::Cisco, 3), "HundredGigE0/0/0/2");
    }

    #[test]
    fn test_linked_ports_share_ids() {
        let (dut, ate) = linked_ports(Vendor::Other, 3);
        assert_eq!(dut.len(), 3);
        for (d, a) in dut.iter().zip(&ate) {
            assert_eq!(d.id, a.id);
        }
        assert_eq!(ate[2].name, "1/3");
    }

    #[test]
    fn test_four_port_testbed() {
        let testbed = four_port_testbed(Vendor::Nokia);
        assert_eq!(testbed.dut().ports().len(), 4);
        assert_eq!(testbed.dut().ports()[0].name, "ethernet-1/1");
    }
}
