//! Simulated testbed: a device under test and a traffic generator wired
//! back to back.
//!
//! Both simulators share a [`Links`] handle holding per-link state and a
//! change notifier. Any write to either side bumps the notifier, which is
//! what drives telemetry subscriptions.

use std::collections::HashSet;
use std::sync::Arc;

use aggtest_client::{Port, Vendor};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use crate::ate::SimAte;
use crate::device::SimDevice;

/// Link state shared between the two ends of a simulated testbed.
#[derive(Debug)]
pub(crate) struct Links {
    down: RwLock<HashSet<String>>,
    lacp_partner_ready: RwLock<bool>,
    changes: watch::Sender<u64>,
}

impl Links {
    pub(crate) fn new() -> Arc<Self> {
        let (changes, _) = watch::channel(0);
        Arc::new(Self {
            down: RwLock::new(HashSet::new()),
            lacp_partner_ready: RwLock::new(false),
            changes,
        })
    }

    /// Returns true if the link with testbed id `port_id` is up.
    pub(crate) fn is_up(&self, port_id: &str) -> bool {
        !self.down.read().contains(port_id)
    }

    pub(crate) fn set_up(&self, port_id: &str, up: bool) {
        let changed = {
            let mut down = self.down.write();
            if up {
                down.remove(port_id)
            } else {
                down.insert(port_id.to_string())
            }
        };
        if changed {
            debug!(port_id, up, "link state changed");
            self.notify();
        }
    }

    pub(crate) fn lacp_partner_ready(&self) -> bool {
        *self.lacp_partner_ready.read()
    }

    pub(crate) fn set_lacp_partner_ready(&self, ready: bool) {
        *self.lacp_partner_ready.write() = ready;
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub(crate) fn notify(&self) {
        self.changes.send_modify(|generation| *generation += 1);
    }
}

/// A device under test and a traffic generator sharing links.
#[derive(Clone)]
pub struct SimTestbed {
    dut: SimDevice,
    ate: SimAte,
    links: Arc<Links>,
}

impl SimTestbed {
    /// Starts building a testbed.
    pub fn builder() -> SimTestbedBuilder {
        SimTestbedBuilder::default()
    }

    /// Returns the simulated device under test.
    pub fn dut(&self) -> &SimDevice {
        &self.dut
    }

    /// Returns the simulated traffic generator.
    pub fn ate(&self) -> &SimAte {
        &self.ate
    }

    /// Brings the link with testbed id `port_id` up or down on both ends.
    pub fn set_link(&self, port_id: &str, up: bool) {
        self.links.set_up(port_id, up);
    }

    /// Splits the testbed into its two targets.
    pub fn into_parts(self) -> (SimDevice, SimAte) {
        (self.dut, self.ate)
    }
}

/// Builder for [`SimTestbed`].
#[derive(Debug, Clone)]
pub struct SimTestbedBuilder {
    dut_name: String,
    ate_name: String,
    vendor: Vendor,
    dut_ports: Vec<Port>,
    ate_ports: Vec<Port>,
}

impl Default for SimTestbedBuilder {
    fn default() -> Self {
        Self {
            dut_name: "dut".to_string(),
            ate_name: "ate".to_string(),
            vendor: Vendor::default(),
            dut_ports: Vec::new(),
            ate_ports: Vec::new(),
        }
    }
}

impl SimTestbedBuilder {
    pub fn dut_name(mut self, name: impl Into<String>) -> Self {
        self.dut_name = name.into();
        self
    }

    pub fn ate_name(mut self, name: impl Into<String>) -> Self {
        self.ate_name = name.into();
        self
    }

    pub fn vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = vendor;
        self
    }

    /// Adds a port to the device under test.
    pub fn dut_port(mut self, port: Port) -> Self {
        self.dut_ports.push(port);
        self
    }

    /// Adds a port to the traffic generator.
    pub fn ate_port(mut self, port: Port) -> Self {
        self.ate_ports.push(port);
        self
    }

    /// Adds a link: a device port and a generator port sharing testbed id
    /// `id`.
    pub fn link(self, id: &str, dut_port: &str, ate_port: &str) -> Self {
        self.dut_port(Port::new(id, dut_port)).ate_port(Port::new(id, ate_port))
    }

    pub fn build(self) -> SimTestbed {
        let links = Links::new();
        let dut = SimDevice::new(self.dut_name, self.vendor, self.dut_ports, Arc::clone(&links));
        let ate = SimAte::new(self.ate_name, self.ate_ports, Arc::clone(&links));
        SimTestbed { dut, ate, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggtest_client::{DeviceClient, Telemetry};

    #[test]
    fn test_link_state_notifies_once_per_change() {
        let links = Links::new();
        let rx = links.subscribe();

        links.set_up("port1", false);
        links.set_up("port1", false);
        assert!(!links.is_up("port1"));
        assert_eq!(*rx.borrow(), 1);

        links.set_up("port1", true);
        assert!(links.is_up("port1"));
        assert_eq!(*rx.borrow(), 2);
    }

    #[test]
    fn test_builder_wires_ports() {
        let testbed = SimTestbed::builder()
            .vendor(Vendor::Arista)
            .link("port1", "Ethernet1", "1/1")
            .link("port2", "Ethernet2", "1/2")
            .build();

        assert_eq!(testbed.dut().vendor(), Vendor::Arista);
        assert_eq!(testbed.dut().ports().len(), 2);
        assert_eq!(testbed.ate().ports()[1].name, "1/2");
    }
}
